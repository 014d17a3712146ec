use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::state::participant::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestStatus {
    Draft,
    Active,
    Completed,
}

/// One giveaway instance with participants, a deadline and a winner-count
/// target. Components never mutate a `Contest` in place; mutators build a
/// new value and hand it back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub id: String,
    pub title: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_winners: u32,
    pub status: ContestStatus,
    /// Chat identifiers a user must be a member of before joining.
    /// Enforced by the chat adapter, carried here for round-tripping.
    #[serde(default)]
    pub required_chats: Vec<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub winners: Vec<String>,
    /// Present iff a draw, reroll or close-with-participants has occurred.
    #[serde(default)]
    pub draw_seed: Option<String>,
    #[serde(default)]
    pub publish_targets: Vec<String>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

impl Contest {
    pub fn new(
        title: String,
        created_by: String,
        created_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        max_winners: u32,
    ) -> Self {
        Self {
            id: new_contest_id(),
            title,
            created_by,
            created_at,
            ends_at,
            max_winners,
            status: ContestStatus::Active,
            required_chats: Vec::new(),
            participants: Vec::new(),
            winners: Vec::new(),
            draw_seed: None,
            publish_targets: Vec::new(),
            audit: Vec::new(),
        }
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Appends an audit entry and returns the contest, so mutators can
    /// chain the append onto the state change they describe.
    pub fn audited(
        mut self,
        at: DateTime<Utc>,
        action: AuditAction,
        actor: &str,
        detail: impl Into<String>,
    ) -> Self {
        self.audit.push(AuditEntry {
            at,
            action,
            actor: actor.to_string(),
            detail: detail.into(),
        });
        self
    }
}

/// Opaque short contest id, 8 lowercase hex chars.
pub fn new_contest_id() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Edited,
    Closed,
    Reopened,
    Draw,
    Reroll,
    Autofinish,
    Join,
}

/// Append-only record of a privileged action; entries are never rewritten
/// or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: AuditAction,
    pub actor: String,
    pub detail: String,
}
