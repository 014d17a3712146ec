use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized inbound user shape produced by the chat-platform adapter.
/// The core never inspects raw platform updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: String,
    pub username: String,
}

/// One entry in a contest. User ids are unique per contest; `tickets`
/// only ever increases, via referral accrual or a manual edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub tickets: u32,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub referrals_count: u32,
}

impl Participant {
    pub fn new(user: &ChatUser, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            joined_at,
            tickets: 1,
            referred_by: None,
            referrals_count: 0,
        }
    }

    /// Cumulative referral bonus held by this participant, measured
    /// against the baseline single ticket every entrant starts with.
    pub fn bonus_tickets(&self) -> u32 {
        self.tickets.saturating_sub(1)
    }
}
