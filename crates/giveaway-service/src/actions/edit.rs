use chrono::{DateTime, Utc};

use crate::error::GiveawayError;
use crate::state::AuditAction;
use crate::store::ContestStore;

/// Applies the provided fields to an existing contest. Absent fields are
/// left untouched; present fields pass the same validation as create.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    id: &str,
    title: Option<String>,
    ends_at: Option<DateTime<Utc>>,
    max_winners: Option<u32>,
) -> Result<String, GiveawayError> {
    // Validate inputs
    let title = match title {
        Some(t) => {
            let t = t.trim().to_string();
            if t.is_empty() {
                return Err(GiveawayError::EmptyTitle);
            }
            Some(t)
        }
        None => None,
    };
    if let Some(ends_at) = ends_at {
        if ends_at <= now {
            return Err(GiveawayError::EndTimeNotFuture);
        }
    }
    if let Some(max_winners) = max_winners {
        if max_winners < 1 {
            return Err(GiveawayError::InvalidWinnerCount);
        }
    }

    let mut changed: Vec<&str> = Vec::new();
    if title.is_some() {
        changed.push("title");
    }
    if ends_at.is_some() {
        changed.push("end time");
    }
    if max_winners.is_some() {
        changed.push("winner count");
    }
    let detail = format!("edited {}", changed.join(", "));

    let updated = store
        .update(id, move |mut contest| {
            if let Some(title) = title {
                contest.title = title;
            }
            if let Some(ends_at) = ends_at {
                contest.ends_at = ends_at;
            }
            if let Some(max_winners) = max_winners {
                contest.max_winners = max_winners;
            }
            contest.audited(now, AuditAction::Edited, actor, detail)
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    Ok(format!("Contest {} \"{}\" updated", updated.id, updated.title))
}
