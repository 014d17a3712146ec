use chrono::{DateTime, Utc};

use crate::error::GiveawayError;
use crate::state::{AuditAction, ContestStatus};
use crate::store::ContestStore;

/// Returns a completed contest to the active state with a new deadline.
/// Winners and the prior draw seed are cleared; the audit trail keeps the
/// history of what was drawn before.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    id: &str,
    ends_at: DateTime<Utc>,
) -> Result<String, GiveawayError> {
    if ends_at <= now {
        return Err(GiveawayError::EndTimeNotFuture);
    }

    let contest = store.get(id).await?.ok_or(GiveawayError::NotFound)?;
    if contest.status != ContestStatus::Completed {
        return Err(GiveawayError::NotCompleted);
    }

    let updated = store
        .update(id, move |mut current| {
            current.status = ContestStatus::Active;
            current.ends_at = ends_at;
            current.winners.clear();
            current.draw_seed = None;
            current.audited(
                now,
                AuditAction::Reopened,
                actor,
                format!("reopened until {}", ends_at.to_rfc3339()),
            )
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    Ok(format!(
        "Contest {} \"{}\" reopened until {}",
        updated.id,
        updated.title,
        ends_at.to_rfc3339()
    ))
}
