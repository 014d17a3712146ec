use chrono::{DateTime, Utc};

use crate::error::GiveawayError;
use crate::state::{AuditAction, ContestStatus};
use crate::store::ContestStore;

/// Closes an active contest.
///
/// With zero participants the contest transitions straight to completed
/// with no winners and no seed; otherwise closing performs a draw. The
/// background sweep takes the same path with `auto` set, which tags the
/// audit entry as an autofinish.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    id: &str,
    auto: bool,
) -> Result<String, GiveawayError> {
    let contest = store.get(id).await?.ok_or(GiveawayError::NotFound)?;
    if contest.status != ContestStatus::Active {
        return Err(GiveawayError::NotActive);
    }

    let action = if auto {
        AuditAction::Autofinish
    } else {
        AuditAction::Closed
    };

    if contest.participants.is_empty() {
        let updated = store
            .update(id, move |mut current| {
                current.status = ContestStatus::Completed;
                current.audited(now, action, actor, "closed with no participants")
            })
            .await?
            .ok_or(GiveawayError::NotFound)?;
        return Ok(format!(
            "Contest {} \"{}\" closed with no participants",
            updated.id, updated.title
        ));
    }

    let updated = store
        .update(id, move |current| {
            super::draw::complete_with_draw(current, action, actor, now)
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    Ok(format!(
        "Contest {} \"{}\" closed, {} winner(s): {}",
        updated.id,
        updated.title,
        updated.winners.len(),
        super::winner_names(&updated)
    ))
}
