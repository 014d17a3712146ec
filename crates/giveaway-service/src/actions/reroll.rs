use chrono::{DateTime, Utc};

use crate::draw::draw_at;
use crate::error::GiveawayError;
use crate::state::{AuditAction, ContestStatus};
use crate::store::ContestStore;

/// Re-selects winners for a completed contest.
///
/// Same ranking algorithm as the original draw, with the current
/// timestamp substituted for the contest's end time in the seed
/// derivation. That substitution is the whole difference between draw
/// and reroll, and it keeps the reroll replayable for anyone holding the
/// same timestamp.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    id: &str,
) -> Result<String, GiveawayError> {
    let contest = store.get(id).await?.ok_or(GiveawayError::NotFound)?;
    if contest.status != ContestStatus::Completed {
        return Err(GiveawayError::NotCompleted);
    }
    if contest.participants.is_empty() {
        return Err(GiveawayError::NoParticipants);
    }

    let updated = store
        .update(id, move |mut current| {
            let outcome = draw_at(&current, now);
            let detail = format!(
                "reroll selected [{}], seed {}",
                outcome.winners.join(", "),
                outcome.seed
            );
            current.winners = outcome.winners;
            current.draw_seed = Some(outcome.seed);
            current.audited(now, AuditAction::Reroll, actor, detail)
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    Ok(format!(
        "Contest {} \"{}\": reroll picked {}",
        updated.id,
        updated.title,
        super::winner_names(&updated)
    ))
}
