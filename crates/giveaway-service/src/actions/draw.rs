use chrono::{DateTime, Utc};

use crate::draw::draw;
use crate::error::GiveawayError;
use crate::state::{AuditAction, Contest, ContestStatus};
use crate::store::ContestStore;

/// Draws winners for an active contest and completes it.
///
/// Preconditions: the contest is active and has at least one participant.
/// The selection itself is the deterministic ranking in [`crate::draw`];
/// the resulting seed is persisted with the winners so the outcome stays
/// auditable.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    id: &str,
) -> Result<String, GiveawayError> {
    let contest = store.get(id).await?.ok_or(GiveawayError::NotFound)?;
    if contest.status != ContestStatus::Active {
        return Err(GiveawayError::NotActive);
    }
    if contest.participants.is_empty() {
        return Err(GiveawayError::NoParticipants);
    }

    let updated = store
        .update(id, move |current| {
            complete_with_draw(current, AuditAction::Draw, actor, now)
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    Ok(format!(
        "Contest {} \"{}\": drew {} winner(s): {}",
        updated.id,
        updated.title,
        updated.winners.len(),
        super::winner_names(&updated)
    ))
}

/// Runs the draw against the freshest persisted state and folds the
/// outcome into a completed contest. Shared with close, which performs a
/// draw as part of closing.
pub(super) fn complete_with_draw(
    mut contest: Contest,
    action: AuditAction,
    actor: &str,
    now: DateTime<Utc>,
) -> Contest {
    let outcome = draw(&contest);
    let detail = format!(
        "selected [{}] from {} participant(s), seed {}",
        outcome.winners.join(", "),
        contest.participants.len(),
        outcome.seed
    );
    contest.winners = outcome.winners;
    contest.draw_seed = Some(outcome.seed);
    contest.status = ContestStatus::Completed;
    contest.audited(now, action, actor, detail)
}
