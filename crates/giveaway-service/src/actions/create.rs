use chrono::{DateTime, Utc};

use crate::error::GiveawayError;
use crate::state::{AuditAction, Contest};
use crate::store::ContestStore;

/// Creates a new active contest.
///
/// Preconditions: non-empty title, an end time strictly in the future and
/// a winner target of at least one. Violations surface as messages, no
/// state is written.
pub async fn run(
    store: &ContestStore,
    actor: &str,
    now: DateTime<Utc>,
    title: String,
    ends_at: DateTime<Utc>,
    max_winners: u32,
) -> Result<String, GiveawayError> {
    // Validate inputs
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(GiveawayError::EmptyTitle);
    }
    if ends_at <= now {
        return Err(GiveawayError::EndTimeNotFuture);
    }
    if max_winners < 1 {
        return Err(GiveawayError::InvalidWinnerCount);
    }

    let contest = Contest::new(title.clone(), actor.to_string(), now, ends_at, max_winners)
        .audited(
            now,
            AuditAction::Created,
            actor,
            format!("created \"{title}\", ends {}", ends_at.to_rfc3339()),
        );
    let id = contest.id.clone();
    store.create(contest).await?;

    Ok(format!(
        "Created contest {id} \"{title}\" with up to {max_winners} winner(s), ends {}",
        ends_at.to_rfc3339()
    ))
}
