//! Deterministic, ticket-weighted winner selection.
//!
//! The engine is a pure function over a contest's participant list. It
//! derives a seed from contest identity and state, ranks every ticket by a
//! digest keyed on that seed, and walks the ranking until enough distinct
//! winners are found. Anyone holding the same contest state can replay the
//! procedure and verify the outcome.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::state::Contest;

/// Result of a draw: the seed the ranking was derived from and the ordered
/// winner list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub seed: String,
    pub winners: Vec<String>,
}

/// Selects winners for a contest.
///
/// The selection is reproducible: the same contest state always yields the
/// same seed and the same winners, so a published outcome can be audited
/// by any third party given the hash function and inputs.
///
/// Procedure:
/// 1. Derive `seed = SHA-256(contest_id ‖ ends_at ‖ participant_count)`,
///    hex encoded.
/// 2. Expand each participant into one entry per ticket, keyed by
///    `(user_id, joined_at, ticket_index)`.
/// 3. Rank entries by the byte-wise order of the lowercase-hex digest
///    `SHA-256(seed ‖ ticket_key)`, ascending.
/// 4. Walk the ranking and keep the first `max_winners` distinct user ids.
///    A participant whose tickets all rank highly still counts once.
///
/// A contest with zero participants yields an empty seed and no winners;
/// that is a valid outcome, not an error.
pub fn draw(contest: &Contest) -> DrawOutcome {
    draw_at(contest, contest.ends_at)
}

/// Same algorithm as [`draw`], with the `ends_at` seed component replaced
/// by a caller-supplied timestamp.
///
/// This is the entire mechanism behind "reroll": a completed contest is
/// re-drawn with a fresh timestamp substituted into the seed derivation,
/// producing a different but still deterministic outcome. Replaying a
/// reroll with the same timestamp reproduces the same winners.
pub fn draw_at(contest: &Contest, ends_at: DateTime<Utc>) -> DrawOutcome {
    if contest.participants.is_empty() {
        return DrawOutcome {
            seed: String::new(),
            winners: Vec::new(),
        };
    }

    let seed = derive_seed(&contest.id, ends_at, contest.participants.len());

    // One ranking entry per ticket. Every participant holds at least one
    // ticket regardless of what the stored count says.
    let mut ranked: Vec<(String, &str)> = Vec::new();
    for participant in &contest.participants {
        let tickets = participant.tickets.max(1);
        for index in 0..tickets {
            let key = format!(
                "{}:{}:{}",
                participant.user_id,
                participant.joined_at.to_rfc3339(),
                index
            );
            ranked.push((digest_hex(&seed, &key), &participant.user_id));
        }
    }

    // Lowercase hex compared byte-wise; ascending digest wins.
    ranked.sort();

    let mut winners: Vec<String> = Vec::new();
    for (_, user_id) in &ranked {
        if winners.iter().any(|w| w == user_id) {
            continue;
        }
        winners.push((*user_id).to_string());
        if winners.len() as u32 >= contest.max_winners {
            break;
        }
    }

    DrawOutcome { seed, winners }
}

/// Seed over contest identity and state, hex encoded SHA-256.
pub fn derive_seed(contest_id: &str, ends_at: DateTime<Utc>, participant_count: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contest_id.as_bytes());
    hasher.update(ends_at.to_rfc3339().as_bytes());
    hasher.update(participant_count.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

fn digest_hex(seed: &str, ticket_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(ticket_key.as_bytes());
    hex::encode(hasher.finalize())
}
