//! Referral accrual and the join operation.
//!
//! Bonus crediting runs inside the store's atomic mutator so two
//! near-simultaneous joins naming the same referrer are applied against
//! the freshest persisted state and cannot credit past the cap.

use chrono::{DateTime, Utc};

use crate::error::GiveawayError;
use crate::state::{
    AuditAction, ChatUser, Contest, ContestStatus, Participant, ServiceConfig,
};
use crate::store::ContestStore;

/// Adds `user` to the participant list and credits the referrer, if any.
///
/// Pure and total; always returns a complete new contest value. Rules:
/// - a user id already present leaves the list unchanged;
/// - self-referrals are ignored silently;
/// - a referrer not among current participants is ignored silently;
/// - the referrer gains `referral_bonus` tickets per referral, but their
///   cumulative bonus never exceeds `referral_cap`. At the cap the
///   `referred_by` provenance is still recorded on the new participant,
///   with no ticket movement.
pub fn apply_join(
    mut contest: Contest,
    user: &ChatUser,
    referred_by: Option<&str>,
    joined_at: DateTime<Utc>,
    cfg: &ServiceConfig,
) -> Contest {
    if contest.participant(&user.id).is_some() {
        return contest;
    }

    let mut entrant = Participant::new(user, joined_at);

    let referrer = referred_by
        .filter(|r| *r != user.id)
        .and_then(|r| contest.participants.iter_mut().find(|p| p.user_id == r));
    if let Some(referrer) = referrer {
        entrant.referred_by = Some(referrer.user_id.clone());
        referrer.referrals_count = referrer.referrals_count.saturating_add(1);

        let headroom = cfg.referral_cap.saturating_sub(referrer.bonus_tickets());
        let credit = cfg.referral_bonus.min(headroom);
        referrer.tickets = referrer.tickets.saturating_add(credit);
    }

    contest.participants.push(entrant);
    contest
}

/// Outcome of a join request, rendered for the chat shim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { tickets: u32 },
    AlreadyEntered,
    NotOpen,
}

/// Enters a user into a contest through the store's atomic update,
/// appending a join audit entry on first entry.
pub async fn join(
    store: &ContestStore,
    cfg: &ServiceConfig,
    contest_id: &str,
    user: &ChatUser,
    referred_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<JoinOutcome, GiveawayError> {
    let contest = store.get(contest_id).await?.ok_or(GiveawayError::NotFound)?;
    if contest.status != ContestStatus::Active || contest.ends_at <= now {
        return Ok(JoinOutcome::NotOpen);
    }
    if contest.participant(&user.id).is_some() {
        return Ok(JoinOutcome::AlreadyEntered);
    }

    let updated = store
        .update(contest_id, |current| {
            let joined = apply_join(current, user, referred_by, now, cfg);
            let detail = match referred_by {
                Some(r) => format!("{} joined (referred by {r})", user.username),
                None => format!("{} joined", user.username),
            };
            joined.audited(now, AuditAction::Join, &user.id, detail)
        })
        .await?
        .ok_or(GiveawayError::NotFound)?;

    tracing::info!(contest = contest_id, user = %user.id, "participant joined");
    let tickets = updated.participant(&user.id).map(|p| p.tickets).unwrap_or(1);
    Ok(JoinOutcome::Joined { tickets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> ServiceConfig {
        ServiceConfig {
            referral_bonus: 1,
            referral_cap: 2,
            ..ServiceConfig::default()
        }
    }

    fn base_contest() -> Contest {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Contest::new(
            "tickets".to_string(),
            "owner".to_string(),
            created,
            created + chrono::Duration::days(1),
            1,
        )
    }

    fn user(id: &str) -> ChatUser {
        ChatUser {
            id: id.to_string(),
            username: id.to_string(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn referral_credits_one_ticket() {
        let cfg = cfg();
        let contest = apply_join(base_contest(), &user("ref"), None, at(), &cfg);
        let contest = apply_join(contest, &user("new"), Some("ref"), at(), &cfg);

        assert_eq!(contest.participant("ref").unwrap().tickets, 2);
        assert_eq!(contest.participant("ref").unwrap().referrals_count, 1);
        assert_eq!(
            contest.participant("new").unwrap().referred_by.as_deref(),
            Some("ref")
        );
    }

    #[test]
    fn bonus_stops_at_cap_but_provenance_is_kept() {
        let cfg = cfg();
        let mut contest = apply_join(base_contest(), &user("ref"), None, at(), &cfg);
        for n in 0..4 {
            contest = apply_join(contest, &user(&format!("u{n}")), Some("ref"), at(), &cfg);
        }

        let referrer = contest.participant("ref").unwrap();
        assert_eq!(referrer.tickets, 1 + cfg.referral_cap);
        assert_eq!(referrer.referrals_count, 4);
        // The over-cap join still records where it came from.
        assert_eq!(
            contest.participant("u3").unwrap().referred_by.as_deref(),
            Some("ref")
        );
    }

    #[test]
    fn self_referral_grants_nothing() {
        let cfg = cfg();
        let contest = apply_join(base_contest(), &user("solo"), Some("solo"), at(), &cfg);
        let entrant = contest.participant("solo").unwrap();
        assert_eq!(entrant.tickets, 1);
        assert_eq!(entrant.referred_by, None);
    }

    #[test]
    fn unknown_referrer_is_ignored() {
        let cfg = cfg();
        let contest = apply_join(base_contest(), &user("new"), Some("ghost"), at(), &cfg);
        let entrant = contest.participant("new").unwrap();
        assert_eq!(entrant.referred_by, None);
        assert_eq!(contest.participants.len(), 1);
    }

    #[test]
    fn duplicate_join_changes_nothing() {
        let cfg = cfg();
        let contest = apply_join(base_contest(), &user("dup"), None, at(), &cfg);
        let again = apply_join(contest.clone(), &user("dup"), None, at(), &cfg);
        assert_eq!(contest, again);
    }

    #[tokio::test]
    async fn join_reports_the_contest_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContestStore::open(dir.path().join("contests.json"))
            .await
            .unwrap();
        let cfg = cfg();
        let mut contest = base_contest();
        contest.id = "c0ffee00".to_string();
        store.create(contest).await.unwrap();

        let first = join(&store, &cfg, "c0ffee00", &user("u1"), None, at())
            .await
            .unwrap();
        assert_eq!(first, JoinOutcome::Joined { tickets: 1 });

        let again = join(&store, &cfg, "c0ffee00", &user("u1"), None, at())
            .await
            .unwrap();
        assert_eq!(again, JoinOutcome::AlreadyEntered);

        let past_deadline = at() + chrono::Duration::days(2);
        let late = join(&store, &cfg, "c0ffee00", &user("u2"), None, past_deadline)
            .await
            .unwrap();
        assert_eq!(late, JoinOutcome::NotOpen);

        assert!(matches!(
            join(&store, &cfg, "deadbeef", &user("u3"), None, at()).await,
            Err(GiveawayError::NotFound)
        ));

        let stored = store.get("c0ffee00").await.unwrap().unwrap();
        assert_eq!(stored.participants.len(), 1);
        assert!(stored.audit.iter().any(|e| e.action == AuditAction::Join));
    }
}
