//! Report projections for the management surface.
//!
//! Pure functions from store state to exportable shapes; the HTTP shim
//! only serializes and frames what it gets here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::MetricsSnapshot;
use crate::state::{AuditAction, Contest, ContestStatus};

/// One audit line, flattened across contests.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub contest_id: String,
    pub at: DateTime<Utc>,
    pub action: AuditAction,
    pub actor: String,
    pub detail: String,
}

/// An active contest past its deadline, i.e. waiting on the sweep.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub contest_id: String,
    pub title: String,
    pub ends_at: DateTime<Utc>,
    pub overdue_seconds: i64,
}

/// CSV export of the contest collection, audit trail elided.
pub fn contests_csv(contests: &[Contest]) -> String {
    let mut out = String::from(
        "id,title,status,participants,total_tickets,winners,ends_at,created_by\n",
    );
    for contest in contests {
        let total_tickets: u64 = contest
            .participants
            .iter()
            .map(|p| u64::from(p.tickets.max(1)))
            .sum();
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            contest.id,
            csv_field(&contest.title),
            status_str(contest.status),
            contest.participants.len(),
            total_tickets,
            csv_field(&contest.winners.join(" ")),
            contest.ends_at.to_rfc3339(),
            csv_field(&contest.created_by),
        ));
    }
    out
}

pub fn audit_report(contests: &[Contest]) -> Vec<AuditRecord> {
    let mut records: Vec<AuditRecord> = contests
        .iter()
        .flat_map(|contest| {
            contest.audit.iter().map(|entry| AuditRecord {
                contest_id: contest.id.clone(),
                at: entry.at,
                action: entry.action,
                actor: entry.actor.clone(),
                detail: entry.detail.clone(),
            })
        })
        .collect();
    records.sort_by_key(|r| r.at);
    records
}

pub fn alerts(contests: &[Contest], now: DateTime<Utc>) -> Vec<Alert> {
    contests
        .iter()
        .filter(|c| c.status == ContestStatus::Active && c.ends_at < now)
        .map(|c| Alert {
            contest_id: c.id.clone(),
            title: c.title.clone(),
            ends_at: c.ends_at,
            overdue_seconds: now.signed_duration_since(c.ends_at).num_seconds(),
        })
        .collect()
}

pub fn metrics_csv(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::from("action,performed,rejected\n");
    let mut kinds: Vec<&String> = snapshot
        .performed
        .keys()
        .chain(snapshot.rejected.keys())
        .collect();
    kinds.sort();
    kinds.dedup();
    for kind in kinds {
        out.push_str(&format!(
            "{},{},{}\n",
            kind,
            snapshot.performed.get(kind).copied().unwrap_or(0),
            snapshot.rejected.get(kind).copied().unwrap_or(0),
        ));
    }
    out
}

fn status_str(status: ContestStatus) -> &'static str {
    match status {
        ContestStatus::Draft => "draft",
        ContestStatus::Active => "active",
        ContestStatus::Completed => "completed",
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Contest;
    use chrono::TimeZone;

    fn contest(title: &str, status: ContestStatus) -> Contest {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut c = Contest::new(
            title.to_string(),
            "owner".to_string(),
            created,
            created + chrono::Duration::hours(6),
            1,
        );
        c.status = status;
        c
    }

    #[test]
    fn csv_quotes_awkward_titles() {
        let csv = contests_csv(&[contest("weekly, \"special\"", ContestStatus::Active)]);
        assert!(csv.contains("\"weekly, \"\"special\"\"\""));
        assert!(csv.starts_with("id,title,status"));
    }

    #[test]
    fn alerts_only_cover_overdue_active_contests() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let overdue = contest("late", ContestStatus::Active);
        let done = contest("done", ContestStatus::Completed);
        let fresh = {
            let mut c = contest("fresh", ContestStatus::Active);
            c.ends_at = now + chrono::Duration::hours(1);
            c
        };

        let alerts = alerts(&[overdue.clone(), done, fresh], now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].contest_id, overdue.id);
        assert!(alerts[0].overdue_seconds > 0);
    }

    #[test]
    fn metrics_csv_merges_both_counters() {
        let mut snapshot = MetricsSnapshot::default();
        snapshot.performed.insert("create".to_string(), 2);
        snapshot.rejected.insert("draw".to_string(), 1);

        let csv = metrics_csv(&snapshot);
        assert_eq!(csv, "action,performed,rejected\ncreate,2,0\ndraw,0,1\n");
    }

    #[test]
    fn audit_report_flattens_and_orders_by_time() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let first = contest("a", ContestStatus::Active).audited(
            base + chrono::Duration::minutes(2),
            AuditAction::Created,
            "1",
            "later",
        );
        let second = contest("b", ContestStatus::Active).audited(
            base,
            AuditAction::Created,
            "1",
            "earlier",
        );

        let records = audit_report(&[first, second]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].detail, "earlier");
        assert_eq!(records[1].detail, "later");
    }
}
