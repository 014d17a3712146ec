//! Action dispatch.
//!
//! Translates a validated, authenticated request (chat command or HTTP
//! form) into one of a closed set of contest mutations. Every mutation
//! funnels through `ContestStore::update`, and every outcome, success or
//! precondition failure alike, comes back as a human-readable message
//! rather than a panic.

pub mod close;
pub mod create;
pub mod draw;
pub mod edit;
pub mod reopen;
pub mod reroll;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::GiveawayError;
use crate::state::ServiceConfig;
use crate::store::ContestStore;

/// The closed set of administrative mutations. Bulk variants apply the
/// single action independently per id.
#[derive(Debug, Clone)]
pub enum Action {
    Create {
        title: String,
        ends_at: DateTime<Utc>,
        max_winners: u32,
    },
    Edit {
        id: String,
        title: Option<String>,
        ends_at: Option<DateTime<Utc>>,
        max_winners: Option<u32>,
    },
    Draw { id: String },
    Reroll { id: String },
    Close { id: String },
    Reopen { id: String, ends_at: DateTime<Utc> },
    CloseAll { ids: Vec<String> },
    DrawAll { ids: Vec<String> },
    RerollAll { ids: Vec<String> },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Edit { .. } => "edit",
            Self::Draw { .. } => "draw",
            Self::Reroll { .. } => "reroll",
            Self::Close { .. } => "close",
            Self::Reopen { .. } => "reopen",
            Self::CloseAll { .. } => "close_all",
            Self::DrawAll { .. } => "draw_all",
            Self::RerollAll { .. } => "reroll_all",
        }
    }
}

/// Point-in-time view of the dispatcher's in-memory counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub performed: BTreeMap<String, u64>,
    pub rejected: BTreeMap<String, u64>,
}

#[derive(Default)]
struct Metrics {
    performed: BTreeMap<&'static str, u64>,
    rejected: BTreeMap<&'static str, u64>,
}

pub struct Dispatcher {
    store: Arc<ContestStore>,
    cfg: Arc<ServiceConfig>,
    /// Advisory short-TTL markers keyed by `(action, contest id)`,
    /// guarding draw-like actions against double triggers. Expire on
    /// their own and reset with the process.
    locks: Mutex<HashMap<(&'static str, String), DateTime<Utc>>>,
    metrics: Mutex<Metrics>,
}

impl Dispatcher {
    pub fn new(store: Arc<ContestStore>, cfg: Arc<ServiceConfig>) -> Self {
        Self {
            store,
            cfg,
            locks: Mutex::new(HashMap::new()),
            metrics: Mutex::new(Metrics::default()),
        }
    }

    pub fn store(&self) -> &ContestStore {
        &self.store
    }

    /// Performs an action on behalf of `actor`, rendering both arms of the
    /// typed result to the outcome message surfaced to the caller.
    pub async fn perform(&self, action: Action, actor: &str, now: DateTime<Utc>) -> String {
        let kind = action.kind();
        match self.dispatch(action, actor, now).await {
            Ok(message) => {
                self.record(kind, true).await;
                tracing::info!(action = kind, actor, "action performed");
                message
            }
            Err(err) => {
                self.record(kind, false).await;
                tracing::warn!(action = kind, actor, error = %err, "action rejected");
                err.to_string()
            }
        }
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        let metrics = self.metrics.lock().await;
        MetricsSnapshot {
            performed: metrics
                .performed
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            rejected: metrics
                .rejected
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    async fn dispatch(
        &self,
        action: Action,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<String, GiveawayError> {
        match action {
            Action::Create {
                title,
                ends_at,
                max_winners,
            } => create::run(&self.store, actor, now, title, ends_at, max_winners).await,
            Action::Edit {
                id,
                title,
                ends_at,
                max_winners,
            } => edit::run(&self.store, actor, now, &id, title, ends_at, max_winners).await,
            Action::Draw { id } => {
                self.acquire_draw_lock("draw", &id, now).await?;
                draw::run(&self.store, actor, now, &id).await
            }
            Action::Reroll { id } => {
                self.acquire_draw_lock("reroll", &id, now).await?;
                reroll::run(&self.store, actor, now, &id).await
            }
            Action::Close { id } => {
                self.acquire_draw_lock("close", &id, now).await?;
                close::run(&self.store, actor, now, &id, false).await
            }
            Action::Reopen { id, ends_at } => {
                reopen::run(&self.store, actor, now, &id, ends_at).await
            }
            Action::CloseAll { ids } => self.bulk(ids, "closed", actor, now, BulkKind::Close).await,
            Action::DrawAll { ids } => self.bulk(ids, "drawn", actor, now, BulkKind::Draw).await,
            Action::RerollAll { ids } => {
                self.bulk(ids, "rerolled", actor, now, BulkKind::Reroll).await
            }
        }
    }

    /// Applies the single action per id; one failure never blocks the
    /// rest. Successes are counted from the typed per-item result.
    async fn bulk(
        &self,
        ids: Vec<String>,
        verb: &str,
        actor: &str,
        now: DateTime<Utc>,
        kind: BulkKind,
    ) -> Result<String, GiveawayError> {
        let total = ids.len();
        let mut succeeded = 0usize;
        for id in ids {
            let result = match kind {
                BulkKind::Close => close::run(&self.store, actor, now, &id, false).await,
                BulkKind::Draw => draw::run(&self.store, actor, now, &id).await,
                BulkKind::Reroll => reroll::run(&self.store, actor, now, &id).await,
            };
            match result {
                Ok(_) => succeeded += 1,
                Err(err) => {
                    tracing::warn!(contest = %id, error = %err, "bulk item failed");
                }
            }
        }
        Ok(format!("{succeeded} of {total} contests {verb}"))
    }

    async fn acquire_draw_lock(
        &self,
        kind: &'static str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GiveawayError> {
        let ttl = chrono::Duration::milliseconds(self.cfg.draw_lock_ttl.as_millis() as i64);
        let mut locks = self.locks.lock().await;
        locks.retain(|_, expires| *expires > now);
        if locks.contains_key(&(kind, id.to_string())) {
            return Err(GiveawayError::DrawLocked);
        }
        locks.insert((kind, id.to_string()), now + ttl);
        Ok(())
    }

    async fn record(&self, kind: &'static str, performed: bool) {
        let mut metrics = self.metrics.lock().await;
        let bucket = if performed {
            &mut metrics.performed
        } else {
            &mut metrics.rejected
        };
        *bucket.entry(kind).or_insert(0) += 1;
    }
}

/// Renders winner ids with their usernames for outcome messages.
pub(crate) fn winner_names(contest: &crate::state::Contest) -> String {
    contest
        .winners
        .iter()
        .map(|id| match contest.participant(id) {
            Some(p) => format!("@{}", p.username),
            None => id.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

enum BulkKind {
    Close,
    Draw,
    Reroll,
}
