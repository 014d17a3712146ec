//! Autofinish sweep.
//!
//! Periodically closes active contests whose deadline has passed, through
//! the same close path an operator would trigger, and hands the outcomes
//! to the publish sink. Delivery to chat targets is an external concern;
//! the sink trait is the whole interface.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::actions::{close, Dispatcher};
use crate::error::GiveawayError;
use crate::state::ContestStatus;

/// Result of force-closing one overdue contest.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub contest_id: String,
    pub publish_targets: Vec<String>,
    pub message: String,
}

/// Consumes sweep outcomes, typically by messaging each publish target.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, outcome: &SweepOutcome);
}

/// Actor id recorded on autofinish audit entries.
const SWEEP_ACTOR: &str = "system";

/// Closes every active contest past its end time. One failing contest
/// never blocks the rest.
pub async fn sweep_once(
    dispatcher: &Dispatcher,
    now: DateTime<Utc>,
) -> Result<Vec<SweepOutcome>, GiveawayError> {
    let contests = dispatcher.store().list().await?;
    let mut outcomes = Vec::new();

    for contest in contests {
        if contest.status != ContestStatus::Active || contest.ends_at >= now {
            continue;
        }
        match close::run(dispatcher.store(), SWEEP_ACTOR, now, &contest.id, true).await {
            Ok(message) => {
                tracing::info!(contest = %contest.id, "autofinished");
                outcomes.push(SweepOutcome {
                    contest_id: contest.id,
                    publish_targets: contest.publish_targets,
                    message,
                });
            }
            Err(err) => {
                tracing::warn!(contest = %contest.id, error = %err, "autofinish failed");
            }
        }
    }
    Ok(outcomes)
}

/// Sweep loop: ticks forever, publishing whatever each pass closed.
/// Errors are logged and the loop keeps going.
pub async fn run(
    dispatcher: Arc<Dispatcher>,
    sink: Arc<dyn PublishSink>,
    every: std::time::Duration,
) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match sweep_once(&dispatcher, Utc::now()).await {
            Ok(outcomes) => {
                for outcome in &outcomes {
                    sink.publish(outcome).await;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "sweep pass failed");
            }
        }
    }
}
