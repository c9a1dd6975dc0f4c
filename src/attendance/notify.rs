use crate::attendance::sessions::month_bounds;
use crate::attendance::store;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Fact emitted by the reconciler when a day's status transitions into
/// LATE. The write path knows nothing about email; this consumer does the
/// counting and escalation.
#[derive(Debug, Clone)]
pub struct LateEvent {
    pub finger_id: i64,
    pub employee_name: String,
    pub email: String,
    pub date: NaiveDate,
}

/// Boundary to the mail service. Fire-and-forget: failures are logged by
/// the consumer, never propagated back into punch processing.
pub trait WarningDispatch: Send + Sync {
    fn send_late_warning(&self, email: &str, name: &str, late_count: i64) -> anyhow::Result<()>;
}

/// Default dispatch used until the mail service is wired in: records the
/// warning in the log stream only.
pub struct LogDispatch;

impl WarningDispatch for LogDispatch {
    fn send_late_warning(&self, email: &str, name: &str, late_count: i64) -> anyhow::Result<()> {
        info!(email, name, late_count, "late attendance warning dispatched");
        Ok(())
    }
}

/// Drains late events and escalates when the month's LATE count reaches
/// `threshold`. Fires exactly at the crossing, so one warning per employee
/// per month.
pub async fn run_consumer(
    pool: MySqlPool,
    mut rx: mpsc::Receiver<LateEvent>,
    dispatch: Arc<dyn WarningDispatch>,
    threshold: i64,
) {
    while let Some(event) = rx.recv().await {
        let (month_start, month_end) = month_bounds(event.date);

        let count =
            match store::late_count_in_range(&pool, event.finger_id, month_start, month_end).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(error = %e, finger_id = event.finger_id, "late count query failed");
                    continue;
                }
            };

        if count != threshold {
            continue;
        }

        if let Err(e) = dispatch.send_late_warning(&event.email, &event.employee_name, count) {
            warn!(
                error = %e,
                finger_id = event.finger_id,
                "late warning dispatch failed"
            );
        }
    }
}
