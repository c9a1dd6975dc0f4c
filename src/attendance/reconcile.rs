use crate::attendance::error::AttendanceError;
use crate::attendance::ingest::{self, PunchEvent};
use crate::attendance::notify::LateEvent;
use crate::attendance::policy;
use crate::attendance::sessions::{first_check_in, last_check_out};
use crate::attendance::state::PunchState;
use crate::attendance::status::determine_status;
use crate::attendance::store;
use crate::model::attendance::{AttendanceStatus, LogDirection};
use crate::model::employee::EmployeeProfile;
use crate::utils::profile_cache;
use chrono::NaiveDateTime;
use sqlx::MySqlPool;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Result of one accepted punch.
#[derive(Debug, Clone)]
pub struct PunchOutcome {
    pub attendance_id: u64,
    pub status: AttendanceStatus,
}

/// The shared reconciliation core behind both ingestion paths.
///
/// Sequence: resolve the working window, find-or-create the day record
/// (unique-key safe across processes), then under one transaction with the
/// day row locked: check the punch state machine, append the log, recompute
/// status from the full reloaded log set, persist. A transition into LATE
/// emits a LateEvent after commit; the punch path never waits on the
/// escalation side.
pub async fn record_punch(
    pool: &MySqlPool,
    late_tx: &mpsc::Sender<LateEvent>,
    profile: &EmployeeProfile,
    event: &PunchEvent,
) -> Result<PunchOutcome, AttendanceError> {
    let window = policy::resolve_window(
        &profile.working_time_start,
        &profile.working_time_end,
        event.date,
    )?;

    store::find_or_create_day(pool, event.finger_id, event.date).await?;

    let mut tx = pool.begin().await?;

    let day = store::find_day_for_update(&mut tx, event.finger_id, event.date)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let last = store::last_log(&mut tx, day.id).await?;
    let state = PunchState::from_last_direction(last.as_ref().and_then(|l| l.direction_enum()));
    if let Err(duplicate) = state.admit(event.direction) {
        // dropping the transaction rolls the lock back
        return Err(AttendanceError::DuplicateDirection(duplicate));
    }

    store::insert_log(&mut tx, day.id, event.direction, event.punched_at()).await?;

    let logs = store::logs_for_day_tx(&mut tx, day.id).await?;
    let pairs: Vec<(LogDirection, NaiveDateTime)> = logs
        .iter()
        .filter_map(|l| l.direction_enum().map(|d| (d, l.punched_at)))
        .collect();

    let status = determine_status(first_check_in(&pairs), last_check_out(&pairs), &window);
    store::update_status_tx(&mut tx, day.id, status).await?;
    tx.commit().await?;

    let previous = day.status_enum();
    if status == AttendanceStatus::Late && previous != Some(AttendanceStatus::Late) {
        let late = LateEvent {
            finger_id: event.finger_id,
            employee_name: profile.name.clone(),
            email: profile.email.clone(),
            date: event.date,
        };
        if late_tx.try_send(late).is_err() {
            warn!(
                finger_id = event.finger_id,
                "late-event channel unavailable, escalation skipped"
            );
        }
    }

    Ok(PunchOutcome {
        attendance_id: day.id,
        status,
    })
}

/// Manual-entry path: every failure is surfaced to the caller, a human is
/// waiting for the response.
pub async fn punch_manual(
    pool: &MySqlPool,
    late_tx: &mpsc::Sender<LateEvent>,
    event: &PunchEvent,
) -> Result<PunchOutcome, AttendanceError> {
    let profile = profile_cache::resolve(pool, event.finger_id)
        .await?
        .ok_or(AttendanceError::UnknownIdentity(event.finger_id))?;

    record_punch(pool, late_tx, &profile, event).await
}

/// Device-feed path: silent on every failure class. Terminals interleave
/// chatter with punches and resend deliveries; the device only needs its
/// acknowledgement, so nothing here becomes an HTTP error.
pub async fn punch_from_device(
    pool: &MySqlPool,
    late_tx: &mpsc::Sender<LateEvent>,
    body: &str,
) -> Option<PunchOutcome> {
    let raw = match ingest::parse_device_payload(body) {
        Some(raw) => raw,
        None => {
            debug!("device delivery carried no punch line");
            return None;
        }
    };

    let event = match raw.normalize() {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "dropping malformed device punch");
            return None;
        }
    };

    let profile = match profile_cache::resolve(pool, event.finger_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            // decommissioned badges keep punching; not an error
            debug!(finger_id = event.finger_id, "punch from unknown finger id");
            return None;
        }
        Err(e) => {
            error!(error = %e, finger_id = event.finger_id, "profile lookup failed");
            return None;
        }
    };

    match record_punch(pool, late_tx, &profile, &event).await {
        Ok(outcome) => Some(outcome),
        Err(e) if e.is_duplicate() => {
            debug!(finger_id = event.finger_id, "duplicate device punch ignored");
            None
        }
        Err(e) => {
            error!(error = %e, finger_id = event.finger_id, "device punch failed");
            None
        }
    }
}
