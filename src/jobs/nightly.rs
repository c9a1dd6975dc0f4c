use crate::attendance::error::AttendanceError;
use crate::attendance::ingest::PunchEvent;
use crate::attendance::notify::LateEvent;
use crate::attendance::policy;
use crate::attendance::reconcile;
use crate::attendance::store::{self, CreateDayOutcome};
use crate::model::attendance::{AttendanceStatus, LogDirection};
use crate::model::employee::EmployeeProfile;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use sqlx::MySqlPool;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Tally of one nightly run, for the log line and for tests against a
/// seeded database.
#[derive(Debug, Default)]
pub struct NightlyReport {
    pub examined: usize,
    pub non_working: usize,
    pub already_terminal: usize,
    pub closed_out: usize,
    pub roaster_forced: usize,
    pub created_roaster: usize,
    pub created_leave: usize,
    pub created_absent: usize,
    pub failed: usize,
}

/// Facts gathered for one employee on one working day, inputs to `plan_day`.
#[derive(Debug, Clone)]
pub struct DayFacts {
    pub roster: bool,
    pub approved_leave: bool,
    pub existing: Option<ExistingDay>,
}

#[derive(Debug, Clone)]
pub struct ExistingDay {
    pub status: Option<AttendanceStatus>,
    pub has_checkout: bool,
}

/// What the run does for one employee's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPlan {
    /// Terminal status already set; the job never revisits it.
    LeaveAlone,
    /// Day record exists and is still in progress.
    Update {
        synthesize_checkout: bool,
        force_roaster: bool,
    },
    /// No day record at all; create one with this status.
    Create(AttendanceStatus),
}

/// Pure per-employee decision. A checkout is synthesized only while the day
/// has no CHECK_OUT log, which is what makes a re-run over the same date a
/// no-op. Roster beats leave beats absent for untouched days.
pub fn plan_day(facts: &DayFacts) -> DayPlan {
    match &facts.existing {
        Some(day) => {
            if day.status.is_some_and(AttendanceStatus::is_terminal) {
                return DayPlan::LeaveAlone;
            }
            DayPlan::Update {
                synthesize_checkout: !day.has_checkout,
                force_roaster: facts.roster && day.status != Some(AttendanceStatus::Roaster),
            }
        }
        None => DayPlan::Create(if facts.roster {
            AttendanceStatus::Roaster
        } else if facts.approved_leave {
            AttendanceStatus::Leave
        } else {
            AttendanceStatus::Absent
        }),
    }
}

/// Closes out `today` for every active punch-tracked employee.
///
/// Re-runnable: a synthesized checkout is only appended when the day still
/// has no CHECK_OUT log, and day creation treats the unique-key race as
/// "already handled". One employee's failure never aborts the batch.
pub async fn run_nightly(
    pool: &MySqlPool,
    late_tx: &mpsc::Sender<LateEvent>,
    today: NaiveDate,
) -> Result<NightlyReport, sqlx::Error> {
    let profiles = store::active_profiles(pool).await?;
    let mut report = NightlyReport::default();

    for profile in &profiles {
        report.examined += 1;
        if let Err(e) = reconcile_employee(pool, late_tx, profile, today, &mut report).await {
            report.failed += 1;
            warn!(
                error = %e,
                finger_id = profile.finger_id,
                "nightly reconciliation failed for employee"
            );
        }
    }

    info!(?report, %today, "nightly reconciliation finished");
    Ok(report)
}

async fn reconcile_employee(
    pool: &MySqlPool,
    late_tx: &mpsc::Sender<LateEvent>,
    profile: &EmployeeProfile,
    today: NaiveDate,
    report: &mut NightlyReport,
) -> Result<(), AttendanceError> {
    if !policy::is_working_day(&profile.weekly_working_days, today) {
        report.non_working += 1;
        return Ok(());
    }

    let day = store::find_day(pool, profile.finger_id, today).await?;
    let existing = match &day {
        Some(d) => Some(ExistingDay {
            status: d.status_enum(),
            has_checkout: store::has_checkout(pool, d.id).await?,
        }),
        None => None,
    };
    let facts = DayFacts {
        roster: store::roster_applies(pool, profile.finger_id, today).await?,
        approved_leave: day.is_none()
            && store::approved_leave_covers(pool, profile.id, today).await?,
        existing,
    };

    match plan_day(&facts) {
        DayPlan::LeaveAlone => {
            report.already_terminal += 1;
        }

        DayPlan::Update {
            synthesize_checkout,
            force_roaster,
        } => {
            let Some(day) = day else { return Ok(()) };

            if synthesize_checkout {
                // an unusable policy means we cannot place the synthetic
                // checkout; fail closed and leave the day open
                let window = match policy::resolve_window(
                    &profile.working_time_start,
                    &profile.working_time_end,
                    today,
                ) {
                    Ok(window) => window,
                    Err(e) => {
                        warn!(
                            error = %e,
                            finger_id = profile.finger_id,
                            "skipping synthetic checkout, policy unusable"
                        );
                        return Ok(());
                    }
                };
                let checkout = PunchEvent {
                    finger_id: profile.finger_id,
                    date: today,
                    time: window.end.time(),
                    direction: LogDirection::CheckOut,
                };
                match reconcile::record_punch(pool, late_tx, profile, &checkout).await {
                    Ok(_) => report.closed_out += 1,
                    // a live punch landed between the check and the append
                    Err(e) if e.is_duplicate() => {
                        debug!(finger_id = profile.finger_id, "checkout appeared mid-run");
                    }
                    Err(e) => return Err(e),
                }
            }

            // roster overrides in-progress attendance, even retroactively
            if force_roaster {
                store::update_status(pool, day.id, AttendanceStatus::Roaster).await?;
                report.roaster_forced += 1;
            }
        }

        DayPlan::Create(status) => {
            match store::create_day(pool, profile.finger_id, today, status).await? {
                CreateDayOutcome::Created => match status {
                    AttendanceStatus::Roaster => report.created_roaster += 1,
                    AttendanceStatus::Leave => report.created_leave += 1,
                    _ => report.created_absent += 1,
                },
                // a manual punch raced the job; today's record is theirs now
                CreateDayOutcome::AlreadyExists => {
                    debug!(finger_id = profile.finger_id, "day record appeared mid-run");
                }
            }
        }
    }

    Ok(())
}

/// Sleeps until the next `run_at` wall-clock time in the policy timezone,
/// runs the reconciliation for that policy-local date, repeats.
pub async fn run_scheduler(
    pool: MySqlPool,
    late_tx: mpsc::Sender<LateEvent>,
    tz: Tz,
    run_at: NaiveTime,
) {
    loop {
        let now = Utc::now().with_timezone(&tz).naive_local();
        let mut next = now.date().and_time(run_at);
        if next <= now {
            next = (now.date() + Duration::days(1)).and_time(run_at);
        }
        let wait = (next - now).to_std().unwrap_or_default();
        debug!(%next, "nightly reconciliation sleeping");
        tokio::time::sleep(wait).await;

        let today = Utc::now().with_timezone(&tz).date_naive();
        if let Err(e) = run_nightly(&pool, &late_tx, today).await {
            error!(error = %e, "nightly reconciliation aborted");
        }
    }
}
