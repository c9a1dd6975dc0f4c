use crate::model::attendance::{AttendanceStatus, LogDirection};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

/// One closed check-in/check-out pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    #[schema(example = "2026-08-24T09:00:00", value_type = String, format = "date-time")]
    pub entry: NaiveDateTime,
    #[schema(example = "2026-08-24T13:00:00", value_type = String, format = "date-time")]
    pub exit: NaiveDateTime,
    #[schema(example = "4h 0m")]
    pub duration: String,
}

/// Read-side aggregate of one day's logs.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DayDetails {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub entry_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub exit_time: Option<NaiveDateTime>,
    /// Completed inside-to-outside transitions for the day.
    #[schema(example = 2)]
    pub outside_count: u32,
    #[schema(example = "8h 0m")]
    pub total_office_time: Option<String>,
    pub sessions: Vec<SessionView>,
}

pub fn format_duration(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Reconstructs sessions from a day's logs, sorted ascending by timestamp.
///
/// A pending check-in opens a session and the next check-out closes it. A
/// second consecutive check-out extends the previous session instead of
/// opening an empty one (terminals resend checkouts). A second consecutive
/// check-in is ignored. Returns `None` when there are no logs at all.
pub fn aggregate_sessions(logs: &[(LogDirection, NaiveDateTime)]) -> Option<DayDetails> {
    if logs.is_empty() {
        return None;
    }

    let mut sorted: Vec<(LogDirection, NaiveDateTime)> = logs.to_vec();
    sorted.sort_by_key(|(_, at)| *at);

    let mut sessions: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    let mut pending_check_in: Option<NaiveDateTime> = None;
    let mut outside_count: u32 = 0;

    for (direction, at) in sorted {
        match direction {
            LogDirection::CheckIn => {
                if pending_check_in.is_none() {
                    pending_check_in = Some(at);
                }
            }
            LogDirection::CheckOut => {
                if let Some(entry) = pending_check_in.take() {
                    sessions.push((entry, at));
                    outside_count += 1;
                } else if let Some(last) = sessions.last_mut() {
                    // resent checkout: push the previous exit forward
                    last.1 = at;
                    outside_count += 1;
                }
                // a checkout with no session at all is kept in the log
                // table but contributes nothing here
            }
        }
    }

    let views: Vec<SessionView> = sessions
        .iter()
        .map(|(entry, exit)| SessionView {
            entry: *entry,
            exit: *exit,
            duration: format_duration(*exit - *entry),
        })
        .collect();

    let total: Duration = sessions
        .iter()
        .fold(Duration::zero(), |acc, (entry, exit)| acc + (*exit - *entry));

    Some(DayDetails {
        entry_time: sessions.first().map(|(entry, _)| *entry),
        exit_time: sessions.last().map(|(_, exit)| *exit),
        outside_count,
        total_office_time: if sessions.is_empty() {
            None
        } else {
            Some(format_duration(total))
        },
        sessions: views,
    })
}

/// Total closed-session minutes for a day, 0 when nothing closed.
pub fn total_worked_minutes(logs: &[(LogDirection, NaiveDateTime)]) -> i64 {
    let mut sorted: Vec<(LogDirection, NaiveDateTime)> = logs.to_vec();
    sorted.sort_by_key(|(_, at)| *at);

    let mut sessions: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    let mut pending: Option<NaiveDateTime> = None;
    for (direction, at) in sorted {
        match direction {
            LogDirection::CheckIn => {
                if pending.is_none() {
                    pending = Some(at);
                }
            }
            LogDirection::CheckOut => {
                if let Some(entry) = pending.take() {
                    sessions.push((entry, at));
                } else if let Some(last) = sessions.last_mut() {
                    last.1 = at;
                }
            }
        }
    }
    sessions
        .iter()
        .map(|(entry, exit)| (*exit - *entry).num_minutes())
        .sum()
}

/// First CHECK_IN timestamp in ascending order, for status recomputation.
pub fn first_check_in(logs: &[(LogDirection, NaiveDateTime)]) -> Option<NaiveDateTime> {
    logs.iter()
        .filter(|(d, _)| *d == LogDirection::CheckIn)
        .map(|(_, at)| *at)
        .min()
}

/// Last CHECK_OUT timestamp in ascending order.
pub fn last_check_out(logs: &[(LogDirection, NaiveDateTime)]) -> Option<NaiveDateTime> {
    logs.iter()
        .filter(|(d, _)| *d == LogDirection::CheckOut)
        .map(|(_, at)| *at)
        .max()
}

/// Inclusive calendar-month bounds containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let last = next_month
        .map(|d| d - Duration::days(1))
        .unwrap_or(date);
    (first, last)
}

/// Per-status day counts and total worked time for one identity and month.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlySummary {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 8)]
    pub month: u32,
    pub on_time: u32,
    pub late: u32,
    pub half_day: u32,
    pub absent: u32,
    pub leave: u32,
    pub roaster: u32,
    #[schema(example = "168h 30m")]
    pub total_office_time: String,
}

/// Rolls up one month of (status, worked-minutes) day tuples.
pub fn monthly_summary(
    year: i32,
    month: u32,
    days: impl IntoIterator<Item = (AttendanceStatus, i64)>,
) -> MonthlySummary {
    let mut summary = MonthlySummary {
        year,
        month,
        on_time: 0,
        late: 0,
        half_day: 0,
        absent: 0,
        leave: 0,
        roaster: 0,
        total_office_time: String::new(),
    };
    let mut total_minutes: i64 = 0;

    for (status, minutes) in days {
        match status {
            AttendanceStatus::OnTime => summary.on_time += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::HalfDay => summary.half_day += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::Leave => summary.leave += 1,
            AttendanceStatus::Roaster => summary.roaster += 1,
        }
        total_minutes += minutes.max(0);
    }

    summary.total_office_time = format_duration(Duration::minutes(total_minutes));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    const IN: LogDirection = LogDirection::CheckIn;
    const OUT: LogDirection = LogDirection::CheckOut;

    #[test]
    fn empty_logs_yield_nothing() {
        assert!(aggregate_sessions(&[]).is_none());
    }

    #[test]
    fn two_sessions_sum_to_full_day() {
        let logs = [
            (IN, at(9, 0)),
            (OUT, at(13, 0)),
            (IN, at(14, 0)),
            (OUT, at(18, 0)),
        ];
        let details = aggregate_sessions(&logs).unwrap();
        assert_eq!(details.sessions.len(), 2);
        assert_eq!(details.sessions[0].duration, "4h 0m");
        assert_eq!(details.sessions[1].duration, "4h 0m");
        assert_eq!(details.total_office_time.as_deref(), Some("8h 0m"));
        assert_eq!(details.outside_count, 2);
        assert_eq!(details.entry_time, Some(at(9, 0)));
        assert_eq!(details.exit_time, Some(at(18, 0)));
        assert_eq!(total_worked_minutes(&logs), 480);
    }

    #[test]
    fn resent_checkout_extends_previous_session() {
        let logs = [(IN, at(9, 0)), (OUT, at(13, 0)), (OUT, at(13, 30))];
        let details = aggregate_sessions(&logs).unwrap();
        assert_eq!(details.sessions.len(), 1);
        assert_eq!(details.sessions[0].exit, at(13, 30));
        assert_eq!(details.sessions[0].duration, "4h 30m");
        assert_eq!(details.total_office_time.as_deref(), Some("4h 30m"));
    }

    #[test]
    fn duplicate_check_in_is_ignored() {
        let logs = [(IN, at(9, 0)), (IN, at(9, 10)), (OUT, at(12, 0))];
        let details = aggregate_sessions(&logs).unwrap();
        assert_eq!(details.sessions.len(), 1);
        assert_eq!(details.sessions[0].entry, at(9, 0));
        assert_eq!(details.sessions[0].duration, "3h 0m");
    }

    #[test]
    fn lone_checkout_produces_no_session() {
        let logs = [(OUT, at(18, 0))];
        let details = aggregate_sessions(&logs).unwrap();
        assert!(details.sessions.is_empty());
        assert_eq!(details.outside_count, 0);
        assert_eq!(details.total_office_time, None);
        assert_eq!(total_worked_minutes(&logs), 0);
    }

    #[test]
    fn open_session_not_counted_until_closed() {
        let logs = [(IN, at(9, 0))];
        let details = aggregate_sessions(&logs).unwrap();
        assert!(details.sessions.is_empty());
        assert_eq!(details.entry_time, None);
        assert_eq!(total_worked_minutes(&logs), 0);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let logs = [(OUT, at(18, 0)), (IN, at(9, 0))];
        let details = aggregate_sessions(&logs).unwrap();
        assert_eq!(details.sessions.len(), 1);
        assert_eq!(details.sessions[0].duration, "9h 0m");
    }

    #[test]
    fn first_in_last_out_helpers() {
        let logs = [
            (IN, at(9, 0)),
            (OUT, at(13, 0)),
            (IN, at(14, 0)),
            (OUT, at(18, 0)),
        ];
        assert_eq!(first_check_in(&logs), Some(at(9, 0)));
        assert_eq!(last_check_out(&logs), Some(at(18, 0)));
        assert_eq!(first_check_in(&[(OUT, at(18, 0))]), None);
    }

    #[test]
    fn admitted_alternating_pairs_come_back_unchanged() {
        use crate::attendance::state::PunchState;

        // punches that survive the reconciler's state machine must come
        // back out of the aggregator as exactly the same pairs
        let punches = [
            (IN, at(9, 0)),
            (OUT, at(12, 30)),
            (IN, at(13, 15)),
            (OUT, at(18, 0)),
        ];

        let mut state = PunchState::Empty;
        let mut admitted = Vec::new();
        for (direction, at) in punches {
            state = state.admit(direction).unwrap();
            admitted.push((direction, at));
        }

        let details = aggregate_sessions(&admitted).unwrap();
        let rebuilt: Vec<(LogDirection, NaiveDateTime)> = details
            .sessions
            .iter()
            .flat_map(|s| [(IN, s.entry), (OUT, s.exit)])
            .collect();
        assert_eq!(rebuilt, admitted);
        assert_eq!(details.outside_count, 2);

        // and the machine rejects the punch that would break the pairing
        assert!(state.admit(OUT).is_err());
    }

    #[test]
    fn month_bounds_handles_december() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2026, 12, 15).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());

        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn monthly_rollup_counts_and_totals() {
        let days = vec![
            (AttendanceStatus::OnTime, 480),
            (AttendanceStatus::Late, 450),
            (AttendanceStatus::HalfDay, 240),
            (AttendanceStatus::Absent, 0),
            (AttendanceStatus::Leave, 0),
        ];
        let s = monthly_summary(2026, 8, days);
        assert_eq!(s.on_time, 1);
        assert_eq!(s.late, 1);
        assert_eq!(s.half_day, 1);
        assert_eq!(s.absent, 1);
        assert_eq!(s.leave, 1);
        assert_eq!(s.roaster, 0);
        assert_eq!(s.total_office_time, "19h 30m");
    }
}
