use crate::attendance::policy::WorkWindow;
use crate::model::attendance::AttendanceStatus;
use chrono::NaiveDateTime;

/// Classifies one day from its first check-in, last check-out and the
/// resolved working window. Pure; the reconciler re-runs it after every
/// log append.
///
/// A check-out is only considered when it lands strictly after the
/// check-in; otherwise the day is scored as still open. Half-day detection
/// deliberately runs before the late check, so a very late arrival with a
/// short stay is HALF_DAY, not LATE.
pub fn determine_status(
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    window: &WorkWindow,
) -> AttendanceStatus {
    let Some(check_in) = check_in else {
        // no check-in means absent, even if stray check-outs exist
        return AttendanceStatus::Absent;
    };

    let half_day_cutoff = window.start + window.half_day_threshold();
    let valid_check_out = check_out.filter(|out| *out > check_in);

    let is_half_day = match valid_check_out {
        None => check_in > half_day_cutoff,
        Some(out) => {
            let worked = out - check_in;
            check_in > half_day_cutoff
                || out < half_day_cutoff
                || worked < window.half_day_threshold()
        }
    };

    if is_half_day {
        return AttendanceStatus::HalfDay;
    }

    if check_in > window.start {
        return AttendanceStatus::Late;
    }

    AttendanceStatus::OnTime
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    // 09:00-18:00 window, so the half-day threshold is 4h30m and the
    // half-day cutoff is 13:30.
    fn window() -> WorkWindow {
        WorkWindow {
            start: at(9, 0),
            end: at(18, 0),
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 24)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn no_check_in_is_absent() {
        assert_eq!(
            determine_status(None, None, &window()),
            AttendanceStatus::Absent
        );
        // stray check-out without a check-in changes nothing
        assert_eq!(
            determine_status(None, Some(at(18, 0)), &window()),
            AttendanceStatus::Absent
        );
    }

    #[test]
    fn on_time_before_window_start() {
        assert_eq!(
            determine_status(Some(at(8, 55)), Some(at(18, 0)), &window()),
            AttendanceStatus::OnTime
        );
        assert_eq!(
            determine_status(Some(at(9, 0)), Some(at(18, 0)), &window()),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn any_arrival_after_start_is_late() {
        assert_eq!(
            determine_status(Some(at(9, 5)), Some(at(18, 0)), &window()),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn short_or_shifted_days_are_half_day() {
        // arrived past the 13:30 cutoff
        assert_eq!(
            determine_status(Some(at(14, 0)), Some(at(18, 0)), &window()),
            AttendanceStatus::HalfDay
        );
        // left before the cutoff
        assert_eq!(
            determine_status(Some(at(9, 0)), Some(at(12, 0)), &window()),
            AttendanceStatus::HalfDay
        );
        // worked less than the threshold even though both ends look fine
        assert_eq!(
            determine_status(Some(at(10, 0)), Some(at(14, 0)), &window()),
            AttendanceStatus::HalfDay
        );
    }

    #[test]
    fn open_day_scored_from_check_in_alone() {
        // no checkout yet: on time / late / half-day purely by arrival
        assert_eq!(
            determine_status(Some(at(8, 50)), None, &window()),
            AttendanceStatus::OnTime
        );
        assert_eq!(
            determine_status(Some(at(9, 20)), None, &window()),
            AttendanceStatus::Late
        );
        assert_eq!(
            determine_status(Some(at(13, 31)), None, &window()),
            AttendanceStatus::HalfDay
        );
    }

    #[test]
    fn half_day_wins_over_late() {
        // A very late arrival with a short stay must be HALF_DAY, not LATE:
        // the half-day test runs first and this ordering is intentional.
        assert_eq!(
            determine_status(Some(at(15, 0)), Some(at(16, 0)), &window()),
            AttendanceStatus::HalfDay
        );
    }

    #[test]
    fn checkout_at_or_before_check_in_is_ignored() {
        // equal timestamps: not a valid checkout, day scored as open
        assert_eq!(
            determine_status(Some(at(9, 20)), Some(at(9, 20)), &window()),
            AttendanceStatus::Late
        );
        // checkout behind check-in (clock skew) likewise ignored
        assert_eq!(
            determine_status(Some(at(8, 30)), Some(at(8, 0)), &window()),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let a = determine_status(Some(at(9, 5)), Some(at(18, 0)), &window());
        let b = determine_status(Some(at(9, 5)), Some(at(18, 0)), &window());
        assert_eq!(a, b);
    }
}
