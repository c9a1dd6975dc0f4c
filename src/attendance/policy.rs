use crate::attendance::error::AttendanceError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Working window for one calendar date, both ends policy-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WorkWindow {
    /// Half the nominal working duration, the HALF_DAY cutoff.
    pub fn half_day_threshold(&self) -> Duration {
        (self.end - self.start) / 2
    }
}

/// Parses a department working-time string.
///
/// Accepts 24-hour ("09:30", "18:00") and 12-hour-with-meridiem
/// ("9:30 AM", "6:00 pm") notation. Returns `None` on anything else so the
/// caller can fail closed instead of crashing ingestion.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    let is_pm = upper.contains("PM");
    let is_am = upper.contains("AM");
    let clean = upper.replace("AM", "").replace("PM", "");
    let clean = clean.trim();

    let mut parts = clean.split(':');
    let mut hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    if is_pm && hours < 12 {
        hours += 12;
    }
    if is_am && hours == 12 {
        hours = 0;
    }

    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Anchors the department's working-time strings to `date`.
///
/// Fails closed: unparseable strings or a window that does not run forward
/// come back as `PolicyResolution`, which every caller treats as "not a
/// working day" rather than a crash.
pub fn resolve_window(
    start_raw: &str,
    end_raw: &str,
    date: NaiveDate,
) -> Result<WorkWindow, AttendanceError> {
    let start_time = parse_time_of_day(start_raw).ok_or_else(|| {
        AttendanceError::PolicyResolution(format!("bad working start time {start_raw:?}"))
    })?;
    let end_time = parse_time_of_day(end_raw).ok_or_else(|| {
        AttendanceError::PolicyResolution(format!("bad working end time {end_raw:?}"))
    })?;

    if end_time <= start_time {
        return Err(AttendanceError::PolicyResolution(format!(
            "working window {start_raw:?}..{end_raw:?} does not run forward"
        )));
    }

    Ok(WorkWindow {
        start: date.and_time(start_time),
        end: date.and_time(end_time),
    })
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// True when `date` falls on one of the configured working weekdays.
/// `days_csv` is the comma-separated upper-case list stored on the
/// department, e.g. "SUNDAY,MONDAY,TUESDAY,WEDNESDAY,THURSDAY".
pub fn is_working_day(days_csv: &str, date: NaiveDate) -> bool {
    let name = weekday_name(date.weekday());
    days_csv
        .split(',')
        .any(|d| d.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_24_hour_times() {
        assert_eq!(
            parse_time_of_day("09:30"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            parse_time_of_day("18:00"),
            NaiveTime::from_hms_opt(18, 0, 0)
        );
        assert_eq!(parse_time_of_day(" 7:05 "), NaiveTime::from_hms_opt(7, 5, 0));
    }

    #[test]
    fn parses_meridiem_times() {
        assert_eq!(
            parse_time_of_day("9:30 AM"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            parse_time_of_day("6:00 PM"),
            NaiveTime::from_hms_opt(18, 0, 0)
        );
        assert_eq!(
            parse_time_of_day("12:00 AM"),
            NaiveTime::from_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_time_of_day("12:15 pm"),
            NaiveTime::from_hms_opt(12, 15, 0)
        );
    }

    #[test]
    fn rejects_garbage_times() {
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("soonish"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("09:61"), None);
        assert_eq!(parse_time_of_day("09:30:15:99"), None);
    }

    #[test]
    fn resolves_window_anchored_to_date() {
        let w = resolve_window("09:00", "6:00 PM", date(2026, 8, 24)).unwrap();
        assert_eq!(w.start, date(2026, 8, 24).and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(w.end, date(2026, 8, 24).and_hms_opt(18, 0, 0).unwrap());
        assert_eq!(w.half_day_threshold(), Duration::minutes(270));
    }

    #[test]
    fn fails_closed_on_bad_policy() {
        assert!(resolve_window("whenever", "18:00", date(2026, 8, 24)).is_err());
        assert!(resolve_window("09:00", "", date(2026, 8, 24)).is_err());
        // end before start is as unusable as garbage
        assert!(resolve_window("18:00", "09:00", date(2026, 8, 24)).is_err());
    }

    #[test]
    fn working_day_matches_weekday_names() {
        let days = "SUNDAY,MONDAY,TUESDAY,WEDNESDAY,THURSDAY";
        // 2026-08-24 is a Monday
        assert!(is_working_day(days, date(2026, 8, 24)));
        // 2026-08-28 is a Friday
        assert!(!is_working_day(days, date(2026, 8, 28)));
        // tolerate spacing and case drift in the stored list
        assert!(is_working_day("saturday, Sunday", date(2026, 8, 29)));
        assert!(!is_working_day("", date(2026, 8, 24)));
    }
}
