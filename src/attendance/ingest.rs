use crate::attendance::error::AttendanceError;
use crate::model::attendance::LogDirection;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Query-string table name the terminal uses for punch uploads.
pub const ATTLOG_TABLE: &str = "ATTLOG";

/// Marker for operational chatter the terminal interleaves with punches.
const OPLOG_MARKER: &str = "OPLOG";

/// One raw punch line from the terminal, fields still unparsed.
///
/// Wire format: `<fingerId> <date> <time> <direction> <verifyCode>
/// [workCode] [reserve]`, whitespace-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPunch {
    pub finger_id: String,
    pub date: String,
    pub time: String,
    pub direction_flag: String,
    pub verify_code: String,
    pub work_code: Option<String>,
    pub reserve: Option<String>,
}

/// Normalized punch: identity key, policy-local date and wall-clock time,
/// direction. Both ingestion paths converge on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunchEvent {
    pub finger_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub direction: LogDirection,
}

impl PunchEvent {
    pub fn punched_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Scans a device upload body for the first valid punch line.
///
/// Valid means: first token is all digits and the line carries no OPLOG
/// marker. Anything else is device chatter, skipped without error; `None`
/// means "no punch in this delivery", which the caller still acknowledges.
pub fn parse_device_payload(body: &str) -> Option<RawPunch> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains(OPLOG_MARKER) {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let first = fields.first()?;
        if !first.chars().all(|c| c.is_ascii_digit()) || first.is_empty() {
            continue;
        }
        if fields.len() < 5 {
            continue;
        }

        return Some(RawPunch {
            finger_id: fields[0].to_string(),
            date: fields[1].to_string(),
            time: fields[2].to_string(),
            direction_flag: fields[3].to_string(),
            verify_code: fields[4].to_string(),
            work_code: fields.get(5).map(|s| s.to_string()),
            reserve: fields.get(6).map(|s| s.to_string()),
        });
    }
    None
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Builds a `PunchEvent` from already-split string fields. Shared by the
/// device path (`RawPunch::normalize`) and the manual API.
pub fn normalize_punch(
    finger_id: &str,
    date: &str,
    time: &str,
    direction_flag: &str,
) -> Result<PunchEvent, AttendanceError> {
    let finger_id: i64 = finger_id
        .trim()
        .parse()
        .map_err(|_| AttendanceError::MalformedInput(format!("fingerId invalid: {finger_id:?}")))?;
    if finger_id <= 0 {
        return Err(AttendanceError::MalformedInput(format!(
            "fingerId must be positive, got {finger_id}"
        )));
    }

    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AttendanceError::MalformedInput(format!("bad date: {date:?}")))?;

    let time = parse_time(time.trim())
        .ok_or_else(|| AttendanceError::MalformedInput(format!("bad time: {time:?}")))?;

    let direction = LogDirection::from_device_flag(direction_flag.trim()).ok_or_else(|| {
        AttendanceError::MalformedInput(format!("bad check type: {direction_flag:?}"))
    })?;

    Ok(PunchEvent {
        finger_id,
        date,
        time,
        direction,
    })
}

impl RawPunch {
    pub fn normalize(&self) -> Result<PunchEvent, AttendanceError> {
        normalize_punch(&self.finger_id, &self.date, &self.time, &self.direction_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_punch_line() {
        let body = "1042\t2026-08-24 09:05:21\t0\t1\t0\t0\n";
        let punch = parse_device_payload(body).unwrap();
        assert_eq!(punch.finger_id, "1042");
        assert_eq!(punch.date, "2026-08-24");
        assert_eq!(punch.time, "09:05:21");
        assert_eq!(punch.direction_flag, "0");
        assert_eq!(punch.verify_code, "1");
        assert_eq!(punch.work_code.as_deref(), Some("0"));
        assert_eq!(punch.reserve.as_deref(), Some("0"));
    }

    #[test]
    fn skips_oplog_and_chatter_lines() {
        let body = "\
OPLOG 4	2026-08-24 09:00:00	0
device boot sequence complete
1042 2026-08-24 09:05:21 1 1
";
        let punch = parse_device_payload(body).unwrap();
        assert_eq!(punch.finger_id, "1042");
        assert_eq!(punch.direction_flag, "1");
    }

    #[test]
    fn empty_or_junk_body_yields_no_event() {
        assert_eq!(parse_device_payload(""), None);
        assert_eq!(parse_device_payload("OPLOG 7 2026-08-24 1"), None);
        assert_eq!(parse_device_payload("not a punch at all"), None);
        // numeric token but too few fields
        assert_eq!(parse_device_payload("1042 2026-08-24"), None);
    }

    #[test]
    fn normalizes_valid_fields() {
        let event = normalize_punch("1042", "2026-08-24", "09:05", "0").unwrap();
        assert_eq!(event.finger_id, 1042);
        assert_eq!(event.direction, LogDirection::CheckIn);
        assert_eq!(
            event.punched_at(),
            NaiveDate::from_ymd_opt(2026, 8, 24)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap()
        );

        // device lines carry seconds
        let event = normalize_punch("7", "2026-08-24", "18:00:41", "1").unwrap();
        assert_eq!(event.direction, LogDirection::CheckOut);
        assert_eq!(event.time, NaiveTime::from_hms_opt(18, 0, 41).unwrap());
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(normalize_punch("badge", "2026-08-24", "09:05", "0").is_err());
        assert!(normalize_punch("0", "2026-08-24", "09:05", "0").is_err());
        assert!(normalize_punch("-3", "2026-08-24", "09:05", "0").is_err());
        assert!(normalize_punch("1042", "24/08/2026", "09:05", "0").is_err());
        assert!(normalize_punch("1042", "2026-08-24", "quarter past", "0").is_err());
        assert!(normalize_punch("1042", "2026-08-24", "09:05", "2").is_err());
    }
}
