use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Day-level status, stored as the upper-case string in `attendance.status`.
///
/// `Roaster` keeps the spelling the terminals and existing reports use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    HalfDay,
    Absent,
    Leave,
    Roaster,
}

impl AttendanceStatus {
    /// Statuses the nightly job never revisits once set.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AttendanceStatus::Absent | AttendanceStatus::Leave | AttendanceStatus::Roaster
        )
    }
}

/// Punch direction, stored as `CHECK_IN` / `CHECK_OUT` in `attendance_logs.direction`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogDirection {
    CheckIn,
    CheckOut,
}

impl LogDirection {
    /// Device wire flag: "0" = check-in, "1" = check-out.
    pub fn from_device_flag(flag: &str) -> Option<Self> {
        match flag {
            "0" => Some(LogDirection::CheckIn),
            "1" => Some(LogDirection::CheckOut),
            _ => None,
        }
    }
}

/// One row per (finger_id, date), unique-keyed in the schema.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceDay {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1042)]
    pub finger_id: i64,
    #[schema(example = "2026-08-30", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "LATE")]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendanceDay {
    pub fn status_enum(&self) -> Option<AttendanceStatus> {
        self.status.parse().ok()
    }
}

/// Immutable punch row owned by one AttendanceDay.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub attendance_id: u64,
    #[schema(example = "CHECK_IN")]
    pub direction: String,
    #[schema(example = "2026-08-30T09:05:00", value_type = String, format = "date-time")]
    pub punched_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl AttendanceLog {
    pub fn direction_enum(&self) -> Option<LogDirection> {
        self.direction.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_db_strings() {
        assert_eq!(AttendanceStatus::OnTime.to_string(), "ON_TIME");
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "HALF_DAY");
        assert_eq!(AttendanceStatus::Roaster.to_string(), "ROASTER");
        assert_eq!(
            "HALF_DAY".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::HalfDay
        );
        assert!("half_day".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn status_serde_matches_db_strings() {
        let s: AttendanceStatus = serde_json::from_str("\"ON_TIME\"").unwrap();
        assert_eq!(s, AttendanceStatus::OnTime);
        let v = serde_json::to_value(AttendanceStatus::Late).unwrap();
        assert_eq!(v, serde_json::json!("LATE"));
    }

    #[test]
    fn terminal_statuses() {
        assert!(AttendanceStatus::Absent.is_terminal());
        assert!(AttendanceStatus::Leave.is_terminal());
        assert!(AttendanceStatus::Roaster.is_terminal());
        assert!(!AttendanceStatus::OnTime.is_terminal());
        assert!(!AttendanceStatus::Late.is_terminal());
        assert!(!AttendanceStatus::HalfDay.is_terminal());
    }

    #[test]
    fn direction_from_device_flag() {
        assert_eq!(
            LogDirection::from_device_flag("0"),
            Some(LogDirection::CheckIn)
        );
        assert_eq!(
            LogDirection::from_device_flag("1"),
            Some(LogDirection::CheckOut)
        );
        assert_eq!(LogDirection::from_device_flag("2"), None);
    }
}
