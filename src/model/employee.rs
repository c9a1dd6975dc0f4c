use serde::{Deserialize, Serialize};

/// Identity-directory row: an employee joined with the department policy
/// needed to classify their punches. Only employees with both a finger id
/// and a department take part in attendance tracking.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub finger_id: i64,
    pub working_time_start: String,
    pub working_time_end: String,
    pub weekly_working_days: String,
}
