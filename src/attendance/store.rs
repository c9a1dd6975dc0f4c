use crate::model::attendance::{AttendanceDay, AttendanceLog, AttendanceStatus, LogDirection};
use crate::model::employee::EmployeeProfile;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{MySql, MySqlPool, Transaction};

/// MySQL integrity-constraint violation (duplicate key included).
pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        db_err.code().as_deref() == Some("23000")
    } else {
        false
    }
}

const PROFILE_SELECT: &str = r#"
    SELECT e.id, e.name, e.email, e.finger_id,
           d.working_time_start, d.working_time_end, d.weekly_working_days
    FROM employees e
    JOIN departments d ON d.id = e.department_id
    WHERE e.verified = TRUE AND e.status = 'ACTIVATE' AND e.finger_id IS NOT NULL
"#;

/// Active, verified employee with a department, by identity key.
pub async fn find_profile_by_finger_id(
    pool: &MySqlPool,
    finger_id: i64,
) -> Result<Option<EmployeeProfile>, sqlx::Error> {
    let sql = format!("{PROFILE_SELECT} AND e.finger_id = ?");
    sqlx::query_as::<_, EmployeeProfile>(&sql)
        .bind(finger_id)
        .fetch_optional(pool)
        .await
}

/// Everyone the nightly job must reconcile.
pub async fn active_profiles(pool: &MySqlPool) -> Result<Vec<EmployeeProfile>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeProfile>(PROFILE_SELECT)
        .fetch_all(pool)
        .await
}

const DAY_COLUMNS: &str = "id, finger_id, date, status, created_at, updated_at";

/// Day-record lookup for one identity and calendar date.
pub async fn find_day(
    pool: &MySqlPool,
    finger_id: i64,
    date: NaiveDate,
) -> Result<Option<AttendanceDay>, sqlx::Error> {
    let sql = format!("SELECT {DAY_COLUMNS} FROM attendance WHERE finger_id = ? AND date = ?");
    sqlx::query_as::<_, AttendanceDay>(&sql)
        .bind(finger_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

/// Same lookup under a row lock, inside the append transaction, so two
/// concurrent punches for one day serialize on the read-append-recompute
/// sequence.
pub async fn find_day_for_update(
    tx: &mut Transaction<'_, MySql>,
    finger_id: i64,
    date: NaiveDate,
) -> Result<Option<AttendanceDay>, sqlx::Error> {
    let sql = format!(
        "SELECT {DAY_COLUMNS} FROM attendance WHERE finger_id = ? AND date = ? FOR UPDATE"
    );
    sqlx::query_as::<_, AttendanceDay>(&sql)
        .bind(finger_id)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDayOutcome {
    Created,
    /// Unique key fired: someone else created the row first.
    AlreadyExists,
}

/// Inserts a day record, mapping the `(finger_id, date)` unique-key
/// violation to `AlreadyExists` instead of an error. This is what makes
/// find-or-create safe across worker processes.
pub async fn create_day(
    pool: &MySqlPool,
    finger_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<CreateDayOutcome, sqlx::Error> {
    let result = sqlx::query("INSERT INTO attendance (finger_id, date, status) VALUES (?, ?, ?)")
        .bind(finger_id)
        .bind(date)
        .bind(status.to_string())
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(CreateDayOutcome::Created),
        Err(e) if is_duplicate_key(&e) => Ok(CreateDayOutcome::AlreadyExists),
        Err(e) => Err(e),
    }
}

/// Find-or-create with the provisional ON_TIME default; the status is
/// overwritten as soon as a log lands.
pub async fn find_or_create_day(
    pool: &MySqlPool,
    finger_id: i64,
    date: NaiveDate,
) -> Result<AttendanceDay, sqlx::Error> {
    if let Some(day) = find_day(pool, finger_id, date).await? {
        return Ok(day);
    }
    // AlreadyExists here means a concurrent punch won the insert race;
    // either way the follow-up lookup must find the row.
    create_day(pool, finger_id, date, AttendanceStatus::OnTime).await?;
    find_day(pool, finger_id, date)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

const LOG_COLUMNS: &str = "id, attendance_id, direction, punched_at, created_at";

/// Most recent log for the day, driving the punch state machine.
pub async fn last_log(
    tx: &mut Transaction<'_, MySql>,
    attendance_id: u64,
) -> Result<Option<AttendanceLog>, sqlx::Error> {
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM attendance_logs \
         WHERE attendance_id = ? ORDER BY punched_at DESC, id DESC LIMIT 1"
    );
    sqlx::query_as::<_, AttendanceLog>(&sql)
        .bind(attendance_id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn insert_log(
    tx: &mut Transaction<'_, MySql>,
    attendance_id: u64,
    direction: LogDirection,
    punched_at: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO attendance_logs (attendance_id, direction, punched_at) VALUES (?, ?, ?)")
        .bind(attendance_id)
        .bind(direction.to_string())
        .bind(punched_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Day's logs in timestamp order, inside the append transaction.
pub async fn logs_for_day_tx(
    tx: &mut Transaction<'_, MySql>,
    attendance_id: u64,
) -> Result<Vec<AttendanceLog>, sqlx::Error> {
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM attendance_logs \
         WHERE attendance_id = ? ORDER BY punched_at ASC, id ASC"
    );
    sqlx::query_as::<_, AttendanceLog>(&sql)
        .bind(attendance_id)
        .fetch_all(&mut **tx)
        .await
}

pub async fn update_status_tx(
    tx: &mut Transaction<'_, MySql>,
    attendance_id: u64,
    status: AttendanceStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE attendance SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(attendance_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Direct status write, used by the nightly job's roster override.
pub async fn update_status(
    pool: &MySqlPool,
    attendance_id: u64,
    status: AttendanceStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE attendance SET status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(attendance_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn has_checkout(pool: &MySqlPool, attendance_id: u64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance_logs WHERE attendance_id = ? AND direction = ?",
    )
    .bind(attendance_id)
    .bind(LogDirection::CheckOut.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Approved leave interval covering `date`, keyed by the employee account
/// (leave belongs to the account, not the badge).
pub async fn approved_leave_covers(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leaves \
         WHERE employee_id = ? AND status = 'APPROVED' AND start_date <= ? AND end_date >= ?",
    )
    .bind(employee_id)
    .bind(date)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn roster_applies(
    pool: &MySqlPool,
    finger_id: i64,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM roster_days WHERE finger_id = ? AND date = ?")
            .bind(finger_id)
            .bind(date)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// LATE day count for one identity inside an inclusive date range.
pub async fn late_count_in_range(
    pool: &MySqlPool,
    finger_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance \
         WHERE finger_id = ? AND status = ? AND date >= ? AND date <= ?",
    )
    .bind(finger_id)
    .bind(AttendanceStatus::Late.to_string())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
}

/// Range query behind the reporting surface: optional identity and status
/// filters, built the same way the rest of the service builds dynamic
/// WHERE clauses.
pub async fn days_in_range(
    pool: &MySqlPool,
    finger_id: Option<i64>,
    status: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceDay>, sqlx::Error> {
    let mut sql = format!(
        "SELECT {DAY_COLUMNS} FROM attendance WHERE date >= ? AND date <= ?"
    );
    if finger_id.is_some() {
        sql.push_str(" AND finger_id = ?");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY finger_id ASC, date ASC");

    let mut query = sqlx::query_as::<_, AttendanceDay>(&sql).bind(start).bind(end);
    if let Some(finger_id) = finger_id {
        query = query.bind(finger_id);
    }
    if let Some(status) = status {
        query = query.bind(status);
    }
    query.fetch_all(pool).await
}

/// Logs for a set of day records, ascending, for read-side aggregation.
pub async fn logs_for_days(
    pool: &MySqlPool,
    attendance_ids: &[u64],
) -> Result<Vec<AttendanceLog>, sqlx::Error> {
    if attendance_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; attendance_ids.len()].join(", ");
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM attendance_logs \
         WHERE attendance_id IN ({placeholders}) ORDER BY punched_at ASC, id ASC"
    );
    let mut query = sqlx::query_as::<_, AttendanceLog>(&sql);
    for id in attendance_ids {
        query = query.bind(*id);
    }
    query.fetch_all(pool).await
}
