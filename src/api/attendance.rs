use crate::attendance::error::AttendanceError;
use crate::attendance::ingest::{self, ATTLOG_TABLE};
use crate::attendance::notify::LateEvent;
use crate::attendance::reconcile;
use crate::attendance::sessions::{
    self, DayDetails, MonthlySummary, aggregate_sessions, month_bounds, total_worked_minutes,
};
use crate::attendance::store;
use crate::model::attendance::{AttendanceDay, AttendanceStatus, LogDirection};
use actix_web::error::ErrorInternalServerError;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeviceQuery {
    /// Terminal upload table; only "ATTLOG" carries punches
    pub table: Option<String>,
    /// Device serial number (ignored)
    #[serde(rename = "SN")]
    pub sn: Option<String>,
}

/// Biometric terminal feed
///
/// The terminal mixes operational chatter with punch lines and retries
/// deliveries it thinks were lost, so this endpoint never errors: whatever
/// happens, the device gets its "OK" acknowledgement.
#[utoipa::path(
    post,
    path = "/iclock/cdata",
    params(DeviceQuery),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Delivery acknowledged", body = String, example = json!("OK"))
    ),
    tag = "Attendance"
)]
pub async fn device_feed(
    pool: web::Data<MySqlPool>,
    late_tx: web::Data<mpsc::Sender<LateEvent>>,
    query: web::Query<DeviceQuery>,
    body: String,
) -> impl Responder {
    if query.table.as_deref() != Some(ATTLOG_TABLE) {
        tracing::debug!(table = ?query.table, sn = ?query.sn, "non-ATTLOG delivery ignored");
        return HttpResponse::Ok().body("OK");
    }

    if let Some(outcome) = reconcile::punch_from_device(pool.get_ref(), late_tx.get_ref(), &body).await
    {
        info!(
            attendance_id = outcome.attendance_id,
            status = %outcome.status,
            "device punch recorded"
        );
    }

    HttpResponse::Ok().body("OK")
}

#[derive(Deserialize, ToSchema)]
pub struct ManualPunchRequest {
    #[schema(example = 1042)]
    pub finger_id: i64,
    #[schema(example = "2026-08-24", format = "date", value_type = String)]
    pub date: String,
    #[schema(example = "09:05")]
    pub time: String,
    /// "0" = check-in, "1" = check-out (device wire convention)
    #[schema(example = "0")]
    pub check_type: String,
}

/// Manual punch entry
#[utoipa::path(
    post,
    path = "/api/attendance/punch",
    request_body = ManualPunchRequest,
    responses(
        (status = 200, description = "Punch recorded", body = Object, example = json!({
            "message": "Punch recorded",
            "status": "LATE"
        })),
        (status = 400, description = "Invalid punch, unknown finger id or duplicate direction", body = Object, example = json!({
            "message": "user already punched CHECK_IN"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn manual_punch(
    pool: web::Data<MySqlPool>,
    late_tx: web::Data<mpsc::Sender<LateEvent>>,
    payload: web::Json<ManualPunchRequest>,
) -> actix_web::Result<impl Responder> {
    let event = match ingest::normalize_punch(
        &payload.finger_id.to_string(),
        &payload.date,
        &payload.time,
        &payload.check_type,
    ) {
        Ok(event) => event,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
        }
    };

    match reconcile::punch_manual(pool.get_ref(), late_tx.get_ref(), &event).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "message": "Punch recorded",
            "status": outcome.status
        }))),

        Err(AttendanceError::Database(e)) => {
            error!(error = %e, finger_id = event.finger_id, "manual punch failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }

        // malformed input, unknown identity, duplicate direction, bad policy:
        // all caller errors on this path
        Err(e) => Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() }))),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceRangeQuery {
    /// Range start (inclusive)
    pub start_date: NaiveDate,
    /// Range end (inclusive)
    pub end_date: NaiveDate,
    /// Filter by identity key
    pub finger_id: Option<i64>,
    /// Filter by status, e.g. "LATE"
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceDayView {
    #[serde(flatten)]
    pub day: AttendanceDay,
    /// Session breakdown; absent for days without any log
    pub details: Option<DayDetails>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceDayView>,
    #[schema(example = 21)]
    pub total: usize,
}

fn log_pairs(logs: &[crate::model::attendance::AttendanceLog]) -> Vec<(LogDirection, NaiveDateTime)> {
    logs.iter()
        .filter_map(|l| l.direction_enum().map(|d| (d, l.punched_at)))
        .collect()
}

/// Attendance listing with session details
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceRangeQuery),
    responses(
        (status = 200, description = "Attendance rows with session details", body = AttendanceListResponse),
        (status = 400, description = "Bad filter", body = Object, example = json!({
            "message": "Unknown status filter"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceRangeQuery>,
) -> actix_web::Result<impl Responder> {
    if let Some(status) = &query.status {
        if status.parse::<AttendanceStatus>().is_err() {
            return Ok(
                HttpResponse::BadRequest().json(json!({ "message": "Unknown status filter" }))
            );
        }
    }
    if query.end_date < query.start_date {
        return Ok(
            HttpResponse::BadRequest().json(json!({ "message": "end_date before start_date" }))
        );
    }

    let days = store::days_in_range(
        pool.get_ref(),
        query.finger_id,
        query.status.as_deref(),
        query.start_date,
        query.end_date,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "failed to fetch attendance range");
        ErrorInternalServerError("Database error")
    })?;

    let ids: Vec<u64> = days.iter().map(|d| d.id).collect();
    let logs = store::logs_for_days(pool.get_ref(), &ids).await.map_err(|e| {
        error!(error = %e, "failed to fetch attendance logs");
        ErrorInternalServerError("Database error")
    })?;

    let mut by_day: HashMap<u64, Vec<(LogDirection, NaiveDateTime)>> = HashMap::new();
    for log in &logs {
        if let Some(direction) = log.direction_enum() {
            by_day
                .entry(log.attendance_id)
                .or_default()
                .push((direction, log.punched_at));
        }
    }

    let data: Vec<AttendanceDayView> = days
        .into_iter()
        .map(|day| {
            let details = by_day
                .get(&day.id)
                .and_then(|pairs| aggregate_sessions(pairs));
            AttendanceDayView { day, details }
        })
        .collect();

    let total = data.len();
    Ok(HttpResponse::Ok().json(AttendanceListResponse { data, total }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    #[param(example = 1042)]
    pub finger_id: i64,
    #[param(example = 2026)]
    pub year: i32,
    #[param(example = 8)]
    pub month: u32,
}

/// Monthly attendance summary
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Status counts and total office time for the month", body = MonthlySummary),
        (status = 400, description = "Bad month", body = Object, example = json!({
            "message": "Invalid year/month"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn monthly_summary(
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let Some(first) = NaiveDate::from_ymd_opt(query.year, query.month, 1) else {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Invalid year/month" })));
    };
    let (start, end) = month_bounds(first);

    let days = store::days_in_range(pool.get_ref(), Some(query.finger_id), None, start, end)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to fetch month attendance");
            ErrorInternalServerError("Database error")
        })?;

    let ids: Vec<u64> = days.iter().map(|d| d.id).collect();
    let logs = store::logs_for_days(pool.get_ref(), &ids).await.map_err(|e| {
        error!(error = %e, "failed to fetch month logs");
        ErrorInternalServerError("Database error")
    })?;

    let mut by_day: HashMap<u64, Vec<crate::model::attendance::AttendanceLog>> = HashMap::new();
    for log in logs {
        by_day.entry(log.attendance_id).or_default().push(log);
    }

    let tuples = days.iter().map(|day| {
        let minutes = by_day
            .get(&day.id)
            .map(|logs| total_worked_minutes(&log_pairs(logs)))
            .unwrap_or(0);
        // unreadable status strings count as absent rather than vanishing
        (
            day.status_enum().unwrap_or(AttendanceStatus::Absent),
            minutes,
        )
    });

    let summary = sessions::monthly_summary(query.year, query.month, tuples);
    Ok(HttpResponse::Ok().json(summary))
}
