use crate::api::attendance::{
    AttendanceDayView, AttendanceListResponse, ManualPunchRequest,
};
use crate::attendance::sessions::{DayDetails, MonthlySummary, SessionView};
use crate::model::attendance::{AttendanceDay, AttendanceLog, AttendanceStatus, LogDirection};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Engine API",
        version = "1.0.0",
        description = r#"
## Attendance Tracking & Status-Determination Engine

Ingests raw punches from biometric terminals and manual entry, reconciles
them into per-day attendance records, and derives a daily status from
department working-hour policy.

### 🔹 Key Features
- **Device Feed**
  - ZK-style terminal uploads on `/iclock/cdata` (always acknowledged)
- **Manual Punch**
  - Authenticated back-office punch entry with explicit conflict errors
- **Status Determination**
  - ON_TIME / LATE / HALF_DAY / ABSENT from the department working window
- **Reporting**
  - Date-range listings with per-session breakdowns and monthly summaries

### 📦 Response Format
- JSON-based RESTful responses (device feed answers plain-text `OK`)

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::device_feed,
        crate::api::attendance::manual_punch,
        crate::api::attendance::list_attendance,
        crate::api::attendance::monthly_summary,
    ),
    components(
        schemas(
            ManualPunchRequest,
            AttendanceDay,
            AttendanceLog,
            AttendanceStatus,
            LogDirection,
            AttendanceDayView,
            AttendanceListResponse,
            DayDetails,
            SessionView,
            MonthlySummary
        )
    ),
    tags(
        (name = "Attendance", description = "Punch ingestion and attendance reporting APIs"),
    )
)]
pub struct ApiDoc;
