use chrono::NaiveTime;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    /// Single timezone governing every wall-clock comparison: punch
    /// normalization, "today" for the nightly job, month bounds.
    pub policy_timezone: Tz,
    /// Policy-local time of day the nightly reconciliation runs.
    pub nightly_run_time: NaiveTime,
    /// LATE days per month before the warning goes out.
    pub late_warn_threshold: i64,
    pub late_event_buffer: usize,

    // Rate limiting
    pub rate_device_per_min: u32,
    pub rate_manual_per_min: u32,
    pub rate_query_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            policy_timezone: env::var("POLICY_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Dhaka".to_string())
                .parse()
                .expect("POLICY_TIMEZONE must be a valid IANA timezone name"),
            nightly_run_time: NaiveTime::parse_from_str(
                &env::var("NIGHTLY_RUN_TIME").unwrap_or_else(|_| "23:45".to_string()),
                "%H:%M",
            )
            .expect("NIGHTLY_RUN_TIME must be HH:MM"),
            late_warn_threshold: env::var("LATE_WARN_THRESHOLD")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap(),
            late_event_buffer: env::var("LATE_EVENT_BUFFER")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap(),

            rate_device_per_min: env::var("RATE_DEVICE_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),
            rate_manual_per_min: env::var("RATE_MANUAL_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_query_per_min: env::var("RATE_QUERY_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
