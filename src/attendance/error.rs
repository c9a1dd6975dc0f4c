use crate::model::attendance::LogDirection;
use thiserror::Error;

/// Typed result for the punch-reconciliation core.
///
/// The two ingestion entry points share this taxonomy and decide how to
/// surface each variant: the device feed swallows everything (the terminal
/// interleaves junk with real punches), the manual API reports everything
/// (a human is waiting for the response).
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("invalid punch data: {0}")]
    MalformedInput(String),

    #[error("no active employee with department for finger id {0}")]
    UnknownIdentity(i64),

    #[error("user already punched {0}")]
    DuplicateDirection(LogDirection),

    #[error("unusable working-time policy: {0}")]
    PolicyResolution(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AttendanceError {
    /// Conflict-class errors the device feed drops without logging noise.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AttendanceError::DuplicateDirection(_))
    }
}
