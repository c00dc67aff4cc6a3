//! Error types for century-weather services.

use thiserror::Error;

/// Result type alias using CenturyError.
pub type CenturyResult<T> = Result<T, CenturyError>;

/// Primary error type for the observation services.
#[derive(Debug, Error)]
pub enum CenturyError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid hour token: {0}")]
    InvalidHourToken(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    // === Data Errors ===
    #[error("No observations for hour: {0}")]
    DataNotAvailable(String),

    #[error("Region not found: {0}")]
    RegionNotFound(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // === Storage Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl CenturyError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CenturyError::MissingParameter(_)
            | CenturyError::InvalidParameter { .. }
            | CenturyError::InvalidHourToken(_)
            | CenturyError::InvalidCoordinate(_)
            | CenturyError::MalformedRecord(_) => 400,

            CenturyError::DataNotAvailable(_) | CenturyError::RegionNotFound(_) => 404,

            CenturyError::ServiceUnavailable(_) => 503,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for CenturyError {
    fn from(err: std::io::Error) -> Self {
        CenturyError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for CenturyError {
    fn from(err: serde_json::Error) -> Self {
        CenturyError::InternalError(format!("JSON error: {}", err))
    }
}
