use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced by the HTTP handlers.
///
/// Every variant renders as a JSON string body carrying its message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request payload")]
    InvalidPayload,

    #[error("Key is required!")]
    KeyRequired,

    #[error("Value is required!")]
    ValueRequired,

    #[error("Key is not found!, {0}")]
    KeyNotFound(String),

    #[error("StartDate is required!")]
    StartDateRequired,

    #[error("EndDate is required!")]
    EndDateRequired,

    #[error("MaxCount is required!")]
    MaxCountRequired,

    #[error("MinCount is required!")]
    MinCountRequired,

    #[error(transparent)]
    Records(#[from] RecordError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::KeyNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_string())).into_response()
    }
}

/// Failures of the record aggregation.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Date is not “YYYY-MM-DD” format!")]
    DateFormat,

    #[error("record query failed: {0}")]
    Query(#[from] mongodb::error::Error),

    #[error("failed to decode record: {0}")]
    Decode(String),

    #[error("record store did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

impl From<mongodb::bson::de::Error> for RecordError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        RecordError::Decode(e.to_string())
    }
}

/// Snapshot file failures. Never fatal; callers log and carry on.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace snapshot file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid listen address {0:?}")]
    ListenAddr(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_embeds_key() {
        let err = ApiError::KeyNotFound("missing-key".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Key is not found!, missing-key");
    }

    #[test]
    fn date_format_is_a_bad_request() {
        let err = ApiError::from(RecordError::DateFormat);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Date is not “YYYY-MM-DD” format!");
    }
}
