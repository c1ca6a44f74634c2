use axum::http::StatusCode;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("member {member_id} already checked in at gym {gym_id} on {date}")]
    Duplicate {
        member_id: String,
        gym_id: String,
        date: NaiveDate,
    },

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("data file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("data file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode data file: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of a referral or leaderboard collaborator.
#[derive(Debug, Error)]
#[error("{source_name} unavailable: {message}")]
pub struct SignalError {
    pub source_name: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum BadgeEvaluationError {
    #[error("badge storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MemberNotFound(_) => Self::not_found(err.to_string()),
            StoreError::Duplicate { .. } => Self {
                status: StatusCode::CONFLICT,
                message: err.to_string(),
            },
            StoreError::Io(_) | StoreError::Serialize(_) | StoreError::Corrupt { .. } => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
