use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::{leave_request::LeaveStatus, leave_type::LeaveType};
use crate::store::StoreError;

/// The transition is well-formed but the current state of the world
/// does not allow it. Retrying with the same input reproduces it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateConflict {
    #[error("Leave request is {status}; cannot {action}")]
    InvalidStatus { status: LeaveStatus, action: &'static str },

    #[error(
        "Insufficient {leave_type} balance. Remaining: {remaining}, Pending: {pending}, Requested: {requested}"
    )]
    InsufficientBalance {
        leave_type: LeaveType,
        remaining: i32,
        pending: i32,
        requested: i32,
    },

    #[error("No {leave_type} balance record for {year}")]
    NoBalanceRecord { leave_type: LeaveType, year: i32 },

    #[error("{0}")]
    Scheduling(String),

    #[error("Cannot route leave request: no manager assigned")]
    NoManagerAssigned,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    Authorization,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    State(#[from] StateConflict),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("attachment storage failed: {0}")]
    Attachment(#[from] std::io::Error),
}

impl LeaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeaveError::Validation(_) => ErrorKind::Validation,
            LeaveError::State(_) => ErrorKind::StateConflict,
            LeaveError::Forbidden(_) => ErrorKind::Authorization,
            LeaveError::NotFound(_) => ErrorKind::NotFound,
            LeaveError::Store(_) | LeaveError::Attachment(_) => ErrorKind::Internal,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        LeaveError::Forbidden(message.into())
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::StateConflict => StatusCode::CONFLICT,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "Leave operation failed");
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
