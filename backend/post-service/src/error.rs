/// Error types for post-service
///
/// Every failure a handler can surface is an `AppError`. The JSON body carries
/// the error kind and a stable message; storage and internal detail is logged
/// and replaced with a generic message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::domain::models::InteractionType;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Post not found")]
    PostNotFound,

    #[error("This post is no longer active")]
    PostInactive,

    /// The user already holds a vote of this type on the post
    #[error("You have already {} this post", .0.past_tense())]
    DuplicateVote(InteractionType),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// A storage uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Ledger and counters disagree; never user-facing
    #[error("Internal consistency violated: {0}")]
    InternalInconsistency(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error kind reported in the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::PostNotFound | AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::PostInactive | AppError::Validation(_) => ErrorKind::Validation,
            AppError::DuplicateVote(_) | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::InternalInconsistency(_) | AppError::Database(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to return to the caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Map a unique violation to `Conflict` using a per-constraint message.
    ///
    /// Errors that are not unique violations pass through as `Database`.
    pub fn from_unique_violation(
        err: sqlx::Error,
        messages: &[(&str, &str)],
        fallback: &str,
    ) -> Self {
        match db_pool::unique_violation_constraint(&err) {
            Some(constraint) => {
                let message = messages
                    .iter()
                    .find(|(name, _)| *name == constraint)
                    .map(|(_, msg)| *msg)
                    .unwrap_or(fallback);
                AppError::Conflict(message.to_string())
            }
            None => AppError::Database(err),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PostNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PostInactive | AppError::DuplicateVote(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InternalInconsistency(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed with internal error");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "error": self.kind().as_str(),
            "message": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_error_status_codes() {
        assert_eq!(AppError::PostNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PostInactive.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DuplicateVote(InteractionType::Like).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("taken".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_duplicate_vote_message() {
        assert_eq!(
            AppError::DuplicateVote(InteractionType::Like).to_string(),
            "You have already liked this post"
        );
        assert_eq!(
            AppError::DuplicateVote(InteractionType::Dislike).to_string(),
            "You have already disliked this post"
        );
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = AppError::InternalInconsistency("like_count underflow on post POST-1".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_non_unique_errors_pass_through() {
        let err = AppError::from_unique_violation(sqlx::Error::RowNotFound, &[], "duplicate");
        assert!(matches!(err, AppError::Database(_)));
    }
}
