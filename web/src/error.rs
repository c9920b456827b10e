//! Error types for web handlers.
//!
//! [`AppError`] bridges planner errors and HTTP responses for the read
//! endpoints, which answer failures with `{code, message}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use planner_core::PlannerError;
use serde::Serialize;
use std::fmt;

/// HTTP status for a planner error.
#[must_use]
pub const fn status_for(error: &PlannerError) -> StatusCode {
    match error {
        PlannerError::Unauthenticated => StatusCode::UNAUTHORIZED,
        PlannerError::Forbidden(_) => StatusCode::FORBIDDEN,
        PlannerError::NotFound => StatusCode::NOT_FOUND,
        PlannerError::Validation(_) => StatusCode::BAD_REQUEST,
        PlannerError::RuleViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlannerError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`, so handlers can return
/// `Result<Json<T>, AppError>` and use `?` on engine results.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<EventDetail>, AppError> {
///     let detail = state.engine.get_event(None, event_id).await?;
///     Ok(Json(detail))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// HTTP status this error answers with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Planner errors keep their client-facing message; store failures carry
/// the underlying cause as the hidden source.
impl From<PlannerError> for AppError {
    fn from(err: PlannerError) -> Self {
        let app = Self::new(status_for(&err), err.to_string(), err.code().to_string());
        if err.is_client_error() {
            app
        } else {
            app.with_source(anyhow::Error::new(err))
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::{Operation, StoreError};
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_planner_error_statuses() {
        let cases = [
            (PlannerError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (PlannerError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (PlannerError::NotFound, StatusCode::NOT_FOUND),
            (PlannerError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                PlannerError::RuleViolation("Event is not public".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            let app = AppError::from(err);
            assert_eq!(app.status(), status);
            assert!(app.source().is_none());
        }
    }

    #[test]
    fn test_store_failure_keeps_detail_out_of_message() {
        let err = PlannerError::Store {
            operation: Operation::ListEvents,
            source: StoreError::Database("relation \"events\" does not exist".to_string()),
        };
        let app = AppError::from(err);
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.code(), "STORE_ERROR");
        assert_eq!(app.to_string(), "[STORE_ERROR] Failed to fetch events");
        assert!(app.source().is_some());
    }
}
