//! Responses for mutating endpoints.
//!
//! Mutations always answer with the structured envelope
//! `{success, error?, ...payload}`; the HTTP status still reflects the
//! failure class so clients can branch on either.

use crate::error::status_for;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use planner_core::PlannerError;
use planner_core::outcome::ActionOutcome;
use serde::Serialize;

/// Result of a mutation, rendered as an [`ActionOutcome`].
#[derive(Debug)]
pub struct Outcome<T>(pub Result<T, PlannerError>);

impl<T> Outcome<T> {
    /// A failed outcome.
    #[must_use]
    pub const fn failed(error: PlannerError) -> Self {
        Self(Err(error))
    }
}

impl<T> From<Result<T, PlannerError>> for Outcome<T> {
    fn from(result: Result<T, PlannerError>) -> Self {
        Self(result)
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Ok(_) => StatusCode::OK,
            Err(e) => {
                tracing::debug!(code = e.code(), error = %e, "Mutation rejected");
                status_for(e)
            }
        };
        (status, Json(ActionOutcome::from(self.0))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use planner_core::outcome::DeletedEvent;
    use planner_core::types::EventId;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let event_id = EventId::new();
        let response = Outcome(Ok(DeletedEvent { event_id })).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body(response).await,
            serde_json::json!({"success": true, "eventId": event_id.to_string()})
        );
    }

    #[tokio::test]
    async fn test_failure_envelope() {
        let response = Outcome::<DeletedEvent>::failed(PlannerError::Forbidden(
            "Not authorized to delete this event".to_string(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body(response).await,
            serde_json::json!({"success": false, "error": "Not authorized to delete this event"})
        );
    }
}
