//! Custom Axum extractors.
//!
//! - [`CurrentIdentity`]: the caller's identity, resolved from a bearer
//!   token or the `session_token` cookie
//! - [`FormBody`]: a request body sent either as JSON or as an HTML form
//!
//! Mutating handlers take `Result<FormBody<T>, InvalidBody>` so the
//! identity check runs before a bad body is reported.
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     CurrentIdentity(identity): CurrentIdentity,
//!     body: Result<FormBody<EventForm>, InvalidBody>,
//! ) -> Outcome<SavedEvent> {
//!     let result = async {
//!         policy::require_identity(identity.as_ref())?;
//!         let FormBody(form) = body?;
//!         state.engine.create_event(identity.as_ref(), &form).await.map(Into::into)
//!     };
//!     Outcome(result.await)
//! }
//! ```

use crate::error::AppError;
use crate::outcome::Outcome;
use crate::state::AppState;
use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Response},
};
use planner_core::PlannerError;
use planner_core::types::Identity;
use serde::de::DeserializeOwned;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// The caller's identity, or `None` for anonymous requests.
///
/// Unknown and expired credentials resolve to `None`; deciding whether an
/// anonymous caller may proceed is left to the engine.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(credential) = credential(&parts.headers) else {
            return Ok(Self(None));
        };

        let identity = tokio::time::timeout(
            state.store_timeout(),
            state.identity.current_identity(credential),
        )
        .await
        .map_err(|_| AppError::internal("Failed to resolve session"))?
        .map_err(|e| {
            AppError::internal("Failed to resolve session").with_source(anyhow::Error::new(e))
        })?;

        if identity.is_none() {
            tracing::debug!("Unknown or expired credential, continuing anonymously");
        }
        Ok(Self(identity))
    }
}

/// Credential presented with the request.
///
/// `Authorization: Bearer <token>` takes precedence over the session cookie.
#[must_use]
pub fn credential(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| session_cookie(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Body sent as `application/json` or as `application/x-www-form-urlencoded`.
///
/// A body that cannot be decoded is rejected with [`InvalidBody`].
#[derive(Debug, Clone)]
pub struct FormBody<T>(pub T);

/// Rejection of a [`FormBody`] that could not be decoded.
///
/// Renders as a failed [`Outcome`]; converts into the matching
/// [`PlannerError`] for handlers that extract `Result<FormBody<T>, InvalidBody>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBody;

impl From<InvalidBody> for PlannerError {
    fn from(_: InvalidBody) -> Self {
        Self::Validation("Invalid request body".to_string())
    }
}

impl IntoResponse for InvalidBody {
    fn into_response(self) -> Response {
        Outcome::<()>::failed(self.into()).into_response()
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for FormBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = InvalidBody;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let decoded = if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|e| e.body_text())
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|e| e.body_text())
        };

        decoded.map(Self).map_err(|detail| {
            tracing::debug!(%detail, "Rejected request body");
            InvalidBody
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc123")]);
        assert_eq!(credential(&map).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(credential(&map), None);
        let map = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(credential(&map), None);
    }

    #[test]
    fn test_session_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; session_token=xyz; lang=en")]);
        assert_eq!(credential(&map).as_deref(), Some("xyz"));

        let map = headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "session_token=second-header"),
        ]);
        assert_eq!(credential(&map).as_deref(), Some("second-header"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let map = headers(&[
            (header::COOKIE, "session_token=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(credential(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_invalid_body_is_a_validation_error() {
        let err = PlannerError::from(InvalidBody);
        assert_eq!(err, PlannerError::Validation("Invalid request body".to_string()));
        assert_eq!(
            InvalidBody.into_response().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_no_credential() {
        assert_eq!(credential(&HeaderMap::new()), None);
        let map = headers(&[(header::COOKIE, "session_token=")]);
        assert_eq!(credential(&map), None);
    }
}
