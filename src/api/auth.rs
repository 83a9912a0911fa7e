//! Request extractors for REST handlers: caller identity and the
//! disaster id path segment.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::{DisasterId, User};
use crate::error::HubError;

/// Header carrying the caller token.
pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, resolved from the `x-user-id` header.
#[derive(Debug, Clone)]
pub struct Caller(pub User);

impl FromRequestParts<AppState> for Caller {
    type Rejection = HubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| HubError::Unauthorized(format!("missing {USER_HEADER} header")))?;
        let user = state.identities.resolve(token)?;
        tracing::debug!(user_id = %user.id, "caller resolved");
        Ok(Self(user))
    }
}

/// The `{id}` path segment parsed as a [`DisasterId`]. A malformed id is a
/// [`HubError::Validation`], rendered with the usual JSON error body.
#[derive(Debug, Clone, Copy)]
pub struct DisasterPath(pub DisasterId);

impl<S> FromRequestParts<S> for DisasterPath
where
    S: Send + Sync,
{
    type Rejection = HubError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<DisasterId>::from_request_parts(parts, state).await?;
        Ok(Self(id))
    }
}
