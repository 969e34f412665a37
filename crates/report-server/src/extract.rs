//! Client identity from the `x-client-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's writer origin.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// The calling client's origin tag, if it sent one.
///
/// Editors send a stable UUID so the updates they write are not pushed back
/// to their own event stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientId(pub Option<Uuid>);

impl FromRequestParts<AppState> for ClientId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CLIENT_ID_HEADER) else {
            return Ok(Self(None));
        };
        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{CLIENT_ID_HEADER} is not valid text")))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::BadRequest(format!("{CLIENT_ID_HEADER} must be a UUID")))?;
        Ok(Self(Some(id)))
    }
}
