use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db::models::UserId;
use crate::error::CoreError;
use crate::state::AppState;

/// Header the upstream auth layer sets to the signed-in user's id.
pub const VIEWER_HEADER: &str = "x-viewer-id";

/// The identity of the requester, resolved before any core call.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub UserId);

impl FromRequestParts<AppState> for Viewer {
    type Rejection = CoreError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(VIEWER_HEADER)
            .ok_or_else(|| CoreError::authorization("Sign in first"))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|id| Viewer(UserId(id)))
            .ok_or_else(|| CoreError::validation("Malformed viewer id"))
    }
}
