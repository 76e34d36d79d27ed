use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::services::SyncRequest;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SyncProfileResponse {
    pub message: String,
    /// Present whenever the handler has the row; clients fall back to
    /// fetching it themselves when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

/// Ensure a profile row exists for the authenticated user
///
/// Called by the client after every sign-up or login. Safe to repeat: an
/// existing profile is never modified.
///
/// The body is parsed here rather than with the `Json` extractor so that a
/// missing content type or malformed JSON both map to 400.
///
/// POST /api/sync-profile `{userId, email, nome?}`
pub async fn sync_profile(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncProfileResponse>> {
    let request: SyncRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejecting sync request body: {}", e);
        AppError::InvalidJson(e.to_string())
    })?;

    let outcome = state.profiles.sync(request).await?;

    Ok(Json(SyncProfileResponse {
        message: outcome.message().to_string(),
        profile: outcome.into_profile(),
    }))
}

/// Any method other than POST (OPTIONS is answered by the CORS layer)
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
