//! GET /api/profile - the caller's identity record.

use axum::Json;
use axum::extract::State;

use palaver_types::identity::UserProfile;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authorization;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    auth: Authorization,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.chat_service.profile(auth.as_deref()).await?;
    Ok(Json(user))
}
