//! Login and logout endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use pathlab_core::models::permission::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub actor_id: Uuid,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let output = state.auth().login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token: output.token,
        actor_id: output.session.actor_id,
        role: output.session.role,
        expires_at: output.session.expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<StatusCode, ApiError> {
    state.auth().logout(&caller.session).await?;
    Ok(StatusCode::NO_CONTENT)
}
