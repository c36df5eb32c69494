//! Patient/admin account endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use pathlab_auth::gate;
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::permission::Role;
use pathlab_core::models::user::{CreateUser, UpdateUser, User};
use pathlab_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::routes::{ListResponse, PageQuery};
use crate::state::AppState;

/// Account representation returned to clients; the stored hash never
/// leaves the server.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Open self-registration; accounts always start as plain users.
/// Admin accounts are provisioned out of band.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let input = CreateUser {
        name: request.name,
        email: request.email,
        phone: request.phone,
        password_hash: state.auth().hash_new_password(&request.password)?,
        role: Role::User,
    };
    input.validate()?;

    // Self-registration has no authenticated actor yet; the nil actor
    // marks it in the trail.
    let user = state
        .users()
        .create(
            input,
            AuditEvent::new(Uuid::nil(), AuditAction::Create, EntityType::User)
                .details(json!({ "self_registration": true })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListResponse<UserDto>>, ApiError> {
    gate::require_admin(&caller.session)?;
    let result = state.users().list(page.into()).await?;
    Ok(Json(ListResponse::map(result, UserDto::from)))
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, ApiError> {
    if caller.session.actor_id != id {
        gate::require_admin(&caller.session)?;
    }
    let user = state.users().get_by_id(id).await?;
    Ok(Json(user.into()))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<UserDto>, ApiError> {
    if caller.session.actor_id != id {
        gate::require_admin(&caller.session)?;
    }
    input.validate()?;

    let user = state
        .users()
        .update(
            id,
            input,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Update,
                EntityType::User,
            ),
        )
        .await?;

    Ok(Json(user.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    gate::require_admin(&caller.session)?;

    state
        .users()
        .delete(
            id,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Delete,
                EntityType::User,
            ),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
