//! Service catalogue endpoints.
//!
//! Browsing the catalogue and its free slots is public; mutations are
//! admin-only.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use pathlab_auth::gate;
use pathlab_core::error::PortalError;
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::service::{CreateService, Service, UpdateService};
use pathlab_core::repository::ServiceRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::routes::{ListResponse, PageQuery};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListResponse<Service>>, ApiError> {
    let result = state.services().list(page.into()).await?;
    Ok(Json(result.into()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Service>, ApiError> {
    let service = state.services().get_by_id(id).await?;
    Ok(Json(service))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<CreateService>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    gate::require_admin(&caller.session)?;
    input.validate()?;

    let service = state
        .services()
        .create(
            input,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Create,
                EntityType::Service,
            ),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateService>,
) -> Result<Json<Service>, ApiError> {
    gate::require_admin(&caller.session)?;
    input.validate()?;

    let service = state
        .services()
        .update(
            id,
            input,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Update,
                EntityType::Service,
            ),
        )
        .await?;

    Ok(Json(service))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    gate::require_admin(&caller.session)?;

    state
        .services()
        .delete(
            id,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Delete,
                EntityType::Service,
            ),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    /// Requested day, `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub service_id: Uuid,
    pub date: NaiveDate,
    /// Free slot start times, `HH:MM`.
    pub slots: Vec<String>,
}

pub async fn slots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d").map_err(|_| {
        PortalError::Validation {
            message: "date must be YYYY-MM-DD".into(),
        }
    })?;

    let slots = state.scheduler().list_available_slots(id, date).await?;

    Ok(Json(SlotsResponse {
        service_id: id,
        date,
        slots: slots
            .into_iter()
            .map(|slot| slot.format("%H:%M").to_string())
            .collect(),
    }))
}
