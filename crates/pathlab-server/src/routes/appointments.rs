//! Appointment booking and lifecycle endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use pathlab_auth::gate;
use pathlab_booking::BookingRequest;
use pathlab_core::models::appointment::Appointment;
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::repository::AppointmentRepository;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::routes::{ListResponse, PageQuery};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let appointment = state
        .scheduler()
        .reserve_slot(&caller.session, &caller.permissions, request)
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Patients see their own bookings; staff need `view_appointments` to
/// browse everyone's.
pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListResponse<Appointment>>, ApiError> {
    let repo = state.appointments();

    let result = if caller.session.role == Role::User {
        repo.list_by_patient(caller.session.actor_id, page.into())
            .await?
    } else {
        gate::require_permission(
            &caller.session,
            &caller.permissions,
            Permission::ViewAppointments,
        )?;
        repo.list(page.into()).await?
    };

    Ok(Json(result.into()))
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state.appointments().get_by_id(id).await?;

    let is_owner =
        caller.session.role == Role::User && appointment.patient_id == caller.session.actor_id;
    if !is_owner {
        gate::require_permission(
            &caller.session,
            &caller.permissions,
            Permission::ViewAppointments,
        )?;
    }

    Ok(Json(appointment))
}

pub async fn cancel(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state
        .scheduler()
        .cancel_appointment(&caller.session, &caller.permissions, id)
        .await?;

    Ok(Json(appointment))
}

pub async fn complete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state
        .scheduler()
        .complete_appointment(&caller.session, &caller.permissions, id)
        .await?;

    Ok(Json(appointment))
}
