//! Staff administration endpoints (`/admin/employees`).

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use pathlab_auth::gate;
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::employee::{CreateEmployee, Employee, UpdateEmployee};
use pathlab_core::models::permission::Permission;
use pathlab_core::repository::EmployeeRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::routes::{ListResponse, PageQuery};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmployeeDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub permissions: Vec<Permission>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeDto {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            permissions: employee.permissions,
            active: employee.active,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: String,
    pub department: String,
    pub password: String,
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
) -> Result<Json<ListResponse<EmployeeDto>>, ApiError> {
    gate::require_admin(&caller.session)?;
    let result = state.employees().list(page.into()).await?;
    Ok(Json(ListResponse::map(result, EmployeeDto::from)))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeDto>), ApiError> {
    gate::require_admin(&caller.session)?;

    let input = CreateEmployee {
        name: request.name,
        email: request.email,
        password_hash: state.auth().hash_new_password(&request.password)?,
        department: request.department,
    };
    input.validate()?;

    let employee = state
        .employees()
        .create(
            input,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Create,
                EntityType::Employee,
            ),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(employee.into())))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateEmployee>,
) -> Result<Json<EmployeeDto>, ApiError> {
    gate::require_admin(&caller.session)?;
    input.validate()?;

    let employee = state
        .employees()
        .update(
            id,
            input,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Update,
                EntityType::Employee,
            ),
        )
        .await?;

    Ok(Json(employee.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    gate::require_admin(&caller.session)?;

    state
        .employees()
        .delete(
            id,
            AuditEvent::new(
                caller.session.actor_id,
                AuditAction::Delete,
                EntityType::Employee,
            ),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// -----------------------------------------------------------------------
// Permission grants
// -----------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub employee_id: Uuid,
    pub granted: Vec<Permission>,
    /// The full grantable catalogue, for admin UIs.
    pub catalog: Vec<Permission>,
}

pub async fn get_permissions(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    gate::require_admin(&caller.session)?;

    let employee = state.employees().get_by_id(id).await?;
    Ok(Json(PermissionsResponse {
        employee_id: id,
        granted: employee.permissions,
        catalog: Permission::CATALOG.to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub permissions: Vec<String>,
}

pub async fn put_permissions(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(request): Json<GrantRequest>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let employee = gate::grant_permissions(
        &state.employees(),
        &caller.session,
        id,
        &request.permissions,
    )
    .await?;

    Ok(Json(PermissionsResponse {
        employee_id: id,
        granted: employee.permissions,
        catalog: Permission::CATALOG.to_vec(),
    }))
}
