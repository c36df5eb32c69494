//! Audit trail query endpoint (`/admin/audit-logs`).

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use pathlab_auth::gate;
use pathlab_core::error::PortalError;
use pathlab_core::models::audit::{AuditAction, AuditLogEntry, EntityType};
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::repository::{AuditLogFilter, AuditLogRepository, Pagination};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::routes::ListResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ListResponse<AuditLogEntry>>, ApiError> {
    if caller.session.role != Role::Admin {
        gate::require_staff(&caller.session)?;
        gate::require_permission(
            &caller.session,
            &caller.permissions,
            Permission::ViewAuditLogs,
        )?;
    }

    let action = query
        .action
        .as_deref()
        .map(str::parse::<AuditAction>)
        .transpose()
        .map_err(|_| PortalError::Validation {
            message: "unknown audit action".into(),
        })?;
    let entity_type = query
        .entity_type
        .as_deref()
        .map(str::parse::<EntityType>)
        .transpose()
        .map_err(|_| PortalError::Validation {
            message: "unknown entity type".into(),
        })?;

    let filter = AuditLogFilter {
        actor_id: query.actor_id,
        action,
        entity_type,
        entity_id: query.entity_id,
        from: query.start_date,
        to: query.end_date,
    };

    let default = Pagination::default();
    let page = Pagination {
        offset: query.skip.unwrap_or(default.offset),
        limit: query.limit.unwrap_or(default.limit),
    };

    let result = state.audit_logs().list(filter, page).await?;
    Ok(Json(result.into()))
}
