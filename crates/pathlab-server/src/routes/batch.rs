//! Bulk archive/delete endpoint for the admin console.

use axum::Json;
use axum::extract::State;
use pathlab_auth::gate;
use pathlab_core::error::PortalError;
use pathlab_core::models::audit::{AuditAction, AuditEvent};
use pathlab_core::repository::{BatchAction, BatchCollection, BatchRepository};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub collection: String,
    pub action: String,
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub affected: u64,
}

fn parse_collection(name: &str) -> Result<BatchCollection, PortalError> {
    match name {
        "services" => Ok(BatchCollection::Services),
        "users" => Ok(BatchCollection::Users),
        "employees" => Ok(BatchCollection::Employees),
        "appointments" => Ok(BatchCollection::Appointments),
        other => Err(PortalError::Validation {
            message: format!("unknown collection: {other}"),
        }),
    }
}

fn parse_action(name: &str) -> Result<BatchAction, PortalError> {
    match name {
        "archive" => Ok(BatchAction::Archive),
        "delete" => Ok(BatchAction::Delete),
        other => Err(PortalError::Validation {
            message: format!("unknown batch action: {other}"),
        }),
    }
}

pub async fn apply(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    gate::require_admin(&caller.session)?;

    let collection = parse_collection(&request.collection)?;
    let action = parse_action(&request.action)?;

    let audit_action = match action {
        BatchAction::Archive => AuditAction::Archive,
        BatchAction::Delete => AuditAction::Delete,
    };
    let audit = AuditEvent::new(
        caller.session.actor_id,
        audit_action,
        collection.entity_type(),
    )
    .details(json!({
        "batch": true,
        "requested": request.ids.len(),
    }));

    let affected = state
        .batch()
        .apply(collection, action, request.ids, audit)
        .await?;

    Ok(Json(BatchResponse { affected }))
}
