//! Audit log domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PortalError;

/// Enumerated audit verb.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    Grant,
    Book,
    Cancel,
    Complete,
    Archive,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::Grant => "grant",
            AuditAction::Book => "book",
            AuditAction::Cancel => "cancel",
            AuditAction::Complete => "complete",
            AuditAction::Archive => "archive",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            "login" => Ok(AuditAction::Login),
            "logout" => Ok(AuditAction::Logout),
            "grant" => Ok(AuditAction::Grant),
            "book" => Ok(AuditAction::Book),
            "cancel" => Ok(AuditAction::Cancel),
            "complete" => Ok(AuditAction::Complete),
            "archive" => Ok(AuditAction::Archive),
            other => Err(PortalError::Validation {
                message: format!("unknown audit action: {other}"),
            }),
        }
    }
}

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Service,
    User,
    Employee,
    Appointment,
    Session,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Service => "service",
            EntityType::User => "user",
            EntityType::Employee => "employee",
            EntityType::Appointment => "appointment",
            EntityType::Session => "session",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(EntityType::Service),
            "user" => Ok(EntityType::User),
            "employee" => Ok(EntityType::Employee),
            "appointment" => Ok(EntityType::Appointment),
            "session" => Ok(EntityType::Session),
            other => Err(PortalError::Validation {
                message: format!("unknown entity type: {other}"),
            }),
        }
    }
}

/// One immutable entry in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Option<Uuid>,
    /// Opaque structured payload describing the change.
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Input for an audit append. Mutating repository operations take one
/// of these and commit it in the same storage transaction as the
/// domain write.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_type: EntityType,
    /// Filled in by the repository for freshly created entities.
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(actor_id: Uuid, action: AuditAction, entity_type: EntityType) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id: None,
            details: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn entity(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
