//! Employee (staff) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};
use crate::models::permission::Permission;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
    /// Granted capability set — authoritative for the fine permission
    /// gate; the employee role alone implies nothing.
    pub permissions: Vec<Permission>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployee {
    pub name: String,
    pub email: String,
    /// Argon2id PHC-format hash, computed before the repository call.
    pub password_hash: String,
    pub department: String,
}

impl CreateEmployee {
    pub fn validate(&self) -> PortalResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortalError::Validation {
                message: "employee name must not be empty".into(),
            });
        }
        if !self.email.contains('@') {
            return Err(PortalError::Validation {
                message: "invalid email address".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
}

impl UpdateEmployee {
    pub fn validate(&self) -> PortalResult<()> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(PortalError::Validation {
                message: "employee name must not be empty".into(),
            });
        }
        if matches!(self.email.as_deref(), Some(e) if !e.contains('@')) {
            return Err(PortalError::Validation {
                message: "invalid email address".into(),
            });
        }
        Ok(())
    }
}
