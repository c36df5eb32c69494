//! User (patient/admin) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PortalError, PortalResult};
use crate::models::permission::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    /// `user` or `admin`; staff accounts live in the employee table.
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Argon2id PHC-format hash, computed before the repository call.
    pub password_hash: String,
    pub role: Role,
}

impl CreateUser {
    pub fn validate(&self) -> PortalResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortalError::Validation {
                message: "user name must not be empty".into(),
            });
        }
        if !self.email.contains('@') {
            return Err(PortalError::Validation {
                message: "invalid email address".into(),
            });
        }
        if self.role == Role::Employee {
            return Err(PortalError::Validation {
                message: "staff accounts are created through the employee console".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UpdateUser {
    pub fn validate(&self) -> PortalResult<()> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(PortalError::Validation {
                message: "user name must not be empty".into(),
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
