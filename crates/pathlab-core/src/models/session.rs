//! Session domain model.
//!
//! Sessions are explicit values passed into every core operation;
//! nothing ambient. Only the SHA-256 hash of the opaque bearer token
//! is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::permission::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// User or employee id, depending on `role`.
    pub actor_id: Uuid,
    pub role: Role,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub actor_id: Uuid,
    pub role: Role,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
