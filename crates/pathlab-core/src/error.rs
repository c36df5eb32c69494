//! Error types for the PathLab portal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not authorized: {reason}")]
    NotAuthorized { reason: String },

    #[error("permission denied: requires {permission}")]
    PermissionDenied { permission: String },

    #[error("unknown permission: {name}")]
    InvalidPermission { name: String },

    #[error("invalid slot request: {reason}")]
    InvalidSlotRequest { reason: String },

    #[error("slot already booked")]
    SlotAlreadyBooked,

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("delete blocked: {entity} is referenced by existing records")]
    ReferentialConflict { entity: String },

    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    #[error("storage unavailable")]
    StorageUnavailable,

    #[error("database error: {0}")]
    Database(String),
}

pub type PortalResult<T> = Result<T, PortalError>;
