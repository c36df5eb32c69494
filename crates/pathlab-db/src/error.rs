//! Database-specific error types and conversions.

use pathlab_core::error::PortalError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl From<DbError> for PortalError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PortalError::NotFound { entity, id },
            DbError::Surreal(e) if is_unavailable(&e) => PortalError::StorageUnavailable,
            other => PortalError::Database(other.to_string()),
        }
    }
}

/// Whether a SurrealDB error reports the connection itself failing
/// rather than a statement the connection carried.
fn is_unavailable(err: &surrealdb::Error) -> bool {
    unavailable_message(&err.to_string())
}

fn unavailable_message(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("connection")
        || msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("websocket")
}

/// Whether a SurrealDB error reports a duplicate record id or a
/// violated UNIQUE index.
pub(crate) fn is_duplicate(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("already exists") || msg.contains("already contains")
}

/// Whether a SurrealDB error carries a `THROW` raised by one of our
/// transactional guard statements.
pub(crate) fn is_thrown(err: &surrealdb::Error, marker: &str) -> bool {
    err.to_string().contains(marker)
}
