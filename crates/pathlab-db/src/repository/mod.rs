//! SurrealDB repository implementations.

mod appointment;
mod audit;
mod batch;
mod employee;
mod service;
mod session;
mod user;

pub use appointment::SurrealAppointmentRepository;
pub use audit::SurrealAuditLogRepository;
pub use batch::SurrealBatchRepository;
pub use employee::SurrealEmployeeRepository;
pub use service::SurrealServiceRepository;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;

use chrono::{NaiveDate, NaiveTime};
use pathlab_core::error::PortalError;
use surrealdb_types::SurrealValue;
use pathlab_core::models::audit::AuditEvent;
use uuid::Uuid;

use crate::error::DbError;

/// Appended to every audited mutation, inside the same transaction as
/// the domain statements. The `$audit_*` parameters are bound by
/// [`audit_binds`].
pub(crate) const AUDIT_APPEND_SQL: &str = "\
CREATE type::record('audit_log', $audit_id) SET \
 actor_id = $audit_actor_id, \
 action = $audit_action, \
 entity_type = $audit_entity_type, \
 entity_id = $audit_entity_id, \
 details = $audit_details";

/// Bind tuples for [`AUDIT_APPEND_SQL`].
pub(crate) fn audit_binds(
    audit: AuditEvent,
) -> (
    (&'static str, String),
    (&'static str, String),
    (&'static str, &'static str),
    (&'static str, &'static str),
    (&'static str, Option<String>),
    (&'static str, serde_json::Value),
) {
    (
        ("audit_id", Uuid::new_v4().to_string()),
        ("audit_actor_id", audit.actor_id.to_string()),
        ("audit_action", audit.action.as_str()),
        ("audit_entity_type", audit.entity_type.as_str()),
        ("audit_entity_id", audit.entity_id.map(|id| id.to_string())),
        ("audit_details", audit.details),
    )
}

/// Fallback error mapping for audited mutations: a failure attributable
/// to the audit append surfaces as `AuditWriteFailed`, everything else
/// as an internal database error.
pub(crate) fn mutation_error(err: surrealdb::Error) -> PortalError {
    let msg = err.to_string();
    if msg.contains("audit_log") {
        PortalError::AuditWriteFailed { reason: msg }
    } else {
        PortalError::Database(msg)
    }
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| DbError::Corrupt(format!("invalid date: {e}")))
}

pub(crate) fn format_slot(slot: NaiveTime) -> String {
    slot.format("%H:%M").to_string()
}

pub(crate) fn parse_slot(value: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| DbError::Corrupt(format!("invalid slot time: {e}")))
}

/// Deterministic record id for a slot hold. Creating the same key
/// twice fails inside the storage engine, which is what serializes
/// concurrent reservations.
pub(crate) fn slot_hold_key(service_id: Uuid, date: NaiveDate, slot: NaiveTime) -> String {
    format!("{}:{}:{}", service_id, format_date(date), format_slot(slot))
}

#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
