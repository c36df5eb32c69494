//! SurrealDB implementation of [`BatchRepository`].
//!
//! One storage transaction per batch: the affected rows, any slot
//! hold cleanup and a single audit entry commit or abort together.

use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::repository::{BatchAction, BatchCollection, BatchRepository};
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::{DbError, is_thrown};
use crate::repository::{AUDIT_APPEND_SQL, audit_binds, mutation_error};

fn table_name(collection: BatchCollection) -> &'static str {
    match collection {
        BatchCollection::Services => "service",
        BatchCollection::Users => "user",
        BatchCollection::Employees => "employee",
        BatchCollection::Appointments => "appointment",
    }
}

/// SurrealDB implementation of the batch repository.
#[derive(Clone)]
pub struct SurrealBatchRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBatchRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> BatchRepository for SurrealBatchRepository<C> {
    async fn apply(
        &self,
        collection: BatchCollection,
        action: BatchAction,
        ids: Vec<Uuid>,
        audit: AuditEvent,
    ) -> PortalResult<u64> {
        if ids.is_empty() {
            return Err(PortalError::Validation {
                message: "batch operation requires at least one id".into(),
            });
        }
        if collection == BatchCollection::Appointments && action == BatchAction::Delete {
            return Err(PortalError::Validation {
                message: "appointments cannot be deleted, only cancelled".into(),
            });
        }

        let table = table_name(collection);
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        // Each statement's result keeps its index; the statement that
        // yields the affected ids is named per arm below.
        let (sql, affected_index) = match (collection, action) {
            // Only cancelled appointments lose their holds; completed
            // ones keep theirs.
            (BatchCollection::Appointments, BatchAction::Archive) => (
                format!(
                    "BEGIN TRANSACTION; \
                     UPDATE appointment SET status = 'cancelled', \
                     updated_at = time::now() \
                     WHERE meta::id(id) IN $ids AND status = 'scheduled' \
                     RETURN VALUE meta::id(id); \
                     DELETE slot_hold WHERE appointment_id IN \
                     (SELECT VALUE meta::id(id) FROM appointment \
                     WHERE meta::id(id) IN $ids AND status = 'cancelled'); \
                     {AUDIT_APPEND_SQL}; \
                     COMMIT TRANSACTION;"
                ),
                1,
            ),
            (_, BatchAction::Archive) => (
                format!(
                    "BEGIN TRANSACTION; \
                     UPDATE {table} SET active = false, \
                     updated_at = time::now() \
                     WHERE meta::id(id) IN $ids \
                     RETURN VALUE meta::id(id); \
                     {AUDIT_APPEND_SQL}; \
                     COMMIT TRANSACTION;"
                ),
                1,
            ),
            (BatchCollection::Services, BatchAction::Delete) => (
                format!(
                    "BEGIN TRANSACTION; \
                     LET $refs = (SELECT VALUE count() FROM appointment \
                     WHERE service_id IN $ids GROUP ALL)[0] ?? 0; \
                     IF $refs > 0 {{ THROW 'service_referenced' }}; \
                     SELECT VALUE meta::id(id) FROM service \
                     WHERE meta::id(id) IN $ids; \
                     DELETE service WHERE meta::id(id) IN $ids; \
                     {AUDIT_APPEND_SQL}; \
                     COMMIT TRANSACTION;"
                ),
                3,
            ),
            (BatchCollection::Users, BatchAction::Delete) => (
                format!(
                    "BEGIN TRANSACTION; \
                     LET $refs = (SELECT VALUE count() FROM appointment \
                     WHERE patient_id IN $ids GROUP ALL)[0] ?? 0; \
                     IF $refs > 0 {{ THROW 'user_referenced' }}; \
                     SELECT VALUE meta::id(id) FROM user \
                     WHERE meta::id(id) IN $ids; \
                     DELETE user WHERE meta::id(id) IN $ids; \
                     {AUDIT_APPEND_SQL}; \
                     COMMIT TRANSACTION;"
                ),
                3,
            ),
            (BatchCollection::Employees, BatchAction::Delete) => (
                format!(
                    "BEGIN TRANSACTION; \
                     LET $refs = (SELECT VALUE count() FROM appointment \
                     WHERE employee_id IN $ids GROUP ALL)[0] ?? 0; \
                     IF $refs > 0 {{ THROW 'employee_referenced' }}; \
                     SELECT VALUE meta::id(id) FROM employee \
                     WHERE meta::id(id) IN $ids; \
                     DELETE employee WHERE meta::id(id) IN $ids; \
                     {AUDIT_APPEND_SQL}; \
                     COMMIT TRANSACTION;"
                ),
                3,
            ),
            // Rejected above.
            (BatchCollection::Appointments, BatchAction::Delete) => unreachable!(),
        };

        let mut result = self
            .db
            .query(sql)
            .bind(("ids", id_strings))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        // An aborted transaction marks every statement with an error;
        // the THROW marker lands on the IF statement's slot, so scan
        // all statement errors for it rather than relying on check()'s
        // first-error pick.
        let errors = result.take_errors();
        if !errors.is_empty() {
            return Err(if errors.values().any(|e| is_thrown(e, "service_referenced")) {
                PortalError::ReferentialConflict {
                    entity: "service".into(),
                }
            } else if errors.values().any(|e| is_thrown(e, "user_referenced")) {
                PortalError::ReferentialConflict {
                    entity: "user".into(),
                }
            } else if errors.values().any(|e| is_thrown(e, "employee_referenced")) {
                PortalError::ReferentialConflict {
                    entity: "employee".into(),
                }
            } else {
                let (_, e) = errors
                    .into_iter()
                    .min_by_key(|(index, _)| *index)
                    .expect("non-empty error map");
                mutation_error(e)
            });
        }

        let affected: Vec<String> = result.take(affected_index).map_err(DbError::from)?;

        Ok(affected.len() as u64)
    }
}
