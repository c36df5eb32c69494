//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The `audit_log` table is append-only: its schema denies update and
//! delete, so the only write path is `append` (or the coupled append
//! every audited mutation performs).

use chrono::{DateTime, Utc};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::{AuditAction, AuditEvent, AuditLogEntry, EntityType};
use pathlab_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AuditRow {
    record_id: String,
    actor_id: String,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    details: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl AuditRow {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let action = self
            .action
            .parse::<AuditAction>()
            .map_err(|_| DbError::Corrupt(format!("invalid audit action: {}", self.action)))?;
        let entity_type = self.entity_type.parse::<EntityType>().map_err(|_| {
            DbError::Corrupt(format!("invalid audit entity type: {}", self.entity_type))
        })?;
        Ok(AuditLogEntry {
            id: parse_uuid(&self.record_id, "audit entry")?,
            actor_id: parse_uuid(&self.actor_id, "actor")?,
            action,
            entity_type,
            entity_id: self
                .entity_id
                .as_deref()
                .map(|e| parse_uuid(e, "entity"))
                .transpose()?,
            details: self.details,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Builds the conjunctive WHERE clause for a filter. Returns the
/// clause (or an empty string) alongside nothing; the caller binds
/// the matching parameters.
fn filter_clause(filter: &AuditLogFilter) -> String {
    let mut conditions = Vec::new();
    if filter.actor_id.is_some() {
        conditions.push("actor_id = $actor_id");
    }
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.entity_type.is_some() {
        conditions.push("entity_type = $entity_type");
    }
    if filter.entity_id.is_some() {
        conditions.push("entity_id = $entity_id");
    }
    if filter.from.is_some() {
        conditions.push("timestamp >= $from");
    }
    if filter.to.is_some() {
        conditions.push("timestamp <= $to");
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, event: AuditEvent) -> PortalResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor_id = $actor_id, action = $action, \
                 entity_type = $entity_type, entity_id = $entity_id, \
                 details = $details",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", event.actor_id.to_string()))
            .bind(("action", event.action.as_str()))
            .bind(("entity_type", event.entity_type.as_str()))
            .bind(("entity_id", event.entity_id.map(|e| e.to_string())))
            .bind(("details", event.details))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| PortalError::AuditWriteFailed {
            reason: e.to_string(),
        })?;

        #[derive(Debug, SurrealValue)]
        struct CreatedRow {
            actor_id: String,
            action: String,
            entity_type: String,
            entity_id: Option<String>,
            details: serde_json::Value,
            timestamp: DateTime<Utc>,
        }

        let rows: Vec<CreatedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::AuditWriteFailed {
                reason: "append returned no row".into(),
            })?;

        AuditRow {
            record_id: id_str,
            actor_id: row.actor_id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details,
            timestamp: row.timestamp,
        }
        .try_into_entry()
        .map_err(Into::into)
    }

    async fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> PortalResult<PaginatedResult<AuditLogEntry>> {
        let clause = filter_clause(&filter);

        let count_sql = format!("SELECT count() AS total FROM audit_log{clause} GROUP ALL");
        let page_sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM audit_log{clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(count_sql);
        let mut page_builder = self
            .db
            .query(page_sql)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(actor_id) = filter.actor_id {
            let actor = actor_id.to_string();
            count_builder = count_builder.bind(("actor_id", actor.clone()));
            page_builder = page_builder.bind(("actor_id", actor));
        }
        if let Some(action) = filter.action {
            count_builder = count_builder.bind(("action", action.as_str()));
            page_builder = page_builder.bind(("action", action.as_str()));
        }
        if let Some(entity_type) = filter.entity_type {
            count_builder = count_builder.bind(("entity_type", entity_type.as_str()));
            page_builder = page_builder.bind(("entity_type", entity_type.as_str()));
        }
        if let Some(entity_id) = filter.entity_id {
            let entity = entity_id.to_string();
            count_builder = count_builder.bind(("entity_id", entity.clone()));
            page_builder = page_builder.bind(("entity_id", entity));
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(("from", from));
            page_builder = page_builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(("to", to));
            page_builder = page_builder.bind(("to", to));
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = page_builder.await.map_err(DbError::from)?;
        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
