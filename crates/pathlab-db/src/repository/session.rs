//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use pathlab_core::error::PortalResult;
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::models::permission::Role;
use pathlab_core::models::session::{CreateSession, Session};
use pathlab_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{AUDIT_APPEND_SQL, audit_binds, mutation_error, parse_uuid};

#[derive(Debug, SurrealValue)]
struct SessionRow {
    actor_id: String,
    role: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self, id: Uuid) -> Result<Session, DbError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Corrupt(format!("invalid session role: {}", self.role)))?;
        Ok(Session {
            id,
            actor_id: parse_uuid(&self.actor_id, "actor")?,
            role,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    actor_id: String,
    role: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = parse_uuid(&self.record_id, "session")?;
        SessionRow {
            actor_id: self.actor_id,
            role: self.role,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
        .try_into_session(id)
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession, audit: AuditEvent) -> PortalResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let audit = AuditEvent {
            entity_id: audit.entity_id.or(Some(id)),
            ..audit
        };
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('session', $id) SET \
             actor_id = $actor_id, role = $role, \
             token_hash = $token_hash, expires_at = $expires_at; \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("role", input.role.as_str()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(mutation_error)?;

        let rows: Vec<SessionRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.try_into_session(id).map_err(Into::into)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> PortalResult<Session> {
        let hash_owned = token_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", hash_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "token".into(),
        })?;

        row.try_into_session().map_err(Into::into)
    }

    async fn invalidate(&self, id: Uuid, audit: AuditEvent) -> PortalResult<()> {
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let sql = format!(
            "BEGIN TRANSACTION; \
             DELETE type::record('session', $id); \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("id", id.to_string()))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        result.check().map_err(mutation_error)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> PortalResult<u64> {
        // Maintenance sweep, not an actor-driven mutation; it is not
        // audited.
        let mut result = self
            .db
            .query(
                "SELECT VALUE meta::id(id) FROM session \
                 WHERE expires_at < time::now(); \
                 DELETE session WHERE expires_at < time::now();",
            )
            .await
            .map_err(DbError::from)?;

        let expired: Vec<String> = result.take(0).map_err(DbError::from)?;

        Ok(expired.len() as u64)
    }
}
