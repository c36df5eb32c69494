//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::models::permission::Role;
use pathlab_core::models::user::{CreateUser, UpdateUser, User};
use pathlab_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_duplicate};
use crate::repository::{AUDIT_APPEND_SQL, CountRow, audit_binds, mutation_error, parse_uuid};

#[derive(Debug, SurrealValue)]
struct UserRow {
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self, id: Uuid) -> Result<User, DbError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Corrupt(format!("invalid role: {}", self.role)))?;
        Ok(User {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Corrupt(format!("invalid role: {}", self.role)))?;
        Ok(User {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            role,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser, audit: AuditEvent) -> PortalResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let audit = AuditEvent {
            entity_id: audit.entity_id.or(Some(id)),
            ..audit
        };
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('user', $id) SET \
             name = $name, email = $email, phone = $phone, \
             password_hash = $password_hash, role = $role, \
             active = true; \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("password_hash", input.password_hash))
            .bind(("role", input.role.as_str()))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            if is_duplicate(&e) {
                PortalError::Validation {
                    message: "email already registered".into(),
                }
            } else {
                mutation_error(e)
            }
        })?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.try_into_user(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> PortalResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.try_into_user(id).map_err(Into::into)
    }

    async fn get_by_email(&self, email: &str) -> PortalResult<User> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email_owned}"),
        })?;

        row.try_into_user().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateUser, audit: AuditEvent) -> PortalResult<User> {
        let id_str = id.to_string();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('user', $id) SET {}; \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details);

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| {
            if is_duplicate(&e) {
                PortalError::Validation {
                    message: "email already registered".into(),
                }
            } else {
                mutation_error(e)
            }
        })?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.try_into_user(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid, audit: AuditEvent) -> PortalResult<()> {
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        // Soft delete keeps booked appointment history resolvable.
        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('user', $id) SET \
             active = false, updated_at = time::now(); \
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

    async fn list(&self, pagination: Pagination) -> PortalResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
