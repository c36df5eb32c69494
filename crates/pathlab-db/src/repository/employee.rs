//! SurrealDB implementation of [`EmployeeRepository`].

use chrono::{DateTime, Utc};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::models::employee::{CreateEmployee, Employee, UpdateEmployee};
use pathlab_core::models::permission::Permission;
use pathlab_core::repository::{EmployeeRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_duplicate};
use crate::repository::{AUDIT_APPEND_SQL, CountRow, audit_binds, mutation_error, parse_uuid};

fn parse_permissions(raw: Vec<String>) -> Result<Vec<Permission>, DbError> {
    raw.into_iter()
        .map(|p| {
            p.parse::<Permission>()
                .map_err(|_| DbError::Corrupt(format!("invalid stored permission: {p}")))
        })
        .collect()
}

#[derive(Debug, SurrealValue)]
struct EmployeeRow {
    name: String,
    email: String,
    password_hash: String,
    department: String,
    permissions: Vec<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn try_into_employee(self, id: Uuid) -> Result<Employee, DbError> {
        Ok(Employee {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            department: self.department,
            permissions: parse_permissions(self.permissions)?,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct EmployeeRowWithId {
    record_id: String,
    name: String,
    email: String,
    password_hash: String,
    department: String,
    permissions: Vec<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRowWithId {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        let id = parse_uuid(&self.record_id, "employee")?;
        Ok(Employee {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            department: self.department,
            permissions: parse_permissions(self.permissions)?,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Employee repository.
#[derive(Clone)]
pub struct SurrealEmployeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEmployeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EmployeeRepository for SurrealEmployeeRepository<C> {
    async fn create(&self, input: CreateEmployee, audit: AuditEvent) -> PortalResult<Employee> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let audit = AuditEvent {
            entity_id: audit.entity_id.or(Some(id)),
            ..audit
        };
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        // New staff start with an empty permission set; capabilities
        // are granted explicitly by an admin afterwards.
        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('employee', $id) SET \
             name = $name, email = $email, \
             password_hash = $password_hash, \
             department = $department, permissions = [], \
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
            .bind(("password_hash", input.password_hash))
            .bind(("department", input.department))
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

        let rows: Vec<EmployeeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        row.try_into_employee(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> PortalResult<Employee> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('employee', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        row.try_into_employee(id).map_err(Into::into)
    }

    async fn get_by_email(&self, email: &str) -> PortalResult<Employee> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 WHERE email = $email",
            )
            .bind(("email", email_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: format!("email={email_owned}"),
        })?;

        row.try_into_employee().map_err(Into::into)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateEmployee,
        audit: AuditEvent,
    ) -> PortalResult<Employee> {
        let id_str = id.to_string();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('employee', $id) SET {}; \
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
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
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

        let rows: Vec<EmployeeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        row.try_into_employee(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid, audit: AuditEvent) -> PortalResult<()> {
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('employee', $id) SET \
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

    async fn list(&self, pagination: Pagination) -> PortalResult<PaginatedResult<Employee>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM employee GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM employee \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_employee())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn set_permissions(
        &self,
        id: Uuid,
        permissions: Vec<Permission>,
        audit: AuditEvent,
    ) -> PortalResult<Employee> {
        let id_str = id.to_string();
        let names: Vec<String> = permissions.iter().map(|p| p.as_str().to_string()).collect();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        // The whole set is replaced in one statement so a rejected
        // grant can never leave a partial write behind.
        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('employee', $id) SET \
             permissions = $permissions, updated_at = time::now(); \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("permissions", names))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(mutation_error)?;

        let rows: Vec<EmployeeRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        row.try_into_employee(id).map_err(Into::into)
    }
}
