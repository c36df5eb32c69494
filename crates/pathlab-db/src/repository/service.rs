//! SurrealDB implementation of [`ServiceRepository`].

use chrono::{DateTime, Utc, Weekday};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::models::service::{CreateService, OperatingHours, Service, UpdateService};
use pathlab_core::repository::{PaginatedResult, Pagination, ServiceRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_duplicate, is_thrown};
use crate::repository::{
    AUDIT_APPEND_SQL, CountRow, audit_binds, format_slot, mutation_error, parse_slot, parse_uuid,
};

#[derive(Debug, SurrealValue)]
struct HoursRow {
    open: String,
    close: String,
    slot_minutes: u32,
    break_start: Option<String>,
    break_end: Option<String>,
    day_off: String,
}

impl HoursRow {
    fn from_hours(hours: &OperatingHours) -> Self {
        Self {
            open: format_slot(hours.open),
            close: format_slot(hours.close),
            slot_minutes: hours.slot_minutes,
            break_start: hours.break_start.map(format_slot),
            break_end: hours.break_end.map(format_slot),
            day_off: hours.day_off.to_string(),
        }
    }

    fn try_into_hours(self) -> Result<OperatingHours, DbError> {
        Ok(OperatingHours {
            open: parse_slot(&self.open)?,
            close: parse_slot(&self.close)?,
            slot_minutes: self.slot_minutes,
            break_start: self.break_start.as_deref().map(parse_slot).transpose()?,
            break_end: self.break_end.as_deref().map(parse_slot).transpose()?,
            day_off: self
                .day_off
                .parse::<Weekday>()
                .map_err(|_| DbError::Corrupt(format!("invalid day_off: {}", self.day_off)))?,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ServiceRow {
    name: String,
    price: i64,
    duration_minutes: u32,
    department: String,
    home_collection: bool,
    active: bool,
    hours: HoursRow,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn try_into_service(self, id: Uuid) -> Result<Service, DbError> {
        Ok(Service {
            id,
            name: self.name,
            price: self.price,
            duration_minutes: self.duration_minutes,
            department: self.department,
            home_collection: self.home_collection,
            active: self.active,
            hours: self.hours.try_into_hours()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ServiceRowWithId {
    record_id: String,
    name: String,
    price: i64,
    duration_minutes: u32,
    department: String,
    home_collection: bool,
    active: bool,
    hours: HoursRow,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRowWithId {
    fn try_into_service(self) -> Result<Service, DbError> {
        let id = parse_uuid(&self.record_id, "service")?;
        Ok(Service {
            id,
            name: self.name,
            price: self.price,
            duration_minutes: self.duration_minutes,
            department: self.department,
            home_collection: self.home_collection,
            active: self.active,
            hours: self.hours.try_into_hours()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Service repository.
#[derive(Clone)]
pub struct SurrealServiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealServiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ServiceRepository for SurrealServiceRepository<C> {
    async fn create(&self, input: CreateService, audit: AuditEvent) -> PortalResult<Service> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let hours = HoursRow::from_hours(&input.hours.unwrap_or_default());
        let audit = AuditEvent {
            entity_id: audit.entity_id.or(Some(id)),
            ..audit
        };
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('service', $id) SET \
             name = $name, price = $price, \
             duration_minutes = $duration_minutes, \
             department = $department, \
             home_collection = $home_collection, \
             active = true, hours = $hours; \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("price", input.price))
            .bind(("duration_minutes", input.duration_minutes))
            .bind(("department", input.department))
            .bind(("home_collection", input.home_collection))
            .bind(("hours", hours))
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
                    message: "service name already in use".into(),
                }
            } else {
                mutation_error(e)
            }
        })?;

        let rows: Vec<ServiceRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service".into(),
            id: id_str,
        })?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> PortalResult<Service> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('service', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service".into(),
            id: id_str,
        })?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn get_by_name(&self, name: &str) -> PortalResult<Service> {
        let name_owned = name.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service \
                 WHERE name = $name",
            )
            .bind(("name", name_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service".into(),
            id: format!("name={name_owned}"),
        })?;

        row.try_into_service().map_err(Into::into)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateService,
        audit: AuditEvent,
    ) -> PortalResult<Service> {
        let id_str = id.to_string();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.duration_minutes.is_some() {
            sets.push("duration_minutes = $duration_minutes");
        }
        if input.department.is_some() {
            sets.push("department = $department");
        }
        if input.home_collection.is_some() {
            sets.push("home_collection = $home_collection");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.hours.is_some() {
            sets.push("hours = $hours");
        }
        sets.push("updated_at = time::now()");

        let sql = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('service', $id) SET {}; \
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
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(duration_minutes) = input.duration_minutes {
            builder = builder.bind(("duration_minutes", duration_minutes));
        }
        if let Some(department) = input.department {
            builder = builder.bind(("department", department));
        }
        if let Some(home_collection) = input.home_collection {
            builder = builder.bind(("home_collection", home_collection));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }
        if let Some(hours) = input.hours {
            builder = builder.bind(("hours", HoursRow::from_hours(&hours)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| {
            if is_duplicate(&e) {
                PortalError::Validation {
                    message: "service name already in use".into(),
                }
            } else {
                mutation_error(e)
            }
        })?;

        let rows: Vec<ServiceRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "service".into(),
            id: id_str,
        })?;

        row.try_into_service(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid, audit: AuditEvent) -> PortalResult<()> {
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        // Referential integrity is the scheduler layer's job: the
        // guard and the delete commit or abort together.
        let sql = format!(
            "BEGIN TRANSACTION; \
             LET $refs = (SELECT VALUE count() FROM appointment \
             WHERE service_id = $id GROUP ALL)[0] ?? 0; \
             IF $refs > 0 {{ THROW 'service_referenced' }}; \
             DELETE type::record('service', $id); \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let mut result = self
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
            } else {
                let (_, e) = errors
                    .into_iter()
                    .min_by_key(|(index, _)| *index)
                    .expect("non-empty error map");
                mutation_error(e)
            });
        }

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> PortalResult<PaginatedResult<Service>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM service GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM service \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ServiceRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_service())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
