//! SurrealDB implementation of [`AppointmentRepository`].
//!
//! Slot exclusivity: every reservation first creates a `slot_hold`
//! record whose id is derived from (service, date, slot). Two
//! concurrent reservations race on that record id inside the storage
//! engine; the loser's transaction aborts and surfaces as
//! `SlotAlreadyBooked`. Cancellation deletes the hold, which is what
//! makes the slot bookable again.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::appointment::{
    Appointment, AppointmentStatus, CreateAppointment, Location, PaymentStatus,
};
use pathlab_core::models::audit::AuditEvent;
use pathlab_core::repository::{AppointmentRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_duplicate};
use crate::repository::{
    AUDIT_APPEND_SQL, CountRow, audit_binds, format_date, format_slot, mutation_error, parse_date,
    parse_slot, parse_uuid, slot_hold_key,
};

fn parse_status(raw: &str) -> Result<AppointmentStatus, DbError> {
    match raw {
        "scheduled" => Ok(AppointmentStatus::Scheduled),
        "completed" => Ok(AppointmentStatus::Completed),
        "cancelled" => Ok(AppointmentStatus::Cancelled),
        other => Err(DbError::Corrupt(format!("invalid status: {other}"))),
    }
}

fn parse_payment_status(raw: &str) -> Result<PaymentStatus, DbError> {
    match raw {
        "pending" => Ok(PaymentStatus::Pending),
        "paid" => Ok(PaymentStatus::Paid),
        "refunded" => Ok(PaymentStatus::Refunded),
        other => Err(DbError::Corrupt(format!("invalid payment status: {other}"))),
    }
}

fn parse_location(raw: &str) -> Result<Location, DbError> {
    match raw {
        "lab" => Ok(Location::Lab),
        "home" => Ok(Location::Home),
        other => Err(DbError::Corrupt(format!("invalid location: {other}"))),
    }
}

#[derive(Debug, SurrealValue)]
struct AppointmentRow {
    patient_id: String,
    service_id: String,
    employee_id: Option<String>,
    date: String,
    slot: String,
    location: String,
    status: String,
    payment_status: String,
    amount: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    fn try_into_appointment(self, id: Uuid) -> Result<Appointment, DbError> {
        Ok(Appointment {
            id,
            patient_id: parse_uuid(&self.patient_id, "patient")?,
            service_id: parse_uuid(&self.service_id, "service")?,
            employee_id: self
                .employee_id
                .as_deref()
                .map(|e| parse_uuid(e, "employee"))
                .transpose()?,
            date: parse_date(&self.date)?,
            slot: parse_slot(&self.slot)?,
            location: parse_location(&self.location)?,
            status: parse_status(&self.status)?,
            payment_status: parse_payment_status(&self.payment_status)?,
            amount: self.amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct AppointmentRowWithId {
    record_id: String,
    patient_id: String,
    service_id: String,
    employee_id: Option<String>,
    date: String,
    slot: String,
    location: String,
    status: String,
    payment_status: String,
    amount: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRowWithId {
    fn try_into_appointment(self) -> Result<Appointment, DbError> {
        let id = parse_uuid(&self.record_id, "appointment")?;
        AppointmentRow {
            patient_id: self.patient_id,
            service_id: self.service_id,
            employee_id: self.employee_id,
            date: self.date,
            slot: self.slot,
            location: self.location,
            status: self.status,
            payment_status: self.payment_status,
            amount: self.amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .try_into_appointment(id)
    }
}

/// SurrealDB implementation of the Appointment repository.
#[derive(Clone)]
pub struct SurrealAppointmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppointmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppointmentRepository for SurrealAppointmentRepository<C> {
    async fn reserve(&self, input: CreateAppointment, audit: AuditEvent) -> PortalResult<Appointment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let hold_key = slot_hold_key(input.service_id, input.date, input.slot);
        let audit = AuditEvent {
            entity_id: audit.entity_id.or(Some(id)),
            ..audit
        };
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit);

        // Hold, appointment and audit entry commit or abort together.
        let sql = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('slot_hold', $hold_key) SET \
             service_id = $service_id, date = $date, slot = $slot, \
             appointment_id = $id; \
             CREATE type::record('appointment', $id) SET \
             patient_id = $patient_id, service_id = $service_id, \
             employee_id = $employee_id, date = $date, slot = $slot, \
             location = $location, status = 'scheduled', \
             payment_status = 'pending', amount = $amount; \
             {AUDIT_APPEND_SQL}; \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(sql)
            .bind(("hold_key", hold_key))
            .bind(("id", id_str.clone()))
            .bind(("patient_id", input.patient_id.to_string()))
            .bind(("service_id", input.service_id.to_string()))
            .bind(("employee_id", input.employee_id.map(|e| e.to_string())))
            .bind(("date", format_date(input.date)))
            .bind(("slot", format_slot(input.slot)))
            .bind(("location", input.location.as_str()))
            .bind(("amount", input.amount))
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
                PortalError::SlotAlreadyBooked
            } else {
                mutation_error(e)
            }
        })?;

        // Statement 0 is BEGIN, 1 the slot hold; the appointment row
        // is at 2.
        let rows: Vec<AppointmentRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        row.try_into_appointment(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> PortalResult<Appointment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('appointment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        row.try_into_appointment(id).map_err(Into::into)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        audit: AuditEvent,
    ) -> PortalResult<Appointment> {
        let id_str = id.to_string();
        let (a_id, a_actor, a_action, a_etype, a_eid, a_details) = audit_binds(audit.entity(id));

        let sql = if status == AppointmentStatus::Cancelled {
            format!(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('appointment', $id) SET \
                 status = $status, updated_at = time::now(); \
                 DELETE slot_hold WHERE appointment_id = $id; \
                 {AUDIT_APPEND_SQL}; \
                 COMMIT TRANSACTION;"
            )
        } else {
            format!(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('appointment', $id) SET \
                 status = $status, updated_at = time::now(); \
                 {AUDIT_APPEND_SQL}; \
                 COMMIT TRANSACTION;"
            )
        };

        let result = self
            .db
            .query(sql)
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str()))
            .bind(a_id)
            .bind(a_actor)
            .bind(a_action)
            .bind(a_etype)
            .bind(a_eid)
            .bind(a_details)
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(mutation_error)?;

        let rows: Vec<AppointmentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "appointment".into(),
            id: id_str,
        })?;

        row.try_into_appointment(id).map_err(Into::into)
    }

    async fn booked_slots(&self, service_id: Uuid, date: NaiveDate) -> PortalResult<Vec<NaiveTime>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE slot FROM slot_hold \
                 WHERE service_id = $service_id AND date = $date",
            )
            .bind(("service_id", service_id.to_string()))
            .bind(("date", format_date(date)))
            .await
            .map_err(DbError::from)?;

        let raw: Vec<String> = result.take(0).map_err(DbError::from)?;
        let mut slots = raw
            .iter()
            .map(|s| parse_slot(s))
            .collect::<Result<Vec<_>, DbError>>()?;
        slots.sort_unstable();

        Ok(slots)
    }

    async fn count_by_service(&self, service_id: Uuid) -> PortalResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM appointment \
                 WHERE service_id = $service_id GROUP ALL",
            )
            .bind(("service_id", service_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_by_patient(
        &self,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> PortalResult<PaginatedResult<Appointment>> {
        let patient_id_str = patient_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM appointment \
                 WHERE patient_id = $patient_id GROUP ALL",
            )
            .bind(("patient_id", patient_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appointment \
                 WHERE patient_id = $patient_id \
                 ORDER BY date DESC, slot DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("patient_id", patient_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_appointment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list(&self, pagination: Pagination) -> PortalResult<PaginatedResult<Appointment>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM appointment GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appointment \
                 ORDER BY date DESC, slot DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_appointment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
