//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Every mutating operation takes
//! an [`AuditEvent`](crate::models::audit::AuditEvent) which the
//! implementation must commit in the same storage transaction as the
//! domain write — a mutation without its audit entry must not be
//! observable, and vice versa.

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::PortalResult;
use crate::models::{
    appointment::{Appointment, AppointmentStatus, CreateAppointment},
    audit::{AuditAction, AuditEvent, AuditLogEntry, EntityType},
    employee::{CreateEmployee, Employee, UpdateEmployee},
    permission::Permission,
    service::{CreateService, Service, UpdateService},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

pub trait ServiceRepository: Send + Sync {
    fn create(
        &self,
        input: CreateService,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Service>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PortalResult<Service>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = PortalResult<Service>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateService,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Service>> + Send;
    /// Hard delete; fails with `ReferentialConflict` while any
    /// appointment still references the service.
    fn delete(&self, id: Uuid, audit: AuditEvent) -> impl Future<Output = PortalResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<Service>>> + Send;
}

// ---------------------------------------------------------------------------
// Users & Employees
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(
        &self,
        input: CreateUser,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PortalResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = PortalResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<User>> + Send;
    /// Soft-delete: sets `active` to false.
    fn delete(&self, id: Uuid, audit: AuditEvent) -> impl Future<Output = PortalResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<User>>> + Send;
}

pub trait EmployeeRepository: Send + Sync {
    fn create(
        &self,
        input: CreateEmployee,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Employee>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PortalResult<Employee>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = PortalResult<Employee>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateEmployee,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Employee>> + Send;
    /// Soft-delete: sets `active` to false.
    fn delete(&self, id: Uuid, audit: AuditEvent) -> impl Future<Output = PortalResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<Employee>>> + Send;
    /// Replace the granted permission set in a single write.
    fn set_permissions(
        &self,
        id: Uuid,
        permissions: Vec<Permission>,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Employee>> + Send;
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

pub trait AppointmentRepository: Send + Sync {
    /// Atomic check-then-insert: the slot hold, the appointment record
    /// and the audit entry commit in one transaction. A concurrent
    /// reservation of the same (service, date, slot) fails with
    /// `SlotAlreadyBooked`.
    fn reserve(
        &self,
        input: CreateAppointment,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Appointment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PortalResult<Appointment>> + Send;
    /// Status transition. Transitioning to `Cancelled` frees the slot
    /// hold so the slot becomes bookable again.
    fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Appointment>> + Send;
    /// Slots consumed by non-cancelled appointments for a service/date.
    fn booked_slots(
        &self,
        service_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = PortalResult<Vec<NaiveTime>>> + Send;
    fn count_by_service(&self, service_id: Uuid) -> impl Future<Output = PortalResult<u64>> + Send;
    fn list_by_patient(
        &self,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<Appointment>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<Appointment>>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSession,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = PortalResult<Session>> + Send;
    /// Invalidate a single session (logout).
    fn invalidate(
        &self,
        id: Uuid,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<()>> + Send;
    /// Remove all expired sessions; returns how many were dropped.
    fn cleanup_expired(&self) -> impl Future<Output = PortalResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

/// Query filters for audit log entries. Filters are conjunctive;
/// absent filters impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<Uuid>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a standalone entry. No update or delete operations exist.
    fn append(&self, event: AuditEvent) -> impl Future<Output = PortalResult<AuditLogEntry>> + Send;
    /// Entries in reverse-chronological order.
    fn list(
        &self,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = PortalResult<PaginatedResult<AuditLogEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Batch operations (admin console)
// ---------------------------------------------------------------------------

/// Collection a batch operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCollection {
    Services,
    Users,
    Employees,
    Appointments,
}

impl BatchCollection {
    pub fn entity_type(&self) -> EntityType {
        match self {
            BatchCollection::Services => EntityType::Service,
            BatchCollection::Users => EntityType::User,
            BatchCollection::Employees => EntityType::Employee,
            BatchCollection::Appointments => EntityType::Appointment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    /// Deactivate (services/users/employees) or cancel (appointments).
    Archive,
    /// Hard delete; not permitted for appointments.
    Delete,
}

pub trait BatchRepository: Send + Sync {
    /// Apply one action to a set of ids; returns the number of records
    /// affected. One audit entry is written per batch.
    fn apply(
        &self,
        collection: BatchCollection,
        action: BatchAction,
        ids: Vec<Uuid>,
        audit: AuditEvent,
    ) -> impl Future<Output = PortalResult<u64>> + Send;
}
