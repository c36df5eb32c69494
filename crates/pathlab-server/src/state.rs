//! Shared application state and service factories.

use pathlab_auth::{AuthConfig, AuthService};
use pathlab_booking::SlotScheduler;
use pathlab_db::repository::{
    SurrealAppointmentRepository, SurrealAuditLogRepository, SurrealBatchRepository,
    SurrealEmployeeRepository, SurrealServiceRepository, SurrealSessionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Auth = AuthService<
    SurrealUserRepository<Any>,
    SurrealEmployeeRepository<Any>,
    SurrealSessionRepository<Any>,
>;
pub type Scheduler = SlotScheduler<SurrealServiceRepository<Any>, SurrealAppointmentRepository<Any>>;

/// Shared state for all request handlers.
///
/// Repositories are cheap clones over the connection handle, so they
/// are built on demand rather than stored.
#[derive(Clone)]
pub struct AppState {
    db: Surreal<Any>,
    auth_config: AuthConfig,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig) -> Self {
        Self { db, auth_config }
    }

    pub fn services(&self) -> SurrealServiceRepository<Any> {
        SurrealServiceRepository::new(self.db.clone())
    }

    pub fn users(&self) -> SurrealUserRepository<Any> {
        SurrealUserRepository::new(self.db.clone())
    }

    pub fn employees(&self) -> SurrealEmployeeRepository<Any> {
        SurrealEmployeeRepository::new(self.db.clone())
    }

    pub fn appointments(&self) -> SurrealAppointmentRepository<Any> {
        SurrealAppointmentRepository::new(self.db.clone())
    }

    pub fn audit_logs(&self) -> SurrealAuditLogRepository<Any> {
        SurrealAuditLogRepository::new(self.db.clone())
    }

    pub fn batch(&self) -> SurrealBatchRepository<Any> {
        SurrealBatchRepository::new(self.db.clone())
    }

    pub fn auth(&self) -> Auth {
        AuthService::new(
            self.users(),
            self.employees(),
            SurrealSessionRepository::new(self.db.clone()),
            self.auth_config.clone(),
        )
    }

    pub fn scheduler(&self) -> Scheduler {
        SlotScheduler::new(self.services(), self.appointments())
    }
}
