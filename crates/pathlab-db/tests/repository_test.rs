//! Integration tests for the SurrealDB repository implementations
//! using an in-memory engine.

use chrono::{NaiveDate, NaiveTime, Utc};
use pathlab_core::error::PortalError;
use pathlab_core::models::appointment::{AppointmentStatus, CreateAppointment, Location};
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::employee::CreateEmployee;
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::models::service::{CreateService, UpdateService};
use pathlab_core::models::session::CreateSession;
use pathlab_core::models::user::CreateUser;
use pathlab_core::repository::{
    AppointmentRepository, AuditLogFilter, AuditLogRepository, BatchAction, BatchCollection,
    BatchRepository, EmployeeRepository, Pagination, ServiceRepository, SessionRepository,
    UserRepository,
};
use pathlab_db::repository::{
    SurrealAppointmentRepository, SurrealAuditLogRepository, SurrealBatchRepository,
    SurrealEmployeeRepository, SurrealServiceRepository, SurrealSessionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pathlab_db::run_migrations(&db).await.unwrap();
    db
}

fn actor() -> Uuid {
    Uuid::new_v4()
}

fn audit(actor_id: Uuid, action: AuditAction, entity_type: EntityType) -> AuditEvent {
    AuditEvent::new(actor_id, action, entity_type)
}

fn cbc() -> CreateService {
    CreateService {
        name: "Complete Blood Count".into(),
        price: 500,
        duration_minutes: 30,
        department: "Hematology".into(),
        home_collection: true,
        hours: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn slot(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// -----------------------------------------------------------------------
// Service tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_service() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let admin = actor();

    let service = repo
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    assert_eq!(service.name, "Complete Blood Count");
    assert_eq!(service.price, 500);
    assert!(service.active);
    // Default operating hours apply when none are given.
    assert_eq!(service.hours.slot_minutes, 30);
    assert_eq!(service.hours.open, slot(9, 0));

    let fetched = repo.get_by_id(service.id).await.unwrap();
    assert_eq!(fetched.id, service.id);
    assert_eq!(fetched.name, service.name);

    let by_name = repo.get_by_name("Complete Blood Count").await.unwrap();
    assert_eq!(by_name.id, service.id);
}

#[tokio::test]
async fn duplicate_service_name_is_rejected() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let admin = actor();

    repo.create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    let result = repo
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await;
    assert!(matches!(result, Err(PortalError::Validation { .. })));
}

#[tokio::test]
async fn update_service_changes_only_given_fields() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let admin = actor();

    let service = repo
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    let updated = repo
        .update(
            service.id,
            UpdateService {
                price: Some(650),
                ..Default::default()
            },
            audit(admin, AuditAction::Update, EntityType::Service),
        )
        .await
        .unwrap();

    assert_eq!(updated.price, 650);
    assert_eq!(updated.name, service.name);
    assert_eq!(updated.department, service.department);
}

#[tokio::test]
async fn delete_service_without_appointments() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let admin = actor();

    let service = repo
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    repo.delete(
        service.id,
        audit(admin, AuditAction::Delete, EntityType::Service),
    )
    .await
    .unwrap();

    let result = repo.get_by_id(service.id).await;
    assert!(matches!(result, Err(PortalError::NotFound { .. })));
}

#[tokio::test]
async fn delete_referenced_service_is_blocked() {
    let db = setup().await;
    let services = SurrealServiceRepository::new(db.clone());
    let appointments = SurrealAppointmentRepository::new(db);
    let admin = actor();
    let patient = actor();

    let service = services
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    appointments
        .reserve(
            CreateAppointment {
                patient_id: patient,
                service_id: service.id,
                employee_id: None,
                date: date(2026, 9, 7),
                slot: slot(10, 0),
                location: Location::Lab,
                amount: 500,
            },
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    let result = services
        .delete(
            service.id,
            audit(admin, AuditAction::Delete, EntityType::Service),
        )
        .await;
    assert!(matches!(
        result,
        Err(PortalError::ReferentialConflict { .. })
    ));

    // The blocked delete must leave the service untouched.
    assert!(services.get_by_id(service.id).await.is_ok());
}

#[tokio::test]
async fn list_services_with_pagination() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db);
    let admin = actor();

    for i in 0..5 {
        let mut input = cbc();
        input.name = format!("Service {i}");
        repo.create(input, audit(admin, AuditAction::Create, EntityType::Service))
            .await
            .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 3);

    let rest = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 2);
}

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

fn patient_input(email: &str) -> CreateUser {
    CreateUser {
        name: "Pat Ndiaye".into(),
        email: email.into(),
        phone: Some("555-0101".into()),
        password_hash: "$argon2id$stub".into(),
        role: Role::User,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let admin = actor();

    let user = repo
        .create(
            patient_input("pat@example.com"),
            audit(admin, AuditAction::Create, EntityType::User),
        )
        .await
        .unwrap();

    assert_eq!(user.email, "pat@example.com");
    assert_eq!(user.role, Role::User);
    assert!(user.active);

    let by_email = repo.get_by_email("pat@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_user_email_is_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let admin = actor();

    repo.create(
        patient_input("dup@example.com"),
        audit(admin, AuditAction::Create, EntityType::User),
    )
    .await
    .unwrap();

    let result = repo
        .create(
            patient_input("dup@example.com"),
            audit(admin, AuditAction::Create, EntityType::User),
        )
        .await;
    assert!(matches!(result, Err(PortalError::Validation { .. })));
}

#[tokio::test]
async fn delete_user_is_soft() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);
    let admin = actor();

    let user = repo
        .create(
            patient_input("soft@example.com"),
            audit(admin, AuditAction::Create, EntityType::User),
        )
        .await
        .unwrap();

    repo.delete(user.id, audit(admin, AuditAction::Delete, EntityType::User))
        .await
        .unwrap();

    // Record survives for appointment history; only deactivated.
    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(!fetched.active);
}

// -----------------------------------------------------------------------
// Employee tests
// -----------------------------------------------------------------------

fn employee_input(email: &str) -> CreateEmployee {
    CreateEmployee {
        name: "Sam Okafor".into(),
        email: email.into(),
        password_hash: "$argon2id$stub".into(),
        department: "Hematology".into(),
    }
}

#[tokio::test]
async fn new_employee_starts_with_no_permissions() {
    let db = setup().await;
    let repo = SurrealEmployeeRepository::new(db);
    let admin = actor();

    let employee = repo
        .create(
            employee_input("sam@lab.example"),
            audit(admin, AuditAction::Create, EntityType::Employee),
        )
        .await
        .unwrap();

    assert!(employee.permissions.is_empty());
}

#[tokio::test]
async fn set_permissions_replaces_whole_set() {
    let db = setup().await;
    let repo = SurrealEmployeeRepository::new(db);
    let admin = actor();

    let employee = repo
        .create(
            employee_input("perm@lab.example"),
            audit(admin, AuditAction::Create, EntityType::Employee),
        )
        .await
        .unwrap();

    let granted = repo
        .set_permissions(
            employee.id,
            vec![Permission::ViewAppointments, Permission::EditReports],
            audit(admin, AuditAction::Grant, EntityType::Employee),
        )
        .await
        .unwrap();
    assert_eq!(
        granted.permissions,
        vec![Permission::ViewAppointments, Permission::EditReports]
    );

    // A later grant replaces, not extends.
    let regranted = repo
        .set_permissions(
            employee.id,
            vec![Permission::ViewReports],
            audit(admin, AuditAction::Grant, EntityType::Employee),
        )
        .await
        .unwrap();
    assert_eq!(regranted.permissions, vec![Permission::ViewReports]);
}

// -----------------------------------------------------------------------
// Appointment tests
// -----------------------------------------------------------------------

async fn seeded_service(db: &Surreal<surrealdb::engine::local::Db>) -> Uuid {
    let repo = SurrealServiceRepository::new(db.clone());
    repo.create(cbc(), audit(actor(), AuditAction::Create, EntityType::Service))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn reserve_slot_creates_scheduled_appointment() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let repo = SurrealAppointmentRepository::new(db);
    let patient = actor();

    let appointment = repo
        .reserve(
            CreateAppointment {
                patient_id: patient,
                service_id,
                employee_id: None,
                date: date(2026, 9, 7),
                slot: slot(10, 30),
                location: Location::Home,
                amount: 600,
            },
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.amount, 600);
    assert_eq!(appointment.location, Location::Home);

    let booked = repo.booked_slots(service_id, date(2026, 9, 7)).await.unwrap();
    assert_eq!(booked, vec![slot(10, 30)]);
}

#[tokio::test]
async fn double_booking_same_slot_is_rejected() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let repo = SurrealAppointmentRepository::new(db);

    let input = CreateAppointment {
        patient_id: actor(),
        service_id,
        employee_id: None,
        date: date(2026, 9, 7),
        slot: slot(11, 0),
        location: Location::Lab,
        amount: 500,
    };

    repo.reserve(
        input.clone(),
        audit(input.patient_id, AuditAction::Book, EntityType::Appointment),
    )
    .await
    .unwrap();

    let second = CreateAppointment {
        patient_id: actor(),
        ..input
    };
    let result = repo
        .reserve(
            second.clone(),
            audit(second.patient_id, AuditAction::Book, EntityType::Appointment),
        )
        .await;
    assert!(matches!(result, Err(PortalError::SlotAlreadyBooked)));
}

#[tokio::test]
async fn concurrent_reservations_have_exactly_one_winner() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = SurrealAppointmentRepository::new(db.clone());
        handles.push(tokio::spawn(async move {
            let patient = Uuid::new_v4();
            repo.reserve(
                CreateAppointment {
                    patient_id: patient,
                    service_id,
                    employee_id: None,
                    date: date(2026, 9, 8),
                    slot: slot(9, 0),
                    location: Location::Lab,
                    amount: 500,
                },
                AuditEvent::new(patient, AuditAction::Book, EntityType::Appointment),
            )
            .await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(PortalError::SlotAlreadyBooked) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1, "exactly one reservation must win");
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn cancelling_frees_the_slot_for_rebooking() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let repo = SurrealAppointmentRepository::new(db);
    let patient = actor();

    let input = CreateAppointment {
        patient_id: patient,
        service_id,
        employee_id: None,
        date: date(2026, 9, 9),
        slot: slot(14, 0),
        location: Location::Lab,
        amount: 500,
    };

    let appointment = repo
        .reserve(
            input.clone(),
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    let cancelled = repo
        .set_status(
            appointment.id,
            AppointmentStatus::Cancelled,
            audit(patient, AuditAction::Cancel, EntityType::Appointment),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    // Slot hold released.
    let booked = repo.booked_slots(service_id, date(2026, 9, 9)).await.unwrap();
    assert!(booked.is_empty());

    // Same slot bookable again by someone else.
    let rebooked = repo
        .reserve(
            CreateAppointment {
                patient_id: actor(),
                ..input
            },
            audit(actor(), AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();
    assert_eq!(rebooked.slot, slot(14, 0));

    // The cancelled record itself survives.
    let kept = repo.get_by_id(appointment.id).await.unwrap();
    assert_eq!(kept.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn completing_keeps_the_slot_held() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let repo = SurrealAppointmentRepository::new(db);
    let patient = actor();

    let appointment = repo
        .reserve(
            CreateAppointment {
                patient_id: patient,
                service_id,
                employee_id: None,
                date: date(2026, 9, 10),
                slot: slot(9, 30),
                location: Location::Lab,
                amount: 500,
            },
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    repo.set_status(
        appointment.id,
        AppointmentStatus::Completed,
        audit(actor(), AuditAction::Complete, EntityType::Appointment),
    )
    .await
    .unwrap();

    let booked = repo
        .booked_slots(service_id, date(2026, 9, 10))
        .await
        .unwrap();
    assert_eq!(booked, vec![slot(9, 30)]);
}

#[tokio::test]
async fn list_appointments_by_patient() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let repo = SurrealAppointmentRepository::new(db);
    let patient = actor();
    let other = actor();

    for (who, hour) in [(patient, 9), (patient, 10), (other, 11)] {
        repo.reserve(
            CreateAppointment {
                patient_id: who,
                service_id,
                employee_id: None,
                date: date(2026, 9, 11),
                slot: slot(hour, 0),
                location: Location::Lab,
                amount: 500,
            },
            audit(who, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();
    }

    let mine = repo
        .list_by_patient(patient, Pagination::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 2);
    assert!(mine.items.iter().all(|a| a.patient_id == patient));

    assert_eq!(repo.count_by_service(service_id).await.unwrap(), 3);
}

// -----------------------------------------------------------------------
// Session tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn session_round_trip_and_invalidate() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);
    let user_id = actor();

    let session = repo
        .create(
            CreateSession {
                actor_id: user_id,
                role: Role::User,
                token_hash: "deadbeef".into(),
                expires_at: Utc::now() + chrono::Duration::hours(24),
            },
            audit(user_id, AuditAction::Login, EntityType::Session),
        )
        .await
        .unwrap();

    let fetched = repo.get_by_token_hash("deadbeef").await.unwrap();
    assert_eq!(fetched.id, session.id);
    assert_eq!(fetched.actor_id, user_id);
    assert_eq!(fetched.role, Role::User);

    repo.invalidate(
        session.id,
        audit(user_id, AuditAction::Logout, EntityType::Session),
    )
    .await
    .unwrap();

    let gone = repo.get_by_token_hash("deadbeef").await;
    assert!(matches!(gone, Err(PortalError::NotFound { .. })));
}

#[tokio::test]
async fn cleanup_removes_only_expired_sessions() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);
    let user_id = actor();

    repo.create(
        CreateSession {
            actor_id: user_id,
            role: Role::User,
            token_hash: "expired".into(),
            expires_at: Utc::now() - chrono::Duration::hours(1),
        },
        audit(user_id, AuditAction::Login, EntityType::Session),
    )
    .await
    .unwrap();

    repo.create(
        CreateSession {
            actor_id: user_id,
            role: Role::User,
            token_hash: "live".into(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        },
        audit(user_id, AuditAction::Login, EntityType::Session),
    )
    .await
    .unwrap();

    assert_eq!(repo.cleanup_expired().await.unwrap(), 1);
    assert!(repo.get_by_token_hash("live").await.is_ok());
    assert!(repo.get_by_token_hash("expired").await.is_err());
}

// -----------------------------------------------------------------------
// Audit log tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn append_and_list_in_reverse_order() {
    let db = setup().await;
    let repo = SurrealAuditLogRepository::new(db);
    let admin = actor();

    for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
        repo.append(AuditEvent::new(admin, action, EntityType::Service))
            .await
            .unwrap();
    }

    let page = repo
        .list(AuditLogFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    for window in page.items.windows(2) {
        assert!(window[0].timestamp >= window[1].timestamp);
    }
}

#[tokio::test]
async fn audit_filters_are_conjunctive() {
    let db = setup().await;
    let repo = SurrealAuditLogRepository::new(db);
    let alice = actor();
    let bob = actor();

    repo.append(AuditEvent::new(alice, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();
    repo.append(AuditEvent::new(alice, AuditAction::Delete, EntityType::Service))
        .await
        .unwrap();
    repo.append(AuditEvent::new(bob, AuditAction::Create, EntityType::User))
        .await
        .unwrap();

    let filtered = repo
        .list(
            AuditLogFilter {
                actor_id: Some(alice),
                action: Some(AuditAction::Create),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.items[0].actor_id, alice);
    assert_eq!(filtered.items[0].action, AuditAction::Create);
}

#[tokio::test]
async fn audit_entry_carries_details_payload() {
    let db = setup().await;
    let repo = SurrealAuditLogRepository::new(db);
    let admin = actor();
    let target = actor();

    repo.append(
        AuditEvent::new(admin, AuditAction::Grant, EntityType::Employee)
            .entity(target)
            .details(serde_json::json!({"granted": ["view_reports"]})),
    )
    .await
    .unwrap();

    let page = repo
        .list(AuditLogFilter::default(), Pagination::default())
        .await
        .unwrap();
    let entry = &page.items[0];
    assert_eq!(entry.entity_id, Some(target));
    assert_eq!(entry.details["granted"][0], "view_reports");
}

#[tokio::test]
async fn mutations_write_their_audit_entry_atomically() {
    let db = setup().await;
    let services = SurrealServiceRepository::new(db.clone());
    let audit_log = SurrealAuditLogRepository::new(db);
    let admin = actor();

    let service = services
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    let page = audit_log
        .list(
            AuditLogFilter {
                entity_type: Some(EntityType::Service),
                entity_id: Some(service.id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].actor_id, admin);
    assert_eq!(page.items[0].action, AuditAction::Create);
}

#[tokio::test]
async fn failed_mutation_writes_no_audit_entry() {
    let db = setup().await;
    let services = SurrealServiceRepository::new(db.clone());
    let audit_log = SurrealAuditLogRepository::new(db);
    let admin = actor();

    services
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();

    // Duplicate name aborts the whole transaction, audit entry included.
    let result = services
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await;
    assert!(result.is_err());

    let page = audit_log
        .list(
            AuditLogFilter {
                action: Some(AuditAction::Create),
                entity_type: Some(EntityType::Service),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1, "only the successful create is recorded");
}

// -----------------------------------------------------------------------
// Batch tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn batch_archive_deactivates_services() {
    let db = setup().await;
    let services = SurrealServiceRepository::new(db.clone());
    let batch = SurrealBatchRepository::new(db);
    let admin = actor();

    let mut ids = Vec::new();
    for i in 0..3 {
        let mut input = cbc();
        input.name = format!("Archive {i}");
        let service = services
            .create(input, audit(admin, AuditAction::Create, EntityType::Service))
            .await
            .unwrap();
        ids.push(service.id);
    }

    let affected = batch
        .apply(
            BatchCollection::Services,
            BatchAction::Archive,
            ids.clone(),
            audit(admin, AuditAction::Archive, EntityType::Service),
        )
        .await
        .unwrap();
    assert_eq!(affected, 3);

    for id in ids {
        assert!(!services.get_by_id(id).await.unwrap().active);
    }
}

#[tokio::test]
async fn batch_delete_of_referenced_service_is_blocked() {
    let db = setup().await;
    let services = SurrealServiceRepository::new(db.clone());
    let appointments = SurrealAppointmentRepository::new(db.clone());
    let batch = SurrealBatchRepository::new(db);
    let admin = actor();
    let patient = actor();

    let service = services
        .create(cbc(), audit(admin, AuditAction::Create, EntityType::Service))
        .await
        .unwrap();
    appointments
        .reserve(
            CreateAppointment {
                patient_id: patient,
                service_id: service.id,
                employee_id: None,
                date: date(2026, 9, 14),
                slot: slot(10, 0),
                location: Location::Lab,
                amount: 500,
            },
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    let result = batch
        .apply(
            BatchCollection::Services,
            BatchAction::Delete,
            vec![service.id],
            audit(admin, AuditAction::Delete, EntityType::Service),
        )
        .await;
    assert!(matches!(
        result,
        Err(PortalError::ReferentialConflict { .. })
    ));
    assert!(services.get_by_id(service.id).await.is_ok());
}

#[tokio::test]
async fn batch_delete_of_appointments_is_rejected() {
    let db = setup().await;
    let batch = SurrealBatchRepository::new(db);
    let admin = actor();

    let result = batch
        .apply(
            BatchCollection::Appointments,
            BatchAction::Delete,
            vec![Uuid::new_v4()],
            audit(admin, AuditAction::Delete, EntityType::Appointment),
        )
        .await;
    assert!(matches!(result, Err(PortalError::Validation { .. })));
}

#[tokio::test]
async fn batch_archive_of_appointments_cancels_and_frees_slots() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let appointments = SurrealAppointmentRepository::new(db.clone());
    let batch = SurrealBatchRepository::new(db);
    let admin = actor();
    let patient = actor();

    let appointment = appointments
        .reserve(
            CreateAppointment {
                patient_id: patient,
                service_id,
                employee_id: None,
                date: date(2026, 9, 15),
                slot: slot(15, 0),
                location: Location::Lab,
                amount: 500,
            },
            audit(patient, AuditAction::Book, EntityType::Appointment),
        )
        .await
        .unwrap();

    let affected = batch
        .apply(
            BatchCollection::Appointments,
            BatchAction::Archive,
            vec![appointment.id],
            audit(admin, AuditAction::Archive, EntityType::Appointment),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let cancelled = appointments.get_by_id(appointment.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let booked = appointments
        .booked_slots(service_id, date(2026, 9, 15))
        .await
        .unwrap();
    assert!(booked.is_empty());
}

#[tokio::test]
async fn batch_archive_keeps_holds_of_completed_appointments() {
    let db = setup().await;
    let service_id = seeded_service(&db).await;
    let appointments = SurrealAppointmentRepository::new(db.clone());
    let batch = SurrealBatchRepository::new(db);
    let admin = actor();
    let patient = actor();

    let make = |h: u32| CreateAppointment {
        patient_id: patient,
        service_id,
        employee_id: None,
        date: date(2026, 9, 16),
        slot: slot(h, 0),
        location: Location::Lab,
        amount: 500,
    };
    let scheduled = appointments
        .reserve(make(9), audit(patient, AuditAction::Book, EntityType::Appointment))
        .await
        .unwrap();
    let completed = appointments
        .reserve(make(10), audit(patient, AuditAction::Book, EntityType::Appointment))
        .await
        .unwrap();
    appointments
        .set_status(
            completed.id,
            AppointmentStatus::Completed,
            audit(admin, AuditAction::Complete, EntityType::Appointment),
        )
        .await
        .unwrap();

    // Both ids in the batch; only the scheduled one is cancellable.
    let affected = batch
        .apply(
            BatchCollection::Appointments,
            BatchAction::Archive,
            vec![scheduled.id, completed.id],
            audit(admin, AuditAction::Archive, EntityType::Appointment),
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let booked = appointments
        .booked_slots(service_id, date(2026, 9, 16))
        .await
        .unwrap();
    // The completed appointment's hold survives; the cancelled one is
    // freed.
    assert_eq!(booked, vec![slot(10, 0)]);

    let untouched = appointments.get_by_id(completed.id).await.unwrap();
    assert_eq!(untouched.status, AppointmentStatus::Completed);
}
