//! Integration tests for the authentication flow against in-memory
//! SurrealDB repositories.

use pathlab_auth::{AuthConfig, AuthService, gate};
use pathlab_core::error::PortalError;
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::employee::CreateEmployee;
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::models::user::{CreateUser, UpdateUser};
use pathlab_core::repository::{EmployeeRepository, UserRepository};
use pathlab_db::repository::{
    SurrealEmployeeRepository, SurrealSessionRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type TestAuthService = AuthService<
    SurrealUserRepository<Db>,
    SurrealEmployeeRepository<Db>,
    SurrealSessionRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, TestAuthService) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pathlab_db::run_migrations(&db).await.unwrap();

    let auth = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealEmployeeRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
        AuthConfig::default(),
    );
    (db, auth)
}

fn admin_event() -> AuditEvent {
    AuditEvent::new(Uuid::new_v4(), AuditAction::Create, EntityType::User)
}

async fn seed_user(db: &Surreal<Db>, auth: &TestAuthService, email: &str, password: &str) -> Uuid {
    let repo = SurrealUserRepository::new(db.clone());
    repo.create(
        CreateUser {
            name: "Pat Ndiaye".into(),
            email: email.into(),
            phone: None,
            password_hash: auth.hash_new_password(password).unwrap(),
            role: Role::User,
        },
        admin_event(),
    )
    .await
    .unwrap()
    .id
}

async fn seed_employee(
    db: &Surreal<Db>,
    auth: &TestAuthService,
    email: &str,
    password: &str,
) -> Uuid {
    let repo = SurrealEmployeeRepository::new(db.clone());
    repo.create(
        CreateEmployee {
            name: "Sam Okafor".into(),
            email: email.into(),
            password_hash: auth.hash_new_password(password).unwrap(),
            department: "Hematology".into(),
        },
        AuditEvent::new(Uuid::new_v4(), AuditAction::Create, EntityType::Employee),
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn login_and_resolve_session() {
    let (db, auth) = setup().await;
    let user_id = seed_user(&db, &auth, "pat@example.com", "correct horse").await;

    let output = auth.login("pat@example.com", "correct horse").await.unwrap();
    assert_eq!(output.session.actor_id, user_id);
    assert_eq!(output.session.role, Role::User);

    let resolved = auth.resolve(&output.token).await.unwrap();
    assert_eq!(resolved.id, output.session.id);
    assert_eq!(resolved.actor_id, user_id);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (db, auth) = setup().await;
    seed_user(&db, &auth, "pat@example.com", "correct horse").await;

    let result = auth.login("pat@example.com", "battery staple").await;
    assert!(matches!(result, Err(PortalError::InvalidCredentials)));
}

#[tokio::test]
async fn unknown_email_is_rejected() {
    let (_db, auth) = setup().await;
    let result = auth.login("nobody@example.com", "whatever!").await;
    assert!(matches!(result, Err(PortalError::InvalidCredentials)));
}

#[tokio::test]
async fn inactive_account_cannot_login() {
    let (db, auth) = setup().await;
    let user_id = seed_user(&db, &auth, "gone@example.com", "correct horse").await;

    let repo = SurrealUserRepository::new(db.clone());
    repo.update(
        user_id,
        UpdateUser {
            active: Some(false),
            ..Default::default()
        },
        AuditEvent::new(Uuid::new_v4(), AuditAction::Update, EntityType::User),
    )
    .await
    .unwrap();

    let result = auth.login("gone@example.com", "correct horse").await;
    assert!(matches!(result, Err(PortalError::InvalidCredentials)));
}

#[tokio::test]
async fn employee_login_gets_employee_role() {
    let (db, auth) = setup().await;
    let employee_id = seed_employee(&db, &auth, "sam@lab.example", "correct horse").await;

    let output = auth.login("sam@lab.example", "correct horse").await.unwrap();
    assert_eq!(output.session.actor_id, employee_id);
    assert_eq!(output.session.role, Role::Employee);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (db, auth) = setup().await;
    seed_user(&db, &auth, "pat@example.com", "correct horse").await;

    let output = auth.login("pat@example.com", "correct horse").await.unwrap();
    auth.logout(&output.session).await.unwrap();

    let result = auth.resolve(&output.token).await;
    assert!(matches!(result, Err(PortalError::NotAuthenticated)));
}

#[tokio::test]
async fn garbage_token_is_not_authenticated() {
    let (_db, auth) = setup().await;
    let result = auth.resolve("not-a-real-token").await;
    assert!(matches!(result, Err(PortalError::NotAuthenticated)));
}

#[tokio::test]
async fn short_password_is_rejected_by_policy() {
    let (_db, auth) = setup().await;
    let result = auth.hash_new_password("short");
    assert!(matches!(result, Err(PortalError::Validation { .. })));
}

// -----------------------------------------------------------------------
// Permission grants
// -----------------------------------------------------------------------

fn admin_session() -> pathlab_core::models::session::Session {
    pathlab_core::models::session::Session {
        id: Uuid::new_v4(),
        actor_id: Uuid::new_v4(),
        role: Role::Admin,
        token_hash: "hash".into(),
        expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        created_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn admin_grants_permissions() {
    let (db, auth) = setup().await;
    let employee_id = seed_employee(&db, &auth, "sam@lab.example", "correct horse").await;
    let repo = SurrealEmployeeRepository::new(db);

    let employee = gate::grant_permissions(
        &repo,
        &admin_session(),
        employee_id,
        &["view_appointments".into(), "edit_reports".into()],
    )
    .await
    .unwrap();

    assert_eq!(
        employee.permissions,
        vec![Permission::ViewAppointments, Permission::EditReports]
    );
}

#[tokio::test]
async fn unknown_permission_rejects_the_whole_grant() {
    let (db, auth) = setup().await;
    let employee_id = seed_employee(&db, &auth, "sam@lab.example", "correct horse").await;
    let repo = SurrealEmployeeRepository::new(db);

    let result = gate::grant_permissions(
        &repo,
        &admin_session(),
        employee_id,
        &["view_appointments".into(), "launch_rockets".into()],
    )
    .await;
    assert!(matches!(
        result,
        Err(PortalError::InvalidPermission { name }) if name == "launch_rockets"
    ));

    // Nothing was written.
    let employee = repo.get_by_id(employee_id).await.unwrap();
    assert!(employee.permissions.is_empty());
}

#[tokio::test]
async fn non_admin_cannot_grant() {
    let (db, auth) = setup().await;
    let employee_id = seed_employee(&db, &auth, "sam@lab.example", "correct horse").await;
    let repo = SurrealEmployeeRepository::new(db);

    let mut session = admin_session();
    session.role = Role::Employee;

    let result =
        gate::grant_permissions(&repo, &session, employee_id, &["view_reports".into()]).await;
    assert!(matches!(result, Err(PortalError::NotAuthorized { .. })));
}
