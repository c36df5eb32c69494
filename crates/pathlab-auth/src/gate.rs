//! Role and permission gates.
//!
//! Authorization runs in two stages. The coarse gate checks the
//! session's role against what the endpoint requires; the fine gate
//! checks a staff member's granted permission set for the specific
//! capability. Admins pass both stages unconditionally.

use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::employee::Employee;
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::models::session::Session;
use pathlab_core::repository::EmployeeRepository;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Coarse gate: the session's role must match the required role.
/// Admins pass regardless.
pub fn require_role(session: &Session, required: Role) -> PortalResult<()> {
    if session.role == Role::Admin || session.role == required {
        return Ok(());
    }
    Err(PortalError::NotAuthorized {
        reason: format!("requires role {required}"),
    })
}

/// Coarse gate variant for endpoints open to staff and admins alike.
pub fn require_staff(session: &Session) -> PortalResult<()> {
    match session.role {
        Role::Admin | Role::Employee => Ok(()),
        Role::User => Err(PortalError::NotAuthorized {
            reason: "requires staff role".into(),
        }),
    }
}

/// Admin-only gate.
pub fn require_admin(session: &Session) -> PortalResult<()> {
    if session.role == Role::Admin {
        return Ok(());
    }
    Err(PortalError::NotAuthorized {
        reason: "requires admin role".into(),
    })
}

/// Fine gate: the actor must hold `required` in their granted set.
///
/// Admins bypass the check; `granted` is the permission set loaded for
/// the session's employee at action time, never a snapshot from login.
pub fn require_permission(
    session: &Session,
    granted: &[Permission],
    required: Permission,
) -> PortalResult<()> {
    if session.role == Role::Admin {
        return Ok(());
    }
    if granted.contains(&required) {
        return Ok(());
    }
    Err(PortalError::PermissionDenied {
        permission: required.as_str().into(),
    })
}

/// Replace an employee's permission set. Admin-only.
///
/// Every requested name is validated against the closed catalog
/// before anything is written; one unknown name rejects the whole
/// request and no partial grant occurs.
pub async fn grant_permissions<E: EmployeeRepository>(
    employee_repo: &E,
    session: &Session,
    employee_id: Uuid,
    names: &[String],
) -> PortalResult<Employee> {
    require_admin(session)?;

    let mut permissions = Vec::with_capacity(names.len());
    for name in names {
        let permission = name
            .parse::<Permission>()
            .map_err(|_| PortalError::InvalidPermission { name: name.clone() })?;
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }

    let granted: Vec<&str> = permissions.iter().map(|p| p.as_str()).collect();
    let employee = employee_repo
        .set_permissions(
            employee_id,
            permissions.clone(),
            AuditEvent::new(session.actor_id, AuditAction::Grant, EntityType::Employee)
                .details(json!({ "granted": granted })),
        )
        .await?;

    info!(employee_id = %employee_id, granted = ?granted, "permissions granted");

    Ok(employee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session(role: Role) -> Session {
        Session {
            id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            role,
            token_hash: "hash".into(),
            expires_at: Utc::now() + Duration::hours(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_passes_every_role_gate() {
        let s = session(Role::Admin);
        assert!(require_role(&s, Role::User).is_ok());
        assert!(require_role(&s, Role::Employee).is_ok());
        assert!(require_staff(&s).is_ok());
        assert!(require_admin(&s).is_ok());
    }

    #[test]
    fn user_fails_staff_and_admin_gates() {
        let s = session(Role::User);
        assert!(require_role(&s, Role::User).is_ok());
        assert!(matches!(
            require_staff(&s),
            Err(PortalError::NotAuthorized { .. })
        ));
        assert!(matches!(
            require_admin(&s),
            Err(PortalError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn employee_is_not_admin() {
        let s = session(Role::Employee);
        assert!(require_staff(&s).is_ok());
        assert!(matches!(
            require_admin(&s),
            Err(PortalError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn permission_gate_checks_granted_set() {
        let s = session(Role::Employee);
        let granted = vec![Permission::ViewAppointments];
        assert!(require_permission(&s, &granted, Permission::ViewAppointments).is_ok());
        assert!(matches!(
            require_permission(&s, &granted, Permission::EditReports),
            Err(PortalError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn admin_bypasses_permission_gate() {
        let s = session(Role::Admin);
        assert!(require_permission(&s, &[], Permission::ManageServices).is_ok());
    }
}
