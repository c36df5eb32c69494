//! Authentication service — login, logout and session resolution.

use chrono::{Duration, Utc};
use pathlab_core::error::{PortalError, PortalResult};
use pathlab_core::models::audit::{AuditAction, AuditEvent, EntityType};
use pathlab_core::models::permission::Role;
use pathlab_core::models::session::{CreateSession, Session};
use pathlab_core::repository::{EmployeeRepository, SessionRepository, UserRepository};
use serde_json::json;
use tracing::info;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Raw opaque bearer token (return to client, never stored).
    pub token: String,
    pub session: Session,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate. Patients and admins live
/// in the user table; staff live in the employee table — login tries
/// both.
pub struct AuthService<U: UserRepository, E: EmployeeRepository, S: SessionRepository> {
    user_repo: U,
    employee_repo: E,
    session_repo: S,
    config: AuthConfig,
}

impl<U: UserRepository, E: EmployeeRepository, S: SessionRepository> AuthService<U, E, S> {
    pub fn new(user_repo: U, employee_repo: E, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            employee_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Hash a new password, enforcing the minimum length policy.
    pub fn hash_new_password(&self, raw: &str) -> PortalResult<String> {
        if raw.chars().count() < self.config.min_password_length {
            return Err(AuthError::PasswordTooShort.into());
        }
        password::hash_password(raw, self.config.pepper.as_deref()).map_err(Into::into)
    }

    /// Authenticate with email + password and open a session.
    ///
    /// Unknown email, wrong password and deactivated accounts all
    /// surface as `InvalidCredentials`.
    pub async fn login(&self, email: &str, raw_password: &str) -> PortalResult<LoginOutput> {
        // Look up the actor — users first, then staff.
        let (actor_id, role, password_hash, active) =
            match self.user_repo.get_by_email(email).await {
                Ok(user) => (user.id, user.role, user.password_hash, user.active),
                Err(PortalError::NotFound { .. }) => {
                    let employee = self
                        .employee_repo
                        .get_by_email(email)
                        .await
                        .map_err(|_| AuthError::InvalidCredentials)?;
                    (
                        employee.id,
                        Role::Employee,
                        employee.password_hash,
                        employee.active,
                    )
                }
                Err(e) => return Err(e),
            };

        let valid =
            password::verify_password(raw_password, &password_hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !active {
            return Err(AuthError::AccountInactive.into());
        }

        let raw_token = token::generate_session_token();
        let token_hash = token::hash_session_token(&raw_token);
        let expires_at = Utc::now() + Duration::seconds(self.config.session_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(
                CreateSession {
                    actor_id,
                    role,
                    token_hash,
                    expires_at,
                },
                AuditEvent::new(actor_id, AuditAction::Login, EntityType::Session)
                    .details(json!({ "role": role.as_str() })),
            )
            .await?;

        info!(actor_id = %actor_id, role = %role, "login");

        Ok(LoginOutput {
            token: raw_token,
            session,
        })
    }

    /// Close a session (logout).
    pub async fn logout(&self, session: &Session) -> PortalResult<()> {
        self.session_repo
            .invalidate(
                session.id,
                AuditEvent::new(session.actor_id, AuditAction::Logout, EntityType::Session)
                    .entity(session.id),
            )
            .await?;

        info!(actor_id = %session.actor_id, "logout");

        Ok(())
    }

    /// Resolve a raw bearer token to a live session.
    ///
    /// Unknown tokens and expired sessions both surface as
    /// `NotAuthenticated`.
    pub async fn resolve(&self, raw_token: &str) -> PortalResult<Session> {
        let token_hash = token::hash_session_token(raw_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|_| AuthError::SessionInvalid)?;

        if session.expires_at <= Utc::now() {
            return Err(AuthError::SessionExpired.into());
        }

        Ok(session)
    }
}
