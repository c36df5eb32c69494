//! Request authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use pathlab_core::error::PortalError;
use pathlab_core::models::permission::{Permission, Role};
use pathlab_core::models::session::Session;
use pathlab_core::repository::{EmployeeRepository, UserRepository};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller: a resolved session plus, for staff, the
/// permission set loaded fresh from storage at request time.
pub struct Caller {
    pub session: Session,
    pub permissions: Vec<Permission>,
}

/// A session whose actor row no longer exists is a dead credential,
/// not a missing resource. Anything else is a real storage failure
/// and must surface as one.
fn actor_gone(err: PortalError) -> PortalError {
    match err {
        PortalError::NotFound { .. } => PortalError::NotAuthenticated,
        other => other,
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError(PortalError::NotAuthenticated))?;

        let session = state.auth().resolve(token).await?;

        // The actor row is re-checked on every request: a deactivated
        // account must not coast on a still-live session. Grants are
        // never snapshotted into the session either; revocation takes
        // effect on the next request.
        let permissions = match session.role {
            Role::Employee => {
                let employee = state
                    .employees()
                    .get_by_id(session.actor_id)
                    .await
                    .map_err(actor_gone)?;
                if !employee.active {
                    return Err(ApiError(PortalError::NotAuthenticated));
                }
                employee.permissions
            }
            Role::User | Role::Admin => {
                let user = state
                    .users()
                    .get_by_id(session.actor_id)
                    .await
                    .map_err(actor_gone)?;
                if !user.active {
                    return Err(ApiError(PortalError::NotAuthenticated));
                }
                Vec::new()
            }
        };

        Ok(Caller {
            session,
            permissions,
        })
    }
}
