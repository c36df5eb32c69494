//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pathlab_core::error::PortalError;
use serde_json::json;
use tracing::error;

/// Wrapper turning a [`PortalError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PortalError);

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PortalError::NotAuthenticated | PortalError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            PortalError::NotAuthorized { .. } | PortalError::PermissionDenied { .. } => {
                StatusCode::FORBIDDEN
            }
            PortalError::InvalidPermission { .. }
            | PortalError::InvalidSlotRequest { .. }
            | PortalError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::SlotAlreadyBooked | PortalError::ReferentialConflict { .. } => {
                StatusCode::CONFLICT
            }
            PortalError::AuditWriteFailed { .. }
            | PortalError::StorageUnavailable
            | PortalError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal detail stays in the logs, not in the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "internal error");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        let cases = [
            (PortalError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (PortalError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                PortalError::NotAuthorized {
                    reason: "nope".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                PortalError::PermissionDenied {
                    permission: "edit_reports".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                PortalError::InvalidPermission {
                    name: "bogus".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PortalError::InvalidSlotRequest {
                    reason: "past".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (PortalError::SlotAlreadyBooked, StatusCode::CONFLICT),
            (
                PortalError::ReferentialConflict {
                    entity: "service".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                PortalError::NotFound {
                    entity: "service".into(),
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (PortalError::StorageUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
