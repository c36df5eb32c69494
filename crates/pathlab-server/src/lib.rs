//! HTTP API for the diagnostic lab portal.
//!
//! Thin axum handlers over the booking, auth and repository layers;
//! all authorization decisions live in `pathlab_auth::gate` and the
//! scheduler, not in the handlers.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::{get, patch, post};

pub use config::ServerConfig;
pub use state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Authentication
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        // Service catalogue
        .route(
            "/services",
            get(routes::services::list).post(routes::services::create),
        )
        .route(
            "/services/{id}",
            get(routes::services::get)
                .patch(routes::services::update)
                .delete(routes::services::delete),
        )
        .route("/services/{id}/slots", get(routes::services::slots))
        // Appointments
        .route(
            "/appointments",
            get(routes::appointments::list).post(routes::appointments::create),
        )
        .route("/appointments/{id}", get(routes::appointments::get))
        .route(
            "/appointments/{id}/cancel",
            post(routes::appointments::cancel),
        )
        .route(
            "/appointments/{id}/complete",
            post(routes::appointments::complete),
        )
        // Patient accounts
        .route(
            "/users",
            get(routes::users::list).post(routes::users::register),
        )
        .route(
            "/users/{id}",
            get(routes::users::get)
                .put(routes::users::update)
                .delete(routes::users::delete),
        )
        // Staff administration
        .route(
            "/admin/employees",
            get(routes::employees::list).post(routes::employees::create),
        )
        .route(
            "/admin/employees/{id}",
            patch(routes::employees::update).delete(routes::employees::delete),
        )
        .route(
            "/admin/employees/{id}/permissions",
            get(routes::employees::get_permissions).put(routes::employees::put_permissions),
        )
        // Audit trail
        .route("/admin/audit-logs", get(routes::audit::list))
        // Bulk operations
        .route("/batch", post(routes::batch::apply))
        .with_state(state)
}
