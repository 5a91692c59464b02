use axum::{
    Router,
    routing::{get, post},
};

pub mod audit;
pub mod auth;
pub mod common;
pub mod companies;
pub mod notifications;
pub mod roles;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .nest("/companies", companies::router())
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .route("/permissions", get(roles::list_permissions))
        .route("/audit-logs", get(audit::list_audit_logs))
        .route("/notifications/stream", get(notifications::stream))
}
