use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use erpguard_auth::{Principal, SourceContext};

use crate::app::errors::{json_error, service_error_to_response};
use crate::app::routes::common::{respond, respond_empty};
use crate::app::services::{AppServices, blocking};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(source): Extension<SourceContext>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let engine = services.engine.clone();
    let result = blocking(move || engine.login(&body.email, &body.password, &source)).await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return service_error_to_response(e),
    };

    let access = match services.jwt.issue(outcome.account.id, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue access token");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error");
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access": access,
            "user": outcome.account,
            "permissions": outcome.permissions,
        })),
    )
        .into_response()
}

/// POST /auth/logout
///
/// Tokens are stateless; logging out only records the event.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
) -> Response {
    respond_empty(services.engine.logout(&principal, &source))
}

/// GET /auth/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    respond(StatusCode::OK, services.engine.current_user(&principal))
}
