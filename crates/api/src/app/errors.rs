use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use erpguard_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::AuthenticationFailure => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials")
        }
        ServiceError::AccountLocked { until } => (
            StatusCode::LOCKED,
            axum::Json(json!({
                "error": "account_locked",
                "message": "account is temporarily locked",
                "locked_until": until,
            })),
        )
            .into_response(),
        ServiceError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        ServiceError::PermissionDenied => {
            json_error(StatusCode::FORBIDDEN, "permission_denied", "permission denied")
        }
        ServiceError::TenantViolation(reason) => {
            tracing::debug!(%reason, "tenant isolation denied request");
            json_error(StatusCode::FORBIDDEN, "access_denied", "access denied")
        }
        ServiceError::Validation(problems) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": problems.join("; "),
                "details": problems,
            })),
        )
            .into_response(),
        ServiceError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
