use core::str::FromStr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use erpguard_infra::ServiceResult;

use crate::app::errors::{json_error, service_error_to_response};

/// Parse a path identifier, answering 400 on malformed input.
pub fn parse_id<T: FromStr>(raw: &str) -> Result<T, Response> {
    raw.parse::<T>()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid id '{raw}'")))
}

/// Map an engine result onto a JSON response with `status`.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => service_error_to_response(e),
    }
}

/// Map a list result onto `{ "items": [...] }`.
pub fn respond_items<T: Serialize>(result: ServiceResult<Vec<T>>) -> Response {
    match result {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => service_error_to_response(e),
    }
}

/// Map a unit result onto `204 No Content`.
pub fn respond_empty(result: ServiceResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => service_error_to_response(e),
    }
}
