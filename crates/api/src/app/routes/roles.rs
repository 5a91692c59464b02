use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use erpguard_auth::{Principal, SourceContext};
use erpguard_core::RoleId;
use erpguard_infra::services::RoleInput;

use crate::app::errors::service_error_to_response;
use crate::app::routes::common::{parse_id, respond, respond_empty, respond_items};
use crate::app::services::AppServices;

#[derive(Debug, Deserialize)]
pub struct AssignPermissionsRequest {
    pub permissions: Vec<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).put(update_role).delete(delete_role))
        .route("/:id/assign_permissions", post(assign_permissions))
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    respond_items(services.engine.list_roles(&principal))
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.engine.get_role(&principal, id))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Json(body): Json<RoleInput>,
) -> Response {
    respond(StatusCode::CREATED, services.engine.create_role(&principal, body, &source))
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<RoleInput>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.engine.update_role(&principal, id, body, &source))
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond_empty(services.engine.delete_role(&principal, id, &source))
}

/// POST /roles/:id/assign_permissions
pub async fn assign_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<AssignPermissionsRequest>,
) -> Response {
    let id: RoleId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .engine
        .assign_permissions(&principal, id, &body.permissions, &source)
    {
        Ok(role) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Permissions assigned successfully", "role": role })),
        )
            .into_response(),
        Err(e) => service_error_to_response(e),
    }
}

/// GET /permissions
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    respond_items(services.engine.list_permissions(&principal))
}
