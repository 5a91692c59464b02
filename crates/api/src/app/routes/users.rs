use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;

use erpguard_auth::{Principal, SourceContext};
use erpguard_core::{CompanyId, RoleId, UserId};
use erpguard_infra::services::UserInput;

use crate::app::errors::service_error_to_response;
use crate::app::routes::common::{parse_id, respond, respond_empty, respond_items};
use crate::app::services::{AppServices, blocking};

#[derive(Debug, Deserialize)]
pub struct AssignCompanyRequest {
    pub company_id: CompanyId,
}

#[derive(Debug, Deserialize)]
pub struct RoleAssignmentRequest {
    pub role_id: RoleId,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/roles", get(list_user_roles))
        .route("/:id/assign_company", post(assign_company))
        .route("/:id/assign_role", post(assign_role))
        .route("/:id/remove_role", delete(remove_role))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    respond_items(services.engine.list_users(&principal))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.engine.get_user(&principal, id))
}

pub async fn list_user_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond_items(services.engine.roles_of(&principal, id))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Json(body): Json<UserInput>,
) -> Response {
    let engine = services.engine.clone();
    let result = blocking(move || engine.create_user(&principal, body, &source)).await;
    respond(StatusCode::CREATED, result)
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<UserInput>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let engine = services.engine.clone();
    let result = blocking(move || engine.update_user(&principal, id, body, &source)).await;
    respond(StatusCode::OK, result)
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond_empty(services.engine.delete_user(&principal, id, &source))
}

/// POST /users/:id/assign_company (superusers only)
pub async fn assign_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<AssignCompanyRequest>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.engine.assign_company(&principal, id, body.company_id, &source) {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Company assigned successfully", "user": user })),
        )
            .into_response(),
        Err(e) => service_error_to_response(e),
    }
}

/// POST /users/:id/assign_role
pub async fn assign_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<RoleAssignmentRequest>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    assignment_response(services.engine.assign_role(&principal, id, body.role_id, &source))
}

/// DELETE /users/:id/remove_role
pub async fn remove_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<RoleAssignmentRequest>,
) -> Response {
    let id: UserId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    assignment_response(services.engine.remove_role(&principal, id, body.role_id, &source))
}

fn assignment_response(
    result: erpguard_infra::ServiceResult<erpguard_infra::services::AssignmentOutcome>,
) -> Response {
    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": outcome.message(), "outcome": outcome })),
        )
            .into_response(),
        Err(e) => service_error_to_response(e),
    }
}
