use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use erpguard_auth::{Principal, SourceContext};
use erpguard_core::CompanyId;
use erpguard_infra::services::CompanyInput;

use crate::app::routes::common::{parse_id, respond, respond_empty, respond_items};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/:id", get(get_company).put(update_company).delete(delete_company))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    respond_items(services.engine.list_companies(&principal))
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: CompanyId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.engine.get_company(&principal, id))
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Json(body): Json<CompanyInput>,
) -> Response {
    respond(
        StatusCode::CREATED,
        services.engine.create_company(&principal, body, &source),
    )
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
    Json(body): Json<CompanyInput>,
) -> Response {
    let id: CompanyId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.engine.update_company(&principal, id, body, &source),
    )
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(source): Extension<SourceContext>,
    Path(id): Path<String>,
) -> Response {
    let id: CompanyId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond_empty(services.engine.delete_company(&principal, id, &source))
}
