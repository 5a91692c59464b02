use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Response,
};

use erpguard_auth::Principal;
use erpguard_infra::services::AuditQuery;

use crate::app::routes::common::respond_items;
use crate::app::services::AppServices;

/// GET /audit-logs?action=&user=&start_date=&end_date=
pub async fn list_audit_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AuditQuery>,
) -> Response {
    respond_items(services.engine.list_audit_logs(&principal, &query))
}
