use axum::extract::Query;
use serde::Deserialize;

use crate::api::Page;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::audit_service::{AuditPage, AuditService};

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/admin/audit-events - Newest first.
pub async fn list(Query(query): Query<AuditQuery>) -> ApiResult<AuditPage> {
    let page = Page::from_query(query.limit, query.offset, &config().api);
    let service = AuditService::new(DatabaseManager::pool()?);
    Ok(ApiResponse::success(service.list(page).await?))
}
