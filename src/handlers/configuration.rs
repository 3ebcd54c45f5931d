use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::database::manager::DatabaseManager;
use crate::database::models::ConfigurationDocument;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::audit_service::AuditService;
use crate::services::configuration_service::ConfigurationService;

#[derive(Debug, Deserialize)]
pub struct ItemBody {
    pub item: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameBody {
    pub old_item: String,
    pub new_item: String,
}

/// GET /:domain/all - Full configuration document, created with defaults on
/// first read.
pub async fn get_document(Path(domain): Path<String>) -> ApiResult<ConfigurationDocument> {
    let service = ConfigurationService::new(DatabaseManager::pool()?);
    let document = service.get_document(&domain).await?;
    Ok(ApiResponse::success(document))
}

/// POST /:domain/:resource - Append a value to one list.
pub async fn add_item(
    Extension(user): Extension<AuthUser>,
    Path((domain, resource)): Path<(String, String)>,
    Json(body): Json<ItemBody>,
) -> ApiResult<ConfigurationDocument> {
    let pool = DatabaseManager::pool()?;
    let service = ConfigurationService::new(pool.clone());
    let document = service.add_item(&domain, &resource, &body.item).await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "configuration.add",
            "configuration",
            Some(domain),
            json!({ "resource": resource, "item": body.item }),
        )
        .await;

    Ok(ApiResponse::success(document))
}

/// PUT /:domain/:resource - Rename a value in place.
pub async fn rename_item(
    Extension(user): Extension<AuthUser>,
    Path((domain, resource)): Path<(String, String)>,
    Json(body): Json<RenameBody>,
) -> ApiResult<ConfigurationDocument> {
    let pool = DatabaseManager::pool()?;
    let service = ConfigurationService::new(pool.clone());
    let document = service
        .rename_item(&domain, &resource, &body.old_item, &body.new_item)
        .await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "configuration.rename",
            "configuration",
            Some(domain),
            json!({ "resource": resource, "oldItem": body.old_item, "newItem": body.new_item }),
        )
        .await;

    Ok(ApiResponse::success(document))
}

/// DELETE /:domain/:resource - Remove one occurrence of a value.
pub async fn remove_item(
    Extension(user): Extension<AuthUser>,
    Path((domain, resource)): Path<(String, String)>,
    Json(body): Json<ItemBody>,
) -> ApiResult<ConfigurationDocument> {
    let pool = DatabaseManager::pool()?;
    let service = ConfigurationService::new(pool.clone());
    let document = service.remove_item(&domain, &resource, &body.item).await?;

    AuditService::new(pool)
        .record(
            user.user_id,
            "configuration.remove",
            "configuration",
            Some(domain),
            json!({ "resource": resource, "item": body.item }),
        )
        .await;

    Ok(ApiResponse::success(document))
}
