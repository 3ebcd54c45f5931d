use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::config::config;
use crate::database::models::AuditEvent;
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Database(e) => ApiError::from(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditPage {
    pub records: Vec<AuditEvent>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Best-effort trail write. Disabled deployments skip it entirely, and a
    /// failed insert must never fail the request that triggered it.
    pub async fn record(
        &self,
        actor_id: Uuid,
        action: &str,
        entity: &str,
        entity_id: Option<String>,
        detail: serde_json::Value,
    ) {
        if !config().security.enable_audit_logging {
            return;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (id, actor_id, action, entity, entity_id, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor_id)
        .bind(action)
        .bind(entity)
        .bind(entity_id)
        .bind(detail)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!("Audit write failed for action '{}': {}", action, e);
        }
    }

    pub async fn list(&self, page: Page) -> Result<AuditPage, AuditError> {
        let records = sqlx::query_as::<_, AuditEvent>(
            "SELECT * FROM audit_events ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM audit_events")
            .fetch_one(&self.pool);

        let (records, total) = tokio::try_join!(records, total)?;

        Ok(AuditPage {
            records,
            total: total.0,
            limit: page.limit,
            offset: page.offset,
        })
    }
}
