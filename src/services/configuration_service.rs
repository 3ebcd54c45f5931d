use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::models::ConfigurationDocument;
use crate::error::ApiError;
use crate::taxonomy::{catalog, catalog::ConfigDocument, lists, Lists, TaxonomyError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored configuration is corrupt: {0}")]
    Corrupt(String),
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::Taxonomy(e) => match &e {
                TaxonomyError::EmptyValue => ApiError::bad_request(e.to_string()),
                TaxonomyError::Duplicate(_) => ApiError::conflict(e.to_string()),
                TaxonomyError::NotFound(_)
                | TaxonomyError::UnknownResource(_)
                | TaxonomyError::UnknownDocument(_) => ApiError::not_found(e.to_string()),
            },
            ConfigurationError::Database(e) => ApiError::from(e),
            ConfigurationError::Corrupt(msg) => {
                tracing::error!("Corrupt configuration row: {}", msg);
                ApiError::internal_server_error("Stored configuration could not be read")
            }
        }
    }
}

/// CRUD over the singleton configuration documents. Mutations run inside a
/// `SELECT ... FOR UPDATE` transaction so concurrent edits serialize instead
/// of losing updates.
pub struct ConfigurationService {
    pool: PgPool,
}

impl ConfigurationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full document, created with defaults on first touch.
    pub async fn get_document(
        &self,
        domain_key: &str,
    ) -> Result<ConfigurationDocument, ConfigurationError> {
        let doc = lookup_document(domain_key)?;
        self.ensure_row(doc).await?;

        let row: (serde_json::Value, DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            "SELECT lists, created_at, updated_at FROM configurations WHERE name = $1",
        )
        .bind(doc.key)
        .fetch_one(&self.pool)
        .await?;

        Ok(assemble(doc, decode_lists(row.0)?, row.1, row.2))
    }

    pub async fn add_item(
        &self,
        domain_key: &str,
        slug: &str,
        item: &str,
    ) -> Result<ConfigurationDocument, ConfigurationError> {
        self.mutate(domain_key, slug, |values, field| {
            lists::add_item(values, field, item)
        })
        .await
    }

    pub async fn rename_item(
        &self,
        domain_key: &str,
        slug: &str,
        old_item: &str,
        new_item: &str,
    ) -> Result<ConfigurationDocument, ConfigurationError> {
        self.mutate(domain_key, slug, |values, field| {
            lists::rename_item(values, field, old_item, new_item)
        })
        .await
    }

    pub async fn remove_item(
        &self,
        domain_key: &str,
        slug: &str,
        item: &str,
    ) -> Result<ConfigurationDocument, ConfigurationError> {
        self.mutate(domain_key, slug, |values, field| {
            lists::remove_item(values, field, item)
        })
        .await
    }

    /// Shared read-modify-write path. Validation failures roll the
    /// transaction back, leaving the stored document untouched.
    async fn mutate<F>(
        &self,
        domain_key: &str,
        slug: &str,
        op: F,
    ) -> Result<ConfigurationDocument, ConfigurationError>
    where
        F: FnOnce(&mut Lists, &str) -> Result<(), TaxonomyError>,
    {
        let doc = lookup_document(domain_key)?;
        let resource = doc
            .resource(slug)
            .ok_or_else(|| TaxonomyError::UnknownResource(slug.to_string()))?;

        self.ensure_row(doc).await?;

        let mut tx = self.pool.begin().await?;

        let row: (serde_json::Value, DateTime<Utc>) =
            sqlx::query_as("SELECT lists, created_at FROM configurations WHERE name = $1 FOR UPDATE")
                .bind(doc.key)
                .fetch_one(&mut *tx)
                .await?;

        let mut values = decode_lists(row.0)?;
        op(&mut values, resource.field)?;

        let updated: (DateTime<Utc>,) = sqlx::query_as(
            "UPDATE configurations SET lists = $2, updated_at = now() WHERE name = $1 RETURNING updated_at",
        )
        .bind(doc.key)
        .bind(encode_lists(&values)?)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(assemble(doc, values, row.1, updated.0))
    }

    /// Seed the document row with defaults if it does not exist yet.
    /// `ON CONFLICT DO NOTHING` keeps concurrent first readers race-safe.
    async fn ensure_row(&self, doc: &ConfigDocument) -> Result<(), ConfigurationError> {
        sqlx::query("INSERT INTO configurations (name, lists) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(doc.key)
            .bind(encode_lists(&doc.default_lists())?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn lookup_document(domain_key: &str) -> Result<&'static ConfigDocument, TaxonomyError> {
    catalog::document(domain_key)
        .ok_or_else(|| TaxonomyError::UnknownDocument(domain_key.to_string()))
}

fn decode_lists(value: serde_json::Value) -> Result<Lists, ConfigurationError> {
    serde_json::from_value(value).map_err(|e| ConfigurationError::Corrupt(e.to_string()))
}

fn encode_lists(values: &Lists) -> Result<serde_json::Value, ConfigurationError> {
    serde_json::to_value(values).map_err(|e| ConfigurationError::Corrupt(e.to_string()))
}

/// Rows written before a catalog grew a new list lack that field; fill the
/// gap from defaults so responses always carry every list.
fn assemble(
    doc: &ConfigDocument,
    mut values: Lists,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> ConfigurationDocument {
    for resource in doc.resources {
        values.entry(resource.field.to_string()).or_insert_with(|| {
            resource.defaults.iter().map(|s| s.to_string()).collect()
        });
    }
    ConfigurationDocument {
        name: doc.key.to_string(),
        lists: values,
        created_at,
        updated_at,
    }
}
