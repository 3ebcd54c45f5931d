use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::Page;
use crate::database::models::{Scholarship, ScholarshipStatus, UserRole};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ScholarshipError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Scholarship not found: {0}")]
    NotFound(Uuid),

    #[error("Only the sponsoring account or an admin may modify this scholarship")]
    NotOwner,

    #[error("Title is required")]
    MissingTitle,

    #[error("Slots must be at least 1")]
    BadSlots,

    #[error("Amount must be a non-negative decimal: {0}")]
    BadAmount(String),

    #[error("Cannot move scholarship from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },
}

impl From<ScholarshipError> for ApiError {
    fn from(err: ScholarshipError) -> Self {
        match err {
            ScholarshipError::Database(e) => ApiError::from(e),
            ScholarshipError::NotFound(id) => {
                ApiError::not_found(format!("Scholarship not found: {}", id))
            }
            ScholarshipError::NotOwner => ApiError::forbidden(err.to_string()),
            ScholarshipError::MissingTitle
            | ScholarshipError::BadSlots
            | ScholarshipError::BadAmount(_) => ApiError::bad_request(err.to_string()),
            ScholarshipError::InvalidTransition { .. } => ApiError::conflict(err.to_string()),
        }
    }
}

/// Raw create/update fields as they arrive on the wire. Money comes in as
/// a decimal string.
#[derive(Debug, Clone, Default)]
pub struct ScholarshipInput {
    pub title: String,
    pub description: String,
    pub scholarship_type: Option<String>,
    pub coverage: Vec<String>,
    pub slots: Option<i32>,
    pub amount: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// Validated form of [`ScholarshipInput`].
#[derive(Debug, Clone)]
pub struct ValidatedScholarship {
    pub title: String,
    pub description: String,
    pub scholarship_type: Option<String>,
    pub coverage: Vec<String>,
    pub slots: i32,
    pub amount: Option<BigDecimal>,
    pub application_deadline: Option<DateTime<Utc>>,
}

impl ScholarshipInput {
    pub fn validate(self) -> Result<ValidatedScholarship, ScholarshipError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ScholarshipError::MissingTitle);
        }

        let slots = self.slots.unwrap_or(1);
        if slots < 1 {
            return Err(ScholarshipError::BadSlots);
        }

        let amount = match self.amount.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = BigDecimal::from_str(raw)
                    .map_err(|_| ScholarshipError::BadAmount(raw.to_string()))?;
                if parsed < BigDecimal::from(0) {
                    return Err(ScholarshipError::BadAmount(raw.to_string()));
                }
                Some(parsed)
            }
        };

        Ok(ValidatedScholarship {
            title,
            description: self.description.trim().to_string(),
            scholarship_type: self
                .scholarship_type
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            coverage: self
                .coverage
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            slots,
            amount,
            application_deadline: self.application_deadline,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseFilter<'a> {
    pub status: Option<ScholarshipStatus>,
    pub sponsor_id: Option<Uuid>,
    pub q: Option<&'a str>,
}

/// The caller's identity for visibility decisions; `None` is anonymous.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct ScholarshipPage {
    pub records: Vec<Scholarship>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct ScholarshipService {
    pool: PgPool,
}

impl ScholarshipService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        sponsor_id: Uuid,
        input: ScholarshipInput,
    ) -> Result<Scholarship, ScholarshipError> {
        let valid = input.validate()?;

        let record = sqlx::query_as::<_, Scholarship>(
            r#"
            INSERT INTO scholarships
                (id, sponsor_id, title, description, scholarship_type, coverage, slots, amount,
                 status, application_deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sponsor_id)
        .bind(&valid.title)
        .bind(&valid.description)
        .bind(valid.scholarship_type.as_deref())
        .bind(&valid.coverage)
        .bind(valid.slots)
        .bind(valid.amount.as_ref())
        .bind(valid.application_deadline)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn update(
        &self,
        viewer: Viewer,
        id: Uuid,
        input: ScholarshipInput,
    ) -> Result<Scholarship, ScholarshipError> {
        let existing = self.fetch(id).await?;
        require_owner(&existing, viewer)?;
        let valid = input.validate()?;

        let record = sqlx::query_as::<_, Scholarship>(
            r#"
            UPDATE scholarships
            SET title = $2, description = $3, scholarship_type = $4, coverage = $5,
                slots = $6, amount = $7, application_deadline = $8, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&valid.title)
        .bind(&valid.description)
        .bind(valid.scholarship_type.as_deref())
        .bind(&valid.coverage)
        .bind(valid.slots)
        .bind(valid.amount.as_ref())
        .bind(valid.application_deadline)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Walk the status machine; jumps outside it are conflicts.
    pub async fn set_status(
        &self,
        viewer: Viewer,
        id: Uuid,
        next: ScholarshipStatus,
    ) -> Result<Scholarship, ScholarshipError> {
        let existing = self.fetch(id).await?;
        require_owner(&existing, viewer)?;

        if !existing.status.can_transition_to(next) {
            return Err(ScholarshipError::InvalidTransition {
                from: existing.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        // Guard on the status we just read so a concurrent transition
        // cannot be silently overwritten.
        let updated = sqlx::query_as::<_, Scholarship>(
            r#"
            UPDATE scholarships SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(existing.status)
        .bind(next)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(ScholarshipError::InvalidTransition {
            from: existing.status.as_str().to_string(),
            to: next.as_str().to_string(),
        })
    }

    pub async fn set_banner(
        &self,
        viewer: Viewer,
        id: Uuid,
        banner_path: &str,
    ) -> Result<Scholarship, ScholarshipError> {
        let existing = self.fetch(id).await?;
        require_owner(&existing, viewer)?;

        let record = sqlx::query_as::<_, Scholarship>(
            "UPDATE scholarships SET banner_path = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(banner_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Browse with visibility rules: everyone sees open scholarships,
    /// sponsors additionally see their own in any status, admins see all.
    pub async fn list(
        &self,
        viewer: Option<Viewer>,
        filter: BrowseFilter<'_>,
        page: Page,
    ) -> Result<ScholarshipPage, ScholarshipError> {
        let status = filter.status.map(|s| s.as_str());
        let is_admin = matches!(viewer, Some(v) if v.role == UserRole::Admin);
        let viewer_id = viewer.map(|v| v.user_id);

        let records = sqlx::query_as::<_, Scholarship>(
            r#"
            SELECT * FROM scholarships
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR sponsor_id = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
              AND (status = 'open' OR $4 OR sponsor_id = $5::uuid)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(status)
        .bind(filter.sponsor_id)
        .bind(filter.q)
        .bind(is_admin)
        .bind(viewer_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM scholarships
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR sponsor_id = $2)
              AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%')
              AND (status = 'open' OR $4 OR sponsor_id = $5::uuid)
            "#,
        )
        .bind(status)
        .bind(filter.sponsor_id)
        .bind(filter.q)
        .bind(is_admin)
        .bind(viewer_id)
        .fetch_one(&self.pool);

        let (records, total) = tokio::try_join!(records, total)?;

        Ok(ScholarshipPage {
            records,
            total: total.0,
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Single scholarship under the same visibility rules; hidden records
    /// read as absent rather than forbidden.
    pub async fn get_visible(
        &self,
        viewer: Option<Viewer>,
        id: Uuid,
    ) -> Result<Scholarship, ScholarshipError> {
        let record = self.fetch(id).await?;
        if is_visible(&record, viewer) {
            Ok(record)
        } else {
            Err(ScholarshipError::NotFound(id))
        }
    }

    pub async fn fetch(&self, id: Uuid) -> Result<Scholarship, ScholarshipError> {
        sqlx::query_as::<_, Scholarship>("SELECT * FROM scholarships WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ScholarshipError::NotFound(id))
    }
}

fn require_owner(scholarship: &Scholarship, viewer: Viewer) -> Result<(), ScholarshipError> {
    if viewer.role == UserRole::Admin || scholarship.sponsor_id == viewer.user_id {
        Ok(())
    } else {
        Err(ScholarshipError::NotOwner)
    }
}

fn is_visible(scholarship: &Scholarship, viewer: Option<Viewer>) -> bool {
    if scholarship.status == ScholarshipStatus::Open {
        return true;
    }
    match viewer {
        Some(v) => v.role == UserRole::Admin || scholarship.sponsor_id == v.user_id,
        None => false,
    }
}
