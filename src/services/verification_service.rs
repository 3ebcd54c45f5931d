use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::api::Page;
use crate::database::models::{
    Persona, PersonaCounts, PersonaProfile, StatusCounts, UserRole, Verification,
    VerificationStatus,
};
use crate::error::ApiError;

/// Decision vocabulary available to admins.
pub const ADMIN_TARGETS: &[VerificationStatus] =
    &[VerificationStatus::Verified, VerificationStatus::Denied];

/// Decision vocabulary available to school reviewers.
pub const SCHOOL_TARGETS: &[VerificationStatus] =
    &[VerificationStatus::PreApproved, VerificationStatus::Denied];

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Verification not found: {0}")]
    NotFound(Uuid),

    #[error("Verification already decided: {}", .0.as_str())]
    AlreadyDecided(VerificationStatus),

    #[error("Status '{0}' is not available to this reviewer")]
    InvalidTarget(String),

    #[error("A denial reason is required")]
    MissingDenialReason,

    #[error("An active verification already exists (status: {})", .0.as_str())]
    ActiveSubmission(VerificationStatus),

    #[error("Submitted persona does not match the account role")]
    PersonaMismatch,

    #[error("Missing required fields")]
    BlankFields(Vec<&'static str>),

    #[error("No verification ids supplied")]
    EmptyBulk,
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Database(e) => ApiError::from(e),
            VerificationError::NotFound(id) => {
                ApiError::not_found(format!("Verification not found: {}", id))
            }
            VerificationError::AlreadyDecided(_) => ApiError::conflict(err.to_string()),
            VerificationError::InvalidTarget(_) => ApiError::bad_request(err.to_string()),
            VerificationError::MissingDenialReason => {
                let mut fields = HashMap::new();
                fields.insert(
                    "denialReason".to_string(),
                    "A denial reason is required".to_string(),
                );
                ApiError::validation_error("A denial reason is required", Some(fields))
            }
            VerificationError::ActiveSubmission(_) => ApiError::conflict(err.to_string()),
            VerificationError::PersonaMismatch => ApiError::forbidden(err.to_string()),
            VerificationError::BlankFields(names) => {
                let fields = names
                    .iter()
                    .map(|n| (n.to_string(), "This field is required".to_string()))
                    .collect();
                ApiError::validation_error("Missing required fields", Some(fields))
            }
            VerificationError::EmptyBulk => ApiError::bad_request(err.to_string()),
        }
    }
}

/// Optional filters for the review queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationFilter {
    pub status: Option<VerificationStatus>,
    pub persona: Option<Persona>,
}

/// One page of the review queue. Stats respect the persona filter but not
/// the status filter or paging, so tab badges stay stable while browsing.
#[derive(Debug, Serialize)]
pub struct VerificationPage {
    pub records: Vec<Verification>,
    pub stats: StatusCounts,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct GlobalStats {
    pub statuses: StatusCounts,
    pub personas: PersonaCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub id: Uuid,
    pub reason: String,
}

/// Result of a bulk decision: every still-pending target was updated,
/// everything else is reported back instead of failing the batch.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub updated: Vec<Verification>,
    pub skipped: Vec<SkippedRecord>,
}

pub struct VerificationService {
    pool: PgPool,
}

impl VerificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit a persona payload for review. One live submission per user:
    /// a pending/pre-approved/verified record blocks resubmission, a denied
    /// one does not.
    pub async fn submit(
        &self,
        user_id: Uuid,
        role: UserRole,
        profile: &PersonaProfile,
    ) -> Result<Verification, VerificationError> {
        let persona = profile.persona();
        if !persona_allowed(role, persona) {
            return Err(VerificationError::PersonaMismatch);
        }

        let blanks = profile.blank_fields();
        if !blanks.is_empty() {
            return Err(VerificationError::BlankFields(blanks));
        }

        if let Some(active) = self.active_status(user_id).await? {
            return Err(VerificationError::ActiveSubmission(active));
        }

        let profile_json =
            serde_json::to_value(profile).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let inserted = sqlx::query_as::<_, Verification>(
            r#"
            INSERT INTO verifications (id, user_id, persona, profile, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(persona)
        .bind(profile_json)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(record) => Ok(record),
            // Unique partial index on active submissions: a concurrent
            // submit lost the race, report it as the usual conflict.
            Err(e) if is_unique_violation(&e) => {
                Err(VerificationError::ActiveSubmission(VerificationStatus::Pending))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn active_status(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VerificationStatus>, sqlx::Error> {
        let row: Option<(VerificationStatus,)> = sqlx::query_as(
            r#"
            SELECT status FROM verifications
            WHERE user_id = $1 AND status IN ('pending', 'pre_approved', 'verified')
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// The caller's most recent submission, decided or not.
    pub async fn latest_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Verification>, VerificationError> {
        let record = sqlx::query_as::<_, Verification>(
            "SELECT * FROM verifications WHERE user_id = $1 ORDER BY submitted_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<Verification, VerificationError> {
        sqlx::query_as::<_, Verification>("SELECT * FROM verifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(VerificationError::NotFound(id))
    }

    /// Filtered page plus aggregate stats; the three queries run
    /// concurrently.
    pub async fn list(
        &self,
        filter: VerificationFilter,
        page: Page,
    ) -> Result<VerificationPage, VerificationError> {
        let status = filter.status.map(|s| s.as_str());
        let persona = filter.persona.map(|p| p.as_str());

        let records = sqlx::query_as::<_, Verification>(
            r#"
            SELECT * FROM verifications
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR persona = $2)
            ORDER BY submitted_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(persona)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM verifications
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR persona = $2)
            "#,
        )
        .bind(status)
        .bind(persona)
        .fetch_one(&self.pool);

        let stats = self.status_counts(persona);

        let (records, total, stats) = tokio::try_join!(records, total, stats)?;

        Ok(VerificationPage {
            records,
            stats,
            total: total.0,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn status_counts(&self, persona: Option<&str>) -> Result<StatusCounts, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM verifications
            WHERE ($1::text IS NULL OR persona = $1)
            GROUP BY status
            "#,
        )
        .bind(persona)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match VerificationStatus::parse(&status) {
                Some(parsed) => counts.record(parsed, count),
                None => tracing::warn!("Unknown verification status in storage: {}", status),
            }
        }
        Ok(counts)
    }

    /// Global counts per status and per persona.
    pub async fn global_stats(&self) -> Result<GlobalStats, VerificationError> {
        let statuses = self.status_counts(None);

        let personas = async {
            let rows: Vec<(String, i64)> =
                sqlx::query_as("SELECT persona, COUNT(*) FROM verifications GROUP BY persona")
                    .fetch_all(&self.pool)
                    .await?;

            let mut counts = PersonaCounts::default();
            for (persona, count) in rows {
                // Stored values use snake_case
                let parsed = match persona.as_str() {
                    "student" => Some(Persona::Student),
                    "individual_sponsor" => Some(Persona::IndividualSponsor),
                    "corporate_sponsor" => Some(Persona::CorporateSponsor),
                    "school" => Some(Persona::School),
                    _ => None,
                };
                match parsed {
                    Some(p) => counts.record(p, count),
                    None => tracing::warn!("Unknown persona in storage: {}", persona),
                }
            }
            Ok::<_, sqlx::Error>(counts)
        };

        let (statuses, personas) = tokio::try_join!(statuses, personas)?;
        Ok(GlobalStats { statuses, personas })
    }

    /// Apply one reviewer decision. The UPDATE is guarded on
    /// `status = 'pending'`, so concurrent reviewers cannot both win and
    /// decided records cannot be re-decided.
    pub async fn decide(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        status: VerificationStatus,
        denial_reason: Option<&str>,
        allowed: &[VerificationStatus],
    ) -> Result<Verification, VerificationError> {
        let reason = validate_decision(status, denial_reason, allowed)?;

        let updated = sqlx::query_as::<_, Verification>(
            r#"
            UPDATE verifications
            SET status = $2, denial_reason = $3, verified_by = $4, reviewed_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reason.as_deref())
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(record) => Ok(record),
            None => {
                // Distinguish "missing" from "already decided"
                let current = self.get(id).await?;
                Err(VerificationError::AlreadyDecided(current.status))
            }
        }
    }

    /// One decision applied to every still-pending id. Missing and
    /// already-decided ids are reported, not fatal; untargeted records are
    /// untouched by construction of the guarded UPDATE.
    pub async fn bulk_decide(
        &self,
        ids: &[Uuid],
        reviewer_id: Uuid,
        status: VerificationStatus,
        denial_reason: Option<&str>,
        allowed: &[VerificationStatus],
    ) -> Result<BulkOutcome, VerificationError> {
        if ids.is_empty() {
            return Err(VerificationError::EmptyBulk);
        }
        let reason = validate_decision(status, denial_reason, allowed)?;

        let updated = sqlx::query_as::<_, Verification>(
            r#"
            UPDATE verifications
            SET status = $2, denial_reason = $3, verified_by = $4, reviewed_at = now()
            WHERE id = ANY($1) AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(ids)
        .bind(status)
        .bind(reason.as_deref())
        .bind(reviewer_id)
        .fetch_all(&self.pool)
        .await?;

        let updated_ids: Vec<Uuid> = updated.iter().map(|v| v.id).collect();
        let leftovers: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !updated_ids.contains(id))
            .collect();

        let mut skipped = Vec::new();
        if !leftovers.is_empty() {
            let existing: Vec<(Uuid, VerificationStatus)> = sqlx::query_as(
                "SELECT id, status FROM verifications WHERE id = ANY($1)",
            )
            .bind(&leftovers)
            .fetch_all(&self.pool)
            .await?;

            for id in leftovers {
                let reason = match existing.iter().find(|(found, _)| *found == id) {
                    Some((_, status)) => format!("already {}", status.as_str()),
                    None => "not found".to_string(),
                };
                skipped.push(SkippedRecord { id, reason });
            }
        }

        Ok(BulkOutcome { updated, skipped })
    }
}

/// Check the target against the reviewer's vocabulary and normalize the
/// denial reason: denials require one, other decisions discard it.
pub fn validate_decision(
    status: VerificationStatus,
    denial_reason: Option<&str>,
    allowed: &[VerificationStatus],
) -> Result<Option<String>, VerificationError> {
    if !allowed.contains(&status) {
        return Err(VerificationError::InvalidTarget(status.as_str().to_string()));
    }

    if status == VerificationStatus::Denied {
        let reason = denial_reason.map(str::trim).unwrap_or_default();
        if reason.is_empty() {
            return Err(VerificationError::MissingDenialReason);
        }
        Ok(Some(reason.to_string()))
    } else {
        Ok(None)
    }
}

fn persona_allowed(role: UserRole, persona: Persona) -> bool {
    matches!(
        (role, persona),
        (UserRole::Student, Persona::Student)
            | (UserRole::Sponsor, Persona::IndividualSponsor)
            | (UserRole::Sponsor, Persona::CorporateSponsor)
            | (UserRole::School, Persona::School)
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "23505"
    )
}
