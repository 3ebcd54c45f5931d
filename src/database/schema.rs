use sqlx::PgPool;
use tracing::info;

use crate::auth;
use crate::database::manager::DatabaseError;

/// Table DDL executed at startup. Statements are idempotent so every boot
/// can run the full list against an existing database.
const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            password_digest TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            school_name TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "configurations",
        r#"
        CREATE TABLE IF NOT EXISTS configurations (
            name TEXT PRIMARY KEY,
            lists JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "verifications",
        r#"
        CREATE TABLE IF NOT EXISTS verifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id),
            persona TEXT NOT NULL,
            profile JSONB NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            denial_reason TEXT,
            verified_by UUID,
            submitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            reviewed_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "scholarships",
        r#"
        CREATE TABLE IF NOT EXISTS scholarships (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            sponsor_id UUID NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            scholarship_type TEXT,
            coverage TEXT[] NOT NULL DEFAULT '{}',
            slots INTEGER NOT NULL DEFAULT 1,
            amount NUMERIC(14,2),
            status TEXT NOT NULL DEFAULT 'draft',
            application_deadline TIMESTAMPTZ,
            banner_path TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "documents",
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES users(id),
            verification_id UUID REFERENCES verifications(id),
            original_name TEXT NOT NULL,
            content_type TEXT NOT NULL,
            size_bytes BIGINT NOT NULL,
            stored_path TEXT NOT NULL,
            uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "audit_events",
        r#"
        CREATE TABLE IF NOT EXISTS audit_events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            actor_id UUID NOT NULL,
            action TEXT NOT NULL,
            entity TEXT NOT NULL,
            entity_id TEXT,
            detail JSONB NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_verifications_status ON verifications (status)",
    "CREATE INDEX IF NOT EXISTS idx_verifications_user ON verifications (user_id, submitted_at DESC)",
    // One live submission per user; denied records do not block resubmission
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_verifications_one_active ON verifications (user_id) \
     WHERE status IN ('pending', 'pre_approved', 'verified')",
    "CREATE INDEX IF NOT EXISTS idx_scholarships_status ON scholarships (status)",
    "CREATE INDEX IF NOT EXISTS idx_scholarships_sponsor ON scholarships (sponsor_id)",
    "CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_events_created ON audit_events (created_at DESC)",
];

/// Create missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for (table, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::SchemaError(format!("creating {}: {}", table, e)))?;
    }
    for ddl in INDEXES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::SchemaError(e.to_string()))?;
    }
    info!("Database schema ready ({} tables)", TABLES.len());
    Ok(())
}

/// Seed the bootstrap admin account from ADMIN_EMAIL / ADMIN_PASSWORD.
/// Skipped silently when the variables are absent; existing accounts are
/// never overwritten.
pub async fn seed_admin(pool: &PgPool) -> Result<(), DatabaseError> {
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_default();
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_default();
    if email.trim().is_empty() || password.is_empty() {
        info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(());
    }

    let salt = auth::generate_salt();
    let digest = auth::digest_password(&password, &salt);

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, display_name, role, status, password_digest, password_salt)
        VALUES ($1, $2, 'admin', 'active', $3, $4)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(email.trim())
    .bind("Platform Admin")
    .bind(&digest)
    .bind(&salt)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!("Seeded admin account: {}", email.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_ddl_is_idempotent() {
        for (table, ddl) in TABLES {
            assert!(ddl.contains("IF NOT EXISTS"), "{} DDL not idempotent", table);
            assert!(ddl.contains(table), "{} DDL names the wrong table", table);
        }
        for ddl in INDEXES {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn platform_tables_are_all_declared() {
        let names: Vec<&str> = TABLES.iter().map(|(name, _)| *name).collect();
        for expected in [
            "users",
            "configurations",
            "verifications",
            "scholarships",
            "documents",
            "audit_events",
        ] {
            assert!(names.contains(&expected), "missing table {}", expected);
        }
    }
}
