use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::auth;
use crate::database::models::{User, UserRole, UserStatus, UserView};
use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account is suspended")]
    Suspended,

    #[error("A valid email address is required")]
    InvalidEmail,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("Display name is required")]
    MissingDisplayName,

    #[error("Role '{0}' cannot self-register")]
    RoleNotRegisterable(String),

    #[error("Admins cannot change their own {0}")]
    SelfChange(&'static str),

    #[error("Nothing to update")]
    NothingToUpdate,
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Database(e) => ApiError::from(e),
            UserError::NotFound(id) => ApiError::not_found(format!("User not found: {}", id)),
            UserError::EmailTaken => ApiError::conflict(err.to_string()),
            UserError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            UserError::Suspended => ApiError::forbidden(err.to_string()),
            UserError::InvalidEmail
            | UserError::WeakPassword
            | UserError::MissingDisplayName
            | UserError::RoleNotRegisterable(_)
            | UserError::SelfChange(_)
            | UserError::NothingToUpdate => ApiError::bad_request(err.to_string()),
        }
    }
}

/// Validated self-registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: UserRole,
    pub school_name: Option<String>,
}

impl Registration {
    /// Normalize and validate raw request fields. Admin accounts are
    /// seeded or promoted, never self-registered.
    pub fn validate(
        email: &str,
        password: &str,
        display_name: &str,
        role: UserRole,
        school_name: Option<&str>,
    ) -> Result<Self, UserError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(UserError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::WeakPassword);
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(UserError::MissingDisplayName);
        }
        if role == UserRole::Admin {
            return Err(UserError::RoleNotRegisterable(role.as_str().to_string()));
        }

        Ok(Self {
            email,
            password: password.to_string(),
            display_name: display_name.to_string(),
            role,
            school_name: school_name
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserView>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, UserError> {
        let salt = auth::generate_salt();
        let digest = auth::digest_password(&registration.password, &salt);

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, display_name, role, status, password_digest, password_salt, school_name)
            VALUES ($1, $2, $3, $4, 'active', $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&registration.email)
        .bind(&registration.display_name)
        .bind(registration.role)
        .bind(&digest)
        .bind(&salt)
        .bind(registration.school_name.as_deref())
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(UserError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Credential check for login. Unknown email and wrong password give
    /// the same error; suspension is reported only after the password
    /// matched.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = email.trim().to_lowercase();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !auth::verify_password(password, &user.password_salt, &user.password_digest) {
            return Err(UserError::InvalidCredentials);
        }
        if user.status == UserStatus::Suspended {
            return Err(UserError::Suspended);
        }
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, UserError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Used by token refresh: the account must still exist and be active.
    pub async fn get_active(&self, id: Uuid) -> Result<User, UserError> {
        let user = self.get(id).await?;
        if user.status == UserStatus::Suspended {
            return Err(UserError::Suspended);
        }
        Ok(user)
    }

    pub async fn list(
        &self,
        role: Option<UserRole>,
        status: Option<UserStatus>,
        page: Page,
    ) -> Result<UserPage, UserError> {
        let role = role.map(|r| r.as_str());
        let status = status.map(|s| s.as_str());

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(role)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(role)
        .bind(status)
        .fetch_one(&self.pool);

        let (users, total) = tokio::try_join!(users, total)?;

        Ok(UserPage {
            users: users.iter().map(UserView::from).collect(),
            total: total.0,
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Admin role/status change. Self-demotion and self-suspension are
    /// rejected so the last admin cannot lock the platform out.
    pub async fn admin_update(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<User, UserError> {
        if role.is_none() && status.is_none() {
            return Err(UserError::NothingToUpdate);
        }
        if actor_id == target_id {
            if matches!(role, Some(r) if r != UserRole::Admin) {
                return Err(UserError::SelfChange("role"));
            }
            if status == Some(UserStatus::Suspended) {
                return Err(UserError::SelfChange("status"));
            }
        }

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = COALESCE($2::text, role),
                status = COALESCE($3::text, status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(target_id)
        .bind(role.map(|r| r.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(UserError::NotFound(target_id))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "23505"
    )
}
