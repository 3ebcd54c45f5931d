use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Page size applied when a list request omits `limit`.
    pub default_page_size: i64,
    /// Hard ceiling for `limit`; larger requests are clamped, not rejected.
    pub max_page_size: i64,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret. Empty means "not configured": token issuance
    /// and verification both refuse to run.
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
    /// How long after issuance a token may still be exchanged via refresh.
    pub refresh_window_hours: u64,
    pub enable_audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files (KYC documents, banners).
    pub root_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_MAX_UPLOAD_BYTES") {
            self.api.max_upload_bytes = v.parse().unwrap_or(self.api.max_upload_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY_HOURS") {
            self.security.token_expiry_hours =
                v.parse().unwrap_or(self.security.token_expiry_hours);
        }
        if let Ok(v) = env::var("AUTH_REFRESH_WINDOW_HOURS") {
            self.security.refresh_window_hours =
                v.parse().unwrap_or(self.security.refresh_window_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging =
                v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root_dir = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            api: ApiConfig {
                default_page_size: 25,
                max_page_size: 200,
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "iskolar-dev-secret".to_string(),
                token_expiry_hours: 24 * 7, // 1 week
                refresh_window_hours: 24 * 14,
                enable_audit_logging: false,
            },
            storage: StorageConfig {
                root_dir: "./storage".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            api: ApiConfig {
                default_page_size: 25,
                max_page_size: 100,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                token_expiry_hours: 24,
                refresh_window_hours: 24 * 7,
                enable_audit_logging: true,
            },
            storage: StorageConfig {
                root_dir: "/var/lib/iskolar/storage".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            api: ApiConfig {
                default_page_size: 25,
                max_page_size: 100,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from JWT_SECRET
                token_expiry_hours: 4,
                refresh_window_hours: 24 * 2,
                enable_audit_logging: true,
            },
            storage: StorageConfig {
                root_dir: "/var/lib/iskolar/storage".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_usable_without_env() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.api.default_page_size, 25);
        assert!(!config.security.enable_audit_logging);
    }

    #[test]
    fn production_requires_external_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.enable_audit_logging);
        assert!(config.api.max_page_size <= 100);
    }

    #[test]
    fn page_size_ceiling_not_below_default() {
        for config in [
            AppConfig::development(),
            AppConfig::staging(),
            AppConfig::production(),
        ] {
            assert!(config.api.max_page_size >= config.api.default_page_size);
        }
    }
}
