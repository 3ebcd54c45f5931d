use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{
    jwt_auth_middleware, require_admin, require_school, require_sponsor_or_admin,
};

/// Build the full application router. Tests drive this directly with
/// `tower::ServiceExt::oneshot`; `main` serves it.
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(browse_routes())
        // Bearer-token tiers
        .merge(account_routes())
        .merge(sponsor_routes())
        .merge(school_routes())
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(crate::config::config().api.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
}

/// Scholarship browsing is public; the handlers honour an optional Bearer
/// token to widen visibility for owners and admins.
fn browse_routes() -> Router {
    use handlers::scholarships;

    Router::new()
        .route("/api/scholarships", get(scholarships::browse))
        .route("/api/scholarships/:id", get(scholarships::get))
}

/// Endpoints open to every authenticated account.
fn account_routes() -> Router {
    use axum::routing::post;
    use handlers::{auth, documents, verifications::portal};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/verifications", post(portal::submit))
        .route("/api/verifications/me", get(portal::me))
        .route("/api/documents", post(documents::upload).get(documents::list))
        .route("/api/documents/:id", get(documents::get))
        .route("/api/documents/:id/content", get(documents::content))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn sponsor_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::scholarships;

    Router::new()
        .route("/api/scholarships", post(scholarships::create))
        .route("/api/scholarships/:id", put(scholarships::update))
        .route("/api/scholarships/:id/status", put(scholarships::set_status))
        .route("/api/scholarships/:id/banner", post(scholarships::upload_banner))
        .layer(middleware::from_fn(require_sponsor_or_admin))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn school_routes() -> Router {
    use axum::routing::put;
    use handlers::verifications::school;

    Router::new()
        .route("/api/school/verifications", get(school::list))
        .route("/api/school/verifications/:id", put(school::decide))
        .layer(middleware::from_fn(require_school))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::verifications::admin;
    use handlers::{audit, configuration, users};

    Router::new()
        // Configuration documents live at the root, one prefix per domain
        .route("/:domain/all", get(configuration::get_document))
        .route(
            "/:domain/:resource",
            post(configuration::add_item)
                .put(configuration::rename_item)
                .delete(configuration::remove_item),
        )
        // Verification review
        .route("/api/admin/verifications", get(admin::list))
        .route("/api/admin/verifications/stats", get(admin::stats))
        .route("/api/admin/verifications/bulk", put(admin::bulk_decide))
        .route(
            "/api/admin/verifications/:id",
            get(admin::get).put(admin::decide),
        )
        // User administration
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/:id", get(users::get).patch(users::update))
        // Audit trail
        .route("/api/admin/audit-events", get(audit::list))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Iskolar API",
            "version": version,
            "description": "Scholarship platform backend: KYC verification, taxonomy configuration, scholarship listings",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login, /auth/refresh (public)",
                "browse": "/api/scholarships[/:id] (public, token optional)",
                "account": "/api/auth/whoami, /api/verifications[/me], /api/documents (token)",
                "sponsor": "/api/scholarships management (sponsor or admin token)",
                "school": "/api/school/verifications (school token)",
                "admin": "/api/admin/*, /:domain/all, /:domain/:resource (admin token)",
            },
            "configurationDomains": crate::taxonomy::catalog::ALL
                .iter()
                .map(|d| d.key)
                .collect::<Vec<_>>(),
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
