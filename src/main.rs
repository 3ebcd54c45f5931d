use iskolar_api::database::manager::DatabaseManager;
use iskolar_api::database::schema;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = iskolar_api::config::config();
    tracing::info!("Starting Iskolar API in {:?} mode", config.environment);

    // Bootstrap the schema when the database is reachable. A failure is
    // logged, not fatal: /health reports degraded until Postgres comes up.
    match DatabaseManager::pool() {
        Ok(pool) => {
            if let Err(e) = schema::ensure_schema(&pool).await {
                tracing::warn!("Schema bootstrap failed: {}", e);
            } else if let Err(e) = schema::seed_admin(&pool).await {
                tracing::warn!("Admin seeding failed: {}", e);
            }
        }
        Err(e) => tracing::warn!("Database not configured: {}", e),
    }

    let app = iskolar_api::app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ISKOLAR_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Iskolar API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
