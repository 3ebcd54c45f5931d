mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

fn register_body(role: &str) -> serde_json::Value {
    json!({
        "email": "maria@example.com",
        "password": "long-enough-password",
        "displayName": "Maria Santos",
        "role": role,
    })
}

#[tokio::test]
async fn register_rejects_unknown_role() -> Result<()> {
    let (status, body) =
        common::call(common::post_json("/auth/register", None, register_body("wizard"))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(
        body["message"].as_str().unwrap_or("").contains("Unknown role"),
        "unexpected message: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn register_rejects_admin_role() -> Result<()> {
    let (status, body) =
        common::call(common::post_json("/auth/register", None, register_body("admin"))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn register_rejects_invalid_email() -> Result<()> {
    let mut payload = register_body("student");
    payload["email"] = json!("not-an-email");
    let (status, body) = common::call(common::post_json("/auth/register", None, payload)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn register_rejects_short_password() -> Result<()> {
    let mut payload = register_body("student");
    payload["password"] = json!("short");
    let (status, body) = common::call(common::post_json("/auth/register", None, payload)).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert!(
        body["message"].as_str().unwrap_or("").contains("at least 8"),
        "unexpected message: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn register_with_missing_fields_is_client_error() -> Result<()> {
    let (status, _) =
        common::call(common::post_json("/auth/register", None, json!({"email": "x@y.ph"}))).await?;

    // Axum's Json extractor answers the serde error itself
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_garbage_token() -> Result<()> {
    let (status, body) = common::call(common::post_json(
        "/auth/refresh",
        None,
        json!({"token": "definitely.not.ajwt"}),
    ))
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_tokens_outside_the_window() -> Result<()> {
    let stale = common::stale_token();
    let (status, body) =
        common::call(common::post_json("/auth/refresh", None, json!({"token": stale}))).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        body["message"].as_str().unwrap_or("").contains("too old"),
        "unexpected message: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn whoami_requires_a_token() -> Result<()> {
    let (status, body) = common::call(common::get("/api/auth/whoami", None)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn whoami_echoes_the_token_claims() -> Result<()> {
    let token = common::student_token();
    let (status, body) = common::call(common::get("/api/auth/whoami", Some(&token))).await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["email"], "student@test.iskolar.ph");
    Ok(())
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() -> Result<()> {
    use chrono::Utc;
    use iskolar_api::auth::{generate_jwt, Claims};
    use iskolar_api::database::models::UserRole;
    use uuid::Uuid;

    let claims = Claims {
        sub: Uuid::new_v4(),
        email: "forged@test.iskolar.ph".to_string(),
        role: UserRole::Admin,
        school_name: None,
        iat: Utc::now().timestamp(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };
    let forged = generate_jwt(&claims, "some-other-secret")?;

    let (status, _) = common::call(common::get("/api/auth/whoami", Some(&forged))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
