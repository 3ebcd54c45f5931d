mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn configuration_reads_require_a_token() -> Result<()> {
    let (status, body) = common::call(common::get("/identity-configuration/all", None)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn configuration_reads_require_the_admin_role() -> Result<()> {
    for token in [
        common::student_token(),
        common::sponsor_token(),
        common::school_token(),
    ] {
        let (status, body) =
            common::call(common::get("/identity-configuration/all", Some(&token))).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "body: {}", body);
        assert_eq!(body["code"], "FORBIDDEN");
    }
    Ok(())
}

#[tokio::test]
async fn configuration_writes_require_the_admin_role() -> Result<()> {
    let token = common::sponsor_token();
    let (status, _) = common::call(common::post_json(
        "/identity-configuration/id-types",
        Some(&token),
        json!({"item": "Barangay ID"}),
    ))
    .await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_token_clears_the_gate() -> Result<()> {
    let token = common::admin_token();
    let (status, body) =
        common::call(common::get("/identity-configuration/all", Some(&token))).await?;

    // 200 with a database; 5xx without one. Never an auth failure.
    assert_ne!(status, StatusCode::UNAUTHORIZED, "body: {}", body);
    assert_ne!(status, StatusCode::FORBIDDEN, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn all_four_domains_are_routed() -> Result<()> {
    let token = common::admin_token();
    for domain in [
        "identity-configuration",
        "academic-configuration",
        "scholarship-configuration",
        "payment-configuration",
    ] {
        let (status, _) =
            common::call(common::get(&format!("/{}/all", domain), Some(&token))).await?;
        assert_ne!(status, StatusCode::NOT_FOUND, "{} not routed", domain);
        assert_ne!(status, StatusCode::METHOD_NOT_ALLOWED, "{} not routed", domain);
    }
    Ok(())
}

#[tokio::test]
async fn rename_requires_a_json_body() -> Result<()> {
    let token = common::admin_token();
    let request = common::request(
        axum::http::Method::PUT,
        "/identity-configuration/id-types",
        Some(&token),
        None,
    );
    let (status, _) = common::call(request).await?;

    // Missing body never reaches the handler
    assert!(
        status == StatusCode::UNSUPPORTED_MEDIA_TYPE || status == StatusCode::BAD_REQUEST,
        "unexpected status: {}",
        status
    );
    Ok(())
}
