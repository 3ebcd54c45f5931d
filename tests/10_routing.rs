mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn root_banner_lists_configuration_domains() -> Result<()> {
    let (status, body) = common::call(common::get("/", None)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "unexpected body: {}", body);
    assert_eq!(body["data"]["name"], "Iskolar API");

    let domains = body["data"]["configurationDomains"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert_eq!(domains.len(), 4, "unexpected domains: {:?}", domains);
    assert!(domains.iter().any(|d| d == "identity-configuration"));
    assert!(domains.iter().any(|d| d == "payment-configuration"));
    Ok(())
}

#[tokio::test]
async fn health_reports_ok_or_degraded() -> Result<()> {
    let (status, body) = common::call(common::get("/health", None)).await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );
    assert!(
        body.get("success").is_some(),
        "health body not enveloped: {}",
        body
    );
    Ok(())
}

#[tokio::test]
async fn health_rejects_other_methods() -> Result<()> {
    let (status, _) = common::call(common::put_json("/health", None, json!({}))).await?;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let (status, _) = common::call(common::get("/api/definitely-not-a-route", None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

// /auth/register must match its own handler, not the /:domain/:resource
// configuration route that also accepts POST with two path segments.
#[tokio::test]
async fn static_routes_win_over_configuration_params() -> Result<()> {
    let (status, _) = common::call(common::post_json("/auth/register", None, json!({}))).await?;

    // The configuration route would have answered 401 (admin gate); the
    // register handler rejects the empty payload as a client error instead.
    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert_ne!(status, StatusCode::FORBIDDEN);
    assert!(
        status.is_client_error(),
        "expected a 4xx for an empty register payload, got {}",
        status
    );
    Ok(())
}
