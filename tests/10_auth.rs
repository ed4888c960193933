mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::Value;

use common::{TestApp, GSP};
use gsp_solar_api::auth::{generate_jwt, Claims};
use gsp_solar_api::config::AppConfig;

#[tokio::test]
async fn health_endpoint_is_public() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request("/health", None).await?;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_canonical_routes_only() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request("/", None).await?;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body.to_vec())?;
    assert!(text.contains("/v0/solar/GB/gsp/:gsp_id/forecast"));
    assert!(!text.contains("/forecast/:gsp_id"));
    assert!(!text.contains("/pvlive/:gsp_id"));
    Ok(())
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request(&format!("{}/forecast/all", GSP), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn malformed_and_foreign_tokens_are_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let uri = format!("{}/pvlive/all", GSP);

    let (status, _) = app.request(&uri, Some("Bearer not-a-jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request(&uri, Some("Basic dXNlcjpwYXNz")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut other = app.state.config.security.clone();
    other.jwt_secret = "some-other-secret".to_string();
    let foreign = generate_jwt(&Claims::new("auth0|x".into(), None, 1, &other), &other)?;
    let (status, _) = app.request(&uri, Some(&format!("Bearer {}", foreign))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let security = &app.state.config.security;
    let expired = generate_jwt(&Claims::new("auth0|x".into(), None, -3, security), security)?;

    let (status, _) = app
        .request(&format!("{}/1/pvlive", GSP), Some(&format!("Bearer {}", expired)))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_without_subject_is_forbidden() -> Result<()> {
    let app = TestApp::new();
    let token = app.token_for("  ");
    let (status, _) = app
        .request(&format!("{}/1/forecast", GSP), Some(&format!("Bearer {}", token)))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app.request("/v0/solar/GB/national/forecast", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body: Value = serde_json::from_slice(&body)?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn configured_audience_and_issuer_are_required() -> Result<()> {
    let mut config = AppConfig::development();
    config.security.jwt_audience = Some("https://api.quartz.solar".to_string());
    config.security.jwt_issuer = Some("https://auth.quartz.solar/".to_string());
    let app = TestApp::with_config(config);
    let uri = format!("{}/pvlive/all", GSP);

    // Same secret, but no aud or iss claims
    let security = &app.state.config.security;
    let mut bare = Claims::new("auth0|x".into(), None, 1, security);
    bare.aud = None;
    bare.iss = None;
    let token = generate_jwt(&bare, security)?;
    let (status, _) = app.request(&uri, Some(&format!("Bearer {}", token))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut wrong_issuer = Claims::new("auth0|x".into(), None, 1, security);
    wrong_issuer.iss = Some("https://elsewhere.example/".to_string());
    let token = generate_jwt(&wrong_issuer, security)?;
    let (status, _) = app.request(&uri, Some(&format!("Bearer {}", token))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Tokens minted with the configured claims still pass
    let (status, _) = app.get(&uri).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.api_requests().await.len(), 1);
    Ok(())
}
