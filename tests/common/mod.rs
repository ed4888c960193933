#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use gsp_solar_api::auth::{generate_jwt, Claims};
use gsp_solar_api::config::AppConfig;
use gsp_solar_api::database::MemoryStore;
use gsp_solar_api::{app, AppState};

pub const GSP: &str = "/v0/solar/GB/gsp";
pub const SYSTEM: &str = "/v0/system/GB/gsp";

/// Router over fake data for gsp ids 0..10, driven in-process
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::with_fake_data(0..10));
        let state = AppState::new(config, store.clone());
        Self {
            router: app(state.clone()),
            state,
            store,
        }
    }

    pub fn token(&self) -> String {
        self.token_for("auth0|test-user")
    }

    pub fn token_for(&self, subject: &str) -> String {
        let security = &self.state.config.security;
        let claims = Claims::new(subject.to_string(), Some("test@example.com".to_string()), 1, security);
        generate_jwt(&claims, security).expect("token")
    }

    pub async fn request(&self, uri: &str, authorization: Option<&str>) -> Result<(StatusCode, Bytes)> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = self.router.clone().oneshot(builder.body(Body::empty())?).await?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, body))
    }

    /// Authenticated GET returning the raw body
    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Bytes)> {
        let bearer = format!("Bearer {}", self.token());
        self.request(uri, Some(&bearer)).await
    }

    pub async fn get_json(&self, uri: &str) -> Result<(StatusCode, Value)> {
        let (status, body) = self.get(uri).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }
}

pub fn times(values: &[Value], field: &str) -> Vec<String> {
    values
        .iter()
        .map(|v| v[field].as_str().expect("timestamp").to_string())
        .collect()
}

/// RFC 3339 UTC timestamps as emitted by chrono sort lexicographically
pub fn is_ascending(times: &[String]) -> bool {
    times.windows(2).all(|w| w[0] < w[1])
}
