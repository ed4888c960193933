use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::database::models::ApiRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// Records every successful authenticated call, including those answered from the cache.
/// Must be layered inside `jwt_auth_middleware` and outside `cache_middleware`.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.security.enable_audit_logging {
        return Ok(next.run(request).await);
    }

    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before audit logging"))?;

    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;
    if !response.status().is_success() {
        tracing::debug!("Not auditing {} {}: {}", method, url, response.status());
        return Ok(response);
    }

    let call = ApiRequest::new(user.subject, user.email, method, url);
    tracing::debug!("Saving api call {} {} for {}", call.method, call.url, call.user_subject);
    state.store.save_api_call(call).await?;

    Ok(response)
}
