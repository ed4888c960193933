use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::database::models::Location;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /v0/system/GB/gsp/ - every known GSP location
pub async fn get_gsp_systems(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Location>> {
    info!("Get all gsp systems for user {}", user);
    Ok(Json(state.store.get_gsp_locations().await?))
}

/// GET /v0/system/GB/gsp/boundaries - GSP boundaries as a GeoJSON FeatureCollection
pub async fn get_gsp_boundaries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Value> {
    info!("Get gsp boundaries for user {}", user);
    Ok(Json(state.store.get_gsp_boundaries().await?))
}
