use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::{GSP_BASE_PATH, SYSTEM_BASE_PATH};
use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    // Deprecated aliases are not listed
    Json(json!({
        "name": "GSP Solar API",
        "version": version,
        "description": "Solar generation forecasts and PV_Live truths for GB Grid Supply Points",
        "endpoints": {
            "forecast_all": format!("{}/forecast/all?historic=bool", GSP_BASE_PATH),
            "forecast_gsp": format!("{}/:gsp_id/forecast?forecast_horizon_minutes=int", GSP_BASE_PATH),
            "pvlive_all": format!("{}/pvlive/all?regime=in-day|day-after", GSP_BASE_PATH),
            "pvlive_gsp": format!("{}/:gsp_id/pvlive?regime=in-day|day-after", GSP_BASE_PATH),
            "gsp_systems": format!("{}/", SYSTEM_BASE_PATH),
            "gsp_boundaries": format!("{}/boundaries", SYSTEM_BASE_PATH),
            "health": "/health (public)",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
