use axum::{
    http::{header::AUTHORIZATION, HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers::{forecast, pvlive, status, system};
use crate::middleware::{audit_middleware, cache_middleware, jwt_auth_middleware};
use crate::state::AppState;

pub const GSP_BASE_PATH: &str = "/v0/solar/GB/gsp";
pub const SYSTEM_BASE_PATH: &str = "/v0/system/GB/gsp";

fn gsp_path(path: &str) -> String {
    format!("{}{}", GSP_BASE_PATH, path)
}

pub fn app(state: AppState) -> Router {
    // Layers run outermost-last: authenticate, audit, cache, then the handler
    let protected = Router::new()
        .merge(forecast_routes())
        .merge(pvlive_routes())
        .merge(system_routes())
        .route_layer(from_fn_with_state(state.clone(), cache_middleware))
        .route_layer(from_fn_with_state(state.clone(), audit_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(status::root))
        .route("/health", get(status::health))
        .merge(protected)
        .fallback(not_found)
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route(&gsp_path("/forecast/all"), get(forecast::get_all_available_forecasts))
        .route(&gsp_path("/:gsp_id/forecast"), get(forecast::get_forecasts_for_a_specific_gsp))
        // Deprecated alias
        .route(&gsp_path("/forecast/:gsp_id"), get(forecast::get_forecasts_for_a_specific_gsp))
}

fn pvlive_routes() -> Router<AppState> {
    Router::new()
        .route(&gsp_path("/pvlive/all"), get(pvlive::get_truths_for_all_gsps))
        .route(&gsp_path("/:gsp_id/pvlive"), get(pvlive::get_truths_for_a_specific_gsp))
        // Deprecated alias
        .route(&gsp_path("/pvlive/:gsp_id"), get(pvlive::get_truths_for_a_specific_gsp))
}

fn system_routes() -> Router<AppState> {
    Router::new()
        .route(SYSTEM_BASE_PATH, get(system::get_gsp_systems))
        .route(&format!("{}/", SYSTEM_BASE_PATH), get(system::get_gsp_systems))
        .route(&format!("{}/boundaries", SYSTEM_BASE_PATH), get(system::get_gsp_boundaries))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers([AUTHORIZATION])
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
