use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::{ApiPath, ApiQuery};
use crate::database::models::{GspForecast, ManyForecasts};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AllForecastsQuery {
    /// Include yesterday's values alongside today's
    #[serde(default = "default_historic", with = "crate::api::lenient_bool")]
    pub historic: bool,
}

fn default_historic() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct GspForecastQuery {
    /// Select values forecast at least this many minutes before their target time
    pub forecast_horizon_minutes: Option<i32>,
}

/// GET /forecast/all - latest forecasts for every GSP, normalized by installed capacity
///
/// This can be slow: it pulls every GSP's values for up to two days.
pub async fn get_all_available_forecasts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<AllForecastsQuery>,
) -> ApiResult<ManyForecasts> {
    info!("Get forecasts for all gsps. The option is historic={} for user {}", query.historic, user);

    let mut forecasts = state.store.get_forecasts(query.historic).await?;
    forecasts.normalize();

    Ok(Json(forecasts))
}

/// GET /:gsp_id/forecast (and deprecated /forecast/:gsp_id)
///
/// Returns the 8-hour forecast for one GSP. With `forecast_horizon_minutes=N`
/// each value comes from the latest run made at least N minutes before its
/// target time: for a 10am target, the 4-hour forecast is the one made at 6am.
pub async fn get_forecasts_for_a_specific_gsp(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(gsp_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<GspForecastQuery>,
) -> ApiResult<GspForecast> {
    if query.forecast_horizon_minutes.is_some_and(|m| m < 0) {
        return Err(ApiError::invalid_parameter(
            "forecast_horizon_minutes",
            "must be zero or a positive number of minutes",
        ));
    }

    info!(
        "Get forecasts for gsp id {} with forecast_horizon_minutes={:?} for user {}",
        gsp_id, query.forecast_horizon_minutes, user
    );

    let forecast = state
        .store
        .get_latest_forecast_values_for_gsp(gsp_id, query.forecast_horizon_minutes)
        .await?;

    debug!("Got {} forecast values for gsp {}", forecast.values().len(), gsp_id);
    Ok(Json(forecast))
}
