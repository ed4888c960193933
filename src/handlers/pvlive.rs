use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::api::{ApiPath, ApiQuery};
use crate::database::models::{GSPYield, LocationWithGSPYields, Regime};
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegimeQuery {
    /// `in-day` or `day-after`; omitted means the most up-to-date value
    pub regime: Option<Regime>,
}

fn regime_label(regime: Option<Regime>) -> &'static str {
    regime.map_or("latest", |r| r.as_str())
}

/// GET /pvlive/all - PV_Live truth values for every GSP for yesterday and today
pub async fn get_truths_for_all_gsps(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RegimeQuery>,
) -> ApiResult<Vec<LocationWithGSPYields>> {
    info!(
        "Get PV Live estimates values for all gsp id and regime {} for user {}",
        regime_label(query.regime),
        user
    );

    let truths = state.store.get_truth_values_for_all_gsps(query.regime).await?;
    Ok(Json(truths))
}

/// GET /:gsp_id/pvlive (and deprecated /pvlive/:gsp_id)
pub async fn get_truths_for_a_specific_gsp(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(gsp_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<RegimeQuery>,
) -> ApiResult<Vec<GSPYield>> {
    info!(
        "Get PV Live estimates values for gsp id {} and regime {} for user {}",
        gsp_id,
        regime_label(query.regime),
        user
    );

    let truths = state.store.get_truth_values_for_gsp(gsp_id, query.regime).await?;
    Ok(Json(truths))
}
