use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde_json::Value;

use super::manager::DatabaseError;
use super::models::{ApiRequest, GSPYield, GspForecast, Location, LocationWithGSPYields, ManyForecasts, Regime};

/// Read access to forecasts and PV_Live truths, plus the audit log.
///
/// All reads are windowed: they start at 00:00 UTC of the previous day, except
/// the non-historic all-GSP forecast read which starts at 00:00 UTC today.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Latest forecast for every GSP.
    ///
    /// `historic = false` returns only the latest run's values from today onward.
    /// `historic = true` returns, per target time since yesterday, the value of the
    /// most recently created run.
    async fn get_forecasts(&self, historic: bool) -> Result<ManyForecasts, DatabaseError>;

    /// Forecast for one GSP.
    ///
    /// Without a horizon this is the full latest forecast (or an empty list if the
    /// GSP has never been forecast). With a horizon of N minutes it is, per target
    /// time, the value of the latest run created at or before `target - N`.
    async fn get_latest_forecast_values_for_gsp(
        &self,
        gsp_id: i32,
        forecast_horizon_minutes: Option<i32>,
    ) -> Result<GspForecast, DatabaseError>;

    /// One entry per known GSP, each with its yields ordered by time.
    async fn get_truth_values_for_all_gsps(
        &self,
        regime: Option<Regime>,
    ) -> Result<Vec<LocationWithGSPYields>, DatabaseError>;

    async fn get_truth_values_for_gsp(
        &self,
        gsp_id: i32,
        regime: Option<Regime>,
    ) -> Result<Vec<GSPYield>, DatabaseError>;

    async fn get_gsp_locations(&self) -> Result<Vec<Location>, DatabaseError>;

    /// GeoJSON `FeatureCollection` of stored GSP boundaries
    async fn get_gsp_boundaries(&self) -> Result<Value, DatabaseError>;

    async fn save_api_call(&self, call: ApiRequest) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub fn start_of_today(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn start_of_yesterday(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_today(now) - Duration::days(1)
}

/// Wraps boundary features into a collection
pub fn feature_collection(features: Vec<Value>) -> Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn boundary_feature(location: &Location, geometry: Value) -> Value {
    serde_json::json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "gspId": location.gsp_id,
            "gspName": location.gsp_name,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn windows_start_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 7, 45, 12).unwrap();
        assert_eq!(start_of_today(now), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        // Crosses the month boundary in a leap year
        assert_eq!(start_of_yesterday(now), Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }
}
