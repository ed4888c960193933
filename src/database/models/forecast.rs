use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ForecastValue {
    pub target_time: DateTime<Utc>,
    pub expected_power_generation_megawatts: f64,
    pub expected_power_generation_normalized: Option<f64>,
}

/// Timestamps of the inputs a forecast run was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDataLastUpdated {
    pub gsp: DateTime<Utc>,
    pub nwp: DateTime<Utc>,
    pub pv: DateTime<Utc>,
    pub satellite: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub location: Location,
    pub model_name: String,
    pub model_version: String,
    pub forecast_creation_time: DateTime<Utc>,
    pub historic: bool,
    pub forecast_values: Vec<ForecastValue>,
    pub input_data_last_updated: InputDataLastUpdated,
}

impl Forecast {
    pub fn sort_values(&mut self) {
        self.forecast_values.sort_by_key(|v| v.target_time);
    }

    /// Fill in normalized generation from the location's installed capacity
    pub fn normalize(&mut self) {
        let Some(capacity) = self.location.positive_capacity_mw() else {
            return;
        };
        for value in &mut self.forecast_values {
            value.expected_power_generation_normalized =
                Some(value.expected_power_generation_megawatts / capacity);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManyForecasts {
    pub forecasts: Vec<Forecast>,
}

impl ManyForecasts {
    /// Orders forecasts by GSP and values by target time, then normalizes every value.
    pub fn normalize(&mut self) {
        self.forecasts.sort_by_key(|f| f.location.gsp_id);
        for forecast in &mut self.forecasts {
            forecast.sort_values();
            forecast.normalize();
        }
    }
}

/// `/{gsp_id}/forecast` answers with either a full forecast or only its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GspForecast {
    Forecast(Forecast),
    Values(Vec<ForecastValue>),
}

impl GspForecast {
    /// Forecast values in either shape
    pub fn values(&self) -> &[ForecastValue] {
        match self {
            GspForecast::Forecast(f) => &f.forecast_values,
            GspForecast::Values(v) => v,
        }
    }
}
