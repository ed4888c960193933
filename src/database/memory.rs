use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::fake::{make_fake_data, ForecastRun, SeedData};
use super::manager::DatabaseError;
use super::models::{
    ApiRequest, Forecast, ForecastValue, GSPYield, GspForecast, Location, LocationWithGSPYields, ManyForecasts,
    Regime,
};
use super::store::{boundary_feature, feature_collection, start_of_today, start_of_yesterday, ForecastStore};

/// Store backed by seed data held in memory; used by `serve --fake` and the test-suite
pub struct MemoryStore {
    data: SeedData,
    api_requests: RwLock<Vec<ApiRequest>>,
}

impl MemoryStore {
    pub fn new(mut data: SeedData) -> Self {
        data.locations.sort_by_key(|l| l.location.gsp_id);
        Self {
            data,
            api_requests: RwLock::new(Vec::new()),
        }
    }

    pub fn with_fake_data(gsp_ids: impl IntoIterator<Item = i32>) -> Self {
        Self::new(make_fake_data(gsp_ids, Utc::now()))
    }

    /// Snapshot of the audit log
    pub async fn api_requests(&self) -> Vec<ApiRequest> {
        self.api_requests.read().await.clone()
    }

    fn location(&self, gsp_id: i32) -> Option<&Location> {
        self.data
            .locations
            .iter()
            .map(|l| &l.location)
            .find(|l| l.gsp_id == gsp_id)
    }

    fn latest_run(&self, gsp_id: i32) -> Option<&ForecastRun> {
        self.data
            .runs
            .iter()
            .filter(|r| r.gsp_id == gsp_id)
            .max_by_key(|r| r.forecast_creation_time)
    }

    /// Per target time since `since`, the value of the most recent qualifying run
    fn latest_values(&self, gsp_id: i32, since: DateTime<Utc>, horizon_minutes: Option<i32>) -> Vec<ForecastValue> {
        let mut latest: BTreeMap<DateTime<Utc>, (DateTime<Utc>, &ForecastValue)> = BTreeMap::new();

        for run in self.data.runs.iter().filter(|r| r.gsp_id == gsp_id) {
            for value in run.values.iter().filter(|v| v.target_time >= since) {
                if let Some(minutes) = horizon_minutes {
                    let cutoff = value.target_time - Duration::minutes(minutes as i64);
                    if run.forecast_creation_time > cutoff {
                        continue;
                    }
                }
                let newer = latest
                    .get(&value.target_time)
                    .map_or(true, |(created, _)| run.forecast_creation_time > *created);
                if newer {
                    latest.insert(value.target_time, (run.forecast_creation_time, value));
                }
            }
        }

        latest.into_values().map(|(_, v)| v.clone()).collect()
    }

    fn forecast_from_run(&self, run: &ForecastRun, location: &Location, historic: bool, values: Vec<ForecastValue>) -> Forecast {
        Forecast {
            location: location.clone(),
            model_name: run.model_name.clone(),
            model_version: run.model_version.clone(),
            forecast_creation_time: run.forecast_creation_time,
            historic,
            forecast_values: values,
            input_data_last_updated: run.input_data_last_updated.clone(),
        }
    }

    /// Yields since `since`; without a regime the most recently updated yield wins per timestamp
    fn yields(&self, gsp_id: i32, since: DateTime<Utc>, regime: Option<Regime>) -> Vec<GSPYield> {
        let mut latest: BTreeMap<DateTime<Utc>, (DateTime<Utc>, &GSPYield)> = BTreeMap::new();

        let matching = self.data.yields.iter().filter(|y| {
            y.value.gsp_id == gsp_id
                && y.value.datetime_utc >= since
                && regime.map_or(true, |r| y.value.regime == r)
        });
        for stored in matching {
            let newer = latest
                .get(&stored.value.datetime_utc)
                .map_or(true, |(updated, _)| stored.pvlive_updated_utc > *updated);
            if newer {
                latest.insert(stored.value.datetime_utc, (stored.pvlive_updated_utc, &stored.value));
            }
        }

        latest.into_values().map(|(_, y)| y.clone()).collect()
    }
}

#[async_trait]
impl ForecastStore for MemoryStore {
    async fn get_forecasts(&self, historic: bool) -> Result<ManyForecasts, DatabaseError> {
        let now = Utc::now();
        let mut forecasts = Vec::new();

        for stored in &self.data.locations {
            let location = &stored.location;
            let Some(run) = self.latest_run(location.gsp_id) else {
                continue;
            };
            let values = if historic {
                self.latest_values(location.gsp_id, start_of_yesterday(now), None)
            } else {
                let today = start_of_today(now);
                run.values.iter().filter(|v| v.target_time >= today).cloned().collect()
            };
            forecasts.push(self.forecast_from_run(run, location, historic, values));
        }

        Ok(ManyForecasts { forecasts })
    }

    async fn get_latest_forecast_values_for_gsp(
        &self,
        gsp_id: i32,
        forecast_horizon_minutes: Option<i32>,
    ) -> Result<GspForecast, DatabaseError> {
        let since = start_of_yesterday(Utc::now());

        if let Some(minutes) = forecast_horizon_minutes {
            return Ok(GspForecast::Values(self.latest_values(gsp_id, since, Some(minutes))));
        }

        let (Some(run), Some(location)) = (self.latest_run(gsp_id), self.location(gsp_id)) else {
            return Ok(GspForecast::Values(Vec::new()));
        };
        let values = self.latest_values(gsp_id, since, None);
        Ok(GspForecast::Forecast(self.forecast_from_run(run, location, true, values)))
    }

    async fn get_truth_values_for_all_gsps(
        &self,
        regime: Option<Regime>,
    ) -> Result<Vec<LocationWithGSPYields>, DatabaseError> {
        let since = start_of_yesterday(Utc::now());
        Ok(self
            .data
            .locations
            .iter()
            .map(|stored| LocationWithGSPYields {
                location: stored.location.clone(),
                gsp_yields: self.yields(stored.location.gsp_id, since, regime),
            })
            .collect())
    }

    async fn get_truth_values_for_gsp(
        &self,
        gsp_id: i32,
        regime: Option<Regime>,
    ) -> Result<Vec<GSPYield>, DatabaseError> {
        Ok(self.yields(gsp_id, start_of_yesterday(Utc::now()), regime))
    }

    async fn get_gsp_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        Ok(self.data.locations.iter().map(|l| l.location.clone()).collect())
    }

    async fn get_gsp_boundaries(&self) -> Result<Value, DatabaseError> {
        let features = self
            .data
            .locations
            .iter()
            .filter_map(|l| l.boundary.as_ref().map(|g| boundary_feature(&l.location, g.clone())))
            .collect();
        Ok(feature_collection(features))
    }

    async fn save_api_call(&self, call: ApiRequest) -> Result<(), DatabaseError> {
        self.api_requests.write().await.push(call);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
