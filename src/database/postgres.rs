use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::fake::SeedData;
use super::manager::DatabaseError;
use super::models::{
    ApiRequest, Forecast, ForecastValue, GSPYield, GspForecast, InputDataLastUpdated, Location,
    LocationWithGSPYields, ManyForecasts, Regime,
};
use super::store::{boundary_feature, feature_collection, start_of_today, start_of_yesterday, ForecastStore};

/// Latest run per GSP, optionally restricted to one GSP
const LATEST_RUNS_SQL: &str = r#"
    SELECT DISTINCT ON (l.gsp_id)
        f.id, l.gsp_id, l.label, l.gsp_name, l.gsp_group, l.region_name, l.installed_capacity_mw,
        f.model_name, f.model_version, f.forecast_creation_time,
        f.input_gsp_updated, f.input_nwp_updated, f.input_pv_updated, f.input_satellite_updated
    FROM forecast f
    JOIN location l ON l.id = f.location_id
    WHERE ($1::INTEGER IS NULL OR l.gsp_id = $1)
    ORDER BY l.gsp_id, f.forecast_creation_time DESC
"#;

const RUN_VALUES_SQL: &str = r#"
    SELECT forecast_id, target_time, expected_power_generation_megawatts, expected_power_generation_normalized
    FROM forecast_value
    WHERE forecast_id = ANY($1) AND target_time >= $2
    ORDER BY target_time
"#;

/// Per GSP and target time, the value from the most recent run created at least
/// `$3` minutes before the target (any run when `$3` is NULL)
const LATEST_VALUES_SQL: &str = r#"
    SELECT DISTINCT ON (l.gsp_id, fv.target_time)
        l.gsp_id, fv.target_time, fv.expected_power_generation_megawatts, fv.expected_power_generation_normalized
    FROM forecast_value fv
    JOIN forecast f ON f.id = fv.forecast_id
    JOIN location l ON l.id = f.location_id
    WHERE fv.target_time >= $1
      AND ($2::INTEGER IS NULL OR l.gsp_id = $2)
      AND ($3::INTEGER IS NULL OR f.forecast_creation_time <= fv.target_time - make_interval(mins => $3))
    ORDER BY l.gsp_id, fv.target_time, f.forecast_creation_time DESC
"#;

/// Most recently updated yield per GSP and timestamp
const YIELDS_SQL: &str = r#"
    SELECT DISTINCT ON (l.gsp_id, y.datetime_utc)
        l.gsp_id, y.datetime_utc, y.solar_generation_kw, y.regime
    FROM gsp_yield y
    JOIN location l ON l.id = y.location_id
    WHERE y.datetime_utc >= $1
      AND ($2::TEXT IS NULL OR y.regime = $2)
      AND ($3::INTEGER IS NULL OR l.gsp_id = $3)
    ORDER BY l.gsp_id, y.datetime_utc, y.pvlive_updated_utc DESC
"#;

const LOCATIONS_SQL: &str = r#"
    SELECT gsp_id, label, gsp_name, gsp_group, region_name, installed_capacity_mw
    FROM location
    ORDER BY gsp_id
"#;

const BOUNDARIES_SQL: &str = r#"
    SELECT gsp_id, label, gsp_name, gsp_group, region_name, installed_capacity_mw, boundary
    FROM location
    WHERE boundary IS NOT NULL
    ORDER BY gsp_id
"#;

#[derive(Debug, FromRow)]
struct RunRow {
    id: Uuid,
    #[sqlx(flatten)]
    location: Location,
    model_name: String,
    model_version: String,
    forecast_creation_time: DateTime<Utc>,
    input_gsp_updated: DateTime<Utc>,
    input_nwp_updated: DateTime<Utc>,
    input_pv_updated: DateTime<Utc>,
    input_satellite_updated: DateTime<Utc>,
}

impl RunRow {
    fn into_forecast(self, historic: bool, forecast_values: Vec<ForecastValue>) -> Forecast {
        Forecast {
            location: self.location,
            model_name: self.model_name,
            model_version: self.model_version,
            forecast_creation_time: self.forecast_creation_time,
            historic,
            forecast_values,
            input_data_last_updated: InputDataLastUpdated {
                gsp: self.input_gsp_updated,
                nwp: self.input_nwp_updated,
                pv: self.input_pv_updated,
                satellite: self.input_satellite_updated,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct RunValueRow {
    forecast_id: Uuid,
    #[sqlx(flatten)]
    value: ForecastValue,
}

#[derive(Debug, FromRow)]
struct GspValueRow {
    gsp_id: i32,
    #[sqlx(flatten)]
    value: ForecastValue,
}

#[derive(Debug, FromRow)]
struct YieldRow {
    gsp_id: i32,
    datetime_utc: DateTime<Utc>,
    solar_generation_kw: f64,
    regime: String,
}

impl TryFrom<YieldRow> for GSPYield {
    type Error = DatabaseError;

    fn try_from(row: YieldRow) -> Result<Self, Self::Error> {
        Ok(GSPYield {
            gsp_id: row.gsp_id,
            datetime_utc: row.datetime_utc,
            solar_generation_kw: row.solar_generation_kw,
            regime: row.regime.parse().map_err(DatabaseError::QueryError)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct BoundaryRow {
    #[sqlx(flatten)]
    location: Location,
    boundary: Value,
}

/// `ForecastStore` over the nowcasting Postgres schema in `migrations/`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn latest_runs(&self, gsp_id: Option<i32>) -> Result<Vec<RunRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, RunRow>(LATEST_RUNS_SQL)
            .bind(gsp_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn latest_values(
        &self,
        since: DateTime<Utc>,
        gsp_id: Option<i32>,
        horizon_minutes: Option<i32>,
    ) -> Result<HashMap<i32, Vec<ForecastValue>>, DatabaseError> {
        let rows = sqlx::query_as::<_, GspValueRow>(LATEST_VALUES_SQL)
            .bind(since)
            .bind(gsp_id)
            .bind(horizon_minutes)
            .fetch_all(&self.pool)
            .await?;

        let mut by_gsp: HashMap<i32, Vec<ForecastValue>> = HashMap::new();
        for row in rows {
            by_gsp.entry(row.gsp_id).or_default().push(row.value);
        }
        Ok(by_gsp)
    }

    async fn run_values(&self, runs: &[RunRow], since: DateTime<Utc>) -> Result<HashMap<Uuid, Vec<ForecastValue>>, DatabaseError> {
        let ids: Vec<Uuid> = runs.iter().map(|r| r.id).collect();
        let rows = sqlx::query_as::<_, RunValueRow>(RUN_VALUES_SQL)
            .bind(&ids)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let mut by_run: HashMap<Uuid, Vec<ForecastValue>> = HashMap::new();
        for row in rows {
            by_run.entry(row.forecast_id).or_default().push(row.value);
        }
        Ok(by_run)
    }

    async fn yields(
        &self,
        since: DateTime<Utc>,
        regime: Option<Regime>,
        gsp_id: Option<i32>,
    ) -> Result<Vec<GSPYield>, DatabaseError> {
        let rows = sqlx::query_as::<_, YieldRow>(YIELDS_SQL)
            .bind(since)
            .bind(regime.map(|r| r.as_str()))
            .bind(gsp_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(GSPYield::try_from).collect()
    }

    /// Writes seed data in a single transaction, replacing locations with the same gsp id
    pub async fn seed(&self, data: &SeedData) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut location_ids: HashMap<i32, i32> = HashMap::new();

        for stored in &data.locations {
            let l = &stored.location;
            let id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO location (gsp_id, label, gsp_name, gsp_group, region_name, installed_capacity_mw, boundary)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (gsp_id) DO UPDATE SET
                    label = EXCLUDED.label,
                    gsp_name = EXCLUDED.gsp_name,
                    gsp_group = EXCLUDED.gsp_group,
                    region_name = EXCLUDED.region_name,
                    installed_capacity_mw = EXCLUDED.installed_capacity_mw,
                    boundary = EXCLUDED.boundary
                RETURNING id
                "#,
            )
            .bind(l.gsp_id)
            .bind(&l.label)
            .bind(&l.gsp_name)
            .bind(&l.gsp_group)
            .bind(&l.region_name)
            .bind(l.installed_capacity_mw)
            .bind(&stored.boundary)
            .fetch_one(&mut *tx)
            .await?;
            location_ids.insert(l.gsp_id, id);
        }

        for run in &data.runs {
            let location_id = location_ids
                .get(&run.gsp_id)
                .copied()
                .ok_or_else(|| DatabaseError::QueryError(format!("no location seeded for gsp {}", run.gsp_id)))?;
            let forecast_id = Uuid::new_v4();
            let inputs = &run.input_data_last_updated;

            sqlx::query(
                r#"
                INSERT INTO forecast (id, location_id, model_name, model_version, forecast_creation_time,
                    input_gsp_updated, input_nwp_updated, input_pv_updated, input_satellite_updated)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(forecast_id)
            .bind(location_id)
            .bind(&run.model_name)
            .bind(&run.model_version)
            .bind(run.forecast_creation_time)
            .bind(inputs.gsp)
            .bind(inputs.nwp)
            .bind(inputs.pv)
            .bind(inputs.satellite)
            .execute(&mut *tx)
            .await?;

            for value in &run.values {
                sqlx::query(
                    r#"
                    INSERT INTO forecast_value (forecast_id, target_time,
                        expected_power_generation_megawatts, expected_power_generation_normalized)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(forecast_id)
                .bind(value.target_time)
                .bind(value.expected_power_generation_megawatts)
                .bind(value.expected_power_generation_normalized)
                .execute(&mut *tx)
                .await?;
            }
        }

        for stored in &data.yields {
            let y = &stored.value;
            let location_id = location_ids
                .get(&y.gsp_id)
                .copied()
                .ok_or_else(|| DatabaseError::QueryError(format!("no location seeded for gsp {}", y.gsp_id)))?;
            sqlx::query(
                r#"
                INSERT INTO gsp_yield (location_id, datetime_utc, solar_generation_kw, regime, pvlive_updated_utc)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(location_id)
            .bind(y.datetime_utc)
            .bind(y.solar_generation_kw)
            .bind(y.regime.as_str())
            .bind(stored.pvlive_updated_utc)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Seeded {} locations, {} forecast runs, {} yields",
            data.locations.len(),
            data.runs.len(),
            data.yields.len()
        );
        Ok(())
    }
}

#[async_trait]
impl ForecastStore for PgStore {
    async fn get_forecasts(&self, historic: bool) -> Result<ManyForecasts, DatabaseError> {
        let now = Utc::now();
        let runs = self.latest_runs(None).await?;
        debug!("Found latest runs for {} gsps", runs.len());

        let forecasts = if historic {
            let mut values = self.latest_values(start_of_yesterday(now), None, None).await?;
            runs.into_iter()
                .map(|run| {
                    let v = values.remove(&run.location.gsp_id).unwrap_or_default();
                    run.into_forecast(true, v)
                })
                .collect()
        } else {
            let mut values = self.run_values(&runs, start_of_today(now)).await?;
            runs.into_iter()
                .map(|run| {
                    let v = values.remove(&run.id).unwrap_or_default();
                    run.into_forecast(false, v)
                })
                .collect()
        };

        Ok(ManyForecasts { forecasts })
    }

    async fn get_latest_forecast_values_for_gsp(
        &self,
        gsp_id: i32,
        forecast_horizon_minutes: Option<i32>,
    ) -> Result<GspForecast, DatabaseError> {
        let since = start_of_yesterday(Utc::now());
        let mut values = self
            .latest_values(since, Some(gsp_id), forecast_horizon_minutes)
            .await?
            .remove(&gsp_id)
            .unwrap_or_default();
        values.sort_by_key(|v| v.target_time);

        if forecast_horizon_minutes.is_some() {
            return Ok(GspForecast::Values(values));
        }

        match self.latest_runs(Some(gsp_id)).await?.into_iter().next() {
            Some(run) => Ok(GspForecast::Forecast(run.into_forecast(true, values))),
            None => Ok(GspForecast::Values(Vec::new())),
        }
    }

    async fn get_truth_values_for_all_gsps(
        &self,
        regime: Option<Regime>,
    ) -> Result<Vec<LocationWithGSPYields>, DatabaseError> {
        let locations = self.get_gsp_locations().await?;
        let mut by_gsp: HashMap<i32, Vec<GSPYield>> = HashMap::new();
        for y in self.yields(start_of_yesterday(Utc::now()), regime, None).await? {
            by_gsp.entry(y.gsp_id).or_default().push(y);
        }

        Ok(locations
            .into_iter()
            .map(|location| LocationWithGSPYields {
                gsp_yields: by_gsp.remove(&location.gsp_id).unwrap_or_default(),
                location,
            })
            .collect())
    }

    async fn get_truth_values_for_gsp(
        &self,
        gsp_id: i32,
        regime: Option<Regime>,
    ) -> Result<Vec<GSPYield>, DatabaseError> {
        self.yields(start_of_yesterday(Utc::now()), regime, Some(gsp_id)).await
    }

    async fn get_gsp_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        Ok(sqlx::query_as::<_, Location>(LOCATIONS_SQL)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_gsp_boundaries(&self) -> Result<Value, DatabaseError> {
        let rows = sqlx::query_as::<_, BoundaryRow>(BOUNDARIES_SQL)
            .fetch_all(&self.pool)
            .await?;
        let features = rows
            .into_iter()
            .map(|row| boundary_feature(&row.location, row.boundary))
            .collect();
        Ok(feature_collection(features))
    }

    async fn save_api_call(&self, call: ApiRequest) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO api_request (id, user_subject, user_email, method, url, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(call.id)
        .bind(&call.user_subject)
        .bind(&call.user_email)
        .bind(&call.method)
        .bind(&call.url)
        .bind(call.created_utc)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Run with `DATABASE_URL=postgres://... cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fake::make_fake_data;
    use crate::database::MemoryStore;

    /// The same seed data loaded into Postgres and into memory
    async fn seeded(pool: PgPool) -> (PgStore, MemoryStore) {
        let data = make_fake_data(0..4, Utc::now());
        let store = PgStore::new(pool);
        store.seed(&data).await.unwrap();
        (store, MemoryStore::new(data))
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn all_forecasts_agree_with_memory_store(pool: PgPool) {
        let (pg, memory) = seeded(pool).await;

        for historic in [true, false] {
            let from_pg = pg.get_forecasts(historic).await.unwrap();
            assert_eq!(from_pg.forecasts.len(), 4);
            assert!(from_pg.forecasts.windows(2).all(|w| w[0].location.gsp_id < w[1].location.gsp_id));
            assert_eq!(from_pg, memory.get_forecasts(historic).await.unwrap(), "historic={}", historic);
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn horizon_cutoff_agrees_with_memory_store(pool: PgPool) {
        let (pg, memory) = seeded(pool).await;

        for horizon in [None, Some(0), Some(60), Some(240), Some(600)] {
            let from_pg = pg.get_latest_forecast_values_for_gsp(2, horizon).await.unwrap();
            assert!(from_pg.values().windows(2).all(|w| w[0].target_time < w[1].target_time));
            assert_eq!(
                from_pg,
                memory.get_latest_forecast_values_for_gsp(2, horizon).await.unwrap(),
                "horizon={:?}",
                horizon
            );
        }

        let unknown = pg.get_latest_forecast_values_for_gsp(99, None).await.unwrap();
        assert_eq!(unknown, GspForecast::Values(Vec::new()));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn latest_yield_per_timestamp_agrees_with_memory_store(pool: PgPool) {
        let (pg, memory) = seeded(pool).await;

        for regime in [None, Some(Regime::InDay), Some(Regime::DayAfter)] {
            let one = pg.get_truth_values_for_gsp(1, regime).await.unwrap();
            assert!(one.windows(2).all(|w| w[0].datetime_utc < w[1].datetime_utc));
            if let Some(r) = regime {
                assert!(one.iter().all(|y| y.regime == r));
            }
            assert_eq!(one, memory.get_truth_values_for_gsp(1, regime).await.unwrap());

            let all = pg.get_truth_values_for_all_gsps(regime).await.unwrap();
            assert_eq!(all, memory.get_truth_values_for_all_gsps(regime).await.unwrap());
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn locations_boundaries_and_audit(pool: PgPool) {
        let (pg, memory) = seeded(pool.clone()).await;

        assert_eq!(pg.get_gsp_locations().await.unwrap(), memory.get_gsp_locations().await.unwrap());

        let boundaries = pg.get_gsp_boundaries().await.unwrap();
        let features = boundaries["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[3]["properties"]["gspId"], 3);
        assert_eq!(features[3]["geometry"]["type"], "Polygon");

        let call = ApiRequest::new("auth0|x".into(), None, "GET".into(), "/v0/system/GB/gsp/".into());
        pg.save_api_call(call.clone()).await.unwrap();
        let saved: ApiRequest = sqlx::query_as("SELECT * FROM api_request WHERE id = $1")
            .bind(call.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(saved.url, call.url);
        assert_eq!(saved.user_subject, "auth0|x");

        pg.health_check().await.unwrap();
    }
}
