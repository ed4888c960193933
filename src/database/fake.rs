//! Deterministic fake forecasts and PV_Live yields, for demos, seeding and tests.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde_json::{json, Value};
use std::f64::consts::PI;

use super::models::{ForecastValue, GSPYield, InputDataLastUpdated, Location, Regime};
use super::store::{start_of_today, start_of_yesterday};

pub const FAKE_MODEL_NAME: &str = "fake-cnn";
pub const FAKE_MODEL_VERSION: &str = "0.0.1";

/// Minutes between consecutive fake forecast runs
pub const RUN_INTERVAL_MINUTES: i64 = 180;
/// Each run forecasts this many half-hour steps ahead (8 hours)
pub const RUN_STEPS: i64 = 16;

#[derive(Debug, Clone)]
pub struct StoredLocation {
    pub location: Location,
    /// GeoJSON geometry
    pub boundary: Option<Value>,
}

/// One forecast run for one GSP
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub gsp_id: i32,
    pub model_name: String,
    pub model_version: String,
    pub forecast_creation_time: DateTime<Utc>,
    pub input_data_last_updated: InputDataLastUpdated,
    pub values: Vec<ForecastValue>,
}

#[derive(Debug, Clone)]
pub struct StoredYield {
    pub value: GSPYield,
    pub pvlive_updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub locations: Vec<StoredLocation>,
    pub runs: Vec<ForecastRun>,
    pub yields: Vec<StoredYield>,
}

pub fn installed_capacity_mw(gsp_id: i32) -> f64 {
    100.0 + 10.0 * gsp_id as f64
}

/// Fraction of capacity generated at a given time of day
fn solar_profile(at: DateTime<Utc>) -> f64 {
    let hour = at.hour() as f64 + at.minute() as f64 / 60.0;
    (PI * (hour - 5.0) / 14.0).sin().max(0.0)
}

fn fake_location(gsp_id: i32) -> StoredLocation {
    let lon = -5.0 + (gsp_id % 10) as f64 * 0.5;
    let lat = 50.0 + (gsp_id / 10) as f64 * 0.5;
    let size = 0.4;
    StoredLocation {
        location: Location {
            label: format!("GSP_{}", gsp_id),
            gsp_id,
            gsp_name: Some(format!("GSP{:03}", gsp_id)),
            gsp_group: Some(format!("_{}", (b'A' + gsp_id.rem_euclid(14) as u8) as char)),
            region_name: Some(format!("Region {}", gsp_id)),
            installed_capacity_mw: Some(installed_capacity_mw(gsp_id)),
        },
        boundary: Some(json!({
            "type": "Polygon",
            "coordinates": [[
                [lon, lat],
                [lon + size, lat],
                [lon + size, lat + size],
                [lon, lat + size],
                [lon, lat],
            ]],
        })),
    }
}

/// Runs start at 00:00 UTC yesterday and repeat every [`RUN_INTERVAL_MINUTES`] up to `now`.
/// Values from later runs are offset by the run index so each run is distinguishable.
fn fake_runs(gsp_id: i32, now: DateTime<Utc>) -> Vec<ForecastRun> {
    let capacity = installed_capacity_mw(gsp_id);
    let mut runs = Vec::new();
    let mut created = start_of_yesterday(now);
    let mut index = 0;

    while created <= now {
        let values = (1..=RUN_STEPS)
            .map(|step| {
                let target_time = created + Duration::minutes(30 * step);
                let mw = capacity * solar_profile(target_time) + index as f64;
                ForecastValue {
                    target_time,
                    expected_power_generation_megawatts: mw,
                    expected_power_generation_normalized: Some(mw / capacity),
                }
            })
            .collect();

        let inputs = created - Duration::minutes(5);
        runs.push(ForecastRun {
            gsp_id,
            model_name: FAKE_MODEL_NAME.to_string(),
            model_version: FAKE_MODEL_VERSION.to_string(),
            forecast_creation_time: created,
            input_data_last_updated: InputDataLastUpdated { gsp: inputs, nwp: inputs, pv: inputs, satellite: inputs },
            values,
        });

        created += Duration::minutes(RUN_INTERVAL_MINUTES);
        index += 1;
    }
    runs
}

/// Half-hourly in-day yields up to `now`, plus day-after revisions for yesterday.
/// Day-after revisions are published after every in-day update for the same slot.
fn fake_yields(gsp_id: i32, now: DateTime<Utc>) -> Vec<StoredYield> {
    let capacity_kw = installed_capacity_mw(gsp_id) * 1000.0;
    let today = start_of_today(now);
    let mut yields = Vec::new();
    let mut at = start_of_yesterday(now);

    while at <= now {
        let generation = capacity_kw * solar_profile(at);
        yields.push(StoredYield {
            value: GSPYield {
                gsp_id,
                datetime_utc: at,
                solar_generation_kw: generation * 0.9,
                regime: Regime::InDay,
            },
            pvlive_updated_utc: at + Duration::minutes(30),
        });
        if at < today {
            yields.push(StoredYield {
                value: GSPYield {
                    gsp_id,
                    datetime_utc: at,
                    solar_generation_kw: generation,
                    regime: Regime::DayAfter,
                },
                pvlive_updated_utc: today + Duration::hours(1),
            });
        }
        at += Duration::minutes(30);
    }
    yields
}

pub fn make_fake_data(gsp_ids: impl IntoIterator<Item = i32>, now: DateTime<Utc>) -> SeedData {
    let mut data = SeedData::default();
    for gsp_id in gsp_ids {
        data.locations.push(fake_location(gsp_id));
        data.runs.extend(fake_runs(gsp_id, now));
        data.yields.extend(fake_yields(gsp_id, now));
    }
    data
}
