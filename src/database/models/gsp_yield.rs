use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::location::Location;

/// PV_Live estimate regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Live, provisional estimate
    #[serde(rename = "in-day")]
    InDay,
    /// Finalized estimate published the following day
    #[serde(rename = "day-after")]
    DayAfter,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::InDay => "in-day",
            Regime::DayAfter => "day-after",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-day" => Ok(Regime::InDay),
            "day-after" => Ok(Regime::DayAfter),
            other => Err(format!("unknown regime '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GSPYield {
    pub gsp_id: i32,
    pub datetime_utc: DateTime<Utc>,
    pub solar_generation_kw: f64,
    pub regime: Regime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationWithGSPYields {
    #[serde(flatten)]
    pub location: Location,
    pub gsp_yields: Vec<GSPYield>,
}
