use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Grid Supply Point and its installed solar capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub label: String,
    pub gsp_id: i32,
    pub gsp_name: Option<String>,
    pub gsp_group: Option<String>,
    pub region_name: Option<String>,
    pub installed_capacity_mw: Option<f64>,
}

impl Location {
    /// Capacity usable as a normalization divisor, if any
    pub fn positive_capacity_mw(&self) -> Option<f64> {
        self.installed_capacity_mw.filter(|c| *c > 0.0)
    }
}
