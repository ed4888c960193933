pub mod api_request;
pub mod forecast;
pub mod gsp_yield;
pub mod location;

pub use api_request::ApiRequest;
pub use forecast::{Forecast, ForecastValue, GspForecast, InputDataLastUpdated, ManyForecasts};
pub use gsp_yield::{GSPYield, LocationWithGSPYields, Regime};
pub use location::Location;
