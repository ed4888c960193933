pub mod extract;
pub mod params;

pub use extract::{ApiPath, ApiQuery};
pub use params::lenient_bool;
