pub mod forecast;
pub mod pvlive;
pub mod status;
pub mod system;
