pub mod audit;
pub mod auth;
pub mod cache;

pub use audit::audit_middleware;
pub use auth::{jwt_auth_middleware, AuthUser};
pub use cache::{cache_middleware, ResponseCache};
