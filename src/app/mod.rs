pub mod auth;
pub mod flags;
pub mod rate_limiter;
