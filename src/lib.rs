pub mod app;
pub mod config;
pub mod console;
pub mod domain;
pub mod http;
pub mod infra;
pub mod review;

use crate::infra::{cache::RedisCache, db::Db};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: RedisCache,
    pub paseto_access_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub flag_reports_per_hour: u32,
}
