pub mod config;
pub mod db;
pub mod health;
pub mod measurement;
pub mod mobile_alerts;
pub mod pipeline;
pub mod room_assoc;

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
