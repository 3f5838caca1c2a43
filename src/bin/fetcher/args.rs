use clap::Parser;
use room_climate::config::StoreArgs;
use room_climate::mobile_alerts::DEFAULT_ENDPOINT;

#[derive(Debug, Parser)]
pub struct Args {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Comma-separated list of sensor ids, e.g. "DEADBEEF1234,C0FFEE56789A".
    #[arg(long, env = "SENSOR_IDS", default_value = "")]
    pub sensor_ids: String,

    #[arg(long, env = "FETCH_INTERVAL_SECONDS", default_value_t = 300)]
    pub fetch_interval_seconds: u64,

    #[arg(long, env = "MEASUREMENT_API_URL", default_value = DEFAULT_ENDPOINT)]
    pub api_url: String,
}
