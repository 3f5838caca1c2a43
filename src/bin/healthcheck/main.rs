mod args;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use args::Args;
use chrono::TimeDelta;
use clap::Parser as _;
use room_climate::config::parse_sensor_ids;
use room_climate::db::{RetryPolicy, Store};
use room_climate::health;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    room_climate::init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let sensor_ids = parse_sensor_ids(&args.sensor_ids);
    if sensor_ids.is_empty() {
        tracing::info!("no sensor ids configured; nothing to check");
        return Ok(true);
    }

    let threshold = TimeDelta::minutes(args.threshold_minutes);
    let mut store = Store::new(
        args.connect_options()?,
        RetryPolicy::single_attempt(CONNECT_TIMEOUT),
    );

    let report = health::probe(&mut store, &sensor_ids, threshold).await?;

    if report.healthy() {
        tracing::info!(
            recent = report.recent_count(),
            total = report.total(),
            "sensors with recent measurements found; healthy"
        );
        Ok(true)
    } else {
        tracing::error!(
            total = report.total(),
            threshold_minutes = args.threshold_minutes,
            "no sensor has a measurement within the threshold; unhealthy"
        );
        Ok(false)
    }
}
