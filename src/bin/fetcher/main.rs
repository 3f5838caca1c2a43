mod args;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Result;
use args::Args;
use clap::Parser as _;
use room_climate::config::parse_sensor_ids;
use room_climate::db::{RetryPolicy, Store};
use room_climate::mobile_alerts::Client;
use room_climate::pipeline::{run_cycle, sleep_duration};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> ExitCode {
    room_climate::init_tracing();

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let sensor_ids = parse_sensor_ids(&args.sensor_ids);
    if sensor_ids.is_empty() {
        tracing::warn!("no sensor ids configured; no sensors will be polled");
    }

    let interval = Duration::from_secs(args.fetch_interval_seconds);
    let client = Client::new(&args.api_url)?;
    let mut store = Store::new(args.store.connect_options(), RetryPolicy::forever());

    store.ensure_measurement_schema().await?;

    tracing::info!(
        interval_seconds = args.fetch_interval_seconds,
        sensors = %sensor_ids.join(", "),
        "fetcher starting"
    );

    loop {
        let cycle_start = Instant::now();
        tracing::info!("starting fetch cycle");

        // A failed cycle is logged and absorbed here; the next cycle runs on
        // schedule regardless.
        match run_cycle(&client, &mut store, &sensor_ids).await {
            Ok(outcome) => tracing::info!(
                received = outcome.received,
                inserted = outcome.inserted,
                "fetch cycle finished"
            ),
            Err(err) => tracing::error!(error = %format!("{err:#}"), "fetch cycle failed"),
        }

        let elapsed = cycle_start.elapsed();
        let sleep_for = sleep_duration(interval, elapsed);
        tracing::info!(
            elapsed_seconds = elapsed.as_secs_f64(),
            sleep_seconds = sleep_for.as_secs_f64(),
            "cycle complete; sleeping"
        );
        sleep(sleep_for).await;
    }
}
