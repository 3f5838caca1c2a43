use anyhow::{Result, bail};
use clap::Parser;
use room_climate::health::DEFAULT_THRESHOLD_MINUTES;
use sqlx::postgres::PgConnectOptions;

/// Unlike the other binaries, credentials are optional at parse time: the
/// probe's exit contract is 0/1 only, so a missing variable is reported
/// through run() instead of as a usage error.
#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "DB_HOST", default_value = "timescaledb")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Comma-separated list of sensor ids to check.
    #[arg(long, env = "SENSOR_IDS", default_value = "")]
    pub sensor_ids: String,

    #[arg(long, env = "STALENESS_THRESHOLD_MINUTES", default_value_t = DEFAULT_THRESHOLD_MINUTES)]
    pub threshold_minutes: i64,
}

impl Args {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let (Some(db_name), Some(db_user), Some(db_password)) =
            (&self.db_name, &self.db_user, &self.db_password)
        else {
            let missing: Vec<&str> = [
                ("DB_NAME", self.db_name.is_none()),
                ("DB_USER", self.db_user.is_none()),
                ("DB_PASSWORD", self.db_password.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| *name)
            .collect();
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        };

        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(db_name)
            .username(db_user)
            .password(db_password))
    }
}
