use clap::Args;
use sqlx::postgres::PgConnectOptions;

/// Store connection settings shared by every binary. All five are backed by
/// environment variables; name, user and password have no default and their
/// absence is a usage error.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    #[arg(long, env = "DB_HOST", default_value = "timescaledb")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_NAME")]
    pub db_name: String,

    #[arg(long, env = "DB_USER")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,
}

impl StoreArgs {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password)
    }
}

/// Splits a comma-separated sensor id list, trimming whitespace and dropping
/// empty segments.
pub fn parse_sensor_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
