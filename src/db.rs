use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection as _, Postgres, QueryBuilder};

use crate::measurement::Measurement;
use crate::room_assoc::RoomAssociation;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connection retry behavior, expressed as data. `attempts` of `None` retries
/// until a connection succeeds or the process is killed.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: Option<u32>,
    pub delay: Duration,
    pub connect_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Retry every five seconds, forever. Used by the fetch daemon.
    pub fn forever() -> Self {
        Self {
            attempts: None,
            delay: RETRY_DELAY,
            connect_timeout: None,
        }
    }

    /// Retry up to `attempts` times with the fixed delay in between.
    pub fn attempts(attempts: u32) -> Self {
        Self {
            attempts: Some(attempts),
            ..Self::forever()
        }
    }

    /// One bounded attempt. Used by the healthcheck, which must report
    /// promptly rather than wait out an outage.
    pub fn single_attempt(connect_timeout: Duration) -> Self {
        Self {
            attempts: Some(1),
            delay: RETRY_DELAY,
            connect_timeout: Some(connect_timeout),
        }
    }
}

/// Owns the single live connection to the store. The handle is created
/// lazily, reused across operations, and discarded whenever an operation
/// fails with a connectivity-class error.
pub struct Store {
    opts: PgConnectOptions,
    policy: RetryPolicy,
    conn: Option<PgConnection>,
}

impl Store {
    pub fn new(opts: PgConnectOptions, policy: RetryPolicy) -> Self {
        Self {
            opts,
            policy,
            conn: None,
        }
    }

    /// Returns a ready connection, reusing the cached handle when one exists.
    /// Dialing honors the retry policy; credential and database-name
    /// rejections are fatal on the first occurrence since retrying cannot fix
    /// them.
    pub async fn acquire(&mut self) -> Result<&mut PgConnection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.connect().await?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Discards the current handle; the next operation reconnects.
    pub fn invalidate(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!("discarded database connection");
        }
    }

    /// Pings the cached handle. `false` when no handle exists or the ping
    /// fails.
    pub async fn is_usable(&mut self) -> bool {
        match self.conn.as_mut() {
            Some(conn) => conn.ping().await.is_ok(),
            None => false,
        }
    }

    async fn connect(&self) -> Result<PgConnection> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            tracing::info!(
                host = %self.opts.get_host(),
                port = self.opts.get_port(),
                attempt,
                "connecting to database"
            );

            let result = match self.policy.connect_timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, PgConnection::connect_with(&self.opts)).await {
                        Ok(result) => result.map_err(Into::into),
                        Err(_) => Err(anyhow!(
                            "connection attempt timed out after {}s",
                            limit.as_secs()
                        )),
                    }
                }
                None => PgConnection::connect_with(&self.opts).await.map_err(Into::into),
            };

            match result {
                Ok(conn) => {
                    tracing::info!("connected to database");
                    return Ok(conn);
                }
                Err(err) => {
                    if is_fatal_connect_error(&err) {
                        return Err(err).context("database rejected connection settings");
                    }
                    if let Some(max) = self.policy.attempts
                        && attempt >= max
                    {
                        return Err(err).with_context(|| {
                            format!("could not connect to database after {attempt} attempt(s)")
                        });
                    }
                    tracing::warn!(
                        error = %err,
                        attempt,
                        "database connection failed; retrying in {}s",
                        self.policy.delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    /// Creates the measurements table and the unique index that backs
    /// idempotent ingestion, if absent. Hypertable conversion is left to the
    /// store's own provisioning.
    pub async fn ensure_measurement_schema(&mut self) -> Result<()> {
        let conn = self.acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS measurements (
                time       TIMESTAMPTZ NOT NULL,
                sensor_id  TEXT NOT NULL,
                t1         DOUBLE PRECISION NULL,
                t2         DOUBLE PRECISION NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("failed to create measurements table")?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_measurements_sensor_time \
             ON measurements (sensor_id, time)",
        )
        .execute(&mut *conn)
        .await
        .context("failed to create measurements unique index")?;

        Ok(())
    }

    /// Inserts one measurement. A reading that collides with an existing
    /// `(sensor_id, time)` pair is a no-op, not an error. On a
    /// connectivity-class failure the handle is rebuilt and the insert
    /// retried exactly once; a second failure propagates.
    pub async fn insert_measurement(&mut self, measurement: &Measurement) -> Result<()> {
        let conn = self.acquire().await?;
        match execute_insert(conn, measurement).await {
            Ok(()) => Ok(()),
            Err(err) if is_connectivity_error(&err) => {
                tracing::warn!(
                    error = %err,
                    sensor = %measurement.sensor_id,
                    "connection issue while inserting; reconnecting to retry once"
                );
                self.invalidate();
                let conn = self.acquire().await?;
                execute_insert(conn, measurement)
                    .await
                    .context("measurement insert failed after reconnect")
            }
            Err(err) => Err(err).context("failed to insert measurement"),
        }
    }

    /// Most recent recorded observation time for one sensor, if any.
    pub async fn latest_measurement_time(
        &mut self,
        sensor_id: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let conn = self.acquire().await?;
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(time) FROM measurements WHERE sensor_id = $1")
                .bind(sensor_id)
                .fetch_one(&mut *conn)
                .await
                .with_context(|| {
                    format!("failed to query latest measurement for sensor {sensor_id}")
                })?;
        Ok(latest)
    }

    /// Replaces the entire association table with `entries`, all or nothing.
    /// Schema creation, truncate and bulk insert run in one transaction; any
    /// failure rolls the whole thing back and leaves the prior contents in
    /// place. An empty `entries` authoritatively empties the table.
    pub async fn replace_room_assocs(&mut self, entries: &[RoomAssociation]) -> Result<()> {
        let conn = self.acquire().await?;
        let mut tx = conn.begin().await.context("failed to begin transaction")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS room_assoc (
                sensor_id  TEXT NOT NULL,
                room_id    TEXT NOT NULL,
                start_date TIMESTAMPTZ NULL,
                end_date   TIMESTAMPTZ NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await
        .context("failed to create room_assoc table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_room_assoc_sensor ON room_assoc (sensor_id)")
            .execute(&mut *tx)
            .await
            .context("failed to create sensor index")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_room_assoc_room ON room_assoc (room_id)")
            .execute(&mut *tx)
            .await
            .context("failed to create room index")?;

        sqlx::query("TRUNCATE room_assoc")
            .execute(&mut *tx)
            .await
            .context("failed to truncate room_assoc")?;

        if !entries.is_empty() {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO room_assoc (sensor_id, room_id, start_date, end_date) ");
            builder.push_values(entries.iter(), |mut b, entry| {
                b.push_bind(&entry.sensor_id)
                    .push_bind(&entry.room_id)
                    .push_bind(entry.start_date)
                    .push_bind(entry.end_date);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert associations")?;
        }

        tx.commit().await.context("failed to commit transaction")?;
        Ok(())
    }
}

async fn execute_insert(conn: &mut PgConnection, m: &Measurement) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO measurements (time, sensor_id, t1, t2) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (sensor_id, time) DO NOTHING",
    )
    .bind(m.time)
    .bind(&m.sensor_id)
    .bind(m.t1)
    .bind(m.t2)
    .execute(conn)
    .await?;
    Ok(())
}

/// Transport-level failures and server-side connection terminations
/// (SQLSTATE classes 08 and 57). These are the errors a reconnect can fix.
fn is_connectivity_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| code.starts_with("08") || code.starts_with("57"))
            .unwrap_or(false),
        _ => false,
    }
}

/// Rejections that no amount of retrying can fix: bad credentials (class 28)
/// or a database that does not exist (3D000).
fn is_fatal_connect_error(err: &anyhow::Error) -> bool {
    let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() else {
        return false;
    };
    let sqlx::Error::Database(db_err) = sqlx_err else {
        return false;
    };
    db_err
        .code()
        .map(|code| code.starts_with("28") || code == "3D000")
        .unwrap_or(false)
}
