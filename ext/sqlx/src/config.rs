use serde::Deserialize;
use sqlu_core::{DriverError, MYSQL, SQLITE};
use sqlx::Database;
use sqlx::pool::PoolOptions;
use std::time::Duration;

/// Pool settings applied to every handle the sqlx opener creates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: None,
        }
    }
}

impl DriverConfig {
    pub fn set_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn set_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_secs = timeout.as_secs();
        self
    }

    pub fn set_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Pool options for `source`. An in-memory SQLite database lives only as
    /// long as its single connection, so that connection is never recycled.
    pub fn pool_options<DB: Database>(&self, source: &DataSource) -> PoolOptions<DB> {
        let opts = PoolOptions::<DB>::new()
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs));
        if source.is_sqlite_memory() {
            return opts
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        opts.max_connections(self.max_connections.max(1))
            .idle_timeout(self.idle_timeout_secs.map(Duration::from_secs))
    }
}

/// A connection URL tagged with the sqlx driver that understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sqlite(String),
    MySql(String),
}

impl DataSource {
    pub fn url(&self) -> &str {
        match self {
            DataSource::Sqlite(url) | DataSource::MySql(url) => url,
        }
    }

    fn is_sqlite_memory(&self) -> bool {
        matches!(self, DataSource::Sqlite(url) if url.contains(":memory:"))
    }
}

/// Resolves a driver name plus data source name. `replace into` restores
/// need MySQL or SQLite, so no other driver is accepted.
pub fn data_source(driver: &str, dsn: &str) -> Result<DataSource, DriverError> {
    match driver {
        SQLITE | "sqlite" => Ok(DataSource::Sqlite(sqlite_url(dsn))),
        MYSQL => {
            if dsn.starts_with("mysql://") || dsn.starts_with("mariadb://") {
                Ok(DataSource::MySql(dsn.to_string()))
            } else {
                Err(DriverError::backend(
                    "mysql data source must be a mysql:// URL",
                ))
            }
        }
        other => Err(DriverError::UnsupportedDriver(other.to_string())),
    }
}

// Plain paths and `:memory:` are accepted; files are created when missing.
fn sqlite_url(dsn: &str) -> String {
    if dsn.starts_with("sqlite:") {
        dsn.to_string()
    } else if dsn == ":memory:" || dsn.is_empty() {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", dsn)
    }
}
