//! sqlu_ext_sqlx: the sqlx backend for sqlu_core.
//! - `SqlxOpener` / `SqlxConnection`: blocking driver over MySQL and SQLite pools
//! - a process-wide `HandleCache` with MySQL and SQLite shortcuts

use once_cell::sync::OnceCell;
use sqlu_core::{Error, Handle, HandleCache};
use std::sync::Arc;

pub mod config;
mod drivers;
mod runtime;

pub use config::{DataSource, DriverConfig, data_source};
pub use drivers::pool::{DbPool, SqlxConnection, SqlxCursor, SqlxOpener, SqlxStatement};

struct Registry {
    config: DriverConfig,
    handles: HandleCache,
}

impl Registry {
    fn new(config: DriverConfig) -> Self {
        let handles = HandleCache::new(Arc::new(SqlxOpener::new(config.clone())));
        Self { config, handles }
    }
}

static REGISTRY: OnceCell<Registry> = OnceCell::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry::new(DriverConfig::default()))
}

/// Sets the pool settings used by [`handles`]. Returns false, leaving the
/// settings untouched, once the cache exists (configured or first used).
pub fn configure(config: DriverConfig) -> bool {
    let mut installed = false;
    REGISTRY.get_or_init(|| {
        installed = true;
        Registry::new(config)
    });
    installed
}

/// The settings the process-wide cache opens handles with.
pub fn config() -> &'static DriverConfig {
    &registry().config
}

/// The process-wide handle cache.
pub fn handles() -> &'static HandleCache {
    &registry().handles
}

pub fn get_generic_db(driver: &str, dsn: &str) -> Result<(Handle, bool), Error> {
    handles().get_generic_db(driver, dsn)
}

/// MySQL handle for a `mysql://` URL.
pub fn get_db(mysql_uri: &str) -> Result<(Handle, bool), Error> {
    handles().get_db(mysql_uri)
}

/// SQLite handle for a database file (or `:memory:`).
pub fn get_sqlite_db(db_file: &str) -> Result<(Handle, bool), Error> {
    handles().get_sqlite_db(db_file)
}
