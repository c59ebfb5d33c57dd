use crate::driver::{Handle, MYSQL, Opener, SQLITE};
use crate::error::Error;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Opened handles keyed by data source name. Each distinct name is opened at
/// most once; entries are never evicted.
pub struct HandleCache {
    opener: Arc<dyn Opener>,
    handles: Mutex<HashMap<String, Handle>>,
}

impl HandleCache {
    pub fn new(opener: Arc<dyn Opener>) -> Self {
        Self {
            opener,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `dsn`, opening it with `driver` on first use.
    /// The flag is true when the handle came from the cache.
    pub fn get_generic_db(&self, driver: &str, dsn: &str) -> Result<(Handle, bool), Error> {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = handles.get(dsn) {
            return Ok((Arc::clone(handle), true));
        }
        let handle = self.opener.open(driver, dsn).map_err(|source| Error::Open {
            driver: driver.to_string(),
            source,
        })?;
        tracing::debug!(driver, "opened database handle");
        handles.insert(dsn.to_string(), Arc::clone(&handle));
        Ok((handle, false))
    }

    pub fn get_db(&self, mysql_uri: &str) -> Result<(Handle, bool), Error> {
        self.get_generic_db(MYSQL, mysql_uri)
    }

    pub fn get_sqlite_db(&self, db_file: &str) -> Result<(Handle, bool), Error> {
        self.get_generic_db(SQLITE, db_file)
    }

    pub fn len(&self) -> usize {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleCache").field("len", &self.len()).finish()
    }
}
