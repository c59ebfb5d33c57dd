use crate::driver::DriverError;
use std::any::Any;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("open {driver} database: {source}")]
    Open {
        driver: String,
        #[source]
        source: DriverError,
    },
    #[error("query: {0}")]
    Query(#[source] DriverError),
    #[error("prepare: {0}")]
    Prepare(#[source] DriverError),
    #[error("exec: {0}")]
    Exec(#[source] DriverError),
    #[error("{operation} unexpected error: {message}")]
    Unexpected {
        operation: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn from_panic(operation: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Error::Unexpected { operation, message }
    }

    /// The driver failure underneath, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Error::Open { source, .. } => Some(source),
            Error::Query(e) | Error::Prepare(e) | Error::Exec(e) => Some(e),
            Error::Unexpected { .. } => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Runs `f`, turning a panic into [`Error::Unexpected`].
pub(crate) fn guard<T, E, F>(operation: &'static str, f: F) -> Result<T, E>
where
    E: From<Error>,
    F: FnOnce() -> Result<T, E>,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(payload) => Err(Error::from_panic(operation, payload).into()),
    }
}
