use once_cell::sync::Lazy;
use sqlu_core::{Context, DriverError};
use std::future::Future;
use tokio::runtime::{EnterGuard, Runtime};

// sqlx is async; this crate exposes blocking calls, so every driver future is
// driven on this runtime. Calling in from inside another tokio runtime panics.
static RT: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("sqlu-sqlx")
        .enable_all()
        .build()
        .expect("sqlx driver: runtime")
});

/// Runtime context for code that may spawn (pool creation, dropping pooled
/// connections).
pub(crate) fn enter() -> EnterGuard<'static> {
    RT.enter()
}

/// Runs `fut` to completion, giving up early when `ctx` is cancelled or its
/// deadline passes.
pub(crate) fn block_on<F: Future>(ctx: &Context, fut: F) -> Result<F::Output, DriverError> {
    if ctx.is_cancelled() {
        return Err(DriverError::Cancelled);
    }
    if ctx.is_expired() {
        return Err(DriverError::Timeout);
    }
    let remaining = ctx.remaining();
    let token = ctx.cancel_token().cloned();
    RT.block_on(async move {
        let cancelled = async {
            match &token {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match remaining {
                Some(left) => tokio::time::sleep(left).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            out = fut => Ok(out),
            _ = cancelled => Err(DriverError::Cancelled),
            _ = expired => Err(DriverError::Timeout),
        }
    })
}
