use crate::context::Context;
use crate::driver::{Arg, Connection, ExecResult};
use crate::error::{Error, guard};

/// Prepares, executes and closes `query`. The statement is closed on every
/// path; failures are logged unless `silent`.
fn exec_internal(
    ctx: &Context,
    silent: bool,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
) -> Result<ExecResult, Error> {
    guard("exec", || {
        let res = db.prepare(ctx, query).map_err(Error::Prepare).and_then(|mut stmt| {
            let res = stmt.exec(ctx, args).map_err(Error::Exec);
            if let Err(e) = stmt.close() {
                tracing::warn!(error = %e, "closing prepared statement failed");
            }
            res
        });
        if let Err(e) = &res
            && !silent
        {
            tracing::error!(error = %e, query, "exec failed");
        }
        res
    })
}

pub fn exec(ctx: &Context, db: &dyn Connection, query: &str, args: &[Arg]) -> Result<ExecResult, Error> {
    exec_internal(ctx, false, db, query, args)
}

/// Like [`exec`], without logging failures.
pub fn exec_silently(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
) -> Result<ExecResult, Error> {
    exec_internal(ctx, true, db, query, args)
}

/// Executes `query` directly, skipping the prepare step.
pub fn exec_no_prepare(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
) -> Result<ExecResult, Error> {
    guard("exec_no_prepare", || {
        db.exec(ctx, query, args).map_err(|e| {
            tracing::error!(error = %e, query, "exec failed");
            Error::Exec(e)
        })
    })
}
