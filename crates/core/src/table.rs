use crate::context::Context;
use crate::driver::{Connection, DriverError};
use crate::error::{Error, guard};
use crate::query::query_named_result_data;
use crate::row::NamedResultData;

/// Reads every row and column of `table_name`.
pub fn snapshot_table(ctx: &Context, db: &dyn Connection, table_name: &str) -> Result<NamedResultData, Error> {
    let query = format!("select * from {table_name}");
    query_named_result_data(ctx, db, &query, &[])
}

pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// `replace into` statement writing one row of `columns` into `table_name`.
pub fn replace_into_query(table_name: &str, columns: &[String]) -> String {
    format!(
        "replace into {} ({}) values ({})",
        table_name,
        columns.join(","),
        placeholders(columns.len())
    )
}

/// Upserts every row of `data` into `table_name`, one statement per row.
///
/// A failing row does not stop the remaining rows; the last failure is
/// returned once all rows were attempted. Empty data is a no-op.
pub fn restore_table(
    ctx: &Context,
    db: &dyn Connection,
    table_name: &str,
    data: &NamedResultData,
) -> Result<(), Error> {
    if data.data.is_empty() || data.columns.is_empty() {
        return Ok(());
    }
    let query = replace_into_query(table_name, &data.columns);
    guard("restore_table", || {
        let mut last_err: Option<DriverError> = None;
        let mut failed = 0usize;
        for (i, row) in data.data.iter().enumerate() {
            if let Err(e) = db.exec(ctx, &query, &row.args()) {
                tracing::warn!(table = table_name, row = i, error = %e, "restoring row failed");
                failed += 1;
                last_err = Some(e);
            }
        }
        tracing::debug!(table = table_name, rows = data.data.len(), failed, "table restored");
        match last_err {
            Some(e) => Err(Error::Exec(e)),
            None => Ok(()),
        }
    })
}
