//! Query executors. Three ways to consume the same query:
//! streaming into a callback, buffering then calling back, or returning
//! the whole result as a value.

use crate::cell::Cell;
use crate::context::Context;
use crate::driver::{Arg, Connection, Cursor, DriverError};
use crate::error::{Error, guard};
use crate::row::{NamedResultData, ResultData, RowData, RowMap};
use crate::scan::{scan_rows_to_arrays, scan_rows_to_maps};

fn log_failure(query: &str, err: &DriverError) {
    tracing::error!(error = %err, query, "query failed");
}

/// Logs driver failures as the cursor reports them. Drivers may defer
/// execution until the first fetch, so failures surface here as often as
/// from `Connection::query`. Sink errors never pass through.
struct LoggedCursor<'a> {
    inner: Box<dyn Cursor + 'a>,
    query: &'a str,
}

impl LoggedCursor<'_> {
    fn logged<T>(&self, res: Result<T, DriverError>) -> Result<T, DriverError> {
        if let Err(e) = &res {
            log_failure(self.query, e);
        }
        res
    }
}

impl Cursor for LoggedCursor<'_> {
    fn column_names(&mut self) -> Result<Vec<String>, DriverError> {
        let res = self.inner.column_names();
        self.logged(res)
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn advance(&mut self) -> Result<bool, DriverError> {
        let res = self.inner.advance();
        self.logged(res)
    }

    fn populate(&mut self, slots: &mut [Cell]) -> Result<(), DriverError> {
        let res = self.inner.populate(slots);
        self.logged(res)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let res = self.inner.close();
        self.logged(res)
    }
}

/// Opens a cursor; `Ok(None)` when the driver reports no matching rows.
fn open_cursor<'a>(
    ctx: &Context,
    db: &'a dyn Connection,
    query: &'a str,
    args: &[Arg],
) -> Result<Option<Box<dyn Cursor + 'a>>, Error> {
    match db.query(ctx, query, args) {
        Ok(inner) => Ok(Some(Box::new(LoggedCursor { inner, query }))),
        Err(DriverError::NoRows) => Ok(None),
        Err(e) => {
            log_failure(query, &e);
            Err(Error::Query(e))
        }
    }
}

/// Closes `cursor` after `scan`, whatever the scan's outcome.
fn with_cursor<T, E, F>(mut cursor: Box<dyn Cursor + '_>, scan: F) -> Result<T, E>
where
    E: From<Error>,
    F: FnOnce(&mut dyn Cursor) -> Result<T, E>,
{
    let res = scan(cursor.as_mut());
    let closed = cursor.close();
    let value = res?;
    closed.map_err(Error::Query)?;
    Ok(value)
}

/// Streams each row to `on_row` while the cursor is open. `on_row` must not
/// issue queries that need the connection the cursor holds; use
/// [`query_rows_map_buffered`] for that.
pub fn query_rows_map<E, F>(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
    on_row: F,
) -> Result<(), E>
where
    E: From<Error>,
    F: FnMut(RowMap) -> Result<(), E>,
{
    guard("query_rows_map", || {
        let Some(cursor) = open_cursor(ctx, db, query, args)? else {
            return Ok(());
        };
        with_cursor(cursor, |c| scan_rows_to_maps(c, on_row))
    })
}

/// Reads rows, optionally with their column names, closing the cursor before
/// returning.
fn query_result_data_internal(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    retrieve_columns: bool,
    args: &[Arg],
) -> Result<(ResultData, Vec<String>), Error> {
    guard("query_result_data", || {
        let Some(cursor) = open_cursor(ctx, db, query, args)? else {
            return Ok((ResultData::new(), Vec::new()));
        };
        with_cursor(cursor, |c| {
            let columns = if retrieve_columns {
                c.column_names().map_err(Error::Query)?
            } else {
                Vec::new()
            };
            let mut data = ResultData::new();
            scan_rows_to_arrays(c, |row: RowData| -> Result<(), Error> {
                data.push(row);
                Ok(())
            })?;
            Ok((data, columns))
        })
    })
}

pub fn query_result_data(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
) -> Result<ResultData, Error> {
    query_result_data_internal(ctx, db, query, false, args).map(|(data, _)| data)
}

pub fn query_named_result_data(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
) -> Result<NamedResultData, Error> {
    let (data, columns) = query_result_data_internal(ctx, db, query, true, args)?;
    Ok(NamedResultData { columns, data })
}

/// Reads the whole result into memory and only then calls `on_row` per row,
/// so `on_row` may take its time or run further queries on `db`.
pub fn query_rows_map_buffered<E, F>(
    ctx: &Context,
    db: &dyn Connection,
    query: &str,
    args: &[Arg],
    mut on_row: F,
) -> Result<(), E>
where
    E: From<Error>,
    F: FnMut(RowMap) -> Result<(), E>,
{
    let (data, columns) = query_result_data_internal(ctx, db, query, true, args)?;
    guard("query_rows_map_buffered", || {
        for row in data {
            on_row(row.into_map(&columns))?;
        }
        Ok(())
    })
}
