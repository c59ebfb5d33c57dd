use super::lossy;
use sqlu_core::{Cell, ExecResult};
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Row, ValueRef};

/// Reads column `i` as SQLite's own text rendering of the stored value.
///
/// SQLite types values, not columns: a `datetime` or `decimal` column holds
/// whatever storage class was written to it, so the declared type is ignored.
pub(crate) fn cell_at(row: &SqliteRow, i: usize) -> Result<Cell, sqlx::Error> {
    if row.try_get_raw(i)?.is_null() {
        return Ok(Cell::null());
    }
    let text = row
        .try_get_unchecked::<String, _>(i)
        .or_else(|_| row.try_get_unchecked::<Vec<u8>, _>(i).map(lossy))?;
    Ok(Cell::new(text))
}

pub(crate) fn exec_result(done: &SqliteQueryResult) -> ExecResult {
    ExecResult {
        rows_affected: done.rows_affected(),
        last_insert_id: Some(done.last_insert_rowid()),
    }
}
