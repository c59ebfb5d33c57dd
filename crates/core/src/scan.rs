use crate::driver::{Cursor, DriverError};
use crate::error::Error;
use crate::row::{RowData, RowMap};

/// Reads the current record of `cursor` into a fresh row.
pub fn row_to_array(cursor: &mut dyn Cursor) -> Result<RowData, DriverError> {
    let mut row = RowData::nulls(cursor.column_count());
    cursor.populate(&mut row)?;
    Ok(row)
}

/// Feeds every remaining record to `on_row`, stopping at the first failure.
pub fn scan_rows_to_arrays<E, F>(cursor: &mut dyn Cursor, mut on_row: F) -> Result<(), E>
where
    E: From<Error>,
    F: FnMut(RowData) -> Result<(), E>,
{
    while cursor.advance().map_err(Error::Query)? {
        let row = row_to_array(cursor).map_err(Error::Query)?;
        on_row(row)?;
    }
    Ok(())
}

/// Like [`scan_rows_to_arrays`], pairing each row with the cursor's column names.
pub fn scan_rows_to_maps<E, F>(cursor: &mut dyn Cursor, mut on_row: F) -> Result<(), E>
where
    E: From<Error>,
    F: FnMut(RowMap) -> Result<(), E>,
{
    let columns = cursor.column_names().map_err(Error::Query)?;
    scan_rows_to_arrays(cursor, |row: RowData| on_row(row.into_map(&columns)))
}
