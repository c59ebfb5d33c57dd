//! sqlu_core: dynamically keyed rows over a pluggable SQL driver.
//! - `Cell`, `RowData`, `RowMap`, `NamedResultData`: the row model
//! - scanning and three query executors (streaming, buffered, bulk)
//! - prepared/unprepared statement helpers
//! - `HandleCache`: one handle per data source name
//! - table snapshot and restore

pub mod cache;
pub mod cell;
pub mod context;
pub mod driver;
pub mod error;
pub mod exec;
pub mod query;
pub mod row;
pub mod scan;
pub mod table;

pub use cache::HandleCache;
pub use cell::{Cell, DATE_TIME_FORMAT, ZERO_TIME, format_date_time, parse_date_time};
pub use context::Context;
pub use driver::{
    Arg, BoxError, Connection, Cursor, DriverError, ExecResult, Handle, MYSQL, Opener, SQLITE,
    Statement, null_if_zero,
};
pub use error::{Error, Result};
pub use exec::{exec, exec_no_prepare, exec_silently};
pub use query::{
    query_named_result_data, query_result_data, query_rows_map, query_rows_map_buffered,
};
pub use row::{NamedResultData, ResultData, RowData, RowMap};
pub use table::{restore_table, snapshot_table};
