//! The capability this crate consumes from a concrete database driver.
//! Backends implement [`Opener`], [`Connection`], [`Cursor`] and [`Statement`];
//! everything else in the crate is written against these traits only.

use crate::cell::Cell;
use crate::context::Context;
use std::sync::Arc;

pub const MYSQL: &str = "mysql";
pub const SQLITE: &str = "sqlite3";

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An opened, shareable database handle.
pub type Handle = Arc<dyn Connection>;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no rows in result set")]
    NoRows,
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation timed out")]
    Timeout,
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),
    #[error(transparent)]
    Backend(BoxError),
}

impl DriverError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

/// A positional bind parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Null,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl Arg {
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }
}

impl From<&Cell> for Arg {
    fn from(cell: &Cell) -> Self {
        match cell.text() {
            Some(text) => Arg::Text(text.to_string()),
            None => Arg::Null,
        }
    }
}

impl From<Cell> for Arg {
    fn from(cell: Cell) -> Self {
        match cell.into_inner() {
            Some(text) => Arg::Text(text),
            None => Arg::Null,
        }
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Text(v.clone())
    }
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Arg::$variant(v as $target)
            }
        })+
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(UInt as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f32, f64);

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(v: Vec<u8>) -> Self {
        Arg::Bytes(v)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Arg::Null)
    }
}

/// Binds zero as NULL, for optional foreign keys stored as integers.
pub fn null_if_zero(i: i64) -> Arg {
    if i == 0 { Arg::Null } else { Arg::Int(i) }
}

/// Builds a `Vec<Arg>` from heterogeneous values.
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($v:expr),+ $(,)?) => { ::std::vec![$($crate::Arg::from($v)),+] };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

pub trait Opener: Send + Sync {
    fn open(&self, driver: &str, dsn: &str) -> Result<Handle, DriverError>;
}

impl<F> Opener for F
where
    F: Fn(&str, &str) -> Result<Handle, DriverError> + Send + Sync,
{
    fn open(&self, driver: &str, dsn: &str) -> Result<Handle, DriverError> {
        self(driver, dsn)
    }
}

/// Connections are shared between threads; implementations pool internally.
pub trait Connection: Send + Sync {
    fn query<'a>(
        &'a self,
        ctx: &Context,
        sql: &'a str,
        args: &[Arg],
    ) -> Result<Box<dyn Cursor + 'a>, DriverError>;

    fn exec(&self, ctx: &Context, sql: &str, args: &[Arg]) -> Result<ExecResult, DriverError>;

    fn prepare<'a>(
        &'a self,
        ctx: &Context,
        sql: &'a str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError>;
}

/// A forward-only view over the records of one query.
pub trait Cursor {
    fn column_names(&mut self) -> Result<Vec<String>, DriverError>;

    /// Number of values in the current record.
    fn column_count(&self) -> usize;

    /// Moves to the next record; false once exhausted.
    fn advance(&mut self) -> Result<bool, DriverError>;

    /// Fills `slots` with the current record, one cell per column.
    fn populate(&mut self, slots: &mut [Cell]) -> Result<(), DriverError>;

    fn close(&mut self) -> Result<(), DriverError>;
}

pub trait Statement {
    fn exec(&mut self, ctx: &Context, args: &[Arg]) -> Result<ExecResult, DriverError>;

    fn close(&mut self) -> Result<(), DriverError>;
}
