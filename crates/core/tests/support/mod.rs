#![allow(dead_code)]

// In-memory stand-in for a database driver. Understands just enough SQL for
// the tests: `select * from <table>`, `replace into <table> (..) values (..)`
// and `delete from <table>`.

use sqlu_core::{Arg, Cell, Connection, Context, Cursor, DriverError, ExecResult, Statement};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Debug, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Default)]
pub struct MemoryDb {
    pub tables: Mutex<HashMap<String, Table>>,
    pub open_cursors: AtomicUsize,
    pub open_statements: AtomicUsize,
    pub execs: AtomicUsize,
    pub column_lookups: AtomicUsize,
    /// Empty results are reported as `DriverError::NoRows`.
    pub no_rows_error: bool,
    /// Cells equal to this text make `exec` fail.
    pub poison: Option<String>,
    /// Populating a cell equal to this text panics.
    pub panic_on: Option<String>,
    /// Advancing onto this row index fails, as a lazily executed query would.
    pub fail_advance_at: Option<usize>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        let table = Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| Cell::from(v.map(str::to_string))).collect())
                .collect(),
        };
        self.tables.lock().unwrap().insert(name.to_string(), table);
        self
    }

    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    fn select(&self, sql: &str) -> Result<Table, DriverError> {
        let name = sql
            .strip_prefix("select * from ")
            .ok_or_else(|| DriverError::backend(format!("unsupported query: {sql}")))?;
        self.table(name.trim())
            .ok_or_else(|| DriverError::backend(format!("no such table: {name}")))
    }

    fn run(&self, sql: &str, args: &[Arg]) -> Result<ExecResult, DriverError> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        if let Some(name) = sql.strip_prefix("delete from ") {
            let mut tables = self.tables.lock().unwrap();
            let table = tables
                .get_mut(name.trim())
                .ok_or_else(|| DriverError::backend("no such table"))?;
            let n = table.rows.len() as u64;
            table.rows.clear();
            return Ok(ExecResult {
                rows_affected: n,
                last_insert_id: None,
            });
        }
        let rest = sql
            .strip_prefix("replace into ")
            .ok_or_else(|| DriverError::backend(format!("unsupported statement: {sql}")))?;
        let (name, rest) = rest
            .split_once(" (")
            .ok_or_else(|| DriverError::backend("malformed replace"))?;
        let (cols, _) = rest
            .split_once(')')
            .ok_or_else(|| DriverError::backend("malformed replace"))?;
        let columns: Vec<String> = cols.split(',').map(str::to_string).collect();
        if columns.len() != args.len() {
            return Err(DriverError::backend("argument count mismatch"));
        }
        let cells: Vec<Cell> = args
            .iter()
            .map(|a| match a {
                Arg::Null => Cell::null(),
                Arg::Text(s) => Cell::new(s.clone()),
                Arg::Int(i) => Cell::new(i.to_string()),
                Arg::UInt(u) => Cell::new(u.to_string()),
                Arg::Float(f) => Cell::new(f.to_string()),
                Arg::Bool(b) => Cell::new(if *b { "1" } else { "0" }),
                Arg::Bytes(b) => Cell::new(String::from_utf8_lossy(b).into_owned()),
            })
            .collect();
        if let Some(poison) = &self.poison {
            if cells.iter().any(|c| c.text() == Some(poison.as_str())) {
                return Err(DriverError::backend(format!("rejected row {:?}", cells[0])));
            }
        }
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(name.to_string()).or_default();
        if table.columns.is_empty() {
            table.columns = columns;
        }
        match table.rows.iter_mut().find(|r| r[0] == cells[0]) {
            Some(existing) => *existing = cells,
            None => table.rows.push(cells),
        }
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }
}

pub struct MemoryCursor<'a> {
    db: &'a MemoryDb,
    table: Table,
    pos: Option<usize>,
    closed: bool,
}

impl Cursor for MemoryCursor<'_> {
    fn column_names(&mut self) -> Result<Vec<String>, DriverError> {
        self.db.column_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.table.columns.clone())
    }

    fn column_count(&self) -> usize {
        self.table.columns.len()
    }

    fn advance(&mut self) -> Result<bool, DriverError> {
        let next = self.pos.map_or(0, |p| p + 1);
        if self.db.fail_advance_at == Some(next) {
            return Err(DriverError::backend("connection reset"));
        }
        self.pos = Some(next);
        Ok(next < self.table.rows.len())
    }

    fn populate(&mut self, slots: &mut [Cell]) -> Result<(), DriverError> {
        let row = &self.table.rows[self.pos.unwrap_or(0)];
        for (slot, cell) in slots.iter_mut().zip(row) {
            if let Some(trigger) = &self.db.panic_on {
                if cell.text() == Some(trigger.as_str()) {
                    panic!("corrupt cell {trigger}");
                }
            }
            *slot = cell.clone();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.db.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct MemoryStatement<'a> {
    db: &'a MemoryDb,
    sql: &'a str,
    closed: bool,
}

impl Statement for MemoryStatement<'_> {
    fn exec(&mut self, _ctx: &Context, args: &[Arg]) -> Result<ExecResult, DriverError> {
        self.db.run(self.sql, args)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.db.open_statements.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Connection for MemoryDb {
    fn query<'a>(
        &'a self,
        ctx: &Context,
        sql: &'a str,
        _args: &[Arg],
    ) -> Result<Box<dyn Cursor + 'a>, DriverError> {
        if ctx.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        let table = self.select(sql)?;
        if self.no_rows_error && table.rows.is_empty() {
            return Err(DriverError::NoRows);
        }
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            db: self,
            table,
            pos: None,
            closed: false,
        }))
    }

    fn exec(&self, ctx: &Context, sql: &str, args: &[Arg]) -> Result<ExecResult, DriverError> {
        if ctx.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        self.run(sql, args)
    }

    fn prepare<'a>(
        &'a self,
        _ctx: &Context,
        sql: &'a str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError> {
        if !sql.starts_with("replace into ") && !sql.starts_with("delete from ") {
            return Err(DriverError::backend("syntax error"));
        }
        self.open_statements.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStatement {
            db: self,
            sql,
            closed: false,
        }))
    }
}

pub fn people() -> MemoryDb {
    MemoryDb::new().with_table(
        "people",
        &["id", "name", "age"],
        &[
            &[Some("1"), Some("ann"), Some("31")],
            &[Some("2"), None, Some("x")],
            &[Some("3"), Some("cy"), None],
        ],
    )
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records formatted events on this thread.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (out, logs)
}
