use super::{bind_all, mysql, sqlite};
use crate::config::{DataSource, DriverConfig, data_source};
use crate::runtime::{block_on, enter};
use sqlu_core::{
    Arg, Cell, Connection, Context, Cursor, DriverError, ExecResult, Handle, Opener, Statement,
};
use sqlx::mysql::{MySql, MySqlPool, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Column, Executor, Row};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};

type RowStream<'a, R> = Pin<Box<dyn Stream<Item = Result<R, sqlx::Error>> + Send + 'a>>;

/// A driver-specific sqlx pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    MySql(MySqlPool),
}

enum Rows<'a> {
    Sqlite(RowStream<'a, SqliteRow>),
    MySql(RowStream<'a, MySqlRow>),
}

enum DbRow {
    Sqlite(SqliteRow),
    MySql(MySqlRow),
}

impl DbRow {
    fn column_names(&self) -> Vec<String> {
        match self {
            DbRow::Sqlite(row) => names(row.columns()),
            DbRow::MySql(row) => names(row.columns()),
        }
    }

    fn len(&self) -> usize {
        match self {
            DbRow::Sqlite(row) => row.len(),
            DbRow::MySql(row) => row.len(),
        }
    }

    fn cell(&self, i: usize) -> Result<Cell, sqlx::Error> {
        match self {
            DbRow::Sqlite(row) => sqlite::cell_at(row, i),
            DbRow::MySql(row) => mysql::cell_at(row, i),
        }
    }
}

fn names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

enum PooledConn {
    Sqlite(PoolConnection<Sqlite>),
    MySql(PoolConnection<MySql>),
}

/// Opens lazily connecting sqlx pools.
#[derive(Debug, Clone, Default)]
pub struct SqlxOpener {
    config: DriverConfig,
}

impl SqlxOpener {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn connect(&self, driver: &str, dsn: &str) -> Result<SqlxConnection, DriverError> {
        let source = data_source(driver, dsn)?;
        let _rt = enter();
        let pool = match &source {
            DataSource::Sqlite(url) => DbPool::Sqlite(
                self.config
                    .pool_options::<Sqlite>(&source)
                    .connect_lazy(url)
                    .map_err(DriverError::backend)?,
            ),
            DataSource::MySql(url) => DbPool::MySql(
                self.config
                    .pool_options::<MySql>(&source)
                    .connect_lazy(url)
                    .map_err(DriverError::backend)?,
            ),
        };
        Ok(SqlxConnection {
            driver: driver.to_string(),
            pool,
        })
    }
}

impl Opener for SqlxOpener {
    fn open(&self, driver: &str, dsn: &str) -> Result<Handle, DriverError> {
        Ok(Arc::new(self.connect(driver, dsn)?))
    }
}

/// A pooled database; safe to share between threads.
#[derive(Debug)]
pub struct SqlxConnection {
    driver: String,
    pool: DbPool,
}

impl SqlxConnection {
    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Connection for SqlxConnection {
    fn query<'a>(
        &'a self,
        ctx: &Context,
        sql: &'a str,
        args: &[Arg],
    ) -> Result<Box<dyn Cursor + 'a>, DriverError> {
        let rows = match &self.pool {
            DbPool::Sqlite(pool) => {
                Rows::Sqlite(bind_all(sqlx::query::<Sqlite>(sql), args).fetch(pool))
            }
            DbPool::MySql(pool) => {
                Rows::MySql(bind_all(sqlx::query::<MySql>(sql), args).fetch(pool))
            }
        };
        Ok(Box::new(SqlxCursor {
            ctx: ctx.clone(),
            pool: &self.pool,
            sql,
            rows: Some(rows),
            current: None,
            peeked: None,
        }))
    }

    fn exec(&self, ctx: &Context, sql: &str, args: &[Arg]) -> Result<ExecResult, DriverError> {
        match &self.pool {
            DbPool::Sqlite(pool) => {
                let q = bind_all(sqlx::query::<Sqlite>(sql), args);
                let done = block_on(ctx, q.execute(pool))?.map_err(DriverError::backend)?;
                Ok(sqlite::exec_result(&done))
            }
            DbPool::MySql(pool) => {
                let q = bind_all(sqlx::query::<MySql>(sql), args);
                let done = block_on(ctx, q.execute(pool))?.map_err(DriverError::backend)?;
                Ok(mysql::exec_result(&done))
            }
        }
    }

    fn prepare<'a>(
        &'a self,
        ctx: &Context,
        sql: &'a str,
    ) -> Result<Box<dyn Statement + 'a>, DriverError> {
        let conn = match &self.pool {
            DbPool::Sqlite(pool) => {
                PooledConn::Sqlite(block_on(ctx, pool.acquire())?.map_err(DriverError::backend)?)
            }
            DbPool::MySql(pool) => {
                PooledConn::MySql(block_on(ctx, pool.acquire())?.map_err(DriverError::backend)?)
            }
        };
        let mut stmt = SqlxStatement {
            conn: Some(conn),
            sql,
        };
        stmt.prepare(ctx)?;
        Ok(Box::new(stmt))
    }
}

/// Streams rows from the pool. The first row is fetched on the first
/// `advance` (or `column_names`).
pub struct SqlxCursor<'a> {
    ctx: Context,
    pool: &'a DbPool,
    sql: &'a str,
    rows: Option<Rows<'a>>,
    current: Option<DbRow>,
    peeked: Option<DbRow>,
}

impl SqlxCursor<'_> {
    fn fetch_next(&mut self) -> Result<Option<DbRow>, DriverError> {
        let next = match self.rows.as_mut() {
            None => return Ok(None),
            Some(Rows::Sqlite(stream)) => {
                block_on(&self.ctx, stream.next())?.map(|r| r.map(DbRow::Sqlite))
            }
            Some(Rows::MySql(stream)) => {
                block_on(&self.ctx, stream.next())?.map(|r| r.map(DbRow::MySql))
            }
        };
        match next {
            Some(row) => row.map(Some).map_err(DriverError::backend),
            None => {
                self.close()?;
                Ok(None)
            }
        }
    }

    // An empty result carries no column metadata; ask the server instead.
    fn describe_columns(&self) -> Vec<String> {
        let described = match self.pool {
            DbPool::Sqlite(pool) => block_on(&self.ctx, pool.describe(self.sql))
                .map(|res| res.map(|d| names(d.columns()))),
            DbPool::MySql(pool) => block_on(&self.ctx, pool.describe(self.sql))
                .map(|res| res.map(|d| names(d.columns()))),
        };
        match described {
            Ok(Ok(columns)) => columns,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "describe failed; no column names");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "describe interrupted; no column names");
                Vec::new()
            }
        }
    }
}

impl Cursor for SqlxCursor<'_> {
    fn column_names(&mut self) -> Result<Vec<String>, DriverError> {
        if self.current.is_none() && self.peeked.is_none() {
            self.peeked = self.fetch_next()?;
        }
        match self.current.as_ref().or(self.peeked.as_ref()) {
            Some(row) => Ok(row.column_names()),
            None => Ok(self.describe_columns()),
        }
    }

    fn column_count(&self) -> usize {
        self.current.as_ref().map_or(0, DbRow::len)
    }

    fn advance(&mut self) -> Result<bool, DriverError> {
        self.current = match self.peeked.take() {
            Some(row) => Some(row),
            None => self.fetch_next()?,
        };
        Ok(self.current.is_some())
    }

    fn populate(&mut self, slots: &mut [Cell]) -> Result<(), DriverError> {
        let Some(row) = self.current.as_ref() else {
            return Err(DriverError::backend("populate called without a current row"));
        };
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = row.cell(i).map_err(DriverError::backend)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if let Some(rows) = self.rows.take() {
            let _rt = enter();
            drop(rows);
        }
        Ok(())
    }
}

impl Drop for SqlxCursor<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Holds one pooled connection for the statement's lifetime; the connection
/// caches the prepared form of `sql`.
pub struct SqlxStatement<'a> {
    conn: Option<PooledConn>,
    sql: &'a str,
}

impl SqlxStatement<'_> {
    fn conn(&mut self) -> Result<&mut PooledConn, DriverError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DriverError::backend("statement is closed"))
    }

    fn prepare(&mut self, ctx: &Context) -> Result<(), DriverError> {
        let sql = self.sql;
        match self.conn()? {
            PooledConn::Sqlite(conn) => {
                block_on(ctx, (&mut **conn).prepare(sql))?.map_err(DriverError::backend)?;
            }
            PooledConn::MySql(conn) => {
                block_on(ctx, (&mut **conn).prepare(sql))?.map_err(DriverError::backend)?;
            }
        }
        Ok(())
    }
}

impl Statement for SqlxStatement<'_> {
    fn exec(&mut self, ctx: &Context, args: &[Arg]) -> Result<ExecResult, DriverError> {
        let sql = self.sql;
        match self.conn()? {
            PooledConn::Sqlite(conn) => {
                let q = bind_all(sqlx::query::<Sqlite>(sql), args);
                let done = block_on(ctx, q.execute(&mut **conn))?.map_err(DriverError::backend)?;
                Ok(sqlite::exec_result(&done))
            }
            PooledConn::MySql(conn) => {
                let q = bind_all(sqlx::query::<MySql>(sql), args);
                let done = block_on(ctx, q.execute(&mut **conn))?.map_err(DriverError::backend)?;
                Ok(mysql::exec_result(&done))
            }
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take() {
            let _rt = enter();
            drop(conn);
        }
        Ok(())
    }
}

impl Drop for SqlxStatement<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
