pub mod mysql;
pub mod pool;
pub mod sqlite;

use sqlu_core::Arg;
use sqlx::{Database, Encode, Type};

pub(crate) type DbQuery<'q, DB> = sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>;

pub(crate) fn bind_all<'q, DB>(mut q: DbQuery<'q, DB>, args: &[Arg]) -> DbQuery<'q, DB>
where
    DB: Database,
    Option<String>: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    Vec<u8>: Encode<'q, DB> + Type<DB>,
{
    for arg in args {
        q = match arg {
            Arg::Null => q.bind::<Option<String>>(None),
            Arg::Text(s) => q.bind(s.clone()),
            Arg::Int(i) => q.bind(*i),
            Arg::UInt(u) => match i64::try_from(*u) {
                Ok(i) => q.bind(i),
                Err(_) => q.bind(u.to_string()),
            },
            Arg::Float(f) => q.bind(*f),
            Arg::Bool(b) => q.bind(*b),
            Arg::Bytes(b) => q.bind(b.clone()),
        };
    }
    q
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}
