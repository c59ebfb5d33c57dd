use super::lossy;
use sqlu_core::{Cell, ExecResult, format_date_time};
use sqlx::mysql::{MySqlQueryResult, MySqlRow};
use sqlx::{Row, TypeInfo, ValueRef};
use time::{Date, PrimitiveDateTime, Time};

/// Reads column `i` as text. Temporal and decimal columns arrive in binary
/// form on prepared queries and are decoded by their declared type.
pub(crate) fn cell_at(row: &MySqlRow, i: usize) -> Result<Cell, sqlx::Error> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Cell::null());
    }
    let type_name = raw.type_info().name().to_string();
    let text = match type_name.as_str() {
        "DATETIME" | "TIMESTAMP" => {
            format_date_time(row.try_get_unchecked::<PrimitiveDateTime, _>(i)?)
        }
        "DATE" => row.try_get_unchecked::<Date, _>(i)?.to_string(),
        "TIME" => format_time(row.try_get_unchecked::<Time, _>(i)?),
        "YEAR" => row.try_get_unchecked::<u16, _>(i)?.to_string(),
        "DECIMAL" => row.try_get_unchecked::<String, _>(i)?,
        _ => row
            .try_get::<String, _>(i)
            .or_else(|_| row.try_get::<i64, _>(i).map(|v| v.to_string()))
            .or_else(|_| row.try_get::<u64, _>(i).map(|v| v.to_string()))
            .or_else(|_| row.try_get::<f64, _>(i).map(|v| v.to_string()))
            .or_else(|_| row.try_get::<f32, _>(i).map(|v| v.to_string()))
            .or_else(|_| row.try_get::<Vec<u8>, _>(i).map(lossy))?,
    };
    Ok(Cell::new(text))
}

fn format_time(t: Time) -> String {
    let (hour, minute, second, micro) = t.as_hms_micro();
    if micro == 0 {
        format!("{:02}:{:02}:{:02}", hour, minute, second)
    } else {
        let fraction = format!("{:06}", micro);
        format!(
            "{:02}:{:02}:{:02}.{}",
            hour,
            minute,
            second,
            fraction.trim_end_matches('0')
        )
    }
}

pub(crate) fn exec_result(done: &MySqlQueryResult) -> ExecResult {
    ExecResult {
        rows_affected: done.rows_affected(),
        last_insert_id: i64::try_from(done.last_insert_id()).ok(),
    }
}
