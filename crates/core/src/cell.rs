use serde::{Deserialize, Serialize};
use std::fmt;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::{datetime, format_description};

/// Text layout of timestamps read from and written to cells:
/// `YYYY-MM-DD HH:MM:SS` with up to six optional fractional-second digits.
pub const DATE_TIME_FORMAT: &str = "YYYY-MM-DD HH:MM:SS[.ffffff]";

/// Returned by the time views when a cell does not hold a valid timestamp.
pub const ZERO_TIME: PrimitiveDateTime = datetime!(0001-01-01 0:00);

const SECONDS_LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const FRACTION_LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const MICROS_LAYOUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

const MAX_FRACTION_DIGITS: usize = 6;

/// One column value of one record. `None` is SQL NULL.
///
/// Serializes as a JSON string when present and as `null` when absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(Option<String>);

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn text(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The raw text, or "" for NULL.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }

    pub fn as_i64(&self, default: i64) -> i64 {
        self.parse().unwrap_or(default)
    }

    pub fn as_u64(&self, default: u64) -> u64 {
        self.parse().unwrap_or(default)
    }

    pub fn as_f64(&self, default: f64) -> f64 {
        self.parse().unwrap_or(default)
    }

    /// True iff the integer view is non-zero.
    pub fn as_bool(&self) -> bool {
        self.as_i64(0) != 0
    }

    pub fn as_time(&self) -> PrimitiveDateTime {
        self.parse_time().unwrap_or(ZERO_TIME)
    }

    pub fn parse_time(&self) -> Option<PrimitiveDateTime> {
        parse_date_time(self.text()?)
    }

    /// Parses the cell text with `FromStr`; `None` for NULL or unparsable text.
    pub fn parse<T: std::str::FromStr>(&self) -> Option<T> {
        self.text()?.parse().ok()
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        Self(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<PrimitiveDateTime> for Cell {
    fn from(value: PrimitiveDateTime) -> Self {
        Self::new(format_date_time(value))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `dt` in [`DATE_TIME_FORMAT`]. Whole seconds carry no fraction;
/// otherwise the fraction is cut to microseconds without trailing zeros.
pub fn format_date_time(dt: PrimitiveDateTime) -> String {
    let formatted = if dt.microsecond() == 0 {
        dt.format(SECONDS_LAYOUT)
    } else {
        dt.format(MICROS_LAYOUT).map(|s| s.trim_end_matches('0').to_string())
    };
    formatted.unwrap_or_default()
}

pub fn parse_date_time(text: &str) -> Option<PrimitiveDateTime> {
    match text.split_once('.') {
        None => PrimitiveDateTime::parse(text, SECONDS_LAYOUT).ok(),
        Some((_, fraction)) => {
            let digits = fraction.len();
            if digits == 0
                || digits > MAX_FRACTION_DIGITS
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            PrimitiveDateTime::parse(text, FRACTION_LAYOUT).ok()
        }
    }
}
