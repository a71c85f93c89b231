use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Date format accepted at the bridge boundary and on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("range start {from} is after range end {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    BadDate(String),
}

/// Inclusive calendar-date interval. Construction enforces `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self, RangeError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map_err(|_| RangeError::BadDate(s.to_string()))
        };
        Self::new(parse(from)?, parse(to)?)
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// A diary record. `payload` holds every remote field except `id` and `date`,
/// untouched and in the remote's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl DiaryEntry {
    /// Author name, if the remote supplied one.
    pub fn author(&self) -> Option<&str> {
        ["author", "cast"]
            .iter()
            .find_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Posting hour (0-23) from `hour`, or the leading `HH` of `posted_at`/`time`.
    pub fn hour(&self) -> Option<u32> {
        if let Some(hour) = self.payload.get("hour").and_then(Value::as_u64) {
            return u32::try_from(hour).ok().filter(|h| *h < 24);
        }
        ["posted_at", "time"]
            .iter()
            .find_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .and_then(parse_leading_hour)
    }
}

/// Accepts "13:45", "9:05", "2025-06-01 13:45" and "2025-06-01T13:45:00".
fn parse_leading_hour(text: &str) -> Option<u32> {
    let clock = text
        .rsplit(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(text);
    let hour = clock.split(':').next()?;
    if hour.is_empty() || hour.len() > 2 || clock.len() == hour.len() {
        return None;
    }
    hour.parse::<u32>().ok().filter(|h| *h < 24)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountResult {
    pub range: DateRange,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult {
    pub range: DateRange,
    pub entries: Vec<DiaryEntry>,
}
