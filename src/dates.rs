//! Calendar dates as they travel through JSON: `YYYY-MM-DD`, with any
//! time component of an ISO timestamp discarded.

use serde::{de, Deserialize, Deserializer, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::errors::BackendError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parses a calendar date, accepting either `2024-06-01` or a timestamp
/// such as `2024-06-01T09:30:00.000Z` (only the date part is kept).
pub fn parse_date(value: &str) -> Result<Date, BackendError> {
    let trimmed = value.trim();
    let date_part = match trimmed.find('T') {
        Some(index) => &trimmed[..index],
        None => trimmed,
    };

    Date::parse(date_part, DATE_FORMAT).map_err(|_| BackendError::InvalidDate(value.to_owned()))
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// The current instant in UTC.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_date(*date))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_date(&s).map_err(de::Error::custom)
}

pub mod option {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let o: Option<String> = Deserialize::deserialize(deserializer)?;

        o.map(|s| super::parse_date(&s).map_err(de::Error::custom))
            .transpose()
    }
}
