//! Normalisation of raw observation timestamps into UTC epoch seconds.
//!
//! Raw timestamps look like `2012-05-14 10:30:00.123456789` or, once they have
//! travelled through a record string, `2012-05-14!10:30:00.123`. Components are
//! read in year, month, day, hour, minute, second order and interpreted as UTC.
//! The conversion never consults the host timezone.

use thiserror::Error;
use time::{Date, Month, PrimitiveDateTime, Time};

/// Characters accepted between the year, month, day, hour, minute and second.
pub const TIMESTAMP_SEPARATORS: [char; 6] = ['.', ':', '-', '/', ' ', '!'];

const COMPONENT_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp {raw:?} has {found} components, expected at least 6")]
    ComponentCount { raw: String, found: usize },
    #[error("timestamp {raw:?}: component {component:?} is not an integer")]
    Component { raw: String, component: String },
    #[error("timestamp {raw:?} is not a valid calendar instant: {message}")]
    Calendar { raw: String, message: String },
}

/// Converts a raw timestamp to seconds since the Unix epoch, UTC.
///
/// Anything after the first `.` is a fractional-second suffix and is dropped
/// before the components are split. Empty components (doubled separators, a
/// trailing `!`) are skipped; components past the sixth are ignored.
pub fn to_epoch_seconds(raw: &str) -> Result<i64, TimestampError> {
    let whole = raw.find('.').map_or(raw, |idx| &raw[..idx]);
    let parts: Vec<&str> = whole
        .split(|c: char| TIMESTAMP_SEPARATORS.contains(&c))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() < COMPONENT_COUNT {
        return Err(TimestampError::ComponentCount {
            raw: raw.to_string(),
            found: parts.len(),
        });
    }

    let mut values = [0_i64; COMPONENT_COUNT];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part.parse::<i64>().map_err(|_| TimestampError::Component {
            raw: raw.to_string(),
            component: (*part).to_string(),
        })?;
    }
    let [year, month, day, hour, minute, second] = values;

    let calendar = |message: String| TimestampError::Calendar {
        raw: raw.to_string(),
        message,
    };

    let month = narrow::<u8>(month, "month")
        .and_then(|m| Month::try_from(m).map_err(|err| err.to_string()))
        .map_err(calendar)?;
    let date = narrow::<i32>(year, "year")
        .and_then(|y| {
            let d = narrow::<u8>(day, "day")?;
            Date::from_calendar_date(y, month, d).map_err(|err| err.to_string())
        })
        .map_err(calendar)?;
    let clock = narrow::<u8>(hour, "hour")
        .and_then(|h| {
            let m = narrow::<u8>(minute, "minute")?;
            let s = narrow::<u8>(second, "second")?;
            Time::from_hms(h, m, s).map_err(|err| err.to_string())
        })
        .map_err(calendar)?;

    Ok(PrimitiveDateTime::new(date, clock)
        .assume_utc()
        .unix_timestamp())
}

fn narrow<T: TryFrom<i64>>(value: i64, label: &str) -> Result<T, String> {
    T::try_from(value).map_err(|_| format!("{label} {value} out of range"))
}
