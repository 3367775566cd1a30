/*!
 * WebVTT clock codec.
 *
 * Converts between the textual `H+:MM:SS.mmm` clock used by WebVTT cues and
 * numeric seconds. Internally every timestamp is an integer count of
 * milliseconds, so a text → value → text round trip is exact.
 */

use std::fmt;
use std::str::FromStr;

use log::error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{VttError, VttResult};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 3_600_000;

// Absorbs binary float error such as 1.001 - 1.0 = 0.000999..
const FLOOR_EPSILON_MS: f64 = 1e-6;

/// A non-negative point in time with millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Time zero
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from whole milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    /// Create a timestamp from seconds, truncating below the millisecond.
    ///
    /// Negative and non-finite input clamps to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Timestamp::ZERO;
        }
        Timestamp((seconds * 1000.0 + FLOOR_EPSILON_MS).floor() as u64)
    }

    /// Parse the `H+:MM:SS.mmm` clock form
    pub fn parse(text: &str) -> VttResult<Self> {
        let trimmed = text.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() != 3 {
            return Err(VttError::format(format!(
                "Invalid timestamp '{}': expected HH:MM:SS.mmm",
                text
            )));
        }

        let hours = parse_digits(parts[0], "hours", text)?;
        let minutes = parse_digits(parts[1], "minutes", text)?;

        let (whole, fraction) = match parts[2].split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (parts[2], ""),
        };
        let seconds = parse_digits(whole, "seconds", text)?;

        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(VttError::format(format!(
                "Invalid milliseconds in timestamp '{}'",
                text
            )));
        }
        let mut millis_text: String = fraction.chars().take(3).collect();
        while millis_text.len() < 3 {
            millis_text.push('0');
        }
        let millis: u64 = millis_text.parse().unwrap_or(0);

        if minutes >= 60 || seconds >= 60 {
            return Err(VttError::format(format!(
                "Minutes and seconds must be below 60 in timestamp '{}'",
                text
            )));
        }

        // Hours are unbounded on input, so only that product can overflow
        let total = hours
            .checked_mul(MILLIS_PER_HOUR)
            .and_then(|ms| ms.checked_add(minutes * MILLIS_PER_MINUTE + seconds * MILLIS_PER_SECOND + millis))
            .ok_or_else(|| VttError::format(format!("Timestamp '{}' is out of range", text)))?;

        Ok(Timestamp(total))
    }

    /// Whole milliseconds
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Seconds as a float
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Shift by a (possibly negative) number of seconds, clamping at zero
    pub fn shifted(self, seconds: f64) -> Self {
        Timestamp::from_seconds(self.as_seconds() + seconds)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later)
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        (self.0 as f64 - earlier.0 as f64) / 1000.0
    }

    /// Midpoint between two timestamps, truncated to the millisecond
    pub fn midpoint(self, other: Timestamp) -> Self {
        Timestamp::from_seconds((self.as_seconds() + other.as_seconds()) / 2.0)
    }
}

fn parse_digits(field: &str, name: &str, text: &str) -> VttResult<u64> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(VttError::format(format!(
            "Invalid {} in timestamp '{}'",
            name, text
        )));
    }
    field
        .parse()
        .map_err(|_| VttError::format(format!("Invalid {} in timestamp '{}'", name, text)))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / MILLIS_PER_HOUR;
        let minutes = (self.0 % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
        let seconds = (self.0 % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND;
        let millis = self.0 % MILLIS_PER_SECOND;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl FromStr for Timestamp {
    type Err = VttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Convert `HH:MM:SS.mmm` text to seconds
pub fn to_seconds(text: &str) -> VttResult<f64> {
    Timestamp::parse(text).map(Timestamp::as_seconds)
}

/// Convert seconds to `HH:MM:SS.mmm` text, truncating below the millisecond
pub fn to_text(seconds: f64) -> String {
    Timestamp::from_seconds(seconds).to_string()
}

/// Lenient conversion used where a failure must not abort the caller.
///
/// Text without colons is read as plain seconds. Unparseable input is logged
/// and reads as zero.
pub fn parse_timestamp_to_seconds(text: &str) -> f64 {
    let trimmed = text.trim();
    let parsed = if trimmed.contains(':') {
        to_seconds(trimmed)
    } else {
        trimmed
            .parse::<f64>()
            .map_err(|e| VttError::format(format!("Invalid seconds '{}': {}", text, e)))
    };

    match parsed {
        Ok(seconds) => seconds,
        Err(e) => {
            error!("Error parsing timestamp {}: {}", text, e);
            0.0
        }
    }
}
