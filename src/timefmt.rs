//! Human-readable fight times. Documents store milliseconds; people read
//! `M:SS.s`.

use crate::model::Ms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParseError(pub String);

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid time {:?}: expected M:SS.s or seconds", self.0)
    }
}

impl std::error::Error for TimeParseError {}

/// `83_400` → `"1:23.4"`. Rounds to the nearest tenth of a second.
pub fn format_time(ms: Ms) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let tenths = (ms.unsigned_abs() + 50) / 100;
    let mins = tenths / 600;
    let rest = tenths % 600;
    format!("{sign}{mins}:{:02}.{}", rest / 10, rest % 10)
}

/// `23_400` → `"23.4s"`.
pub fn format_seconds(ms: Ms) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

/// Inverse of [`format_time`]; plain seconds (`"12.5"`) are accepted too.
pub fn parse_time(input: &str) -> Result<Ms, TimeParseError> {
    let err = || TimeParseError(input.to_string());
    let trimmed = input.trim();

    let seconds = match trimmed.split_once(':') {
        Some((mins, secs)) => {
            let mins: u32 = mins.parse().map_err(|_| err())?;
            let secs: f64 = secs.parse().map_err(|_| err())?;
            // NaN fails the range check too.
            if !(0.0..60.0).contains(&secs) {
                return Err(err());
            }
            f64::from(mins) * 60.0 + secs
        }
        None => trimmed.parse::<f64>().map_err(|_| err())?,
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(err());
    }
    Ok((seconds * 1000.0).round() as Ms)
}
