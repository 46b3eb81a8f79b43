use std::convert::TryFrom;
use std::time::Duration;
use thiserror::Error;

/// Length of a game tick
pub const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DurationParseError {
    #[error("Empty duration")]
    Empty,
    #[error("Invalid number in duration: {0:?}")]
    BadNumber(String),
    #[error("Unknown time unit: {0:?}")]
    UnknownUnit(String),
    #[error("Duration is out of range: {0}")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<f64> {
    const SECOND: f64 = 1e9;
    let nanos = match unit {
        "" | "s" => SECOND,
        "ms" => 1e6,
        "t" => TICK.as_nanos() as f64,
        "m" => 60. * SECOND,
        "h" => 60. * 60. * SECOND,
        "d" => 24. * 60. * 60. * SECOND,
        _ => return None,
    };
    Some(nanos)
}

/// Parse durations like `10`, `1.5s`, `500ms`, `20t` or `1m30s`.
///
/// Bare numbers are seconds, `t` is game ticks.
pub fn parse_duration(text: &str) -> Result<Duration, DurationParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total = 0.0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or_else(|| rest.len());
        let unit_len = rest[num_len..]
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or_else(|| rest.len() - num_len);
        let (number, unit) = (&rest[..num_len], &rest[num_len..num_len + unit_len]);

        let value: f64 = number
            .parse()
            .map_err(|_| DurationParseError::BadNumber(number.to_owned()))?;
        let scale = unit_nanos(unit.trim())
            .ok_or_else(|| DurationParseError::UnknownUnit(unit.to_owned()))?;
        total += value * scale;

        rest = &rest[num_len + unit_len..];
    }

    let total = total.round();
    if !total.is_finite() || total >= u64::MAX as f64 {
        return Err(DurationParseError::Overflow(text.to_owned()));
    }
    Ok(Duration::from_nanos(total as u64))
}

/// Whole game ticks in `duration`, rounded down
pub fn to_ticks(duration: Duration) -> Result<u32, DurationParseError> {
    u32::try_from(duration.as_millis() / TICK.as_millis())
        .map_err(|_| DurationParseError::Overflow(format!("{:?}", duration)))
}
