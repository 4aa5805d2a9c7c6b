//! Go-style duration strings (`1h`, `1h30m`, `90s`, `500ms`).
//!
//! Polling intervals travel through control-plane objects written for a
//! Go operator, so they are parsed and re-emitted in that syntax.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Interval between two polling cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingInterval(pub Duration);

impl PollingInterval {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for PollingInterval {
    fn default() -> Self {
        Self(Duration::from_secs(3600))
    }
}

impl FromStr for PollingInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
            .map(Self)
            .ok_or_else(|| ConfigError::InvalidDuration(s.to_string()))
    }
}

impl fmt::Display for PollingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for PollingInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PollingInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a duration such as `1h30m`, `2.5s`, `500ms`.
///
/// A bare number is taken as seconds. Returns `None` on malformed input.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * scale;
    }

    Duration::try_from_secs_f64(total).ok()
}

/// Format a duration the way Go's `time.Duration.String` does for the
/// ranges used here (`1h0m0s`, `1m30s`, `5s`, `250ms`).
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis());
    }

    let total = d.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let nanos = d.subsec_nanos();
    let secs = if nanos == 0 {
        (total % 60).to_string()
    } else {
        let frac = format!("{:09}", nanos);
        format!("{}.{}", total % 60, frac.trim_end_matches('0'))
    };

    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}
