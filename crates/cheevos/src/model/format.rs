//! Leaderboard value formatting.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::text::TrackerDisplay;

/// Format identifier attached to each leaderboard by the service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum ValueFormat {
    /// Frames at 60 per second
    #[strum(serialize = "FRAMES", serialize = "TIME")]
    Frames,
    #[strum(serialize = "SECS", serialize = "TIMESECS")]
    Seconds,
    #[strum(serialize = "MILLISECS")]
    Centiseconds,
    #[strum(serialize = "MINUTES")]
    Minutes,
    #[strum(serialize = "SECS_AS_MINS")]
    SecondsAsMinutes,
    /// Six digits, zero padded
    #[strum(serialize = "SCORE", serialize = "POINTS")]
    Score,
    #[default]
    #[strum(serialize = "VALUE")]
    Value,
    #[strum(serialize = "UNSIGNED")]
    Unsigned,
    #[strum(serialize = "TENS")]
    Tens,
    #[strum(serialize = "HUNDREDS")]
    Hundreds,
    #[strum(serialize = "THOUSANDS")]
    Thousands,
    #[strum(serialize = "FIXED1")]
    Fixed1,
    #[strum(serialize = "FIXED2")]
    Fixed2,
    #[strum(serialize = "FIXED3")]
    Fixed3,
}

impl ValueFormat {
    /// Parse a service format string; unknown formats display as plain values.
    pub fn parse(format: &str) -> Self {
        format.trim().parse().unwrap_or_default()
    }

    pub fn is_time(self) -> bool {
        matches!(
            self,
            ValueFormat::Frames
                | ValueFormat::Seconds
                | ValueFormat::Centiseconds
                | ValueFormat::Minutes
                | ValueFormat::SecondsAsMinutes
        )
    }
}

/// Format `value` for display.
pub fn format_value(format: ValueFormat, value: i32) -> TrackerDisplay {
    let text = match format {
        ValueFormat::Frames => {
            // 60 fps; round the same way the service does
            let centis = (i64::from(value).max(0) * 100) / 60;
            format_centiseconds(centis)
        }
        ValueFormat::Centiseconds => format_centiseconds(i64::from(value).max(0)),
        ValueFormat::Seconds => {
            let secs = i64::from(value).max(0);
            let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
            if hours > 0 {
                format!("{hours}h{minutes:02}:{seconds:02}")
            } else {
                format!("{minutes}:{seconds:02}")
            }
        }
        ValueFormat::Minutes => {
            let mins = i64::from(value).max(0);
            format!("{}h{:02}", mins / 60, mins % 60)
        }
        ValueFormat::SecondsAsMinutes => {
            let secs = i64::from(value).max(0);
            format!("{}h{:02}", secs / 3600, (secs / 60) % 60)
        }
        ValueFormat::Score => format!("{value:06}"),
        ValueFormat::Value => value.to_string(),
        ValueFormat::Unsigned => (value as u32).to_string(),
        ValueFormat::Tens => (i64::from(value) * 10).to_string(),
        ValueFormat::Hundreds => (i64::from(value) * 100).to_string(),
        ValueFormat::Thousands => (i64::from(value) * 1000).to_string(),
        ValueFormat::Fixed1 => format_fixed(value, 1),
        ValueFormat::Fixed2 => format_fixed(value, 2),
        ValueFormat::Fixed3 => format_fixed(value, 3),
    };
    TrackerDisplay::truncated(&text)
}

fn format_centiseconds(total: i64) -> String {
    let centis = total % 100;
    let seconds = (total / 100) % 60;
    let minutes = (total / 6000) % 60;
    let hours = total / 360_000;
    if hours > 0 {
        format!("{hours}h{minutes:02}:{seconds:02}.{centis:02}")
    } else {
        format!("{minutes}:{seconds:02}.{centis:02}")
    }
}

fn format_fixed(value: i32, digits: u32) -> String {
    let scale = 10i64.pow(digits);
    let value = i64::from(value);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.abs();
    format!(
        "{sign}{}.{:0width$}",
        abs / scale,
        abs % scale,
        width = digits as usize
    )
}
