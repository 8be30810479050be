use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relative lookback window for aggregation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    LastHour,
    #[default]
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::LastHour => "1h",
            Timeframe::LastDay => "24h",
            Timeframe::LastWeek => "7d",
            Timeframe::LastMonth => "30d",
        }
    }

    /// The window length. Events stamped exactly `window()` ago are
    /// still inside the window (inclusive lower bound).
    pub fn window(&self) -> Duration {
        const HOUR: u64 = 60 * 60;
        match self {
            Timeframe::LastHour => Duration::from_secs(HOUR),
            Timeframe::LastDay => Duration::from_secs(24 * HOUR),
            Timeframe::LastWeek => Duration::from_secs(7 * 24 * HOUR),
            Timeframe::LastMonth => Duration::from_secs(30 * 24 * HOUR),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Timeframe::LastHour),
            "24h" => Ok(Timeframe::LastDay),
            "7d" => Ok(Timeframe::LastWeek),
            "30d" => Ok(Timeframe::LastMonth),
            other => Err(ParseTimeframeError {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeframeError {
    value: String,
}

impl std::fmt::Display for ParseTimeframeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown timeframe `{}`; expected 1h, 24h, 7d or 30d",
            self.value
        )
    }
}

impl std::error::Error for ParseTimeframeError {}
