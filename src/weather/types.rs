//! Weather request types
//!
//! Validated parameter types. Constructing one of these is the only way to
//! reach the network, so bad input is rejected before any request is built.

use std::fmt;

use chrono::NaiveDate;

use crate::error::{Result, ValidationError};

/// Upstream endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
    History,
}

impl Endpoint {
    /// Path segment, without the `.json` suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current",
            Endpoint::Forecast => "forecast",
            Endpoint::History => "history",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of forecast days, always within 1..=14
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastDays(u8);

impl ForecastDays {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 14;

    /// Validate a day count. Out-of-range values are rejected, never clamped.
    pub fn new(days: i64) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(Self(days as u8))
        } else {
            Err(ValidationError::ForecastDays { days }.into())
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// A calendar date in strict `YYYY-MM-DD` form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryDate(NaiveDate);

impl HistoryDate {
    /// Parse a date string, rejecting anything that is not `YYYY-MM-DD`
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || ValidationError::HistoryDate {
            value: value.to_string(),
        };

        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !well_formed {
            return Err(invalid().into());
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| invalid().into())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for HistoryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherMcpError;

    #[test]
    fn test_forecast_days_bounds() {
        for days in 1..=14 {
            assert_eq!(ForecastDays::new(days).unwrap().get() as i64, days);
        }
        for days in [-1, 0, 15, 100] {
            let err = ForecastDays::new(days).unwrap_err();
            assert!(matches!(
                err,
                WeatherMcpError::Validation(ValidationError::ForecastDays { .. })
            ));
        }
    }

    #[test]
    fn test_history_date_valid() {
        let date = HistoryDate::parse("2025-10-28").unwrap();
        assert_eq!(date.to_string(), "2025-10-28");
    }

    #[test]
    fn test_history_date_invalid() {
        for value in [
            "",
            "2025-1-05",
            "28-10-2025",
            "2025/10/28",
            "2025-13-01",
            "2025-02-30",
            "2025-10-28T00:00",
            " 2025-10-28",
            "yesterday",
        ] {
            let err = HistoryDate::parse(value).unwrap_err();
            assert!(
                matches!(err, WeatherMcpError::Validation(ValidationError::HistoryDate { .. })),
                "{value} should be rejected"
            );
        }
    }
}
