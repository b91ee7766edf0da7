//! Report-date ranges for filtering filings.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used throughout the EDGAR submissions payload.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    /// January through March
    Q1,
    /// April through June
    Q2,
    /// July through September
    Q3,
    /// October through December
    Q4,
}

impl Quarter {
    /// First `(month, day)` of the quarter.
    const fn first_day(self) -> (u32, u32) {
        match self {
            Self::Q1 => (1, 1),
            Self::Q2 => (4, 1),
            Self::Q3 => (7, 1),
            Self::Q4 => (10, 1),
        }
    }

    /// Last `(month, day)` of the quarter.
    const fn last_day(self) -> (u32, u32) {
        match self {
            Self::Q1 => (3, 31),
            Self::Q2 => (6, 30),
            Self::Q3 => (9, 30),
            Self::Q4 => (12, 31),
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = DataError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            _ => Err(DataError::Parse(format!("Invalid quarter: {value} (expected 1-4)"))),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        };
        write!(f, "Q{n}")
    }
}

/// Inclusive date range; an absent bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// First included date
    pub start: Option<NaiveDate>,
    /// Last included date
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Range covering everything.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Derive a range from explicit dates and/or a fiscal year and quarter.
    ///
    /// A well-formed `YYYY-MM-DD` `start`/`end` wins. Otherwise the bound is
    /// derived from `year` and `quarter`: a quarter selects its own three
    /// months, a bare year spans January 1 to December 31. Malformed explicit
    /// dates fall back to the derived bound.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use docket_data::edgar::{DateRange, Quarter};
    ///
    /// let range = DateRange::resolve(None, None, Some(2024), Some(Quarter::Q2)).unwrap();
    /// assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 4, 1));
    /// assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 6, 30));
    /// ```
    ///
    /// # Errors
    /// [`DataError::InvalidDateRange`] when the start falls after the end.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        year: Option<i32>,
        quarter: Option<Quarter>,
    ) -> Result<Self> {
        let start = parse_explicit(start, "start").or_else(|| {
            let (month, day) = quarter.unwrap_or(Quarter::Q1).first_day();
            year.and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        });
        let end = parse_explicit(end, "end").or_else(|| {
            let (month, day) = quarter.unwrap_or(Quarter::Q4).last_day();
            year.and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        });

        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(DataError::InvalidDateRange {
                start: s.to_string(),
                end: e.to_string(),
            });
        }

        Ok(Self { start, end })
    }

    /// Whether any bound is set.
    pub const fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Whether `date` lies within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| s <= date) && self.end.is_none_or(|e| date <= e)
    }
}

fn parse_explicit(value: Option<&str>, which: &str) -> Option<NaiveDate> {
    let value = value?;
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(value, bound = which, error = %e, "ignoring malformed date");
            None
        }
    }
}
