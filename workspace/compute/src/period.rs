use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{ComputeError, Result};

/// A calendar month, parsed from and rendered as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ComputeError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || ComputeError::InvalidMonth(value.to_string());
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    /// The month the given date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    /// Half-open range `[first day, first day of next month)`.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month is validated on construction");
        let end = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        }
        .expect("month is validated on construction");
        (start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.range();
        start <= date && date < end
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders() {
        let m = Month::parse("2026-03").unwrap();
        assert_eq!(m, Month { year: 2026, month: 3 });
        assert_eq!(m.to_string(), "2026-03");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Month::parse("2026-13").is_err());
        assert!(Month::parse("2026-00").is_err());
        assert!(Month::parse("2026-3").is_err());
        assert!(Month::parse("march").is_err());
        assert!(Month::parse("2026-03-01").is_err());
    }

    #[test]
    fn december_range_rolls_into_next_year() {
        let (start, end) = Month::parse("2025-12").unwrap().range();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn contains_is_half_open() {
        let m = Month::parse("2026-02").unwrap();
        assert!(m.contains(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
        assert!(m.contains(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
        assert!(!m.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
    }
}
