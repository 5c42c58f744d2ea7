//! Week identifiers and date windows
//!
//! Week identifiers use the `YYYY-Www` form stored alongside persisted
//! rollups. Week 1 starts on the Monday on or before January 1st, with the
//! Sunday case shifted forward to January 2nd; every later week follows in
//! 7-day steps. This is not ISO 8601 week numbering.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing a week identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekParseError {
    #[error("Invalid week identifier '{0}': expected YYYY-Www")]
    Format(String),

    #[error("Week number {0} out of range (1-53)")]
    WeekOutOfRange(u32),
}

/// A week identifier such as `2024-W09`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    pub year: i32,
    pub week: u32,
}

impl WeekId {
    /// Create a week identifier, validating the week number
    pub fn new(year: i32, week: u32) -> Result<Self, WeekParseError> {
        if !(1..=53).contains(&week) {
            return Err(WeekParseError::WeekOutOfRange(week));
        }
        Ok(Self { year, week })
    }

    /// Parse `YYYY-Www`
    pub fn parse(s: &str) -> Result<Self, WeekParseError> {
        let trimmed = s.trim();
        let (year_part, week_part) = trimmed
            .split_once("-W")
            .ok_or_else(|| WeekParseError::Format(s.to_string()))?;

        if year_part.len() != 4 || week_part.is_empty() || week_part.len() > 2 {
            return Err(WeekParseError::Format(s.to_string()));
        }

        let year: i32 = year_part
            .parse()
            .map_err(|_| WeekParseError::Format(s.to_string()))?;
        let week: u32 = week_part
            .parse()
            .map_err(|_| WeekParseError::Format(s.to_string()))?;

        Self::new(year, week)
    }

    /// Monday the week starts on
    pub fn start_date(&self) -> NaiveDate {
        week_one_start(self.year) + Duration::days(7 * (i64::from(self.week) - 1))
    }

    /// Last day of the week (start + 6 days)
    pub fn end_date(&self) -> NaiveDate {
        self.start_date() + Duration::days(6)
    }

    /// First instant of the week
    pub fn start(&self) -> NaiveDateTime {
        self.start_date().and_hms_opt(0, 0, 0).unwrap_or_default()
    }

    /// Last instant of the week (end of day, millisecond precision)
    pub fn end(&self) -> NaiveDateTime {
        end_of_day(self.end_date())
    }

    /// Inclusive date window covering the week
    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.start_date(),
            end: self.end_date(),
        }
    }

    /// The week a date falls in
    ///
    /// Dates covered by both the last week of one year and week 1 of the
    /// next resolve to the next year's week 1.
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year();

        if date >= week_one_start(year + 1) {
            return Self {
                year: year + 1,
                week: 1,
            };
        }

        let offset = (date - week_one_start(year)).num_days();
        if offset < 0 {
            let prev = year - 1;
            let prev_offset = (date - week_one_start(prev)).num_days();
            return Self {
                year: prev,
                week: (prev_offset.div_euclid(7) + 1) as u32,
            };
        }

        Self {
            year,
            week: (offset.div_euclid(7) + 1) as u32,
        }
    }
}

/// Start of week 1: January 1st shifted back by `weekday_from_sunday - 1` days
fn week_one_start(year: i32) -> NaiveDate {
    let start_of_year = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
    let day = i64::from(start_of_year.weekday().num_days_from_sunday());
    start_of_year - Duration::days(day - 1)
}

/// 23:59:59.999 on the given date
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default()
}

impl std::fmt::Display for WeekId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl std::str::FromStr for WeekId {
    type Err = WeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WeekId {
    type Error = WeekParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WeekId> for String {
    fn from(value: WeekId) -> Self {
        value.to_string()
    }
}

/// Inclusive calendar-date window supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `days` days ending on (and including) `end`
    ///
    /// A span reaching past the earliest representable date starts there.
    pub fn last_days(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        let start = end
            .checked_sub_signed(Duration::days(span))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// A window whose end precedes its start contains nothing
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        !self.is_empty() && date >= self.start && date <= self.end
    }

    pub fn contains_time(&self, timestamp: &NaiveDateTime) -> bool {
        self.contains(timestamp.date())
    }

    /// Every week identifier the window touches, in order
    pub fn weeks(&self) -> Vec<WeekId> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut weeks = Vec::new();
        let mut current = WeekId::containing(self.start);
        loop {
            weeks.push(current);
            let next_start = current.end_date() + Duration::days(1);
            if next_start > self.end {
                break;
            }
            current = WeekId::containing(next_start);
        }
        weeks
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let week = WeekId::parse("2024-W09").unwrap();
        assert_eq!(week.year, 2024);
        assert_eq!(week.week, 9);
        assert_eq!(week.to_string(), "2024-W09");

        assert_eq!(WeekId::parse("2024-W9").unwrap().week, 9);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            WeekId::parse("2024-09"),
            Err(WeekParseError::Format(_))
        ));
        assert!(matches!(
            WeekId::parse("24-W09"),
            Err(WeekParseError::Format(_))
        ));
        assert!(matches!(
            WeekId::parse("2024-Wxx"),
            Err(WeekParseError::Format(_))
        ));
        assert_eq!(
            WeekId::parse("2024-W54"),
            Err(WeekParseError::WeekOutOfRange(54))
        );
        assert_eq!(
            WeekId::parse("2024-W00"),
            Err(WeekParseError::WeekOutOfRange(0))
        );
    }

    #[test]
    fn test_week_start_is_monday_before_jan_first() {
        // 2024-01-01 is a Monday
        let week = WeekId::parse("2024-W01").unwrap();
        assert_eq!(week.start_date(), date(2024, 1, 1));
        assert_eq!(week.end_date(), date(2024, 1, 7));

        // 2025-01-01 is a Wednesday, so week 1 starts Monday 2024-12-30
        let week = WeekId::parse("2025-W01").unwrap();
        assert_eq!(week.start_date(), date(2024, 12, 30));
        assert_eq!(week.start_date().weekday(), chrono::Weekday::Mon);

        // 2023-01-01 is a Sunday: getDay() = 0 shifts forward one day
        let week = WeekId::parse("2023-W01").unwrap();
        assert_eq!(week.start_date(), date(2023, 1, 2));
    }

    #[test]
    fn test_week_end_is_end_of_day() {
        let week = WeekId::parse("2024-W10").unwrap();
        assert_eq!(week.start_date(), date(2024, 3, 4));
        let end = week.end();
        assert_eq!(end.date(), date(2024, 3, 10));
        assert_eq!(end.time().to_string(), "23:59:59.999");
    }

    #[test]
    fn test_containing_round_trips() {
        let mut day = date(2022, 12, 1);
        while day <= date(2026, 2, 1) {
            let week = WeekId::containing(day);
            assert!(
                week.window().contains(day),
                "{} not inside {} ({})",
                day,
                week,
                week.window()
            );
            day = day + Duration::days(1);
        }
    }

    #[test]
    fn test_containing_prefers_next_year_at_boundary() {
        // 2024-12-30 is in both 2024-W53 and 2025-W01
        assert_eq!(
            WeekId::containing(date(2024, 12, 30)),
            WeekId::parse("2025-W01").unwrap()
        );
        // 2023-01-01 (Sunday) precedes 2023-W01 and belongs to 2022's last week
        let week = WeekId::containing(date(2023, 1, 1));
        assert_eq!(week.year, 2022);
    }

    #[test]
    fn test_window_weeks() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 20));
        let weeks: Vec<String> = window.weeks().iter().map(|w| w.to_string()).collect();
        assert_eq!(weeks, vec!["2024-W09", "2024-W10", "2024-W11", "2024-W12"]);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let window = DateWindow::new(date(2024, 3, 20), date(2024, 3, 1));
        assert!(window.is_empty());
        assert!(!window.contains(date(2024, 3, 10)));
        assert!(window.weeks().is_empty());
    }

    #[test]
    fn test_last_days() {
        let window = DateWindow::last_days(date(2024, 3, 30), 30);
        assert_eq!(window.start, date(2024, 3, 1));
        assert_eq!(window.end, date(2024, 3, 30));
    }

    #[test]
    fn test_last_days_saturates_at_earliest_date() {
        let window = DateWindow::last_days(date(2024, 3, 4), u32::MAX);
        assert_eq!(window.start, NaiveDate::MIN);
        assert_eq!(window.end, date(2024, 3, 4));
        assert!(window.contains(date(1999, 1, 1)));
    }

    #[test]
    fn test_serde_as_string() {
        let week = WeekId::parse("2024-W10").unwrap();
        let json = serde_json::to_string(&week).unwrap();
        assert_eq!(json, "\"2024-W10\"");
        let back: WeekId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, week);
    }
}
