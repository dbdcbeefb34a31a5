// Date filters for the report charts. All shortcuts are anchored on
// "yesterday", the last complete day, and use Sunday-zero weekday numbering.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::DashboardError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_SPAN_DAYS: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeShortcut {
    /// The seven days ending yesterday.
    Default,
    Yesterday,
    ThisWeek,
    LastWeek,
}

/// An inclusive `[start, end]` day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashboardError> {
        if start > end {
            return Err(DashboardError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses user-entered `yyyy-MM-dd` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, DashboardError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn for_shortcut(shortcut: RangeShortcut, today: NaiveDate) -> Self {
        let yesterday = minus(today, 1);
        let weekday = u64::from(yesterday.weekday().num_days_from_sunday());
        let (start, end) = match shortcut {
            RangeShortcut::Default => (minus(yesterday, DEFAULT_SPAN_DAYS), yesterday),
            RangeShortcut::Yesterday => (yesterday, yesterday),
            RangeShortcut::ThisWeek => {
                // On a Sunday this lands on the following Monday.
                let begin = plus(minus(yesterday, weekday), 1);
                (begin, plus(begin, DEFAULT_SPAN_DAYS))
            }
            RangeShortcut::LastWeek => {
                let end = minus(yesterday, weekday);
                (minus(end, DEFAULT_SPAN_DAYS), end)
            }
        };
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `startDate` / `endDate` query parameters for the report endpoint.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("startDate", self.start.format(DATE_FORMAT).to_string()),
            ("endDate", self.end.format(DATE_FORMAT).to_string()),
        ]
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, DashboardError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DashboardError::InvalidDate {
        value: value.to_string(),
    })
}

fn minus(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn plus(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    // 2018-05-10 is a Thursday, so yesterday is Wednesday (weekday 3).
    const TODAY: &str = "2018-05-10";

    #[test]
    fn default_is_week_ending_yesterday() {
        let range = DateRange::for_shortcut(RangeShortcut::Default, day(TODAY));
        assert_eq!(range.to_string(), "2018-05-03..2018-05-09");
    }

    #[test]
    fn yesterday_is_a_single_day() {
        let range = DateRange::for_shortcut(RangeShortcut::Yesterday, day(TODAY));
        assert_eq!((range.start(), range.end()), (day("2018-05-09"), day("2018-05-09")));
    }

    #[test]
    fn this_week_runs_monday_to_sunday() {
        let range = DateRange::for_shortcut(RangeShortcut::ThisWeek, day(TODAY));
        assert_eq!(range.to_string(), "2018-05-07..2018-05-13");
    }

    #[test]
    fn last_week_ends_on_sunday() {
        let range = DateRange::for_shortcut(RangeShortcut::LastWeek, day(TODAY));
        assert_eq!(range.to_string(), "2018-04-30..2018-05-06");
    }

    #[test]
    fn this_week_when_yesterday_was_sunday() {
        // Today Monday 2018-05-07, yesterday Sunday 2018-05-06.
        let range = DateRange::for_shortcut(RangeShortcut::ThisWeek, day("2018-05-07"));
        assert_eq!(range.to_string(), "2018-05-07..2018-05-13");
        let last = DateRange::for_shortcut(RangeShortcut::LastWeek, day("2018-05-07"));
        assert_eq!(last.to_string(), "2018-04-30..2018-05-06");
    }

    #[test]
    fn parse_rejects_inverted_and_garbage() {
        assert!(matches!(
            DateRange::parse("2018-05-09", "2018-05-01"),
            Err(DashboardError::InvertedRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("05/01/2018", "2018-05-09"),
            Err(DashboardError::InvalidDate { .. })
        ));
    }

    #[test]
    fn query_pairs_use_endpoint_names() {
        let range = DateRange::parse("2018-05-01", "2018-05-09").unwrap();
        assert_eq!(
            range.query_pairs(),
            [("startDate", "2018-05-01".to_string()), ("endDate", "2018-05-09".to_string())]
        );
    }
}
