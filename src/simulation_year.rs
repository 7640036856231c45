use anyhow::{anyhow, Context};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const HOURS_PER_DAY: usize = 24;
pub const MINUTES_PER_HOUR: usize = 60;
pub const MINUTES_PER_DAY: usize = HOURS_PER_DAY * MINUTES_PER_HOUR;
pub const DAYS_PER_YEAR: usize = 365;
pub const MINUTES_PER_YEAR: usize = DAYS_PER_YEAR * MINUTES_PER_DAY;

// vacancy dates are month-day only, so anchor parsing in a fixed non-leap year
const PARSE_YEAR: i32 = 2007;

/// A configured date range during which occupant-driven schedules are forced
/// to zero. Days are zero-based ordinals within a 365-day year; a window whose
/// start falls after its end wraps over the year boundary.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct VacancyWindow {
    start_day: usize,
    end_day: usize,
}

impl VacancyWindow {
    pub fn new(start_day: usize, end_day: usize) -> anyhow::Result<Self> {
        if start_day >= DAYS_PER_YEAR || end_day >= DAYS_PER_YEAR {
            return Err(anyhow!(
                "vacancy days ({start_day}, {end_day}) must fall within a {DAYS_PER_YEAR}-day year"
            ));
        }
        Ok(Self { start_day, end_day })
    }

    /// Parse a window from month-day strings such as "Jun 1" / "Jun 14".
    /// Both endpoints are inclusive.
    pub fn from_date_strings(start: &str, end: &str) -> anyhow::Result<Self> {
        Self::new(day_of_year(start)?, day_of_year(end)?)
    }

    pub fn contains_day(&self, day_of_year: usize) -> bool {
        if self.start_day <= self.end_day {
            (self.start_day..=self.end_day).contains(&day_of_year)
        } else {
            // window wraps the year end, e.g. Dec 15 - Jan 5
            day_of_year >= self.start_day || day_of_year <= self.end_day
        }
    }
}

fn day_of_year(month_day: &str) -> anyhow::Result<usize> {
    let date = NaiveDate::parse_from_str(
        &format!("{month_day} {PARSE_YEAR}"),
        "%b %e %Y",
    )
    .with_context(|| format!("could not parse '{month_day}' as a month-day date like 'Jun 1'"))?;
    Ok(date.ordinal0() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("Jan 1", 0)]
    #[case("Feb 28", 58)]
    #[case("Mar 1", 59)]
    #[case("Dec 31", 364)]
    fn test_day_of_year(#[case] date: &str, #[case] expected: usize) {
        assert_eq!(day_of_year(date).unwrap(), expected);
    }

    #[rstest]
    fn test_day_of_year_rejects_garbage() {
        assert!(day_of_year("Notamonth 1").is_err());
    }

    #[rstest]
    fn test_window_contains_days_inclusive() {
        let window = VacancyWindow::from_date_strings("Jun 1", "Jun 14").unwrap();
        assert!(!window.contains_day(150));
        assert!(window.contains_day(151));
        assert!(window.contains_day(164));
        assert!(!window.contains_day(165));
    }

    #[rstest]
    fn test_window_wrapping_year_end() {
        let window = VacancyWindow::from_date_strings("Dec 15", "Jan 5").unwrap();
        assert!(window.contains_day(348));
        assert!(window.contains_day(364));
        assert!(window.contains_day(0));
        assert!(window.contains_day(4));
        assert!(!window.contains_day(5));
        assert!(!window.contains_day(200));
    }

    #[rstest]
    fn test_window_rejects_out_of_range_days() {
        assert!(VacancyWindow::new(0, 365).is_err());
    }
}
