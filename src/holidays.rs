use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::rules::{self, RuleError};

pub const DEFAULT_START_YEAR: i32 = 2000;
pub const DEFAULT_END_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy)]
pub enum HolidayRule {
    Fixed { month: u32, day: u32 },
    First { month: u32, weekday: Weekday },
    Nth { month: u32, n: u32, weekday: Weekday },
    OnOrBefore { month: u32, day: u32, weekday: Weekday },
}

impl HolidayRule {
    pub fn resolve(self, year: i32) -> Result<NaiveDate, RuleError> {
        match self {
            HolidayRule::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(RuleError::InvalidDate { year, month, day }),
            HolidayRule::First { month, weekday } => rules::first_weekday(year, month, weekday),
            HolidayRule::Nth { month, n, weekday } => rules::nth_weekday(year, month, n, weekday),
            HolidayRule::OnOrBefore { month, day, weekday } => {
                rules::last_on_or_before(year, month, day, weekday)
            }
        }
    }
}

/// Statutory holidays observed in Ontario.
pub const HOLIDAY_RULES: [(&str, HolidayRule); 9] = [
    ("New Year's Day", HolidayRule::Fixed { month: 1, day: 1 }),
    (
        "Family Day",
        HolidayRule::Nth {
            month: 2,
            n: 3,
            weekday: Weekday::Mon,
        },
    ),
    (
        "Victoria Day",
        HolidayRule::OnOrBefore {
            month: 5,
            day: 24,
            weekday: Weekday::Mon,
        },
    ),
    ("Canada Day", HolidayRule::Fixed { month: 7, day: 1 }),
    (
        "Labour Day",
        HolidayRule::First {
            month: 9,
            weekday: Weekday::Mon,
        },
    ),
    (
        "Thanksgiving",
        HolidayRule::Nth {
            month: 10,
            n: 2,
            weekday: Weekday::Mon,
        },
    ),
    ("Remembrance Day", HolidayRule::Fixed { month: 11, day: 11 }),
    ("Christmas Day", HolidayRule::Fixed { month: 12, day: 25 }),
    ("Boxing Day", HolidayRule::Fixed { month: 12, day: 26 }),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearFailure {
    pub year: i32,
    pub holiday: &'static str,
    pub error: RuleError,
}

/// Read-only date to holiday-name table, materialized once for a window of years.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, &'static str>,
    failures: Vec<YearFailure>,
}

impl HolidayCalendar {
    pub fn build(start_year: i32, end_year: i32) -> Self {
        let mut calendar = Self::default();
        for year in start_year..=end_year {
            match resolve_year(year) {
                Ok(dates) => {
                    for (date, name) in dates {
                        calendar.holidays.insert(date, name);
                    }
                }
                Err(failure) => {
                    log::warn!(
                        "skipping holidays for {}: {} ({})",
                        failure.year,
                        failure.error,
                        failure.holiday
                    );
                    calendar.failures.push(failure);
                }
            }
        }
        log::debug!("built {} holidays for {start_year}..={end_year}", calendar.len());
        calendar
    }

    pub fn name_for(&self, date: NaiveDate) -> Option<&'static str> {
        self.holidays.get(&date).copied()
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Holidays falling in the given month, earliest first.
    pub fn in_month(
        &self,
        year: i32,
        month: u32,
    ) -> impl Iterator<Item = (NaiveDate, &'static str)> + '_ {
        month_range(&self.holidays, year, month).map(|(date, name)| (*date, *name))
    }

    pub fn in_year(&self, year: i32) -> impl Iterator<Item = (NaiveDate, &'static str)> + '_ {
        self.holidays
            .iter()
            .filter(move |(date, _)| date.year() == year)
            .map(|(date, name)| (*date, *name))
    }

    pub fn failures(&self) -> &[YearFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

/// A year either yields every rule or nothing at all.
fn resolve_year(year: i32) -> Result<Vec<(NaiveDate, &'static str)>, YearFailure> {
    HOLIDAY_RULES
        .iter()
        .map(|(name, rule)| {
            rule.resolve(year)
                .map(|date| (date, *name))
                .map_err(|error| YearFailure {
                    year,
                    holiday: *name,
                    error,
                })
        })
        .collect()
}

/// Entries of a date-keyed map that fall inside one calendar month. An invalid
/// year/month yields an empty range.
pub(crate) fn month_range<V>(
    map: &BTreeMap<NaiveDate, V>,
    year: i32,
    month: u32,
) -> impl Iterator<Item = (&NaiveDate, &V)> {
    let bounds = NaiveDate::from_ymd_opt(year, month, 1).and_then(|start| {
        let days = rules::days_in_month(year, month).ok()?;
        let end = NaiveDate::from_ymd_opt(year, month, days)?;
        Some((Bound::Included(start), Bound::Included(end)))
    });
    bounds.into_iter().flat_map(move |range| map.range(range))
}
