use std::fmt::{Display, Formatter};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    InvalidDate {
        year: i32,
        month: u32,
        day: u32,
    },
    NoSuchOccurrence {
        year: i32,
        month: u32,
        n: u32,
        weekday: Weekday,
    },
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::InvalidDate { year, month, day } => {
                write!(f, "invalid date {year:04}-{month:02}-{day:02}")
            }
            RuleError::NoSuchOccurrence {
                year,
                month,
                n,
                weekday,
            } => write!(f, "no occurrence #{n} of {weekday} in {year:04}-{month:02}"),
        }
    }
}

impl std::error::Error for RuleError {}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, RuleError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(RuleError::InvalidDate { year, month, day })
}

/// Days between `from` and the next `to` (0 when equal), walking forward.
fn weekday_distance(from: Weekday, to: Weekday) -> u32 {
    (to.num_days_from_monday() + 7 - from.num_days_from_monday()) % 7
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, RuleError> {
    let first = date(year, month, 1)?;
    let first_of_next = if month == 12 {
        date(year + 1, 1, 1)
    } else {
        date(year, month + 1, 1)
    };
    match first_of_next {
        Ok(next) => Ok((next - first).num_days() as u32),
        // December of the last representable year.
        Err(_) => Ok(31),
    }
}

/// The `n`-th (1-based) occurrence of `weekday` in the given month.
pub fn nth_weekday(year: i32, month: u32, n: u32, weekday: Weekday) -> Result<NaiveDate, RuleError> {
    let first = date(year, month, 1)?;
    let missing = RuleError::NoSuchOccurrence {
        year,
        month,
        n,
        weekday,
    };
    if n == 0 {
        return Err(missing);
    }

    let day = (n - 1)
        .checked_mul(7)
        .and_then(|weeks| weeks.checked_add(1 + weekday_distance(first.weekday(), weekday)))
        .ok_or_else(|| missing.clone())?;
    if day > days_in_month(year, month)? {
        return Err(missing);
    }
    date(year, month, day)
}

pub fn first_weekday(year: i32, month: u32, weekday: Weekday) -> Result<NaiveDate, RuleError> {
    nth_weekday(year, month, 1, weekday)
}

/// Closest date on or before `year-month-day` that falls on `weekday`.
pub fn last_on_or_before(
    year: i32,
    month: u32,
    day: u32,
    weekday: Weekday,
) -> Result<NaiveDate, RuleError> {
    let anchor = date(year, month, day)?;
    let back = weekday_distance(weekday, anchor.weekday());
    anchor
        .checked_sub_signed(Duration::days(back.into()))
        .ok_or(RuleError::InvalidDate { year, month, day })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::{days_in_month, first_weekday, last_on_or_before, nth_weekday, RuleError};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn finds_nth_weekday_of_month() {
        assert_eq!(nth_weekday(2025, 2, 3, Weekday::Mon).unwrap(), d(2025, 2, 17));
        assert_eq!(nth_weekday(2025, 10, 2, Weekday::Mon).unwrap(), d(2025, 10, 13));
        // September 2025 starts on a Monday.
        assert_eq!(first_weekday(2025, 9, Weekday::Mon).unwrap(), d(2025, 9, 1));
        assert_eq!(nth_weekday(2024, 2, 5, Weekday::Thu).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn rejects_occurrences_past_month_end() {
        let err = nth_weekday(2025, 2, 5, Weekday::Mon).unwrap_err();
        assert!(matches!(err, RuleError::NoSuchOccurrence { n: 5, .. }));
        assert!(nth_weekday(2025, 2, 0, Weekday::Mon).is_err());
        assert!(matches!(
            nth_weekday(2025, 2, u32::MAX, Weekday::Mon),
            Err(RuleError::NoSuchOccurrence { n: u32::MAX, .. })
        ));
        assert!(matches!(
            nth_weekday(2025, 2, u32::MAX / 7 + 1, Weekday::Sun),
            Err(RuleError::NoSuchOccurrence { .. })
        ));
        assert!(matches!(
            nth_weekday(2025, 13, 1, Weekday::Mon),
            Err(RuleError::InvalidDate { month: 13, .. })
        ));
    }

    #[test]
    fn scans_backward_to_matching_weekday() {
        // May 24, 2025 is a Saturday.
        assert_eq!(last_on_or_before(2025, 5, 24, Weekday::Mon).unwrap(), d(2025, 5, 19));
        // May 24, 2027 is itself a Monday.
        assert_eq!(last_on_or_before(2027, 5, 24, Weekday::Mon).unwrap(), d(2027, 5, 24));
        assert_eq!(last_on_or_before(2025, 3, 1, Weekday::Fri).unwrap(), d(2025, 2, 28));
        assert!(last_on_or_before(2025, 2, 30, Weekday::Mon).is_err());
    }

    #[test]
    fn counts_month_lengths() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28);
        assert_eq!(days_in_month(2025, 12).unwrap(), 31);
        assert_eq!(days_in_month(2025, 4).unwrap(), 30);
        assert!(days_in_month(2025, 0).is_err());
    }
}
