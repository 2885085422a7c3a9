use std::fmt::{Display, Formatter};

use chrono::{Month, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unrecognized date '{}' (try 2025-01-24, 2025 01 24, January 24, 2025 or Jan 24, 2025)",
            self.input
        )
    }
}

impl std::error::Error for DateParseError {}

type Strategy = fn(&str) -> Option<NaiveDate>;

/// Tried in order; the first strategy returning a date wins.
const STRATEGIES: [(&str, Strategy); 5] = [
    ("iso", parse_iso),
    ("spaced", parse_spaced),
    ("positional", parse_positional),
    ("month name", parse_long_month),
    ("month abbreviation", parse_short_month),
];

pub fn parse_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let normalized = raw.trim().replace(['/', '.'], "-");
    for (label, strategy) in STRATEGIES {
        if let Some(date) = strategy(normalized.as_str()) {
            log::debug!("parsed '{raw}' as {label} date {date}");
            return Ok(date);
        }
    }

    Err(DateParseError {
        input: raw.to_string(),
    })
}

/// Strict `YYYY-MM-DD`.
pub fn parse_iso(raw: &str) -> Option<NaiveDate> {
    fixed_width_triplet(raw, '-')
}

fn parse_spaced(raw: &str) -> Option<NaiveDate> {
    fixed_width_triplet(raw, ' ')
}

fn fixed_width_triplet(raw: &str, separator: char) -> Option<NaiveDate> {
    let mut parts = raw.split(separator);
    let year = digits(parts.next()?, 4)?;
    let month = digits(parts.next()?, 2)?;
    let day = digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn digits(part: &str, width: usize) -> Option<u32> {
    if part.len() != width || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_positional(raw: &str) -> Option<NaiveDate> {
    let parts = raw.split_whitespace().collect::<Vec<_>>();
    let [year, month, day] = parts.as_slice() else {
        return None;
    };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_long_month(raw: &str) -> Option<NaiveDate> {
    parse_named_month(raw, |month, token| month.name().eq_ignore_ascii_case(token))
}

fn parse_short_month(raw: &str) -> Option<NaiveDate> {
    parse_named_month(raw, |month, token| {
        month
            .name()
            .get(..3)
            .is_some_and(|abbreviation| abbreviation.eq_ignore_ascii_case(token))
    })
}

/// `<month> D, YYYY` where `matches` decides which spelling of the month is accepted.
fn parse_named_month(raw: &str, matches: impl Fn(Month, &str) -> bool) -> Option<NaiveDate> {
    let parts = raw.split_whitespace().collect::<Vec<_>>();
    let [name, day, year] = parts.as_slice() else {
        return None;
    };

    let month = (1..=12u8)
        .filter_map(|number| Month::try_from(number).ok())
        .find(|month| matches(*month, *name))?;
    let day = day.strip_suffix(',')?;
    if day.is_empty() || day.len() > 2 || !day.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let year = digits(year, 4)?;
    NaiveDate::from_ymd_opt(year as i32, month.number_from_month(), day.parse().ok()?)
}
