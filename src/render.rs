use std::fmt::{Display, Formatter, Write};

use chrono::{Datelike, Month, NaiveDate};

use crate::holidays::HolidayCalendar;
use crate::rules;
use crate::storage::TaskStore;

const WEEK_HEADER: &str = "Sun Mon Tue Wed Thu Fri Sat";
const BLANK_CELL: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    InvalidMonth(u32),
    OutOfRange { year: i32, month: u32 },
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::InvalidMonth(month) => write!(f, "invalid month {month}, must be 1-12"),
            RenderError::OutOfRange { year, month } => {
                write!(f, "{year}-{month:02} is outside the supported calendar range")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// First day of the month and its name, or why the pair cannot be shown.
pub(crate) fn validate_month(year: i32, month: u32) -> Result<(NaiveDate, Month), RenderError> {
    let name = u8::try_from(month)
        .ok()
        .and_then(|number| Month::try_from(number).ok())
        .ok_or(RenderError::InvalidMonth(month))?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(RenderError::OutOfRange { year, month })?;
    Ok((first, name))
}

/// Month grid with holidays shown as `[dd]` and task days as `*dd*`. A day that
/// is both is shown as a holiday.
pub fn render_month(
    year: i32,
    month: u32,
    holidays: &HolidayCalendar,
    tasks: &TaskStore,
) -> Result<String, RenderError> {
    let (first, name) = validate_month(year, month)?;
    let days = rules::days_in_month(year, month).map_err(|_| RenderError::OutOfRange { year, month })?;
    // Sunday = 1 .. Saturday = 7
    let first_weekday = first.weekday().number_from_monday() % 7 + 1;

    let mut out = String::new();
    let _ = writeln!(out, "===== {} {year} =====", name.name());
    let _ = writeln!(out, "{WEEK_HEADER}");
    for _ in 1..first_weekday {
        out.push_str(BLANK_CELL);
    }

    for day in 1..=days {
        let date = first.with_day(day).ok_or(RenderError::OutOfRange { year, month })?;
        let _ = if holidays.is_holiday(date) {
            write!(out, "[{day:2}]")
        } else if tasks.has_task(date) {
            write!(out, "*{day:2}*")
        } else {
            write!(out, "{day:3} ")
        };

        if (day + first_weekday - 1) % 7 == 0 {
            out.push('\n');
        }
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

pub fn render_year(year: i32, holidays: &HolidayCalendar, tasks: &TaskStore) -> Result<String, RenderError> {
    let months = (1..=12)
        .map(|month| render_month(year, month, holidays, tasks))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(months.join("\n"))
}

/// One `YYYY-MM-DD: text` line per holiday and task of the month, in date
/// order. Holiday lines are suffixed with `(holiday)` and come before a task on
/// the same date.
pub fn month_legend(
    year: i32,
    month: u32,
    holidays: &HolidayCalendar,
    tasks: &TaskStore,
) -> Result<String, RenderError> {
    let (first, _) = validate_month(year, month)?;
    let days = rules::days_in_month(year, month).map_err(|_| RenderError::OutOfRange { year, month })?;

    let mut out = String::new();
    for date in first.iter_days().take(days as usize) {
        if let Some(name) = holidays.name_for(date) {
            let _ = writeln!(out, "{date}: {name} (holiday)");
        }
        if let Some(description) = tasks.task_for(date) {
            let _ = writeln!(out, "{date}: {description}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::holidays::HolidayCalendar;
    use crate::storage::TaskStore;

    use super::{month_legend, render_month, render_year, validate_month, RenderError};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn january_2025_starts_on_wednesday() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::build(2025, 2025);
        let mut tasks = TaskStore::new(dir.path().join("tasks.txt"));
        tasks.add(d(2025, 1, 24), "Pay rent").unwrap();

        let grid = render_month(2025, 1, &holidays, &tasks).unwrap();
        let lines = grid.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "===== January 2025 =====");
        assert_eq!(lines[1], "Sun Mon Tue Wed Thu Fri Sat");
        assert_eq!(lines[2], "            [ 1]  2   3   4 ");
        assert_eq!(lines[3], "  5   6   7   8   9  10  11 ");
        assert_eq!(lines[5], " 19  20  21  22  23 *24* 25 ");
        assert_eq!(lines[6], " 26  27  28  29  30  31 ");
        assert_eq!(lines.len(), 7);
        assert!(grid.ends_with(" 31 \n"));
    }

    #[test]
    fn holiday_wins_over_task() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::build(2025, 2025);
        let mut tasks = TaskStore::new(dir.path().join("tasks.txt"));
        tasks.add(d(2025, 12, 25), "Visit family").unwrap();

        let grid = render_month(2025, 12, &holidays, &tasks).unwrap();
        assert!(grid.contains("[25]"));
        assert!(!grid.contains("*25*"));
    }

    #[test]
    fn month_ending_on_saturday_has_single_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::default();
        let tasks = TaskStore::new(dir.path().join("tasks.txt"));

        // May 2025 ends on Saturday the 31st.
        let grid = render_month(2025, 5, &holidays, &tasks).unwrap();
        assert!(grid.ends_with(" 31 \n"));
        assert!(!grid.ends_with("\n\n"));
        // February 2015 starts on Sunday: no leading blanks.
        let grid = render_month(2015, 2, &holidays, &tasks).unwrap();
        assert_eq!(grid.lines().nth(2), Some("  1   2   3   4   5   6   7 "));
    }

    #[test]
    fn rejects_bad_month_and_year() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::default();
        let tasks = TaskStore::new(dir.path().join("tasks.txt"));

        assert_eq!(
            render_month(2025, 13, &holidays, &tasks),
            Err(RenderError::InvalidMonth(13))
        );
        assert_eq!(
            render_month(2025, 0, &holidays, &tasks),
            Err(RenderError::InvalidMonth(0))
        );
        assert_eq!(
            render_month(i32::MAX, 1, &holidays, &tasks),
            Err(RenderError::OutOfRange {
                year: i32::MAX,
                month: 1
            })
        );
    }

    #[test]
    fn year_view_has_twelve_months() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::build(2025, 2025);
        let tasks = TaskStore::new(dir.path().join("tasks.txt"));

        let year = render_year(2025, &holidays, &tasks).unwrap();
        assert_eq!(year.matches("=====").count(), 24);
        assert!(year.contains("===== December 2025 ====="));
        assert!(year.contains("\n\n===== February 2025 ====="));
    }

    #[test]
    fn legend_lists_month_entries_in_date_order() {
        let dir = TempDir::new().unwrap();
        let holidays = HolidayCalendar::build(2025, 2025);
        let mut tasks = TaskStore::new(dir.path().join("tasks.txt"));
        tasks.add(d(2025, 2, 20), "Dentist").unwrap();
        tasks.add(d(2025, 2, 17), "Skating").unwrap();
        tasks.add(d(2025, 3, 1), "Next month").unwrap();

        let legend = month_legend(2025, 2, &holidays, &tasks).unwrap();
        assert_eq!(
            legend,
            "2025-02-17: Family Day (holiday)\n2025-02-17: Skating\n2025-02-20: Dentist\n"
        );
        assert_eq!(
            month_legend(2025, 13, &holidays, &tasks),
            Err(RenderError::InvalidMonth(13))
        );
    }

    #[test]
    fn validates_month_without_rendering() {
        let (first, name) = validate_month(2025, 2).unwrap();
        assert_eq!(first, d(2025, 2, 1));
        assert_eq!(name.name(), "February");
        assert_eq!(validate_month(2025, 0), Err(RenderError::InvalidMonth(0)));
        assert_eq!(
            validate_month(i32::MAX, 12),
            Err(RenderError::OutOfRange {
                year: i32::MAX,
                month: 12
            })
        );
    }
}
