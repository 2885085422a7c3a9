use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::DEFAULT_TASK_FILE;
use crate::holidays::HolidayCalendar;
use crate::parse::parse_date;
use crate::render::{month_legend, render_month, validate_month};
use crate::storage::TaskStore;

const MENU: &str = "
1. View Calendar
2. Add Task
3. View Today's Tasks
4. View Tasks by Month
5. Delete Task by Name
6. Exit
7. Import Tasks from .txt file (merge)";

/// Numbered console menu over the task store. Returns when the user picks
/// exit or the input ends.
pub fn run_menu<R: BufRead, W: Write>(
	input: &mut R,
	output: &mut W,
	store: &mut TaskStore,
	holidays: &HolidayCalendar,
	today: NaiveDate,
) -> io::Result<()> {
	loop {
		writeln!(output, "{MENU}")?;
		let Some(choice) = prompt_number(input, output, "Enter your choice: ")? else {
			return Ok(());
		};

		let keep_going = match choice {
			1 => view_calendar(input, output, store, holidays)?,
			2 => add_task(input, output, store)?,
			3 => {
				match store.tasks_for_today(today) {
					Some(task) => writeln!(output, "Today's task ({today}): {task}")?,
					None => writeln!(output, "No tasks for today.")?,
				}
				true
			}
			4 => view_month_tasks(input, output, store)?,
			5 => delete_task(input, output, store)?,
			6 => {
				if let Err(err) = store.save() {
					writeln!(output, "Could not save tasks: {err}")?;
				}
				writeln!(output, "Exiting program...")?;
				return Ok(());
			}
			7 => import_tasks(input, output, store)?,
			_ => {
				writeln!(output, "Invalid choice. Please try again.")?;
				true
			}
		};
		if !keep_going {
			return Ok(());
		}
	}
}

fn view_calendar<R: BufRead, W: Write>(
	input: &mut R,
	output: &mut W,
	store: &TaskStore,
	holidays: &HolidayCalendar,
) -> io::Result<bool> {
	let Some((year, month)) = prompt_year_month(input, output)? else {
		return Ok(false);
	};
	match render_month(year, month, holidays, store) {
		Ok(grid) => {
			write!(output, "\n{grid}")?;
			if let Ok(legend) = month_legend(year, month, holidays, store) {
				write!(output, "{legend}")?;
			}
		}
		Err(err) => writeln!(output, "Error displaying calendar: {err}")?,
	}
	Ok(true)
}

fn add_task<R: BufRead, W: Write>(input: &mut R, output: &mut W, store: &mut TaskStore) -> io::Result<bool> {
	let date = loop {
		let Some(raw) = prompt_line(
			input,
			output,
			"Enter date (e.g., 2025-01-24, 2025 01 24, Jan 24, 2025, etc.): ",
		)?
		else {
			return Ok(false);
		};
		match parse_date(&raw) {
			Ok(date) => break date,
			Err(err) => writeln!(output, "{err}")?,
		}
	};
	let Some(task) = prompt_line(input, output, "Enter task: ")? else {
		return Ok(false);
	};

	match store.add(date, task) {
		Ok(()) => writeln!(output, "Task added successfully.")?,
		Err(err) => writeln!(output, "Task added but not saved: {err}")?,
	}
	Ok(true)
}

fn view_month_tasks<R: BufRead, W: Write>(
	input: &mut R,
	output: &mut W,
	store: &TaskStore,
) -> io::Result<bool> {
	let Some((year, month)) = prompt_year_month(input, output)? else {
		return Ok(false);
	};
	let name = match validate_month(year, month) {
		Ok((_, name)) => name,
		Err(err) => {
			writeln!(output, "Error listing tasks: {err}")?;
			return Ok(true);
		}
	};

	writeln!(output, "\n===== Tasks for {} {year} =====", name.name())?;
	let mut found = false;
	for (date, task) in store.tasks_in_month(year, month) {
		writeln!(output, "{date}: {task}")?;
		found = true;
	}
	if !found {
		writeln!(output, "No tasks for this month.")?;
	}
	Ok(true)
}

fn delete_task<R: BufRead, W: Write>(input: &mut R, output: &mut W, store: &mut TaskStore) -> io::Result<bool> {
	let Some(name) = prompt_line(input, output, "Enter the name of the task to delete: ")? else {
		return Ok(false);
	};
	match store.delete_by_name(&name) {
		Ok(Some(date)) => writeln!(output, "Task deleted successfully ({date}).")?,
		Ok(None) => writeln!(output, "No task found with that name.")?,
		Err(err) => writeln!(output, "Task deleted but not saved: {err}")?,
	}
	Ok(true)
}

fn import_tasks<R: BufRead, W: Write>(input: &mut R, output: &mut W, store: &mut TaskStore) -> io::Result<bool> {
	let Some(raw) = prompt_line(
		input,
		output,
		&format!("Enter file path to import (default: {DEFAULT_TASK_FILE}): "),
	)?
	else {
		return Ok(false);
	};
	let path = if raw.is_empty() {
		PathBuf::from(DEFAULT_TASK_FILE)
	} else {
		PathBuf::from(raw)
	};

	let report = store.import_merge(&path);
	for diagnostic in &report.diagnostics {
		writeln!(output, "warning: {diagnostic}")?;
	}
	writeln!(output, "{} tasks imported from '{}'", report.merged, path.display())?;
	Ok(true)
}

fn prompt_year_month<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<(i32, u32)>> {
	let Some(year) = prompt_number(input, output, "Enter year: ")? else {
		return Ok(None);
	};
	loop {
		let Some(month) = prompt_number(input, output, "Enter month (1-12): ")? else {
			return Ok(None);
		};
		match u32::try_from(month) {
			Ok(valid @ 1..=12) => return Ok(Some((year, valid))),
			_ => writeln!(output, "Invalid month {month}. Must be 1-12.")?,
		}
	}
}

/// Re-prompts until an integer is entered; `None` at end of input.
fn prompt_number<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<Option<i32>> {
	loop {
		let Some(raw) = prompt_line(input, output, prompt)? else {
			return Ok(None);
		};
		match raw.parse() {
			Ok(value) => return Ok(Some(value)),
			Err(_) => writeln!(output, "Invalid number. Please try again.")?,
		}
	}
}

fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<Option<String>> {
	write!(output, "{prompt}")?;
	output.flush()?;
	let mut line = String::new();
	if input.read_line(&mut line)? == 0 {
		return Ok(None);
	}
	Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::io::Cursor;

	use chrono::NaiveDate;
	use tempfile::TempDir;

	use crate::holidays::HolidayCalendar;
	use crate::storage::TaskStore;

	use super::run_menu;

	fn d(year: i32, month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(year, month, day).unwrap()
	}

	fn run_script(store: &mut TaskStore, script: &str, today: NaiveDate) -> String {
		let holidays = HolidayCalendar::build(2025, 2025);
		let mut input = Cursor::new(script.as_bytes().to_vec());
		let mut output = Vec::new();
		run_menu(&mut input, &mut output, store, &holidays, today).expect("menu should run");
		String::from_utf8(output).expect("output is utf-8")
	}

	#[test]
	fn adds_then_lists_and_deletes() {
		let dir = TempDir::new().unwrap();
		let mut store = TaskStore::new(dir.path().join("tasks.txt"));
		let script = "2\nbogus\nJan 24, 2025\nPay rent\n3\n4\n2025\n1\n5\nPAY RENT\n6\n";

		let out = run_script(&mut store, script, d(2025, 1, 24));
		assert!(out.contains("unrecognized date 'bogus'"));
		assert!(out.contains("Task added successfully."));
		assert!(out.contains("Today's task (2025-01-24): Pay rent"));
		assert!(out.contains("===== Tasks for January 2025 =====\n2025-01-24: Pay rent"));
		assert!(out.contains("Task deleted successfully (2025-01-24)."));
		assert!(out.ends_with("Exiting program...\n"));
		assert!(store.is_empty());
	}

	#[test]
	fn shows_calendar_and_rejects_bad_input() {
		let dir = TempDir::new().unwrap();
		let mut store = TaskStore::new(dir.path().join("tasks.txt"));
		let script = "x\n9\n1\n2025\n7\n1\n2025\n13\n-3\n0\n";

		let out = run_script(&mut store, script, d(2025, 7, 2));
		assert!(out.contains("Invalid number. Please try again."));
		assert!(out.contains("Invalid choice. Please try again."));
		assert!(out.contains("===== July 2025 ====="));
		assert!(out.contains("[ 1]"));
		assert!(out.contains("2025-07-01: Canada Day (holiday)"));
		assert!(out.contains("Invalid month 13. Must be 1-12."));
		assert!(out.contains("Invalid month -3. Must be 1-12."));
		assert!(out.contains("Invalid month 0. Must be 1-12."));
	}

	#[test]
	fn reports_out_of_range_year() {
		let dir = TempDir::new().unwrap();
		let mut store = TaskStore::new(dir.path().join("tasks.txt"));
		let script = format!("1\n{}\n12\n4\n{}\n12\n", i32::MAX, i32::MAX);

		let out = run_script(&mut store, &script, d(2025, 1, 1));
		assert!(out.contains(&format!(
			"Error displaying calendar: {}-12 is outside the supported calendar range",
			i32::MAX
		)));
		assert!(out.contains("Error listing tasks:"));
	}

	#[test]
	fn imports_from_named_file() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("more.txt");
		fs::write(&source, "2025-03-01|Taxes\n").unwrap();
		let mut store = TaskStore::new(dir.path().join("tasks.txt"));
		let script = format!("7\n{}\n3\n", source.display());

		let out = run_script(&mut store, &script, d(2025, 3, 2));
		assert!(out.contains("1 tasks imported from"));
		assert!(out.contains("No tasks for today."));
		assert_eq!(store.task_for(d(2025, 3, 1)), Some("Taxes"));
	}
}
