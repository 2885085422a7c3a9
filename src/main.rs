mod config;
mod holidays;
mod menu;
mod parse;
mod render;
mod rules;
mod storage;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::{load_settings, resolve_task_path, DEFAULT_TASK_FILE};
use crate::holidays::HolidayCalendar;
use crate::menu::run_menu;
use crate::parse::parse_date;
use crate::render::{month_legend, render_month, render_year, validate_month};
use crate::storage::TaskStore;

#[derive(Debug, Parser)]
#[command(name = "caltask", about = "Console calendar with holidays and dated tasks")]
struct Cli {
	/// Task file to read and write (default: tasks.txt)
	#[arg(long, global = true)]
	file: Option<PathBuf>,
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Interactive numbered menu
	Menu,
	/// Month grid, or the whole year when no month is given
	Calendar {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long)]
		month: Option<u32>,
	},
	Add {
		#[arg(long)]
		date: String,
		#[arg(long)]
		task: String,
	},
	Today,
	Month {
		#[arg(long)]
		year: i32,
		#[arg(long)]
		month: u32,
	},
	Delete {
		#[arg(long)]
		name: String,
	},
	/// Merge records from another task file into the current one
	Import {
		#[arg(long)]
		path: Option<PathBuf>,
	},
	/// Holidays of a year, or of one month with --month
	Holidays {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long)]
		month: Option<u32>,
	},
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let settings = load_settings(cli.config)?;
	let task_path = resolve_task_path(cli.file, &settings);
	let today = Local::now().date_naive();

	let holidays = HolidayCalendar::build(settings.holiday_start_year, settings.holiday_end_year);
	for failure in holidays.failures() {
		eprintln!(
			"warning: no holidays for {}: {} ({})",
			failure.year, failure.error, failure.holiday
		);
	}
	if holidays.is_empty() {
		eprintln!("warning: holiday table is empty");
	} else {
		log::debug!("{} holidays available", holidays.len());
	}

	let (mut store, report) = TaskStore::open(&task_path);
	for diagnostic in &report.diagnostics {
		eprintln!("warning: {diagnostic}");
	}
	if store.is_empty() {
		log::info!("task file {} holds no tasks", store.path().display());
	} else {
		log::info!("{} tasks loaded from {}", store.len(), store.path().display());
	}

	match cli.command.unwrap_or(Command::Menu) {
		Command::Menu => {
			let stdin = io::stdin();
			let mut stdout = io::stdout();
			run_menu(&mut stdin.lock(), &mut stdout, &mut store, &holidays, today)?;
		}
		Command::Calendar { year, month } => {
			let year = year.unwrap_or(today.year());
			match month {
				Some(month) => {
					print!("{}", render_month(year, month, &holidays, &store)?);
					print!("{}", month_legend(year, month, &holidays, &store)?);
				}
				None => print!("{}", render_year(year, &holidays, &store)?),
			}
		}
		Command::Add { date, task } => {
			let date = parse_date(&date)?;
			store.add(date, task)?;
			println!("added task for {date}");
		}
		Command::Today => print_today(&store, today),
		Command::Month { year, month } => {
			validate_month(year, month)?;
			let mut found = false;
			for (date, task) in store.tasks_in_month(year, month) {
				println!("{date}: {task}");
				found = true;
			}
			if !found {
				println!("no tasks for {year}-{month:02}");
			}
		}
		Command::Delete { name } => match store.delete_by_name(&name)? {
			Some(date) => println!("deleted task on {date}"),
			None => println!("no task named '{name}'"),
		},
		Command::Import { path } => {
			let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_TASK_FILE));
			let report = store.import_merge(&path);
			for diagnostic in &report.diagnostics {
				eprintln!("warning: {diagnostic}");
			}
			println!("{} tasks imported from '{}'", report.merged, path.display());
		}
		Command::Holidays { year, month } => {
			let year = year.unwrap_or(today.year());
			let rows = match month {
				Some(month) => {
					validate_month(year, month)?;
					holidays.in_month(year, month).collect::<Vec<_>>()
				}
				None => holidays.in_year(year).collect::<Vec<_>>(),
			};
			if rows.is_empty() {
				println!("no holidays known for {year}");
			}
			for (date, name) in rows {
				println!("{date} | {name}");
			}
		}
	}

	Ok(())
}

fn print_today(store: &TaskStore, today: NaiveDate) {
	match store.tasks_for_today(today) {
		Some(task) => println!("{today}: {task}"),
		None => println!("no tasks for today ({today})"),
	}
}
