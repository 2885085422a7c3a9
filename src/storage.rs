use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::holidays::month_range;
use crate::parse::parse_iso;

const FIELD_SEPARATOR: char = '|';

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// A non-fatal problem met while reading or writing a task file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        line: String,
    },
    InvalidDate {
        path: PathBuf,
        line_number: usize,
        line: String,
    },
    MissingFile(PathBuf),
    Io {
        path: PathBuf,
        message: String,
    },
    SaveFailed {
        path: PathBuf,
        message: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedLine {
                path,
                line_number,
                line,
            } => write!(
                f,
                "{}:{line_number}: skipping malformed line: {line}",
                path.display()
            ),
            Diagnostic::InvalidDate {
                path,
                line_number,
                line,
            } => write!(
                f,
                "{}:{line_number}: skipping line with invalid date: {line}",
                path.display()
            ),
            Diagnostic::MissingFile(path) => write!(f, "file not found: {}", path.display()),
            Diagnostic::Io { path, message } => {
                write!(f, "error reading {}: {message}", path.display())
            }
            Diagnostic::SaveFailed { path, message } => {
                write!(f, "error saving {}: {message}", path.display())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    /// Lines parsed and merged, counting overwrites of dates already present.
    pub merged: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Date to task table, written through to a `YYYY-MM-DD|description` file on
/// every mutation.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: BTreeMap<NaiveDate, String>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tasks: BTreeMap::new(),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadReport) {
        let mut store = Self::new(path);
        let report = store.load();
        (store, report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Replaces the in-memory table with the backing file's contents.
    pub fn load(&mut self) -> LoadReport {
        self.tasks.clear();
        let mut report = LoadReport::default();
        let path = self.path.clone();
        match fs::File::open(&path) {
            Ok(file) => {
                report.loaded = read_records(&path, file, &mut self.tasks, &mut report.diagnostics);
                log::debug!("loaded {} tasks from {}", report.loaded, path.display());
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("no task file at {}, starting empty", path.display());
            }
            Err(err) => report.diagnostics.push(warn(Diagnostic::Io {
                path,
                message: err.to_string(),
            })),
        }
        report
    }

    /// Merges records from `source` over the current table, then saves.
    pub fn import_merge(&mut self, source: &Path) -> ImportReport {
        let mut report = ImportReport::default();
        match fs::File::open(source) {
            Ok(file) => {
                report.merged = read_records(source, file, &mut self.tasks, &mut report.diagnostics);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                report
                    .diagnostics
                    .push(warn(Diagnostic::MissingFile(source.to_path_buf())));
            }
            Err(err) => report.diagnostics.push(warn(Diagnostic::Io {
                path: source.to_path_buf(),
                message: err.to_string(),
            })),
        }

        if let Err(err) = self.save() {
            report.diagnostics.push(warn(Diagnostic::SaveFailed {
                path: self.path.clone(),
                message: err.to_string(),
            }));
        }
        log::info!("imported {} tasks from {}", report.merged, source.display());
        report
    }

    /// Replaces the backing file atomically: the records go to a sibling
    /// temporary file which is then renamed over the target.
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = staging_path(&self.path);
        let written = write_records(&staging, &self.tasks);
        if let Err(err) = written.and_then(|_| fs::rename(&staging, &self.path)) {
            let _ = fs::remove_file(&staging);
            return Err(StorageError::Io(err));
        }
        log::debug!("saved {} tasks to {}", self.tasks.len(), self.path.display());
        Ok(())
    }

    pub fn add(&mut self, date: NaiveDate, description: impl Into<String>) -> Result<(), StorageError> {
        let description = description.into();
        if description.contains(FIELD_SEPARATOR) || description.contains('\n') {
            log::warn!("task description for {date} contains '|' or a newline and will not reload intact");
        }
        self.tasks.insert(date, description);
        self.save()
    }

    /// Removes the earliest task whose description equals `name` ignoring case.
    /// Returns the date it was stored under.
    pub fn delete_by_name(&mut self, name: &str) -> Result<Option<NaiveDate>, StorageError> {
        let needle = name.to_lowercase();
        let found = self
            .tasks
            .iter()
            .find(|(_, description)| description.to_lowercase() == needle)
            .map(|(date, _)| *date);

        let Some(date) = found else {
            return Ok(None);
        };
        self.tasks.remove(&date);
        self.save()?;
        Ok(Some(date))
    }

    pub fn task_for(&self, date: NaiveDate) -> Option<&str> {
        self.tasks.get(&date).map(String::as_str)
    }

    pub fn has_task(&self, date: NaiveDate) -> bool {
        self.tasks.contains_key(&date)
    }

    pub fn tasks_in_month(&self, year: i32, month: u32) -> impl Iterator<Item = (NaiveDate, &str)> + '_ {
        month_range(&self.tasks, year, month).map(|(date, description)| (*date, description.as_str()))
    }

    pub fn tasks_for_today(&self, today: NaiveDate) -> Option<&str> {
        self.task_for(today)
    }
}

fn warn(diagnostic: Diagnostic) -> Diagnostic {
    log::warn!("{diagnostic}");
    diagnostic
}

/// Parses `date|description` lines into `tasks`, returning how many were stored.
/// Reading stops at the first I/O error; what was read so far is kept.
fn read_records(
    path: &Path,
    file: fs::File,
    tasks: &mut BTreeMap<NaiveDate, String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    let mut stored = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_number = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                diagnostics.push(warn(Diagnostic::Io {
                    path: path.to_path_buf(),
                    message: format!("line {line_number}: {err}"),
                }));
                break;
            }
        };
        let Some((raw_date, description)) = line.split_once(FIELD_SEPARATOR) else {
            diagnostics.push(warn(Diagnostic::MalformedLine {
                path: path.to_path_buf(),
                line_number,
                line,
            }));
            continue;
        };
        let Some(date) = parse_iso(raw_date) else {
            diagnostics.push(warn(Diagnostic::InvalidDate {
                path: path.to_path_buf(),
                line_number,
                line: line.clone(),
            }));
            continue;
        };

        tasks.insert(date, description.to_string());
        stored += 1;
    }
    stored
}

fn write_records(path: &Path, tasks: &BTreeMap<NaiveDate, String>) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    for (date, description) in tasks {
        writeln!(file, "{}{FIELD_SEPARATOR}{description}", date.format("%Y-%m-%d"))?;
    }
    file.sync_all()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
