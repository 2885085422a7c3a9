use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::holidays::{DEFAULT_END_YEAR, DEFAULT_START_YEAR};

pub const DEFAULT_TASK_FILE: &str = "tasks.txt";
const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "caltask";

#[derive(Debug)]
pub enum ConfigError {
	Io(PathBuf, std::io::Error),
	TomlDecode(PathBuf, toml::de::Error),
	InvalidYearRange { start: i32, end: i32 },
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigError::Io(path, err) => write!(f, "failed to read {}: {err}", path.display()),
			ConfigError::TomlDecode(path, err) => {
				write!(f, "failed to parse config {}: {err}", path.display())
			}
			ConfigError::InvalidYearRange { start, end } => {
				write!(f, "holiday_start_year {start} is after holiday_end_year {end}")
			}
		}
	}
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub task_file: Option<PathBuf>,
	pub holiday_start_year: i32,
	pub holiday_end_year: i32,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			task_file: None,
			holiday_start_year: DEFAULT_START_YEAR,
			holiday_end_year: DEFAULT_END_YEAR,
		}
	}
}

/// Reads settings from `--config`, `CALTASK_CONFIG` or the per-user config
/// directory. No file means defaults.
pub fn load_settings(cli_path: Option<PathBuf>) -> Result<Settings, ConfigError> {
	let path = cli_path
		.or_else(|| non_empty_env("CALTASK_CONFIG"))
		.unwrap_or_else(|| config_dir().join(CONFIG_FILE));
	load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			log::debug!("no config at {}, using defaults", path.display());
			return Ok(Settings::default());
		}
		Err(err) => return Err(ConfigError::Io(path.to_path_buf(), err)),
	};

	let settings: Settings =
		toml::from_str(&raw).map_err(|err| ConfigError::TomlDecode(path.to_path_buf(), err))?;
	if settings.holiday_start_year > settings.holiday_end_year {
		return Err(ConfigError::InvalidYearRange {
			start: settings.holiday_start_year,
			end: settings.holiday_end_year,
		});
	}
	Ok(settings)
}

/// `--file`, then `CALTASK_FILE`, then the config file, then `tasks.txt`.
pub fn resolve_task_path(cli_path: Option<PathBuf>, settings: &Settings) -> PathBuf {
	cli_path
		.or_else(|| non_empty_env("CALTASK_FILE"))
		.or_else(|| settings.task_file.clone())
		.unwrap_or_else(|| PathBuf::from(DEFAULT_TASK_FILE))
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
	env::var_os(key)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

fn config_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join(APP_DIR);
	}

	PathBuf::from(".caltask")
}
