//! Environment-driven settings.
//!
//! # Responsibility
//! - Collect process settings from environment variables.
//! - Fail fast when grid credentials are required but absent.
//!
//! # Invariants
//! - Lookup is injectable; tests never read the process environment.
//! - Blank values are treated as unset.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MANDARIN_DB_PATH";
pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const ENV_SHEETS_TOKEN: &str = "GOOGLE_SHEETS_TOKEN";
pub const ENV_SHEETS_API_BASE: &str = "GOOGLE_SHEETS_API_BASE";
pub const ENV_LOG_LEVEL: &str = "MANDARIN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MANDARIN_LOG_DIR";
pub const ENV_CHECKER_IDS: &str = "CHECKER_IDS";

const DEFAULT_DB_PATH: &str = "mandarin.sqlite3";
const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is unset or blank.
    Missing(&'static str),
    /// Variable is set but cannot be interpreted.
    Invalid { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "required setting `{key}` is not set"),
            Self::Invalid { key, value } => write!(f, "setting `{key}` has invalid value `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Credentials for the Google Sheets backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsCredentials {
    pub spreadsheet_id: String,
    pub access_token: String,
    pub api_base: String,
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub spreadsheet_id: Option<String>,
    pub sheets_token: Option<String>,
    pub sheets_api_base: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub checker_ids: Vec<i64>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let checker_ids = match get(ENV_CHECKER_IDS) {
            Some(raw) => parse_checker_ids(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            database_path: PathBuf::from(
                get(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            spreadsheet_id: get(ENV_SHEET_ID),
            sheets_token: get(ENV_SHEETS_TOKEN),
            sheets_api_base: get(ENV_SHEETS_API_BASE)
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
            checker_ids,
        })
    }

    /// Whether a spreadsheet is configured at all.
    pub fn has_sheets(&self) -> bool {
        self.spreadsheet_id.is_some()
    }

    /// Grid credentials, or the first missing setting.
    pub fn sheets(&self) -> Result<SheetsCredentials, ConfigError> {
        let spreadsheet_id = self
            .spreadsheet_id
            .clone()
            .ok_or(ConfigError::Missing(ENV_SHEET_ID))?;
        let access_token = self
            .sheets_token
            .clone()
            .ok_or(ConfigError::Missing(ENV_SHEETS_TOKEN))?;
        Ok(SheetsCredentials {
            spreadsheet_id,
            access_token,
            api_base: self.sheets_api_base.clone(),
        })
    }
}

fn parse_checker_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| ConfigError::Invalid {
                key: ENV_CHECKER_IDS,
                value: part.to_string(),
            })
        })
        .collect()
}
