//! Typed runtime configuration.
//!
//! Every setting is read from the environment once at startup. Each key is
//! also accepted with an `APP_` prefix. Validation (required, default, allowed
//! values) happens here so a bad deployment fails before any batch runs.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "specs-sync";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SYNC_MAX_WORKERS: usize = 15;
const DEFAULT_SYNC_INTERVAL: &str = "1h";
const DEFAULT_REJECT_INTERVAL: &str = "24h";
const DEFAULT_STALE_AFTER_DAYS: i64 = 180;
const DEFAULT_DRAFT_STATUSES: &str = "drafting,braindump";
const DEFAULT_AUTHOR_MIN_LENGTH: usize = 5;

const GOOGLE_ACCESS_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";
const SPECS_ROOT_FOLDER_ID: &str = "SPECS_ROOT_FOLDER_ID";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(String),

    #[error("environment variable {key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!("must be one of development, production (got {other:?})")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub log_level: String,
    pub database_path: PathBuf,
    /// Only commands that call Google require these two.
    pub google_access_token: Option<String>,
    pub root_folder_id: Option<String>,
    pub sync_max_workers: usize,
    pub sync_interval: Duration,
    pub reject_interval: Duration,
    pub stale_after_days: i64,
    pub draft_statuses: Vec<String>,
    pub author_min_length: usize,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let app_env = env.parse_required::<AppEnv>("APP_ENV")?;
        let log_level = env.one_of("LOG_LEVEL", DEFAULT_LOG_LEVEL, LOG_LEVELS)?;
        let database_path = env
            .optional("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let sync_max_workers = env.parse_or("SYNC_MAX_WORKERS", DEFAULT_SYNC_MAX_WORKERS)?;
        if sync_max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_MAX_WORKERS".into(),
                reason: "must be at least 1".into(),
            });
        }

        let sync_interval = env.duration_or("SYNC_INTERVAL", DEFAULT_SYNC_INTERVAL)?;
        let reject_interval = env.duration_or("REJECT_INTERVAL", DEFAULT_REJECT_INTERVAL)?;

        let stale_after_days = env.parse_or("REJECT_STALE_AFTER_DAYS", DEFAULT_STALE_AFTER_DAYS)?;
        if stale_after_days < 0 {
            return Err(ConfigError::Invalid {
                key: "REJECT_STALE_AFTER_DAYS".into(),
                reason: "must not be negative".into(),
            });
        }

        let draft_statuses = parse_status_list(
            &env.optional("REJECT_DRAFT_STATUSES")
                .unwrap_or_else(|| DEFAULT_DRAFT_STATUSES.to_string()),
        );
        if draft_statuses.is_empty() {
            return Err(ConfigError::Invalid {
                key: "REJECT_DRAFT_STATUSES".into(),
                reason: "must name at least one status".into(),
            });
        }

        Ok(Self {
            app_env,
            log_level,
            database_path,
            google_access_token: env.optional(GOOGLE_ACCESS_TOKEN),
            root_folder_id: env.optional(SPECS_ROOT_FOLDER_ID),
            sync_max_workers,
            sync_interval,
            reject_interval,
            stale_after_days,
            draft_statuses,
            author_min_length: env.parse_or("AUTHOR_MIN_LENGTH", DEFAULT_AUTHOR_MIN_LENGTH)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    pub fn access_token(&self) -> Result<&str, ConfigError> {
        self.google_access_token
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(GOOGLE_ACCESS_TOKEN.to_string()))
    }

    pub fn root_folder(&self) -> Result<&str, ConfigError> {
        self.root_folder_id
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(SPECS_ROOT_FOLDER_ID.to_string()))
    }
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_log_filter(level: &str) -> String {
    format!("warn,specs_sync={level}")
}

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

fn default_database_path() -> PathBuf {
    app_data_dir().join("specs.db")
}

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*([smhd])\s*$").unwrap());

/// Parse a duration such as `45s`, `30m`, `1h` or `7d`.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let caps = DURATION_PATTERN.captures(value)?;
    let amount: u64 = caps[1].parse().ok()?;
    let unit = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => 24 * 60 * 60,
    };
    Some(Duration::from_secs(amount.checked_mul(unit)?))
}

/// Split a comma-separated status list into lowercase, non-empty entries.
pub fn parse_status_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        [key.to_string(), format!("APP_{key}")]
            .iter()
            .filter_map(|k| (self.lookup)(k))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn parse_required<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr<Err = String>,
    {
        let raw = self.required(key)?;
        raw.parse().map_err(|reason| ConfigError::Invalid {
            key: key.to_string(),
            reason,
        })
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn one_of(&self, key: &str, default: &str, allowed: &[&str]) -> Result<String, ConfigError> {
        let value = self
            .optional(key)
            .unwrap_or_else(|| default.to_string())
            .to_lowercase();
        if allowed.contains(&value.as_str()) {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: format!("must be one of {}", allowed.join(", ")),
            })
        }
    }

    fn duration_or(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        parse_duration(&raw).ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected <number><s|m|h|d>, got {raw:?}"),
        })
    }
}
