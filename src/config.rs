//! Application-level configuration loading for the polling backend.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_POLL_BACK_CONFIG_PATH";

/// Display name reserved for the single teacher account.
const DEFAULT_TEACHER_NAME: &str = "Teacher";
/// Number of messages returned by the recent-history chat endpoint.
const DEFAULT_CHAT_HISTORY_LIMIT: u32 = 50;
/// Interval between two poll expiry sweeps, in seconds.
const DEFAULT_EXPIRY_SWEEP_SECS: u64 = 1;
/// Prefix used when auto-numbering anonymous students.
const DEFAULT_STUDENT_NAME_PREFIX: &str = "Student";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    teacher_name: String,
    chat_history_limit: u32,
    expiry_sweep_secs: u64,
    student_name_prefix: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Name of the singleton teacher account.
    pub fn teacher_name(&self) -> &str {
        &self.teacher_name
    }

    /// Maximum number of messages served by the recent chat history endpoint.
    pub fn chat_history_limit(&self) -> u32 {
        self.chat_history_limit
    }

    /// Interval between two expiry sweeps over active time-boxed polls.
    pub fn expiry_sweep_secs(&self) -> u64 {
        self.expiry_sweep_secs
    }

    /// Prefix used to auto-number students logging in without a name.
    pub fn student_name_prefix(&self) -> &str {
        &self.student_name_prefix
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            teacher_name: DEFAULT_TEACHER_NAME.into(),
            chat_history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
            expiry_sweep_secs: DEFAULT_EXPIRY_SWEEP_SECS,
            student_name_prefix: DEFAULT_STUDENT_NAME_PREFIX.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    teacher_name: Option<String>,
    chat_history_limit: Option<u32>,
    expiry_sweep_secs: Option<u64>,
    student_name_prefix: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            teacher_name: raw.teacher_name.unwrap_or(defaults.teacher_name),
            chat_history_limit: raw.chat_history_limit.unwrap_or(defaults.chat_history_limit),
            expiry_sweep_secs: raw.expiry_sweep_secs.unwrap_or(defaults.expiry_sweep_secs),
            student_name_prefix: raw
                .student_name_prefix
                .unwrap_or(defaults.student_name_prefix),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_raw_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str(r#"{"teacher_name": "Ms. Frizzle"}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.teacher_name(), "Ms. Frizzle");
        assert_eq!(config.chat_history_limit(), DEFAULT_CHAT_HISTORY_LIMIT);
        assert_eq!(config.expiry_sweep_secs(), DEFAULT_EXPIRY_SWEEP_SECS);
        assert_eq!(config.student_name_prefix(), DEFAULT_STUDENT_NAME_PREFIX);
    }
}
