//! Daemon settings
//!
//! Settings come from a JSON config file with environment overrides for the
//! secrets, so credentials never have to live on disk.

use anyhow::Context;
use drivesentry_core::orchestrator::TriggerMode;
use drivesentry_core::{default_tunnel_args, DEFAULT_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_API_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_BASE_ACTIVITY_URL: &str = "https://driveactivity.googleapis.com/v2";

const API_KEY_ENV: &str = "DRIVESENTRY_API_KEY";
const ACCESS_TOKEN_ENV: &str = "DRIVESENTRY_ACCESS_TOKEN";

/// Daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mode: TriggerMode,
    pub api_key: String,
    pub access_token: String,
    pub base_api_url: String,
    pub base_activity_url: String,
    /// Credential store consumed by the external OAuth helper
    pub credentials_path: Option<PathBuf>,
    pub poll_interval_secs: u64,
    pub tunnel_command: String,
    /// Explicit tunnel arguments; derived from the poll interval when unset
    pub tunnel_args: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Poll,
            api_key: String::new(),
            access_token: String::new(),
            base_api_url: DEFAULT_BASE_API_URL.to_string(),
            base_activity_url: DEFAULT_BASE_ACTIVITY_URL.to_string(),
            credentials_path: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            tunnel_command: "interactsh-client".to_string(),
            tunnel_args: None,
        }
    }
}

impl Settings {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivesentry")
            .join("config.json")
    }

    /// Load settings from `path`, then apply environment overrides
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            self.api_key = api_key;
        }
        if let Ok(access_token) = std::env::var(ACCESS_TOKEN_ENV) {
            self.access_token = access_token;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Arguments for the tunnel binary
    pub fn tunnel_args(&self) -> Vec<String> {
        self.tunnel_args
            .clone()
            .unwrap_or_else(|| default_tunnel_args(self.poll_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.mode, TriggerMode::Poll);
        assert_eq!(settings.base_api_url, DEFAULT_BASE_API_URL);
        assert_eq!(settings.poll_interval_secs, 30);
        assert!(settings.tunnel_args().contains(&"-http-only".to_string()));
    }

    #[test]
    fn test_load_partial_file_and_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mode": "push", "apiKey": "file-key", "pollIntervalSecs": 60}}"#
        )
        .unwrap();

        std::env::set_var(API_KEY_ENV, "env-key");
        std::env::set_var(ACCESS_TOKEN_ENV, "env-token");
        let settings = Settings::load(file.path()).unwrap();
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(ACCESS_TOKEN_ENV);

        assert_eq!(settings.mode, TriggerMode::Push);
        // Environment wins over the file for secrets.
        assert_eq!(settings.api_key, "env-key");
        assert_eq!(settings.access_token, "env-token");
        assert_eq!(settings.poll_interval_secs, 60);
        // Untouched fields keep their defaults.
        assert_eq!(settings.base_activity_url, DEFAULT_BASE_ACTIVITY_URL);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Settings::load(Path::new("/nonexistent/config.json")).is_err());
    }

    #[test]
    fn test_explicit_tunnel_args_win() {
        let settings = Settings {
            tunnel_args: Some(vec!["-custom".to_string()]),
            ..Settings::default()
        };
        assert_eq!(settings.tunnel_args(), vec!["-custom".to_string()]);
    }
}
