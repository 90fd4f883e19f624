use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activity::PollerConfig;
use crate::api::ClientConfig;
use crate::drag::DEFAULT_ACTIVATION_DISTANCE;
use crate::notification::NotificationBackend;
use crate::theme::ThemePreset;

pub const ENDPOINT_ENV: &str = "TEAMBOARD_ENDPOINT";
pub const TOKEN_ENV: &str = "TEAMBOARD_TOKEN";
pub const THEME_ENV: &str = "TEAMBOARD_THEME";

const DEFAULT_ENDPOINT: &str = "http://localhost:8000/graphql/";
const DEFAULT_AUTH_SCHEME: &str = "JWT";
const DEFAULT_THEME: &str = "default";
const MIN_POLL_INTERVAL_MS: u64 = 500;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const MIN_ACTIVITY_LIMIT: usize = 1;
const MAX_ACTIVITY_LIMIT: usize = 50;
const DEFAULT_ACTIVITY_LIMIT: usize = 10;
const MIN_DRAG_DISTANCE: f32 = 0.5;
const MAX_DRAG_DISTANCE: f32 = 8.0;
const DEFAULT_DRAG_DISTANCE: f32 = DEFAULT_ACTIVATION_DISTANCE;
const MIN_REQUEST_TIMEOUT_MS: u64 = 500;
const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub auth_scheme: String,
    pub theme: String,
    pub activity_poll_interval_ms: u64,
    pub activity_limit: usize,
    /// Terminal cells the pointer must travel before a press becomes a drag.
    pub drag_activation_distance: f32,
    pub request_timeout_ms: u64,
    pub notification_backend: String,
    pub can_edit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            theme: DEFAULT_THEME.to_string(),
            activity_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            drag_activation_distance: DEFAULT_DRAG_DISTANCE,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            notification_backend: NotificationBackend::default().as_str().to_string(),
            can_edit: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("teamboard");
        path.push("settings.toml");
        Some(path)
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from_path(&path)
    }

    fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(mut settings) => {
                    settings.validate();
                    settings
                }
                Err(error) => {
                    warn!(
                        "failed to parse settings config '{}': {}",
                        path.display(),
                        error
                    );
                    Self::default()
                }
            },
            Err(error) => {
                warn!(
                    "failed to read settings config '{}': {}",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    /// Writes these settings only when no settings file exists yet.
    pub fn save_if_missing(&self) -> anyhow::Result<bool> {
        let path = Self::config_path().ok_or_else(|| anyhow!("unable to determine config path"))?;
        self.save_to_path_if_missing(&path)
    }

    fn save_to_path_if_missing(&self, path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.save_to_path(path)?;
        Ok(true)
    }

    fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("invalid settings config path"))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory '{}'", parent.display()))?;

        let mut validated = self.clone();
        validated.validate();
        let contents =
            toml::to_string_pretty(&validated).context("failed to serialize settings to TOML")?;

        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow!("invalid settings config file name"))?
            .to_string_lossy()
            .to_string();
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        fs::write(&tmp_path, contents).with_context(|| {
            format!(
                "failed to write temporary settings file '{}'",
                tmp_path.display()
            )
        })?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "failed to atomically rename settings file '{}' to '{}'",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Applies `TEAMBOARD_ENDPOINT` and `TEAMBOARD_THEME` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|value| !value.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(theme) = lookup(THEME_ENV).filter(|value| !value.trim().is_empty()) {
            self.theme = theme;
        }
        self.validate();
    }

    pub fn theme_preset(&self) -> ThemePreset {
        ThemePreset::from_str(&self.theme).unwrap_or_default()
    }

    pub fn backend(&self) -> NotificationBackend {
        NotificationBackend::from_settings_value(&self.notification_backend).unwrap_or_default()
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.activity_poll_interval_ms),
            limit: self.activity_limit,
        }
    }

    /// The auth token never comes from the settings file.
    pub fn client_config(&self, token: Option<String>) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            token,
            auth_scheme: self.auth_scheme.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    fn validate(&mut self) {
        self.activity_poll_interval_ms = self
            .activity_poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        self.activity_limit = self
            .activity_limit
            .clamp(MIN_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT);
        self.request_timeout_ms = self
            .request_timeout_ms
            .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);
        self.drag_activation_distance = if self.drag_activation_distance.is_finite() {
            self.drag_activation_distance
                .clamp(MIN_DRAG_DISTANCE, MAX_DRAG_DISTANCE)
        } else {
            DEFAULT_DRAG_DISTANCE
        };

        if self.endpoint.trim().is_empty() {
            warn!("empty endpoint in settings config; falling back to {DEFAULT_ENDPOINT}");
            self.endpoint = DEFAULT_ENDPOINT.to_string();
        }
        if self.auth_scheme.trim().is_empty() {
            self.auth_scheme = DEFAULT_AUTH_SCHEME.to_string();
        }

        self.theme = match ThemePreset::from_str(&self.theme) {
            Ok(preset) => preset.as_str().to_string(),
            Err(()) => {
                warn!(
                    "invalid theme '{}' in settings config; falling back to default",
                    self.theme
                );
                DEFAULT_THEME.to_string()
            }
        };

        self.notification_backend =
            match NotificationBackend::from_settings_value(&self.notification_backend) {
                Some(backend) => backend.as_str().to_string(),
                None => {
                    warn!(
                        "invalid notification_backend '{}' in settings config; falling back to {}",
                        self.notification_backend,
                        NotificationBackend::default().as_str()
                    );
                    NotificationBackend::default().as_str().to_string()
                }
            };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_file_path(temp_dir: &tempfile::TempDir) -> PathBuf {
        temp_dir.path().join("teamboard").join("settings.toml")
    }

    fn write_settings(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("settings path should have parent"))
            .expect("failed to create config dir");
        fs::write(path, contents).expect("failed to write settings");
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, "http://localhost:8000/graphql/");
        assert_eq!(settings.auth_scheme, "JWT");
        assert_eq!(settings.activity_poll_interval_ms, 3_000);
        assert_eq!(settings.activity_limit, 10);
        assert_eq!(settings.notification_backend, "in-app");
        assert!(settings.can_edit);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let settings = Settings::load_from_path(&settings_file_path(&temp_dir));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_malformed_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = settings_file_path(&temp_dir);
        write_settings(&path, "theme = \"mono\"\nactivity_limit = [invalid");

        assert_eq!(Settings::load_from_path(&path), Settings::default());
    }

    #[test]
    fn test_load_partial_toml() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = settings_file_path(&temp_dir);
        write_settings(&path, "theme = \"mono\"\ncan_edit = false");

        let settings = Settings::load_from_path(&path);
        assert_eq!(settings.theme, "mono");
        assert!(!settings.can_edit);
        assert_eq!(settings.activity_poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(settings.drag_activation_distance, DEFAULT_DRAG_DISTANCE);
    }

    #[test]
    fn test_save_if_missing_keeps_existing_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = settings_file_path(&temp_dir);

        assert!(
            Settings::default()
                .save_to_path_if_missing(&path)
                .expect("first write")
        );
        assert_eq!(Settings::load_from_path(&path), Settings::default());

        write_settings(&path, "theme = \"mono\"");
        assert!(
            !Settings::default()
                .save_to_path_if_missing(&path)
                .expect("second write")
        );
        assert_eq!(Settings::load_from_path(&path).theme, "mono");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = settings_file_path(&temp_dir);
        let mut expected = Settings {
            endpoint: "https://board.example.com/graphql/".to_string(),
            theme: "high-contrast".to_string(),
            activity_poll_interval_ms: 5_000,
            activity_limit: 25,
            notification_backend: "both".to_string(),
            ..Settings::default()
        };
        expected.validate();

        expected
            .save_to_path(&path)
            .expect("failed to save settings for roundtrip test");

        assert_eq!(Settings::load_from_path(&path), expected);
        assert!(path.exists());
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut settings = Settings {
            activity_poll_interval_ms: 1,
            activity_limit: 0,
            drag_activation_distance: 100.0,
            request_timeout_ms: u64::MAX,
            ..Settings::default()
        };

        settings.validate();

        assert_eq!(settings.activity_poll_interval_ms, MIN_POLL_INTERVAL_MS);
        assert_eq!(settings.activity_limit, MIN_ACTIVITY_LIMIT);
        assert_eq!(settings.drag_activation_distance, MAX_DRAG_DISTANCE);
        assert_eq!(settings.request_timeout_ms, MAX_REQUEST_TIMEOUT_MS);

        settings.drag_activation_distance = f32::NAN;
        settings.activity_limit = 500;
        settings.validate();
        assert_eq!(settings.drag_activation_distance, DEFAULT_DRAG_DISTANCE);
        assert_eq!(settings.activity_limit, MAX_ACTIVITY_LIMIT);
    }

    #[test]
    fn test_validate_invalid_theme_and_backend() {
        let mut settings = Settings {
            theme: "retro-wave".to_string(),
            notification_backend: "pager".to_string(),
            endpoint: "  ".to_string(),
            ..Settings::default()
        };

        settings.validate();

        assert_eq!(settings.theme, "default");
        assert_eq!(settings.notification_backend, "in-app");
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_env_overrides_endpoint_and_theme() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENDPOINT_ENV, "https://board.example.com/graphql/"),
            (THEME_ENV, "day"),
            (TOKEN_ENV, "secret"),
        ]);
        let mut settings = Settings::default();

        settings.apply_env(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(settings.endpoint, "https://board.example.com/graphql/");
        assert_eq!(settings.theme, "light");
        let serialized = toml::to_string(&settings).expect("settings serialize");
        assert!(!serialized.contains("secret"));
    }

    #[test]
    fn test_derived_configs() {
        let settings = Settings::default();
        assert_eq!(settings.poller_config().interval, Duration::from_secs(3));
        let client = settings.client_config(Some("abc".to_string()));
        assert_eq!(client.auth_scheme, "JWT");
        assert_eq!(client.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.backend(), NotificationBackend::InApp);
    }
}
