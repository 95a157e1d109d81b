//! Application configuration. Paths and calculation defaults.

use crate::domain::DomainError;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding orgnet.db. Read from ORGNET_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Where Markdown reports and JSON exports go. Defaults to `<data_dir>/reports`.
    #[serde(default)]
    pub reports_dir: Option<String>,

    /// Default calculation window in days. Read from ORGNET_WINDOW_DAYS.
    #[serde(default)]
    pub window_days: Option<i64>,

    /// Number of snapshots shown in the metrics history.
    #[serde(default)]
    pub history_limit: Option<u32>,

    /// Whether Three E's calculations append a snapshot by default.
    #[serde(default)]
    pub persist_metrics: Option<bool>,
}

impl AppConfig {
    /// Environment variables prefixed `ORGNET_`, plus the file named by ORGNET_CONFIG if set.
    pub fn load() -> Result<Self, DomainError> {
        dotenv::dotenv().ok();
        let file = std::env::var("ORGNET_CONFIG").ok();
        Self::load_from(file.as_deref())
    }

    /// Environment variables prefixed `ORGNET_`, layered over `file` when given.
    pub fn load_from(file: Option<&str>) -> Result<Self, DomainError> {
        let mut c = config::Config::builder();
        if let Some(path) = file {
            c = c.add_source(config::File::with_name(path));
        }
        c = c.add_source(config::Environment::with_prefix("ORGNET").try_parsing(true));
        c.build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| DomainError::Config(e.to_string()))
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    pub fn reports_dir_or_default(&self) -> PathBuf {
        self.reports_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir_or_default().join("reports"))
    }

    /// Clamped to 1..=365.
    pub fn window_days_or_default(&self) -> i64 {
        self.window_days
            .unwrap_or(DEFAULT_WINDOW_DAYS)
            .clamp(1, MAX_WINDOW_DAYS)
    }

    pub fn history_limit_or_default(&self) -> u32 {
        self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(1)
    }

    pub fn persist_metrics_or_default(&self) -> bool {
        self.persist_metrics.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("./data"));
        assert_eq!(cfg.reports_dir_or_default(), PathBuf::from("./data/reports"));
        assert_eq!(cfg.window_days_or_default(), 30);
        assert_eq!(cfg.history_limit_or_default(), 10);
        assert!(cfg.persist_metrics_or_default());
    }

    #[test]
    fn test_window_days_clamped() {
        let too_long = AppConfig {
            window_days: Some(5000),
            ..Default::default()
        };
        assert_eq!(too_long.window_days_or_default(), 365);
        let zero = AppConfig {
            window_days: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.window_days_or_default(), 1);
    }

    #[test]
    fn test_reports_dir_follows_data_dir() {
        let cfg = AppConfig {
            data_dir: Some("/srv/orgnet".into()),
            ..Default::default()
        };
        assert_eq!(cfg.reports_dir_or_default(), PathBuf::from("/srv/orgnet/reports"));
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = AppConfig::load_from(Some("/nonexistent/orgnet-settings.toml")).unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_config_file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orgnet.toml");
        std::fs::write(&path, "data_dir = \"/srv/teams\"\nhistory_limit = 4\n").unwrap();
        let cfg = AppConfig::load_from(path.to_str()).unwrap();
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("/srv/teams"));
        assert_eq!(cfg.history_limit_or_default(), 4);
    }
}
