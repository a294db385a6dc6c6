//! Tool Configuration
//!
//! Every field has a default; a JSON file may override any subset.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::pictograms::PictogramCatalog;
use crate::render::LinkConfig;
use crate::spool::SpoolTimings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error for config file '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}': {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ToolConfig {
    pub state_dir: PathBuf,
    pub spool_dir: PathBuf,
    pub pictogram_base_url: String,
    /// When set, pictograms are inlined from this directory.
    pub pictogram_dir: Option<PathBuf>,
    pub lookup_base_url: String,
    pub qr_endpoint: String,
    pub settle_delay_ms: u64,
    pub asset_timeout_ms: u64,
    pub teardown_delay_ms: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let links = LinkConfig::default();
        Self {
            state_dir: PathBuf::from(".ghslabel"),
            spool_dir: std::env::temp_dir().join("ghslabel-spool"),
            pictogram_base_url: "https://pubchem.ncbi.nlm.nih.gov/images/ghs".to_string(),
            pictogram_dir: None,
            lookup_base_url: links.lookup_base_url,
            qr_endpoint: links.qr_endpoint,
            settle_delay_ms: 100,
            asset_timeout_ms: 10_000,
            teardown_delay_ms: 0,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Values supplied on the command line or through `GHSLABEL_*` variables.
/// Any field that is set wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub state_dir: Option<PathBuf>,
    pub spool_dir: Option<PathBuf>,
    pub pictogram_dir: Option<PathBuf>,
    pub pictogram_base_url: Option<String>,
    pub lookup_base_url: Option<String>,
    pub qr_endpoint: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl ToolConfig {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.state_dir {
            self.state_dir = dir;
        }
        if let Some(dir) = overrides.spool_dir {
            self.spool_dir = dir;
        }
        if let Some(dir) = overrides.pictogram_dir {
            self.pictogram_dir = Some(dir);
        }
        if let Some(url) = overrides.pictogram_base_url {
            self.pictogram_base_url = url;
        }
        if let Some(url) = overrides.lookup_base_url {
            self.lookup_base_url = url;
        }
        if let Some(url) = overrides.qr_endpoint {
            self.qr_endpoint = url;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn links(&self) -> LinkConfig {
        LinkConfig {
            lookup_base_url: self.lookup_base_url.clone(),
            qr_endpoint: self.qr_endpoint.clone(),
        }
    }

    pub fn catalog(&self) -> PictogramCatalog {
        match &self.pictogram_dir {
            Some(dir) => PictogramCatalog::load_inline(dir),
            None => PictogramCatalog::remote(&self.pictogram_base_url),
        }
    }

    pub fn timings(&self) -> SpoolTimings {
        SpoolTimings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            asset_timeout: Duration::from_millis(self.asset_timeout_ms),
            teardown_delay: Duration::from_millis(self.teardown_delay_ms),
            ..SpoolTimings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghslabel.json");
        fs::write(&path, r#"{"state_dir": "/var/lib/ghslabel", "log_format": "json"}"#).unwrap();

        let config = ToolConfig::load(Some(&path)).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/ghslabel"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.asset_timeout_ms, 10_000);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghslabel.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(ToolConfig::load(Some(&path)), Err(ConfigError::Parse(_, _))));
        assert!(matches!(
            ToolConfig::load(Some(&dir.path().join("absent.json"))),
            Err(ConfigError::Io(_, _))
        ));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghslabel.json");
        fs::write(
            &path,
            r#"{"spool_dir": "/tmp/from-file", "qr_endpoint": "https://qr.example/file?d=", "log_level": "warn"}"#,
        )
        .unwrap();

        let mut config = ToolConfig::load(Some(&path)).unwrap();
        config.apply(ConfigOverrides {
            spool_dir: Some(PathBuf::from("/tmp/from-flag")),
            pictogram_dir: Some(PathBuf::from("/opt/ghs")),
            lookup_base_url: Some("https://lookup.example".into()),
            ..Default::default()
        });

        assert_eq!(config.spool_dir, PathBuf::from("/tmp/from-flag"));
        assert_eq!(config.pictogram_dir, Some(PathBuf::from("/opt/ghs")));
        assert_eq!(config.links().lookup_base_url, "https://lookup.example");
        assert_eq!(config.qr_endpoint, "https://qr.example/file?d=");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_timings_from_millis() {
        let config = ToolConfig {
            settle_delay_ms: 0,
            teardown_delay_ms: 250,
            ..Default::default()
        };
        let timings = config.timings();
        assert!(timings.settle_delay.is_zero());
        assert_eq!(timings.teardown_delay, Duration::from_millis(250));
    }
}
