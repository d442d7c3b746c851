//! Application settings: built-in defaults, then an optional RON file, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docrender_core::DEFAULT_PREFERRED_TEMPLATE;
use docrender_engine::EngineSettings;
use serde::Deserialize;
use thiserror::Error;

use super::cli::Cli;
use super::logging::LogDestination;

const DEFAULT_CONFIG_FILE: &str = "docrender.ron";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub base_url: String,
    pub preferred_template: String,
    /// Zero writes the document on every edit.
    pub save_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub render_deadline_secs: Option<u64>,
    pub state_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            base_url: engine.base_url,
            preferred_template: DEFAULT_PREFERRED_TEMPLATE.to_string(),
            save_delay_ms: u64::try_from(engine.save_delay.as_millis()).unwrap_or(u64::MAX),
            request_timeout_secs: engine.request_timeout.as_secs(),
            render_deadline_secs: None,
            state_dir: PathBuf::from(".docrender"),
            output_dir: PathBuf::from("output"),
            log_destination: LogDestination::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Loads the explicit file, else `./docrender.ron` when present, else defaults.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(AppConfig::default());
            }
            default
        }
    };
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse(&content).map_err(|message| ConfigError::Parse { path, message })
}

fn parse(content: &str) -> Result<AppConfig, String> {
    ron::from_str(content).map_err(|err| err.to_string())
}

impl AppConfig {
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(secs) = cli.render_deadline {
            self.render_deadline_secs = Some(secs);
        }
        if let Some(destination) = cli.log {
            self.log_destination = destination;
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            render_deadline: self
                .render_deadline_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            save_delay: Duration::from_millis(self.save_delay_ms),
            ..EngineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse(
            r#"(
                base_url: "http://render.local:9000",
                render_deadline_secs: Some(120),
                log_destination: Both,
            )"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://render.local:9000");
        assert_eq!(config.render_deadline_secs, Some(120));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.preferred_template, "matnoble");
        assert_eq!(config.save_delay_ms, 1000);

        let settings = config.engine_settings();
        assert_eq!(settings.render_deadline, Some(Duration::from_secs(120)));
        assert_eq!(settings.render_path, "/api/render");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse("(base_uri: \"x\")").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("absent.ron"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_save_delay_follows_engine() {
        let config = AppConfig::default();
        assert_eq!(
            Duration::from_millis(config.save_delay_ms),
            EngineSettings::default().save_delay
        );
        assert_eq!(config.engine_settings().save_delay, Duration::from_millis(1000));
    }

    #[test]
    fn zero_deadline_means_none() {
        let config = AppConfig {
            render_deadline_secs: Some(0),
            ..AppConfig::default()
        };
        assert_eq!(config.engine_settings().render_deadline, None);
    }
}
