use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::evaluation::EvaluationFixture;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub engine: EngineSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub alert_threshold: u8,
    pub observation_window_days: u32,
    pub history_dedupe_minutes: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EvaluationSettings {
    pub fixture_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    pub fn new() -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("database.max_connections", 5)?
            .set_default("engine.alert_threshold", 50)?
            .set_default("engine.observation_window_days", 90)?
            .set_default("engine.history_dedupe_minutes", 5)?
            .set_default("logging.level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("FLOOD_EW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn database_url(&self) -> Option<String> {
        self.database
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| env::var("DATABASE_URL").ok())
    }

    pub fn evaluation_fixture(&self) -> Result<EvaluationFixture> {
        match &self.evaluation.fixture_path {
            Some(path) => EvaluationFixture::from_path(path),
            None => EvaluationFixture::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.engine.alert_threshold, 50);
        assert_eq!(settings.engine.observation_window_days, 90);
        assert_eq!(settings.engine.history_dedupe_minutes, 5);
        assert_eq!(settings.database.max_connections, 5);
        assert!(settings.evaluation.fixture_path.is_none());
    }

    #[test]
    fn builtin_fixture_is_used_when_no_path_set() {
        let settings = Settings::new().unwrap();
        let fixture = settings.evaluation_fixture().unwrap();
        assert_eq!(fixture.test_events, 14);
    }
}
