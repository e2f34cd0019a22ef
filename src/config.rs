use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bandit::DEFAULT_EPSILON;
use crate::error::ConfigError;
use crate::session::{
    DEFAULT_REST_MINUTES, DEFAULT_WORK_MINUTES, REST_CHOICES, WORK_MINUTES_MAX, WORK_MINUTES_MIN,
    WORK_MINUTES_STEP,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub work_minutes: u32,
    pub rest_minutes: u32,
    pub epsilon: f64,
    /// Session log location; the platform data directory when unset.
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            rest_minutes: DEFAULT_REST_MINUTES,
            epsilon: DEFAULT_EPSILON,
            log_path: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_work_minutes(self.work_minutes)?;
        validate_rest_minutes(self.rest_minutes)?;
        validate_epsilon(self.epsilon)?;
        Ok(())
    }
}

pub fn validate_work_minutes(minutes: u32) -> Result<u32, ConfigError> {
    if (WORK_MINUTES_MIN..=WORK_MINUTES_MAX).contains(&minutes) && minutes % WORK_MINUTES_STEP == 0 {
        Ok(minutes)
    } else {
        Err(ConfigError::WorkMinutes {
            got: minutes,
            min: WORK_MINUTES_MIN,
            max: WORK_MINUTES_MAX,
            step: WORK_MINUTES_STEP,
        })
    }
}

pub fn validate_rest_minutes(minutes: u32) -> Result<u32, ConfigError> {
    if REST_CHOICES.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ConfigError::RestMinutes {
            got: minutes,
            allowed: &REST_CHOICES,
        })
    }
}

pub fn validate_epsilon(epsilon: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&epsilon) {
        Ok(epsilon)
    } else {
        Err(ConfigError::Epsilon(epsilon))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mindswitch") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mindswitch_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing, unreadable or invalid files fall back to defaults.
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => match cfg.validate() {
                    Ok(()) => return cfg,
                    Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "ignoring invalid config"),
                },
                Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            work_minutes: 50,
            rest_minutes: 5,
            epsilon: 0.1,
            log_path: Some(dir.path().join("log.csv")),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn default_store_uses_platform_config_file() {
        let store = FileConfigStore::default();
        assert_eq!(store.path(), FileConfigStore::new().path());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "work_minutes": 45 }"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.work_minutes, 45);
        assert_eq!(loaded.rest_minutes, DEFAULT_REST_MINUTES);
        assert_eq!(loaded.epsilon, DEFAULT_EPSILON);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "rest_minutes": 12 }"#).unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn validation_bounds() {
        assert_eq!(validate_work_minutes(5), Ok(5));
        assert_eq!(validate_work_minutes(90), Ok(90));
        assert_matches!(validate_work_minutes(0), Err(ConfigError::WorkMinutes { got: 0, .. }));
        assert_matches!(validate_work_minutes(27), Err(ConfigError::WorkMinutes { .. }));
        assert_matches!(validate_work_minutes(95), Err(ConfigError::WorkMinutes { .. }));

        for r in REST_CHOICES {
            assert_eq!(validate_rest_minutes(r), Ok(r));
        }
        assert_matches!(validate_rest_minutes(6), Err(ConfigError::RestMinutes { got: 6, .. }));

        assert_eq!(validate_epsilon(0.0), Ok(0.0));
        assert_eq!(validate_epsilon(1.0), Ok(1.0));
        assert_matches!(validate_epsilon(1.5), Err(ConfigError::Epsilon(_)));
        assert_matches!(validate_epsilon(f64::NAN), Err(ConfigError::Epsilon(_)));
    }
}
