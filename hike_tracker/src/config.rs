use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{bail, Context};
use hike_tracker_lib::ports::WatchOptions;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "hike_tracker.toml";
pub const LOG_FILE: &str = "hike_tracker.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub data_dir: PathBuf,
    pub watch: WatchOptions,
    /// Replay speed multiplier. 2.0 plays a recorded track twice as fast.
    pub replay_speed: f64,
}

/// What `hike_tracker.toml` may contain. Missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    high_accuracy: Option<bool>,
    max_age_ms: Option<u64>,
    timeout_ms: Option<u64>,
    replay_speed: Option<f64>,
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub replay_speed: Option<f64>,
}

impl Configuration {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            watch: WatchOptions::default(),
            replay_speed: 1.0,
        }
    }

    /// Reads `hike_tracker.toml` from the data directory if it exists and
    /// applies the overrides on top.
    pub fn load(default_data_dir: PathBuf, overrides: Overrides) -> anyhow::Result<Self> {
        let data_dir = overrides.data_dir.clone().unwrap_or(default_data_dir);
        let mut config = Self::new(data_dir.clone());

        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("Invalid config {:?}", path))?;
            config.apply(file);
            tracing::debug!("Loaded config from {:?}", path);
        }

        // An explicit --data-dir beats data_dir in the file
        if let Some(data_dir) = overrides.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            config.watch.timeout_ms = timeout_ms;
        }
        if let Some(speed) = overrides.replay_speed {
            config.replay_speed = speed;
        }

        if !(config.replay_speed.is_finite() && config.replay_speed > 0.) {
            bail!("replay_speed must be a positive number, got {}", config.replay_speed);
        }

        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        for key in file.unknown.keys() {
            tracing::warn!("Ignoring unknown config key '{}'", key);
        }

        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(high_accuracy) = file.high_accuracy {
            self.watch.high_accuracy = high_accuracy;
        }
        if let Some(max_age_ms) = file.max_age_ms {
            self.watch.max_age_ms = max_age_ms;
        }
        if let Some(timeout_ms) = file.timeout_ms {
            self.watch.timeout_ms = timeout_ms;
        }
        if let Some(replay_speed) = file.replay_speed {
            self.replay_speed = replay_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(dir.path().to_path_buf(), Overrides::default()).unwrap();

        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.watch, WatchOptions { high_accuracy: true, max_age_ms: 0, timeout_ms: 5000 });
        assert_eq!(config.replay_speed, 1.0);
    }

    #[test]
    fn file_values_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"
            # replay faster than real time
            replay_speed = 20.0
            timeout_ms = 8000 # ms
            high_accuracy = false
            data_dir = "/srv/hikes"

            colour = "green"
        "#).unwrap();

        let config = Configuration::load(dir.path().to_path_buf(), Overrides::default()).unwrap();
        assert_eq!(config.replay_speed, 20.);
        assert_eq!(config.watch.timeout_ms, 8000);
        assert!(!config.watch.high_accuracy);
        assert_eq!(config.data_dir, Path::new("/srv/hikes"));

        let overrides = Overrides {
            data_dir: Some(dir.path().to_path_buf()),
            timeout_ms: Some(100),
            ..Default::default()
        };
        let config = Configuration::load(dir.path().to_path_buf(), overrides).unwrap();
        assert_eq!(config.watch.timeout_ms, 100);
        assert_eq!(config.replay_speed, 20.);
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"max_age_ms = "soon""#).unwrap();
        assert!(Configuration::load(dir.path().to_path_buf(), Overrides::default()).is_err());

        std::fs::write(dir.path().join(CONFIG_FILE), "just words").unwrap();
        assert!(Configuration::load(dir.path().to_path_buf(), Overrides::default()).is_err());

        std::fs::remove_file(dir.path().join(CONFIG_FILE)).unwrap();
        let overrides = Overrides { replay_speed: Some(0.), ..Default::default() };
        assert!(Configuration::load(dir.path().to_path_buf(), overrides).is_err());
    }
}
