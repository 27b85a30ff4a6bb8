use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

fn default_sweep_interval() -> f64 {
    0.1
}

fn default_pool_start_size() -> usize {
    20
}

fn default_max_id_attempts() -> u32 {
    64
}

/// Runtime configuration of the audio system.
///
/// Everything here is about how the core runs, not about what it plays:
/// categories, tags and master volume live in [`AudioSettings`](crate::audio_system::AudioSettings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Seconds of simulated time between two reclamation sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: f64,

    /// Extra seconds added to a clip's lifetime before it counts as dead.
    /// Never smaller than `sweep_interval`; `None` means "equal to it".
    #[serde(default)]
    pub expiry_epsilon: Option<f64>,

    /// Pool size used when the settings asset could not be loaded
    #[serde(default = "default_pool_start_size")]
    pub default_pool_start_size: usize,

    /// Upper bound on random draws when generating a unique container ID
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,

    /// Path of the settings asset (categories, tags, master volume)
    #[serde(default)]
    pub settings_path: Option<PathBuf>,

    /// Path of the container library asset
    #[serde(default)]
    pub library_path: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            expiry_epsilon: None,
            default_pool_start_size: default_pool_start_size(),
            max_id_attempts: default_max_id_attempts(),
            settings_path: None,
            library_path: None,
        }
    }
}

impl SystemConfig {
    /// Load configuration from `path`.
    /// Falls back to defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: SystemConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sweep_interval.is_finite() && self.sweep_interval > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sweep_interval must be positive, got {}",
                self.sweep_interval
            )));
        }
        if self.max_id_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_id_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective expiry epsilon: the configured value, but never below the
    /// sweep interval.
    pub fn epsilon(&self) -> f64 {
        match self.expiry_epsilon {
            Some(eps) if eps.is_finite() => eps.max(self.sweep_interval),
            _ => self.sweep_interval,
        }
    }

    /// Sweep interval as a `Duration`
    pub fn sweep_duration(&self) -> Duration {
        Duration::from_secs_f64(self.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SystemConfig::default();
        assert_eq!(config.sweep_interval, 0.1);
        assert_eq!(config.default_pool_start_size, 20);
        assert_eq!(config.max_id_attempts, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_epsilon_never_below_sweep_interval() {
        let mut config = SystemConfig::default();
        assert_eq!(config.epsilon(), 0.1);

        config.expiry_epsilon = Some(0.05);
        assert_eq!(config.epsilon(), 0.1);

        config.expiry_epsilon = Some(1.0);
        assert_eq!(config.epsilon(), 1.0);
    }

    #[test]
    fn test_invalid_sweep_interval() {
        let config = SystemConfig {
            sweep_interval: 0.0,
            ..SystemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: SystemConfig = serde_json::from_str(r#"{ "sweep_interval": 0.25 }"#).unwrap();
        assert_eq!(config.sweep_interval, 0.25);
        assert_eq!(config.default_pool_start_size, 20);
        assert!(config.settings_path.is_none());
    }

    #[test]
    fn test_config_round_trip_on_disk() {
        let dir = std::env::temp_dir().join(format!("pooled-audio-config-{}", std::process::id()));
        let path = dir.join("config.json");

        let config = SystemConfig {
            sweep_interval: 0.2,
            ..SystemConfig::default()
        };
        config.save_to(&path).unwrap();

        let loaded = SystemConfig::load_from(&path).unwrap();
        assert_eq!(loaded.sweep_interval, 0.2);

        let _ = fs::remove_dir_all(&dir);
    }
}
