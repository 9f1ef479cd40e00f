use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{model::UnitSystem, provider::openweather::DEFAULT_BASE_URL};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "WEATHERDASH_API_KEY";

pub const DEFAULT_CITY: &str = "San Francisco";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// How the device position is obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// Upper bound on a single position read.
    pub timeout_secs: u64,

    /// A position captured at most this long ago is reused.
    pub maximum_age_secs: u64,

    /// Fixed position, e.g. handed over by the OS or typed by the user.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Approximate the position from the public IP address.
    pub ip_lookup: bool,
    pub ip_lookup_url: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            maximum_age_secs: 60,
            latitude: None,
            longitude: None,
            ip_lookup: false,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
        }
    }
}

impl GeolocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_secs(self.maximum_age_secs)
    }

    /// Both coordinates, when a fixed position is configured.
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "San Francisco"
/// units = "metric"
///
/// [geolocation]
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Shown whenever the device position cannot be read.
    pub default_city: String,

    /// Unit system used at startup.
    pub units: UnitSystem,

    pub base_url: String,
    pub icon_base_url: String,

    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            units: UnitSystem::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Returns the API key, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// Replace the stored key with `value` when it is set and non-empty.
    pub fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Load config from the platform config dir, then apply the environment override.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openweather() {
        let cfg = Config::default();

        assert_eq!(cfg.default_city, "San Francisco");
        assert_eq!(cfg.units, UnitSystem::Metric);
        assert_eq!(cfg.base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(cfg.geolocation.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.geolocation.maximum_age(), Duration::from_secs(60));
        assert!(!cfg.is_configured());
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(!cfg.is_configured());
    }

    #[test]
    fn env_override_replaces_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        cfg.apply_api_key_override(Some("ENV_KEY".into()));
        assert_eq!(cfg.api_key(), Some("ENV_KEY"));

        cfg.apply_api_key_override(Some(String::new()));
        assert_eq!(cfg.api_key(), Some("ENV_KEY"));

        cfg.apply_api_key_override(None);
        assert_eq!(cfg.api_key(), Some("ENV_KEY"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_city, DEFAULT_CITY);
    }

    #[test]
    fn save_and_load_preserve_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_city = "Oslo".into();
        cfg.units = UnitSystem::Imperial;
        cfg.geolocation.latitude = Some(59.91);
        cfg.geolocation.longitude = Some(10.75);
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("KEY"));
        assert_eq!(loaded.default_city, "Oslo");
        assert_eq!(loaded.units, UnitSystem::Imperial);
        assert_eq!(loaded.geolocation.fixed_position(), Some((59.91, 10.75)));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = \"imperial\"\n[geolocation]\nip_lookup = true\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.units, UnitSystem::Imperial);
        assert_eq!(cfg.default_city, DEFAULT_CITY);
        assert!(cfg.geolocation.ip_lookup);
        assert_eq!(cfg.geolocation.timeout_secs, 10);
        assert_eq!(cfg.geolocation.ip_lookup_url, DEFAULT_IP_LOOKUP_URL);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
