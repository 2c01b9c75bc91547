use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::EncoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub player: PlayerConfig,
    pub presence: PresenceConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub short_sleep_secs: u64,
    pub long_sleep_secs: u64,
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub teardown_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub app_name: String,
    pub process_pattern: String,
    pub mode: ProbeMode,
    pub timeout_secs: u64,
}

/// Which probe tuple is polled every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// `id, position, state`; track fields fetched only on a song-cache miss.
    Compact,
    /// All fields every cycle; the player exposes no numeric id.
    Extended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub application_id: String,
    pub peer_patterns: Vec<String>,
    pub buttons: bool,
    pub fallback_image: String,
    pub small_image: String,
    pub seek_tolerance_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub enabled: bool,
    pub storefront: String,
    pub artwork_size: u32,
    pub artist_artwork: bool,
    pub timeout_secs: u64,
    pub record_ttl_secs: u64,
    pub song_ttl_secs: u64,
}

impl AppConfig {
    /// Load config from an explicit path, merged over built-in defaults.
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, EncoreError> {
        let mut table: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| EncoreError::Config(e.to_string()))?;

        if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            let user: toml::Table =
                toml::from_str(&user_str).map_err(|e| EncoreError::Config(e.to_string()))?;
            merge_tables(&mut table, user);
        }

        let config: AppConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| EncoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), EncoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, EncoreError> {
        toml::to_string_pretty(self).map_err(|e| EncoreError::Config(e.to_string()))
    }

    /// Reject values the poll loop cannot run with.
    pub fn validate(&self) -> Result<(), EncoreError> {
        if self.general.short_sleep_secs == 0 || self.general.long_sleep_secs == 0 {
            return Err(EncoreError::Config("sleep intervals must be non-zero".into()));
        }
        if self.metadata.artwork_size == 0 {
            return Err(EncoreError::Config("artwork_size must be non-zero".into()));
        }
        if self.presence.application_id.trim().is_empty() {
            return Err(EncoreError::Config("presence.application_id is empty".into()));
        }
        if !self.presence.seek_tolerance_secs.is_finite() || self.presence.seek_tolerance_secs < 0.0
        {
            return Err(EncoreError::Config(
                "presence.seek_tolerance_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn short_sleep(&self) -> Duration {
        Duration::from_secs(self.general.short_sleep_secs)
    }

    pub fn long_sleep(&self) -> Duration {
        Duration::from_secs(self.general.long_sleep_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.player.timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata.timeout_secs)
    }

    /// Path to user config file (XDG on Linux, Application Support on macOS).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "encore")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(over_tbl) => {
                if let Some(toml::Value::Table(base_tbl)) = base.get_mut(&key) {
                    merge_tables(base_tbl, over_tbl);
                } else {
                    base.insert(key, toml::Value::Table(over_tbl));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.general.short_sleep_secs, 5);
        assert_eq!(config.general.long_sleep_secs, 60);
        assert_eq!(config.player.mode, ProbeMode::Compact);
        assert_eq!(config.metadata.artwork_size, 512);
        assert_eq!(config.metadata.record_ttl_secs, 3600);
        assert_eq!(config.metadata.song_ttl_secs, 86400);
        assert_eq!(config.presence.seek_tolerance_secs, 0.0);
        assert!(config.general.teardown_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = config.to_toml().unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.presence.application_id,
            config.presence.application_id
        );
        assert_eq!(deserialized.presence.peer_patterns, config.presence.peer_patterns);
    }

    #[test]
    fn test_partial_user_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\nshort_sleep_secs = 2\n\n[player]\nmode = \"extended\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.general.short_sleep_secs, 2);
        assert_eq!(config.general.long_sleep_secs, 60);
        assert_eq!(config.player.mode, ProbeMode::Extended);
        assert_eq!(config.player.app_name, "Music");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.general.short_sleep_secs, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.metadata.storefront = "JP".into();
        config.general.log_file = Some(dir.path().join("encore.log"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.metadata.storefront, "JP");
        assert_eq!(loaded.general.log_file, config.general.log_file);
    }

    #[test]
    fn test_validation_rejects_zero_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nshort_sleep_secs = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(EncoreError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_mode_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[player]\nmode = \"psychic\"\n").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(EncoreError::Config(_))
        ));
    }
}
