use anyhow::Result;
use gaudio_audio::GlobalVolumes;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/gaudio.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Directory sound locators are resolved against.
    pub assets_dir: Option<PathBuf>,
    /// Global volumes applied before any sound plays.
    pub volumes: GlobalVolumes,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_string(),
            assets_dir: None,
            volumes: GlobalVolumes::default(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<PlayerConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    PlayerConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                PlayerConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gaudio-config-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = PlayerConfig::load_from_path(&temp_path("missing.toml"));
        assert_eq!(cfg, PlayerConfig::default());
    }

    #[test]
    fn round_trips_through_disk() {
        let path = temp_path("roundtrip.toml");
        let cfg = PlayerConfig {
            log_filter: "gaudio_audio=debug".into(),
            assets_dir: Some(PathBuf::from("assets")),
            volumes: GlobalVolumes {
                effects: 0.8,
                music: 0.3,
            },
        };
        cfg.save_to_path(&path).unwrap();
        assert_eq!(PlayerConfig::load_from_path(&path), cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: PlayerConfig = toml::from_str("[volumes]\nmusic = 0.0\n").unwrap();
        assert_eq!(cfg.volumes.music, 0.0);
        assert_eq!(cfg.volumes.effects, 1.0);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn invalid_file_uses_defaults() {
        let path = temp_path("invalid.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "volumes = 3").unwrap();
        assert_eq!(PlayerConfig::load_from_path(&path), PlayerConfig::default());
    }
}
