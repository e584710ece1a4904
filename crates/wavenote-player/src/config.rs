//! Player configuration persisted as YAML.
//!
//! Lives at `~/.config/wavenote/config.yaml`. Every field carries a serde
//! default so configs written by older versions keep loading after new
//! fields appear.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wavenote_core::{TempoGrid, DEFAULT_PEAKS_PER_SECOND};
use wavenote_widgets::DOUBLE_TAP_ZOOM;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerConfig {
    pub playback: PlaybackConfig,
    pub display: DisplayConfig,
    /// Tempo grid settings carried across sessions.
    pub tempo: TempoGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output volume in [0.0, 1.0].
    pub volume: f32,
    pub muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Peak resolution requested from the waveform loader.
    pub peaks_per_second: u32,
    /// Zoom level a double-tap jumps to.
    pub double_tap_zoom: f64,
    /// Keep the playhead in view during playback.
    pub follow_playhead: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            peaks_per_second: DEFAULT_PEAKS_PER_SECOND,
            double_tap_zoom: DOUBLE_TAP_ZOOM,
            follow_playhead: true,
        }
    }
}

/// Default config location: `~/.config/wavenote/config.yaml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wavenote")
        .join("config.yaml")
}

/// Load configuration, falling back to defaults if the file is missing
/// or unreadable. A broken config should never keep the player from
/// starting.
pub fn load_config(path: &Path) -> PlayerConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(config) => {
                log::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config at {:?}: {}; using defaults", path, e);
                PlayerConfig::default()
            }
        },
        Err(_) => {
            log::info!("No config at {:?}; using defaults", path);
            PlayerConfig::default()
        }
    }
}

/// Write configuration back to disk, creating parent directories as needed.
pub fn save_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sensible() {
        let config = PlayerConfig::default();
        assert!(config.playback.volume > 0.0 && config.playback.volume <= 1.0);
        assert!(!config.playback.muted);
        assert_eq!(config.display.peaks_per_second, DEFAULT_PEAKS_PER_SECOND);
        assert!(config.display.follow_playhead);
        assert_eq!(config.tempo.bpm, 120.0);
    }

    #[test]
    fn yaml_roundtrip_preserves_fields() {
        let mut config = PlayerConfig::default();
        config.playback.volume = 0.35;
        config.playback.muted = true;
        config.display.double_tap_zoom = 16.0;
        config.tempo.set_bpm(98.0);

        let yaml = serde_yaml::to_string(&config).unwrap();
        let restored: PlayerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(restored.playback.volume, 0.35);
        assert!(restored.playback.muted);
        assert_eq!(restored.display.double_tap_zoom, 16.0);
        assert_eq!(restored.tempo.bpm, 98.0);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let restored: PlayerConfig = serde_yaml::from_str("playback:\n  volume: 0.5\n").unwrap();
        assert_eq!(restored.playback.volume, 0.5);
        assert!(!restored.playback.muted);
        assert_eq!(restored.display.peaks_per_second, DEFAULT_PEAKS_PER_SECOND);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = PlayerConfig::default();
        config.display.follow_playhead = false;
        save_config(&config, &path).unwrap();

        let restored = load_config(&path);
        assert!(!restored.display.follow_playhead);
    }
}
