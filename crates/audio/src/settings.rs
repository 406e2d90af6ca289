//! Global volume controls.

use serde::{Deserialize, Serialize};

/// The two process-wide volume scalars.
///
/// Values are typically within `0.0..=1.0` but are stored as given. A value
/// of zero mutes its category completely: sounds in it refuse to play at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVolumes {
    /// Volume applied to non-music sounds.
    pub effects: f32,
    /// Volume applied to music-flagged sounds.
    pub music: f32,
}

impl Default for GlobalVolumes {
    fn default() -> Self {
        Self {
            effects: 1.0,
            music: 1.0,
        }
    }
}

impl GlobalVolumes {
    /// Create global volumes with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Volume for the category selected by `is_music`.
    pub fn get(&self, is_music: bool) -> f32 {
        if is_music {
            self.music
        } else {
            self.effects
        }
    }

    /// Set the volume for the category selected by `is_music`.
    pub fn set(&mut self, volume: f32, is_music: bool) {
        if is_music {
            self.music = volume;
        } else {
            self.effects = volume;
        }
    }

    /// Whether the category selected by `is_music` is muted.
    ///
    /// NaN counts as muted, like zero.
    pub fn is_muted(&self, is_music: bool) -> bool {
        let volume = self.get(is_music);
        volume == 0.0 || volume.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_volumes() {
        let volumes = GlobalVolumes::default();
        assert_eq!(volumes.get(true), 1.0);
        assert_eq!(volumes.get(false), 1.0);
    }

    #[test]
    fn test_categories_are_independent() {
        let mut volumes = GlobalVolumes::new();
        volumes.set(0.25, true);
        assert_eq!(volumes.get(true), 0.25);
        assert_eq!(volumes.get(false), 1.0);

        volumes.set(0.0, false);
        assert!(volumes.is_muted(false));
        assert!(!volumes.is_muted(true));
    }

    #[test]
    fn test_nan_volume_is_muted() {
        let mut volumes = GlobalVolumes::new();
        volumes.set(f32::NAN, true);
        assert!(volumes.is_muted(true));
        assert!(!volumes.is_muted(false));
    }

    #[test]
    fn test_values_are_not_clamped() {
        let mut volumes = GlobalVolumes::new();
        volumes.set(1.5, false);
        assert_eq!(volumes.effects, 1.5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let volumes: GlobalVolumes = toml::from_str("music = 0.4").unwrap();
        assert_eq!(volumes.music, 0.4);
        assert_eq!(volumes.effects, 1.0);
    }
}
