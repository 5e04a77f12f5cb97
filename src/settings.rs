//! Player settings and preferences
//!
//! Persisted as `settings.json` in the data directory, separately from
//! levels and campaign progress.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BALL_MAX_SPEED, BALL_SPEED, MAX_RUN_SECONDS_LIMIT};

/// Display resolution preference (kept for the menu layer, not used by the sim)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Resolution {
    /// Parse "WIDTHxHEIGHT"
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().to_lowercase().split_once('x').map(|(w, h)| {
            (w.trim().parse::<u32>(), h.trim().parse::<u32>())
        })?;
        match (w, h) {
            (Ok(width), Ok(height)) if width > 0 && height > 0 => Some(Self { width, height }),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Gameplay ===
    /// Ball speed in cells per second
    pub ball_speed: f32,
    /// Editor playtest only accepts levels with exactly three stars
    pub require_exactly_three_stars: bool,
    /// A run still going after this many seconds is stopped as stalled
    pub max_run_seconds: f32,

    // === Display ===
    pub fullscreen: bool,
    pub resolution: Resolution,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.8,
            sfx_volume: 1.0,

            ball_speed: BALL_SPEED,
            require_exactly_three_stars: false,
            max_run_seconds: 120.0,

            fullscreen: false,
            resolution: Resolution::default(),
        }
    }
}

impl Settings {
    /// File name inside the data directory
    pub const FILE_NAME: &'static str = "settings.json";

    /// Keys accepted by [`Settings::set`]
    pub const KEYS: [&'static str; 8] = [
        "master_volume",
        "music_volume",
        "sfx_volume",
        "ball_speed",
        "require_exactly_three_stars",
        "max_run_seconds",
        "fullscreen",
        "resolution",
    ];

    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::FILE_NAME)
    }

    /// Load settings from the data directory. A missing file gives the
    /// defaults; an unreadable one is logged and also gives the defaults.
    pub fn load(data_dir: &Path) -> Self {
        let path = Self::path(data_dir);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("Using default settings");
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring bad settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(data_dir), json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Set one field from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        fn num(key: &'static str, value: &str) -> Result<f32, SettingsError> {
            value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| SettingsError::InvalidValue {
                    key,
                    value: value.to_string(),
                })
        }
        fn flag(key: &'static str, value: &str) -> Result<bool, SettingsError> {
            match value.trim().to_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(true),
                "false" | "off" | "no" | "0" => Ok(false),
                _ => Err(SettingsError::InvalidValue {
                    key,
                    value: value.to_string(),
                }),
            }
        }

        match key {
            "master_volume" => self.master_volume = num("master_volume", value)?,
            "music_volume" => self.music_volume = num("music_volume", value)?,
            "sfx_volume" => self.sfx_volume = num("sfx_volume", value)?,
            "ball_speed" => {
                let v = num("ball_speed", value)?;
                if v <= 0.0 {
                    return Err(SettingsError::InvalidValue {
                        key: "ball_speed",
                        value: value.to_string(),
                    });
                }
                self.ball_speed = v;
            }
            "require_exactly_three_stars" => {
                self.require_exactly_three_stars = flag("require_exactly_three_stars", value)?
            }
            "max_run_seconds" => {
                let v = num("max_run_seconds", value)?;
                if v <= 0.0 {
                    return Err(SettingsError::InvalidValue {
                        key: "max_run_seconds",
                        value: value.to_string(),
                    });
                }
                self.max_run_seconds = v;
            }
            "fullscreen" => self.fullscreen = flag("fullscreen", value)?,
            "resolution" => {
                self.resolution =
                    Resolution::parse(value).ok_or_else(|| SettingsError::InvalidValue {
                        key: "resolution",
                        value: value.to_string(),
                    })?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        *self = self.clone().sanitized();
        Ok(())
    }

    /// Clamp volumes to 0..1 and replace unusable gameplay values
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        if !(self.ball_speed > 0.0) {
            self.ball_speed = defaults.ball_speed;
        }
        self.ball_speed = self.ball_speed.min(BALL_MAX_SPEED);
        if !(self.max_run_seconds > 0.0) {
            self.max_run_seconds = defaults.max_run_seconds;
        }
        self.max_run_seconds = self.max_run_seconds.min(MAX_RUN_SECONDS_LIMIT);
        self
    }

    /// Effective music volume (master applied)
    pub fn effective_music_volume(&self) -> f32 {
        self.master_volume * self.music_volume
    }

    /// Effective sound effect volume (master applied)
    pub fn effective_sfx_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.set("ball_speed", "4.5").unwrap();
        settings.set("fullscreen", "on").unwrap();
        settings.set("resolution", "1280x720").unwrap();
        settings.save(dir.path()).unwrap();

        let loaded = Settings::load(dir.path());
        assert_eq!(loaded.ball_speed, 4.5);
        assert!(loaded.fullscreen);
        assert_eq!(loaded.resolution.to_string(), "1280x720");
    }

    #[test]
    fn test_partial_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(Settings::path(dir.path()), r#"{ "sfx_volume": 3.0 }"#).unwrap();
        let loaded = Settings::load(dir.path());
        assert_eq!(loaded.sfx_volume, 1.0);
        assert_eq!(loaded.music_volume, 0.8);

        fs::write(Settings::path(dir.path()), "not json").unwrap();
        assert_eq!(Settings::load(dir.path()), Settings::default());
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.set("volume", "1"),
            Err(SettingsError::UnknownKey("volume".into()))
        );
        assert!(settings.set("ball_speed", "-2").is_err());
        assert!(settings.set("fullscreen", "maybe").is_err());
        assert!(settings.set("resolution", "big").is_err());
        assert_eq!(settings, Settings::default());

        settings.set("master_volume", "2").unwrap();
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_gameplay_values_are_capped() {
        let mut settings = Settings::default();
        settings.set("ball_speed", "500").unwrap();
        assert_eq!(settings.ball_speed, BALL_MAX_SPEED);
        settings.set("max_run_seconds", "1000000").unwrap();
        assert_eq!(settings.max_run_seconds, MAX_RUN_SECONDS_LIMIT);

        let dir = tempfile::tempdir().unwrap();
        fs::write(
            Settings::path(dir.path()),
            r#"{ "ball_speed": 1e9, "max_run_seconds": 1e12 }"#,
        )
        .unwrap();
        let loaded = Settings::load(dir.path());
        assert_eq!(loaded.ball_speed, BALL_MAX_SPEED);
        assert_eq!(loaded.max_run_seconds, MAX_RUN_SECONDS_LIMIT);
    }

    #[test]
    fn test_effective_volumes() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Default::default()
        };
        assert_eq!(settings.effective_sfx_volume(), 0.25);
        assert_eq!(settings.effective_music_volume(), 0.4);
    }
}
