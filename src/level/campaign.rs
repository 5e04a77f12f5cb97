//! Bundled campaign levels and unlock progress
//!
//! Campaign levels ship as `LevelN.json` files in one folder and are played
//! in order of the number in their name. Progress is the highest completed
//! 0-based index; the level right after it is the last unlocked one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::io::{EXTENSION, LevelStore};
use super::{LevelData, LevelError};

/// Sort key for names without any digits
const UNNUMBERED: u32 = 9999;

/// Ordered set of campaign levels
#[derive(Debug, Clone, Default)]
pub struct Campaign {
    levels: Vec<PathBuf>,
}

/// Number embedded in a level name ("Level12" -> 12)
pub fn level_number(name: &str) -> u32 {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(UNNUMBERED)
}

impl Campaign {
    /// Scan a folder for campaign levels. A missing folder is an empty campaign.
    pub fn scan(dir: &Path) -> Result<Self, LevelError> {
        if !dir.is_dir() {
            log::warn!("Campaign folder {} not found", dir.display());
            return Ok(Self::default());
        }

        let entries = fs::read_dir(dir).map_err(|source| LevelError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut levels: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(EXTENSION))
            })
            .collect();

        levels.sort_by_key(|p| {
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (level_number(&stem), stem)
        });

        log::info!("Campaign: {} levels in {}", levels.len(), dir.display());
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.levels.get(index).map(PathBuf::as_path)
    }

    /// Display name (file stem) of a level
    pub fn name(&self, index: usize) -> Option<String> {
        self.path(index)
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    }

    pub fn load(&self, index: usize) -> Result<LevelData, LevelError> {
        let path = self
            .path(index)
            .ok_or_else(|| LevelError::NotFound(PathBuf::from(format!("campaign level #{index}"))))?;
        LevelStore::load(path)
    }

    /// Index of the level after `index`, if the campaign has one
    pub fn next_level(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.levels.len()).then_some(next)
    }
}

/// Campaign completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Highest completed level index, -1 when nothing is done yet
    pub play_progress: i32,
}

impl Default for Progress {
    fn default() -> Self {
        Self { play_progress: -1 }
    }
}

impl Progress {
    /// File name under the data directory
    const FILE_NAME: &'static str = "progress.json";

    pub fn is_locked(&self, index: usize) -> bool {
        index as i64 > i64::from(self.play_progress) + 1
    }

    /// Record a finished level. Returns true if progress advanced.
    pub fn record_completion(&mut self, index: usize) -> bool {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        if index > self.play_progress {
            self.play_progress = index;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.play_progress = -1;
    }

    /// Load progress; missing or unreadable files start fresh
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(Self::FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(progress) => {
                    log::info!("Loaded campaign progress from {}", path.display());
                    progress
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt progress file {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No campaign progress found, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), LevelError> {
        fs::create_dir_all(data_dir).map_err(|source| LevelError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let path = data_dir.join(Self::FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| LevelError::Io { path, source })?;
        log::info!("Campaign progress saved ({})", self.play_progress);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_number() {
        assert_eq!(level_number("Level12"), 12);
        assert_eq!(level_number("Level2"), 2);
        assert_eq!(level_number("Bonus"), UNNUMBERED);
    }

    #[test]
    fn test_scan_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Level10", "Level2", "Level1", "Bonus"] {
            let path = dir.path().join(format!("{name}.json"));
            fs::write(path, r#"{"levelName":"x","elements":[]}"#).unwrap();
        }
        fs::write(dir.path().join("readme.md"), "x").unwrap();

        let campaign = Campaign::scan(dir.path()).unwrap();
        let names: Vec<_> = (0..campaign.len())
            .filter_map(|i| campaign.name(i))
            .collect();
        assert_eq!(names, ["Level1", "Level2", "Level10", "Bonus"]);
        assert_eq!(campaign.next_level(2), Some(3));
        assert_eq!(campaign.next_level(3), None);
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let campaign = Campaign::scan(&dir.path().join("missing")).unwrap();
        assert!(campaign.is_empty());
        assert!(campaign.load(0).is_err());
    }

    #[test]
    fn test_progress_unlocking() {
        let mut progress = Progress::default();
        assert!(!progress.is_locked(0));
        assert!(progress.is_locked(1));

        assert!(progress.record_completion(0));
        assert!(!progress.is_locked(1));
        assert!(progress.is_locked(2));

        // Replaying an earlier level never lowers progress
        assert!(progress.record_completion(3));
        assert!(!progress.record_completion(1));
        assert_eq!(progress.play_progress, 3);

        progress.reset();
        assert_eq!(progress, Progress::default());
    }

    #[test]
    fn test_progress_persistence() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Progress::load(dir.path()), Progress::default());

        let progress = Progress { play_progress: 4 };
        progress.save(dir.path()).unwrap();
        assert_eq!(Progress::load(dir.path()), progress);

        fs::write(dir.path().join("progress.json"), "garbage").unwrap();
        assert_eq!(Progress::load(dir.path()), Progress::default());
    }
}
