//! Level file storage
//!
//! User-made levels live as pretty-printed JSON files in one folder under
//! the data directory. File names are the level names; collisions get a
//! ` (n)` suffix instead of overwriting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{LevelData, LevelError};

/// Folder (under the data directory) holding user levels
pub const FOLDER_NAME: &str = "HandMainLevel";
/// Level file extension, including the dot
pub const EXTENSION: &str = ".json";

/// Listing entry for a stored level
#[derive(Debug, Clone)]
pub struct LevelInfo {
    /// File stem
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

/// Folder-backed level storage
#[derive(Debug, Clone)]
pub struct LevelStore {
    root: PathBuf,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> LevelError + '_ {
    move |source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl LevelStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join(FOLDER_NAME),
        }
    }

    /// Level folder, created on first use
    pub fn root(&self) -> Result<&Path, LevelError> {
        if !self.root.is_dir() {
            fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        }
        Ok(&self.root)
    }

    /// All stored levels, newest first
    pub fn list(&self) -> Result<Vec<LevelInfo>, LevelError> {
        let root = self.root()?;
        let mut levels = Vec::new();

        for entry in fs::read_dir(root).map_err(io_err(root))?.flatten() {
            let path = entry.path();
            let is_level = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(EXTENSION));
            if !is_level || !path.is_file() {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                log::warn!("Skipping unreadable level entry {}", path.display());
                continue;
            };
            levels.push(LevelInfo {
                name: file_stem(&path),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size_bytes: meta.len(),
                path,
            });
        }

        levels.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(levels)
    }

    /// First free path for `base_name`: `Name.json`, `Name (1).json`, ...
    pub fn make_unique_path(&self, base_name: &str) -> Result<PathBuf, LevelError> {
        let root = self.root()?;
        let safe = match base_name.trim() {
            "" => "Level",
            name => name,
        };

        let mut path = root.join(format!("{safe}{EXTENSION}"));
        let mut i = 1;
        while path.exists() {
            path = root.join(format!("{safe} ({i}){EXTENSION}"));
            i += 1;
        }
        Ok(path)
    }

    /// Save as a new file named after the level; returns the path written
    pub fn save(&self, data: &mut LevelData) -> Result<PathBuf, LevelError> {
        if data.level_name.trim().is_empty() {
            data.level_name = "Level".to_string();
        }
        let path = self.make_unique_path(&data.level_name)?;
        write_level(data, &path)?;
        log::info!("Level saved: {}", path.display());
        Ok(path)
    }

    /// Replace an existing file (parent folders are created if needed)
    pub fn save_overwrite(&self, data: &LevelData, path: &Path) -> Result<(), LevelError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        write_level(data, path)?;
        log::info!("Level overwritten: {}", path.display());
        Ok(())
    }

    /// Load a level file. A blank level name falls back to the file stem.
    pub fn load(path: &Path) -> Result<LevelData, LevelError> {
        if !path.is_file() {
            return Err(LevelError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path).map_err(io_err(path))?;
        let mut data: LevelData =
            serde_json::from_str(&json).map_err(|source| LevelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if data.level_name.trim().is_empty() {
            data.level_name = file_stem(path);
        }
        log::info!(
            "Loaded level '{}' ({} elements)",
            data.level_name,
            data.elements.len()
        );
        Ok(data)
    }

    /// Delete a level file; missing files are ignored
    pub fn delete(path: &Path) -> Result<(), LevelError> {
        if path.is_file() {
            fs::remove_file(path).map_err(io_err(path))?;
            log::info!("Level deleted: {}", path.display());
        }
        Ok(())
    }

    /// Delete a saved level by name or path
    pub fn remove(&self, name_or_path: &str) -> Result<PathBuf, LevelError> {
        let path = self.resolve(name_or_path)?;
        if !path.is_file() {
            return Err(LevelError::NotFound(path));
        }
        Self::delete(&path)?;
        Ok(path)
    }

    /// Resolve a CLI argument to a level path: existing paths are used as is,
    /// bare names map into the level folder
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf, LevelError> {
        let direct = PathBuf::from(name_or_path);
        if direct.is_file() || name_or_path.ends_with(EXTENSION) {
            return Ok(direct);
        }
        Ok(self.root()?.join(format!("{}{EXTENSION}", name_or_path.trim())))
    }
}

fn write_level(data: &LevelData, path: &Path) -> Result<(), LevelError> {
    let json = data.to_json()?;
    fs::write(path, json).map_err(io_err(path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ElementData, GridPos, PrefabKey};

    fn sample(name: &str) -> LevelData {
        let mut level = LevelData::named(name);
        level
            .elements
            .push(ElementData::new(PrefabKey::BallSpawn, GridPos::new(0, 2), 0));
        level
    }

    #[test]
    fn test_save_picks_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());

        let first = store.save(&mut sample("Maze")).unwrap();
        let second = store.save(&mut sample("Maze")).unwrap();
        let third = store.save(&mut sample("  Maze ")).unwrap();

        assert_eq!(first.file_name().unwrap(), "Maze.json");
        assert_eq!(second.file_name().unwrap(), "Maze (1).json");
        assert_eq!(third.file_name().unwrap(), "Maze (2).json");
    }

    #[test]
    fn test_blank_name_becomes_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());
        let mut data = sample("   ");
        let path = store.save(&mut data).unwrap();
        assert_eq!(data.level_name, "Level");
        assert_eq!(path.file_name().unwrap(), "Level.json");
    }

    #[test]
    fn test_load_round_trip_and_name_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());
        let path = store.root().unwrap().join("Fallback.json");
        store.save_overwrite(&sample(""), &path).unwrap();

        let loaded = LevelStore::load(&path).unwrap();
        assert_eq!(loaded.level_name, "Fallback");
        assert_eq!(loaded.elements.len(), 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            LevelStore::load(&missing),
            Err(LevelError::NotFound(_))
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            LevelStore::load(&broken),
            Err(LevelError::Parse { .. })
        ));
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());
        let a = store.save(&mut sample("A")).unwrap();
        store.save(&mut sample("B")).unwrap();
        fs::write(store.root().unwrap().join("notes.txt"), "x").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|l| l.size_bytes > 0));

        LevelStore::delete(&a).unwrap();
        LevelStore::delete(&a).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["B".to_string()]);
    }

    #[test]
    fn test_remove_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LevelStore::new(dir.path());
        let saved = store.save(&mut sample("Spiral")).unwrap();

        assert_eq!(store.remove("Spiral").unwrap(), saved);
        assert!(!saved.exists());
        assert!(matches!(
            store.remove("Spiral"),
            Err(LevelError::NotFound(_))
        ));
        assert!(store.list().unwrap().is_empty());
    }
}
