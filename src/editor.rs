//! Level editor session
//!
//! Holds the board being edited, the selected tool, and the path the level
//! was opened from. Playtesting runs on a copy of the board so a test never
//! changes what gets saved.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::IVec2;
use thiserror::Error;

use crate::level::{ElementData, GridPos, LevelData, LevelError, LevelStore, PrefabKey};
use crate::settings::Settings;
use crate::sim::{Board, Element, ElementId, ElementKind, RunConfig, RunState};

/// Active editor tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Place(PrefabKey),
    Delete,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("cell {0} is already occupied")]
    CellOccupied(GridPos),
    #[error("no element selected for placement")]
    NothingSelected,
    #[error("the level needs a ball spawn")]
    NoBallSpawn,
    #[error("the level needs an endpoint")]
    NoEndPoint,
    #[error("there must be exactly 3 stars on the field (found {found})")]
    WrongStarCount { found: usize },
    #[error("stop the playtest before editing")]
    Playtesting,
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// One editing session over a single level
#[derive(Debug)]
pub struct LevelEditor {
    store: LevelStore,
    board: Board,
    current_path: Option<PathBuf>,
    tool: Option<Tool>,
    /// Pair id waiting for its second teleporter
    pending_pair: Option<String>,
    playtest: Option<RunState>,
}

impl LevelEditor {
    /// Start an empty level
    pub fn new(store: LevelStore) -> Self {
        Self {
            store,
            board: Board::from_level(&LevelData::default()),
            current_path: None,
            tool: None,
            pending_pair: None,
            playtest: None,
        }
    }

    /// Edit an existing level file
    pub fn open(store: LevelStore, path: &Path) -> Result<Self, EditorError> {
        let data = LevelStore::load(path)?;
        let mut editor = Self::new(store);
        editor.board = Board::from_level(&data);
        editor.current_path = Some(path.to_path_buf());
        Ok(editor)
    }

    /// Open a level by name or path, or start a new one there if it doesn't exist
    pub fn open_or_create(store: LevelStore, name_or_path: &str) -> Result<Self, EditorError> {
        let path = store.resolve(name_or_path)?;
        if path.is_file() {
            return Self::open(store, &path);
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name_or_path.to_string());
        log::info!("Creating new level '{name}'");
        let mut editor = Self::new(store);
        editor.board = Board::from_level(&LevelData::named(name));
        editor.current_path = Some(path);
        Ok(editor)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn level_data(&self) -> LevelData {
        self.board.to_level_data()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    /// True while the first end of a teleporter pair waits for its partner
    pub fn pairing_pending(&self) -> bool {
        self.pending_pair.is_some()
    }

    pub fn is_playtesting(&self) -> bool {
        self.playtest.is_some()
    }

    pub fn select(&mut self, key: PrefabKey) {
        self.tool = Some(Tool::Place(key));
    }

    /// Switch between the delete tool and placing
    pub fn toggle_delete(&mut self) {
        self.tool = match self.tool {
            Some(Tool::Delete) => None,
            _ => Some(Tool::Delete),
        };
    }

    /// Place the selected element. Rotation is ignored for fixed elements.
    pub fn place(&mut self, cell: IVec2, rotation: u8) -> Result<ElementId, EditorError> {
        self.ensure_editable()?;
        let Some(Tool::Place(key)) = self.tool else {
            return Err(EditorError::NothingSelected);
        };
        if self.board.element_at(cell).is_some() {
            return Err(EditorError::CellOccupied(cell.into()));
        }

        let rotation = if key.is_rotatable() { rotation & 3 } else { 0 };
        let data = ElementData::new(key, cell.into(), rotation);
        let mut element = Element::from_data(0, &data).ok_or(EditorError::NothingSelected)?;

        if element.kind == ElementKind::Teleporter {
            match self.pending_pair.take() {
                Some(pid) => {
                    // Second end: pair complete
                    element.pair_id = Some(pid);
                    self.tool = None;
                }
                None => {
                    let pid = uuid::Uuid::new_v4().to_string();
                    element.pair_id = Some(pid.clone());
                    self.pending_pair = Some(pid);
                }
            }
        } else {
            self.tool = None;
        }

        let id = self.board.insert(element);
        if key == PrefabKey::Teleporter {
            self.board.resolve_teleporters();
        }
        log::debug!("Placed {key} at {cell}");
        Ok(id)
    }

    /// Remove the element at `cell`. A teleporter takes its partner with it.
    /// Returns how many elements were removed.
    pub fn delete(&mut self, cell: IVec2) -> Result<usize, EditorError> {
        self.ensure_editable()?;
        let Some(target) = self.board.element_at(cell) else {
            return Ok(0);
        };

        let mut doomed = vec![target.id];
        if target.kind == ElementKind::Teleporter {
            let partner = match &target.pair_id {
                Some(pid) => self
                    .board
                    .elements
                    .iter()
                    .find(|e| {
                        e.id != target.id
                            && e.kind == ElementKind::Teleporter
                            && e.pair_id.as_ref() == Some(pid)
                    })
                    .map(|e| e.id),
                None => target.paired,
            };
            doomed.extend(partner);

            if target.pair_id.is_some() && target.pair_id == self.pending_pair {
                self.pending_pair = None;
            }
        }

        for id in &doomed {
            self.board.remove(*id);
        }
        log::debug!("Deleted {} element(s) at {cell}", doomed.len());
        Ok(doomed.len())
    }

    /// Quarter-turn the element at `cell`; false if empty or fixed
    pub fn rotate(&mut self, cell: IVec2) -> Result<bool, EditorError> {
        self.ensure_editable()?;
        Ok(self.board.rotate_at(cell))
    }

    /// Overwrite the file being edited, or save as a new file when there
    /// is none yet
    pub fn save(&mut self) -> Result<PathBuf, EditorError> {
        self.ensure_editable()?;
        let data = self.board.to_level_data();

        if let Some(path) = self.current_path.as_ref().filter(|p| p.is_file()) {
            self.store.save_overwrite(&data, path)?;
            return Ok(path.clone());
        }

        let mut data = data;
        if data.level_name.trim().is_empty() {
            data.level_name = auto_name();
            log::warn!("Level has no name, saving as '{}'", data.level_name);
        }
        let path = match self.current_path.as_ref() {
            // New level created at a chosen path
            Some(path) => {
                self.store.save_overwrite(&data, path)?;
                path.clone()
            }
            None => self.store.save(&mut data)?,
        };
        self.board.name = data.level_name;
        self.current_path = Some(path.clone());
        Ok(path)
    }

    /// Save a copy under a new name; the copy becomes the file being edited
    pub fn save_as(&mut self, name: &str) -> Result<PathBuf, EditorError> {
        self.ensure_editable()?;
        let mut data = self.board.to_level_data();
        data.level_name = name.trim().to_string();
        let path = self.store.save(&mut data)?;
        self.board.name = data.level_name;
        self.current_path = Some(path.clone());
        Ok(path)
    }

    /// Validate the level and start a test run on a copy of the board
    pub fn playtest(&mut self, settings: &Settings) -> Result<&mut RunState, EditorError> {
        self.ensure_editable()?;
        if self.board.spawn_cell().is_none() {
            return Err(EditorError::NoBallSpawn);
        }
        if self.board.endpoint_count() == 0 {
            return Err(EditorError::NoEndPoint);
        }

        let found = self.board.star_count();
        let mut config = RunConfig::from_settings(settings);
        if settings.require_exactly_three_stars {
            if found != 3 {
                return Err(EditorError::WrongStarCount { found });
            }
            config.stars_needed = Some(3);
        }

        let mut board = self.board.clone();
        board.resolve_teleporters();
        let mut state = RunState::new(board, config);
        state.start().map_err(|_| EditorError::NoBallSpawn)?;
        log::info!("Playtest started ({found} star(s))");
        Ok(self.playtest.insert(state))
    }

    /// The running playtest, if any
    pub fn playtest_state(&mut self) -> Option<&mut RunState> {
        self.playtest.as_mut()
    }

    /// End the playtest; the edited board is untouched
    pub fn stop_playtest(&mut self) -> Option<RunState> {
        let state = self.playtest.take();
        if state.is_some() {
            log::info!("Playtest stopped");
        }
        state
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        if self.is_playtesting() {
            Err(EditorError::Playtesting)
        } else {
            Ok(())
        }
    }
}

fn auto_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("Level_{secs}")
}
