//! Level data model
//!
//! The serialized form of a level: a name plus a flat list of placed
//! elements. Field names match the JSON files written by earlier builds
//! of the game (camelCase, `gridPos` as an `{x, y}` object).

pub mod campaign;
pub mod io;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use campaign::{Campaign, Progress};
pub use io::{LevelInfo, LevelStore};

/// Errors raised while reading or writing level files
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize level: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Integer grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<IVec2> for GridPos {
    fn from(v: IVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<GridPos> for IVec2 {
    fn from(p: GridPos) -> Self {
        IVec2::new(p.x, p.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for GridPos {
    type Err = String;

    /// Parses `x,y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected x,y but got '{s}'"))?;
        let x = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
        let y = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
        Ok(Self { x, y })
    }
}

/// Element type keys as stored in level files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefabKey {
    Line,
    LineOneUse,
    LineSpawnable,
    Arrow,
    Triangle,
    TriangleOneUse,
    TriangleSpawnable,
    Star,
    Teleporter,
    EndPoint,
    BallSpawn,
}

impl PrefabKey {
    pub const ALL: [PrefabKey; 11] = [
        PrefabKey::Line,
        PrefabKey::LineOneUse,
        PrefabKey::LineSpawnable,
        PrefabKey::Arrow,
        PrefabKey::Triangle,
        PrefabKey::TriangleOneUse,
        PrefabKey::TriangleSpawnable,
        PrefabKey::Star,
        PrefabKey::Teleporter,
        PrefabKey::EndPoint,
        PrefabKey::BallSpawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrefabKey::Line => "Line",
            PrefabKey::LineOneUse => "LineOneUse",
            PrefabKey::LineSpawnable => "LineSpawnable",
            PrefabKey::Arrow => "Arrow",
            PrefabKey::Triangle => "Triangle",
            PrefabKey::TriangleOneUse => "TriangleOneUse",
            PrefabKey::TriangleSpawnable => "TriangleSpawnable",
            PrefabKey::Star => "Star",
            PrefabKey::Teleporter => "Teleporter",
            PrefabKey::EndPoint => "EndPoint",
            PrefabKey::BallSpawn => "BallSpawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether the player/editor may turn this element in quarter steps
    pub fn is_rotatable(&self) -> bool {
        !matches!(
            self,
            PrefabKey::EndPoint | PrefabKey::BallSpawn | PrefabKey::Teleporter | PrefabKey::Star
        )
    }

    /// `OneUse` variants break after their first redirect
    pub fn implies_breakable(&self) -> bool {
        matches!(self, PrefabKey::LineOneUse | PrefabKey::TriangleOneUse)
    }

    /// `Spawnable` variants ignore the first pass and act afterwards
    pub fn implies_activable(&self) -> bool {
        matches!(self, PrefabKey::LineSpawnable | PrefabKey::TriangleSpawnable)
    }
}

impl fmt::Display for PrefabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One placed element
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementData {
    pub guid: String,
    /// Kept as a raw string so levels with unknown keys still load
    pub prefab_key: String,
    pub grid_pos: GridPos,
    /// Quarter turns counter-clockwise, 0..=3
    pub rotation_steps: i32,
    pub is_breakable: bool,
    pub is_activable: bool,
    /// Teleporter pairing id, empty when unpaired
    pub pair_id: String,
}

impl ElementData {
    pub fn new(key: PrefabKey, cell: GridPos, rotation_steps: u8) -> Self {
        Self {
            guid: uuid::Uuid::new_v4().to_string(),
            prefab_key: key.as_str().to_string(),
            grid_pos: cell,
            rotation_steps: i32::from(rotation_steps & 3),
            ..Default::default()
        }
    }

    pub fn key(&self) -> Option<PrefabKey> {
        PrefabKey::parse(&self.prefab_key)
    }

    pub fn pair_id(&self) -> Option<&str> {
        let id = self.pair_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// A complete level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelData {
    pub level_name: String,
    pub elements: Vec<ElementData>,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            level_name: "NewLevel".to_string(),
            elements: Vec::new(),
        }
    }
}

impl LevelData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            level_name: name.into(),
            elements: Vec::new(),
        }
    }

    pub fn count_of(&self, key: PrefabKey) -> usize {
        self.elements
            .iter()
            .filter(|e| e.key() == Some(key))
            .count()
    }

    pub fn element_at(&self, cell: GridPos) -> Option<&ElementData> {
        self.elements.iter().find(|e| e.grid_pos == cell)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_json() {
        let json = r#"{
            "levelName": "Intro",
            "elements": [
                {"guid": "a", "prefabKey": "BallSpawn", "gridPos": {"x": 0, "y": 3},
                 "rotationSteps": 0, "isBreakable": false, "isActivable": false, "pairId": ""},
                {"guid": "b", "prefabKey": "TriangleOneUse", "gridPos": {"x": 0, "y": -2},
                 "rotationSteps": 1, "isBreakable": false, "isActivable": false, "pairId": ""}
            ]
        }"#;
        let level: LevelData = serde_json::from_str(json).unwrap();
        assert_eq!(level.level_name, "Intro");
        assert_eq!(level.elements.len(), 2);
        assert_eq!(level.elements[1].key(), Some(PrefabKey::TriangleOneUse));
        assert_eq!(level.elements[1].grid_pos, GridPos::new(0, -2));
        assert_eq!(level.elements[0].pair_id(), None);
    }

    #[test]
    fn test_missing_fields_default() {
        let level: LevelData =
            serde_json::from_str(r#"{"elements":[{"prefabKey":"Star"}]}"#).unwrap();
        assert_eq!(level.level_name, "NewLevel");
        assert_eq!(level.elements[0].rotation_steps, 0);
        assert!(level.elements[0].guid.is_empty());
    }

    #[test]
    fn test_prefab_key_traits() {
        assert_eq!(PrefabKey::parse("lineoneuse"), Some(PrefabKey::LineOneUse));
        assert_eq!(PrefabKey::parse("Wall"), None);
        assert!(PrefabKey::Arrow.is_rotatable());
        assert!(!PrefabKey::Teleporter.is_rotatable());
        assert!(!PrefabKey::Star.is_rotatable());
        assert!(PrefabKey::TriangleOneUse.implies_breakable());
        assert!(PrefabKey::LineSpawnable.implies_activable());
        assert!(!PrefabKey::Line.implies_activable());
    }

    #[test]
    fn test_grid_pos_parse() {
        assert_eq!("3,-4".parse::<GridPos>(), Ok(GridPos::new(3, -4)));
        assert_eq!(" 1 , 2 ".parse::<GridPos>(), Ok(GridPos::new(1, 2)));
        assert!("3".parse::<GridPos>().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut data = ElementData::new(PrefabKey::Teleporter, GridPos::new(1, 2), 0);
        data.pair_id = "p".into();
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"prefabKey\":\"Teleporter\""));
        assert!(json.contains("\"gridPos\":{\"x\":1,\"y\":2}"));
        assert!(json.contains("\"pairId\":\"p\""));
    }
}
