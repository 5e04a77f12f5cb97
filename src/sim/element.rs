//! Runtime level elements and their small state machines

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::direction::{Diagonal, Direction, rotate_ivec, rotation_steps};
use crate::grid_to_world;
use crate::level::{ElementData, PrefabKey};

/// Stable id of an element within one board (its load order)
pub type ElementId = u32;

/// Behaviour family of an element; gate variants collapse onto their base kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Line,
    Arrow,
    Triangle,
    Star,
    Teleporter,
    EndPoint,
    BallSpawn,
}

impl From<PrefabKey> for ElementKind {
    fn from(key: PrefabKey) -> Self {
        match key {
            PrefabKey::Line | PrefabKey::LineOneUse | PrefabKey::LineSpawnable => ElementKind::Line,
            PrefabKey::Arrow => ElementKind::Arrow,
            PrefabKey::Triangle | PrefabKey::TriangleOneUse | PrefabKey::TriangleSpawnable => {
                ElementKind::Triangle
            }
            PrefabKey::Star => ElementKind::Star,
            PrefabKey::Teleporter => ElementKind::Teleporter,
            PrefabKey::EndPoint => ElementKind::EndPoint,
            PrefabKey::BallSpawn => ElementKind::BallSpawn,
        }
    }
}

/// Gate that lets the first contact through untouched and acts afterwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activable {
    armed: bool,
}

impl Activable {
    /// True if the element should act on this contact. The first call arms
    /// the gate and returns false.
    pub fn allow_interaction(&mut self) -> bool {
        if self.armed {
            return true;
        }
        self.armed = true;
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn reset(&mut self) {
        self.armed = false;
    }
}

/// Obstacle that disappears after its first use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakableOnce {
    used: bool,
}

impl BreakableOnce {
    /// Mark as used. Returns true only for the call that broke it.
    pub fn consume(&mut self) -> bool {
        if self.used {
            return false;
        }
        self.used = true;
        true
    }

    pub fn is_broken(&self) -> bool {
        self.used
    }

    pub fn restore(&mut self) {
        self.used = false;
    }
}

/// A placed element with its runtime state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub guid: String,
    pub key: PrefabKey,
    pub kind: ElementKind,
    pub cell: IVec2,
    /// Quarter turns counter-clockwise, 0..=3
    pub rotation: u8,
    pub activable: Option<Activable>,
    pub breakable: Option<BreakableOnce>,
    /// Collected stars are hidden until the run resets
    pub hidden: bool,
    pub pair_id: Option<String>,
    /// Linked partner, set by teleporter resolution
    pub paired: Option<ElementId>,
}

impl Element {
    /// Build from serialized data. Unknown prefab keys yield None.
    pub fn from_data(id: ElementId, data: &ElementData) -> Option<Self> {
        let key = data.key()?;
        let guid = if data.guid.trim().is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            data.guid.clone()
        };

        Some(Self {
            id,
            guid,
            key,
            kind: key.into(),
            cell: data.grid_pos.into(),
            rotation: rotation_steps(data.rotation_steps),
            activable: (data.is_activable || key.implies_activable()).then(Activable::default),
            breakable: (data.is_breakable || key.implies_breakable()).then(BreakableOnce::default),
            hidden: false,
            pair_id: data.pair_id().map(str::to_string),
            paired: None,
        })
    }

    /// Serialized form. Gate flags are only written when the key doesn't
    /// already imply them.
    pub fn to_data(&self) -> ElementData {
        ElementData {
            guid: self.guid.clone(),
            prefab_key: self.key.as_str().to_string(),
            grid_pos: self.cell.into(),
            rotation_steps: i32::from(self.rotation),
            is_breakable: self.breakable.is_some() && !self.key.implies_breakable(),
            is_activable: self.activable.is_some() && !self.key.implies_activable(),
            pair_id: self.pair_id.clone().unwrap_or_default(),
        }
    }

    pub fn world_pos(&self) -> Vec2 {
        grid_to_world(self.cell)
    }

    pub fn is_broken(&self) -> bool {
        self.breakable.is_some_and(|b| b.is_broken())
    }

    /// Whether the ball can currently touch this element
    pub fn is_present(&self) -> bool {
        !self.hidden && !self.is_broken()
    }

    pub fn is_rotatable(&self) -> bool {
        self.key.is_rotatable()
    }

    /// Turn a quarter step counter-clockwise. Non-rotatable elements ignore it.
    pub fn rotate_step(&mut self) -> bool {
        if !self.is_rotatable() {
            return false;
        }
        self.rotation = (self.rotation + 1) & 3;
        true
    }

    /// Heading an arrow sends the ball in
    pub fn arrow_direction(&self) -> Direction {
        Direction::from_rotation_steps(self.rotation)
    }

    /// Diagonal a line or triangle hypotenuse lies on
    pub fn diagonal(&self) -> Diagonal {
        Diagonal::from_rotation_steps(self.rotation)
    }

    /// Outward normal of a triangle's hypotenuse (diagonal, unnormalized).
    /// At rotation 0 the solid half is bottom-left and the hypotenuse faces up-right.
    pub fn hypotenuse_normal(&self) -> IVec2 {
        rotate_ivec(IVec2::ONE, self.rotation)
    }

    /// Gate the contact through the activable state, if any
    pub fn allow_interaction(&mut self) -> bool {
        self.activable.as_mut().is_none_or(Activable::allow_interaction)
    }

    /// Consume a breakable; true if this contact broke the element
    pub fn consume(&mut self) -> bool {
        self.breakable.as_mut().is_some_and(BreakableOnce::consume)
    }

    /// Back to the pre-run state (stars visible, gates disarmed, nothing broken)
    pub fn reset_runtime(&mut self) {
        self.hidden = false;
        if let Some(a) = self.activable.as_mut() {
            a.reset();
        }
        if let Some(b) = self.breakable.as_mut() {
            b.restore();
        }
    }
}
