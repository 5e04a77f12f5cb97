//! The board: every element of a loaded level plus the queries the run,
//! editor and play modes need

use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::element::{Element, ElementId, ElementKind};
use crate::consts::*;
use crate::level::{LevelData, PrefabKey};

/// Axis-aligned world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// All elements of a level, ordered by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    pub elements: Vec<Element>,
    next_id: ElementId,
}

impl Board {
    /// Build from level data. Unknown keys are skipped; teleporters are paired.
    pub fn from_level(level: &LevelData) -> Self {
        let mut board = Self {
            name: level.level_name.clone(),
            elements: Vec::with_capacity(level.elements.len()),
            next_id: 0,
        };

        for data in &level.elements {
            let id = board.next_id;
            match Element::from_data(id, data) {
                Some(element) => {
                    board.elements.push(element);
                    board.next_id += 1;
                }
                None => log::warn!("Unknown prefab key '{}', skipped", data.prefab_key),
            }
        }

        board.resolve_teleporters();
        board
    }

    pub fn to_level_data(&self) -> LevelData {
        LevelData {
            level_name: self.name.clone(),
            elements: self.elements.iter().map(Element::to_data).collect(),
        }
    }

    /// Add an element, assigning it the next id
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        element.id = id;
        self.elements.push(element);
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        let removed = self.elements.remove(index);
        if let Some(partner) = removed.paired.and_then(|p| self.get_mut(p)) {
            partner.paired = None;
        }
        Some(removed)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn element_at(&self, cell: IVec2) -> Option<&Element> {
        self.elements.iter().find(|e| e.cell == cell)
    }

    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind == kind).count()
    }

    pub fn star_count(&self) -> usize {
        self.count_kind(ElementKind::Star)
    }

    pub fn endpoint_count(&self) -> usize {
        self.count_kind(ElementKind::EndPoint)
    }

    /// Cell of the first ball spawn
    pub fn spawn_cell(&self) -> Option<IVec2> {
        self.elements
            .iter()
            .find(|e| e.key == PrefabKey::BallSpawn)
            .map(|e| e.cell)
    }

    /// Link teleporters sharing a pair id. Only groups of exactly two link;
    /// anything else is left unpaired.
    pub fn resolve_teleporters(&mut self) {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, element) in self.elements.iter_mut().enumerate() {
            if element.kind != ElementKind::Teleporter {
                continue;
            }
            element.paired = None;
            if let Some(pid) = &element.pair_id {
                groups.entry(pid.clone()).or_default().push(index);
            }
        }

        for (pid, members) in groups {
            if let &[a, b] = members.as_slice() {
                let (id_a, id_b) = (self.elements[a].id, self.elements[b].id);
                self.elements[a].paired = Some(id_b);
                self.elements[b].paired = Some(id_a);
            } else {
                log::warn!(
                    "Pair id {pid}: {} teleporter(s), expected 2",
                    members.len()
                );
            }
        }
    }

    /// Quarter-turn the element at `cell` if it is rotatable
    pub fn rotate_at(&mut self, cell: IVec2) -> bool {
        self.elements
            .iter_mut()
            .find(|e| e.cell == cell)
            .is_some_and(Element::rotate_step)
    }

    /// Give every rotatable element 0..=3 extra quarter turns.
    /// Returns how many actually changed.
    pub fn randomize_rotations<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut rotated = 0;
        let mut total = 0;
        for element in self.elements.iter_mut().filter(|e| e.is_rotatable()) {
            total += 1;
            let steps: u8 = rng.random_range(0..4);
            if steps > 0 {
                rotated += 1;
            }
            for _ in 0..steps {
                element.rotate_step();
            }
        }
        log::info!("Rotatables: {total} | Rotated: {rotated}");
        rotated
    }

    /// Play area: bounding box of all elements plus the viewport margin
    pub fn bounds(&self) -> Bounds {
        let Some(first) = self.elements.first() else {
            let m = Vec2::splat(VIEWPORT_MARGIN_CELLS * CELL_SIZE);
            return Bounds { min: -m, max: m };
        };

        let (min, max) = self
            .elements
            .iter()
            .map(Element::world_pos)
            .fold((first.world_pos(), first.world_pos()), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        let margin = Vec2::splat((VIEWPORT_MARGIN_CELLS + 0.5) * CELL_SIZE);
        Bounds {
            min: min - margin,
            max: max + margin,
        }
    }

    /// Restore stars, breakables and activables to their pre-run state
    pub fn reset_runtime(&mut self) {
        for element in &mut self.elements {
            element.reset_runtime();
        }
    }
}

/// Stable display colour for a teleporter pair (HSV with s 0.7, v 1.0)
pub fn pair_tint(pair_id: &str) -> [u8; 3] {
    // FNV-1a keeps the hue stable across runs and platforms
    let hash = pair_id
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let hue = (hash & 0x7fff_ffff) % 360;
    hsv_to_rgb(hue as f32 / 360.0, 0.7, 1.0)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match sector as i32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to_byte = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}
