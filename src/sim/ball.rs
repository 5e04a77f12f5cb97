//! The moving ball
//!
//! The ball always travels along one axis at constant speed and is held on
//! the centre line of its lane, so every redirect lands it on a clean row or
//! column.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::element::ElementId;
use crate::consts::*;
use crate::round_to_lane;

/// Ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallRunner {
    pub pos: Vec2,
    pub dir: Direction,
    /// Cells per second
    pub speed: f32,
    pub radius: f32,
    running: bool,
    /// Seconds left before an element may trigger again
    cooldowns: BTreeMap<ElementId, f32>,
}

impl BallRunner {
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            dir: Direction::Down,
            speed,
            radius: BALL_RADIUS,
            running: false,
            cooldowns: BTreeMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start moving: always heads down from the spawn
    pub fn start_run(&mut self) {
        self.dir = Direction::Down;
        self.running = true;
        self.cooldowns.clear();
        self.snap_to_axis_center();
    }

    pub fn stop_run(&mut self) {
        self.running = false;
    }

    /// Move one step and decay cooldowns
    pub fn advance(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.decay_cooldowns(dt);
        self.move_by(self.speed * dt);
    }

    /// Move `distance` cells along the current direction, held on the lane
    pub fn move_by(&mut self, distance: f32) {
        if !self.running {
            return;
        }
        let mut next = self.pos + self.dir.to_vec() * distance;
        // Lock the axis perpendicular to travel onto the lane
        if self.dir.is_horizontal() {
            next.y = round_to_lane(self.pos.y, CELL_SIZE);
        } else {
            next.x = round_to_lane(self.pos.x, CELL_SIZE);
        }
        self.pos = next;
    }

    pub fn decay_cooldowns(&mut self, dt: f32) {
        self.cooldowns.retain(|_, t| {
            *t -= dt;
            *t > 0.0
        });
    }

    /// Redirect along the dominant axis of `v`
    pub fn set_direction_vec(&mut self, v: Vec2) {
        self.set_direction(Direction::from_vec(v));
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.dir = dir;
        self.snap_to_axis_center();
    }

    /// Jump to a position and re-centre on the lane
    pub fn teleport_to(&mut self, pos: Vec2) {
        self.pos = pos;
        self.snap_to_axis_center();
    }

    /// Block re-triggering of an element for `seconds`; keeps the longer of
    /// an existing cooldown and the new one
    pub fn add_cooldown(&mut self, id: ElementId, seconds: f32) {
        let entry = self.cooldowns.entry(id).or_insert(seconds);
        *entry = entry.max(seconds);
    }

    pub fn on_cooldown(&self, id: ElementId) -> bool {
        self.cooldowns.contains_key(&id)
    }

    fn snap_to_axis_center(&mut self) {
        if self.dir.is_horizontal() {
            self.pos.y = round_to_lane(self.pos.y, CELL_SIZE);
        } else {
            self.pos.x = round_to_lane(self.pos.x, CELL_SIZE);
        }
    }
}
