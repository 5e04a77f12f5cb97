//! Compass directions and diagonal reflection rules
//!
//! Every redirect in the puzzle is a lookup over four directions; this
//! module holds those tables.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// One of the four axis directions the ball can travel in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Normalize any rotation step count to 0..=3 (quarter turns, counter-clockwise)
#[inline]
pub fn rotation_steps(raw: i32) -> u8 {
    raw.rem_euclid(4) as u8
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    /// Unit vector for this direction (y up)
    pub fn to_vec(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
        }
    }

    pub fn to_ivec(self) -> IVec2 {
        self.to_vec().as_ivec2()
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Collapse an arbitrary vector onto its dominant axis.
    /// Ties go to the vertical axis; a zero vector reads as Up.
    pub fn from_vec(v: Vec2) -> Self {
        if v.x.abs() > v.y.abs() {
            if v.x >= 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if v.y >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Direction an element points at after `steps` quarter turns from Right
    pub fn from_rotation_steps(steps: u8) -> Self {
        Self::ALL[(steps & 3) as usize]
    }

    /// Rotate counter-clockwise by `steps` quarter turns
    pub fn rotated(self, steps: u8) -> Self {
        let index = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(index + steps as usize) & 3]
    }

    /// Heading in degrees (Right = 0, counter-clockwise)
    pub fn angle_degrees(self) -> f32 {
        match self {
            Direction::Right => 0.0,
            Direction::Up => 90.0,
            Direction::Left => 180.0,
            Direction::Down => 270.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Orientation of a diagonal deflector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagonal {
    /// `\` running from top-left to bottom-right
    Backslash,
    /// `/` running from bottom-left to top-right
    Slash,
}

impl Diagonal {
    /// Even rotations lie on `\`, odd ones on `/`
    pub fn from_rotation_steps(steps: u8) -> Self {
        if steps % 2 == 0 {
            Diagonal::Backslash
        } else {
            Diagonal::Slash
        }
    }

    /// Mirror a travel direction off this diagonal
    pub fn reflect(self, dir: Direction) -> Direction {
        match (self, dir) {
            (Diagonal::Backslash, Direction::Right) => Direction::Down,
            (Diagonal::Backslash, Direction::Down) => Direction::Right,
            (Diagonal::Backslash, Direction::Left) => Direction::Up,
            (Diagonal::Backslash, Direction::Up) => Direction::Left,
            (Diagonal::Slash, Direction::Right) => Direction::Up,
            (Diagonal::Slash, Direction::Up) => Direction::Right,
            (Diagonal::Slash, Direction::Left) => Direction::Down,
            (Diagonal::Slash, Direction::Down) => Direction::Left,
        }
    }
}

/// Rotate an integer vector counter-clockwise by quarter turns
pub fn rotate_ivec(v: IVec2, steps: u8) -> IVec2 {
    (0..(steps & 3)).fold(v, |acc, _| IVec2::new(-acc.y, acc.x))
}
