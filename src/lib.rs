//! Lane Runner - A grid lane-routing ball puzzle
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (ball, obstacle rules, win/lose)
//! - `level`: Level data model, JSON file storage, bundled campaign
//! - `editor`: Level editor session (place/rotate/delete/save/playtest)
//! - `play`: Play mode session (campaign or file levels)
//! - `audio` / `fx`: Feedback cue mixing and pooled effects
//! - `settings`: Persisted player preferences

pub mod audio;
pub mod editor;
pub mod fx;
pub mod level;
pub mod play;
pub mod settings;
pub mod sim;

pub use editor::{EditorError, LevelEditor, Tool};
pub use level::{ElementData, GridPos, LevelData, LevelError, PrefabKey};
pub use play::{PlayError, PlayResult, PlaySession};
pub use settings::Settings;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Size of one grid cell in world units
    pub const CELL_SIZE: f32 = 1.0;

    /// Ball defaults
    pub const BALL_SPEED: f32 = 6.0; // cells per second
    pub const BALL_RADIUS: f32 = 0.15;
    pub const BALL_MAX_SPEED: f32 = 60.0;

    /// Longest move between trigger checks, in cells. Kept well under the
    /// 2 * (BALL_RADIUS + TRIGGER_HALF_EXTENT) trigger window.
    pub const MAX_STEP_DISTANCE: f32 = 0.25;
    pub const MAX_SUBSTEPS: usize = 20;

    /// Upper bound for the stall timer (seconds)
    pub const MAX_RUN_SECONDS_LIMIT: f32 = 3600.0;

    /// Half extent of an element's trigger box around its cell centre.
    /// BALL_RADIUS + TRIGGER_HALF_EXTENT must stay below half a cell so a
    /// redirect always snaps onto the element's own lane.
    pub const TRIGGER_HALF_EXTENT: f32 = 0.25;

    /// Cells of slack around the level before the ball counts as lost
    pub const VIEWPORT_MARGIN_CELLS: f32 = 1.0;

    /// Re-trigger cooldowns (seconds)
    pub const HIT_COOLDOWN: f32 = 0.05;
    pub const GATE_PASS_COOLDOWN: f32 = 0.20;
    pub const TRIANGLE_COOLDOWN: f32 = 0.12;
    pub const STAR_GATE_COOLDOWN: f32 = 0.15;
    pub const STAR_COOLDOWN: f32 = 0.10;
    pub const TELEPORT_COOLDOWN: f32 = 0.15;

    /// Distance past the partner teleporter centre where the ball reappears
    pub const TELEPORT_EXIT_OFFSET: f32 = 0.20;
}

/// Round a coordinate to the nearest lane centre
#[inline]
pub fn round_to_lane(v: f32, cell_size: f32) -> f32 {
    (v / cell_size).round() * cell_size
}

/// Convert a grid cell to the world position of its centre
#[inline]
pub fn grid_to_world(cell: IVec2) -> Vec2 {
    cell.as_vec2() * consts::CELL_SIZE
}

/// Convert a world position to the grid cell containing it
#[inline]
pub fn world_to_grid(pos: Vec2) -> IVec2 {
    (pos / consts::CELL_SIZE).round().as_ivec2()
}
