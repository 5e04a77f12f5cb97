//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by element ID)
//! - No rendering or platform dependencies

pub mod ball;
pub mod board;
pub mod direction;
pub mod element;
pub mod state;
pub mod tick;

pub use ball::BallRunner;
pub use board::{Board, Bounds, pair_tint};
pub use direction::{Diagonal, Direction};
pub use element::{Activable, BreakableOnce, Element, ElementId, ElementKind};
pub use state::{GameEvent, RunConfig, RunError, RunOutcome, RunPhase, RunState};
pub use tick::{run_to_end, tick};
