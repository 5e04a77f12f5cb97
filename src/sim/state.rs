//! Run state and core simulation types
//!
//! A run is one launch of the ball across a board, from the spawn until it
//! reaches an endpoint, leaves the play area, or is stopped.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ball::BallRunner;
use super::board::{Board, Bounds};
use super::direction::Direction;
use super::element::ElementId;
use crate::consts::*;
use crate::grid_to_world;
use crate::settings::Settings;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Board loaded, ball not launched; elements may be rotated
    Ready,
    /// Ball moving
    Running,
    /// Run ended
    Finished(RunOutcome),
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Endpoint reached with every required star
    Won,
    /// Endpoint reached too early
    MissingStars { collected: usize, needed: usize },
    /// Ball left the play area
    OutOfBounds,
    /// Ball still moving after the time limit (usually a loop)
    Stalled,
}

impl RunOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, RunOutcome::Won)
    }

    /// Short player-facing message
    pub fn message(&self) -> String {
        match self {
            RunOutcome::Won => "Level finished. Good job!".to_string(),
            RunOutcome::MissingStars { collected, needed } => {
                format!("You missed some stars ({collected}/{needed}). Try again!")
            }
            RunOutcome::OutOfBounds => "The ball went out of the screen. Try again!".to_string(),
            RunOutcome::Stalled => "The ball is going in circles. Try again!".to_string(),
        }
    }
}

/// Feedback events emitted by the simulation, drained by audio/fx
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Ball launched from the spawn
    Launched { pos: Vec2 },
    /// Ball redirected by an arrow, line or triangle
    Hit { pos: Vec2, dir: Direction },
    /// Ball entered a teleporter
    TeleportEnter { pos: Vec2, dir: Direction },
    /// Ball left the partner teleporter
    TeleportExit { pos: Vec2, dir: Direction },
    StarCollected { pos: Vec2 },
    /// First contact armed an activable element
    GateArmed { id: ElementId },
    /// A breakable element was used up
    ElementBroken { id: ElementId },
    /// Ball reached an endpoint
    Goal { pos: Vec2 },
    /// Ball lost
    Fail { pos: Vec2 },
    Ended { outcome: RunOutcome },
}

/// Errors preventing a run from starting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("level has no ball spawn")]
    NoBallSpawn,
}

/// Tunables for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub ball_speed: f32,
    /// Stars required at the endpoint; None means every star on the board
    pub stars_needed: Option<usize>,
    /// Seconds before a still-moving ball counts as stalled
    pub max_run_seconds: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ball_speed: BALL_SPEED,
            stars_needed: None,
            max_run_seconds: 120.0,
        }
    }
}

impl RunConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ball_speed: settings.ball_speed.min(BALL_MAX_SPEED),
            stars_needed: None,
            max_run_seconds: settings.max_run_seconds.min(MAX_RUN_SECONDS_LIMIT),
        }
    }
}

/// Complete run state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub board: Board,
    pub config: RunConfig,
    pub phase: RunPhase,
    /// Present only while running
    pub ball: Option<BallRunner>,
    pub stars_needed: usize,
    pub stars_collected: usize,
    /// Simulation tick counter for the current run
    pub time_ticks: u64,
    /// Seconds simulated in the current run, derived from `time_ticks`
    pub elapsed: f64,
    /// Elements the ball is currently inside (enter already handled)
    pub(crate) inside: BTreeSet<ElementId>,
    pub(crate) bounds: Bounds,
    #[serde(skip)]
    pub(crate) events: Vec<GameEvent>,
}

impl RunState {
    pub fn new(board: Board, config: RunConfig) -> Self {
        let stars_needed = config.stars_needed.unwrap_or_else(|| board.star_count());
        let bounds = board.bounds();
        Self {
            board,
            config,
            phase: RunPhase::Ready,
            ball: None,
            stars_needed,
            stars_collected: 0,
            time_ticks: 0,
            elapsed: 0.0,
            inside: BTreeSet::new(),
            bounds,
            events: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.phase {
            RunPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Launch the ball from the spawn. Runtime element state is reset first.
    pub fn start(&mut self) -> Result<(), RunError> {
        if self.is_running() {
            return Ok(());
        }
        let spawn = self.board.spawn_cell().ok_or(RunError::NoBallSpawn)?;

        self.board.reset_runtime();
        self.board.resolve_teleporters();
        self.stars_needed = self
            .config
            .stars_needed
            .unwrap_or_else(|| self.board.star_count());
        self.stars_collected = 0;
        self.time_ticks = 0;
        self.elapsed = 0.0;
        self.inside.clear();
        self.bounds = self.board.bounds();

        let pos = grid_to_world(spawn);
        let mut ball = BallRunner::new(pos, self.config.ball_speed);
        ball.start_run();
        self.ball = Some(ball);
        self.phase = RunPhase::Running;
        self.events.push(GameEvent::Launched { pos });
        log::debug!("Run started on '{}' from {spawn}", self.board.name);
        Ok(())
    }

    /// Abort the run and put the board back to its pre-run state
    pub fn stop(&mut self) {
        self.clear_run();
        self.phase = RunPhase::Ready;
    }

    /// End the run with an outcome; the board is restored for the next attempt
    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        self.clear_run();
        self.phase = RunPhase::Finished(outcome);
        self.events.push(GameEvent::Ended { outcome });
        log::info!("Run on '{}' ended: {outcome:?}", self.board.name);
    }

    /// Back to Ready after a finished run so elements can be rotated again
    pub fn acknowledge(&mut self) {
        if matches!(self.phase, RunPhase::Finished(_)) {
            self.phase = RunPhase::Ready;
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn clear_run(&mut self) {
        if let Some(ball) = self.ball.as_mut() {
            ball.stop_run();
        }
        self.ball = None;
        self.inside.clear();
        self.board.reset_runtime();
    }
}
