//! Play mode session
//!
//! Loads a campaign or user level, shuffles the rotatable pieces, lets the
//! player turn them while the ball is parked, then runs the ball to an
//! outcome. Campaign wins advance the saved progress.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::consts::SIM_DT;
use crate::level::{Campaign, LevelError, LevelStore, Progress};
use crate::settings::Settings;
use crate::sim::{Board, GameEvent, RunConfig, RunError, RunOutcome, RunState, tick};

#[derive(Debug, Error)]
pub enum PlayError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("campaign has no level {0}")]
    NoSuchLevel(usize),
    #[error("level {0} is locked")]
    Locked(usize),
    #[error("the ball is already running")]
    Running,
}

/// Where the session's level came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSource {
    /// `next` is the level a win unlocks; None on the last level
    Campaign { index: usize, next: Option<usize> },
    File(PathBuf),
}

/// Result of one completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PlayResult {
    pub outcome: RunOutcome,
    /// Campaign level unlocked by this win
    pub next_level: Option<usize>,
    /// The last campaign level was just won
    pub campaign_complete: bool,
    /// Saved progress moved forward
    pub progress_advanced: bool,
}

#[derive(Debug)]
pub struct PlaySession {
    source: LevelSource,
    state: RunState,
    /// Progress is recorded here on campaign wins
    data_dir: Option<PathBuf>,
}

impl PlaySession {
    /// Load campaign level `index`
    pub fn from_campaign(campaign: &Campaign, index: usize, seed: u64) -> Result<Self, PlayError> {
        if index >= campaign.len() {
            return Err(PlayError::NoSuchLevel(index));
        }
        let data = campaign.load(index)?;
        let source = LevelSource::Campaign {
            index,
            next: campaign.next_level(index),
        };
        Ok(Self::with_board(source, Board::from_level(&data), seed))
    }

    /// Load a campaign level only if the saved progress allows it
    pub fn from_campaign_unlocked(
        campaign: &Campaign,
        progress: &Progress,
        index: usize,
        seed: u64,
    ) -> Result<Self, PlayError> {
        if progress.is_locked(index) {
            return Err(PlayError::Locked(index));
        }
        Self::from_campaign(campaign, index, seed)
    }

    /// Load a level file
    pub fn from_file(path: &Path, seed: u64) -> Result<Self, PlayError> {
        let data = LevelStore::load(path)?;
        let source = LevelSource::File(path.to_path_buf());
        Ok(Self::with_board(source, Board::from_level(&data), seed))
    }

    fn with_board(source: LevelSource, mut board: Board, seed: u64) -> Self {
        board.resolve_teleporters();
        let mut rng = Pcg32::seed_from_u64(seed);
        board.randomize_rotations(&mut rng);
        Self {
            source,
            state: RunState::new(board, RunConfig::default()),
            data_dir: None,
        }
    }

    /// Record campaign progress under `data_dir` when a level is won
    pub fn with_progress(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn source(&self) -> &LevelSource {
        &self.source
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Quarter-turn the piece at `cell` while the ball is parked
    pub fn rotate(&mut self, cell: glam::IVec2) -> Result<bool, PlayError> {
        if self.state.is_running() {
            return Err(PlayError::Running);
        }
        self.state.acknowledge();
        Ok(self.state.board.rotate_at(cell))
    }

    /// Launch the ball with the current settings
    pub fn start(&mut self, settings: &Settings) -> Result<(), PlayError> {
        if self.state.is_running() {
            return Err(PlayError::Running);
        }
        self.state.acknowledge();
        self.state.config = RunConfig::from_settings(settings);
        self.state.start()?;
        Ok(())
    }

    /// Advance one fixed step and hand back the events it produced
    pub fn step(&mut self) -> Vec<GameEvent> {
        tick(&mut self.state, SIM_DT);
        self.state.drain_events()
    }

    /// Stop the ball and restore the board
    pub fn stop(&mut self) {
        self.state.stop();
    }

    /// Run the ball to an outcome
    pub fn run(&mut self, settings: &Settings) -> Result<PlayResult, PlayError> {
        self.run_with(settings, |_| {})
    }

    /// Run the ball to an outcome. `on_step` sees the events of every fixed
    /// step (often none), starting with the launch.
    pub fn run_with(
        &mut self,
        settings: &Settings,
        mut on_step: impl FnMut(&[GameEvent]),
    ) -> Result<PlayResult, PlayError> {
        self.start(settings)?;
        on_step(&self.state.drain_events());
        while self.state.is_running() {
            tick(&mut self.state, SIM_DT);
            on_step(&self.state.drain_events());
        }

        let outcome = self.state.outcome().unwrap_or(RunOutcome::Stalled);
        Ok(self.conclude(outcome))
    }

    fn conclude(&self, outcome: RunOutcome) -> PlayResult {
        let mut result = PlayResult {
            outcome,
            next_level: None,
            campaign_complete: false,
            progress_advanced: false,
        };
        let LevelSource::Campaign { index, next } = self.source else {
            return result;
        };
        if !outcome.is_win() {
            return result;
        }

        result.next_level = next;
        result.campaign_complete = next.is_none();

        if let Some(dir) = &self.data_dir {
            let mut progress = Progress::load(dir);
            if progress.record_completion(index) {
                result.progress_advanced = true;
                if let Err(e) = progress.save(dir) {
                    log::warn!("Could not save campaign progress: {e}");
                }
            }
        }
        result
    }
}
