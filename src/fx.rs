//! Visual feedback: pooled one-shot effects and camera shake
//!
//! Nothing here draws; effects are plain data a presentation layer can
//! read back each frame.

use std::collections::VecDeque;

use glam::Vec2;

use crate::sim::GameEvent;

/// Instances created per kind up front
pub const DEFAULT_PREWARM: usize = 6;

pub const SHAKE_DEFAULT_DURATION: f32 = 0.25;
pub const SHAKE_DEFAULT_MAGNITUDE: f32 = 0.25;
pub const SHAKE_FREQUENCY: f32 = 28.0;

/// Shake used when the ball is lost or reaches the goal
pub const IMPACT_SHAKE: (f32, f32) = (0.25, 0.35);

/// Pooled effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FxKind {
    Hit,
    Teleport,
    Goal,
}

impl FxKind {
    pub const ALL: [FxKind; 3] = [FxKind::Hit, FxKind::Teleport, FxKind::Goal];

    fn index(self) -> usize {
        match self {
            FxKind::Hit => 0,
            FxKind::Teleport => 1,
            FxKind::Goal => 2,
        }
    }

    /// Seconds an instance stays out of its pool
    pub fn lifetime(self) -> f32 {
        match self {
            FxKind::Hit => 0.5,
            FxKind::Teleport => 0.7,
            FxKind::Goal => 1.5,
        }
    }
}

/// One effect instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxInstance {
    pub kind: FxKind,
    pub pos: Vec2,
    /// Facing in degrees, 0 = right
    pub angle: f32,
    pub remaining: f32,
}

impl FxInstance {
    fn idle(kind: FxKind) -> Self {
        Self {
            kind,
            pos: Vec2::ZERO,
            angle: 0.0,
            remaining: 0.0,
        }
    }
}

/// Per-kind free lists plus the currently playing instances
#[derive(Debug, Clone)]
pub struct FxPool {
    free: [VecDeque<FxInstance>; 3],
    active: Vec<FxInstance>,
    created: usize,
}

impl Default for FxPool {
    fn default() -> Self {
        Self::new(DEFAULT_PREWARM)
    }
}

impl FxPool {
    pub fn new(prewarm: usize) -> Self {
        let free = FxKind::ALL.map(|kind| (0..prewarm).map(|_| FxInstance::idle(kind)).collect());
        Self {
            free,
            active: Vec::new(),
            created: prewarm * FxKind::ALL.len(),
        }
    }

    /// Start an effect, reusing a pooled instance when one is free
    pub fn spawn(&mut self, kind: FxKind, pos: Vec2, angle: f32) -> &FxInstance {
        let mut fx = match self.free[kind.index()].pop_front() {
            Some(fx) => fx,
            None => {
                self.created += 1;
                log::debug!("Fx pool for {kind:?} grew ({} total)", self.created);
                FxInstance::idle(kind)
            }
        };
        fx.pos = pos;
        fx.angle = angle;
        fx.remaining = kind.lifetime();
        self.active.push(fx);
        &self.active[self.active.len() - 1]
    }

    /// Age effects; finished ones go back to their own kind's pool
    pub fn tick(&mut self, dt: f32) {
        let free = &mut self.free;
        self.active.retain_mut(|fx| {
            fx.remaining -= dt;
            if fx.remaining > 0.0 {
                return true;
            }
            fx.remaining = 0.0;
            free[fx.kind.index()].push_back(*fx);
            false
        });
    }

    pub fn active(&self) -> &[FxInstance] {
        &self.active
    }

    pub fn free_count(&self, kind: FxKind) -> usize {
        self.free[kind.index()].len()
    }

    /// Instances ever created, pooled or not
    pub fn created(&self) -> usize {
        self.created
    }
}

/// Smooth random camera offset that decays to zero
#[derive(Debug, Clone)]
pub struct CameraShake {
    duration: f32,
    magnitude: f32,
    elapsed: f32,
    /// Running clock feeding the noise
    time: f32,
    frequency: f32,
    seed: u32,
    offset: Vec2,
}

impl Default for CameraShake {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CameraShake {
    pub fn new(seed: u32) -> Self {
        Self {
            duration: 0.0,
            magnitude: 0.0,
            elapsed: 0.0,
            time: 0.0,
            frequency: SHAKE_FREQUENCY,
            seed,
            offset: Vec2::ZERO,
        }
    }

    /// Start (or restart) a shake. Non-positive values use the defaults.
    pub fn shake(&mut self, duration: f32, magnitude: f32) {
        self.duration = if duration <= 0.0 {
            SHAKE_DEFAULT_DURATION
        } else {
            duration
        };
        self.magnitude = if magnitude <= 0.0 {
            SHAKE_DEFAULT_MAGNITUDE
        } else {
            magnitude
        };
        self.elapsed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.elapsed < self.duration
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Advance and return the current offset
    pub fn update(&mut self, dt: f32) -> Vec2 {
        self.time += dt;
        if !self.is_active() {
            self.offset = Vec2::ZERO;
            return self.offset;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.offset = Vec2::ZERO;
            return self.offset;
        }

        let x = self.time * self.frequency;
        let n1 = value_noise(x, self.seed) * 2.0 - 1.0;
        let n2 = value_noise(x, self.seed.wrapping_add(0x9e37_79b9)) * 2.0 - 1.0;
        self.offset = Vec2::new(n1, n2) * self.magnitude;
        self.offset
    }
}

/// Smooth 1D noise in 0..1
fn value_noise(x: f32, seed: u32) -> f32 {
    let i = x.floor();
    let f = x - i;
    let a = lattice(i as i32, seed);
    let b = lattice(i as i32 + 1, seed);
    let t = f * f * (3.0 - 2.0 * f);
    a + (b - a) * t
}

fn lattice(i: i32, seed: u32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x27d4_eb2d) ^ seed;
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    (h & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32
}

/// Visual response to a simulation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FxCommand {
    Spawn { kind: FxKind, pos: Vec2, angle: f32 },
    Shake { duration: f32, magnitude: f32 },
}

pub fn fx_for_event(event: &GameEvent) -> Vec<FxCommand> {
    let (duration, magnitude) = IMPACT_SHAKE;
    match *event {
        GameEvent::Hit { pos, dir } => vec![FxCommand::Spawn {
            kind: FxKind::Hit,
            pos,
            angle: dir.angle_degrees(),
        }],
        GameEvent::TeleportEnter { pos, dir } | GameEvent::TeleportExit { pos, dir } => {
            vec![FxCommand::Spawn {
                kind: FxKind::Teleport,
                pos,
                angle: dir.angle_degrees(),
            }]
        }
        GameEvent::Goal { pos } => vec![
            FxCommand::Spawn {
                kind: FxKind::Goal,
                pos,
                angle: 0.0,
            },
            FxCommand::Shake {
                duration,
                magnitude,
            },
        ],
        GameEvent::Fail { .. } => vec![FxCommand::Shake {
            duration,
            magnitude,
        }],
        _ => Vec::new(),
    }
}

/// Effect pool and camera shake driven together
#[derive(Debug, Clone, Default)]
pub struct FxSystem {
    pub pool: FxPool,
    pub shake: CameraShake,
}

impl FxSystem {
    pub fn handle_event(&mut self, event: &GameEvent) {
        for command in fx_for_event(event) {
            match command {
                FxCommand::Spawn { kind, pos, angle } => {
                    self.pool.spawn(kind, pos, angle);
                }
                FxCommand::Shake {
                    duration,
                    magnitude,
                } => self.shake.shake(duration, magnitude),
            }
        }
    }

    pub fn update(&mut self, dt: f32) -> Vec2 {
        self.pool.tick(dt);
        self.shake.update(dt)
    }
}
