//! Fixed timestep simulation tick
//!
//! Advances the ball, detects trigger entries, and applies the element
//! interaction rules.

use std::collections::BTreeSet;

use glam::Vec2;

use super::ball::BallRunner;
use super::board::Board;
use super::element::{ElementId, ElementKind};
use super::state::{GameEvent, RunOutcome, RunState};
use crate::consts::*;

/// What an interaction did to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    /// Nothing run-level changed (redirect, gate armed, unpaired teleporter)
    Handled,
    StarCollected,
    /// Ball moved to another cell; overlap data for this tick is stale
    Teleported,
    ReachedGoal,
}

/// Whether the ball's trigger touches an element's trigger box
#[inline]
fn overlaps(ball_pos: Vec2, ball_radius: f32, element_pos: Vec2) -> bool {
    let reach = ball_radius + TRIGGER_HALF_EXTENT * CELL_SIZE;
    let d = (ball_pos - element_pos).abs();
    d.x < reach && d.y < reach
}

/// Advance the run by one fixed timestep.
///
/// The move is split into sub-steps no longer than `MAX_STEP_DISTANCE` so a
/// fast ball can't jump over a trigger between checks.
pub fn tick(state: &mut RunState, dt: f32) {
    if !state.is_running() {
        return;
    }
    let Some(ball) = state.ball.as_mut() else {
        return;
    };

    state.time_ticks += 1;
    state.elapsed = state.time_ticks as f64 * f64::from(dt);
    ball.decay_cooldowns(dt);

    let move_dist = ball.speed * dt;
    let num_steps = ((move_dist / MAX_STEP_DISTANCE).ceil() as usize).clamp(1, MAX_SUBSTEPS);
    let step_dist = move_dist / num_steps as f32;

    for _step in 0..num_steps {
        ball.move_by(step_dist);

        if !state.bounds.contains(ball.pos) {
            let pos = ball.pos;
            state.events.push(GameEvent::Fail { pos });
            state.finish(RunOutcome::OutOfBounds);
            return;
        }

        match scan_triggers(&mut state.board, &mut state.inside, &mut state.events, ball) {
            Some(Contact::StarCollected) => state.stars_collected += 1,
            Some(Contact::ReachedGoal) => {
                let outcome = if state.stars_collected >= state.stars_needed {
                    RunOutcome::Won
                } else {
                    RunOutcome::MissingStars {
                        collected: state.stars_collected,
                        needed: state.stars_needed,
                    }
                };
                state.finish(outcome);
                return;
            }
            _ => {}
        }
    }

    if state.elapsed >= f64::from(state.config.max_run_seconds) {
        if let Some(ball) = state.ball.as_ref() {
            state.events.push(GameEvent::Fail { pos: ball.pos });
        }
        state.finish(RunOutcome::Stalled);
    }
}

/// Fire the rules of a newly entered trigger, at most one per sub-step
fn scan_triggers(
    board: &mut Board,
    inside: &mut BTreeSet<ElementId>,
    events: &mut Vec<GameEvent>,
    ball: &mut BallRunner,
) -> Option<Contact> {
    // Elements whose trigger the ball is in right now, in id order
    let touching: Vec<ElementId> = board
        .elements
        .iter()
        .filter(|e| e.is_present() && overlaps(ball.pos, ball.radius, e.world_pos()))
        .map(|e| e.id)
        .collect();
    inside.retain(|id| touching.contains(id));

    let mut result = None;
    for id in touching {
        if inside.contains(&id) {
            continue;
        }
        if ball.on_cooldown(id) {
            // Entry swallowed; it won't fire again until the ball leaves
            inside.insert(id);
            continue;
        }
        if result.is_some() {
            // Later entries fire on the next check
            continue;
        }
        inside.insert(id);
        let contact = interact(board, ball, events, id);
        result = Some(contact);
        if matches!(contact, Contact::Teleported | Contact::ReachedGoal) {
            break;
        }
    }
    result
}

/// Tick until the run finishes and return its outcome.
/// Returns None if the run was not started.
pub fn run_to_end(state: &mut RunState, dt: f32) -> Option<RunOutcome> {
    while state.is_running() {
        tick(state, dt);
    }
    state.outcome()
}

/// Apply the rules of element `id` to the ball
fn interact(
    board: &mut Board,
    ball: &mut BallRunner,
    events: &mut Vec<GameEvent>,
    id: ElementId,
) -> Contact {
    // Partner position is read before the element is borrowed mutably
    let partner_pos = board
        .get(id)
        .and_then(|e| e.paired)
        .and_then(|p| board.get(p))
        .map(|p| (p.id, p.world_pos()));

    let Some(element) = board.get_mut(id) else {
        return Contact::Handled;
    };
    let pos = ball.pos;
    ball.add_cooldown(id, HIT_COOLDOWN);

    match element.kind {
        ElementKind::BallSpawn => Contact::Handled,

        ElementKind::Arrow => {
            let new_dir = element.arrow_direction();
            ball.set_direction(new_dir);
            events.push(GameEvent::Hit { pos, dir: new_dir });
            log::debug!("Arrow {id} sent ball {new_dir:?}");
            Contact::Handled
        }

        ElementKind::Line | ElementKind::Triangle => {
            if !element.allow_interaction() {
                let pass = if element.kind == ElementKind::Line {
                    HIT_COOLDOWN
                } else {
                    GATE_PASS_COOLDOWN
                };
                ball.add_cooldown(id, pass);
                events.push(GameEvent::GateArmed { id });
                log::debug!("Element {id} armed");
                return Contact::Handled;
            }

            let new_dir = if element.kind == ElementKind::Line {
                element.diagonal().reflect(ball.dir)
            } else if ball.dir.to_ivec().dot(element.hypotenuse_normal()) < 0 {
                // Against the hypotenuse normal means the open side was hit
                element.diagonal().reflect(ball.dir)
            } else {
                ball.dir.opposite()
            };
            ball.set_direction(new_dir);
            events.push(GameEvent::Hit { pos, dir: new_dir });
            log::debug!("Element {id} ({:?}) sent ball {new_dir:?}", element.key);

            if element.consume() {
                events.push(GameEvent::ElementBroken { id });
            }
            if element.kind == ElementKind::Triangle {
                ball.add_cooldown(id, TRIANGLE_COOLDOWN);
            }
            Contact::Handled
        }

        ElementKind::Star => {
            if !element.allow_interaction() {
                ball.add_cooldown(id, STAR_GATE_COOLDOWN);
                events.push(GameEvent::GateArmed { id });
                return Contact::Handled;
            }
            element.hidden = true;
            ball.add_cooldown(id, STAR_COOLDOWN);
            events.push(GameEvent::StarCollected {
                pos: element.world_pos(),
            });
            Contact::StarCollected
        }

        ElementKind::Teleporter => {
            if !element.allow_interaction() {
                ball.add_cooldown(id, GATE_PASS_COOLDOWN);
                events.push(GameEvent::GateArmed { id });
                return Contact::Handled;
            }
            let Some((partner, partner_pos)) = partner_pos else {
                log::debug!("Teleporter {id} has no partner");
                return Contact::Handled;
            };

            let dir = ball.dir;
            events.push(GameEvent::TeleportEnter { pos, dir });
            ball.teleport_to(partner_pos + dir.to_vec() * TELEPORT_EXIT_OFFSET * CELL_SIZE);
            events.push(GameEvent::TeleportExit {
                pos: partner_pos,
                dir,
            });
            // Anti ping-pong on both ends
            ball.add_cooldown(id, TELEPORT_COOLDOWN);
            ball.add_cooldown(partner, TELEPORT_COOLDOWN);
            Contact::Teleported
        }

        ElementKind::EndPoint => {
            events.push(GameEvent::Goal {
                pos: element.world_pos(),
            });
            Contact::ReachedGoal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ElementData, GridPos, LevelData, PrefabKey};
    use crate::sim::direction::Direction;
    use crate::sim::state::{RunConfig, RunPhase};

    fn level(elements: &[(PrefabKey, i32, i32, u8)]) -> LevelData {
        let mut level = LevelData::named("test");
        for &(key, x, y, rot) in elements {
            level
                .elements
                .push(ElementData::new(key, GridPos::new(x, y), rot));
        }
        level
    }

    fn run(level: &LevelData) -> RunState {
        let mut state = RunState::new(Board::from_level(level), RunConfig::default());
        state.start().unwrap();
        state
    }

    /// Tick until the ball heads in a new direction (or the run ends)
    fn tick_until_turn(state: &mut RunState) -> Option<Direction> {
        let start = state.ball.as_ref()?.dir;
        for _ in 0..1000 {
            tick(state, SIM_DT);
            let dir = state.ball.as_ref()?.dir;
            if dir != start {
                return Some(dir);
            }
        }
        None
    }

    #[test]
    fn test_start_requires_spawn() {
        let mut state = RunState::new(
            Board::from_level(&level(&[(PrefabKey::EndPoint, 0, 0, 0)])),
            RunConfig::default(),
        );
        assert!(state.start().is_err());
        assert_eq!(state.phase, RunPhase::Ready);
    }

    #[test]
    fn test_ball_falls_out_of_bounds() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 0, 0),
            (PrefabKey::EndPoint, 3, 0, 0),
        ]));
        let outcome = run_to_end(&mut state, SIM_DT);
        assert_eq!(outcome, Some(RunOutcome::OutOfBounds));
        assert!(state.ball.is_none());
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Fail { .. })));
    }

    #[test]
    fn test_line_route_with_star_wins() {
        // Down from the spawn, `\` turns the ball right, through a star to the goal
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Line, 0, 0, 0),
            (PrefabKey::Star, 3, 0, 0),
            (PrefabKey::EndPoint, 6, 0, 0),
        ]));
        assert_eq!(state.stars_needed, 1);
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Right));
        assert_eq!(state.ball.as_ref().unwrap().pos.y, 0.0);

        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
        // The star is visible again for the next attempt
        assert!(state.board.elements.iter().all(|e| !e.hidden));
    }

    #[test]
    fn test_endpoint_without_stars_fails() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::EndPoint, 0, 0, 0),
            (PrefabKey::Star, 5, 5, 0),
        ]));
        assert_eq!(
            run_to_end(&mut state, SIM_DT),
            Some(RunOutcome::MissingStars {
                collected: 0,
                needed: 1
            })
        );
    }

    #[test]
    fn test_arrow_sets_heading() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Arrow, 0, 0, 2),
            (PrefabKey::EndPoint, -3, 0, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Left));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_triangle_hypotenuse_and_face() {
        // Rotation 1: solid bottom-right, hypotenuse faces up-left.
        // Falling onto it from above hits the open side and turns left.
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Triangle, 0, 0, 1),
            (PrefabKey::EndPoint, -3, 0, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Left));

        // Rotation 2: solid top-right, so the ball lands on a flat face and bounces back

        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Triangle, 0, 0, 2),
            (PrefabKey::EndPoint, 5, 5, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Up));
    }

    #[test]
    fn test_activable_lets_first_pass_through() {
        // Ball falls through the armed-on-first-contact line, out of bounds
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::LineSpawnable, 0, 0, 0),
            (PrefabKey::EndPoint, 3, 0, 0),
        ]));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::OutOfBounds));
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::GateArmed { .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Hit { .. })));
    }

    #[test]
    fn test_activable_star_collected_on_second_pass() {
        // Down through the star (arms it), up arrow, back through (collects), goal above the spawn
        let mut data = level(&[
            (PrefabKey::BallSpawn, 0, 6, 0),
            (PrefabKey::Star, 0, 3, 0),
            (PrefabKey::Arrow, 0, 0, 1),
            (PrefabKey::EndPoint, 0, 9, 0),
        ]);
        data.elements[1].is_activable = true;
        let mut state = run(&data);

        let mut armed = false;
        for _ in 0..1000 {
            tick(&mut state, SIM_DT);
            if state.drain_events().contains(&GameEvent::GateArmed { id: 1 }) {
                armed = true;
                break;
            }
        }
        assert!(armed);
        assert_eq!(state.stars_collected, 0);
        assert!(!state.board.elements[1].hidden);
        // Star gate cooldown outlasts the hit cooldown
        for _ in 0..6 {
            tick(&mut state, SIM_DT);
        }
        assert!(state.ball.as_ref().unwrap().on_cooldown(1));

        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
        let events = state.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::StarCollected { .. }))
        );
    }

    #[test]
    fn test_activable_teleporter_teleports_on_second_pass() {
        let mut data = level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Teleporter, 0, 0, 0),
            (PrefabKey::Teleporter, 4, 5, 0),
            (PrefabKey::Arrow, 0, -3, 1),
            (PrefabKey::EndPoint, 4, 8, 0),
        ]);
        data.elements[1].pair_id = "pair".into();
        data.elements[2].pair_id = "pair".into();
        data.elements[1].is_activable = true;

        let mut state = run(&data);
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
        let events = state.drain_events();
        let armed = events
            .iter()
            .position(|e| *e == GameEvent::GateArmed { id: 1 })
            .unwrap();
        let entered = events
            .iter()
            .position(|e| matches!(e, GameEvent::TeleportEnter { .. }))
            .unwrap();
        assert!(armed < entered);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::TeleportEnter { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_spawnable_triangle_acts_on_second_pass() {
        // Rotation 3 puts the hypotenuse facing down-right: the falling ball
        // would bounce off the flat top, but the first pass is let through.
        // Coming back up it meets the hypotenuse and turns right.
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::TriangleSpawnable, 0, 0, 3),
            (PrefabKey::Arrow, 0, -3, 1),
            (PrefabKey::EndPoint, 3, 0, 0),
        ]));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GateArmed { id: 1 }));
    }

    #[test]
    fn test_one_use_triangle_breaks() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::TriangleOneUse, 0, 0, 1),
            (PrefabKey::EndPoint, -3, 0, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Left));
        assert!(state.board.elements[1].is_broken());
        assert!(state.ball.as_ref().unwrap().on_cooldown(1));
        assert!(state.drain_events().contains(&GameEvent::ElementBroken { id: 1 }));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_arrow_ignores_breakable_flag() {
        let mut data = level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Arrow, 0, 0, 0),
            (PrefabKey::EndPoint, 3, 0, 0),
        ]);
        data.elements[1].is_breakable = true;
        let mut state = run(&data);
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Right));
        assert!(!state.board.elements[1].is_broken());
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ElementBroken { .. }))
        );
    }

    #[test]
    fn test_shared_cell_fires_one_trigger_per_check() {
        // Arrow and star on one cell: the arrow (lower id) fires first, the
        // star on the following tick while the ball is still inside it
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Arrow, 0, 0, 0),
            (PrefabKey::Star, 0, 0, 0),
            (PrefabKey::EndPoint, 3, 0, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Right));
        assert_eq!(state.stars_collected, 0);
        tick(&mut state, SIM_DT);
        assert_eq!(state.stars_collected, 1);
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_teleport_ends_trigger_scan() {
        // The star shares the teleporter's cell but the ball is gone before it fires
        let mut data = level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Teleporter, 0, 0, 0),
            (PrefabKey::Star, 0, 0, 0),
            (PrefabKey::Teleporter, 4, 3, 0),
            (PrefabKey::EndPoint, 4, 0, 0),
        ]);
        data.elements[1].pair_id = "pair".into();
        data.elements[3].pair_id = "pair".into();
        let mut state = run(&data);
        assert_eq!(
            run_to_end(&mut state, SIM_DT),
            Some(RunOutcome::MissingStars {
                collected: 0,
                needed: 1
            })
        );
    }

    #[test]
    fn test_fast_ball_does_not_skip_triggers() {
        let data = level(&[
            (PrefabKey::BallSpawn, 0, 6, 0),
            (PrefabKey::Line, 0, 0, 0),
            (PrefabKey::Star, 3, 0, 0),
            (PrefabKey::EndPoint, 6, 0, 0),
        ]);
        let mut state = RunState::new(
            Board::from_level(&data),
            RunConfig {
                ball_speed: BALL_MAX_SPEED,
                ..Default::default()
            },
        );
        state.start().unwrap();
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));

        // Speeds above the cap are clamped when they come from settings
        let mut settings = crate::settings::Settings::default();
        settings.ball_speed = 70.0;
        let config = RunConfig::from_settings(&settings);
        assert_eq!(config.ball_speed, BALL_MAX_SPEED);
        let mut state = RunState::new(
            Board::from_level(&level(&[
                (PrefabKey::BallSpawn, 0, 3, 0),
                (PrefabKey::EndPoint, 0, 0, 0),
            ])),
            config,
        );
        state.start().unwrap();
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_long_runs_still_stall() {
        let mut state = RunState::new(
            Board::from_level(&level(&[
                (PrefabKey::BallSpawn, 0, 3, 0),
                (PrefabKey::Arrow, 0, 0, 1),
                (PrefabKey::Arrow, 0, 5, 3),
                (PrefabKey::EndPoint, 9, 9, 0),
            ])),
            RunConfig {
                max_run_seconds: 600_000.0,
                ..Default::default()
            },
        );
        state.start().unwrap();
        // Well past the point where adding SIM_DT to an f32 clock stops counting
        state.time_ticks = 600_000 * 60 - 120;
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Stalled));
        assert!(state.time_ticks <= 600_000 * 60);
        assert!(state.elapsed >= 600_000.0);
    }

    #[test]
    fn test_second_pass_through_activable_acts() {
        // Down arrow at the top sends the ball through the gate; an up arrow
        // below bounces it back, and the now-armed `\` turns it left.
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 6, 0),
            (PrefabKey::LineSpawnable, 0, 3, 0),
            (PrefabKey::Arrow, 0, 0, 1),
            (PrefabKey::EndPoint, -3, 3, 0),
        ]));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_breakable_disappears_after_use() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::LineOneUse, 0, 0, 0),
            (PrefabKey::EndPoint, 6, 6, 0),
        ]));
        assert_eq!(tick_until_turn(&mut state), Some(Direction::Right));
        assert!(state.board.elements[1].is_broken());
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ElementBroken { id: 1 }));

        // Restored once the run is over
        run_to_end(&mut state, SIM_DT);
        assert!(!state.board.elements[1].is_broken());
    }

    #[test]
    fn test_teleporter_moves_ball_to_partner() {
        let mut data = level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Teleporter, 0, 0, 0),
            (PrefabKey::Teleporter, 4, 2, 0),
            (PrefabKey::EndPoint, 4, -1, 0),
        ]);
        data.elements[1].pair_id = "pair".into();
        data.elements[2].pair_id = "pair".into();

        let mut state = run(&data);
        let mut teleported = false;
        while state.is_running() {
            tick(&mut state, SIM_DT);
            if let Some(ball) = &state.ball
                && ball.pos.x == 4.0
            {
                teleported = true;
            }
        }
        assert!(teleported);
        assert_eq!(state.outcome(), Some(RunOutcome::Won));
        let events = state.drain_events();
        let enters = events
            .iter()
            .filter(|e| matches!(e, GameEvent::TeleportEnter { .. }))
            .count();
        // The partner's cooldown stops an immediate bounce back
        assert_eq!(enters, 1);
    }

    #[test]
    fn test_unpaired_teleporter_is_inert() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Teleporter, 0, 0, 0),
            (PrefabKey::EndPoint, 0, -2, 0),
        ]));
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Won));
    }

    #[test]
    fn test_arrow_loop_stalls() {
        let mut state = RunState::new(
            Board::from_level(&level(&[
                (PrefabKey::BallSpawn, 0, 3, 0),
                (PrefabKey::Arrow, 0, 0, 1),
                (PrefabKey::Arrow, 0, 5, 3),
                (PrefabKey::EndPoint, 9, 9, 0),
            ])),
            RunConfig {
                max_run_seconds: 5.0,
                ..Default::default()
            },
        );
        state.start().unwrap();
        assert_eq!(run_to_end(&mut state, SIM_DT), Some(RunOutcome::Stalled));
        assert!(state.time_ticks >= 299);
    }

    #[test]
    fn test_stop_resets_board() {
        let mut state = run(&level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Star, 0, 0, 0),
            (PrefabKey::EndPoint, 0, -3, 0),
        ]));
        for _ in 0..40 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.stars_collected, 1);
        assert!(state.board.elements[1].hidden);

        state.stop();
        assert_eq!(state.phase, RunPhase::Ready);
        assert!(!state.board.elements[1].hidden);
        assert!(state.ball.is_none());
    }

    #[test]
    fn test_determinism() {
        let data = level(&[
            (PrefabKey::BallSpawn, 0, 3, 0),
            (PrefabKey::Line, 0, 0, 1),
            (PrefabKey::Triangle, -4, 0, 0),
            (PrefabKey::EndPoint, 5, 5, 0),
        ]);
        let mut a = run(&data);
        let mut b = run(&data);
        for _ in 0..120 {
            tick(&mut a, SIM_DT);
            tick(&mut b, SIM_DT);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.phase, b.phase);
        assert_eq!(
            a.ball.as_ref().map(|b| b.pos),
            b.ball.as_ref().map(|b| b.pos)
        );
    }
}
