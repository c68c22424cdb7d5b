//! Per-frame simulation tick
//!
//! Runs the systems in a fixed order against a variable, wall-clock `dt`:
//! abilities → collision → scripted motion → triggers → hazards → goals,
//! exit, jump pads, falling, time limit. Frames longer than
//! [`MAX_STEP_DT`] run the whole order once per substep.

use super::abilities::{apply_abilities, try_place_platform};
use super::collision::resolve_body;
use super::hazard::evaluate_hazards;
use super::motion::{advance_hazards, advance_platforms};
use super::state::{GameEvent, GamePhase, SimState};
use super::triggers::evaluate_triggers;
use crate::consts::*;

/// Input snapshot for a single tick (polled, level-triggered)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub fast_fall: bool,
    pub dash: bool,
    /// Spend mana on a platform under the player
    pub place_platform: bool,
}

/// Number of equal substeps covering `dt`, each no longer than
/// [`MAX_STEP_DT`]
pub fn substeps(dt: f32) -> u32 {
    ((dt / MAX_STEP_DT).ceil() as u32).clamp(1, MAX_SUBSTEPS)
}

/// Advance the simulation by `dt` seconds
///
/// Long frames are split into substeps so fast bodies can't skip over thin
/// platforms.
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    if state.phase.is_terminal() {
        return;
    }
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };
    state.time_ticks += 1;

    let steps = substeps(dt);
    let step_dt = dt / steps as f32;
    for _ in 0..steps {
        if state.phase.is_terminal() {
            break;
        }
        step(state, input, step_dt);
    }
}

/// One fixed slice of a tick
fn step(state: &mut SimState, input: &TickInput, dt: f32) {
    if let GamePhase::Dying { remaining } = state.phase {
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            log::info!("Death settled after {:.2}s", state.clock);
            state.phase = GamePhase::Dead;
            return;
        }
        state.phase = GamePhase::Dying { remaining };
    }

    state.clock += dt as f64;

    let alive = state.phase == GamePhase::Playing;
    let neutral = TickInput::default();
    let input = if alive { input } else { &neutral };

    let now = state.clock;
    let next_level = state.next_level();
    let SimState {
        level,
        body,
        activations,
        events,
        phase,
        level_index,
        ..
    } = state;
    let settings = level.settings;

    // Movement
    let was_grounded = body.grounded;
    let actions = apply_abilities(body, input, &settings, dt);
    let placed = try_place_platform(body, &mut level.platforms, &settings, input);
    let contacts = resolve_body(body, &level.platforms, &settings, dt);

    if alive {
        if actions.jumped {
            events.push(GameEvent::Jumped);
        }
        if actions.double_jumped {
            events.push(GameEvent::DoubleJumped);
        }
        if actions.wall_jumped {
            events.push(GameEvent::WallJumped);
        }
        if actions.dashed {
            events.push(GameEvent::Dashed);
        }
        if placed {
            events.push(GameEvent::PlatformPlaced);
        }
        if contacts.landed && !was_grounded {
            events.push(GameEvent::Landed);
        }
    }

    // Scripted objects
    advance_platforms(&mut level.platforms, body, dt);
    advance_hazards(&mut level.traps, &level.platforms, dt);

    // Triggers
    for id in evaluate_triggers(level, &body.aabb(), activations, now) {
        events.push(GameEvent::HazardActivated { id });
    }

    body.clamp_resources();
    body.record_trail();

    if !alive {
        return;
    }

    // Hazards
    let mut died = false;
    for hit in evaluate_hazards(&mut level.traps, &level.platforms, body) {
        events.push(GameEvent::Damage {
            amount: hit.outcome.dealt,
            hp: hit.outcome.hp,
        });
        died |= hit.outcome.died;
    }

    // Jump pads
    let bounds = body.aabb();
    if body.vel.y >= 0.0 {
        if let Some(pad) = level.jumppads.iter().find(|p| p.aabb().overlaps(&bounds)) {
            body.vel.y = pad.jump_force;
            body.grounded = false;
            body.refill_abilities();
        }
    }

    // Goals
    for index in 0..level.goals.len() {
        if level.goals[index].collected || !level.goals[index].aabb().overlaps(&bounds) {
            continue;
        }
        level.goals[index].collected = true;
        let total = level.goals_collected();
        log::info!("Goal {} collected ({}/{})", index, total, level.goals.len());
        events.push(GameEvent::GoalCollected { index, total });
    }

    // Exit
    let required = level.goals_required();
    let collected = level.goals_collected();
    let mut completed = false;
    if let Some(exit) = level.exit.as_mut() {
        if !exit.active && collected >= required {
            exit.active = true;
            log::info!("Exit open");
        }
        if exit.active && exit.aabb().overlaps(&bounds) && !died {
            let reward = level.conditions.reward;
            if reward > 0 {
                events.push(GameEvent::CurrencyAwarded { amount: reward });
            }
            events.push(GameEvent::ExitReached { next_level });
            completed = true;
        }
    }

    // Falling out of the world
    if !completed && !died && body.pos.y > settings.world_height + FALL_MARGIN {
        let outcome = body.take_fall_damage(settings.fall_damage);
        events.push(GameEvent::Damage {
            amount: outcome.dealt,
            hp: outcome.hp,
        });
        if outcome.died {
            died = true;
        } else {
            body.pos = level.spawn.pos();
            body.vel = glam::Vec2::ZERO;
            body.is_dashing = false;
            body.last_touching_wall = 0;
            body.clear_trail();
            events.push(GameEvent::FallRespawn);
            log::info!("Fell out of the world, respawned (hp {})", outcome.hp);
        }
    }

    if died {
        events.push(GameEvent::Death);
        *phase = GamePhase::Dying {
            remaining: DEATH_SETTLE_TIME,
        };
        log::info!("Player died at t={:.2}s", now);
        return;
    }

    if completed {
        *phase = GamePhase::LevelComplete;
        log::info!("Level {} complete at t={:.2}s", level_index, now);
        return;
    }

    let limit = level.conditions.time_limit;
    if limit > 0.0 && now + CLOCK_EPSILON >= limit as f64 {
        events.push(GameEvent::TimeExpired);
        *phase = GamePhase::TimeUp;
        log::info!("Time limit of {}s reached", limit);
    }
}
