//! Movement abilities: run, jump, double jump, dash, wall slide/climb/jump
//!
//! The states are flags on the body rather than one enum, resolved in
//! priority order each tick:
//! - dashing overrides steering and gravity
//! - wall climbing overrides gravity
//! - wall states only exist while airborne next to a wall
//! - landing (see the collision resolver) refills jumps and dashes

use glam::Vec2;

use super::body::KinematicBody;
use super::level::Platform;
use super::tick::TickInput;
use crate::consts::*;
use crate::settings::LevelSettings;
use crate::{axis, frame_scale};

/// What the state machine did this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actions {
    pub jumped: bool,
    pub double_jumped: bool,
    pub wall_jumped: bool,
    pub dashed: bool,
}

/// Turn input into velocity and resource changes for one tick
///
/// Position is not touched here; the collision resolver integrates it.
pub fn apply_abilities(
    body: &mut KinematicBody,
    input: &TickInput,
    settings: &LevelSettings,
    dt: f32,
) -> Actions {
    let k = frame_scale(dt);
    let mut actions = Actions::default();

    body.tick_timers(dt);

    let dir = axis(input.left, input.right);
    if dir != 0.0 {
        body.facing = dir;
    }

    // Edge detect: holding jump must not fire every tick
    let jump_pressed = input.jump && !body.jump_locked;
    body.jump_locked = input.jump;

    // --- Dash ---
    if input.dash && !body.is_dashing && body.dash_cooldown <= 0.0 && body.dashes_remaining > 0 {
        body.dashes_remaining -= 1;
        body.is_dashing = true;
        body.dash_timer = DASH_DURATION;
        body.dash_cooldown = DASH_COOLDOWN;
        body.vel = Vec2::new(settings.speed * body.facing * body.dash_speed_mult, 0.0);
        actions.dashed = true;
    }

    // --- Horizontal ---
    if body.is_dashing {
        body.vel.y = 0.0;
    } else if dir != 0.0 && body.wall_jump_timer <= 0.0 {
        body.vel.x = dir * settings.speed;
    } else {
        body.vel.x *= settings.friction.powf(k);
        if body.vel.x.abs() < STOP_THRESHOLD {
            body.vel.x = 0.0;
        }
    }

    // --- Wall ---
    body.is_wall_sliding = false;
    body.is_wall_climbing = false;
    let wall = body.last_touching_wall as f32;

    if !body.grounded && !body.is_dashing && wall != 0.0 {
        if dir == wall {
            if input.jump && can_climb(body, dt) {
                if body.wall_climb_level == 1 {
                    body.mp = (body.mp - WALL_CLIMB_MP_PER_SEC * dt).max(0.0);
                }
                body.is_wall_climbing = true;
                body.vel.y = -WALL_CLIMB_SPEED;
            } else {
                body.is_wall_sliding = true;
            }
        } else if dir == -wall && jump_pressed {
            body.vel.y = settings.jump_force;
            body.vel.x = -wall * settings.speed * WALL_JUMP_PUSH;
            body.wall_jump_timer = WALL_JUMP_LOCK;
            body.last_touching_wall = 0;
            body.refill_abilities();
            actions.wall_jumped = true;
        }
    }

    // --- Jump ---
    if jump_pressed && !actions.wall_jumped && !body.is_wall_climbing {
        if body.grounded {
            body.vel.y = settings.jump_force;
            body.grounded = false;
            body.refill_abilities();
            actions.jumped = true;
        } else if body.jumps_remaining > 0 && !body.is_wall_sliding {
            body.jumps_remaining -= 1;
            body.vel.y = settings.jump_force * body.double_jump_mult;
            actions.double_jumped = true;
        }
        if (actions.jumped || actions.double_jumped) && body.is_dashing {
            // Jumping cancels the dash so gravity can bring the body back down
            body.is_dashing = false;
            body.dash_timer = 0.0;
        }
    }

    // --- Gravity ---
    if !body.is_wall_climbing && !body.is_dashing {
        body.vel.y += settings.gravity * k;
        if input.fast_fall {
            body.vel.y += settings.gravity * k;
        }
        let mut cap = settings.fall_cap(input.fast_fall);
        if body.is_wall_sliding {
            cap = cap.min(WALL_SLIDE_SPEED);
        }
        body.vel.y = body.vel.y.min(cap);
    }

    body.regen_mana(settings.mp_regen, dt);

    actions
}

/// Whether the body may actively climb this tick
fn can_climb(body: &KinematicBody, dt: f32) -> bool {
    match body.wall_climb_level {
        0 => false,
        1 => body.mp >= WALL_CLIMB_MP_PER_SEC * dt,
        _ => true,
    }
}

/// Spend mana on a platform right under the body's feet
///
/// Only on a fresh press while airborne. The oldest placed platform is
/// removed once [`MAX_PLACED_PLATFORMS`] exist. Returns whether one was
/// placed.
pub fn try_place_platform(
    body: &mut KinematicBody,
    platforms: &mut Vec<Platform>,
    settings: &LevelSettings,
    input: &TickInput,
) -> bool {
    let pressed = input.place_platform && !body.place_locked;
    body.place_locked = input.place_platform;
    if !pressed || body.grounded {
        return false;
    }
    if !body.spend_mana(settings.platform_cost) {
        return false;
    }

    let placed = platforms.iter().filter(|p| p.placed).count();
    if placed >= MAX_PLACED_PLATFORMS {
        if let Some(oldest) = platforms.iter().position(|p| p.placed) {
            platforms.remove(oldest);
        }
    }

    let center = body.center();
    let mut platform = Platform::new(
        center.x - PLACED_PLATFORM_WIDTH / 2.0,
        body.aabb().bottom(),
        PLACED_PLATFORM_WIDTH,
        PLACED_PLATFORM_HEIGHT,
    );
    platform.placed = true;
    platforms.push(platform);
    log::debug!("Placed platform at ({:.1}, {:.1})", center.x, body.aabb().bottom());
    true
}
