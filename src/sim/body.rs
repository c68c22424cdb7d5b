//! The player's kinematic body
//!
//! Position, velocity, health/mana and the ability counters the movement
//! state machine reads and writes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;
use crate::settings::{LevelSettings, Loadout};

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 12;

/// Result of applying a hit to the body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed (0 when blocked by invulnerability or defense)
    pub dealt: f32,
    /// Health after the hit
    pub hp: f32,
    /// This hit brought health to zero
    pub died: bool,
}

impl DamageOutcome {
    fn ignored(hp: f32) -> Self {
        Self {
            dealt: 0.0,
            hp,
            died: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicBody {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Units per reference frame
    pub vel: Vec2,
    pub grounded: bool,
    /// Jump is held since the last accepted press
    pub jump_locked: bool,
    /// Platform placement is held since the last accepted press
    pub place_locked: bool,

    pub hp: f32,
    pub mp: f32,
    pub max_hp: f32,
    pub max_mp: f32,
    pub defense: f32,

    pub extra_jumps: u32,
    pub jumps_remaining: u32,
    pub extra_dashes: u32,
    pub dashes_remaining: u32,
    pub dash_speed_mult: f32,
    pub double_jump_mult: f32,

    /// Seconds until another dash may start
    pub dash_cooldown: f32,
    pub is_dashing: bool,
    /// Seconds left in the current dash
    pub dash_timer: f32,
    /// Last horizontal direction pressed (-1 or 1)
    pub facing: f32,

    pub wall_climb_level: u8,
    /// -1 wall on the left, 1 wall on the right, 0 none
    pub last_touching_wall: i8,
    pub is_wall_sliding: bool,
    pub is_wall_climbing: bool,
    /// Seconds of horizontal input lock after a wall jump
    pub wall_jump_timer: f32,

    pub invulnerable: bool,
    pub invulnerable_timer: f32,

    /// Past positions for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl KinematicBody {
    pub fn new(settings: &LevelSettings, loadout: &Loadout) -> Self {
        let mut body = Self {
            pos: Vec2::ZERO,
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            vel: Vec2::ZERO,
            grounded: false,
            jump_locked: false,
            place_locked: false,
            hp: settings.player_max_hp,
            mp: settings.player_max_mp,
            max_hp: settings.player_max_hp,
            max_mp: settings.player_max_mp,
            defense: 0.0,
            extra_jumps: 0,
            jumps_remaining: 0,
            extra_dashes: 0,
            dashes_remaining: 0,
            dash_speed_mult: 1.0,
            double_jump_mult: 1.0,
            dash_cooldown: 0.0,
            is_dashing: false,
            dash_timer: 0.0,
            facing: 1.0,
            wall_climb_level: 0,
            last_touching_wall: 0,
            is_wall_sliding: false,
            is_wall_climbing: false,
            wall_jump_timer: 0.0,
            invulnerable: false,
            invulnerable_timer: 0.0,
            trail: Vec::with_capacity(TRAIL_LENGTH),
        };
        body.apply_loadout(loadout);
        body.refill_abilities();
        body
    }

    /// Copy ability upgrades onto the body
    pub fn apply_loadout(&mut self, loadout: &Loadout) {
        self.extra_jumps = loadout.extra_jumps;
        self.extra_dashes = loadout.extra_dashes;
        self.wall_climb_level = loadout.wall_climb_level;
        self.defense = if loadout.defense.is_finite() { loadout.defense.max(0.0) } else { 0.0 };
        self.dash_speed_mult = if loadout.dash_speed_mult.is_finite() { loadout.dash_speed_mult } else { 1.0 };
        self.double_jump_mult = if loadout.double_jump_mult.is_finite() { loadout.double_jump_mult } else { 1.0 };
    }

    /// Respawn at `spawn` with full resources and no motion
    ///
    /// Loadout-derived fields (extra jumps, defense, ...) are kept.
    pub fn reset(&mut self, spawn: Vec2, settings: &LevelSettings) {
        self.pos = spawn;
        self.vel = Vec2::ZERO;
        self.grounded = false;
        self.jump_locked = false;
        self.place_locked = false;
        self.max_hp = settings.player_max_hp;
        self.max_mp = settings.player_max_mp;
        self.hp = self.max_hp;
        self.mp = self.max_mp;
        self.dash_cooldown = 0.0;
        self.is_dashing = false;
        self.dash_timer = 0.0;
        self.facing = 1.0;
        self.last_touching_wall = 0;
        self.is_wall_sliding = false;
        self.is_wall_climbing = false;
        self.wall_jump_timer = 0.0;
        self.invulnerable = false;
        self.invulnerable_timer = 0.0;
        self.refill_abilities();
        self.clear_trail();
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Restore jump and dash counters (landing, wall jump, jump pad)
    pub fn refill_abilities(&mut self) {
        self.jumps_remaining = self.extra_jumps;
        self.dashes_remaining = self.extra_dashes;
    }

    /// Apply a hit, honouring the invulnerability window and defense
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.invulnerable || !self.is_alive() || !amount.is_finite() {
            return DamageOutcome::ignored(self.hp);
        }
        let dealt = (amount - self.defense).max(0.0);
        self.hit(dealt)
    }

    /// Fall damage: applied once per fall regardless of invulnerability or
    /// defense
    pub fn take_fall_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.is_alive() || !amount.is_finite() {
            return DamageOutcome::ignored(self.hp);
        }
        self.hit(amount.max(0.0))
    }

    fn hit(&mut self, dealt: f32) -> DamageOutcome {
        let before = self.hp;
        self.hp = (self.hp - dealt).max(0.0);
        self.invulnerable = true;
        self.invulnerable_timer = INVULNERABLE_DURATION;
        DamageOutcome {
            dealt: before - self.hp,
            hp: self.hp,
            died: before > 0.0 && self.hp <= 0.0,
        }
    }

    /// Regenerate mana at `rate` per second
    pub fn regen_mana(&mut self, rate: f32, dt: f32) {
        self.mp = (self.mp + rate * dt).clamp(0.0, self.max_mp);
    }

    /// Spend mana if enough is available
    pub fn spend_mana(&mut self, amount: f32) -> bool {
        if self.mp + f32::EPSILON < amount {
            return false;
        }
        self.mp = (self.mp - amount).clamp(0.0, self.max_mp);
        true
    }

    /// Count down dash, wall jump and invulnerability timers
    pub fn tick_timers(&mut self, dt: f32) {
        if self.dash_cooldown > 0.0 {
            self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        }
        if self.is_dashing {
            self.dash_timer -= dt;
            if self.dash_timer <= 0.0 {
                self.dash_timer = 0.0;
                self.is_dashing = false;
            }
        }
        if self.wall_jump_timer > 0.0 {
            self.wall_jump_timer = (self.wall_jump_timer - dt).max(0.0);
        }
        if self.invulnerable {
            self.invulnerable_timer -= dt;
            if self.invulnerable_timer <= 0.0 {
                self.invulnerable_timer = 0.0;
                self.invulnerable = false;
            }
        }
    }

    /// Keep hp/mp within `[0, max]`
    pub fn clamp_resources(&mut self) {
        self.hp = if self.hp.is_finite() { self.hp.clamp(0.0, self.max_hp) } else { 0.0 };
        self.mp = if self.mp.is_finite() { self.mp.clamp(0.0, self.max_mp) } else { 0.0 };
    }

    /// Record current position to trail (call each tick)
    pub fn record_trail(&mut self) {
        self.trail.insert(0, self.center());
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop();
        }
    }

    /// Clear trail (on respawn)
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}
