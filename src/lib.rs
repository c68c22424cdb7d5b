//! Ridge Runner - simulation core for a 2D ability platformer
//!
//! Core modules:
//! - `sim`: Per-frame simulation (movement abilities, collisions, scripted
//!   motion, triggers, hazards, frame orchestration)
//! - `settings`: Physics constants and ability loadout
//! - `campaign`: Level sequencing on top of the simulation phases

pub mod campaign;
pub mod settings;
pub mod sim;

pub use campaign::{Campaign, CampaignStatus};
pub use settings::{LevelSettings, Loadout};

/// Simulation configuration constants
pub mod consts {
    /// Frame rate the per-frame physics constants were tuned for.
    /// Integration scales by `dt * REFERENCE_HZ`.
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Largest `dt` accepted by a single tick (tab switches, debugger stops)
    pub const MAX_DT: f32 = 0.1;
    /// Longest slice a tick is simulated in; longer frames are substepped
    pub const MAX_STEP_DT: f32 = 1.0 / 60.0;
    /// Upper bound on substeps per tick (`MAX_DT / MAX_STEP_DT`)
    pub const MAX_SUBSTEPS: u32 = 6;

    /// Player box
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;

    /// Dash timings (seconds)
    pub const DASH_DURATION: f32 = 0.2;
    pub const DASH_COOLDOWN: f32 = 0.6;

    /// Wall interaction
    pub const WALL_SLIDE_SPEED: f32 = 1.5;
    pub const WALL_CLIMB_SPEED: f32 = 3.0;
    pub const WALL_CLIMB_MP_PER_SEC: f32 = 15.0;
    pub const WALL_JUMP_PUSH: f32 = 1.5;
    pub const WALL_JUMP_LOCK: f32 = 0.2;

    /// Damage feedback
    pub const INVULNERABLE_DURATION: f32 = 0.5;
    pub const DEATH_SETTLE_TIME: f32 = 0.5;

    /// Distance below the world floor at which the player counts as fallen
    pub const FALL_MARGIN: f32 = 100.0;
    /// Max gap between feet and platform top for passenger carry
    pub const CARRY_TOLERANCE: f32 = 15.0;
    /// Horizontal speed below which friction snaps to zero
    pub const STOP_THRESHOLD: f32 = 0.1;

    /// Jump pad force used when a pad's force is missing or not upward
    pub const DEFAULT_JUMP_PAD_FORCE: f32 = -18.0;

    /// Goal pickup box (centred on the goal point)
    pub const GOAL_SIZE: f32 = 30.0;

    /// Mana-bought platforms
    pub const PLACED_PLATFORM_WIDTH: f32 = 60.0;
    pub const PLACED_PLATFORM_HEIGHT: f32 = 12.0;
    pub const MAX_PLACED_PLATFORMS: usize = 3;

    /// Laser defaults
    pub const LASER_DEFAULT_LENGTH: f32 = 400.0;
    pub const LASER_DEFAULT_BEAM_WIDTH: f32 = 6.0;

    /// Slack when comparing the simulation clock to scheduled times
    pub const CLOCK_EPSILON: f64 = 1e-6;
}

/// Convert a wall-clock `dt` (seconds) into reference frames
#[inline]
pub fn frame_scale(dt: f32) -> f32 {
    dt * consts::REFERENCE_HZ
}

/// Sign of a horizontal input pair: -1 left, 1 right, 0 none or both
#[inline]
pub fn axis(negative: bool, positive: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}
