//! Simulation context and the events it raises
//!
//! [`SimState`] owns everything a tick touches: the live level, the
//! pristine copy used for reloads, the player body, the activation queue
//! and the outgoing event buffer.

use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::level::{HazardId, LevelData};
use super::triggers::{ActivationQueue, arm_dormant_hazards};
use crate::settings::{LevelSettings, Loadout};

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Health hit zero; world keeps running while death feedback plays
    Dying { remaining: f32 },
    /// Death settled; the run restarts from the first level
    Dead,
    /// Exit reached
    LevelComplete,
    /// Time limit ran out; the level restarts
    TimeUp,
}

impl GamePhase {
    /// No further ticks run until the level is (re)loaded
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Dead | GamePhase::LevelComplete | GamePhase::TimeUp)
    }
}

/// Notifications for the HUD, progression and audio layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player took a hit
    Damage { amount: f32, hp: f32 },
    /// Health reached zero
    Death,
    GoalCollected { index: usize, total: usize },
    /// Player entered the open exit; `next_level` is `None` after the last
    ExitReached { next_level: Option<usize> },
    /// Player fell out of the world and was put back at the spawn point
    FallRespawn,
    /// Currency earned for the shop
    CurrencyAwarded { amount: u32 },
    /// A trigger-bound hazard woke up
    HazardActivated { id: HazardId },
    TimeExpired,
    /// Jump off the ground
    Jumped,
    DoubleJumped,
    WallJumped,
    Dashed,
    /// Touched down after being airborne
    Landed,
    /// Mana spent on a platform under the player
    PlatformPlaced,
}

/// Everything one tick reads and writes
#[derive(Debug, Clone)]
pub struct SimState {
    /// Live level, mutated every tick
    pub level: LevelData,
    /// Level as loaded, restored on reload
    template: LevelData,
    pub body: KinematicBody,
    pub loadout: Loadout,
    pub phase: GamePhase,
    /// Seconds since the level was (re)loaded
    pub clock: f64,
    /// Ticks since the level was (re)loaded
    pub time_ticks: u64,
    /// Position of this level in the campaign
    pub level_index: usize,
    /// Number of levels in the campaign
    pub level_count: usize,
    pub activations: ActivationQueue,
    /// Raised events waiting for [`SimState::drain_events`]
    pub events: Vec<GameEvent>,
}

impl SimState {
    pub fn new(level: LevelData, loadout: Loadout) -> Self {
        let body = KinematicBody::new(&level.settings, &loadout);
        let mut state = Self {
            level: level.clone(),
            template: level,
            body,
            loadout,
            phase: GamePhase::Playing,
            clock: 0.0,
            time_ticks: 0,
            level_index: 0,
            level_count: 1,
            activations: ActivationQueue::new(),
            events: Vec::new(),
        };
        state.reload();
        state
    }

    /// Replace the level and start it fresh
    pub fn load_level(&mut self, mut level: LevelData) {
        level.prepare();
        log::info!(
            "Loading level '{}' ({} platforms, {} traps, {} triggers, {} goals)",
            level.name,
            level.platforms.len(),
            level.traps.len(),
            level.triggers.len(),
            level.goals.len()
        );
        self.template = level;
        self.reload();
    }

    /// Restart the current level from its loaded state
    ///
    /// Pending activations are cancelled, trigger-bound hazards go back to
    /// sleep and the body respawns with full resources.
    pub fn reload(&mut self) {
        self.level = self.template.clone();
        self.level.prepare();
        arm_dormant_hazards(&mut self.level);
        self.activations.cancel_all();
        self.body.apply_loadout(&self.loadout);
        self.body.reset(self.level.spawn.pos(), &self.level.settings);
        self.phase = GamePhase::Playing;
        self.clock = 0.0;
        self.time_ticks = 0;
    }

    /// Change upgrades; takes effect on the body immediately
    pub fn set_loadout(&mut self, loadout: Loadout) {
        self.loadout = loadout;
        self.body.apply_loadout(&loadout);
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.level.settings
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seconds left on the level timer, if it has one
    pub fn time_remaining(&self) -> Option<f32> {
        let limit = self.level.conditions.time_limit;
        (limit > 0.0).then(|| (limit - self.clock as f32).max(0.0))
    }

    /// Index the exit leads to, `None` after the last level
    pub fn next_level(&self) -> Option<usize> {
        let next = self.level_index + 1;
        (next < self.level_count).then_some(next)
    }
}
