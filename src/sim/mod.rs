//! Simulation module
//!
//! All gameplay logic lives here. It has no rendering or platform
//! dependencies:
//! - Variable `dt` in seconds, clamped per tick
//! - Stable iteration order (list order for platforms and hazards)
//! - Events are buffered on the state and drained by the caller

pub mod abilities;
pub mod body;
pub mod collision;
pub mod hazard;
pub mod level;
pub mod motion;
pub mod state;
pub mod tick;
pub mod triggers;

pub use abilities::{Actions, apply_abilities, try_place_platform};
pub use body::{DamageOutcome, KinematicBody};
pub use collision::{Aabb, Contacts, carry_body, push_out, resolve_body};
pub use hazard::{Beam, HazardHit, HazardKind, Rotation, evaluate_hazards};
pub use level::{
    Binding, Conditions, Exit, Goal, Hazard, HazardId, JumpPad, LevelData, MotionScript,
    Platform, Spawn, TriggerVolume,
};
pub use motion::{advance_hazards, advance_platforms};
pub use state::{GameEvent, GamePhase, SimState};
pub use tick::{TickInput, substeps, tick};
pub use triggers::{ActivationQueue, evaluate_triggers};
