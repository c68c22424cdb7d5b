//! Level data snapshot
//!
//! The level is authored elsewhere (editor, JSON files) and handed to the
//! simulation as a [`LevelData`]. Parsing is lenient: missing collections are
//! empty, missing numbers take defaults, and [`LevelData::prepare`] fixes up
//! anything the simulation can't use as-is.

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize};

use super::collision::Aabb;
use super::hazard::{Beam, HazardKind, Rotation};
use crate::consts::*;
use crate::settings::LevelSettings;

/// Stable hazard handle; survives reordering and deletion of other hazards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HazardId(pub u32);

/// Authored motion parameters shared by platforms and hazards
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionScript {
    /// Ping-pong speed in units per second
    pub speed: f32,
    /// Ping-pong offset from the starting position
    pub tx: f32,
    pub ty: f32,
    /// Oscillation amplitude
    pub osc_x: f32,
    pub osc_y: f32,
    /// Oscillation phase advance per second
    pub osc_speed: f32,
}

impl MotionScript {
    pub fn has_path(&self) -> bool {
        self.speed > 0.0 && (self.tx != 0.0 || self.ty != 0.0)
    }

    pub fn oscillates(&self) -> bool {
        self.osc_speed > 0.0
    }

    pub fn is_static(&self) -> bool {
        !self.has_path() && !self.oscillates()
    }

    fn sanitize(&mut self) {
        for v in [
            &mut self.speed,
            &mut self.tx,
            &mut self.ty,
            &mut self.osc_x,
            &mut self.osc_y,
            &mut self.osc_speed,
        ] {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
    }
}

/// Runtime motion state, rebuilt on every level load
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionTrack {
    /// Authored position; the ping-pong runs between here and `origin + (tx, ty)`
    pub origin: Vec2,
    /// Current ping-pong position, without oscillation
    pub path: Vec2,
    pub moving_forward: bool,
    /// Accumulated oscillation phase
    pub osc_time: f32,
}

impl MotionTrack {
    pub fn at(origin: Vec2) -> Self {
        Self {
            origin,
            path: origin,
            moving_forward: true,
            osc_time: 0.0,
        }
    }
}

/// Solid rectangle, optionally scripted to move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(flatten)]
    pub motion: MotionScript,
    #[serde(skip)]
    pub track: MotionTrack,
    /// Bought with mana during play; dropped on reload
    #[serde(skip)]
    pub placed: bool,
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 20.0)
    }
}

impl Platform {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            motion: MotionScript::default(),
            track: MotionTrack::at(Vec2::new(x, y)),
            placed: false,
        }
    }

    pub fn with_motion(mut self, motion: MotionScript) -> Self {
        self.motion = motion;
        self
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Authored hazard as it appears in level JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HazardDef {
    #[serde(rename = "type")]
    kind: HazardType,
    id: Option<u32>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    rotation: f32,
    scale: f32,
    damage: Option<f32>,
    dormant: bool,
    length: Option<f32>,
    beam_width: Option<f32>,
    #[serde(flatten)]
    motion: MotionScript,
}

impl Default for HazardDef {
    fn default() -> Self {
        Self {
            kind: HazardType::Spikes,
            id: None,
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 20.0,
            rotation: 0.0,
            scale: 1.0,
            damage: None,
            dormant: false,
            length: None,
            beam_width: None,
            motion: MotionScript::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum HazardType {
    Laser,
    /// Unknown types behave like spikes
    #[serde(other)]
    Spikes,
}

/// A damaging object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HazardDef", into = "HazardDef")]
pub struct Hazard {
    /// Assigned by [`LevelData::prepare`] when not authored
    pub id: HazardId,
    pub kind: HazardKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: Rotation,
    pub scale: f32,
    pub damage: f32,
    /// Dormant hazards neither move nor hurt
    pub dormant: bool,
    pub motion: MotionScript,
    pub track: MotionTrack,
    authored_id: bool,
}

impl Hazard {
    pub fn spikes(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from(HazardDef {
            x,
            y,
            width,
            height,
            ..Default::default()
        })
    }

    /// Laser emitter at `(x, y)` firing along `rotation`
    pub fn laser(x: f32, y: f32, rotation: Rotation, length: f32) -> Self {
        Self::from(HazardDef {
            kind: HazardType::Laser,
            x,
            y,
            width: 20.0,
            height: 20.0,
            rotation: rotation.degrees(),
            length: Some(length),
            ..Default::default()
        })
    }

    pub fn with_motion(mut self, motion: MotionScript) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<HazardDef> for Hazard {
    fn from(def: HazardDef) -> Self {
        let finite_or = |v: f32, default: f32| if v.is_finite() { v } else { default };
        let scale = finite_or(def.scale, 1.0);
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let kind = match def.kind {
            HazardType::Spikes => HazardKind::Spikes,
            HazardType::Laser => {
                let length = def
                    .length
                    .filter(|l| l.is_finite() && *l >= 0.0)
                    .unwrap_or(LASER_DEFAULT_LENGTH);
                let width = def
                    .beam_width
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .unwrap_or(LASER_DEFAULT_BEAM_WIDTH);
                HazardKind::Laser(Beam::new(length, width))
            }
        };
        let default_damage = match kind {
            HazardKind::Spikes => 20.0,
            HazardKind::Laser(_) => 10.0,
        };
        let mut motion = def.motion;
        motion.sanitize();
        let (x, y) = (finite_or(def.x, 0.0), finite_or(def.y, 0.0));

        Self {
            id: HazardId(def.id.unwrap_or(0)),
            kind,
            x,
            y,
            width: finite_or(def.width, 40.0).abs(),
            height: finite_or(def.height, 20.0).abs(),
            rotation: Rotation::from_degrees(def.rotation),
            scale,
            damage: def
                .damage
                .filter(|d| d.is_finite() && *d >= 0.0)
                .unwrap_or(default_damage),
            dormant: def.dormant,
            motion,
            track: MotionTrack::at(Vec2::new(x, y)),
            authored_id: def.id.is_some(),
        }
    }
}

impl From<Hazard> for HazardDef {
    fn from(hazard: Hazard) -> Self {
        let (kind, length, beam_width) = match hazard.kind {
            HazardKind::Spikes => (HazardType::Spikes, None, None),
            HazardKind::Laser(beam) => (HazardType::Laser, Some(beam.length), Some(beam.width)),
        };
        Self {
            kind,
            id: Some(hazard.id.0),
            x: hazard.track.origin.x,
            y: hazard.track.origin.y,
            width: hazard.width,
            height: hazard.height,
            rotation: hazard.rotation.degrees(),
            scale: hazard.scale,
            damage: Some(hazard.damage),
            dormant: false,
            length,
            beam_width,
            motion: hazard.motion,
        }
    }
}

/// Launches the player upward on contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JumpPad {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Must be negative (upward); fixed up by [`LevelData::prepare`]
    pub jump_force: f32,
}

impl Default for JumpPad {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 50.0,
            h: 10.0,
            jump_force: DEFAULT_JUMP_PAD_FORCE,
        }
    }
}

impl JumpPad {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }
}

/// Trigger-to-hazard link
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Binding {
    /// Position in `traps` at authoring time; only read during prepare
    #[serde(deserialize_with = "lenient_index")]
    pub trap_index: Option<usize>,
    /// Resolved stable handle; `None` when the index pointed nowhere
    pub hazard_id: Option<HazardId>,
    /// Seconds between entering the trigger and activation
    #[serde(deserialize_with = "crate::settings::lenient_f32")]
    pub delay: f32,
}

/// Accept non-negative integers and numeric strings; anything else leaves
/// the binding dangling instead of failing the whole level
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0 && v.fract() == 0.0).map(|v| v as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    let index = parsed.and_then(|v| usize::try_from(v).ok());
    if index.is_none() {
        log::warn!("Ignoring unusable trap index {}", value);
    }
    Ok(index)
}

/// Zone that wakes dormant hazards when the player enters it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerVolume {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub one_shot: bool,
    #[serde(skip)]
    pub triggered: bool,
    /// Player was inside last tick
    #[serde(skip)]
    pub occupied: bool,
    pub bindings: Vec<Binding>,
}

impl Default for TriggerVolume {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 50.0,
            h: 50.0,
            one_shot: true,
            triggered: false,
            occupied: false,
            bindings: Vec::new(),
        }
    }
}

impl TriggerVolume {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            ..Default::default()
        }
    }

    /// Bind a hazard by its stable id
    pub fn bind(mut self, hazard: HazardId, delay: f32) -> Self {
        self.bindings.push(Binding {
            trap_index: None,
            hazard_id: Some(hazard),
            delay,
        });
        self
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
    pub x: f32,
    pub y: f32,
    #[serde(skip)]
    pub collected: bool,
}

impl Goal {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            collected: false,
        }
    }

    /// Pickup box centred on the goal point
    pub fn aabb(&self) -> Aabb {
        Aabb::centered(Vec2::new(self.x, self.y), GOAL_SIZE, GOAL_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exit {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(skip)]
    pub active: bool,
}

impl Default for Exit {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 40.0,
            h: 60.0,
            active: false,
        }
    }
}

impl Exit {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
}

impl Default for Spawn {
    fn default() -> Self {
        Self { x: 100.0, y: 100.0 }
    }
}

impl Spawn {
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Win/lose conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conditions {
    /// Seconds; 0 means no limit
    pub time_limit: f32,
    /// Goals needed to open the exit; 0 means all of them
    pub target_count: u32,
    /// Currency awarded when the exit is reached
    pub reward: u32,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            time_limit: 0.0,
            target_count: 0,
            reward: 10,
        }
    }
}

/// Complete level snapshot owned by the simulation while it runs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub name: String,
    pub settings: LevelSettings,
    pub platforms: Vec<Platform>,
    pub traps: Vec<Hazard>,
    pub jumppads: Vec<JumpPad>,
    pub triggers: Vec<TriggerVolume>,
    pub goals: Vec<Goal>,
    pub exit: Option<Exit>,
    pub spawn: Spawn,
    pub conditions: Conditions,
}

impl LevelData {
    /// Parse level JSON and prepare it for simulation
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut level: LevelData = serde_json::from_str(json)?;
        level.prepare();
        Ok(level)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Normalize authored data: sanitize settings, assign hazard ids, map
    /// trigger bindings from array positions to ids, coerce jump pad forces
    /// and reset motion tracks. Safe to call more than once.
    pub fn prepare(&mut self) {
        self.settings = self.settings.sanitized();

        // Authored ids win; everything else gets a fresh id above them
        let mut next_id = self
            .traps
            .iter()
            .filter(|h| h.authored_id)
            .map(|h| h.id.0 + 1)
            .max()
            .unwrap_or(1);
        for hazard in &mut self.traps {
            if !hazard.authored_id {
                hazard.id = HazardId(next_id);
                hazard.authored_id = true;
                next_id += 1;
            }
        }

        let ids: Vec<HazardId> = self.traps.iter().map(|h| h.id).collect();
        for (t, trigger) in self.triggers.iter_mut().enumerate() {
            for binding in &mut trigger.bindings {
                if binding.hazard_id.is_none() {
                    if let Some(index) = binding.trap_index {
                        binding.hazard_id = ids.get(index).copied();
                        if binding.hazard_id.is_none() {
                            log::warn!(
                                "Trigger {} binds trap index {} which does not exist ({} traps)",
                                t,
                                index,
                                ids.len()
                            );
                        }
                    }
                }
                binding.trap_index = None;
                if !binding.delay.is_finite() || binding.delay < 0.0 {
                    binding.delay = 0.0;
                }
            }
        }

        for pad in &mut self.jumppads {
            if !pad.jump_force.is_finite() || pad.jump_force >= 0.0 {
                log::warn!(
                    "Jump pad at ({}, {}) has non-upward force {}, using {}",
                    pad.x,
                    pad.y,
                    pad.jump_force,
                    DEFAULT_JUMP_PAD_FORCE
                );
                pad.jump_force = DEFAULT_JUMP_PAD_FORCE;
            }
        }

        self.platforms.retain(|p| !p.placed);
        for platform in &mut self.platforms {
            platform.motion.sanitize();
            platform.track = MotionTrack::at(platform.pos());
        }
        for hazard in &mut self.traps {
            hazard.track = MotionTrack::at(hazard.pos());
            if let HazardKind::Laser(beam) = &mut hazard.kind {
                beam.extent = beam.length;
            }
        }
    }

    pub fn hazard_index(&self, id: HazardId) -> Option<usize> {
        self.traps.iter().position(|h| h.id == id)
    }

    pub fn hazard(&self, id: HazardId) -> Option<&Hazard> {
        self.traps.iter().find(|h| h.id == id)
    }

    pub fn hazard_mut(&mut self, id: HazardId) -> Option<&mut Hazard> {
        self.traps.iter_mut().find(|h| h.id == id)
    }

    /// Append a hazard and return its new id
    pub fn add_hazard(&mut self, mut hazard: Hazard) -> HazardId {
        let id = HazardId(self.traps.iter().map(|h| h.id.0 + 1).max().unwrap_or(1));
        hazard.id = id;
        hazard.authored_id = true;
        hazard.track = MotionTrack::at(hazard.pos());
        self.traps.push(hazard);
        id
    }

    /// Remove a hazard; bindings that pointed at it are left dangling
    pub fn remove_hazard(&mut self, id: HazardId) -> Option<Hazard> {
        let index = self.hazard_index(id)?;
        Some(self.traps.remove(index))
    }

    /// Goals the exit needs before it opens
    pub fn goals_required(&self) -> usize {
        match self.conditions.target_count {
            0 => self.goals.len(),
            n => (n as usize).min(self.goals.len()),
        }
    }

    pub fn goals_collected(&self) -> usize {
        self.goals.iter().filter(|g| g.collected).count()
    }

    /// Small built-in level: floor, a moving platform, a gated laser, spikes
    /// and one goal
    pub fn demo() -> Self {
        let mut level = LevelData {
            name: "Demo".to_string(),
            spawn: Spawn { x: 60.0, y: 400.0 },
            ..Default::default()
        };
        level.platforms = vec![
            Platform::new(0.0, 500.0, 900.0, 40.0),
            Platform::new(1100.0, 500.0, 900.0, 40.0),
            Platform::new(900.0, 450.0, 120.0, 16.0).with_motion(MotionScript {
                speed: 80.0,
                tx: 100.0,
                ..Default::default()
            }),
            Platform::new(1500.0, 300.0, 40.0, 200.0),
        ];
        let spikes = level.add_hazard(Hazard::spikes(600.0, 480.0, 60.0, 20.0));
        let laser = level.add_hazard(Hazard::laser(1150.0, 470.0, Rotation::Right, 500.0));
        level.triggers = vec![TriggerVolume::new(1100.0, 400.0, 60.0, 100.0).bind(laser, 1.0)];
        level.jumppads = vec![JumpPad {
            x: 400.0,
            y: 490.0,
            ..Default::default()
        }];
        level.goals = vec![Goal::new(1300.0, 440.0)];
        level.exit = Some(Exit {
            x: 1900.0,
            y: 440.0,
            ..Default::default()
        });
        log::debug!("Demo level built with spikes {:?} and laser {:?}", spikes, laser);
        level.prepare();
        level
    }
}
