//! Hazard geometry and damage
//!
//! Spikes hurt on box overlap. Lasers fire a beam along one of the four axis
//! directions; the beam stops at the nearest platform in its path and is
//! recomputed every tick because platforms move.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{DamageOutcome, KinematicBody};
use super::collision::Aabb;
use super::level::{Hazard, HazardId, Platform};

/// Quarter-turn orientation; also the laser firing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// 0°, fires toward +X
    #[default]
    Right,
    /// 90°, fires toward +Y
    Down,
    /// 180°
    Left,
    /// 270°
    Up,
}

impl Rotation {
    /// Snap any angle to the nearest quarter turn
    pub fn from_degrees(degrees: f32) -> Self {
        if !degrees.is_finite() {
            return Rotation::Right;
        }
        match ((degrees / 90.0).round() as i64).rem_euclid(4) {
            1 => Rotation::Down,
            2 => Rotation::Left,
            3 => Rotation::Up,
            _ => Rotation::Right,
        }
    }

    pub fn degrees(&self) -> f32 {
        match self {
            Rotation::Right => 0.0,
            Rotation::Down => 90.0,
            Rotation::Left => 180.0,
            Rotation::Up => 270.0,
        }
    }

    pub fn direction(&self) -> Vec2 {
        match self {
            Rotation::Right => Vec2::X,
            Rotation::Down => Vec2::Y,
            Rotation::Left => Vec2::NEG_X,
            Rotation::Up => Vec2::NEG_Y,
        }
    }

    /// Width and height swap at 90° and 270°
    pub fn is_vertical(&self) -> bool {
        matches!(self, Rotation::Down | Rotation::Up)
    }
}

/// Laser beam parameters and the clipped length for this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    /// Nominal length when nothing blocks it
    pub length: f32,
    /// Thickness used when looking for blocking platforms
    pub width: f32,
    /// Length after clipping against platforms
    pub extent: f32,
}

impl Beam {
    pub fn new(length: f32, width: f32) -> Self {
        Self {
            length,
            width,
            extent: length,
        }
    }

    /// Distance from `origin` to the nearest blocking platform face, capped
    /// at the nominal length
    ///
    /// A platform blocks when it overlaps the beam's thickness band and its
    /// near face lies ahead of the origin. Platforms enclosing the origin are
    /// ignored so an emitter can be mounted flush on a wall.
    pub fn clip(&self, origin: Vec2, rotation: Rotation, platforms: &[Platform]) -> f32 {
        let half = self.width / 2.0;
        let mut extent = self.length;

        for platform in platforms {
            let r = platform.aabb();
            let distance = match rotation {
                Rotation::Right | Rotation::Left => {
                    if !(r.y < origin.y + half && r.bottom() > origin.y - half) {
                        continue;
                    }
                    if rotation == Rotation::Right {
                        r.x - origin.x
                    } else {
                        origin.x - r.right()
                    }
                }
                Rotation::Down | Rotation::Up => {
                    if !(r.x < origin.x + half && r.right() > origin.x - half) {
                        continue;
                    }
                    if rotation == Rotation::Down {
                        r.y - origin.y
                    } else {
                        origin.y - r.bottom()
                    }
                }
            };
            if distance >= 0.0 && distance < extent {
                extent = distance;
            }
        }

        extent
    }

    /// Whether a body box is hit by the beam segment
    ///
    /// Tests the body's centre against the segment's bounds grown by half the
    /// body size. The beam's drawn width plays no part.
    pub fn hits(&self, origin: Vec2, rotation: Rotation, body: &Aabb) -> bool {
        let end = origin + rotation.direction() * self.extent;
        let min = origin.min(end);
        let max = origin.max(end);
        let c = body.center();
        let half = Vec2::new(body.w, body.h) / 2.0;
        c.x > min.x - half.x && c.x < max.x + half.x && c.y > min.y - half.y && c.y < max.y + half.y
    }
}

/// Hazard variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    Spikes,
    Laser(Beam),
}

impl Hazard {
    /// Collision box
    ///
    /// Spikes use `(x, y)` as the top-left corner of the rotated, scaled box.
    /// Lasers are point emitters at `(x, y)` with the box centred on them.
    pub fn aabb(&self) -> Aabb {
        let (mut w, mut h) = (self.width * self.scale, self.height * self.scale);
        if self.rotation.is_vertical() {
            std::mem::swap(&mut w, &mut h);
        }
        match self.kind {
            HazardKind::Spikes => Aabb::new(self.x, self.y, w, h),
            HazardKind::Laser(_) => Aabb::centered(self.pos(), w, h),
        }
    }

    /// Recompute per-tick geometry (beam clipping); nothing for spikes
    pub fn compute_extent(&mut self, platforms: &[Platform]) {
        let origin = self.pos();
        let rotation = self.rotation;
        if let HazardKind::Laser(beam) = &mut self.kind {
            beam.extent = beam.clip(origin, rotation, platforms);
        }
    }

    /// Whether the body is touching the damaging part of this hazard
    pub fn test_overlap(&self, body: &Aabb) -> bool {
        match &self.kind {
            HazardKind::Spikes => self.aabb().overlaps(body),
            HazardKind::Laser(beam) => beam.hits(self.pos(), self.rotation, body),
        }
    }

    /// End point of the clipped beam, for rendering
    pub fn beam_end(&self) -> Option<Vec2> {
        match &self.kind {
            HazardKind::Laser(beam) => Some(self.pos() + self.rotation.direction() * beam.extent),
            HazardKind::Spikes => None,
        }
    }
}

/// One hazard hit landed this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardHit {
    pub hazard: HazardId,
    pub outcome: DamageOutcome,
}

/// Refresh beam extents and apply damage from every awake hazard touching
/// the body
///
/// Hits absorbed by the invulnerability window are not reported.
pub fn evaluate_hazards(
    traps: &mut [Hazard],
    platforms: &[Platform],
    body: &mut KinematicBody,
) -> Vec<HazardHit> {
    let mut hits = Vec::new();

    for hazard in traps.iter_mut() {
        hazard.compute_extent(platforms);
        if hazard.dormant || !body.is_alive() {
            continue;
        }
        if !hazard.test_overlap(&body.aabb()) {
            continue;
        }
        let was_invulnerable = body.invulnerable;
        let outcome = body.take_damage(hazard.damage);
        if !was_invulnerable {
            hits.push(HazardHit {
                hazard: hazard.id,
                outcome,
            });
        }
    }

    hits
}
