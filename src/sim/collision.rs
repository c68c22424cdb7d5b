//! Axis-separated collision between the player body and level geometry
//!
//! The body moves along X first and is pushed out of every platform it
//! overlaps, then along Y. Platforms are resolved one after another in list
//! order against the already-corrected box, so when two platforms overlap
//! the body in the same pass the later one decides the final position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::level::Platform;
use crate::frame_scale;
use crate::settings::LevelSettings;

/// Axis-aligned box, `(x, y)` is the top-left corner, Y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Box of the given size centred on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }
}

/// What the body touched while resolving one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    /// Came down onto a platform top
    pub landed: bool,
    /// Hit a platform underside or the top of the world while rising
    pub bonked: bool,
    /// -1 wall on the left, 1 wall on the right, 0 none
    pub wall: i8,
}

/// Integrate the body position for one tick and push it out of geometry
///
/// Updates `grounded`, `last_touching_wall` and zeroes the velocity component
/// that ran into something. Landing refills jump and dash counters.
pub fn resolve_body(
    body: &mut KinematicBody,
    platforms: &[Platform],
    settings: &LevelSettings,
    dt: f32,
) -> Contacts {
    let k = frame_scale(dt);
    let mut contacts = Contacts::default();

    // --- X axis ---
    let dx = body.vel.x * k;
    body.pos.x += dx;

    if body.pos.x < 0.0 {
        body.pos.x = 0.0;
        body.vel.x = body.vel.x.max(0.0);
        contacts.wall = -1;
    } else if body.pos.x + body.size.x > settings.world_width {
        body.pos.x = settings.world_width - body.size.x;
        body.vel.x = body.vel.x.min(0.0);
        contacts.wall = 1;
    }

    for platform in platforms {
        let rect = platform.aabb();
        if !body.aabb().overlaps(&rect) {
            continue;
        }
        if dx > 0.0 {
            body.pos.x = rect.x - body.size.x;
            body.vel.x = 0.0;
            contacts.wall = 1;
        } else if dx < 0.0 {
            body.pos.x = rect.right();
            body.vel.x = 0.0;
            contacts.wall = -1;
        }
    }
    body.last_touching_wall = contacts.wall;

    // --- Y axis ---
    let dy = body.vel.y * k;
    body.pos.y += dy;
    body.grounded = false;

    if body.pos.y < 0.0 {
        body.pos.y = 0.0;
        if body.vel.y < 0.0 {
            body.vel.y = 0.0;
            contacts.bonked = true;
        }
    }

    for platform in platforms {
        let rect = platform.aabb();
        if !body.aabb().overlaps(&rect) {
            continue;
        }
        if dy > 0.0 {
            body.pos.y = rect.y - body.size.y;
            body.vel.y = 0.0;
            contacts.landed = true;
            contacts.bonked = false;
        } else if dy < 0.0 {
            body.pos.y = rect.bottom();
            body.vel.y = 0.0;
            contacts.bonked = true;
            contacts.landed = false;
        }
    }

    // Gravity is off while dashing, so a body dashing along the floor never
    // moves down into it; count it as grounded when something is right below.
    if !contacts.landed && dy == 0.0 && is_supported(body, platforms) {
        contacts.landed = true;
    }

    if contacts.landed {
        body.grounded = true;
        body.refill_abilities();
    }

    contacts
}

/// Whether a platform top sits directly under the body's feet
pub fn is_supported(body: &KinematicBody, platforms: &[Platform]) -> bool {
    let below = body.aabb().translated(Vec2::new(0.0, 1.0));
    platforms.iter().any(|p| {
        let rect = p.aabb();
        below.overlaps(&rect) && (body.aabb().bottom() - rect.y).abs() < 1.0
    })
}

/// Move a riding body by its platform's displacement, stopping at the first
/// face in the way
///
/// `carrier` is the index of the platform being ridden; it is skipped since
/// the body rests on it. Returns the displacement actually applied.
pub fn carry_body(
    body: &mut KinematicBody,
    delta: Vec2,
    platforms: &[Platform],
    carrier: usize,
) -> Vec2 {
    let start = body.pos;
    let others = || {
        platforms
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != carrier)
            .map(|(_, p)| p.aabb())
    };

    if delta.x != 0.0 {
        body.pos.x += delta.x;
        for rect in others() {
            if !body.aabb().overlaps(&rect) {
                continue;
            }
            body.pos.x = if delta.x > 0.0 { rect.x - body.size.x } else { rect.right() };
            body.vel.x = 0.0;
        }
    }

    if delta.y != 0.0 {
        body.pos.y += delta.y;
        for rect in others() {
            if !body.aabb().overlaps(&rect) {
                continue;
            }
            body.pos.y = if delta.y > 0.0 { rect.y - body.size.y } else { rect.bottom() };
        }
    }

    body.pos - start
}

/// Push the body out of every platform overlapping it
///
/// Each overlap is left through the nearest face whose exit position is
/// clear of all platforms; a body squeezed between two platforms takes the
/// shortest free way out instead of being pushed into the other one. Only
/// platforms that moved into the body this tick cause overlap, since the
/// axis passes never leave any. Returns whether the body moved.
pub fn push_out(body: &mut KinematicBody, platforms: &[Platform]) -> bool {
    let mut pushed = false;

    for _ in 0..=platforms.len() {
        let b = body.aabb();
        let Some(rect) = platforms.iter().map(|p| p.aabb()).find(|r| b.overlaps(r)) else {
            break;
        };

        // Ties resolve up, down, left, right
        let mut exits = [
            (b.bottom() - rect.y, Vec2::new(b.x, rect.y - b.h)),
            (rect.bottom() - b.y, Vec2::new(b.x, rect.bottom())),
            (b.right() - rect.x, Vec2::new(rect.x - b.w, b.y)),
            (rect.right() - b.x, Vec2::new(rect.right(), b.y)),
        ];
        exits.sort_by(|l, r| l.0.total_cmp(&r.0));
        let is_clear = |pos: Vec2| {
            let moved = Aabb::new(pos.x, pos.y, b.w, b.h);
            !platforms.iter().any(|p| moved.overlaps(&p.aabb()))
        };
        let target = exits
            .iter()
            .map(|(_, pos)| *pos)
            .find(|pos| is_clear(*pos))
            .unwrap_or(exits[0].1);

        let offset = target - body.pos;
        body.pos = target;
        if offset.y < 0.0 {
            body.vel.y = body.vel.y.min(0.0);
        } else if offset.y > 0.0 {
            body.vel.y = body.vel.y.max(0.0);
        }
        if offset.x < 0.0 {
            body.vel.x = body.vel.x.min(0.0);
        } else if offset.x > 0.0 {
            body.vel.x = body.vel.x.max(0.0);
        }
        pushed = true;
    }

    pushed
}
