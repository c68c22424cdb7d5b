//! Scripted motion for platforms and hazards
//!
//! Two motions combine additively:
//! - ping-pong: linear travel between the authored position and
//!   `origin + (tx, ty)` at `speed` units per second
//! - oscillation: `(sin(t) * osc_x, cos(t) * osc_y)` with `t` advancing at
//!   `osc_speed` per second
//!
//! The oscillation offset is applied on top of the ping-pong position and
//! never written back into it.

use glam::Vec2;

use super::body::KinematicBody;
use super::collision::{Aabb, carry_body, push_out};
use super::level::{Hazard, MotionScript, MotionTrack, Platform};
use crate::consts::CARRY_TOLERANCE;

/// Remaining distance treated as arrived, so float drift can't leave an
/// object a hair short of its endpoint
const SNAP_EPSILON: f32 = 1e-3;

/// Ping-pong position after one step, and whether the step reached its end
///
/// Snaps exactly onto the target when the remaining distance is not more
/// than one step.
pub fn path_step(motion: &MotionScript, track: &MotionTrack, dt: f32) -> (Vec2, bool) {
    if !motion.has_path() {
        return (track.path, false);
    }
    let travel = Vec2::new(motion.tx, motion.ty);
    let target = if track.moving_forward {
        track.origin + travel
    } else {
        track.origin
    };
    let to_target = target - track.path;
    let remaining = to_target.length();
    let step = motion.speed * dt;

    if remaining <= step + SNAP_EPSILON {
        (target, true)
    } else {
        (track.path + to_target / remaining * step, false)
    }
}

/// Oscillation offset at the track's current phase
pub fn oscillation_offset(motion: &MotionScript, track: &MotionTrack) -> Vec2 {
    if !motion.oscillates() {
        return Vec2::ZERO;
    }
    Vec2::new(
        track.osc_time.sin() * motion.osc_x,
        track.osc_time.cos() * motion.osc_y,
    )
}

fn advance_phase(motion: &MotionScript, track: &mut MotionTrack, dt: f32) {
    if motion.oscillates() {
        track.osc_time += motion.osc_speed * dt;
    }
}

/// Whether the body stands on `rect` closely enough to ride it
pub fn is_riding(body: &KinematicBody, rect: &Aabb) -> bool {
    let b = body.aabb();
    b.x < rect.right()
        && b.right() > rect.x
        && (b.bottom() - rect.y).abs() <= CARRY_TOLERANCE
        && body.vel.y >= 0.0
}

/// Move every scripted platform one tick and carry the body along with the
/// platform it rests on
///
/// The carry stops at any other platform in the way. Platforms that slid
/// into the body push it out afterwards.
pub fn advance_platforms(platforms: &mut [Platform], body: &mut KinematicBody, dt: f32) {
    let mut carry: Option<(usize, Vec2)> = None;
    let mut moved = false;

    for (index, platform) in platforms.iter_mut().enumerate() {
        if platform.motion.is_static() {
            continue;
        }
        let before = platform.aabb();

        let (path, reached) = path_step(&platform.motion, &platform.track, dt);
        platform.track.path = path;
        if reached {
            platform.track.moving_forward = !platform.track.moving_forward;
        }
        advance_phase(&platform.motion, &mut platform.track, dt);

        let pos = platform.track.path + oscillation_offset(&platform.motion, &platform.track);
        let delta = pos - Vec2::new(before.x, before.y);
        platform.x = pos.x;
        platform.y = pos.y;

        if delta == Vec2::ZERO {
            continue;
        }
        moved = true;
        if carry.is_none() && is_riding(body, &before) {
            carry = Some((index, delta));
        }
    }

    if let Some((carrier, delta)) = carry {
        let applied = carry_body(body, delta, platforms, carrier);
        if applied != delta {
            log::trace!("Carry clipped from {:?} to {:?}", delta, applied);
        }
    }
    if moved && push_out(body, platforms) {
        log::debug!("Body pushed out of a moving platform at {:?}", body.pos);
    }
}

/// Move every awake scripted hazard one tick
///
/// A ping-pong step that would push a hazard into a platform is dropped and
/// the hazard turns around at once. Platforms the hazard already overlaps
/// before the step are ignored so embedded hazards can still travel.
pub fn advance_hazards(traps: &mut [Hazard], platforms: &[Platform], dt: f32) {
    for hazard in traps.iter_mut() {
        if hazard.dormant || hazard.motion.is_static() {
            continue;
        }
        let current = hazard.aabb();

        advance_phase(&hazard.motion, &mut hazard.track, dt);
        let offset = oscillation_offset(&hazard.motion, &hazard.track);

        if hazard.motion.has_path() {
            let (path, reached) = path_step(&hazard.motion, &hazard.track, dt);
            let candidate = current.translated(path + offset - hazard.pos());
            let blocked = platforms.iter().any(|p| {
                let rect = p.aabb();
                candidate.overlaps(&rect) && !current.overlaps(&rect)
            });

            if blocked {
                hazard.track.moving_forward = !hazard.track.moving_forward;
                log::debug!("Hazard {:?} blocked, reversing", hazard.id);
            } else {
                hazard.track.path = path;
                if reached {
                    hazard.track.moving_forward = !hazard.track.moving_forward;
                }
            }
        }

        let pos = hazard.track.path + offset;
        hazard.x = pos.x;
        hazard.y = pos.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LevelSettings, Loadout};

    const DT: f32 = 1.0 / 60.0;

    fn pingpong(speed: f32, tx: f32, ty: f32) -> MotionScript {
        MotionScript {
            speed,
            tx,
            ty,
            ..Default::default()
        }
    }

    fn far_body() -> KinematicBody {
        let mut body = KinematicBody::new(&LevelSettings::default(), &Loadout::default());
        body.pos = Vec2::new(-1000.0, -1000.0);
        body
    }

    #[test]
    fn test_pingpong_round_trip_monotonic() {
        let mut platforms = vec![Platform::new(300.0, 200.0, 100.0, 20.0).with_motion(pingpong(100.0, 200.0, 0.0))];
        let mut body = far_body();

        let mut last = platforms[0].x;
        let mut ticks = 0;
        while platforms[0].x < 500.0 {
            advance_platforms(&mut platforms, &mut body, DT);
            assert!(platforms[0].x > last, "must move strictly forward");
            last = platforms[0].x;
            ticks += 1;
            assert!(ticks < 200);
        }
        assert_eq!(platforms[0].x, 500.0);
        assert!(!platforms[0].track.moving_forward);

        while platforms[0].x > 300.0 {
            advance_platforms(&mut platforms, &mut body, DT);
            assert!(platforms[0].x < last, "must move strictly backward");
            last = platforms[0].x;
            ticks += 1;
            assert!(ticks < 400);
        }
        assert_eq!(platforms[0].x, 300.0);
        assert!(platforms[0].track.moving_forward);
        assert_eq!(platforms[0].y, 200.0);
    }

    #[test]
    fn test_snaps_when_step_overshoots() {
        let motion = pingpong(100.0, 5.0, 0.0);
        let track = MotionTrack::at(Vec2::new(0.0, 0.0));
        let (pos, reached) = path_step(&motion, &track, 0.1);
        assert_eq!(pos, Vec2::new(5.0, 0.0));
        assert!(reached);
    }

    #[test]
    fn test_oscillation_leaves_path_alone() {
        let motion = MotionScript {
            osc_x: 30.0,
            osc_y: 10.0,
            osc_speed: 2.0,
            ..Default::default()
        };
        let mut platforms = vec![Platform::new(100.0, 100.0, 50.0, 10.0).with_motion(motion)];
        let mut body = far_body();
        for _ in 0..90 {
            advance_platforms(&mut platforms, &mut body, DT);
            assert_eq!(platforms[0].track.path, Vec2::new(100.0, 100.0));
        }
        let t = platforms[0].track.osc_time;
        assert!((t - 3.0).abs() < 1e-3);
        assert!((platforms[0].x - (100.0 + t.sin() * 30.0)).abs() < 1e-3);
        assert!((platforms[0].y - (100.0 + t.cos() * 10.0)).abs() < 1e-3);
    }

    #[test]
    fn test_combined_motion_is_additive() {
        let motion = MotionScript {
            speed: 60.0,
            tx: 0.0,
            ty: 120.0,
            osc_x: 20.0,
            osc_speed: 1.0,
            ..Default::default()
        };
        let mut platforms = vec![Platform::new(0.0, 0.0, 50.0, 10.0).with_motion(motion)];
        let mut body = far_body();
        for _ in 0..60 {
            advance_platforms(&mut platforms, &mut body, DT);
        }
        let track = platforms[0].track;
        assert!((track.path.y - 60.0).abs() < 1e-2);
        assert_eq!(track.path.x, 0.0);
        assert!((platforms[0].x - track.osc_time.sin() * 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_body_is_carried() {
        let mut platforms = vec![Platform::new(100.0, 300.0, 100.0, 20.0).with_motion(pingpong(60.0, 0.0, -100.0))];
        let mut body = far_body();
        body.pos = Vec2::new(120.0, 300.0 - body.size.y);
        body.grounded = true;

        advance_platforms(&mut platforms, &mut body, DT);
        assert!((body.pos.y - (299.0 - body.size.y)).abs() < 1e-4);
        assert!((body.aabb().bottom() - platforms[0].y).abs() < 1e-4);
        assert_eq!(body.pos.x, 120.0);
    }

    #[test]
    fn test_rising_body_not_carried() {
        let mut platforms = vec![Platform::new(100.0, 300.0, 100.0, 20.0).with_motion(pingpong(60.0, 100.0, 0.0))];
        let mut body = far_body();
        body.pos = Vec2::new(120.0, 300.0 - body.size.y - 5.0);
        body.vel.y = -4.0;
        let before = body.pos;
        advance_platforms(&mut platforms, &mut body, DT);
        assert_eq!(body.pos, before);
    }

    #[test]
    fn test_carried_body_stops_at_wall() {
        // Platform slides right under a wall block whose bottom is flush with
        // the platform top
        let mut platforms = vec![
            Platform::new(100.0, 300.0, 100.0, 20.0).with_motion(pingpong(60.0, 300.0, 0.0)),
            Platform::new(250.0, 200.0, 20.0, 100.0),
        ];
        let mut body = far_body();
        body.pos = Vec2::new(160.0, 300.0 - body.size.y);
        body.grounded = true;

        for _ in 0..90 {
            advance_platforms(&mut platforms, &mut body, DT);
            assert!(!body.aabb().overlaps(&platforms[1].aabb()));
            assert!(body.pos.x <= 250.0 - body.size.x);
        }
        assert_eq!(body.pos.x, 250.0 - body.size.x);
        assert_eq!(body.aabb().bottom(), 300.0);
    }

    #[test]
    fn test_platform_sliding_into_body_pushes_it() {
        let mut platforms = vec![Platform::new(100.0, 200.0, 50.0, 100.0).with_motion(pingpong(120.0, 200.0, 0.0))];
        let mut body = far_body();
        // Airborne beside the platform's path
        body.pos = Vec2::new(151.0, 220.0);

        advance_platforms(&mut platforms, &mut body, DT);
        assert!(!body.aabb().overlaps(&platforms[0].aabb()));
        assert_eq!(body.pos.x, platforms[0].x + 50.0);
    }

    #[test]
    fn test_hazard_reverses_on_platform() {
        let mut traps = vec![Hazard::spikes(100.0, 100.0, 20.0, 20.0).with_motion(pingpong(120.0, 300.0, 0.0))];
        let platforms = vec![Platform::new(200.0, 50.0, 40.0, 200.0)];

        let mut max_right: f32 = 0.0;
        for _ in 0..120 {
            advance_hazards(&mut traps, &platforms, DT);
            let rect = traps[0].aabb();
            assert!(!rect.overlaps(&platforms[0].aabb()));
            max_right = max_right.max(rect.right());
        }
        // Turned around before the wall, well short of the 400 endpoint
        assert!(max_right <= 200.0);
        assert!(traps[0].x < 180.0);
    }

    #[test]
    fn test_dormant_hazard_does_not_move() {
        let mut traps = vec![Hazard::spikes(100.0, 100.0, 20.0, 20.0).with_motion(pingpong(120.0, 300.0, 0.0))];
        traps[0].dormant = true;
        advance_hazards(&mut traps, &[], 1.0);
        assert_eq!(traps[0].x, 100.0);
    }
}
