//! Property tests for the simulation.
//!
//! These use `proptest` to drive the body and scripted objects with random
//! timesteps and inputs and check that the movement invariants hold.

use glam::Vec2;
use proptest::prelude::*;

use ridge_runner::consts::*;
use ridge_runner::sim::{
    KinematicBody, LevelData, MotionScript, Platform, SimState, Spawn, TickInput,
    advance_platforms, tick,
};
use ridge_runner::{LevelSettings, Loadout};

/// Timestep between 240 Hz and 30 Hz
fn frame_dt() -> impl Strategy<Value = f32> {
    (8u32..=33).prop_map(|ms| ms as f32 / 1000.0)
}

fn tick_input() -> impl Strategy<Value = TickInput> {
    any::<u8>().prop_map(|bits| TickInput {
        left: bits & 1 != 0,
        right: bits & 2 != 0,
        jump: bits & 4 != 0,
        fast_fall: bits & 8 != 0,
        dash: bits & 16 != 0,
        place_platform: bits & 32 != 0,
    })
}

fn floor_level(spawn_y: f32) -> LevelData {
    LevelData {
        platforms: vec![Platform::new(0.0, 500.0, 2400.0, 40.0)],
        spawn: Spawn { x: 300.0, y: spawn_y },
        ..Default::default()
    }
}

/// Thin walls on the floor, and a moving platform that slides under a ledge
/// with less headroom than the body is tall
fn obstacle_level() -> LevelData {
    LevelData {
        platforms: vec![
            Platform::new(0.0, 500.0, 2400.0, 40.0),
            Platform::new(400.0, 380.0, 10.0, 120.0),
            Platform::new(700.0, 380.0, 10.0, 120.0),
            Platform::new(1000.0, 400.0, 100.0, 16.0).with_motion(MotionScript {
                speed: 60.0,
                tx: 300.0,
                ..Default::default()
            }),
            Platform::new(1150.0, 330.0, 100.0, 40.0),
        ],
        spawn: Spawn { x: 100.0, y: 460.0 },
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Falling onto a platform at up to 30 Hz never ends up inside or below it
    #[test]
    fn falling_body_never_tunnels(
        spawn_y in 0.0f32..400.0,
        fast_fall in any::<bool>(),
        dts in prop::collection::vec(frame_dt(), 60..240),
    ) {
        let mut state = SimState::new(floor_level(spawn_y), Loadout::default());
        let input = TickInput { fast_fall, ..Default::default() };
        for dt in dts {
            tick(&mut state, &input, dt);
            prop_assert!(state.body.aabb().bottom() <= 500.0 + 1e-3,
                "body sank to {}", state.body.aabb().bottom());
        }
    }

    /// Any input sequence keeps resources and position in range
    #[test]
    fn resources_stay_clamped(
        inputs in prop::collection::vec((tick_input(), frame_dt()), 1..300),
    ) {
        let mut state = SimState::new(LevelData::demo(), Loadout::default());
        for (input, dt) in inputs {
            tick(&mut state, &input, dt);
            let body = &state.body;
            prop_assert!(body.hp >= 0.0 && body.hp <= body.max_hp);
            prop_assert!(body.mp >= 0.0 && body.mp <= body.max_mp);
            prop_assert!(body.pos.x >= 0.0);
            prop_assert!(body.pos.x + body.size.x <= state.level.settings.world_width + 1e-3);
            prop_assert!(body.vel.is_finite());
            prop_assert!(body.jumps_remaining <= body.extra_jumps);
            prop_assert!(body.dashes_remaining <= body.extra_dashes);
            prop_assert!(state.level.platforms.iter().filter(|p| p.placed).count() <= MAX_PLACED_PLATFORMS);
        }
    }

    /// Running, jumping and dashing through thin walls and moving platforms
    /// never leaves the body inside any platform
    #[test]
    fn body_never_ends_inside_a_platform(
        start_x in 0.0f32..1400.0,
        inputs in prop::collection::vec((tick_input(), frame_dt()), 1..400),
    ) {
        let mut state = SimState::new(obstacle_level(), Loadout::default());
        state.body.pos = Vec2::new(start_x, 0.0);
        for (input, dt) in inputs {
            let input = TickInput { place_platform: false, ..input };
            tick(&mut state, &input, dt);
            let bounds = state.body.aabb();
            for (index, platform) in state.level.platforms.iter().enumerate() {
                prop_assert!(
                    !bounds.overlaps(&platform.aabb()),
                    "body {:?} inside platform {} {:?}", bounds, index, platform.aabb()
                );
            }
        }
    }

    /// A second hit inside the invulnerability window changes nothing
    #[test]
    fn invulnerability_absorbs_repeat_hits(
        first in 1.0f32..60.0,
        second in 0.0f32..500.0,
        defense in 0.0f32..10.0,
        elapsed in 0.0f32..(INVULNERABLE_DURATION - 0.01),
    ) {
        let loadout = Loadout { defense, ..Default::default() };
        let mut body = KinematicBody::new(&LevelSettings::default(), &loadout);
        let hit = body.take_damage(first);
        prop_assert!((hit.dealt - (first - defense).max(0.0)).abs() < 1e-3);

        body.tick_timers(elapsed);
        let hp = body.hp;
        let repeat = body.take_damage(second);
        prop_assert_eq!(repeat.dealt, 0.0);
        prop_assert_eq!(body.hp, hp);
        prop_assert!(!repeat.died);
    }

    /// Ping-pong platforms move monotonically toward each endpoint and never
    /// overshoot it
    #[test]
    fn pingpong_is_monotonic(
        speed in 10.0f32..400.0,
        tx in -300.0f32..300.0,
        dts in prop::collection::vec(frame_dt(), 1..400),
    ) {
        prop_assume!(tx.abs() > 1.0);
        let motion = MotionScript { speed, tx, ..Default::default() };
        let start = 1000.0;
        let end = start + tx;
        let (lo, hi) = (start.min(end), start.max(end));
        let mut platforms = vec![Platform::new(start, 200.0, 80.0, 16.0).with_motion(motion)];
        let mut body = KinematicBody::new(&LevelSettings::default(), &Loadout::default());
        body.pos = Vec2::new(-500.0, -500.0);

        for dt in dts {
            let before = platforms[0].x;
            let forward = platforms[0].track.moving_forward;
            advance_platforms(&mut platforms, &mut body, dt);
            let after = platforms[0].x;

            prop_assert!(after >= lo - 1e-3 && after <= hi + 1e-3);
            prop_assert_eq!(platforms[0].y, 200.0);
            let toward = if forward { end } else { start };
            prop_assert!((toward - after).abs() <= (toward - before).abs() + 1e-3);
        }
    }
}
