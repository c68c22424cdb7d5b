//! Physics and gameplay settings
//!
//! Each level carries an override of the global defaults. Values arrive from
//! level JSON authored by hand or by the editor, so every field is read
//! leniently and then sanitized: anything non-finite or out of range falls
//! back to the default instead of failing the load.

use serde::{Deserialize, Deserializer, Serialize};

/// Named physics constants for one level
///
/// Velocities are in world units per reference frame (see
/// [`crate::consts::REFERENCE_HZ`]); rates are per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelSettings {
    #[serde(deserialize_with = "lenient_f32")]
    pub gravity: f32,
    /// Horizontal velocity multiplier applied per frame when not steering
    #[serde(deserialize_with = "lenient_f32")]
    pub friction: f32,
    /// Horizontal run speed
    #[serde(deserialize_with = "lenient_f32")]
    pub speed: f32,
    /// Jump impulse (negative is up)
    #[serde(deserialize_with = "lenient_f32")]
    pub jump_force: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub max_fall_speed: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub fast_fall_speed: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub world_width: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub world_height: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub player_max_hp: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub player_max_mp: f32,
    /// Mana spent to place a platform beneath the player
    #[serde(deserialize_with = "lenient_f32")]
    pub platform_cost: f32,
    #[serde(deserialize_with = "lenient_f32")]
    pub fall_damage: f32,
    /// Mana regenerated per second
    #[serde(deserialize_with = "lenient_f32")]
    pub mp_regen: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            friction: 0.8,
            speed: 5.0,
            jump_force: -11.0,
            max_fall_speed: 9.0,
            fast_fall_speed: 16.0,
            world_width: 2400.0,
            world_height: 800.0,
            player_max_hp: 100.0,
            player_max_mp: 100.0,
            platform_cost: 25.0,
            fall_damage: 20.0,
            mp_regen: 5.0,
        }
    }
}

impl LevelSettings {
    /// Replace every invalid value with its default
    ///
    /// Returns the cleaned record; the number of replaced fields is logged.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut replaced = 0u32;
        let mut pick = |value: f32, default: f32, valid: fn(f32) -> bool| {
            if value.is_finite() && valid(value) {
                value
            } else {
                replaced += 1;
                default
            }
        };

        let clean = Self {
            gravity: pick(self.gravity, defaults.gravity, |v| v >= 0.0),
            friction: pick(self.friction, defaults.friction, |v| (0.0..=1.0).contains(&v)),
            speed: pick(self.speed, defaults.speed, |v| v > 0.0),
            jump_force: pick(self.jump_force, defaults.jump_force, |v| v < 0.0),
            max_fall_speed: pick(self.max_fall_speed, defaults.max_fall_speed, |v| v > 0.0),
            fast_fall_speed: pick(self.fast_fall_speed, defaults.fast_fall_speed, |v| v > 0.0),
            world_width: pick(self.world_width, defaults.world_width, |v| v > 0.0),
            world_height: pick(self.world_height, defaults.world_height, |v| v > 0.0),
            player_max_hp: pick(self.player_max_hp, defaults.player_max_hp, |v| v > 0.0),
            player_max_mp: pick(self.player_max_mp, defaults.player_max_mp, |v| v >= 0.0),
            platform_cost: pick(self.platform_cost, defaults.platform_cost, |v| v >= 0.0),
            fall_damage: pick(self.fall_damage, defaults.fall_damage, |v| v >= 0.0),
            mp_regen: pick(self.mp_regen, defaults.mp_regen, |v| v >= 0.0),
        };

        if replaced > 0 {
            log::warn!("Level settings: {} invalid value(s) replaced with defaults", replaced);
        }
        clean
    }

    /// Fall speed cap for the current fast-fall input
    #[inline]
    pub fn fall_cap(&self, fast_fall: bool) -> f32 {
        if fast_fall {
            self.fast_fall_speed.max(self.max_fall_speed)
        } else {
            self.max_fall_speed
        }
    }
}

/// Ability upgrades granted by the progression layer (cards, shop)
///
/// The simulation only reads these; buying them happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Loadout {
    /// Air jumps available after leaving the ground
    pub extra_jumps: u32,
    /// Dashes available between landings
    pub extra_dashes: u32,
    /// 0 = none, 1 = climb costs mana, 2+ = free climb
    pub wall_climb_level: u8,
    /// Flat reduction applied to every hit
    pub defense: f32,
    pub dash_speed_mult: f32,
    pub double_jump_mult: f32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            extra_jumps: 1,
            extra_dashes: 1,
            wall_climb_level: 0,
            defense: 0.0,
            dash_speed_mult: 3.0,
            double_jump_mult: 0.9,
        }
    }
}

/// Accept numbers, numeric strings and null; anything unusable becomes NaN
/// so that [`LevelSettings::sanitized`] swaps in the default.
pub(crate) fn lenient_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.map(|v| v as f32).unwrap_or(f32::NAN))
}
