//! Level description consumed when a world is constructed.

use glam::Vec2;
use lantern_core::Archetype;
use serde::Deserialize;

/// Static description of a level: bounds, obstacles and initial entities.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelLayout {
    /// Size of the level measured from the origin, in world units.
    pub bounds: Vec2,
    /// Radius shared by the player and enemies; tiles are twice as wide.
    pub entity_radius: f32,
    /// Static axis-aligned obstacles.
    #[serde(default)]
    pub walls: Vec<WallBox>,
    /// Where the player starts and how bright their light is.
    pub player: PlayerSpawn,
    /// Enemies in id order.
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    /// Range the player's light radius is clamped to.
    #[serde(default)]
    pub light: LightLimits,
    /// Behaviour of thrown flares.
    #[serde(default)]
    pub flares: FlareTuning,
}

/// Axis-aligned static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct WallBox {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl WallBox {
    pub(crate) fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.x <= self.max.x && self.min.y <= self.max.y
    }
}

/// Initial player state.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PlayerSpawn {
    /// Starting position.
    pub position: Vec2,
    /// Starting light radius.
    pub light_radius: f32,
}

/// Initial enemy state.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct EnemySpawn {
    /// Behaviour profile.
    pub archetype: Archetype,
    /// Starting position.
    pub position: Vec2,
    /// Distance covered per step, in world units per tick.
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
}

fn default_enemy_speed() -> f32 {
    0.1
}

/// Bounds applied to the player's light radius.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightLimits {
    /// Dimmest allowed radius.
    pub min_radius: f32,
    /// Brightest allowed radius.
    pub max_radius: f32,
}

impl Default for LightLimits {
    fn default() -> Self {
        Self {
            min_radius: 1.0,
            max_radius: 10.0,
        }
    }
}

impl LightLimits {
    pub(crate) fn clamp(&self, radius: f32) -> f32 {
        radius.clamp(self.min_radius, self.max_radius)
    }
}

/// Tuning for thrown flares.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlareTuning {
    /// Radius of a flare's light.
    pub light_radius: f32,
    /// Ticks a flare burns before going out.
    pub burn_ticks: u32,
    /// Fraction of velocity kept after each tick.
    pub friction: f32,
    /// Speed below which a flare comes to rest.
    pub stop_speed: f32,
}

impl Default for FlareTuning {
    fn default() -> Self {
        Self {
            light_radius: 3.0,
            burn_ticks: 600,
            friction: 0.9,
            stop_speed: 0.01,
        }
    }
}
