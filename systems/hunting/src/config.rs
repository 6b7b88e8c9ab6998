//! Tuning knobs for enemy decision making.

use serde::Deserialize;

/// Tuning shared by every enemy controller.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HuntingConfig {
    /// Number of ticks between two decision cycles of the same enemy.
    pub decision_interval: u32,
    /// Ticks a ranged enemy keeps firing at a remembered position.
    pub sustained_fire_ticks: u32,
    /// Dead zone, in world units, inside which a ghost stops correcting an axis.
    pub ghost_margin: f32,
    /// Tile distance at which an investigated position counts as reached.
    pub investigate_reach_tiles: u32,
    /// Seed from which every enemy's stagger offset is derived.
    pub seed: u64,
}

impl HuntingConfig {
    /// Decision interval, never zero.
    pub(crate) fn interval(&self) -> u32 {
        self.decision_interval.max(1)
    }
}

impl Default for HuntingConfig {
    fn default() -> Self {
        Self {
            decision_interval: 5,
            sustained_fire_ticks: 2_000,
            ghost_margin: 0.2,
            investigate_reach_tiles: 1,
            seed: 0,
        }
    }
}
