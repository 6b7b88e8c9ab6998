#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hunting system that drives every enemy's state machine and proposes
//! movement and firing commands.
//!
//! Enemies decide one after another in id order. Each decision cycle clears
//! the grid's goal and visited marks, re-evaluates the enemy's state, marks
//! goals and runs the search router to completion before the next enemy
//! starts, so marks never leak between enemies.

mod behavior;
mod config;
mod fsm;

pub use config::HuntingConfig;
pub use fsm::EnemyFsm;

use lantern_core::{Action, Archetype, Command, EnemyId, Event, FsmState, SensorView};
use lantern_world::grid::TileGrid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Mixes enemy ids into the configured seed.
const SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Pure system that reacts to world events and emits enemy commands.
#[derive(Debug)]
pub struct Hunting {
    config: HuntingConfig,
    controllers: Vec<EnemyFsm>,
}

impl Hunting {
    /// Creates a hunting system with no controllers yet.
    #[must_use]
    pub fn new(config: HuntingConfig) -> Self {
        Self {
            config,
            controllers: Vec::new(),
        }
    }

    /// Tuning shared by every controller.
    #[must_use]
    pub fn config(&self) -> &HuntingConfig {
        &self.config
    }

    /// Consumes world events and the current snapshot to emit enemy commands.
    ///
    /// Nothing happens unless time advanced. Controllers are created for
    /// enemies that appeared and dropped for enemies that vanished, then every
    /// enemy is polled once in id order.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: &SensorView,
        grid: &mut TileGrid,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.sync_roster(view);

        for controller in &mut self.controllers {
            let enemy = controller.enemy();
            let action = controller.action(view, grid);

            let movement = action.movement();
            if !movement.is_none() {
                out.push(Command::SteerEnemy {
                    enemy,
                    action: movement,
                });
            }
            if action.fires() {
                if let Some(target) = controller.fire_target() {
                    out.push(Command::FireAt { enemy, target });
                }
            }
        }
    }

    /// Polls a single enemy's controller, creating it on first use.
    pub fn action(&mut self, enemy: EnemyId, view: &SensorView, grid: &mut TileGrid) -> Action {
        let index = match self.position(enemy) {
            Ok(index) => index,
            Err(insert_at) => {
                let Some(snapshot) = view.enemy(enemy) else {
                    tracing::warn!(enemy = enemy.get(), "action requested for unknown enemy");
                    return Action::NONE;
                };
                let controller = self.spawn_controller(enemy, snapshot.archetype);
                self.controllers.insert(insert_at, controller);
                insert_at
            }
        };
        self.controllers[index].action(view, grid)
    }

    /// Externally visible state of an enemy's controller.
    #[must_use]
    pub fn state_of(&self, enemy: EnemyId) -> Option<FsmState> {
        self.controller(enemy).map(EnemyFsm::state)
    }

    /// Controller driving the given enemy, if one exists.
    #[must_use]
    pub fn controller(&self, enemy: EnemyId) -> Option<&EnemyFsm> {
        self.position(enemy)
            .ok()
            .map(|index| &self.controllers[index])
    }

    /// Number of enemies currently driven.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Reports whether no enemy is driven.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Drops every controller, e.g. when a level is reloaded.
    pub fn reset(&mut self) {
        self.controllers.clear();
    }

    fn position(&self, enemy: EnemyId) -> Result<usize, usize> {
        self.controllers
            .binary_search_by_key(&enemy, EnemyFsm::enemy)
    }

    fn sync_roster(&mut self, view: &SensorView) {
        let before = self.controllers.len();
        self.controllers
            .retain(|controller| view.enemy(controller.enemy()).is_some());
        if self.controllers.len() != before {
            tracing::debug!(
                dropped = before - self.controllers.len(),
                "dropped controllers of vanished enemies"
            );
        }

        for snapshot in view.enemies() {
            if let Err(insert_at) = self.position(snapshot.id) {
                let controller = self.spawn_controller(snapshot.id, snapshot.archetype);
                self.controllers.insert(insert_at, controller);
            }
        }
    }

    fn spawn_controller(&self, enemy: EnemyId, archetype: Archetype) -> EnemyFsm {
        let seed = self.config.seed ^ u64::from(enemy.get()).wrapping_mul(SEED_MIX);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let controller = EnemyFsm::new(enemy, archetype, self.config, &mut rng);
        tracing::debug!(
            enemy = enemy.get(),
            archetype = ?archetype,
            stagger = controller.stagger(),
            "enemy controller created"
        );
        controller
    }
}

impl Default for Hunting {
    fn default() -> Self {
        Self::new(HuntingConfig::default())
    }
}
