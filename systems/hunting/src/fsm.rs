//! Per-enemy decision controller.

use glam::Vec2;
use lantern_core::{Action, Archetype, EnemyId, EnemySnapshot, FsmState, SensorView};
use lantern_world::{
    grid::{Footprint, TileGrid},
    search,
};
use rand::Rng;

use crate::behavior::{ghost_direction, Behavior};
use crate::config::HuntingConfig;

/// Decision controller driving a single enemy.
///
/// The controller is polled once per tick. Every `decision_interval` ticks,
/// shifted by a per-enemy stagger offset, it re-evaluates its state, marks
/// goal tiles and asks the search router for the next step. In between it
/// keeps returning the cached movement.
#[derive(Clone, Debug)]
pub struct EnemyFsm {
    enemy: EnemyId,
    behavior: Behavior,
    ticks: u64,
    stagger: u32,
    movement: Action,
    config: HuntingConfig,
}

impl EnemyFsm {
    /// Creates a controller whose stagger offset is drawn from `rng`.
    pub fn new<R>(enemy: EnemyId, archetype: Archetype, config: HuntingConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let stagger = rng.gen_range(0..config.interval());
        Self::with_stagger(enemy, archetype, config, stagger)
    }

    /// Creates a controller with an explicit stagger offset.
    #[must_use]
    pub fn with_stagger(
        enemy: EnemyId,
        archetype: Archetype,
        config: HuntingConfig,
        stagger: u32,
    ) -> Self {
        Self {
            enemy,
            behavior: Behavior::new(archetype),
            ticks: 0,
            stagger: stagger % config.interval(),
            movement: Action::NONE,
            config,
        }
    }

    /// Enemy this controller drives.
    #[must_use]
    pub fn enemy(&self) -> EnemyId {
        self.enemy
    }

    /// Behaviour profile of the controlled enemy.
    #[must_use]
    pub fn archetype(&self) -> Archetype {
        self.behavior.archetype()
    }

    /// Current externally visible state.
    #[must_use]
    pub fn state(&self) -> FsmState {
        self.behavior.state()
    }

    /// Offset that shifts this controller's decision cycles.
    #[must_use]
    pub fn stagger(&self) -> u32 {
        self.stagger
    }

    /// Number of times the controller has been polled.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Movement cached by the latest decision cycle.
    #[must_use]
    pub fn movement(&self) -> Action {
        self.movement
    }

    /// Position being investigated or fired upon after contact was lost.
    #[must_use]
    pub fn remembered_position(&self) -> Option<Vec2> {
        self.behavior.remembered()
    }

    /// Point a ranged enemy is currently firing at.
    #[must_use]
    pub fn fire_target(&self) -> Option<Vec2> {
        self.behavior.fire_target()
    }

    /// Advances the controller by one tick and returns the enemy's action.
    ///
    /// Only decision ticks touch the grid. During a decision the enemy's own
    /// footprint is lifted so it does not block its own search, and goal and
    /// visited marks are cleared before new goals are marked. The footprint is
    /// restored before returning.
    ///
    /// A decision that marks no goal keeps the previous movement, except on
    /// entering `Idle`, which drops it so an idle enemy stands still.
    pub fn action(&mut self, view: &SensorView, grid: &mut TileGrid) -> Action {
        self.ticks = self.ticks.wrapping_add(1);

        let Some(me) = view.enemy(self.enemy).copied() else {
            tracing::warn!(enemy = self.enemy.get(), "enemy missing from sensor view");
            return Action::NONE;
        };

        self.behavior.observe(view, me.position);
        if self.is_decision_tick() {
            self.decide(view, &me, grid);
        }

        let mut action = self.movement;
        if self.behavior.fire_target().is_some() {
            action |= Action::FIRE;
        }
        action
    }

    fn is_decision_tick(&self) -> bool {
        let interval = u64::from(self.config.interval());
        (u64::from(self.stagger) + self.ticks) % interval == 0
    }

    fn decide(&mut self, view: &SensorView, me: &EnemySnapshot, grid: &mut TileGrid) {
        if self.behavior == Behavior::Ghost {
            self.movement = ghost_direction(
                me.position,
                view.player().position,
                self.config.ghost_margin,
            );
            return;
        }

        let footprint = Footprint::wheel(me.position, me.radius);
        grid.remove_footprint(&footprint);
        grid.clear_marks();

        let before = self.behavior.state();
        self.behavior
            .change_state(view, me.position, grid, &self.config);
        let after = self.behavior.state();
        if before != after {
            tracing::debug!(
                enemy = self.enemy.get(),
                from = ?before,
                to = ?after,
                tick = self.ticks,
                "enemy changed state"
            );
            if after == FsmState::Idle {
                self.movement = Action::NONE;
            }
        }

        if self.behavior.mark_goals(view.player(), grid) {
            let start = grid.world_to_cell(me.position);
            self.movement = search::next_step(grid, start).movement();
        }

        grid.place_footprint(&footprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::{CellCoord, PlayerSnapshot};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn view(enemy: Vec2, archetype: Archetype, player: Vec2, light_radius: f32) -> SensorView {
        SensorView::new(
            PlayerSnapshot {
                position: player,
                radius: 0.5,
                light_radius,
            },
            vec![EnemySnapshot {
                id: EnemyId::new(0),
                archetype,
                position: enemy,
                radius: 0.5,
            }],
            Vec::new(),
        )
    }

    fn placed_grid(positions: &[Vec2]) -> TileGrid {
        let mut grid = TileGrid::new(Vec2::new(10.0, 10.0), 1.0).expect("valid grid");
        for position in positions {
            grid.place_footprint(&Footprint::wheel(*position, 0.5));
        }
        grid
    }

    fn every_tick() -> HuntingConfig {
        HuntingConfig {
            decision_interval: 1,
            ..HuntingConfig::default()
        }
    }

    #[test]
    fn stagger_is_drawn_within_the_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for index in 0..32 {
            let fsm = EnemyFsm::new(
                EnemyId::new(index),
                Archetype::Investigator,
                HuntingConfig::default(),
                &mut rng,
            );
            assert!(fsm.stagger() < 5);
        }
    }

    #[test]
    fn decisions_only_happen_on_staggered_ticks() {
        let enemy = Vec2::new(2.5, 2.5);
        let player = Vec2::new(6.5, 2.5);
        let sensed = view(enemy, Archetype::Investigator, player, 6.0);
        let mut grid = placed_grid(&[enemy, player]);
        let mut fsm = EnemyFsm::with_stagger(
            EnemyId::new(0),
            Archetype::Investigator,
            HuntingConfig::default(),
            2,
        );

        assert_eq!(fsm.action(&sensed, &mut grid), Action::NONE);
        assert_eq!(fsm.action(&sensed, &mut grid), Action::NONE);
        assert_eq!(fsm.state(), FsmState::Idle);
        assert_eq!(fsm.action(&sensed, &mut grid), Action::RIGHT);
        assert_eq!(fsm.state(), FsmState::Chase);
    }

    #[test]
    fn own_footprint_does_not_block_the_search() {
        // Straddling a tile edge, the enemy covers tiles 2 and 3 of its row.
        let enemy = Vec2::new(3.0, 2.5);
        let player = Vec2::new(0.5, 2.5);
        let mut grid = placed_grid(&[enemy, player]);
        assert!(grid.is_occupied(CellCoord::new(2, 2)));

        let mut fsm =
            EnemyFsm::with_stagger(EnemyId::new(0), Archetype::Investigator, every_tick(), 0);
        let action = fsm.action(&view(enemy, Archetype::Investigator, player, 4.0), &mut grid);

        assert_eq!(action, Action::LEFT);
        assert!(grid.is_occupied(CellCoord::new(2, 2)));
        assert!(grid.is_occupied(CellCoord::new(3, 2)));
        assert!(grid.is_occupied(CellCoord::new(0, 2)));
    }

    #[test]
    fn missing_enemy_yields_no_action() {
        let mut grid = placed_grid(&[]);
        let mut fsm =
            EnemyFsm::with_stagger(EnemyId::new(4), Archetype::Investigator, every_tick(), 0);
        let sensed = view(Vec2::new(1.5, 1.5), Archetype::Investigator, Vec2::new(2.5, 1.5), 5.0);

        assert_eq!(fsm.action(&sensed, &mut grid), Action::NONE);
        assert_eq!(fsm.ticks(), 1);
    }

    #[test]
    fn entering_idle_drops_the_cached_movement() {
        let enemy = Vec2::new(2.5, 2.5);
        let mut grid = placed_grid(&[enemy]);
        let mut fsm =
            EnemyFsm::with_stagger(EnemyId::new(0), Archetype::Investigator, every_tick(), 0);

        let lit = view(enemy, Archetype::Investigator, Vec2::new(3.5, 2.5), 3.0);
        assert_eq!(fsm.action(&lit, &mut grid), Action::RIGHT);

        // The light shrinks while the player stands on the adjacent tile.
        let dark = view(enemy, Archetype::Investigator, Vec2::new(3.5, 2.5), 0.5);
        assert_eq!(fsm.action(&dark, &mut grid), Action::RIGHT);
        assert_eq!(fsm.state(), FsmState::Investigate);
        assert_eq!(fsm.remembered_position(), Some(Vec2::new(3.5, 2.5)));

        assert_eq!(fsm.action(&dark, &mut grid), Action::NONE);
        assert_eq!(fsm.state(), FsmState::Idle);
        assert_eq!(fsm.movement(), Action::NONE);
        assert_eq!(fsm.remembered_position(), None);
    }

    #[test]
    fn ranged_enemies_fire_without_moving() {
        let enemy = Vec2::new(1.5, 1.5);
        let mut grid = placed_grid(&[enemy]);
        let mut fsm = EnemyFsm::with_stagger(EnemyId::new(0), Archetype::Ranged, every_tick(), 0);

        let action = fsm.action(&view(enemy, Archetype::Ranged, Vec2::new(4.5, 1.5), 5.0), &mut grid);

        assert_eq!(action, Action::FIRE);
        assert_eq!(fsm.state(), FsmState::DirectFire);
        assert_eq!(fsm.fire_target(), Some(Vec2::new(4.5, 1.5)));
        assert!(!grid.has_goal());
    }

    #[test]
    fn ghosts_never_touch_the_grid() {
        let mut grid = placed_grid(&[]);
        let mut fsm = EnemyFsm::with_stagger(EnemyId::new(0), Archetype::Ghost, every_tick(), 0);

        let action = fsm.action(
            &view(Vec2::ZERO, Archetype::Ghost, Vec2::new(10.0, 10.0), 1.0),
            &mut grid,
        );

        assert_eq!(action, Action::UP | Action::RIGHT);
        assert_eq!(fsm.state(), FsmState::Haunting);
        assert!(!grid.is_visited(CellCoord::new(0, 0)));
    }
}
