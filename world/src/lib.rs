#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Lantern.
//!
//! The world is a passive model. It owns the tile grid, the player, enemies
//! and flares, mutates them only through [`apply`], and exposes read-only
//! snapshots through [`query`]. Entities never reference the grid directly:
//! every footprint is lifted before an entity moves and placed again after.

pub mod grid;
pub mod layout;
pub mod search;

use glam::Vec2;
use lantern_core::{Action, Archetype, Command, EnemyId, Event, FlareId};
use thiserror::Error;

use crate::grid::{Footprint, GridError, TileGrid};
use crate::layout::{FlareTuning, LevelLayout, LightLimits};

/// Reasons a level layout cannot be turned into a world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The shared entity radius was zero, negative, or not finite.
    #[error("entity radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    /// The tile grid could not be built from the bounds and radius.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A wall had inverted or non-finite corners.
    #[error("wall {index} has inverted or non-finite corners")]
    InvalidWall {
        /// Position of the wall in the layout.
        index: usize,
    },
    /// The light limits were inverted or negative.
    #[error("light limits are inconsistent: min {min}, max {max}")]
    InvalidLightLimits {
        /// Requested minimum radius.
        min: f32,
        /// Requested maximum radius.
        max: f32,
    },
    /// An entity started outside the level.
    #[error("{entity} spawns at ({x}, {y}), outside the level bounds")]
    SpawnOutOfBounds {
        /// Which entity was misplaced.
        entity: String,
        /// Requested x coordinate.
        x: f32,
        /// Requested y coordinate.
        y: f32,
    },
    /// An entity's body overlapped a wall, the level edge, or another body.
    #[error("{entity} spawns at ({x}, {y}) on a blocked tile")]
    SpawnBlocked {
        /// Which entity was misplaced.
        entity: String,
        /// Requested x coordinate.
        x: f32,
        /// Requested y coordinate.
        y: f32,
    },
}

/// Represents the authoritative Lantern world state.
#[derive(Debug)]
pub struct World {
    bounds: Vec2,
    grid: TileGrid,
    light: LightLimits,
    flare_tuning: FlareTuning,
    player: Player,
    enemies: Vec<Enemy>,
    flares: Vec<Flare>,
    next_flare: u32,
    tick_index: u64,
}

impl World {
    /// Builds a world from a level layout, stamping walls and placing entities
    /// on the grid.
    pub fn new(layout: LevelLayout) -> Result<Self, LevelError> {
        let radius = layout.entity_radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(LevelError::InvalidRadius(radius));
        }
        let light = layout.light;
        if !(0.0..=light.max_radius).contains(&light.min_radius) {
            return Err(LevelError::InvalidLightLimits {
                min: light.min_radius,
                max: light.max_radius,
            });
        }

        let mut grid = TileGrid::for_entity_radius(layout.bounds, radius)?;
        for (index, wall) in layout.walls.iter().enumerate() {
            if !wall.is_well_formed() {
                return Err(LevelError::InvalidWall { index });
            }
            grid.stamp_wall(&Footprint::rect(wall.min, wall.max));
        }

        let spawn = layout.player;
        let player = Player {
            position: spawn.position,
            radius,
            light_radius: light.clamp(spawn.light_radius),
        };
        check_spawn(&grid, "player", player.position, Some(&player.footprint()))?;
        grid.place_footprint(&player.footprint());

        let mut enemies = Vec::with_capacity(layout.enemies.len());
        for (index, spawn) in layout.enemies.iter().enumerate() {
            let enemy = Enemy {
                id: EnemyId::new(index as u32),
                archetype: spawn.archetype,
                position: spawn.position,
                radius,
                speed: spawn.speed,
            };
            let body = enemy.is_tracked().then(|| enemy.footprint());
            check_spawn(&grid, &format!("enemy {index}"), enemy.position, body.as_ref())?;
            if let Some(body) = body {
                grid.place_footprint(&body);
            }
            enemies.push(enemy);
        }

        tracing::debug!(
            columns = grid.columns(),
            rows = grid.rows(),
            walls = layout.walls.len(),
            enemies = enemies.len(),
            "level populated"
        );

        Ok(Self {
            bounds: layout.bounds,
            grid,
            light,
            flare_tuning: layout.flares,
            player,
            enemies,
            flares: Vec::new(),
            next_flare: 0,
            tick_index: 0,
        })
    }

    fn enemy_index(&self, enemy: EnemyId) -> Option<usize> {
        self.enemies.binary_search_by_key(&enemy, |e| e.id).ok()
    }

    fn clamp_to_bounds(&self, point: Vec2, radius: f32) -> Vec2 {
        let low = Vec2::splat(radius).min(self.bounds * 0.5);
        let high = (self.bounds - Vec2::splat(radius)).max(low);
        point.clamp(low, high)
    }

    fn steer_enemy(&mut self, enemy: EnemyId, action: Action, out_events: &mut Vec<Event>) {
        let Some(index) = self.enemy_index(enemy) else {
            tracing::warn!(enemy = enemy.get(), "steer requested for unknown enemy");
            return;
        };
        let Some(direction) = action.direction() else {
            return;
        };

        let current = self.enemies[index];
        let step = direction.unit_vector() * current.speed;
        let from = current.position;
        let tracked = current.is_tracked();
        if tracked {
            self.grid.remove_footprint(&current.footprint());
        }

        let centre = self.grid.cell_to_world(self.grid.world_to_cell(from));
        let candidates = [
            from + step,
            from + Vec2::new(step.x, 0.0),
            from + Vec2::new(0.0, step.y),
            from + (centre - from).clamp_length_max(current.speed),
        ];
        let mut destination = from;
        for candidate in candidates {
            let candidate = self.clamp_to_bounds(candidate, current.radius);
            if candidate == from {
                continue;
            }
            if !tracked || self.grid.footprint_is_clear(&Footprint::wheel(candidate, current.radius)) {
                destination = candidate;
                break;
            }
        }

        let moved = &mut self.enemies[index];
        moved.position = destination;
        if tracked {
            self.grid.place_footprint(&moved.footprint());
        }

        if destination == from {
            out_events.push(Event::MoveBlocked { enemy });
        } else {
            out_events.push(Event::EnemyMoved {
                enemy,
                from,
                to: destination,
            });
        }
    }

    fn move_player(&mut self, to: Vec2, out_events: &mut Vec<Event>) {
        let from = self.player.position;
        self.grid.remove_footprint(&self.player.footprint());

        let destination = Footprint::wheel(to, self.player.radius);
        let accepted = to.is_finite() && self.grid.footprint_is_clear(&destination);
        if accepted {
            self.player.position = to;
        }
        self.grid.place_footprint(&self.player.footprint());

        if accepted {
            out_events.push(Event::PlayerMoved { from, to });
        } else {
            out_events.push(Event::PlayerMoveRejected { to });
        }
    }

    fn set_light_radius(&mut self, radius: f32, out_events: &mut Vec<Event>) {
        if radius.is_nan() {
            return;
        }
        self.player.light_radius = self.light.clamp(radius);
        out_events.push(Event::LightRadiusChanged {
            radius: self.player.light_radius,
        });
    }

    fn throw_flare(&mut self, velocity: Vec2, out_events: &mut Vec<Event>) {
        let id = FlareId::new(self.next_flare);
        self.next_flare = self.next_flare.saturating_add(1);
        let from = self.player.position;
        self.flares.push(Flare {
            id,
            position: from,
            velocity: if velocity.is_finite() { velocity } else { Vec2::ZERO },
            remaining: self.flare_tuning.burn_ticks,
            stuck: false,
            burned_out: false,
        });
        out_events.push(Event::FlareThrown { flare: id, from });
    }

    fn advance_flares(&mut self, out_events: &mut Vec<Event>) {
        self.flares.retain(|flare| !flare.burned_out);
        let tuning = self.flare_tuning;

        for flare in &mut self.flares {
            if !flare.stuck {
                let next = flare.position + flare.velocity;
                let cell = self.grid.world_to_cell(next);
                if !self.grid.is_in_bounds(cell) || self.grid.is_wall(cell) {
                    flare.come_to_rest();
                } else {
                    flare.position = next;
                    flare.velocity *= tuning.friction;
                    if flare.velocity.length() < tuning.stop_speed {
                        flare.come_to_rest();
                    }
                }
                if flare.stuck {
                    out_events.push(Event::FlareStuck {
                        flare: flare.id,
                        at: flare.position,
                    });
                }
            }

            flare.remaining = flare.remaining.saturating_sub(1);
            if flare.remaining == 0 {
                flare.burned_out = true;
                out_events.push(Event::FlareBurnedOut { flare: flare.id });
            }
        }
    }
}

/// Rejects a spawn whose tile lies off the grid, or whose body cannot be placed.
fn check_spawn(
    grid: &TileGrid,
    entity: &str,
    position: Vec2,
    body: Option<&Footprint>,
) -> Result<(), LevelError> {
    if !position.is_finite() || !grid.is_in_bounds(grid.world_to_cell(position)) {
        return Err(LevelError::SpawnOutOfBounds {
            entity: entity.to_owned(),
            x: position.x,
            y: position.y,
        });
    }
    if body.is_some_and(|body| !grid.footprint_is_clear(body)) {
        return Err(LevelError::SpawnBlocked {
            entity: entity.to_owned(),
            x: position.x,
            y: position.y,
        });
    }
    Ok(())
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            world.advance_flares(out_events);
        }
        Command::SteerEnemy { enemy, action } => world.steer_enemy(enemy, action, out_events),
        Command::MovePlayer { to } => world.move_player(to, out_events),
        Command::SetLightRadius { radius } => world.set_light_radius(radius, out_events),
        Command::ThrowFlare { velocity } => world.throw_flare(velocity, out_events),
        Command::FireAt { enemy, target } => {
            if world.enemy_index(enemy).is_some() {
                out_events.push(Event::ShotFired { enemy, target });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use lantern_core::{EnemySnapshot, FlareSnapshot, PlayerSnapshot, SensorView};

    use super::World;
    use crate::grid::TileGrid;

    /// Captures everything enemy controllers may sense this tick.
    #[must_use]
    pub fn sensor_view(world: &World) -> SensorView {
        SensorView::new(player(world), enemies(world), flares(world))
    }

    /// Snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            position: world.player.position,
            radius: world.player.radius,
            light_radius: world.player.light_radius,
        }
    }

    /// Snapshots of every enemy in id order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                archetype: enemy.archetype,
                position: enemy.position,
                radius: enemy.radius,
            })
            .collect()
    }

    /// Snapshots of every live or just-extinguished flare in id order.
    #[must_use]
    pub fn flares(world: &World) -> Vec<FlareSnapshot> {
        world
            .flares
            .iter()
            .map(|flare| FlareSnapshot {
                id: flare.id,
                position: flare.position,
                light_radius: world.flare_tuning.light_radius,
                stuck: flare.stuck,
                burned_out: flare.burned_out,
            })
            .collect()
    }

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Provides the tile grid to a planner that marks goals and runs searches.
    ///
    /// Planners must leave occupancy as they found it; only the transient
    /// goal and visited marks may change across the call.
    #[must_use]
    pub fn tile_grid_mut(world: &mut World) -> &mut TileGrid {
        &mut world.grid
    }

    /// Size of the level in world units.
    #[must_use]
    pub fn bounds(world: &World) -> Vec2 {
        world.bounds
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    position: Vec2,
    radius: f32,
    light_radius: f32,
}

impl Player {
    fn footprint(&self) -> Footprint {
        Footprint::wheel(self.position, self.radius)
    }
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    id: EnemyId,
    archetype: Archetype,
    position: Vec2,
    radius: f32,
    speed: f32,
}

impl Enemy {
    fn footprint(&self) -> Footprint {
        Footprint::wheel(self.position, self.radius)
    }

    /// Ghosts drift through walls and bodies, so they never occupy tiles.
    fn is_tracked(&self) -> bool {
        self.archetype != Archetype::Ghost
    }
}

#[derive(Clone, Copy, Debug)]
struct Flare {
    id: FlareId,
    position: Vec2,
    velocity: Vec2,
    remaining: u32,
    stuck: bool,
    burned_out: bool,
}

impl Flare {
    fn come_to_rest(&mut self) {
        self.velocity = Vec2::ZERO;
        self.stuck = true;
    }
}
