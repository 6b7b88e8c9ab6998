#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lantern engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! [`SensorView`] snapshots, and respond exclusively with new command batches.

use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by a single fixed timestep.
    Tick,
    /// Requests that an enemy take one step along the movement encoded in the action.
    SteerEnemy {
        /// Identifier of the enemy attempting to move.
        enemy: EnemyId,
        /// Movement bits describing the step. Non-movement bits are ignored.
        action: Action,
    },
    /// Requests that the player relocate to the provided world position.
    MovePlayer {
        /// Destination expressed in world units.
        to: Vec2,
    },
    /// Requests that the player's light radius change.
    SetLightRadius {
        /// Desired radius in world units; the world clamps it to its limits.
        radius: f32,
    },
    /// Requests that the player throw a flare from their current position.
    ThrowFlare {
        /// Initial velocity of the flare in world units per tick.
        velocity: Vec2,
    },
    /// Requests that an enemy fire at the provided world position.
    FireAt {
        /// Identifier of the enemy that fires.
        enemy: EnemyId,
        /// Point the shot is aimed at.
        target: Vec2,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just started.
        tick: u64,
    },
    /// Confirms that an enemy moved between two positions.
    EnemyMoved {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Position before the step.
        from: Vec2,
        /// Position after the step.
        to: Vec2,
    },
    /// Reports that an enemy could not take the requested step.
    MoveBlocked {
        /// Identifier of the enemy that stayed in place.
        enemy: EnemyId,
    },
    /// Confirms that the player relocated.
    PlayerMoved {
        /// Position before the move.
        from: Vec2,
        /// Position after the move.
        to: Vec2,
    },
    /// Reports that a player relocation was rejected because the destination was blocked.
    PlayerMoveRejected {
        /// Destination that was requested.
        to: Vec2,
    },
    /// Announces the player's light radius after a change request.
    LightRadiusChanged {
        /// Radius now in effect.
        radius: f32,
    },
    /// Confirms that a flare was thrown.
    FlareThrown {
        /// Identifier assigned to the flare.
        flare: FlareId,
        /// Position the flare was thrown from.
        from: Vec2,
    },
    /// Reports that a flare stopped moving.
    FlareStuck {
        /// Identifier of the flare.
        flare: FlareId,
        /// Resting position of the flare.
        at: Vec2,
    },
    /// Reports that a flare burned out.
    FlareBurnedOut {
        /// Identifier of the flare.
        flare: FlareId,
    },
    /// Confirms that an enemy fired a shot.
    ShotFired {
        /// Identifier of the enemy that fired.
        enemy: EnemyId,
        /// Point the shot was aimed at.
        target: Vec2,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a flare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlareId(u32);

impl FlareId {
    /// Creates a new flare identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row indices.
///
/// Indices are signed so that neighbour probes past the grid edge remain
/// representable; the grid itself decides whether a coordinate is in bounds.
/// Rows grow upwards, matching world space where `+y` is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the neighbouring coordinate one step away in the given direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (column, row) = direction.offset();
        Self {
            column: self.column.saturating_add(column),
            row: self.row.saturating_add(row),
        }
    }

    /// Number of 8-connected steps separating two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }
}

/// Eight-way movement directions available to enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Up,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward decreasing row indices.
    Down,
    /// Diagonal movement combining [`Direction::Down`] and [`Direction::Left`].
    DownLeft,
    /// Diagonal movement combining [`Direction::Down`] and [`Direction::Right`].
    DownRight,
    /// Diagonal movement combining [`Direction::Up`] and [`Direction::Left`].
    UpLeft,
    /// Diagonal movement combining [`Direction::Up`] and [`Direction::Right`].
    UpRight,
}

impl Direction {
    /// Every direction in canonical enumeration order.
    ///
    /// Searches expand neighbours in this order, so it decides which of
    /// several equally short paths is taken.
    pub const ALL: [Direction; 8] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::DownLeft,
        Direction::DownRight,
        Direction::UpLeft,
        Direction::UpRight,
    ];

    /// Column and row delta produced by one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Up => (0, 1),
            Self::Left => (-1, 0),
            Self::Down => (0, -1),
            Self::DownLeft => (-1, -1),
            Self::DownRight => (1, -1),
            Self::UpLeft => (-1, 1),
            Self::UpRight => (1, 1),
        }
    }

    /// Resolves a direction from per-axis signs, returning `None` for a zero delta.
    #[must_use]
    pub fn from_offset(column: i32, row: i32) -> Option<Self> {
        match (column.signum(), row.signum()) {
            (1, 0) => Some(Self::Right),
            (0, 1) => Some(Self::Up),
            (-1, 0) => Some(Self::Left),
            (0, -1) => Some(Self::Down),
            (-1, -1) => Some(Self::DownLeft),
            (1, -1) => Some(Self::DownRight),
            (-1, 1) => Some(Self::UpLeft),
            (1, 1) => Some(Self::UpRight),
            _ => None,
        }
    }

    /// Unit-length world-space vector pointing in this direction.
    #[must_use]
    pub fn unit_vector(self) -> Vec2 {
        let (column, row) = self.offset();
        Vec2::new(column as f32, row as f32).normalize()
    }
}

/// Bitmask returned by enemy controllers once per tick.
///
/// Movement bits combine into diagonals (`UP | RIGHT` is up-right) and may be
/// joined with [`Action::FIRE`]. The empty mask means "no action".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Action(u8);

impl Action {
    /// No movement and no firing.
    pub const NONE: Action = Action(0);
    /// Move toward `+y`.
    pub const UP: Action = Action(1 << 0);
    /// Move toward `-y`.
    pub const DOWN: Action = Action(1 << 1);
    /// Move toward `-x`.
    pub const LEFT: Action = Action(1 << 2);
    /// Move toward `+x`.
    pub const RIGHT: Action = Action(1 << 3);
    /// Fire at the controller's current target.
    pub const FIRE: Action = Action(1 << 4);

    const MOVEMENT_MASK: u8 = 0b1111;

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Reports whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Action) -> bool {
        self.0 & other.0 == other.0
    }

    /// Reports whether the mask is empty.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Reports whether the fire bit is set.
    #[must_use]
    pub const fn fires(self) -> bool {
        self.contains(Self::FIRE)
    }

    /// Strips every non-movement bit.
    #[must_use]
    pub const fn movement(self) -> Action {
        Action(self.0 & Self::MOVEMENT_MASK)
    }

    /// Encodes a single step in the given direction.
    #[must_use]
    pub const fn step(direction: Direction) -> Action {
        match direction {
            Direction::Right => Self::RIGHT,
            Direction::Up => Self::UP,
            Direction::Left => Self::LEFT,
            Direction::Down => Self::DOWN,
            Direction::DownLeft => Action(Self::DOWN.0 | Self::LEFT.0),
            Direction::DownRight => Action(Self::DOWN.0 | Self::RIGHT.0),
            Direction::UpLeft => Action(Self::UP.0 | Self::LEFT.0),
            Direction::UpRight => Action(Self::UP.0 | Self::RIGHT.0),
        }
    }

    /// Decodes the movement bits into a direction.
    ///
    /// Opposing bits on the same axis cancel out, so `UP | DOWN` carries no
    /// vertical component.
    #[must_use]
    pub fn direction(self) -> Option<Direction> {
        let column = axis(self.contains(Self::RIGHT), self.contains(Self::LEFT));
        let row = axis(self.contains(Self::UP), self.contains(Self::DOWN));
        Direction::from_offset(column, row)
    }
}

fn axis(positive: bool, negative: bool) -> i32 {
    i32::from(positive) - i32::from(negative)
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        Action::step(direction)
    }
}

impl BitOr for Action {
    type Output = Action;

    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

impl BitOrAssign for Action {
    fn bitor_assign(&mut self, rhs: Action) {
        self.0 |= rhs.0;
    }
}

/// Enemy behaviour profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Drifts straight at the player, ignoring walls.
    Ghost,
    /// Chases the player inside their light and investigates what it last saw.
    Investigator,
    /// Stationary shooter that keeps firing at the last known position.
    Ranged,
}

/// Externally observable state of an enemy controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FsmState {
    /// The single implicit state of the ghost archetype.
    Haunting,
    /// No target in sight.
    Idle,
    /// Pathing toward the lit player.
    Chase,
    /// Pathing toward a remembered position.
    Investigate,
    /// Firing at the lit player.
    DirectFire,
    /// Firing at the player's last known position.
    SustainedFire,
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Centre of the player in world units.
    pub position: Vec2,
    /// Collision radius in world units.
    pub radius: f32,
    /// Radius of the player's light in world units.
    pub light_radius: f32,
}

impl PlayerSnapshot {
    /// Reports whether the point lies within the player's light.
    #[must_use]
    pub fn illuminates(&self, point: Vec2) -> bool {
        self.position.distance(point) <= self.light_radius
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Behaviour profile of the enemy.
    pub archetype: Archetype,
    /// Centre of the enemy in world units.
    pub position: Vec2,
    /// Collision radius in world units.
    pub radius: f32,
}

/// Immutable representation of a single flare's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlareSnapshot {
    /// Unique identifier assigned to the flare.
    pub id: FlareId,
    /// Centre of the flare in world units.
    pub position: Vec2,
    /// Radius of the flare's light in world units.
    pub light_radius: f32,
    /// Whether the flare has stopped moving.
    pub stuck: bool,
    /// Whether the flare has burned out.
    pub burned_out: bool,
}

impl FlareSnapshot {
    /// Reports whether the point lies within the flare's light.
    #[must_use]
    pub fn illuminates(&self, point: Vec2) -> bool {
        !self.burned_out && self.position.distance(point) <= self.light_radius
    }
}

/// Read-only snapshot of everything an enemy controller may sense.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorView {
    player: PlayerSnapshot,
    enemies: Vec<EnemySnapshot>,
    flares: Vec<FlareSnapshot>,
}

impl SensorView {
    /// Creates a new view, sorting enemies and flares into deterministic id order.
    #[must_use]
    pub fn new(
        player: PlayerSnapshot,
        mut enemies: Vec<EnemySnapshot>,
        mut flares: Vec<FlareSnapshot>,
    ) -> Self {
        enemies.sort_by_key(|enemy| enemy.id);
        flares.sort_by_key(|flare| flare.id);
        Self {
            player,
            enemies,
            flares,
        }
    }

    /// Snapshot of the player.
    #[must_use]
    pub const fn player(&self) -> &PlayerSnapshot {
        &self.player
    }

    /// Enemies in ascending id order.
    #[must_use]
    pub fn enemies(&self) -> &[EnemySnapshot] {
        &self.enemies
    }

    /// Flares in ascending id order.
    #[must_use]
    pub fn flares(&self) -> &[FlareSnapshot] {
        &self.flares
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &self.enemies[index])
    }

    /// Looks up a single flare.
    #[must_use]
    pub fn flare(&self, id: FlareId) -> Option<&FlareSnapshot> {
        self.flares
            .binary_search_by_key(&id, |flare| flare.id)
            .ok()
            .map(|index| &self.flares[index])
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Archetype, CellCoord, Direction, EnemyId, EnemySnapshot, PlayerSnapshot, SensorView};
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn chebyshev_distance_counts_diagonal_steps_once() {
        let origin = CellCoord::new(1, 1);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(4, 3)), 3);
        assert_eq!(CellCoord::new(-2, 5).chebyshev_distance(origin), 4);
    }

    #[test]
    fn every_direction_survives_action_encoding() {
        for direction in Direction::ALL {
            let action = Action::from(direction);
            assert_eq!(action.direction(), Some(direction));
            assert_eq!((action | Action::FIRE).direction(), Some(direction));
        }
    }

    #[test]
    fn opposing_bits_cancel() {
        assert_eq!((Action::UP | Action::DOWN).direction(), None);
        assert_eq!(
            (Action::UP | Action::DOWN | Action::LEFT).direction(),
            Some(Direction::Left)
        );
        assert_eq!(Action::NONE.direction(), None);
    }

    #[test]
    fn movement_strips_fire_bit() {
        let action = Action::UP | Action::RIGHT | Action::FIRE;
        assert!(action.fires());
        assert!(!action.movement().fires());
        assert_eq!(action.movement(), Action::from(Direction::UpRight));
        assert!(Action::FIRE.movement().is_none());
    }

    #[test]
    fn step_follows_direction_offsets() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(origin.step(Direction::UpRight), CellCoord::new(4, 4));
        assert_eq!(origin.step(Direction::DownLeft), CellCoord::new(2, 2));
        assert_eq!(origin.step(Direction::Down), CellCoord::new(3, 2));
    }

    #[test]
    fn diagonal_unit_vectors_are_normalised() {
        let vector = Direction::UpLeft.unit_vector();
        assert!((vector.length() - 1.0).abs() < 1e-6);
        assert!(vector.x < 0.0 && vector.y > 0.0);
    }

    #[test]
    fn sensor_view_sorts_and_finds_enemies() {
        let player = PlayerSnapshot {
            position: Vec2::ZERO,
            radius: 0.5,
            light_radius: 3.0,
        };
        let enemy = |id: u32| EnemySnapshot {
            id: EnemyId::new(id),
            archetype: Archetype::Investigator,
            position: Vec2::splat(id as f32),
            radius: 0.5,
        };
        let view = SensorView::new(player, vec![enemy(7), enemy(2), enemy(4)], Vec::new());

        let ids: Vec<u32> = view.enemies().iter().map(|enemy| enemy.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 7]);
        assert_eq!(view.enemy(EnemyId::new(4)).map(|e| e.position), Some(Vec2::splat(4.0)));
        assert!(view.enemy(EnemyId::new(5)).is_none());
    }

    #[test]
    fn player_light_contains_boundary() {
        let player = PlayerSnapshot {
            position: Vec2::ZERO,
            radius: 0.5,
            light_radius: 5.0,
        };
        assert!(player.illuminates(Vec2::new(3.0, 4.0)));
        assert!(!player.illuminates(Vec2::new(3.0, 4.1)));
    }

    #[test]
    fn archetype_round_trips_through_bincode() {
        assert_round_trip(&Archetype::Ranged);
    }
}
