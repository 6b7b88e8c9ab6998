//! Tile occupancy grid shared by the world and the hunting system.

use glam::Vec2;
use lantern_core::CellCoord;
use thiserror::Error;

/// Upper bound on the number of tiles a single grid may hold.
const MAX_TILES: u64 = 1 << 24;

/// Reasons a tile grid cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The tile size was zero, negative, or not a finite number.
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
    /// The world bounds were negative or not finite.
    #[error("world bounds must be finite and non-negative, got ({width}, {height})")]
    InvalidBounds {
        /// Requested world width.
        width: f32,
        /// Requested world height.
        height: f32,
    },
    /// The bounds divided by the tile size produced too many tiles.
    #[error("a grid of {columns}x{rows} tiles exceeds the supported size")]
    TooLarge {
        /// Number of columns the bounds would require.
        columns: u64,
        /// Number of rows the bounds would require.
        rows: u64,
    },
}

/// Region of world space whose tiles an entity or obstacle covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Footprint {
    /// Circular body approximated by the square spanning its radius.
    Wheel {
        /// Centre of the body.
        center: Vec2,
        /// Radius of the body.
        radius: f32,
    },
    /// Axis-aligned box.
    Rect {
        /// Lower-left corner.
        min: Vec2,
        /// Upper-right corner.
        max: Vec2,
    },
}

impl Footprint {
    /// Footprint of a circular body.
    #[must_use]
    pub const fn wheel(center: Vec2, radius: f32) -> Self {
        Self::Wheel { center, radius }
    }

    /// Footprint of an axis-aligned box.
    #[must_use]
    pub const fn rect(min: Vec2, max: Vec2) -> Self {
        Self::Rect { min, max }
    }

    fn extent(&self) -> (Vec2, Vec2) {
        match *self {
            Self::Wheel { center, radius } => (center - Vec2::splat(radius), center + Vec2::splat(radius)),
            Self::Rect { min, max } => (min, max),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TileState {
    wall: bool,
    occupants: u16,
    goal: bool,
    visited: bool,
}

impl TileState {
    fn occupied(&self) -> bool {
        self.wall || self.occupants > 0
    }
}

/// Dense grid of square tiles laid over the level.
///
/// Each tile tracks whether it is occupied plus two transient marks used by
/// searches: `goal` and `visited`. Occupancy is the union of a static wall
/// flag and a count of the dynamic footprints standing on the tile, so that
/// overlapping entities can be placed and removed independently.
///
/// Accessors never fail on coordinates outside the grid: setters ignore them
/// and predicates report the tile as unusable.
#[derive(Clone, Debug)]
pub struct TileGrid {
    tile_size: f32,
    columns: u32,
    rows: u32,
    tiles: Vec<TileState>,
    goal_count: usize,
}

impl TileGrid {
    /// Creates an empty grid covering `bounds` (measured from the origin) with
    /// square tiles of `tile_size` world units.
    pub fn new(bounds: Vec2, tile_size: f32) -> Result<Self, GridError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        if !bounds.is_finite() || bounds.x < 0.0 || bounds.y < 0.0 {
            return Err(GridError::InvalidBounds {
                width: bounds.x,
                height: bounds.y,
            });
        }

        let columns = (f64::from(bounds.x) / f64::from(tile_size)).ceil() as u64;
        let rows = (f64::from(bounds.y) / f64::from(tile_size)).ceil() as u64;
        if columns.saturating_mul(rows) > MAX_TILES || columns > MAX_TILES || rows > MAX_TILES {
            return Err(GridError::TooLarge { columns, rows });
        }

        let capacity = usize::try_from(columns * rows).unwrap_or(0);
        Ok(Self {
            tile_size,
            columns: columns as u32,
            rows: rows as u32,
            tiles: vec![TileState::default(); capacity],
            goal_count: 0,
        })
    }

    /// Creates a grid whose tiles are as wide as an entity of the given radius.
    pub fn for_entity_radius(bounds: Vec2, radius: f32) -> Result<Self, GridError> {
        Self::new(bounds, radius * 2.0)
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Index of the tile containing a world coordinate along one axis.
    #[must_use]
    pub fn world_to_tile(&self, coordinate: f32) -> i32 {
        (coordinate / self.tile_size).floor() as i32
    }

    /// World coordinate of the centre of a tile along one axis.
    #[must_use]
    pub fn tile_to_world(&self, index: i32) -> f32 {
        (index as f32 + 0.5) * self.tile_size
    }

    /// Tile containing a world-space point.
    #[must_use]
    pub fn world_to_cell(&self, point: Vec2) -> CellCoord {
        CellCoord::new(self.world_to_tile(point.x), self.world_to_tile(point.y))
    }

    /// Centre of a tile in world space.
    #[must_use]
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(self.tile_to_world(cell.column()), self.tile_to_world(cell.row()))
    }

    /// Reports whether the tile lies on the grid.
    #[must_use]
    pub fn is_in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Reports whether the tile lies on the grid and may be entered.
    #[must_use]
    pub fn is_safe(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| !tile.occupied())
    }

    /// Reports whether the tile is blocked. Tiles off the grid count as blocked.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.tile(cell).map_or(true, TileState::occupied)
    }

    /// Reports whether the tile holds a static obstacle.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.wall)
    }

    /// Reports whether the tile is marked as a goal.
    #[must_use]
    pub fn is_goal(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.goal)
    }

    /// Reports whether the tile was visited by the current search.
    #[must_use]
    pub fn is_visited(&self, cell: CellCoord) -> bool {
        self.tile(cell).is_some_and(|tile| tile.visited)
    }

    /// Reports whether at least one tile is marked as a goal.
    #[must_use]
    pub const fn has_goal(&self) -> bool {
        self.goal_count > 0
    }

    /// Sets or clears the static obstacle flag of a tile.
    pub fn set_occupied(&mut self, cell: CellCoord, occupied: bool) {
        if let Some(tile) = self.tile_mut(cell, "occupancy") {
            tile.wall = occupied;
        }
    }

    /// Marks a tile as a search goal.
    pub fn set_goal(&mut self, cell: CellCoord) {
        let Some(tile) = self.tile_mut(cell, "goal") else {
            return;
        };
        if !tile.goal {
            tile.goal = true;
            self.goal_count += 1;
        }
    }

    /// Marks a tile as visited by the current search.
    pub fn set_visited(&mut self, cell: CellCoord) {
        if let Some(tile) = self.tile_mut(cell, "visited") {
            tile.visited = true;
        }
    }

    /// Clears every goal and visited mark.
    pub fn clear_marks(&mut self) {
        for tile in &mut self.tiles {
            tile.goal = false;
            tile.visited = false;
        }
        self.goal_count = 0;
    }

    /// Tiles covered by a footprint, including any that fall off the grid.
    ///
    /// The upper edge is exclusive, so a body exactly one tile wide centred
    /// on a tile covers only that tile.
    pub fn covered_cells(&self, footprint: &Footprint) -> impl Iterator<Item = CellCoord> {
        let (min, max) = footprint.extent();
        let first = self.world_to_cell(min);
        let last_column = self.last_tile(max.x).max(first.column());
        let last_row = self.last_tile(max.y).max(first.row());

        (first.row()..=last_row).flat_map(move |row| {
            (first.column()..=last_column).map(move |column| CellCoord::new(column, row))
        })
    }

    /// Reports whether every tile under the footprint lies on the grid and is free.
    #[must_use]
    pub fn footprint_is_clear(&self, footprint: &Footprint) -> bool {
        self.covered_cells(footprint).all(|cell| self.is_safe(cell))
    }

    /// Registers a dynamic entity on every tile under its footprint.
    pub fn place_footprint(&mut self, footprint: &Footprint) {
        let cells: Vec<CellCoord> = self.covered_cells(footprint).collect();
        for cell in cells {
            if let Some(index) = self.index(cell) {
                let tile = &mut self.tiles[index];
                tile.occupants = tile.occupants.saturating_add(1);
            }
        }
    }

    /// Removes a dynamic entity previously registered with [`TileGrid::place_footprint`].
    pub fn remove_footprint(&mut self, footprint: &Footprint) {
        let cells: Vec<CellCoord> = self.covered_cells(footprint).collect();
        for cell in cells {
            if let Some(index) = self.index(cell) {
                let tile = &mut self.tiles[index];
                debug_assert!(tile.occupants > 0, "removed a footprint that was never placed");
                tile.occupants = tile.occupants.saturating_sub(1);
            }
        }
    }

    /// Marks every tile under a static obstacle as permanently occupied.
    pub fn stamp_wall(&mut self, footprint: &Footprint) {
        let cells: Vec<CellCoord> = self.covered_cells(footprint).collect();
        for cell in cells {
            self.set_occupied(cell, true);
        }
    }

    fn last_tile(&self, coordinate: f32) -> i32 {
        ((coordinate / self.tile_size).ceil() as i32).saturating_sub(1)
    }

    fn tile(&self, cell: CellCoord) -> Option<&TileState> {
        self.index(cell).map(|index| &self.tiles[index])
    }

    fn tile_mut(&mut self, cell: CellCoord, mark: &'static str) -> Option<&mut TileState> {
        match self.index(cell) {
            Some(index) => Some(&mut self.tiles[index]),
            None => {
                tracing::trace!(
                    column = cell.column(),
                    row = cell.row(),
                    mark,
                    "ignored tile update outside the grid"
                );
                None
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        Some(usize::try_from(row).ok()? * width + usize::try_from(column).ok()?)
    }
}
