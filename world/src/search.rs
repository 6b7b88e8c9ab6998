//! Breadth-first next-step router over the tile grid.

use std::collections::VecDeque;

use lantern_core::{Action, CellCoord, Direction};

use crate::grid::TileGrid;

/// Returns the first step of a shortest 8-connected path from `start` to the
/// nearest tile marked as a goal.
///
/// Every step costs the same, diagonal or not. Neighbours are expanded in
/// [`Direction::ALL`] order (right, up, left, down, down-left, down-right,
/// up-left, up-right), which decides between equally short paths. Goal tiles
/// are admitted even when occupied, since the tile being chased usually holds
/// the player. The search consumes the grid's `visited` marks; callers clear
/// them with [`TileGrid::clear_marks`] before marking goals for the next run.
///
/// Returns [`Action::NONE`] when no goal is marked, when `start` already is a
/// goal, or when no goal is reachable. An occupied `start` tile is still
/// expanded.
pub fn next_step(grid: &mut TileGrid, start: CellCoord) -> Action {
    if !grid.has_goal() || grid.is_goal(start) {
        return Action::NONE;
    }

    grid.set_visited(start);
    let mut queue: VecDeque<(CellCoord, Action)> = VecDeque::new();
    for direction in Direction::ALL {
        let neighbor = start.step(direction);
        if admits(grid, neighbor) {
            queue.push_back((neighbor, Action::step(direction)));
        }
    }

    while let Some((cell, origin)) = queue.pop_front() {
        if grid.is_visited(cell) {
            continue;
        }
        grid.set_visited(cell);

        if grid.is_goal(cell) {
            return origin;
        }

        for direction in Direction::ALL {
            let neighbor = cell.step(direction);
            if admits(grid, neighbor) && !grid.is_visited(neighbor) {
                queue.push_back((neighbor, origin));
            }
        }
    }

    Action::NONE
}

fn admits(grid: &TileGrid, cell: CellCoord) -> bool {
    grid.is_safe(cell) || grid.is_goal(cell)
}
