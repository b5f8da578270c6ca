#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Breadth-first pathfinding over the maze grid.
//!
//! The same search backs level validation in the generator and the enemy
//! pursuit rules in the world. Every call is a fresh `O(width * height)`
//! search; nothing is cached between turns because walls may change when a
//! bomb goes off.

use std::collections::VecDeque;

use maze_chase_core::{Grid, Position};

/// Dense step-distance field produced by a breadth-first search.
///
/// Distances are stored in row-major order and default to `u32::MAX` for
/// cells the search never reached, which includes every wall.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    const UNREACHED: u32 = u32::MAX;

    fn unreached(width: u32, height: u32) -> Self {
        let cell_count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            distances: vec![Self::UNREACHED; cell_count],
        }
    }

    /// Step distance to `position`, or `None` when it was not reached.
    #[must_use]
    pub fn distance(&self, position: Position) -> Option<u32> {
        let offset = index(self.width, self.height, position)?;
        self.distances
            .get(offset)
            .copied()
            .filter(|distance| *distance != Self::UNREACHED)
    }

    /// Reports whether the search reached `position`.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.distance(position).is_some()
    }

    /// Number of cells reached by the search, including the origin.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != Self::UNREACHED)
            .count()
    }

    /// Reached cells and their distances in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(0).max(1);
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, distance)| **distance != Self::UNREACHED)
            .filter_map(move |(offset, distance)| {
                let x = i32::try_from(offset % width).ok()?;
                let y = i32::try_from(offset / width).ok()?;
                Some((Position::new(x, y), *distance))
            })
    }

    fn set(&mut self, position: Position, distance: u32) -> bool {
        let slot = index(self.width, self.height, position)
            .and_then(|offset| self.distances.get_mut(offset));
        match slot {
            Some(slot) => {
                *slot = distance;
                true
            }
            None => false,
        }
    }
}

/// Computes the step distance from `start` to every reachable passable cell.
///
/// A `start` that is a wall or lies outside the grid yields an empty field.
#[must_use]
pub fn distances_from(grid: &Grid, start: Position) -> DistanceField {
    let mut field = DistanceField::unreached(grid.width(), grid.height());
    if !grid.is_passable(start) || !field.set(start, 0) {
        return field;
    }

    let mut queue = VecDeque::new();
    queue.push_back((start, 0_u32));

    while let Some((cell, distance)) = queue.pop_front() {
        let next_distance = distance.saturating_add(1);
        for neighbor in grid.passable_neighbors(cell) {
            if field.contains(neighbor) {
                continue;
            }
            let _ = field.set(neighbor, next_distance);
            queue.push_back((neighbor, next_distance));
        }
    }

    field
}

/// First cell of a shortest path from `start` towards `goal`.
///
/// Returns `Some(start)` when both positions coincide and `None` when the
/// goal is unreachable. Among equally short routes the first neighbour of
/// `start` in [`Position::neighbors4`] order wins.
#[must_use]
pub fn next_step(grid: &Grid, start: Position, goal: Position) -> Option<Position> {
    if start == goal {
        return Some(start);
    }

    let field = distances_from(grid, goal);
    let remaining = field.distance(start)?;
    start
        .neighbors4()
        .into_iter()
        .find(|neighbor| field.distance(*neighbor) == Some(remaining.saturating_sub(1)))
}

fn index(width: u32, height: u32, position: Position) -> Option<usize> {
    let column = u32::try_from(position.x()).ok()?;
    let row = u32::try_from(position.y()).ok()?;
    if column >= width || row >= height {
        return None;
    }
    let width = usize::try_from(width).ok()?;
    let column = usize::try_from(column).ok()?;
    let row = usize::try_from(row).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::{distances_from, next_step};
    use maze_chase_core::{CellKind, Grid, Position};

    fn open_room(width: u32, height: u32) -> Grid {
        Grid::from_fn(width, height, |position| {
            let last_x = i32::try_from(width).expect("width") - 1;
            let last_y = i32::try_from(height).expect("height") - 1;
            if position.x() == 0
                || position.y() == 0
                || position.x() == last_x
                || position.y() == last_y
            {
                CellKind::Wall
            } else {
                CellKind::Floor
            }
        })
    }

    #[test]
    fn origin_has_distance_zero() {
        let grid = open_room(5, 5);
        let field = distances_from(&grid, Position::new(1, 1));
        assert_eq!(field.distance(Position::new(1, 1)), Some(0));
        assert_eq!(field.distance(Position::new(3, 3)), Some(4));
        assert_eq!(field.reachable_count(), 9);
    }

    #[test]
    fn walls_and_out_of_bounds_are_absent() {
        let grid = open_room(5, 5);
        let field = distances_from(&grid, Position::new(1, 1));
        assert!(!field.contains(Position::new(0, 0)));
        assert!(!field.contains(Position::new(-1, 2)));
        assert!(!field.contains(Position::new(5, 2)));
    }

    #[test]
    fn walled_origin_yields_empty_field() {
        let grid = open_room(5, 5);
        let field = distances_from(&grid, Position::new(0, 0));
        assert_eq!(field.reachable_count(), 0);
        assert_eq!(field.iter().count(), 0);
    }

    #[test]
    fn iteration_is_row_major() {
        let grid = open_room(4, 4);
        let field = distances_from(&grid, Position::new(2, 2));
        let cells: Vec<_> = field.iter().collect();
        assert_eq!(
            cells,
            vec![
                (Position::new(1, 1), 2),
                (Position::new(2, 1), 1),
                (Position::new(1, 2), 1),
                (Position::new(2, 2), 0),
            ]
        );
    }

    #[test]
    fn next_step_prefers_east_on_ties() {
        let grid = open_room(6, 6);
        let step = next_step(&grid, Position::new(1, 1), Position::new(4, 4));
        assert_eq!(step, Some(Position::new(2, 1)));
    }

    #[test]
    fn next_step_at_goal_returns_start() {
        let grid = open_room(4, 4);
        let here = Position::new(1, 2);
        assert_eq!(next_step(&grid, here, here), Some(here));
    }

    #[test]
    fn next_step_without_route_is_none() {
        let mut grid = open_room(7, 5);
        for y in 0..5 {
            let _ = grid.set(Position::new(3, y), CellKind::Wall);
        }
        assert_eq!(
            next_step(&grid, Position::new(1, 1), Position::new(5, 3)),
            None
        );
    }
}
