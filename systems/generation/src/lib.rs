#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural level generation using rejection sampling.
//!
//! Each attempt rolls a fresh random maze, validates it with a breadth-first
//! search from the start, and then scatters treasures, medkits, and enemies
//! across the reachable cells. Attempts that leave the goal unreachable, lack
//! room for every entity, or cannot keep enemies at a safe distance are thrown
//! away wholesale.

use std::{
    collections::{BTreeSet, HashSet},
    fmt,
};

use maze_chase_core::{
    CellKind, Grid, LevelConfig, Position, MAX_GRID_HEIGHT, MAX_GRID_WIDTH,
    SECONDARY_SAFE_DISTANCE,
};
use maze_chase_system_pathfinding::{distances_from, DistanceField};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tracing::{debug, trace};

/// Number of attempts made before generation gives up.
pub const MAX_GENERATION_ATTEMPTS: u32 = 300;

/// Smallest grid side that still has an interior cell.
pub const MIN_GRID_SIDE: u32 = 3;

/// Errors raised while generating a level.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    /// Every attempt was rejected.
    #[error(
        "failed to generate a level after {attempts} attempts; \
         try a lower wall probability than {wall_probability}"
    )]
    Exhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// Wall probability that was in effect.
        wall_probability: f64,
    },
    /// The requested dimensions cannot hold a bordered maze.
    #[error("grid dimensions {width}x{height} are outside 3x3..={max_width}x{max_height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Largest supported width.
        max_width: u32,
        /// Largest supported height.
        max_height: u32,
    },
}

/// A freshly generated, solvable level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedLevel {
    /// Maze layout with a solid wall border.
    pub grid: Grid,
    /// Cell the player spawns on.
    pub start: Position,
    /// Portal cell that clears the level.
    pub goal: Position,
    /// Treasures that must be collected before the portal opens.
    pub treasures: BTreeSet<Position>,
    /// Medkits that heal the player.
    pub medkits: BTreeSet<Position>,
    /// Enemy spawn cells in placement order.
    pub enemies: Vec<Position>,
    /// Attempt that produced this level, starting at one.
    pub attempts: u32,
}

/// Generates a level matching `config`.
///
/// The start is fixed at `(1, 1)` and the goal at the opposite interior
/// corner. Enemies prefer cells at least
/// [`LevelConfig::primary_safe_distance`] steps from the start and fall back
/// to [`SECONDARY_SAFE_DISTANCE`] when no such cell is free.
pub fn generate_level<R>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<GeneratedLevel, GenerationError>
where
    R: Rng + ?Sized,
{
    validate_dimensions(config)?;

    let start = Position::new(1, 1);
    let goal = Position::new(
        i32::try_from(config.width).unwrap_or(i32::MAX) - 2,
        i32::try_from(config.height).unwrap_or(i32::MAX) - 2,
    );

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let grid = roll_grid(config, start, goal, rng);
        match populate(config, grid, start, goal, rng) {
            Ok(mut level) => {
                level.attempts = attempt;
                debug!(
                    attempt,
                    width = config.width,
                    height = config.height,
                    treasures = level.treasures.len(),
                    enemies = level.enemies.len(),
                    "generated level"
                );
                return Ok(level);
            }
            Err(rejection) => trace!(attempt, %rejection, "rejected level attempt"),
        }
    }

    Err(GenerationError::Exhausted {
        attempts: MAX_GENERATION_ATTEMPTS,
        wall_probability: config.wall_probability,
    })
}

fn validate_dimensions(config: &LevelConfig) -> Result<(), GenerationError> {
    let width_ok = (MIN_GRID_SIDE..=MAX_GRID_WIDTH).contains(&config.width);
    let height_ok = (MIN_GRID_SIDE..=MAX_GRID_HEIGHT).contains(&config.height);
    if width_ok && height_ok {
        Ok(())
    } else {
        Err(GenerationError::InvalidDimensions {
            width: config.width,
            height: config.height,
            max_width: MAX_GRID_WIDTH,
            max_height: MAX_GRID_HEIGHT,
        })
    }
}

fn roll_grid<R>(config: &LevelConfig, start: Position, goal: Position, rng: &mut R) -> Grid
where
    R: Rng + ?Sized,
{
    let mut grid = Grid::filled(config.width, config.height, CellKind::Wall);
    for position in grid.positions().collect::<Vec<_>>() {
        if grid.is_border(position) {
            continue;
        }
        if rng.gen::<f64>() >= config.wall_probability {
            let _ = grid.set(position, CellKind::Floor);
        }
    }
    let _ = grid.set(start, CellKind::Floor);
    let _ = grid.set(goal, CellKind::Floor);
    grid
}

enum Rejection {
    GoalUnreachable,
    TooFewCells { reachable: usize, required: usize },
    NoSafeEnemyCell { placed: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalUnreachable => write!(f, "goal unreachable from start"),
            Self::TooFewCells {
                reachable,
                required,
            } => write!(f, "{reachable} reachable cells, {required} required"),
            Self::NoSafeEnemyCell { placed } => {
                write!(f, "no safe cell for enemy after placing {placed}")
            }
        }
    }
}

fn populate<R>(
    config: &LevelConfig,
    grid: Grid,
    start: Position,
    goal: Position,
    rng: &mut R,
) -> Result<GeneratedLevel, Rejection>
where
    R: Rng + ?Sized,
{
    let field = distances_from(&grid, start);
    if !field.contains(goal) {
        return Err(Rejection::GoalUnreachable);
    }

    let reachable = field.reachable_count();
    let required = config.required_cells();
    if reachable < required {
        return Err(Rejection::TooFewCells {
            reachable,
            required,
        });
    }

    let mut forbidden: HashSet<Position> = [start, goal].into_iter().collect();

    let mut treasures = BTreeSet::new();
    for _ in 0..config.treasures {
        let cell = pick_free(&field, &forbidden, 0, rng).ok_or(Rejection::TooFewCells {
            reachable,
            required,
        })?;
        let _ = treasures.insert(cell);
        let _ = forbidden.insert(cell);
    }

    let mut medkits = BTreeSet::new();
    for _ in 0..config.medkits {
        let cell = pick_free(&field, &forbidden, 0, rng).ok_or(Rejection::TooFewCells {
            reachable,
            required,
        })?;
        let _ = medkits.insert(cell);
        let _ = forbidden.insert(cell);
    }

    let primary = config.primary_safe_distance();
    let mut enemies = Vec::with_capacity(config.enemies);
    for placed in 0..config.enemies {
        let cell = pick_free(&field, &forbidden, primary, rng)
            .or_else(|| pick_free(&field, &forbidden, SECONDARY_SAFE_DISTANCE, rng))
            .ok_or(Rejection::NoSafeEnemyCell { placed })?;
        enemies.push(cell);
        let _ = forbidden.insert(cell);
    }

    Ok(GeneratedLevel {
        grid,
        start,
        goal,
        treasures,
        medkits,
        enemies,
        attempts: 0,
    })
}

/// Uniformly picks a reachable, non-forbidden cell at least `min_distance`
/// steps from the search origin. Candidates are scanned in row-major order.
fn pick_free<R>(
    field: &DistanceField,
    forbidden: &HashSet<Position>,
    min_distance: u32,
    rng: &mut R,
) -> Option<Position>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<Position> = field
        .iter()
        .filter(|(position, distance)| *distance >= min_distance && !forbidden.contains(position))
        .map(|(position, _)| position)
        .collect();
    candidates.choose(rng).copied()
}
