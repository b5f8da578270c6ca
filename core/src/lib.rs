#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the grid model and the message surface that connects
//! adapters with the authoritative world. Adapters submit [`Command`] values
//! describing player intent, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values so hosts can
//! drive sound, persistence, and meta-progression without touching the rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Chase.";

/// Banner shown once the player escapes through the portal.
pub const LEVEL_CLEARED_MESSAGE: &str = "Level cleared";

/// Banner shown once the player runs out of lives.
pub const GAME_OVER_MESSAGE: &str = "Game over";

/// Largest grid width any level may use.
pub const MAX_GRID_WIDTH: u32 = 32;

/// Largest grid height any level may use.
pub const MAX_GRID_HEIGHT: u32 = 18;

/// Fallback spawn distance used when the primary safety distance is infeasible.
pub const SECONDARY_SAFE_DISTANCE: u32 = 3;

/// Lives granted before any meta-progression bonus.
pub const BASE_MAX_LIVES: u32 = 3;

/// Reports whether the coordinate lies inside a `width` by `height` rectangle.
#[must_use]
pub fn in_bounds(x: i32, y: i32, width: u32, height: u32) -> bool {
    let column_fits = u32::try_from(x).map_or(false, |column| column < width);
    let row_fits = u32::try_from(y).map_or(false, |row| row < height);
    column_fits && row_fits
}

/// Minimum BFS distance between a spawn point and a freshly placed enemy.
///
/// The same distance governs where an enemy lands after knocking the player
/// back to the start.
#[must_use]
pub const fn primary_safe_distance(width: u32, height: u32) -> u32 {
    let scaled = (width + height) / 4;
    if scaled > 6 {
        scaled
    } else {
        6
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cell reached by taking one step in the provided direction.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four axis-aligned neighbours in east, west, north, south order.
    ///
    /// The result is unfiltered; callers decide whether a neighbour is in
    /// bounds or passable.
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(Direction::East),
            self.offset(Direction::West),
            self.offset(Direction::North),
            self.offset(Direction::South),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement directions available to the player and enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Column and row delta applied by a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Kind of terrain stored in a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Impassable cell. Bombs may turn interior walls into floor.
    Wall,
    /// Walkable cell.
    Floor,
}

impl CellKind {
    /// Glyph used when printing grids.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
        }
    }
}

/// Rectangular maze stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Creates a grid with every cell set to `kind`.
    #[must_use]
    pub fn filled(width: u32, height: u32, kind: CellKind) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![kind; capacity],
        }
    }

    /// Creates a grid by evaluating `kind_at` for every cell in row-major order.
    #[must_use]
    pub fn from_fn<F>(width: u32, height: u32, mut kind_at: F) -> Self
    where
        F: FnMut(Position) -> CellKind,
    {
        let mut grid = Self::filled(width, height, CellKind::Floor);
        for position in grid.positions().collect::<Vec<_>>() {
            let _ = grid.set(position, kind_at(position));
        }
        grid
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the position lies within the grid.
    #[must_use]
    pub fn in_bounds(&self, position: Position) -> bool {
        in_bounds(position.x(), position.y(), self.width, self.height)
    }

    /// Reports whether the position lies on the outermost ring of cells.
    #[must_use]
    pub fn is_border(&self, position: Position) -> bool {
        if !self.in_bounds(position) {
            return false;
        }
        let last_column = i64::from(self.width) - 1;
        let last_row = i64::from(self.height) - 1;
        position.x() == 0
            || position.y() == 0
            || i64::from(position.x()) == last_column
            || i64::from(position.y()) == last_row
    }

    /// Kind of the cell at `position`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<CellKind> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the cell at `position`. Returns `false` when out of bounds.
    pub fn set(&mut self, position: Position, kind: CellKind) -> bool {
        match self.index(position).and_then(|index| self.cells.get_mut(index)) {
            Some(slot) => {
                *slot = kind;
                true
            }
            None => false,
        }
    }

    /// A cell is passable when it is in bounds and not a wall.
    #[must_use]
    pub fn is_passable(&self, position: Position) -> bool {
        self.cell(position) == Some(CellKind::Floor)
    }

    /// Reports whether the position holds an in-bounds wall.
    #[must_use]
    pub fn is_wall(&self, position: Position) -> bool {
        self.cell(position) == Some(CellKind::Wall)
    }

    /// Passable neighbours of `position` in east, west, north, south order.
    pub fn passable_neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        position
            .neighbors4()
            .into_iter()
            .filter(move |neighbor| self.is_passable(*neighbor))
    }

    /// Every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = i32::try_from(self.width).unwrap_or(0);
        let height = i32::try_from(self.height).unwrap_or(0);
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.in_bounds(position) {
            return None;
        }
        let row = usize::try_from(position.y()).ok()?;
        let column = usize::try_from(position.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = usize::try_from(self.width).unwrap_or(0);
        if width == 0 {
            return Ok(());
        }
        for row in self.cells.chunks(width) {
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Difficulty parameters derived purely from the level number.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Number of columns in the generated grid.
    pub width: u32,
    /// Number of rows in the generated grid.
    pub height: u32,
    /// Probability that an interior cell becomes a wall.
    pub wall_probability: f64,
    /// Treasures that must be collected before the portal opens.
    pub treasures: usize,
    /// Enemies chasing the player.
    pub enemies: usize,
    /// Medkits scattered across the maze.
    pub medkits: usize,
    /// Cells each enemy advances per player turn.
    pub enemy_steps: u32,
}

impl LevelConfig {
    /// Derives the configuration for `level`. Level zero is treated as level one.
    #[must_use]
    pub fn for_level(level: u32) -> Self {
        let tier = level.max(1) - 1;
        let tier_usize = usize::try_from(tier).unwrap_or(usize::MAX);

        Self {
            width: MAX_GRID_WIDTH.min(tier.saturating_mul(4).saturating_add(20)),
            height: MAX_GRID_HEIGHT.min(tier.saturating_mul(2).saturating_add(12)),
            wall_probability: (0.20 + f64::from(tier) * 0.02).min(0.28),
            treasures: 8.min(tier_usize.saturating_add(3)),
            enemies: 6.min(tier_usize.saturating_add(1)),
            medkits: 1 + usize::try_from(level.max(1) / 2).unwrap_or(0),
            enemy_steps: if level < 4 { 1 } else { 2 },
        }
    }

    /// Preferred minimum BFS distance between the start and a spawned enemy.
    #[must_use]
    pub const fn primary_safe_distance(&self) -> u32 {
        primary_safe_distance(self.width, self.height)
    }

    /// Cells required to place every entity plus the start and the goal.
    #[must_use]
    pub const fn required_cells(&self) -> usize {
        self.treasures + self.medkits + self.enemies + 2
    }
}

/// Permanent bonuses purchased through meta-progression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Upgrades {
    /// Extra lives added on top of [`BASE_MAX_LIVES`].
    pub max_lives_bonus: u32,
    /// Bombs granted whenever a new level starts.
    pub start_bombs_bonus: u32,
    /// Chance of healing one life when a level starts.
    pub start_medkit_chance: f64,
    /// Chance of receiving a bonus bomb when a level starts.
    pub start_bomb_chance: f64,
    /// Percentage discount applied to bomb purchases.
    pub shop_discount: u32,
}

impl Upgrades {
    /// Life ceiling produced by these upgrades.
    #[must_use]
    pub const fn max_lives(&self) -> u32 {
        BASE_MAX_LIVES.saturating_add(self.max_lives_bonus)
    }

    /// Score cost of a single bomb after the shop discount.
    #[must_use]
    pub fn bomb_price(&self) -> u32 {
        const BASE_BOMB_PRICE: u32 = 30;
        let discount = self.shop_discount.min(100);
        (BASE_BOMB_PRICE * (100 - discount) / 100).max(1)
    }
}

/// Session progress persisted by the host between runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Progress {
    /// Level the player is currently on.
    pub level: u32,
    /// Accumulated score.
    pub score: u32,
    /// Bombs carried by the player.
    pub bombs: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            bombs: 0,
        }
    }
}

/// Decorative theme chosen for a band of five levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    /// Levels 1 through 5.
    Tomb,
    /// Levels 6 through 10.
    IceCaves,
    /// Levels 11 through 15.
    LavaDepths,
    /// Every level from 16 onwards.
    JungleRuins,
}

impl Biome {
    /// Biome used for the provided level.
    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        let band = if level == 0 { 0 } else { (level - 1) / 5 };
        match band {
            0 => Self::Tomb,
            1 => Self::IceCaves,
            2 => Self::LavaDepths,
            _ => Self::JungleRuins,
        }
    }

    /// Human readable biome name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tomb => "Tomb",
            Self::IceCaves => "Ice Caves",
            Self::LavaDepths => "Lava Depths",
            Self::JungleRuins => "Jungle Ruins",
        }
    }
}

/// Commands that express every action a host may request.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Moves the player one cell and resolves the resulting turn.
    Step {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Detonates a bomb against an adjacent interior wall.
    UseBomb,
    /// Restores the state captured before the most recent step.
    Undo,
    /// Advances to the next level once the current one is cleared.
    NextLevel,
    /// Starts a brand new session from level one.
    Restart,
    /// Pauses or resumes the session.
    SetPaused {
        /// Whether the session should be paused.
        paused: bool,
    },
    /// Replaces the meta-progression bonuses applied to the session.
    ConfigureUpgrades {
        /// Bonuses supplied by the meta-progression collaborator.
        upgrades: Upgrades,
    },
    /// Spends score on a bomb.
    BuyBomb,
}

/// Transient, user-facing notices that accompany rejected actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notice {
    /// A bomb was requested without any bombs left.
    NoBombs,
    /// A bomb was requested without an interior wall next to the player.
    NoWallNearby,
    /// Undo was requested without a stored snapshot.
    UndoUnavailable,
    /// A bomb purchase was requested without enough score.
    NotEnoughScore,
}

impl Notice {
    /// Text a host may flash to the player.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::NoBombs => "No bombs",
            Self::NoWallNearby => "No wall nearby",
            Self::UndoUnavailable => "Undo unavailable",
            Self::NotEnoughScore => "Not enough score",
        }
    }
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A fresh level was generated and the player placed on its start.
    LevelLoaded {
        /// Level number that was loaded.
        level: u32,
        /// Width of the generated grid.
        width: u32,
        /// Height of the generated grid.
        height: u32,
    },
    /// The player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: Position,
        /// Cell the player occupies after moving.
        to: Position,
    },
    /// The player walked into a wall or the grid boundary.
    PlayerBumped {
        /// Cell the player stayed on.
        at: Position,
        /// Direction of the rejected step.
        direction: Direction,
    },
    /// A treasure was picked up.
    TreasureCollected {
        /// Cell the treasure occupied.
        at: Position,
        /// Treasures still left on the level.
        remaining: usize,
    },
    /// A medkit was picked up.
    MedkitCollected {
        /// Cell the medkit occupied.
        at: Position,
        /// Lives after healing.
        lives: u32,
    },
    /// The player reached the portal with every treasure collected.
    LevelCleared {
        /// Level that was cleared.
        level: u32,
        /// Score bonus awarded for clearing the level.
        bonus: u32,
    },
    /// Crystals earned for the meta-progression collaborator.
    CrystalsAwarded {
        /// Number of crystals to add.
        amount: u32,
    },
    /// An enemy advanced during the enemy turn.
    EnemyMoved {
        /// Index of the enemy within the ordered enemy list.
        index: usize,
        /// Cell the enemy occupied before its turn.
        from: Position,
        /// Cell the enemy occupies after its turn.
        to: Position,
    },
    /// An enemy caught the player.
    PlayerHit {
        /// Cell where the collision happened.
        at: Position,
        /// Lives remaining after the hit.
        lives: u32,
    },
    /// An enemy was relocated away from the player after a hit.
    EnemyKnockedBack {
        /// Index of the enemy within the ordered enemy list.
        index: usize,
        /// Cell of the collision.
        from: Position,
        /// Cell the enemy was moved to.
        to: Position,
    },
    /// The player ran out of lives.
    GameOver {
        /// Final score of the session.
        score: u32,
    },
    /// A bomb turned a wall into floor.
    WallDemolished {
        /// Cell that was demolished.
        at: Position,
        /// Bombs left after the explosion.
        bombs: u32,
    },
    /// A bomb was bought with score.
    BombPurchased {
        /// Score spent on the bomb.
        price: u32,
        /// Bombs carried after the purchase.
        bombs: u32,
    },
    /// The most recent step was reverted.
    UndoApplied,
    /// The session was paused or resumed.
    PauseChanged {
        /// Whether the session is now paused.
        paused: bool,
    },
    /// An action was rejected with a user-facing notice.
    Notice {
        /// Notice to show.
        notice: Notice,
    },
    /// Persisted progress may have changed and should be saved.
    ProgressChanged {
        /// Snapshot of the persisted fields.
        progress: Progress,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        in_bounds, primary_safe_distance, Biome, CellKind, Direction, Grid, LevelConfig, Position,
        Progress, Upgrades,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn in_bounds_rejects_negative_and_overflowing_coordinates() {
        assert!(in_bounds(0, 0, 3, 2));
        assert!(in_bounds(2, 1, 3, 2));
        assert!(!in_bounds(-1, 0, 3, 2));
        assert!(!in_bounds(0, -1, 3, 2));
        assert!(!in_bounds(3, 0, 3, 2));
        assert!(!in_bounds(0, 2, 3, 2));
        assert!(!in_bounds(0, 0, 0, 0));
    }

    #[test]
    fn neighbors4_lists_east_west_north_south() {
        let origin = Position::new(3, 3);
        assert_eq!(
            origin.neighbors4(),
            [
                Position::new(4, 3),
                Position::new(2, 3),
                Position::new(3, 2),
                Position::new(3, 4),
            ]
        );
        assert_eq!(
            Position::new(0, 0).neighbors4()[1],
            Position::new(-1, 0),
            "neighbours are not filtered"
        );
    }

    #[test]
    fn directions_step_one_cell() {
        let origin = Position::new(2, 2);
        assert_eq!(origin.offset(Direction::North), Position::new(2, 1));
        assert_eq!(origin.offset(Direction::East), Position::new(3, 2));
        assert_eq!(origin.offset(Direction::South), Position::new(2, 3));
        assert_eq!(origin.offset(Direction::West), Position::new(1, 2));
    }

    #[test]
    fn grid_passability_tracks_walls_and_bounds() {
        let mut grid = Grid::filled(4, 3, CellKind::Floor);
        assert!(grid.set(Position::new(1, 1), CellKind::Wall));
        assert!(!grid.set(Position::new(4, 0), CellKind::Wall));

        assert!(grid.is_passable(Position::new(0, 0)));
        assert!(!grid.is_passable(Position::new(1, 1)));
        assert!(grid.is_wall(Position::new(1, 1)));
        assert!(!grid.is_passable(Position::new(-1, 0)));
        assert!(!grid.is_wall(Position::new(-1, 0)));
        assert_eq!(
            grid.positions().filter(|cell| grid.is_wall(*cell)).count(),
            1
        );
        assert_eq!(grid.positions().count(), 12);
    }

    #[test]
    fn border_cells_are_detected() {
        let grid = Grid::filled(5, 4, CellKind::Wall);
        assert!(grid.is_border(Position::new(0, 2)));
        assert!(grid.is_border(Position::new(4, 1)));
        assert!(grid.is_border(Position::new(2, 3)));
        assert!(!grid.is_border(Position::new(2, 2)));
        assert!(!grid.is_border(Position::new(5, 5)));
    }

    #[test]
    fn grid_display_prints_rows() {
        let grid = Grid::from_fn(3, 2, |position| {
            if position.x() == 1 {
                CellKind::Wall
            } else {
                CellKind::Floor
            }
        });
        assert_eq!(grid.to_string(), ".#.\n.#.\n");
    }

    #[test]
    fn level_config_grows_and_caps() {
        let first = LevelConfig::for_level(1);
        assert_eq!((first.width, first.height), (20, 12));
        assert_eq!(first.treasures, 3);
        assert_eq!(first.enemies, 1);
        assert_eq!(first.medkits, 1);
        assert_eq!(first.enemy_steps, 1);
        assert!((first.wall_probability - 0.20).abs() < 1e-9);

        let fourth = LevelConfig::for_level(4);
        assert_eq!((fourth.width, fourth.height), (32, 18));
        assert_eq!(fourth.enemy_steps, 2);
        assert_eq!(fourth.medkits, 3);

        let late = LevelConfig::for_level(40);
        assert_eq!((late.width, late.height), (32, 18));
        assert_eq!(late.treasures, 8);
        assert_eq!(late.enemies, 6);
        assert!((late.wall_probability - 0.28).abs() < 1e-9);

        assert_eq!(LevelConfig::for_level(0), LevelConfig::for_level(1));
    }

    #[test]
    fn safe_distance_has_a_floor_of_six() {
        assert_eq!(primary_safe_distance(20, 12), 8);
        assert_eq!(primary_safe_distance(8, 8), 6);
        assert_eq!(LevelConfig::for_level(1).primary_safe_distance(), 8);
    }

    #[test]
    fn bomb_price_applies_discount_with_floor() {
        assert_eq!(Upgrades::default().bomb_price(), 30);
        let discounted = Upgrades {
            shop_discount: 20,
            ..Upgrades::default()
        };
        assert_eq!(discounted.bomb_price(), 24);
        let free = Upgrades {
            shop_discount: 250,
            ..Upgrades::default()
        };
        assert_eq!(free.bomb_price(), 1);
    }

    #[test]
    fn biome_changes_every_five_levels() {
        assert_eq!(Biome::for_level(1), Biome::Tomb);
        assert_eq!(Biome::for_level(5), Biome::Tomb);
        assert_eq!(Biome::for_level(6), Biome::IceCaves);
        assert_eq!(Biome::for_level(11), Biome::LavaDepths);
        assert_eq!(Biome::for_level(99), Biome::JungleRuins);
        assert_eq!(Biome::for_level(0).name(), "Tomb");
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn progress_round_trips_through_bincode() {
        assert_round_trip(&Progress {
            level: 7,
            score: 420,
            bombs: 2,
        });
    }

    #[test]
    fn grid_round_trips_through_bincode() {
        let mut grid = Grid::filled(3, 3, CellKind::Wall);
        let _ = grid.set(Position::new(1, 1), CellKind::Floor);
        assert_round_trip(&grid);
    }
}
