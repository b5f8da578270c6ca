//! The single mutable game state and its level lifecycle.

use std::collections::BTreeSet;

use maze_chase_core::{
    CellKind, Grid, LevelConfig, Position, Progress, BASE_MAX_LIVES, MAX_GRID_HEIGHT,
    MAX_GRID_WIDTH,
};
use maze_chase_system_generation::{generate_level, GeneratedLevel, GenerationError, MIN_GRID_SIDE};
use rand::Rng;
use thiserror::Error;

/// Everything needed to render and advance a level.
///
/// Treasures and medkits are kept in ordered sets so seeded sessions replay
/// identically. Enemy order is stable across turns and defines which enemy
/// resolves first.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    /// Current level number, starting at one.
    pub level: u32,
    /// Accumulated score.
    pub score: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Life ceiling applied when healing.
    pub max_lives: u32,
    /// Bombs carried by the player.
    pub bombs: u32,
    /// Parameters of the loaded level.
    pub config: LevelConfig,
    /// Maze layout.
    pub grid: Grid,
    /// Spawn cell, also where the player returns after a hit.
    pub start: Position,
    /// Portal cell.
    pub goal: Position,
    /// Current player cell.
    pub player: Position,
    /// Uncollected treasures.
    pub treasures: BTreeSet<Position>,
    /// Uncollected medkits.
    pub medkits: BTreeSet<Position>,
    /// Enemy cells in resolution order.
    pub enemies: Vec<Position>,
    /// Terminal banner shown once the level is cleared or the game is lost.
    pub message: Option<String>,
}

impl GameState {
    /// Generates the level described by `progress` with a full set of lives.
    pub fn generate<R>(
        progress: Progress,
        max_lives: u32,
        rng: &mut R,
    ) -> Result<Self, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let level = progress.level.max(1);
        let config = LevelConfig::for_level(level);
        let generated = generate_level(&config, rng)?;
        Ok(Self {
            level,
            score: progress.score,
            lives: max_lives,
            max_lives,
            bombs: progress.bombs,
            config,
            player: generated.start,
            grid: generated.grid,
            start: generated.start,
            goal: generated.goal,
            treasures: generated.treasures,
            medkits: generated.medkits,
            enemies: generated.enemies,
            message: None,
        })
    }

    /// Regenerates the current level, keeping score, lives, and bombs.
    ///
    /// The state is left untouched when generation fails.
    pub fn load_level<R>(&mut self, rng: &mut R) -> Result<(), GenerationError>
    where
        R: Rng + ?Sized,
    {
        let config = LevelConfig::for_level(self.level);
        let generated = generate_level(&config, rng)?;
        self.install(config, generated);
        Ok(())
    }

    /// Moves on to the following level.
    pub fn advance_level<R>(&mut self, rng: &mut R) -> Result<(), GenerationError>
    where
        R: Rng + ?Sized,
    {
        let level = self.level.saturating_add(1);
        let config = LevelConfig::for_level(level);
        let generated = generate_level(&config, rng)?;
        self.level = level;
        self.install(config, generated);
        Ok(())
    }

    /// Starts over from level one with no score, no bombs, and full lives.
    pub fn restart<R>(&mut self, rng: &mut R) -> Result<(), GenerationError>
    where
        R: Rng + ?Sized,
    {
        let config = LevelConfig::for_level(1);
        let generated = generate_level(&config, rng)?;
        self.level = 1;
        self.score = 0;
        self.lives = self.max_lives;
        self.bombs = 0;
        self.install(config, generated);
        Ok(())
    }

    fn install(&mut self, config: LevelConfig, generated: GeneratedLevel) {
        self.config = config;
        self.grid = generated.grid;
        self.start = generated.start;
        self.goal = generated.goal;
        self.player = generated.start;
        self.treasures = generated.treasures;
        self.medkits = generated.medkits;
        self.enemies = generated.enemies;
        self.message = None;
    }

    /// Fields the persistence collaborator stores between runs.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            level: self.level,
            score: self.score,
            bombs: self.bombs,
        }
    }

    /// Builds a state from an ASCII layout, one string per row.
    ///
    /// Glyphs: `#` wall, `.` floor, `S` start (the player spawns here unless
    /// `@` is present), `G` goal, `T` treasure, `M` medkit, `E` enemy, and
    /// `@` player. Enemies keep the row-major order they appear in.
    pub fn from_layout(level: u32, rows: &[&str]) -> Result<Self, LayoutError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let (width_u32, height_u32) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(LayoutError::InvalidDimensions { width, height }),
        };
        let fits = (MIN_GRID_SIDE..=MAX_GRID_WIDTH).contains(&width_u32)
            && (MIN_GRID_SIDE..=MAX_GRID_HEIGHT).contains(&height_u32);
        if !fits {
            return Err(LayoutError::InvalidDimensions { width, height });
        }

        let mut grid = Grid::filled(width_u32, height_u32, CellKind::Floor);
        let mut start = None;
        let mut goal = None;
        let mut player = None;
        let mut treasures = BTreeSet::new();
        let mut medkits = BTreeSet::new();
        let mut enemies = Vec::new();

        for (y, row) in (0_i32..).zip(rows.iter()) {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in (0_i32..).zip(row.chars()) {
                let position = Position::new(x, y);
                match glyph {
                    '#' => {
                        let _ = grid.set(position, CellKind::Wall);
                    }
                    '.' => {}
                    'S' => place_unique(&mut start, position, glyph)?,
                    'G' => place_unique(&mut goal, position, glyph)?,
                    '@' => place_unique(&mut player, position, glyph)?,
                    'T' => {
                        let _ = treasures.insert(position);
                    }
                    'M' => {
                        let _ = medkits.insert(position);
                    }
                    'E' => enemies.push(position),
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            position,
                        })
                    }
                }
            }
        }

        if let Some(position) = grid
            .positions()
            .find(|position| grid.is_border(*position) && grid.is_passable(*position))
        {
            return Err(LayoutError::OpenBorder { position });
        }

        let start = start.ok_or(LayoutError::Missing { glyph: 'S' })?;
        let goal = goal.ok_or(LayoutError::Missing { glyph: 'G' })?;

        let mut config = LevelConfig::for_level(level);
        config.width = width_u32;
        config.height = height_u32;
        config.treasures = treasures.len();
        config.medkits = medkits.len();
        config.enemies = enemies.len();

        let max_lives = BASE_MAX_LIVES;
        Ok(Self {
            level: level.max(1),
            score: 0,
            lives: max_lives,
            max_lives,
            bombs: 0,
            config,
            grid,
            start,
            goal,
            player: player.unwrap_or(start),
            treasures,
            medkits,
            enemies,
            message: None,
        })
    }
}

fn place_unique(
    slot: &mut Option<Position>,
    position: Position,
    glyph: char,
) -> Result<(), LayoutError> {
    if slot.is_some() {
        return Err(LayoutError::Duplicate { glyph });
    }
    *slot = Some(position);
    Ok(())
}

/// Errors raised while parsing an ASCII layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout is empty or does not fit the supported grid sizes.
    #[error("layout of {width}x{height} cells is outside the supported grid sizes")]
    InvalidDimensions {
        /// Width of the first row.
        width: usize,
        /// Number of rows.
        height: usize,
    },
    /// A row length differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: i32,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A character outside the layout alphabet was found.
    #[error("unknown glyph {glyph:?} at {position}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Where the character was found.
        position: Position,
    },
    /// A glyph that must be unique appeared more than once.
    #[error("glyph {glyph:?} appears more than once")]
    Duplicate {
        /// Repeated glyph.
        glyph: char,
    },
    /// A required glyph is missing.
    #[error("layout has no {glyph:?} cell")]
    Missing {
        /// Missing glyph.
        glyph: char,
    },
    /// The outer ring of the layout contains a passable cell.
    #[error("border cell {position} is not a wall")]
    OpenBorder {
        /// First open border cell in row-major order.
        position: Position,
    },
}
