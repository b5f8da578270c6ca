//! Single-slot undo of the most recent player step.

use std::collections::BTreeSet;

use maze_chase_core::{Grid, Position};

use crate::state::GameState;

#[derive(Clone, Debug)]
struct Snapshot {
    score: u32,
    lives: u32,
    bombs: u32,
    player: Position,
    treasures: BTreeSet<Position>,
    medkits: BTreeSet<Position>,
    enemies: Vec<Position>,
    grid: Grid,
}

impl Snapshot {
    fn capture(state: &GameState) -> Self {
        Self {
            score: state.score,
            lives: state.lives,
            bombs: state.bombs,
            player: state.player,
            treasures: state.treasures.clone(),
            medkits: state.medkits.clone(),
            enemies: state.enemies.clone(),
            grid: state.grid.clone(),
        }
    }

    fn restore(self, state: &mut GameState) {
        state.score = self.score;
        state.lives = self.lives;
        state.bombs = self.bombs;
        state.player = self.player;
        state.treasures = self.treasures;
        state.medkits = self.medkits;
        state.enemies = self.enemies;
        state.grid = self.grid;
        state.message = None;
    }
}

/// Holds at most one snapshot and allows a single undo per level.
#[derive(Clone, Debug, Default)]
pub(crate) struct UndoSlot {
    snapshot: Option<Snapshot>,
    spent: bool,
}

impl UndoSlot {
    /// Replaces the stored snapshot unless this level's undo was already used.
    pub(crate) fn save(&mut self, state: &GameState) {
        if self.spent {
            return;
        }
        self.snapshot = Some(Snapshot::capture(state));
    }

    /// Restores the stored snapshot, consuming the slot for the level.
    pub(crate) fn restore(&mut self, state: &mut GameState) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };
        snapshot.restore(state);
        self.spent = true;
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn is_available(&self) -> bool {
        self.snapshot.is_some()
    }
}
