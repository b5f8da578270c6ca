#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Maze Chase.
//!
//! A [`World`] owns the single live [`GameState`], the injected random number
//! generator, the meta-progression [`Upgrades`], and the one-step undo slot.
//! Hosts mutate it exclusively through [`apply`] and observe it through the
//! [`query`] functions and the [`Event`] values pushed while applying.

mod state;
mod turn;
mod undo;

pub use maze_chase_system_generation::GenerationError;
pub use state::{GameState, LayoutError};

use maze_chase_core::{Command, Event, Notice, Progress, Upgrades};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::{turn::TurnOutcome, undo::UndoSlot};

/// Coarse lifecycle phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Commands are processed normally.
    Playing,
    /// Movement, bombs, and undo are ignored until play resumes.
    Paused,
    /// The player ran out of lives; only a restart continues the session.
    GameOver,
}

/// Represents the authoritative Maze Chase session.
#[derive(Debug)]
pub struct World<R = ChaCha8Rng> {
    state: GameState,
    rng: R,
    upgrades: Upgrades,
    phase: Phase,
    undo: UndoSlot,
}

impl<R: Rng> World<R> {
    /// Starts a fresh session on level one.
    pub fn new(rng: R) -> Result<Self, GenerationError> {
        Self::resume(Progress::default(), Upgrades::default(), rng)
    }

    /// Starts a session from persisted progress.
    ///
    /// Lives start full, and the start-of-level items granted by `upgrades`
    /// are handed out as for any new level.
    pub fn resume(
        progress: Progress,
        upgrades: Upgrades,
        mut rng: R,
    ) -> Result<Self, GenerationError> {
        let state = GameState::generate(progress, upgrades.max_lives(), &mut rng)?;
        let mut world = Self {
            state,
            rng,
            upgrades,
            phase: Phase::Playing,
            undo: UndoSlot::default(),
        };
        world.enter_level();
        Ok(world)
    }

    /// Wraps a prebuilt state without granting any start items.
    #[must_use]
    pub fn from_state(state: GameState, rng: R) -> Self {
        let phase = if state.lives == 0 {
            Phase::GameOver
        } else {
            Phase::Playing
        };
        Self {
            state,
            rng,
            upgrades: Upgrades::default(),
            phase,
            undo: UndoSlot::default(),
        }
    }

    fn enter_level(&mut self) {
        self.apply_upgrades();
        self.grant_start_items();
        self.undo.reset();
        debug!(
            level = self.state.level,
            lives = self.state.lives,
            bombs = self.state.bombs,
            "level loaded"
        );
    }

    fn apply_upgrades(&mut self) {
        self.state.max_lives = self.upgrades.max_lives();
        self.state.lives = self.state.lives.min(self.state.max_lives);
    }

    fn grant_start_items(&mut self) {
        self.state.bombs = self
            .state
            .bombs
            .saturating_add(self.upgrades.start_bombs_bonus);
        if self.rng.gen_bool(probability(self.upgrades.start_medkit_chance)) {
            self.state.lives = self.state.lives.saturating_add(1).min(self.state.max_lives);
        }
        if self.rng.gen_bool(probability(self.upgrades.start_bomb_chance)) {
            self.state.bombs = self.state.bombs.saturating_add(1);
        }
    }

    fn level_loaded(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::LevelLoaded {
            level: self.state.level,
            width: self.state.grid.width(),
            height: self.state.grid.height(),
        });
    }

    fn progress_changed(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::ProgressChanged {
            progress: self.state.progress(),
        });
    }
}

fn probability(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}

/// Applies the provided command to the world, mutating state deterministically
/// for a given random number generator.
///
/// Only commands that load a level can fail; the world is left untouched when
/// they do.
pub fn apply<R: Rng>(
    world: &mut World<R>,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GenerationError> {
    match command {
        Command::Step { direction } => {
            if world.phase != Phase::Playing || world.state.message.is_some() {
                return Ok(());
            }
            let Some(to) = turn::destination(&world.state, direction) else {
                out_events.push(Event::PlayerBumped {
                    at: world.state.player,
                    direction,
                });
                return Ok(());
            };
            world.undo.save(&world.state);
            let outcome = turn::take_turn(&mut world.state, to, &mut world.rng, out_events);
            if outcome == TurnOutcome::Defeated {
                world.phase = Phase::GameOver;
            }
            world.progress_changed(out_events);
        }
        Command::UseBomb => {
            if world.phase != Phase::Playing {
                return Ok(());
            }
            if turn::use_bomb(&mut world.state, &mut world.rng, out_events) {
                world.progress_changed(out_events);
            }
        }
        Command::Undo => {
            if world.phase != Phase::Playing {
                return Ok(());
            }
            if world.undo.restore(&mut world.state) {
                out_events.push(Event::UndoApplied);
                world.progress_changed(out_events);
            } else {
                out_events.push(Event::Notice {
                    notice: Notice::UndoUnavailable,
                });
            }
        }
        Command::NextLevel => {
            let cleared = world.state.message.is_some() && world.state.lives > 0;
            if world.phase != Phase::Playing || !cleared {
                return Ok(());
            }
            world.state.advance_level(&mut world.rng)?;
            world.enter_level();
            world.level_loaded(out_events);
            world.progress_changed(out_events);
        }
        Command::Restart => {
            world.state.restart(&mut world.rng)?;
            world.phase = Phase::Playing;
            world.enter_level();
            world.level_loaded(out_events);
            world.progress_changed(out_events);
        }
        Command::SetPaused { paused } => {
            let next = match (world.phase, paused) {
                (Phase::GameOver, _) => return Ok(()),
                (_, true) => Phase::Paused,
                (_, false) => Phase::Playing,
            };
            if next != world.phase {
                world.phase = next;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::ConfigureUpgrades { upgrades } => {
            world.upgrades = upgrades;
            world.apply_upgrades();
        }
        Command::BuyBomb => {
            if world.phase == Phase::GameOver {
                return Ok(());
            }
            let price = world.upgrades.bomb_price();
            if world.state.score < price {
                out_events.push(Event::Notice {
                    notice: Notice::NotEnoughScore,
                });
                return Ok(());
            }
            world.state.score -= price;
            world.state.bombs = world.state.bombs.saturating_add(1);
            out_events.push(Event::BombPurchased {
                price,
                bombs: world.state.bombs,
            });
            world.progress_changed(out_events);
        }
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_chase_core::{Biome, Progress, Upgrades};

    use super::{GameState, Phase, World};

    /// Current game state, for rendering.
    #[must_use]
    pub fn state<R>(world: &World<R>) -> &GameState {
        &world.state
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase<R>(world: &World<R>) -> Phase {
        world.phase
    }

    /// Fields the persistence collaborator should store.
    #[must_use]
    pub fn progress<R>(world: &World<R>) -> Progress {
        world.state.progress()
    }

    /// Meta-progression bonuses currently in effect.
    #[must_use]
    pub fn upgrades<R>(world: &World<R>) -> Upgrades {
        world.upgrades
    }

    /// Reports whether an undo would currently succeed.
    #[must_use]
    pub fn undo_available<R>(world: &World<R>) -> bool {
        world.undo.is_available()
    }

    /// Decorative theme of the current level.
    #[must_use]
    pub fn biome<R>(world: &World<R>) -> Biome {
        Biome::for_level(world.state.level)
    }
}
