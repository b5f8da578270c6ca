#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays scripted Maze Chase sessions.

mod progress_transfer;
mod script;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_core::{CellKind, Command, Event, Position, Progress, Upgrades, WELCOME_BANNER};
use maze_chase_world::{self as world, query, GameState, Phase, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{progress_transfer::ProgressCode, script::Action};

/// Replays a scripted Maze Chase session and prints the resulting board.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", version)]
struct Args {
    /// Seed for level generation and enemy decisions.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Level to start on.
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Score to start with.
    #[arg(long, default_value_t = 0)]
    score: u32,
    /// Bombs to start with.
    #[arg(long, default_value_t = 0)]
    bombs: u32,
    /// Progress code printed by an earlier run. Overrides level, score and bombs.
    #[arg(long)]
    resume: Option<String>,
    /// Extra lives on top of the base three.
    #[arg(long, default_value_t = 0)]
    max_lives_bonus: u32,
    /// Bombs granted whenever a level starts.
    #[arg(long, default_value_t = 0)]
    start_bombs_bonus: u32,
    /// Chance of healing a life when a level starts.
    #[arg(long, default_value_t = 0.0)]
    start_medkit_chance: f64,
    /// Chance of a bonus bomb when a level starts.
    #[arg(long, default_value_t = 0.0)]
    start_bomb_chance: f64,
    /// Percentage discount on bomb purchases.
    #[arg(long, default_value_t = 0)]
    shop_discount: u32,
    /// Moves to replay: w/a/s/d step, b bomb, u undo, n next level, r restart,
    /// p pause toggle, $ buy a bomb.
    #[arg(long, default_value = "")]
    moves: String,
    /// Print every event emitted while replaying the moves.
    #[arg(long)]
    events: bool,
}

impl Args {
    fn progress(&self) -> Result<Progress> {
        match &self.resume {
            Some(code) => Ok(ProgressCode::decode(code)
                .context("invalid --resume code")?
                .progress),
            None => Ok(Progress {
                level: self.level.max(1),
                score: self.score,
                bombs: self.bombs,
            }),
        }
    }

    fn upgrades(&self) -> Upgrades {
        Upgrades {
            max_lives_bonus: self.max_lives_bonus,
            start_bombs_bonus: self.start_bombs_bonus,
            start_medkit_chance: self.start_medkit_chance,
            start_bomb_chance: self.start_bomb_chance,
            shop_discount: self.shop_discount,
        }
    }
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)
}

fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let actions = script::parse(&args.moves).context("invalid --moves script")?;
    let progress = args.progress()?;
    let rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut world = World::resume(progress, args.upgrades(), rng)
        .context("failed to generate the starting level")?;
    info!(seed = args.seed, level = progress.level, "session started");

    let mut events = Vec::new();
    for action in actions {
        let command = match action {
            Action::Apply(command) => command,
            Action::TogglePause => Command::SetPaused {
                paused: query::phase(&world) != Phase::Paused,
            },
        };
        world::apply(&mut world, command, &mut events).context("failed to generate a level")?;
    }

    writeln!(out, "{WELCOME_BANNER}")?;
    if args.events {
        for event in &events {
            writeln!(out, "event: {}", describe(event))?;
        }
    }
    write!(out, "{}", render_board(query::state(&world)))?;
    writeln!(out, "{}", status_line(&world))?;
    if let Some(message) = &query::state(&world).message {
        writeln!(out, "{message}")?;
    }

    let code = ProgressCode {
        progress: query::progress(&world),
    }
    .encode()
    .context("failed to encode progress")?;
    writeln!(out, "progress: {code}")?;
    Ok(())
}

fn render_board(state: &GameState) -> String {
    let mut board = String::new();
    let mut row = None;
    for position in state.grid.positions() {
        if row.is_some_and(|current| current != position.y()) {
            board.push('\n');
        }
        row = Some(position.y());
        board.push(glyph(state, position));
    }
    if row.is_some() {
        board.push('\n');
    }
    board
}

fn glyph(state: &GameState, position: Position) -> char {
    if state.player == position {
        '@'
    } else if state.enemies.contains(&position) {
        'E'
    } else if state.treasures.contains(&position) {
        'T'
    } else if state.medkits.contains(&position) {
        '+'
    } else if state.goal == position {
        'G'
    } else {
        state.grid.cell(position).map_or(' ', CellKind::glyph)
    }
}

fn status_line(world: &World) -> String {
    let state = query::state(world);
    let phase = match query::phase(world) {
        Phase::Playing => "playing",
        Phase::Paused => "paused",
        Phase::GameOver => "game over",
    };
    format!(
        "Level {} ({}) | Score {} | Lives {}/{} | Bombs {} | Treasures left {} | {phase}",
        state.level,
        query::biome(world).name(),
        state.score,
        state.lives,
        state.max_lives,
        state.bombs,
        state.treasures.len(),
    )
}

fn describe(event: &Event) -> String {
    match event {
        Event::Notice { notice } => format!("notice: {}", notice.text()),
        other => format!("{other:?}"),
    }
}
