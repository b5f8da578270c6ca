//! Per-turn rules: player movement, pickups, enemy pursuit, and collisions.

use std::collections::HashSet;

use maze_chase_core::{
    primary_safe_distance, CellKind, Direction, Event, Notice, Position, GAME_OVER_MESSAGE,
    LEVEL_CLEARED_MESSAGE,
};
use maze_chase_system_pathfinding::{distances_from, next_step};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, trace};

use crate::state::GameState;

const TREASURE_SCORE: u32 = 10;
const MEDKIT_SCORE: u32 = 5;
const HIT_PENALTY: u32 = 15;
const CLEAR_BONUS_BASE: u32 = 50;
const CLEAR_BONUS_PER_LEVEL: u32 = 10;
const CRYSTALS_BASE: u32 = 5;

/// How a resolved step left the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TurnOutcome {
    /// Play continues normally.
    Continued,
    /// The player escaped through the portal.
    Cleared,
    /// The player lost their last life.
    Defeated,
}

/// Cell the player would enter, or `None` when the step bumps into a wall.
pub(crate) fn destination(state: &GameState, direction: Direction) -> Option<Position> {
    let candidate = state.player.offset(direction);
    state.grid.is_passable(candidate).then_some(candidate)
}

/// Resolves a legal player move into `to` and everything that follows it.
pub(crate) fn take_turn<R>(
    state: &mut GameState,
    to: Position,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> TurnOutcome
where
    R: Rng + ?Sized,
{
    let from = state.player;
    state.player = to;
    out_events.push(Event::PlayerMoved { from, to });

    if state.enemies.contains(&to) {
        return resolve_hit(state, to, rng, out_events);
    }

    collect_pickups(state, out_events);

    if state.player == state.goal && state.treasures.is_empty() {
        clear_level(state, out_events);
        return TurnOutcome::Cleared;
    }

    enemy_turn(state, rng, out_events);

    let player = state.player;
    if state.enemies.contains(&player) {
        return resolve_hit(state, player, rng, out_events);
    }

    TurnOutcome::Continued
}

fn collect_pickups(state: &mut GameState, out_events: &mut Vec<Event>) {
    let at = state.player;

    if state.treasures.remove(&at) {
        state.score = state.score.saturating_add(TREASURE_SCORE);
        out_events.push(Event::TreasureCollected {
            at,
            remaining: state.treasures.len(),
        });
    }

    if state.medkits.remove(&at) {
        state.lives = state.lives.saturating_add(1).min(state.max_lives);
        state.score = state.score.saturating_add(MEDKIT_SCORE);
        out_events.push(Event::MedkitCollected {
            at,
            lives: state.lives,
        });
    }
}

fn clear_level(state: &mut GameState, out_events: &mut Vec<Event>) {
    let bonus = CLEAR_BONUS_BASE.saturating_add(state.level.saturating_mul(CLEAR_BONUS_PER_LEVEL));
    state.score = state.score.saturating_add(bonus);
    state.message = Some(LEVEL_CLEARED_MESSAGE.to_owned());
    debug!(level = state.level, score = state.score, "level cleared");
    out_events.push(Event::LevelCleared {
        level: state.level,
        bonus,
    });
    out_events.push(Event::CrystalsAwarded {
        amount: CRYSTALS_BASE.saturating_add(state.level),
    });
}

/// Advances every enemy toward the player in list order.
///
/// Each enemy claims its final cell before the next one moves, so two enemies
/// never end a turn stacked on the same cell.
pub(crate) fn enemy_turn<R>(state: &mut GameState, rng: &mut R, out_events: &mut Vec<Event>)
where
    R: Rng + ?Sized,
{
    let steps = state.config.enemy_steps;
    let mut occupied: HashSet<Position> = state.enemies.iter().copied().collect();
    let mut resolved = Vec::with_capacity(state.enemies.len());

    for (index, &origin) in state.enemies.iter().enumerate() {
        let _ = occupied.remove(&origin);
        let mut current = origin;

        for _ in 0..steps {
            let next = next_step(&state.grid, current, state.player).unwrap_or_else(|| {
                let options: Vec<Position> = state.grid.passable_neighbors(current).collect();
                options.choose(rng).copied().unwrap_or(current)
            });
            if occupied.contains(&next) {
                break;
            }
            current = next;
            if current == state.player {
                break;
            }
        }

        if current != origin {
            trace!(index, %origin, %current, "enemy moved");
            out_events.push(Event::EnemyMoved {
                index,
                from: origin,
                to: current,
            });
        }
        resolved.push(current);
        let _ = occupied.insert(current);
    }

    state.enemies = resolved;
}

/// Applies the penalty for an enemy catching the player at `at`.
pub(crate) fn resolve_hit<R>(
    state: &mut GameState,
    at: Position,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> TurnOutcome
where
    R: Rng + ?Sized,
{
    state.lives = state.lives.saturating_sub(1);
    state.score = state.score.saturating_sub(HIT_PENALTY);
    state.player = state.start;
    debug!(%at, lives = state.lives, score = state.score, "player hit");
    out_events.push(Event::PlayerHit {
        at,
        lives: state.lives,
    });

    knock_back(state, at, rng, out_events);

    if state.lives == 0 {
        state.message = Some(GAME_OVER_MESSAGE.to_owned());
        debug!(level = state.level, score = state.score, "game over");
        out_events.push(Event::GameOver { score: state.score });
        return TurnOutcome::Defeated;
    }

    TurnOutcome::Continued
}

/// Relocates every enemy standing on `at` far away from the respawned player.
fn knock_back<R>(state: &mut GameState, at: Position, rng: &mut R, out_events: &mut Vec<Event>)
where
    R: Rng + ?Sized,
{
    let minimum = primary_safe_distance(state.grid.width(), state.grid.height());
    let field = distances_from(&state.grid, state.player);
    let mut candidates: Vec<Position> = field
        .iter()
        .filter(|(position, distance)| *distance >= minimum && *position != state.player)
        .map(|(position, _)| position)
        .collect();
    if candidates.is_empty() {
        return;
    }
    candidates.shuffle(rng);

    let mut occupied: HashSet<Position> = state.enemies.iter().copied().collect();
    for (index, enemy) in state.enemies.iter_mut().enumerate() {
        if *enemy != at {
            continue;
        }
        let _ = occupied.remove(&at);
        let Some(&landing) = candidates.iter().find(|cell| !occupied.contains(*cell)) else {
            let _ = occupied.insert(at);
            continue;
        };
        *enemy = landing;
        let _ = occupied.insert(landing);
        out_events.push(Event::EnemyKnockedBack {
            index,
            from: at,
            to: landing,
        });
    }
}

/// Detonates a bomb against a random adjacent interior wall.
///
/// Returns whether the grid changed. Border walls are never targeted.
pub(crate) fn use_bomb<R>(state: &mut GameState, rng: &mut R, out_events: &mut Vec<Event>) -> bool
where
    R: Rng + ?Sized,
{
    if state.bombs == 0 {
        out_events.push(Event::Notice {
            notice: Notice::NoBombs,
        });
        return false;
    }

    let targets: Vec<Position> = state
        .player
        .neighbors4()
        .into_iter()
        .filter(|cell| state.grid.is_wall(*cell) && !state.grid.is_border(*cell))
        .collect();
    let Some(&target) = targets.choose(rng) else {
        out_events.push(Event::Notice {
            notice: Notice::NoWallNearby,
        });
        return false;
    };

    let _ = state.grid.set(target, CellKind::Floor);
    state.bombs -= 1;
    out_events.push(Event::WallDemolished {
        at: target,
        bombs: state.bombs,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::{destination, enemy_turn, resolve_hit, take_turn, use_bomb, TurnOutcome};
    use crate::state::GameState;
    use maze_chase_core::{Direction, Event, Notice, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn walls_block_destination() {
        let state = GameState::from_layout(1, &["#####", "#S..#", "#.#.#", "#..G#", "#####"])
            .expect("layout");
        assert_eq!(destination(&state, Direction::North), None);
        assert_eq!(destination(&state, Direction::West), None);
        assert_eq!(
            destination(&state, Direction::East),
            Some(Position::new(2, 1))
        );
    }

    #[test]
    fn later_enemy_waits_behind_a_claimed_cell() {
        let mut state = GameState::from_layout(
            1,
            &["#######", "#S..E.#", "###E###", "#G....#", "#######"],
        )
        .expect("layout");
        let mut events = Vec::new();

        enemy_turn(&mut state, &mut rng(), &mut events);

        assert_eq!(
            state.enemies,
            vec![Position::new(3, 1), Position::new(3, 2)]
        );
        assert_eq!(
            events,
            vec![Event::EnemyMoved {
                index: 0,
                from: Position::new(4, 1),
                to: Position::new(3, 1),
            }]
        );
    }

    #[test]
    fn trapped_enemy_wanders_or_stays() {
        let mut state = GameState::from_layout(
            1,
            &["#######", "#S.#..#", "#..#E.#", "#..#.G#", "#######"],
        )
        .expect("layout");
        let mut events = Vec::new();

        enemy_turn(&mut state, &mut rng(), &mut events);

        let enemy = state.enemies[0];
        assert!(Position::new(4, 2).neighbors4().contains(&enemy));
        assert!(enemy.x() >= 4, "enemy crossed the wall");
    }

    #[test]
    fn hits_floor_lives_and_score_at_zero() {
        let mut state = GameState::from_layout(1, &["#####", "#S.E#", "#...#", "#..G#", "#####"])
            .expect("layout");
        state.lives = 1;
        state.score = 4;
        let mut events = Vec::new();

        let outcome = resolve_hit(&mut state, Position::new(3, 1), &mut rng(), &mut events);

        assert_eq!(outcome, TurnOutcome::Defeated);
        assert_eq!((state.lives, state.score), (0, 0));
        assert_eq!(state.player, state.start);
        assert_eq!(state.message.as_deref(), Some("Game over"));
        assert!(events.contains(&Event::GameOver { score: 0 }));
    }

    #[test]
    fn pickups_are_collected_once() {
        let mut state = GameState::from_layout(
            1,
            &["######", "#STM.#", "#....#", "#...G#", "######"],
        )
        .expect("layout");
        state.lives = 2;
        let mut events = Vec::new();

        let _ = take_turn(&mut state, Position::new(2, 1), &mut rng(), &mut events);
        assert_eq!(state.score, 10);
        assert!(state.treasures.is_empty());

        let _ = take_turn(&mut state, Position::new(3, 1), &mut rng(), &mut events);
        assert_eq!(state.score, 15);
        assert_eq!(state.lives, 3);
        assert!(state.medkits.is_empty());

        let _ = take_turn(&mut state, Position::new(2, 1), &mut rng(), &mut events);
        assert_eq!(state.score, 15);
    }

    #[test]
    fn bomb_skips_border_walls() {
        let mut state = GameState::from_layout(1, &["#####", "#S..#", "#...#", "#..G#", "#####"])
            .expect("layout");
        state.bombs = 1;
        let before = state.grid.clone();
        let mut events = Vec::new();

        assert!(!use_bomb(&mut state, &mut rng(), &mut events));

        assert_eq!(state.grid, before);
        assert_eq!(state.bombs, 1);
        assert_eq!(
            events,
            vec![Event::Notice {
                notice: Notice::NoWallNearby,
            }]
        );
    }
}
