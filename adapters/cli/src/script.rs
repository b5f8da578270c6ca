use std::{error::Error, fmt};

use maze_chase_core::{Command, Direction};

/// Single action decoded from a move script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    /// Forward the command to the world unchanged.
    Apply(Command),
    /// Flip between paused and playing based on the current phase.
    TogglePause,
}

/// Decodes a move script into actions.
///
/// `w a s d` step north, west, south and east; `b` detonates a bomb, `u`
/// undoes, `n` advances to the next level, `r` restarts, `p` toggles pause
/// and `$` buys a bomb. Whitespace is ignored.
pub(crate) fn parse(script: &str) -> Result<Vec<Action>, ScriptError> {
    script
        .chars()
        .enumerate()
        .filter(|(_, symbol)| !symbol.is_whitespace())
        .map(|(offset, symbol)| decode(symbol).ok_or(ScriptError { symbol, offset }))
        .collect()
}

fn decode(symbol: char) -> Option<Action> {
    let step = |direction| Some(Action::Apply(Command::Step { direction }));
    match symbol.to_ascii_lowercase() {
        'w' => step(Direction::North),
        'a' => step(Direction::West),
        's' => step(Direction::South),
        'd' => step(Direction::East),
        'b' => Some(Action::Apply(Command::UseBomb)),
        'u' => Some(Action::Apply(Command::Undo)),
        'n' => Some(Action::Apply(Command::NextLevel)),
        'r' => Some(Action::Apply(Command::Restart)),
        '$' => Some(Action::Apply(Command::BuyBomb)),
        'p' => Some(Action::TogglePause),
        _ => None,
    }
}

/// A character outside the script alphabet.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ScriptError {
    symbol: char,
    offset: usize,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown move '{}' at position {}",
            self.symbol, self.offset
        )
    }
}

impl Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_symbol() {
        let actions = parse("wasd bunr$p").expect("script parses");
        assert_eq!(
            actions,
            vec![
                Action::Apply(Command::Step {
                    direction: Direction::North
                }),
                Action::Apply(Command::Step {
                    direction: Direction::West
                }),
                Action::Apply(Command::Step {
                    direction: Direction::South
                }),
                Action::Apply(Command::Step {
                    direction: Direction::East
                }),
                Action::Apply(Command::UseBomb),
                Action::Apply(Command::Undo),
                Action::Apply(Command::NextLevel),
                Action::Apply(Command::Restart),
                Action::Apply(Command::BuyBomb),
                Action::TogglePause,
            ]
        );
    }

    #[test]
    fn whitespace_only_script_is_empty() {
        assert_eq!(parse(" \n\t ").expect("script parses"), Vec::new());
    }

    #[test]
    fn unknown_symbols_report_their_offset() {
        let error = parse("dd x").expect_err("script rejected");
        assert_eq!(
            error,
            ScriptError {
                symbol: 'x',
                offset: 3,
            }
        );
        assert_eq!(error.to_string(), "unknown move 'x' at position 3");
    }
}
