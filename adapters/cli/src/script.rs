//! Single-character command scripts for headless runs.

use anyhow::{bail, Result};
use spirit_crypt_core::{Direction, ItemAction, PlayerCommand};

/// Help text listing every script character.
pub(crate) const SCRIPT_HELP: &str = "\
n e s w .  step north, east, south, west or wait
N E S W    step with the possession modifier held
a p x      activate, push or describe (follow with a direction)
g          pick up
< >        use stairs
1-9        choose a slot or prompt option
u d m      use, drop or move the chosen item
c          cancel the pending prompt";

/// Parses a script into commands, ignoring whitespace.
pub(crate) fn parse(script: &str) -> Result<Vec<PlayerCommand>> {
    script
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .enumerate()
        .map(|(index, ch)| match command(ch) {
            Some(command) => Ok(command),
            None => bail!("unknown script command `{ch}` at position {}", index + 1),
        })
        .collect()
}

fn command(ch: char) -> Option<PlayerCommand> {
    let step = |direction, possess| PlayerCommand::Step { direction, possess };
    let command = match ch {
        'n' => step(Direction::North, false),
        'e' => step(Direction::East, false),
        's' => step(Direction::South, false),
        'w' => step(Direction::West, false),
        '.' => step(Direction::Here, false),
        'N' => step(Direction::North, true),
        'E' => step(Direction::East, true),
        'S' => step(Direction::South, true),
        'W' => step(Direction::West, true),
        'a' => PlayerCommand::Activate,
        'p' => PlayerCommand::Push,
        'x' => PlayerCommand::Describe,
        'g' => PlayerCommand::PickUp,
        '<' | '>' => PlayerCommand::UseStairs,
        'u' => PlayerCommand::ItemAction(ItemAction::Use),
        'd' => PlayerCommand::ItemAction(ItemAction::Drop),
        'm' => PlayerCommand::ItemAction(ItemAction::Move),
        'c' => PlayerCommand::Cancel,
        '1'..='9' => PlayerCommand::Choose {
            number: ch.to_digit(10).and_then(|digit| u8::try_from(digit).ok())?,
        },
        _ => return None,
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_ignored() {
        let commands = parse("E e\n a e").expect("valid script");
        assert_eq!(
            commands,
            vec![
                PlayerCommand::Step {
                    direction: Direction::East,
                    possess: true,
                },
                PlayerCommand::Step {
                    direction: Direction::East,
                    possess: false,
                },
                PlayerCommand::Activate,
                PlayerCommand::Step {
                    direction: Direction::East,
                    possess: false,
                },
            ]
        );
    }

    #[test]
    fn digits_choose_entries() {
        let commands = parse("3u").expect("valid script");
        assert_eq!(
            commands,
            vec![
                PlayerCommand::Choose { number: 3 },
                PlayerCommand::ItemAction(ItemAction::Use),
            ]
        );
    }

    #[test]
    fn unknown_characters_are_rejected() {
        let error = parse("e ? e").expect_err("invalid script");
        assert_eq!(
            error.to_string(),
            "unknown script command `?` at position 2"
        );
    }
}
