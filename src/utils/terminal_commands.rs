//! Line commands for the terminal front-end.
//!
//! One command per line. A bare square name is shorthand for `click`.

use std::path::PathBuf;

use crate::engines::skill_level::SkillLevel;
use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_types::{PromotionPiece, Square};
use crate::utils::long_algebraic::parse_square;

pub const HELP_TEXT: &str = "\
commands:
  <sq> | click <sq>     select a piece or a destination (e.g. e2, then e4)
  drop <from> <to>      move in one gesture
  mark <sq>             toggle a mark on a square
  promote <q|r|b|n>     answer a pending promotion
  cancel                dismiss a pending promotion
  undo                  take back your last move and the reply
  new                   start a new game
  level <random|easy|medium|hard|N>
  fen <FEN>             import a position
  pgn <text>            import a game
  load <file>           import FEN or PGN from a file
  export                print the game as PGN
  board                 redraw the board
  help                  show this text
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Click(Square),
    Mark(Square),
    Drop(Square, Square),
    Promote(PromotionPiece),
    Cancel,
    Undo,
    NewGame,
    Level(SkillLevel),
    Fen(String),
    Pgn(String),
    Load(PathBuf),
    Export,
    Board,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> ControllerResult<Option<TerminalCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "click" | "c" => TerminalCommand::Click(parse_square(required(keyword, rest)?)?),
        "mark" | "m" => TerminalCommand::Mark(parse_square(required(keyword, rest)?)?),
        "drop" | "d" => {
            let mut squares = rest.split_whitespace();
            match (squares.next(), squares.next(), squares.next()) {
                (Some(from), Some(to), None) => {
                    TerminalCommand::Drop(parse_square(from)?, parse_square(to)?)
                }
                _ => return Err(usage("drop <from> <to>")),
            }
        }
        "promote" | "p" => {
            let piece = required(keyword, rest)?
                .chars()
                .next()
                .and_then(PromotionPiece::from_char)
                .ok_or_else(|| usage("promote <q|r|b|n>"))?;
            TerminalCommand::Promote(piece)
        }
        "cancel" => TerminalCommand::Cancel,
        "undo" | "u" => TerminalCommand::Undo,
        "new" => TerminalCommand::NewGame,
        "level" | "skill" => TerminalCommand::Level(required(keyword, rest)?.parse()?),
        "fen" => TerminalCommand::Fen(required(keyword, rest)?.to_owned()),
        "pgn" => TerminalCommand::Pgn(required(keyword, rest)?.to_owned()),
        "load" => TerminalCommand::Load(PathBuf::from(required(keyword, rest)?)),
        "export" => TerminalCommand::Export,
        "board" | "b" => TerminalCommand::Board,
        "help" | "?" => TerminalCommand::Help,
        "quit" | "exit" | "q" => TerminalCommand::Quit,
        _ if rest.is_empty() => match parse_square(keyword) {
            Ok(square) => TerminalCommand::Click(square),
            Err(_) => return Err(unknown(keyword)),
        },
        _ => return Err(unknown(keyword)),
    };
    Ok(Some(command))
}

fn required<'a>(keyword: &str, rest: &'a str) -> ControllerResult<&'a str> {
    if rest.is_empty() {
        Err(ControllerError::Parse(format!("'{keyword}' needs an argument")))
    } else {
        Ok(rest)
    }
}

fn usage(form: &str) -> ControllerError {
    ControllerError::Parse(format!("usage: {form}"))
}

fn unknown(keyword: &str) -> ControllerError {
    ControllerError::Parse(format!("unknown command '{keyword}' (try 'help')"))
}
