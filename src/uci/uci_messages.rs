//! UCI protocol lines, controller side.
//!
//! Formats the commands sent to a search engine and classifies the lines it
//! prints back. Only `bestmove` carries meaning for the controller; the
//! handshake replies are kept for diagnostics and everything else is noise.

use std::fmt;

use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_types::Move;
use crate::utils::long_algebraic::long_algebraic_to_move;

const BESTMOVE_TOKEN: &str = "bestmove ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    UciNewGame,
    PositionFen(String),
    GoDepth(u8),
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => write!(f, "uci"),
            EngineCommand::IsReady => write!(f, "isready"),
            EngineCommand::UciNewGame => write!(f, "ucinewgame"),
            EngineCommand::PositionFen(fen) => write!(f, "position fen {fen}"),
            EngineCommand::GoDepth(depth) => write!(f, "go depth {depth}"),
            EngineCommand::Stop => write!(f, "stop"),
            EngineCommand::Quit => write!(f, "quit"),
        }
    }
}

#[derive(Debug)]
pub enum EngineMessage {
    UciOk,
    ReadyOk,
    IdName(String),
    /// Answer to a `go`. The token may be unusable, but the line still
    /// closes one outstanding search.
    BestMove(ControllerResult<Move>),
    Other,
}

pub fn parse_engine_line(line: &str) -> EngineMessage {
    let trimmed = line.trim();
    if let Some(index) = trimmed.find(BESTMOVE_TOKEN) {
        let rest = &trimmed[index + BESTMOVE_TOKEN.len()..];
        return EngineMessage::BestMove(decode_best_move(rest));
    }
    if trimmed == "bestmove" {
        return EngineMessage::BestMove(Err(ControllerError::EngineProtocol(
            "bestmove without a move token".to_owned(),
        )));
    }

    match trimmed {
        "uciok" => EngineMessage::UciOk,
        "readyok" => EngineMessage::ReadyOk,
        _ => match trimmed.strip_prefix("id name ") {
            Some(name) => EngineMessage::IdName(name.trim().to_owned()),
            None => EngineMessage::Other,
        },
    }
}

fn decode_best_move(rest: &str) -> ControllerResult<Move> {
    let token = rest.split_whitespace().next().ok_or_else(|| {
        ControllerError::EngineProtocol("bestmove without a move token".to_owned())
    })?;
    if token.len() != 4 && token.len() != 5 {
        return Err(ControllerError::EngineProtocol(format!(
            "unrecognized best move token '{token}'"
        )));
    }
    long_algebraic_to_move(token).map_err(|e| {
        ControllerError::EngineProtocol(format!("unrecognized best move token '{token}': {e}"))
    })
}
