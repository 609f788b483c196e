//! Long algebraic (UCI) move tokens.
//!
//! Converts between `Move` values and the 4-5 character tokens exchanged
//! with search engines and typed by the terminal front-end (`e2e4`, `e7e8q`).

use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_types::{Move, PromotionPiece, Square};

pub fn move_to_long_algebraic(mv: Move) -> String {
    mv.to_string()
}

/// Decode a long algebraic token. Legality is not checked here.
pub fn long_algebraic_to_move(long_algebraic: &str) -> ControllerResult<Move> {
    let token = long_algebraic.trim();
    if !token.is_ascii() || (token.len() != 4 && token.len() != 5) {
        return Err(ControllerError::Parse(format!(
            "invalid long algebraic move: {long_algebraic}"
        )));
    }

    let from = parse_square(&token[0..2])?;
    let to = parse_square(&token[2..4])?;
    if from == to {
        return Err(ControllerError::Parse(format!(
            "move does not change square: {token}"
        )));
    }

    let promotion = match token.chars().nth(4) {
        Some(ch) => Some(PromotionPiece::from_char(ch).ok_or_else(|| {
            ControllerError::Parse(format!("invalid promotion piece character: {ch}"))
        })?),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a coordinate such as `e4`.
pub fn parse_square(square: &str) -> ControllerResult<Square> {
    square
        .trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| ControllerError::Parse(format!("invalid square: {square}")))
}
