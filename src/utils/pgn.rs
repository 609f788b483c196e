//! PGN import and export.
//!
//! Reading replays the movetext through `GameState`, so every imported move
//! is checked for legality; SAN is expected, UCI long algebraic is accepted
//! as a fallback. Writing emits the seven-tag roster and SAN movetext.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::Local;
use shakmaty::san::San;
use shakmaty::Position;

use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::{Color, Move};
use crate::game_state::game_state::GameState;
use crate::utils::long_algebraic::long_algebraic_to_move;

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Clone)]
pub struct PgnGame {
    pub headers: BTreeMap<String, String>,
    /// Final position with the full replayed history.
    pub state: GameState,
    pub result: String,
}

/// Seven-tag roster for `state`, dated today. A game that did not start from
/// the initial position also gets `SetUp` and `FEN`.
pub fn default_headers(state: &GameState, result: &str) -> BTreeMap<String, String> {
    let date = Local::now().format("%Y.%m.%d").to_string();
    let mut headers: BTreeMap<String, String> = [
        ("Event", "Plum Versus Game"),
        ("Site", "Local"),
        ("Date", date.as_str()),
        ("Round", "-"),
        ("White", "White"),
        ("Black", "Black"),
        ("Result", result_or_unknown(result)),
    ]
    .into_iter()
    .map(|(tag, value)| (tag.to_owned(), value.to_owned()))
    .collect();

    let initial_fen = state.initial_fen();
    if initial_fen != STARTING_POSITION_FEN {
        headers.insert("SetUp".to_owned(), "1".to_owned());
        headers.insert("FEN".to_owned(), initial_fen);
    }
    headers
}

pub fn write_pgn(state: &GameState, result: &str) -> String {
    write_pgn_with_headers(state, &default_headers(state, result))
}

pub fn write_pgn_with_headers(state: &GameState, headers: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (tag, value) in headers {
        let _ = writeln!(out, "[{tag} \"{}\"]", value.replace('"', "\\\""));
    }
    out.push('\n');

    let initial = state.initial_position();
    let mut move_number = initial.fullmoves().get();
    let mut side = initial.turn();
    let mut tokens = Vec::<String>::with_capacity(state.ply_count() + 1);
    for (index, ply) in state.plies().iter().enumerate() {
        match side {
            Color::White => tokens.push(format!("{move_number}. {}", ply.san)),
            // A game starting with Black on move opens with "N...".
            Color::Black if index == 0 => tokens.push(format!("{move_number}... {}", ply.san)),
            Color::Black => tokens.push(ply.san.clone()),
        }
        if side == Color::Black {
            move_number += 1;
        }
        side = side.other();
    }

    let result = headers
        .get("Result")
        .map_or("*", |value| result_or_unknown(value));
    tokens.push(result.to_owned());
    let _ = writeln!(out, "{}", tokens.join(" "));
    out
}

pub fn read_pgn(pgn: &str) -> ControllerResult<PgnGame> {
    let mut headers = BTreeMap::<String, String>::new();
    let mut movetext = String::new();

    for line in pgn.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        if line.starts_with('[') {
            let (tag, value) = parse_tag_pair(line)?;
            headers.insert(tag, value);
        } else {
            movetext.push_str(line);
            movetext.push(' ');
        }
    }

    let mut state = match (headers.get("FEN"), headers.get("SetUp")) {
        (Some(fen), _) => GameState::from_fen(fen)?,
        (None, Some(setup)) if setup == "1" => {
            return Err(ControllerError::Parse(
                "PGN declares SetUp 1 without a FEN tag".to_owned(),
            ));
        }
        (None, _) => GameState::new_game(),
    };

    let mut result = None;
    for raw in remove_comments_and_variations(&movetext).split_whitespace() {
        let token = without_move_number(raw);
        if token.is_empty() || token.starts_with('$') {
            continue;
        }
        let token = token.trim_end_matches(['+', '#', '!', '?']);
        if RESULT_TOKENS.contains(&token) {
            result = Some(token.to_owned());
            break;
        }

        let mv = movetext_move(token, &state)?;
        state = state
            .with_move(mv)
            .map_err(|e| ControllerError::Parse(format!("PGN move '{raw}': {e}")))?;
    }

    let result = match result {
        Some(token) if token != "*" => token,
        _ => headers
            .get("Result")
            .map_or("*", |value| result_or_unknown(value))
            .to_owned(),
    };

    Ok(PgnGame {
        headers,
        state,
        result,
    })
}

fn movetext_move(token: &str, state: &GameState) -> ControllerResult<Move> {
    let from_san = token
        .parse::<San>()
        .ok()
        .and_then(|san| san.to_move(state.position()).ok());
    if let Some(legal) = from_san {
        return Move::from_shakmaty(&legal)
            .ok_or_else(|| ControllerError::Parse(format!("unsupported PGN move '{token}'")));
    }

    match long_algebraic_to_move(token) {
        Ok(mv) if state.is_legal(mv) => Ok(mv),
        _ => Err(ControllerError::Parse(format!(
            "PGN move '{token}' is not legal after {} plies",
            state.ply_count()
        ))),
    }
}

/// `[Tag "value"]` with `\"` escapes inside the value.
fn parse_tag_pair(line: &str) -> ControllerResult<(String, String)> {
    let invalid = || ControllerError::Parse(format!("invalid PGN tag pair: {line}"));

    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(invalid)?;
    let (tag, quoted) = inner.split_once(char::is_whitespace).ok_or_else(invalid)?;
    let value = quoted
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(invalid)?;
    if tag.is_empty() {
        return Err(invalid());
    }
    Ok((tag.to_owned(), value.replace("\\\"", "\"")))
}

/// Drops `{...}` comments and `(...)` variations, nested ones included.
fn remove_comments_and_variations(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut in_comment = false;
    let mut variation_depth = 0usize;

    for ch in text.chars() {
        match ch {
            '{' if !in_comment => in_comment = true,
            '}' if in_comment => in_comment = false,
            _ if in_comment => {}
            '(' => variation_depth += 1,
            ')' => variation_depth = variation_depth.saturating_sub(1),
            _ if variation_depth == 0 => kept.push(ch),
            _ => {}
        }
    }
    kept
}

// "12." / "12..." / "12.e4" → "" / "" / "e4"
fn without_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == token.len() || !rest.starts_with('.') {
        return token;
    }
    rest.trim_start_matches('.')
}

fn result_or_unknown(result: &str) -> &str {
    if RESULT_TOKENS.contains(&result) {
        result
    } else {
        "*"
    }
}

#[cfg(test)]
mod tests {
    use super::{read_pgn, write_pgn, write_pgn_with_headers};
    use std::collections::BTreeMap;

    use crate::errors::ControllerError;
    use crate::game_state::chess_types::Color;
    use crate::game_state::game_state::GameState;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    fn play(state: GameState, tokens: &[&str]) -> GameState {
        tokens.iter().fold(state, |acc, token| {
            let mv = long_algebraic_to_move(token).expect("token should parse");
            acc.with_move(mv).expect("move should be legal")
        })
    }

    #[test]
    fn pgn_round_trip_start_position_history() {
        let game = play(GameState::new_game(), &["e2e4", "e7e5", "g1f3", "b8c6"]);

        let pgn = write_pgn(&game, "*");
        assert!(pgn.contains("1. e4 e5 2. Nf3 Nc6 *"));
        let parsed = read_pgn(&pgn).expect("PGN should parse");

        assert_eq!(parsed.state.history(), game.history());
        assert_eq!(parsed.state.fen(), game.fen());
        assert_eq!(parsed.result, "*");
    }

    #[test]
    fn pgn_round_trip_custom_fen_setup_with_black_to_move() {
        let initial =
            GameState::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 7").expect("FEN should parse");
        let game = play(initial.clone(), &["e8d7", "e2e4"]);

        let mut headers = BTreeMap::<String, String>::new();
        headers.insert("Event".to_owned(), "Custom".to_owned());
        headers.insert("Result".to_owned(), "1-0".to_owned());
        headers.insert("SetUp".to_owned(), "1".to_owned());
        headers.insert("FEN".to_owned(), initial.fen());

        let pgn = write_pgn_with_headers(&game, &headers);
        assert!(pgn.contains("7... Kd7 8. e4 1-0"), "{pgn}");
        let parsed = read_pgn(&pgn).expect("PGN should parse");

        assert_eq!(parsed.state.initial_fen(), initial.fen());
        assert_eq!(parsed.state.history(), game.history());
        assert_eq!(parsed.result, "1-0");
    }

    #[test]
    fn movetext_noise_is_skipped() {
        let pgn = "[Event \"Noise\"]\n\n1.e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3! $1 Nc6?! 3. Bb5 a6 1/2-1/2";
        let parsed = read_pgn(pgn).expect("PGN should parse");
        assert_eq!(parsed.state.ply_count(), 6);
        assert_eq!(parsed.state.side_to_move(), Color::White);
        assert_eq!(parsed.result, "1/2-1/2");
    }

    #[test]
    fn long_algebraic_movetext_is_accepted() {
        let parsed = read_pgn("1. e2e4 e7e5 2. e1e2 *").expect("PGN should parse");
        assert_eq!(parsed.state.ply_count(), 3);
        assert_eq!(parsed.state.plies()[2].san, "Ke2");
    }

    #[test]
    fn illegal_movetext_is_a_parse_error() {
        let err = read_pgn("1. e4 e5 2. Bxf7").expect_err("Bxf7 should fail");
        assert!(matches!(err, ControllerError::Parse(_)));

        let err = read_pgn("[SetUp \"1\"]\n1. e4").expect_err("missing FEN should fail");
        assert!(matches!(err, ControllerError::Parse(_)));
    }
}
