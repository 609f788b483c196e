//! Immutable game snapshot.
//!
//! `GameState` is a value: the position, the position it started from, the
//! played history and the repetition keys. Every change produces a new
//! snapshot (`with_move`, `rewound`), so a reader holding an older one never
//! sees a half-applied move.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_rules::{FIFTY_MOVE_RULE_HALFMOVES, REPETITION_LIMIT};
use crate::game_state::chess_types::*;

/// One half-move of history.
#[derive(Debug, Clone)]
pub struct Ply {
    pub mv: Move,
    /// Standard algebraic text including a check/mate suffix.
    pub san: String,
    before: Chess,
}

impl Ply {
    pub fn position_before(&self) -> &Chess {
        &self.before
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    initial: Chess,
    position: Chess,
    plies: Vec<Ply>,
    // One key per position reached, starting with `initial`.
    repetition_keys: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new_game()
    }
}

impl GameState {
    #[inline]
    pub fn new_game() -> Self {
        Self::from_position(Chess::default())
    }

    pub fn from_position(position: Chess) -> Self {
        let key = repetition_key(&position);
        Self {
            initial: position.clone(),
            position,
            plies: Vec::new(),
            repetition_keys: vec![key],
        }
    }

    pub fn from_fen(fen: &str) -> ControllerResult<Self> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ControllerError::Parse(format!("invalid FEN '{}': {e}", fen.trim())))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| ControllerError::Parse(format!("illegal FEN position: {e}")))?;
        Ok(Self::from_position(position))
    }

    #[inline]
    pub fn position(&self) -> &Chess {
        &self.position
    }

    #[inline]
    pub fn initial_position(&self) -> &Chess {
        &self.initial
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.turn()
    }

    pub fn fen(&self) -> String {
        position_fen(&self.position)
    }

    pub fn initial_fen(&self) -> String {
        position_fen(&self.initial)
    }

    #[inline]
    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    #[inline]
    pub fn ply_count(&self) -> usize {
        self.plies.len()
    }

    pub fn history(&self) -> Vec<Move> {
        self.plies.iter().map(|ply| ply.mv).collect()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.plies.last().map(|ply| ply.mv)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(Move::from_shakmaty)
            .collect()
    }

    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(Move::from_shakmaty)
            .filter(|mv| mv.from == square)
            .collect()
    }

    /// Distinct destinations reachable from `square`; the four promotion
    /// choices onto one square collapse into a single target.
    pub fn legal_targets(&self, square: Square) -> Vec<Target> {
        let mut targets = Vec::<Target>::new();
        for legal in self.position.legal_moves().iter() {
            let Some(mv) = Move::from_shakmaty(legal) else {
                continue;
            };
            if mv.from != square || targets.iter().any(|t| t.to == mv.to) {
                continue;
            }
            targets.push(Target {
                to: mv.to,
                capture: legal.is_capture(),
                promotion: mv.promotion.is_some(),
            });
        }
        targets
    }

    #[inline]
    pub fn has_legal_moves_from(&self, square: Square) -> bool {
        self.position
            .legal_moves()
            .iter()
            .any(|legal| Move::from_shakmaty(legal).is_some_and(|mv| mv.from == square))
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.find_legal(mv).is_some()
    }

    fn find_legal(&self, mv: Move) -> Option<shakmaty::Move> {
        self.position
            .legal_moves()
            .into_iter()
            .find(|legal| Move::from_shakmaty(legal) == Some(mv))
    }

    /// New snapshot with `mv` played. Fails without touching `self` unless
    /// `mv` is one of `legal_moves()`, promotion piece included.
    pub fn with_move(&self, mv: Move) -> ControllerResult<GameState> {
        let legal = self
            .find_legal(mv)
            .ok_or_else(|| ControllerError::IllegalMove(format!("{mv} in {}", self.fen())))?;

        let san = San::from_move(&self.position, &legal).to_string();
        let next = self
            .position
            .clone()
            .play(&legal)
            .map_err(|e| ControllerError::IllegalMove(format!("{mv}: {e}")))?;
        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };

        let mut out = self.clone();
        out.repetition_keys.push(repetition_key(&next));
        out.plies.push(Ply {
            mv,
            san: format!("{san}{suffix}"),
            before: std::mem::replace(&mut out.position, next),
        });
        Ok(out)
    }

    /// Snapshot with the last `plies` half-moves taken back, or `None` when
    /// fewer than that many were played.
    pub fn rewound(&self, plies: usize) -> Option<GameState> {
        if plies == 0 || plies > self.plies.len() {
            return None;
        }
        let keep = self.plies.len() - plies;
        let mut out = self.clone();
        out.position = out.plies[keep].before.clone();
        out.plies.truncate(keep);
        out.repetition_keys.truncate(keep + 1);
        Some(out)
    }

    /// How many times the current position has occurred, this one included.
    pub fn repetition_count(&self) -> usize {
        match self.repetition_keys.last() {
            Some(current) => self
                .repetition_keys
                .iter()
                .filter(|key| *key == current)
                .count(),
            None => 0,
        }
    }

    pub fn terminal_status(&self) -> TerminalStatus {
        let position = &self.position;
        if position.is_checkmate() {
            TerminalStatus::Checkmate {
                winner: position.turn().other(),
            }
        } else if position.is_stalemate() {
            TerminalStatus::Stalemate
        } else if position.is_insufficient_material() {
            TerminalStatus::InsufficientMaterial
        } else if self.repetition_count() >= REPETITION_LIMIT {
            TerminalStatus::ThreefoldRepetition
        } else if position.halfmoves() >= FIFTY_MOVE_RULE_HALFMOVES {
            TerminalStatus::Draw(DrawReason::FiftyMoveRule)
        } else {
            TerminalStatus::Ongoing
        }
    }
}

pub fn position_fen(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

// Board, side to move, castling rights and en-passant square: the fields
// that decide whether two positions repeat.
fn repetition_key(position: &Chess) -> String {
    position_fen(position)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::GameState;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::*;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    fn play(state: &GameState, tokens: &[&str]) -> GameState {
        tokens.iter().fold(state.clone(), |acc, token| {
            let mv = long_algebraic_to_move(token).expect("token should parse");
            acc.with_move(mv).expect("move should be legal")
        })
    }

    #[test]
    fn new_game_matches_starting_fen() {
        let state = GameState::new_game();
        assert_eq!(state.fen(), STARTING_POSITION_FEN);
        assert_eq!(state.legal_moves().len(), 20);
        assert_eq!(state.terminal_status(), TerminalStatus::Ongoing);
    }

    #[test]
    fn with_move_leaves_original_snapshot_untouched() {
        let start = GameState::new_game();
        let next = play(&start, &["e2e4"]);
        assert_eq!(start.fen(), STARTING_POSITION_FEN);
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.plies()[0].san, "e4");
    }

    #[test]
    fn every_legal_move_applies_and_nothing_else_does() {
        let state = GameState::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .expect("FEN should parse");
        let legal = state.legal_moves();
        for mv in &legal {
            assert!(state.with_move(*mv).is_ok(), "{mv} should apply");
        }
        for from in Square::ALL {
            for to in Square::ALL {
                let mv = Move::new(from, to);
                if from != to && !legal.contains(&mv) {
                    assert!(state.with_move(mv).is_err(), "{mv} should be rejected");
                }
            }
        }
    }

    #[test]
    fn promotion_presence_must_match_the_move() {
        let state = GameState::from_fen("8/4P3/8/8/8/8/8/k6K w - - 0 1").expect("FEN should parse");
        assert!(state.with_move(Move::new(Square::E7, Square::E8)).is_err());
        assert!(state
            .with_move(Move::with_promotion(
                Square::E7,
                Square::E8,
                PromotionPiece::Knight
            ))
            .is_ok());

        let quiet = GameState::new_game();
        assert!(quiet
            .with_move(Move::with_promotion(
                Square::E2,
                Square::E4,
                PromotionPiece::Queen
            ))
            .is_err());
    }

    #[test]
    fn legal_targets_mark_captures_and_collapse_promotions() {
        let state =
            GameState::from_fen("3r4/4P3/8/8/8/8/8/k6K w - - 0 1").expect("FEN should parse");
        let targets = state.legal_targets(Square::E7);
        assert_eq!(targets.len(), 2);
        let capture = targets
            .iter()
            .find(|t| t.to == Square::D8)
            .expect("capture target should exist");
        assert!(capture.capture && capture.promotion);
        let push = targets
            .iter()
            .find(|t| t.to == Square::E8)
            .expect("push target should exist");
        assert!(!push.capture && push.promotion);
    }

    #[test]
    fn castling_is_offered_as_king_two_square_step() {
        let state =
            GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("FEN should parse");
        assert!(state.is_legal(Move::new(Square::E1, Square::G1)));
        assert!(state.is_legal(Move::new(Square::E1, Square::C1)));
    }

    #[test]
    fn detects_checkmate_and_winner() {
        let state = play(&GameState::new_game(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(
            state.terminal_status(),
            TerminalStatus::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(state.plies()[3].san, "Qh4#");
    }

    #[test]
    fn detects_stalemate_and_insufficient_material() {
        let stalemate = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("FEN should parse");
        assert_eq!(stalemate.terminal_status(), TerminalStatus::Stalemate);

        let bare_kings = GameState::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").expect("FEN should parse");
        assert_eq!(
            bare_kings.terminal_status(),
            TerminalStatus::InsufficientMaterial
        );
    }

    #[test]
    fn detects_fifty_move_rule() {
        let state = GameState::from_fen("8/8/4k3/8/8/4K3/4R3/8 w - - 100 80").expect("FEN should parse");
        assert_eq!(
            state.terminal_status(),
            TerminalStatus::Draw(DrawReason::FiftyMoveRule)
        );
    }

    #[test]
    fn detects_threefold_repetition() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let once = play(&GameState::new_game(), &shuffle);
        assert_eq!(once.repetition_count(), 2);
        assert_eq!(once.terminal_status(), TerminalStatus::Ongoing);
        let twice = play(&once, &shuffle);
        assert_eq!(twice.repetition_count(), 3);
        assert_eq!(twice.terminal_status(), TerminalStatus::ThreefoldRepetition);
    }

    #[test]
    fn rewound_restores_earlier_position() {
        let state = play(&GameState::new_game(), &["e2e4", "e7e5", "g1f3"]);
        let back = state.rewound(2).expect("two plies should rewind");
        assert_eq!(back.ply_count(), 1);
        assert_eq!(back.side_to_move(), Color::Black);
        assert_eq!(back.fen(), play(&GameState::new_game(), &["e2e4"]).fen());
        assert!(state.rewound(4).is_none());
        assert!(state.rewound(0).is_none());
    }
}
