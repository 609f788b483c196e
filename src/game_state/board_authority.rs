//! Board state authority.
//!
//! Owns the single canonical `GameState` behind an `Arc` and is the only
//! place that replaces it. Commit, import, undo and reset all build a fresh
//! snapshot first and swap it in only on success, so a failed operation
//! leaves the previous snapshot in place.

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_rules::UNDO_PLIES;
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::utils::pgn::read_pgn;

/// Import text flavor, detected from the input itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Fen,
    Pgn,
}

impl ImportFormat {
    /// FEN is a single line whose first field has eight `/`-separated ranks.
    pub fn detect(text: &str) -> Self {
        let trimmed = text.trim();
        let first_field = trimmed.split_whitespace().next().unwrap_or_default();
        if !trimmed.contains('\n') && first_field.matches('/').count() == 7 {
            ImportFormat::Fen
        } else {
            ImportFormat::Pgn
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoardAuthority {
    current: Arc<GameState>,
}

impl BoardAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            current: Arc::new(state),
        }
    }

    /// Cheap handle to the current snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.current)
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.current
    }

    pub fn fen(&self) -> String {
        self.current.fen()
    }

    /// Legal moves of the side to move, optionally restricted to one origin.
    pub fn legal_moves(&self, square: Option<Square>) -> Vec<Move> {
        match square {
            Some(square) => self.current.legal_moves_from(square),
            None => self.current.legal_moves(),
        }
    }

    pub fn legal_targets(&self, square: Square) -> Vec<Target> {
        self.current.legal_targets(square)
    }

    pub fn terminal_status(&self) -> TerminalStatus {
        self.current.terminal_status()
    }

    pub fn apply_move(&mut self, mv: Move) -> ControllerResult<Arc<GameState>> {
        let next = self.current.with_move(mv)?;
        debug!(%mv, fen = %next.fen(), "move applied");
        Ok(self.replace(next))
    }

    pub fn load(&mut self, text: &str) -> ControllerResult<Arc<GameState>> {
        match ImportFormat::detect(text) {
            ImportFormat::Fen => self.load_fen(text),
            ImportFormat::Pgn => self.load_pgn(text),
        }
    }

    pub fn load_fen(&mut self, fen: &str) -> ControllerResult<Arc<GameState>> {
        let next = GameState::from_fen(fen)?;
        info!(fen = %next.fen(), "position imported");
        Ok(self.replace(next))
    }

    pub fn load_pgn(&mut self, pgn: &str) -> ControllerResult<Arc<GameState>> {
        let game = read_pgn(pgn)?;
        if game.state.ply_count() == 0 && game.headers.is_empty() {
            return Err(ControllerError::Parse(
                "PGN contains neither headers nor moves".to_owned(),
            ));
        }
        info!(plies = game.state.ply_count(), "game history imported");
        Ok(self.replace(game.state))
    }

    pub fn reset(&mut self) -> Arc<GameState> {
        self.replace(GameState::new_game())
    }

    /// Take back one human move and the reply to it. Fewer than two plies
    /// of history leaves everything as it was.
    pub fn undo_round_trip(&mut self) -> Option<Arc<GameState>> {
        let previous = self.current.rewound(UNDO_PLIES)?;
        Some(self.replace(previous))
    }

    fn replace(&mut self, next: GameState) -> Arc<GameState> {
        self.current = Arc::new(next);
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardAuthority, ImportFormat};
    use crate::errors::ControllerError;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::*;

    #[test]
    fn legal_moves_can_be_restricted_to_one_square() {
        let authority = BoardAuthority::new();
        let knight = authority.legal_moves(Some(Square::G1));
        assert_eq!(knight.len(), 2);
        assert!(knight.iter().all(|mv| mv.from == Square::G1));
        assert!(authority.legal_moves(Some(Square::E4)).is_empty());
    }

    #[test]
    fn rejected_move_keeps_the_same_snapshot() {
        let mut authority = BoardAuthority::new();
        let before = authority.snapshot();
        let err = authority
            .apply_move(Move::new(Square::E2, Square::E5))
            .expect_err("e2e5 should be illegal");
        assert!(matches!(err, ControllerError::IllegalMove(_)));
        assert!(std::sync::Arc::ptr_eq(&before, &authority.snapshot()));
    }

    #[test]
    fn older_snapshot_survives_a_commit() {
        let mut authority = BoardAuthority::new();
        let before = authority.snapshot();
        authority
            .apply_move(Move::new(Square::E2, Square::E4))
            .expect("e2e4 should apply");
        assert_eq!(before.fen(), STARTING_POSITION_FEN);
        assert_eq!(authority.state().ply_count(), 1);
    }

    #[test]
    fn invalid_import_preserves_prior_state() {
        let mut authority = BoardAuthority::new();
        authority
            .apply_move(Move::new(Square::D2, Square::D4))
            .expect("d2d4 should apply");
        let fen_before = authority.fen();

        for bad in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "not a position at all",
            "1. e4 e5 2. Ke3 Nc6",
            "[Event \"x\"]\n\n1. e4 e5 2. Qxf7",
        ] {
            let err = authority.load(bad).expect_err("import should fail");
            assert!(matches!(err, ControllerError::Parse(_)), "{bad}: {err}");
            assert_eq!(authority.fen(), fen_before);
        }
    }

    #[test]
    fn fen_and_pgn_imports_replace_the_state() {
        let mut authority = BoardAuthority::new();
        authority
            .load("8/8/4k3/8/8/4K3/4R3/8 w - - 3 40")
            .expect("FEN should import");
        assert_eq!(authority.fen(), "8/8/4k3/8/8/4K3/4R3/8 w - - 3 40");

        authority
            .load("1. e4 e5 2. Nf3 Nc6 *")
            .expect("PGN should import");
        assert_eq!(authority.state().ply_count(), 4);
        assert_eq!(authority.state().side_to_move(), Color::White);
    }

    #[test]
    fn undo_needs_two_plies() {
        let mut authority = BoardAuthority::new();
        assert!(authority.undo_round_trip().is_none());

        authority
            .apply_move(Move::new(Square::E2, Square::E4))
            .expect("e2e4 should apply");
        assert!(authority.undo_round_trip().is_none());
        assert_eq!(authority.state().ply_count(), 1);

        authority
            .apply_move(Move::new(Square::E7, Square::E5))
            .expect("e7e5 should apply");
        authority.undo_round_trip().expect("undo should apply");
        assert_eq!(authority.fen(), STARTING_POSITION_FEN);
    }

    #[test]
    fn detects_import_format() {
        assert_eq!(
            ImportFormat::detect(STARTING_POSITION_FEN),
            ImportFormat::Fen
        );
        assert_eq!(ImportFormat::detect("1. e4 e5"), ImportFormat::Pgn);
        assert_eq!(
            ImportFormat::detect("[Event \"?\"]\n1. d4"),
            ImportFormat::Pgn
        );
    }
}
