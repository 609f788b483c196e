//! Canonical chess-rule constants.
//!
//! Static literals shared by the board authority, the PGN utilities and the
//! turn scheduler.

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock value at which the fifty-move rule draws the game.
pub const FIFTY_MOVE_RULE_HALFMOVES: u32 = 100;

/// Number of identical positions that ends the game by repetition.
pub const REPETITION_LIMIT: usize = 3;

/// Plies reverted by a single undo request (one human move and its reply).
pub const UNDO_PLIES: usize = 2;
