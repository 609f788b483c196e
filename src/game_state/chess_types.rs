//! Value types shared across the controller.
//!
//! Squares and colors come straight from the rule library; moves are kept in
//! a small coordinate form so gestures, engine tokens and history entries
//! all compare equal without carrying rule-library internals.

use std::fmt;

use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Role};

pub use shakmaty::{Color, Square};

/// Piece a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PromotionPiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionPiece {
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    #[inline]
    pub const fn role(self) -> Role {
        match self {
            PromotionPiece::Knight => Role::Knight,
            PromotionPiece::Bishop => Role::Bishop,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Queen => Role::Queen,
        }
    }

    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Knight => Some(PromotionPiece::Knight),
            Role::Bishop => Some(PromotionPiece::Bishop),
            Role::Rook => Some(PromotionPiece::Rook),
            Role::Queen => Some(PromotionPiece::Queen),
            _ => None,
        }
    }

    /// Lowercase letter used by UCI move tokens.
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            PromotionPiece::Knight => 'n',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Queen => 'q',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'n' => Some(PromotionPiece::Knight),
            'b' => Some(PromotionPiece::Bishop),
            'r' => Some(PromotionPiece::Rook),
            'q' => Some(PromotionPiece::Queen),
            _ => None,
        }
    }
}

/// A move in coordinate form. Castling is the king's two-square step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PromotionPiece>,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[inline]
    pub const fn with_promotion(from: Square, to: Square, piece: PromotionPiece) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Converts a rule-library move, returning `None` for drops and null moves.
    pub fn from_shakmaty(mv: &shakmaty::Move) -> Option<Self> {
        match UciMove::from_move(mv, CastlingMode::Standard) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Some(Self {
                from,
                to,
                promotion: promotion.and_then(PromotionPiece::from_role),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.to_char())?;
        }
        Ok(())
    }
}

/// A legal destination from one origin square, as offered to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub to: Square,
    pub capture: bool,
    pub promotion: bool,
}

/// Reason a game was drawn outside the dedicated terminal variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
}

/// Result of evaluating a snapshot for end-of-game conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
    InsufficientMaterial,
    ThreefoldRepetition,
}

impl TerminalStatus {
    #[inline]
    pub const fn is_ongoing(self) -> bool {
        matches!(self, TerminalStatus::Ongoing)
    }

    /// PGN result token for this status.
    pub const fn result_token(self) -> &'static str {
        match self {
            TerminalStatus::Ongoing => "*",
            TerminalStatus::Checkmate {
                winner: Color::White,
            } => "1-0",
            TerminalStatus::Checkmate {
                winner: Color::Black,
            } => "0-1",
            _ => "1/2-1/2",
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::Ongoing => write!(f, "game in progress"),
            TerminalStatus::Checkmate { winner } => {
                write!(f, "checkmate, {} wins", color_name(*winner))
            }
            TerminalStatus::Stalemate => write!(f, "draw by stalemate"),
            TerminalStatus::Draw(DrawReason::FiftyMoveRule) => {
                write!(f, "draw by the fifty-move rule")
            }
            TerminalStatus::InsufficientMaterial => write!(f, "draw by insufficient material"),
            TerminalStatus::ThreefoldRepetition => write!(f, "draw by threefold repetition"),
        }
    }
}

/// Capitalized side name as used in PGN tags and messages.
pub const fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
