//! Square annotations derived from the current snapshot.
//!
//! `annotate` is a pure function of the game state, the pending selection
//! and the user's right-click marks. It never mutates anything; renderers
//! call it whenever they need a fresh overlay.

use std::collections::BTreeSet;

use crate::game_state::chess_types::Square;
use crate::game_state::game_state::GameState;
use crate::interaction::selection::PendingSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Origin of the last move played.
    LastMoveFrom,
    /// Destination of the last move played.
    LastMoveTo,
    /// Currently selected piece.
    Source,
    /// Legal destination onto an empty square.
    QuietTarget,
    /// Legal destination that takes a piece (en passant included).
    CaptureTarget,
    /// Destination waiting for the promotion choice.
    PromotionTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SquareAnnotation {
    pub highlight: Option<Highlight>,
    pub user_marked: bool,
}

impl SquareAnnotation {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.highlight.is_none() && !self.user_marked
    }
}

/// Right-click marks. They survive moves and are only cleared explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMarks {
    squares: BTreeSet<Square>,
}

impl UserMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the mark on `square`; returns whether it is now marked.
    pub fn toggle(&mut self, square: Square) -> bool {
        if self.squares.remove(&square) {
            false
        } else {
            self.squares.insert(square);
            true
        }
    }

    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        self.squares.contains(&square)
    }

    pub fn clear(&mut self) {
        self.squares.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.squares.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotations {
    squares: [SquareAnnotation; 64],
}

impl Annotations {
    #[inline]
    pub fn get(&self, square: Square) -> SquareAnnotation {
        self.squares[square as usize]
    }

    #[inline]
    pub fn highlight(&self, square: Square) -> Option<Highlight> {
        self.get(square).highlight
    }

    /// Annotated squares only, a1 first.
    pub fn iter(&self) -> impl Iterator<Item = (Square, SquareAnnotation)> + '_ {
        Square::ALL
            .into_iter()
            .map(|square| (square, self.get(square)))
            .filter(|(_, annotation)| !annotation.is_empty())
    }

    fn set(&mut self, square: Square, highlight: Highlight) {
        self.squares[square as usize].highlight = Some(highlight);
    }
}

pub fn annotate(state: &GameState, selection: PendingSelection, marks: &UserMarks) -> Annotations {
    let mut out = Annotations {
        squares: [SquareAnnotation::default(); 64],
    };

    if let Some(last) = state.last_move() {
        out.set(last.from, Highlight::LastMoveFrom);
        out.set(last.to, Highlight::LastMoveTo);
    }

    match selection {
        PendingSelection::Idle => {}
        PendingSelection::SourceSelected { source } => {
            for target in state.legal_targets(source) {
                let highlight = if target.capture {
                    Highlight::CaptureTarget
                } else {
                    Highlight::QuietTarget
                };
                out.set(target.to, highlight);
            }
            out.set(source, Highlight::Source);
        }
        PendingSelection::AwaitingPromotion {
            source,
            destination,
        } => {
            out.set(source, Highlight::Source);
            out.set(destination, Highlight::PromotionTarget);
        }
    }

    for square in &marks.squares {
        out.squares[*square as usize].user_marked = true;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{annotate, Highlight, UserMarks};
    use crate::game_state::chess_types::{Move, Square};
    use crate::game_state::game_state::GameState;
    use crate::interaction::selection::PendingSelection;

    #[test]
    fn idle_start_position_has_no_annotations() {
        let out = annotate(&GameState::new_game(), PendingSelection::Idle, &UserMarks::new());
        assert_eq!(out.iter().count(), 0);
    }

    #[test]
    fn selection_marks_source_and_quiet_or_capture_targets() {
        let state = GameState::from_fen(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
        )
        .expect("FEN should parse");
        let out = annotate(
            &state,
            PendingSelection::SourceSelected { source: Square::E4 },
            &UserMarks::new(),
        );
        assert_eq!(out.highlight(Square::E4), Some(Highlight::Source));
        assert_eq!(out.highlight(Square::E5), Some(Highlight::QuietTarget));
        assert_eq!(out.highlight(Square::D5), Some(Highlight::CaptureTarget));
        assert_eq!(out.iter().count(), 3);
    }

    #[test]
    fn en_passant_counts_as_capture() {
        let state = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2")
            .expect("FEN should parse");
        let out = annotate(
            &state,
            PendingSelection::SourceSelected { source: Square::E5 },
            &UserMarks::new(),
        );
        assert_eq!(out.highlight(Square::D6), Some(Highlight::CaptureTarget));
        assert_eq!(out.highlight(Square::E6), Some(Highlight::QuietTarget));
    }

    #[test]
    fn awaiting_promotion_shows_only_the_chosen_square() {
        let state = GameState::from_fen("3r3k/4P3/8/8/8/8/8/K7 w - - 0 1").expect("FEN should parse");
        let out = annotate(
            &state,
            PendingSelection::AwaitingPromotion {
                source: Square::E7,
                destination: Square::E8,
            },
            &UserMarks::new(),
        );
        assert_eq!(out.highlight(Square::E8), Some(Highlight::PromotionTarget));
        assert_eq!(out.highlight(Square::D8), None);
    }

    #[test]
    fn last_move_and_user_marks_are_layered() {
        let state = GameState::new_game()
            .with_move(Move::new(Square::E2, Square::E4))
            .expect("e2e4 should apply");
        let mut marks = UserMarks::new();
        assert!(marks.toggle(Square::E4));
        assert!(marks.toggle(Square::H5));
        assert!(!marks.toggle(Square::H5));

        let out = annotate(&state, PendingSelection::Idle, &marks);
        assert_eq!(out.highlight(Square::E2), Some(Highlight::LastMoveFrom));
        let e4 = out.get(Square::E4);
        assert_eq!(e4.highlight, Some(Highlight::LastMoveTo));
        assert!(e4.user_marked);
        assert!(!out.get(Square::H5).user_marked);
    }
}
