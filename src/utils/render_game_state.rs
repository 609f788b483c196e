//! Terminal-oriented Unicode board renderer.
//!
//! Draws the snapshot from White's side, optionally with the annotation
//! overlay. Each square is three characters wide; the brackets around the
//! piece carry the overlay:
//!
//! ```text
//! [♙]  selected piece        •   quiet destination
//! (♟)  capture              {·}  promotion square
//! <♘>  last move            ♖ *  user mark
//! ```

use shakmaty::{Piece, Position, Role};

use crate::game_state::chess_types::{Color, Square};
use crate::game_state::game_state::GameState;
use crate::interaction::annotations::{Annotations, Highlight, SquareAnnotation};

const FILE_LABELS: &str = "   a  b  c  d  e  f  g  h\n";

/// Plain board without any overlay.
pub fn render_game_state(game_state: &GameState) -> String {
    render_with(game_state, |_| SquareAnnotation::default())
}

pub fn render_annotated(game_state: &GameState, annotations: &Annotations) -> String {
    render_with(game_state, |square| annotations.get(square))
}

fn render_with(
    game_state: &GameState,
    annotation_at: impl Fn(Square) -> SquareAnnotation,
) -> String {
    let board = game_state.position().board();
    let mut out = String::new();
    out.push_str(FILE_LABELS);

    for rank in (0..8u32).rev() {
        out.push_str(&format!("{} ", rank + 1));
        for file in 0..8u32 {
            let square = Square::new(rank * 8 + file);
            let annotation = annotation_at(square);
            let piece = board.piece_at(square).map(piece_to_unicode);
            let (left, right) = brackets(annotation.highlight);
            let centre = match (piece, annotation.highlight) {
                (Some(ch), _) => ch,
                (None, Some(Highlight::QuietTarget)) => '•',
                (None, _) => '·',
            };
            out.push(left);
            out.push(centre);
            out.push(if annotation.user_marked { '*' } else { right });
        }
        out.push_str(&format!(" {}\n", rank + 1));
    }

    out.push_str(FILE_LABELS.trim_end());
    out
}

fn brackets(highlight: Option<Highlight>) -> (char, char) {
    match highlight {
        Some(Highlight::Source) => ('[', ']'),
        Some(Highlight::CaptureTarget) => ('(', ')'),
        Some(Highlight::PromotionTarget) => ('{', '}'),
        Some(Highlight::LastMoveFrom | Highlight::LastMoveTo) => ('<', '>'),
        Some(Highlight::QuietTarget) | None => (' ', ' '),
    }
}

fn piece_to_unicode(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::Pawn) => '♙',
        (Color::White, Role::Knight) => '♘',
        (Color::White, Role::Bishop) => '♗',
        (Color::White, Role::Rook) => '♖',
        (Color::White, Role::Queen) => '♕',
        (Color::White, Role::King) => '♔',
        (Color::Black, Role::Pawn) => '♟',
        (Color::Black, Role::Knight) => '♞',
        (Color::Black, Role::Bishop) => '♝',
        (Color::Black, Role::Rook) => '♜',
        (Color::Black, Role::Queen) => '♛',
        (Color::Black, Role::King) => '♚',
    }
}

#[cfg(test)]
mod tests {
    use super::{render_annotated, render_game_state};
    use crate::game_state::chess_types::{Move, Square};
    use crate::game_state::game_state::GameState;
    use crate::interaction::annotations::{annotate, UserMarks};
    use crate::interaction::selection::PendingSelection;

    #[test]
    fn start_position_renders_ranks_top_down() {
        let text = render_game_state(&GameState::new_game());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "   a  b  c  d  e  f  g  h");
        assert_eq!(lines[1], "8  ♜  ♞  ♝  ♛  ♚  ♝  ♞  ♜  8");
        assert_eq!(lines[8], "1  ♖  ♘  ♗  ♕  ♔  ♗  ♘  ♖  1");
        assert_eq!(lines[5], "4  ·  ·  ·  ·  ·  ·  ·  ·  4");
    }

    #[test]
    fn overlay_marks_selection_targets_and_user_marks() {
        let state = GameState::new_game()
            .with_move(Move::new(Square::E2, Square::E4))
            .expect("e2e4 should apply");
        let mut marks = UserMarks::new();
        marks.toggle(Square::A8);
        let annotations = annotate(
            &state,
            PendingSelection::SourceSelected { source: Square::G8 },
            &marks,
        );
        let text = render_annotated(&state, &annotations);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("8  ♜*"));
        assert!(lines[1].contains("[♞]"));
        assert_eq!(lines[3], "6  ·  ·  ·  ·  ·  •  ·  •  6");
        assert!(lines[5].contains("<♙>"));
        assert!(lines[7].contains("<·>"));
    }
}
