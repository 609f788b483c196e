//! Click and drag gesture state machine.
//!
//! Turns square clicks, drops and promotion choices into at most one move
//! per human turn. The machine never commits by itself: a finished gesture
//! comes back as `GestureOutcome::Commit` and the session applies it through
//! the board authority. Every entry point needs a `HumanTurn`, so no gesture
//! is processed while the engine owns the turn.

use tracing::debug;

use crate::game_state::chess_types::{Move, PromotionPiece, Square};
use crate::game_state::game_state::GameState;
use crate::interaction::selection::PendingSelection;
use crate::session::turn_scheduler::HumanTurn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing changed.
    Ignored,
    Selected(Square),
    Deselected,
    PromotionRequired { from: Square, to: Square },
    /// A complete legal move, ready for the authority.
    Commit(Move),
    /// The promotion dialog was dismissed.
    Cancelled,
    /// A drop onto a square that is not a legal destination.
    Rejected { from: Square, to: Square },
}

#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    selection: PendingSelection,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn selection(&self) -> PendingSelection {
        self.selection
    }

    pub fn reset(&mut self) {
        self.selection = PendingSelection::Idle;
    }

    pub fn click(&mut self, _turn: &HumanTurn, state: &GameState, square: Square) -> GestureOutcome {
        let outcome = match self.selection {
            PendingSelection::Idle => self.select_if_movable(state, square, GestureOutcome::Ignored),
            PendingSelection::SourceSelected { source } if source == square => {
                self.selection = PendingSelection::Idle;
                GestureOutcome::Deselected
            }
            PendingSelection::SourceSelected { source } => {
                match state.legal_targets(source).iter().find(|t| t.to == square) {
                    Some(target) if target.promotion => self.await_promotion(source, square),
                    Some(_) => {
                        self.selection = PendingSelection::Idle;
                        GestureOutcome::Commit(Move::new(source, square))
                    }
                    None => self.select_if_movable(state, square, GestureOutcome::Deselected),
                }
            }
            // The dialog has to be answered first.
            PendingSelection::AwaitingPromotion { .. } => GestureOutcome::Ignored,
        };
        debug!(%square, ?outcome, selection = ?self.selection, "click");
        outcome
    }

    /// Drag-and-drop: source and destination arrive together.
    pub fn drop_piece(
        &mut self,
        _turn: &HumanTurn,
        state: &GameState,
        from: Square,
        to: Square,
    ) -> GestureOutcome {
        if self.selection.is_awaiting_promotion() {
            return GestureOutcome::Ignored;
        }
        let outcome = match state.legal_targets(from).iter().find(|t| t.to == to) {
            Some(target) if target.promotion => self.await_promotion(from, to),
            Some(_) => {
                self.selection = PendingSelection::Idle;
                GestureOutcome::Commit(Move::new(from, to))
            }
            None => {
                self.selection = PendingSelection::Idle;
                GestureOutcome::Rejected { from, to }
            }
        };
        debug!(%from, %to, ?outcome, "drop");
        outcome
    }

    pub fn choose_promotion(&mut self, _turn: &HumanTurn, piece: PromotionPiece) -> GestureOutcome {
        match self.selection {
            PendingSelection::AwaitingPromotion {
                source,
                destination,
            } => {
                self.selection = PendingSelection::Idle;
                GestureOutcome::Commit(Move::with_promotion(source, destination, piece))
            }
            _ => GestureOutcome::Ignored,
        }
    }

    /// Dismissing the dialog needs no turn token: it can only clear state.
    pub fn cancel_promotion(&mut self) -> GestureOutcome {
        if self.selection.is_awaiting_promotion() {
            self.selection = PendingSelection::Idle;
            GestureOutcome::Cancelled
        } else {
            GestureOutcome::Ignored
        }
    }

    fn select_if_movable(
        &mut self,
        state: &GameState,
        square: Square,
        otherwise: GestureOutcome,
    ) -> GestureOutcome {
        if state.has_legal_moves_from(square) {
            self.selection = PendingSelection::SourceSelected { source: square };
            GestureOutcome::Selected(square)
        } else {
            self.selection = PendingSelection::Idle;
            otherwise
        }
    }

    fn await_promotion(&mut self, source: Square, destination: Square) -> GestureOutcome {
        self.selection = PendingSelection::AwaitingPromotion {
            source,
            destination,
        };
        GestureOutcome::PromotionRequired {
            from: source,
            to: destination,
        }
    }
}
