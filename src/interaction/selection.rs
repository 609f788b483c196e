//! Pending human selection.

use crate::game_state::chess_types::Square;

/// Progress of the current two-phase gesture. At most one exists per human
/// turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingSelection {
    #[default]
    Idle,
    SourceSelected {
        source: Square,
    },
    AwaitingPromotion {
        source: Square,
        destination: Square,
    },
}

impl PendingSelection {
    #[inline]
    pub fn source(self) -> Option<Square> {
        match self {
            PendingSelection::Idle => None,
            PendingSelection::SourceSelected { source }
            | PendingSelection::AwaitingPromotion { source, .. } => Some(source),
        }
    }

    #[inline]
    pub fn destination(self) -> Option<Square> {
        match self {
            PendingSelection::AwaitingPromotion { destination, .. } => Some(destination),
            _ => None,
        }
    }

    #[inline]
    pub fn is_idle(self) -> bool {
        matches!(self, PendingSelection::Idle)
    }

    #[inline]
    pub fn is_awaiting_promotion(self) -> bool {
        matches!(self, PendingSelection::AwaitingPromotion { .. })
    }
}
