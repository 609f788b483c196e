//! Random-move tier.
//!
//! Draws uniformly from the legal moves of the current snapshot. Used for the
//! lowest skill level, and as the fallback when a search never answers.

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game_state::chess_types::Move;
use crate::game_state::game_state::GameState;

pub struct RandomMover {
    rng: StdRng,
}

impl RandomMover {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence of picks.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `None` only when the side to move has no legal move.
    pub fn choose_move(&mut self, state: &GameState) -> Option<Move> {
        let legal_moves = state.legal_moves();
        legal_moves.as_slice().choose(&mut self.rng).copied()
    }
}

impl Default for RandomMover {
    fn default() -> Self {
        Self::new()
    }
}
