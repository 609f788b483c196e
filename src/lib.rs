//! Crate root module declarations for the Plum Versus game controller.
//!
//! A human plays one side of a chess game through click/drag gestures; an
//! external UCI engine (or the built-in random mover) plays the other. The
//! subsystems below are exposed so the terminal binary, integration tests
//! and benchmarks can import stable module paths.

pub mod errors;

pub mod game_state {
    pub mod board_authority;
    pub mod chess_rules;
    pub mod chess_types;
    pub mod game_state;
}

pub mod interaction {
    pub mod annotations;
    pub mod selection;
    pub mod state_machine;
}

pub mod engines {
    pub mod engine_bridge;
    pub mod engine_random;
    pub mod search_process;
    pub mod skill_level;
}

pub mod uci {
    pub mod uci_messages;
}

pub mod session {
    pub mod config;
    pub mod session;
    pub mod turn_scheduler;
}

pub mod utils {
    pub mod long_algebraic;
    pub mod pgn;
    pub mod render_game_state;
    pub mod terminal_commands;
}

#[cfg(any(test, feature = "testing"))]
pub mod testing;
