//! Error taxonomy for the controller.
//!
//! Every failure is handled by the component that detects it; none of these
//! ends the session. Game-ending positions are not errors and are reported
//! through `TerminalStatus` instead.

use thiserror::Error;

/// Represents all possible error types that can occur while driving a game.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A commit was attempted with a move outside the current legal set.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Imported FEN/PGN text or a move token could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The engine answered with a missing or unrecognized best-move token.
    #[error("engine protocol error: {0}")]
    EngineProtocol(String),

    /// The search process could not be started or its pipe is gone.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A search tier was selected but no engine process is running.
    #[error("skill level {0} needs a search engine, but none is running")]
    EngineTierUnavailable(u8),

    /// Configuration file could not be read or decoded.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ControllerResult<T> = Result<T, ControllerError>;
