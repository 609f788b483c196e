//! Asynchronous bridge to a UCI search process.
//!
//! Requests are fire-and-forget: `request_best_move` writes the command pair
//! and returns at once; answers are collected later by `poll`. A UCI engine
//! answers every `go` with exactly one `bestmove`, so outstanding requests
//! form a FIFO and each `bestmove` belongs to the oldest one. Only an answer
//! to the most recently issued sequence number is handed back; answers to
//! superseded requests are dropped here and never reach the game.

use std::collections::VecDeque;

use tracing::{debug, info, trace, warn};

use crate::engines::search_process::{ChildProcess, SearchProcess};
use crate::errors::ControllerResult;
use crate::game_state::chess_types::Move;
use crate::uci::uci_messages::{parse_engine_line, EngineCommand, EngineMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub position_fen: String,
    pub depth: u8,
    pub sequence: u64,
}

/// Answer to the latest request. `result` is an `EngineProtocol` error when
/// the engine's token could not be decoded.
#[derive(Debug)]
pub struct EngineResponse {
    pub sequence: u64,
    pub result: ControllerResult<Move>,
}

pub struct EngineBridge {
    process: Box<dyn SearchProcess>,
    latest_sequence: u64,
    outstanding: VecDeque<u64>,
    engine_name: Option<String>,
    handshake_complete: bool,
    ready: bool,
}

impl EngineBridge {
    /// Wrap a running process and send the handshake.
    pub fn start(process: Box<dyn SearchProcess>) -> ControllerResult<Self> {
        let mut bridge = Self {
            process,
            latest_sequence: 0,
            outstanding: VecDeque::new(),
            engine_name: None,
            handshake_complete: false,
            ready: false,
        };
        bridge.send(EngineCommand::Uci)?;
        bridge.send(EngineCommand::IsReady)?;
        Ok(bridge)
    }

    /// Launch `program` and start a bridge on it.
    pub fn spawn(program: &str, args: &[String]) -> ControllerResult<Self> {
        let process = ChildProcess::spawn(program, args)?;
        Self::start(Box::new(process))
    }

    #[inline]
    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    /// Searches started but not yet answered, superseded ones included.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.handshake_complete && self.ready
    }

    pub fn is_alive(&self) -> bool {
        self.process.is_alive()
    }

    pub fn request_best_move(
        &mut self,
        position_fen: &str,
        depth: u8,
    ) -> ControllerResult<EngineRequest> {
        if !self.outstanding.is_empty() {
            self.send(EngineCommand::Stop)?;
        }
        self.send(EngineCommand::PositionFen(position_fen.to_owned()))?;
        self.send(EngineCommand::GoDepth(depth))?;

        self.latest_sequence += 1;
        self.outstanding.push_back(self.latest_sequence);
        debug!(
            sequence = self.latest_sequence,
            depth,
            outstanding = self.outstanding.len(),
            "best move requested"
        );
        Ok(EngineRequest {
            position_fen: position_fen.to_owned(),
            depth,
            sequence: self.latest_sequence,
        })
    }

    /// Supersede every outstanding request; their answers will be dropped.
    pub fn invalidate(&mut self) {
        self.latest_sequence += 1;
        if !self.outstanding.is_empty() {
            debug!(
                superseded = self.outstanding.len(),
                "outstanding searches invalidated"
            );
            if let Err(e) = self.send(EngineCommand::Stop) {
                warn!(error = %e, "could not stop engine search");
            }
        }
    }

    pub fn new_game(&mut self) -> ControllerResult<()> {
        self.invalidate();
        self.ready = false;
        self.send(EngineCommand::UciNewGame)?;
        self.send(EngineCommand::IsReady)
    }

    /// Drain everything the engine printed since the last call.
    pub fn poll(&mut self) -> Vec<EngineResponse> {
        let mut responses = Vec::new();
        while let Some(line) = self.process.try_read_line() {
            match parse_engine_line(&line) {
                EngineMessage::UciOk => self.handshake_complete = true,
                EngineMessage::ReadyOk => self.ready = true,
                EngineMessage::IdName(name) => {
                    info!(engine = %name, "engine identified");
                    self.engine_name = Some(name);
                }
                EngineMessage::BestMove(result) => match self.outstanding.pop_front() {
                    None => debug!(%line, "unsolicited bestmove ignored"),
                    Some(sequence) if sequence != self.latest_sequence => {
                        debug!(sequence, latest = self.latest_sequence, "stale bestmove dropped");
                    }
                    Some(sequence) => responses.push(EngineResponse { sequence, result }),
                },
                EngineMessage::Other => trace!(%line, "engine line ignored"),
            }
        }
        responses
    }

    fn send(&mut self, command: EngineCommand) -> ControllerResult<()> {
        self.process.send_line(&command.to_string())
    }
}
