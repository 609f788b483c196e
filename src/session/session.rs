//! The game session: one human against one engine.
//!
//! `Session` is the explicit context that owns every piece of mutable state:
//! the board authority, the gesture machine, the right-click marks, the turn
//! scheduler, the engine bridge and the random mover. Every move, human or
//! engine, goes through the single `commit` path, which is the only place
//! where `TurnOwner` changes hands.
//!
//! Nothing here blocks. The front-end forwards gestures as they happen and
//! calls `tick` periodically; engine answers and timers are handled there.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engines::engine_bridge::{EngineBridge, EngineResponse};
use crate::engines::engine_random::RandomMover;
use crate::engines::search_process::SearchProcess;
use crate::engines::skill_level::SkillLevel;
use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::board_authority::BoardAuthority;
use crate::game_state::chess_types::{Color, Move, PromotionPiece, Square, TerminalStatus};
use crate::game_state::game_state::GameState;
use crate::interaction::annotations::{annotate, Annotations, UserMarks};
use crate::interaction::selection::PendingSelection;
use crate::interaction::state_machine::{GestureOutcome, InteractionMachine};
use crate::session::config::SessionConfig;
use crate::session::turn_scheduler::{TurnOwner, TurnScheduler};
use crate::utils::pgn::write_pgn;

/// Notifications for the front-end, drained with `drain_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MoveCommitted {
        mv: Move,
        san: String,
        by: TurnOwner,
    },
    /// A move was attempted and refused; nothing changed.
    IllegalMove { mv: Move, reason: String },
    GameOver(TerminalStatus),
    EngineRequested { sequence: u64, depth: u8 },
    /// The engine answered with something that cannot be played.
    EngineProtocolError(String),
    /// No answer within the timeout; a random move was played instead.
    EngineStalled { sequence: Option<u64> },
    PositionImported { fen: String },
    NewGame,
    Undone { fen: String },
    SkillChanged(SkillLevel),
}

pub struct Session {
    config: SessionConfig,
    human_side: Color,
    authority: BoardAuthority,
    machine: InteractionMachine,
    marks: UserMarks,
    scheduler: TurnScheduler,
    bridge: Option<EngineBridge>,
    random: RandomMover,
    skill: SkillLevel,
    awaiting_sequence: Option<u64>,
    events: VecDeque<SessionEvent>,
}

impl Session {
    /// Start a session, launching the configured engine if there is one.
    /// An engine that fails to start leaves only the random tier available.
    pub fn start(config: SessionConfig, now: Instant) -> Self {
        let bridge = match config.engine_command.as_deref() {
            Some(program) => match EngineBridge::spawn(program, &config.engine_args) {
                Ok(bridge) => Some(bridge),
                Err(e) => {
                    warn!(error = %e, "engine failed to start; only the random tier is available");
                    None
                }
            },
            None => None,
        };
        Self::assemble(config, bridge, now)
    }

    /// Start a session on an already running search process.
    pub fn with_process(
        config: SessionConfig,
        process: Box<dyn SearchProcess>,
        now: Instant,
    ) -> ControllerResult<Self> {
        let bridge = EngineBridge::start(process)?;
        Ok(Self::assemble(config, Some(bridge), now))
    }

    /// Session with no engine at all; it plays random moves.
    pub fn without_engine(config: SessionConfig, now: Instant) -> Self {
        Self::assemble(config, None, now)
    }

    /// Replace the random mover with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random = RandomMover::with_seed(seed);
        self
    }

    fn assemble(config: SessionConfig, bridge: Option<EngineBridge>, now: Instant) -> Self {
        let human_side = config.human_side.color();
        let mut skill = config.skill_level;
        if bridge.is_none() && !skill.is_random() {
            warn!(%skill, "no search engine running; falling back to the random tier");
            skill = SkillLevel::RANDOM;
        }

        let authority = BoardAuthority::new();
        let owner = TurnOwner::for_side(authority.state().side_to_move(), human_side);
        let scheduler = TurnScheduler::new(owner, config.think_delay(), config.engine_timeout());

        let mut session = Self {
            config,
            human_side,
            authority,
            machine: InteractionMachine::new(),
            marks: UserMarks::new(),
            scheduler,
            bridge,
            random: RandomMover::new(),
            skill,
            awaiting_sequence: None,
            events: VecDeque::new(),
        };
        session.notify_state_changed(now);
        info!(skill = %session.skill, human = ?session.human_side, "session started");
        session
    }

    // ----- queries -----

    pub fn snapshot(&self) -> Arc<GameState> {
        self.authority.snapshot()
    }

    pub fn status(&self) -> TerminalStatus {
        self.authority.terminal_status()
    }

    pub fn turn_owner(&self) -> TurnOwner {
        self.scheduler.owner()
    }

    pub fn selection(&self) -> PendingSelection {
        self.machine.selection()
    }

    pub fn annotations(&self) -> Annotations {
        annotate(self.authority.state(), self.machine.selection(), &self.marks)
    }

    pub fn marks(&self) -> &UserMarks {
        &self.marks
    }

    pub fn skill(&self) -> SkillLevel {
        self.skill
    }

    pub fn human_side(&self) -> Color {
        self.human_side
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn has_engine(&self) -> bool {
        self.bridge.is_some()
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.bridge.as_ref().and_then(EngineBridge::engine_name)
    }

    /// True while the engine owns the turn and has a search in flight.
    pub fn is_engine_thinking(&self) -> bool {
        self.scheduler.is_engine_searching()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn export_pgn(&self) -> String {
        write_pgn(self.authority.state(), self.status().result_token())
    }

    // ----- human gestures -----

    pub fn click(&mut self, square: Square, now: Instant) -> GestureOutcome {
        let Some(turn) = self.scheduler.human_turn(self.status()) else {
            debug!(%square, owner = ?self.scheduler.owner(), "click outside the human turn");
            return GestureOutcome::Ignored;
        };
        let state = self.authority.snapshot();
        let outcome = self.machine.click(&turn, &state, square);
        self.finish_gesture(outcome, now)
    }

    pub fn drop_piece(&mut self, from: Square, to: Square, now: Instant) -> GestureOutcome {
        let Some(turn) = self.scheduler.human_turn(self.status()) else {
            debug!(%from, %to, owner = ?self.scheduler.owner(), "drop outside the human turn");
            return GestureOutcome::Ignored;
        };
        let state = self.authority.snapshot();
        let outcome = self.machine.drop_piece(&turn, &state, from, to);
        self.finish_gesture(outcome, now)
    }

    pub fn choose_promotion(&mut self, piece: PromotionPiece, now: Instant) -> GestureOutcome {
        let Some(turn) = self.scheduler.human_turn(self.status()) else {
            return GestureOutcome::Ignored;
        };
        let outcome = self.machine.choose_promotion(&turn, piece);
        self.finish_gesture(outcome, now)
    }

    pub fn cancel_promotion(&mut self) -> GestureOutcome {
        self.machine.cancel_promotion()
    }

    /// Toggle the user mark on `square`; allowed at any time.
    pub fn right_click(&mut self, square: Square) -> bool {
        self.marks.toggle(square)
    }

    fn finish_gesture(&mut self, outcome: GestureOutcome, now: Instant) -> GestureOutcome {
        match outcome {
            GestureOutcome::Commit(mv) => match self.commit(mv, TurnOwner::Human, now) {
                Ok(()) => outcome,
                Err(_) => GestureOutcome::Rejected {
                    from: mv.from,
                    to: mv.to,
                },
            },
            GestureOutcome::Rejected { from, to } => {
                self.events.push_back(SessionEvent::IllegalMove {
                    mv: Move::new(from, to),
                    reason: "not a legal destination".to_owned(),
                });
                outcome
            }
            _ => outcome,
        }
    }

    // ----- engine side -----

    /// Advance the session to `now`: collect engine answers, notice a dead
    /// engine, handle a stalled search, and fire the pacing timer.
    pub fn tick(&mut self, now: Instant) {
        let responses = match self.bridge.as_mut() {
            Some(bridge) => bridge.poll(),
            None => Vec::new(),
        };
        for response in responses {
            self.handle_engine_response(response, now);
        }

        if self.bridge.as_ref().is_some_and(|bridge| !bridge.is_alive()) {
            self.abandon_engine(now);
        }

        if self.scheduler.is_stalled(now) {
            self.recover_from_stall(now);
        }

        if self.scheduler.due(now, self.status()) {
            self.start_engine_move(now);
        }
    }

    fn start_engine_move(&mut self, now: Instant) {
        if self.skill.is_random() {
            self.play_random_move(now);
            return;
        }
        let Some(bridge) = self.bridge.as_mut() else {
            self.play_random_move(now);
            return;
        };

        let fen = self.authority.fen();
        match bridge.request_best_move(&fen, self.skill.depth()) {
            Ok(request) => {
                self.awaiting_sequence = Some(request.sequence);
                self.scheduler.engine_search_started(now);
                self.events.push_back(SessionEvent::EngineRequested {
                    sequence: request.sequence,
                    depth: request.depth,
                });
            }
            Err(e) => {
                warn!(error = %e, "engine unreachable; switching to the random tier");
                self.fall_back_to_random();
                self.play_random_move(now);
            }
        }
    }

    /// The engine process is gone. Any search in flight will never answer,
    /// so the random tier takes over, including the move it owed.
    fn abandon_engine(&mut self, now: Instant) {
        warn!(engine = ?self.engine_name(), "engine process exited; switching to the random tier");
        let was_searching =
            self.awaiting_sequence.take().is_some() || self.scheduler.is_engine_searching();
        self.fall_back_to_random();
        if was_searching && self.scheduler.owner() == TurnOwner::Engine {
            self.scheduler.cancel();
            self.play_random_move(now);
        }
    }

    fn fall_back_to_random(&mut self) {
        self.bridge = None;
        self.awaiting_sequence = None;
        if !self.skill.is_random() {
            self.skill = SkillLevel::RANDOM;
            self.events.push_back(SessionEvent::SkillChanged(self.skill));
        }
    }

    fn handle_engine_response(&mut self, response: EngineResponse, now: Instant) {
        if self.awaiting_sequence != Some(response.sequence)
            || self.scheduler.owner() != TurnOwner::Engine
        {
            debug!(sequence = response.sequence, "engine answer no longer wanted");
            return;
        }
        self.awaiting_sequence = None;

        // A bad answer leaves the engine on move; the stall timer is the way out.
        match response.result {
            Ok(mv) => {
                if let Err(e) = self.commit(mv, TurnOwner::Engine, now) {
                    self.events
                        .push_back(SessionEvent::EngineProtocolError(e.to_string()));
                }
            }
            Err(e) => {
                warn!(error = %e, sequence = response.sequence, "unusable engine answer");
                self.events
                    .push_back(SessionEvent::EngineProtocolError(e.to_string()));
            }
        }
    }

    fn recover_from_stall(&mut self, now: Instant) {
        let sequence = self.awaiting_sequence.take();
        warn!(?sequence, "engine search stalled; playing a random move");
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.invalidate();
        }
        self.scheduler.cancel();
        self.events.push_back(SessionEvent::EngineStalled { sequence });
        self.play_random_move(now);
    }

    fn play_random_move(&mut self, now: Instant) {
        let state = self.authority.snapshot();
        match self.random.choose_move(&state) {
            Some(mv) => {
                // Drawn from the legal set of the current snapshot.
                let _ = self.commit(mv, TurnOwner::Engine, now);
            }
            None => debug!("no legal move for the engine side"),
        }
    }

    // ----- commit and game control -----

    /// The single mutation path for moves.
    fn commit(&mut self, mv: Move, by: TurnOwner, now: Instant) -> ControllerResult<()> {
        if self.scheduler.owner() != by {
            warn!(%mv, ?by, "commit attempted out of turn");
            return Err(ControllerError::IllegalMove(format!(
                "{mv}: not the {by:?} side's turn"
            )));
        }

        let next = match self.authority.apply_move(mv) {
            Ok(next) => next,
            Err(e) => {
                warn!(%mv, ?by, error = %e, "commit rejected");
                self.machine.reset();
                self.events.push_back(SessionEvent::IllegalMove {
                    mv,
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let san = next
            .plies()
            .last()
            .map(|ply| ply.san.clone())
            .unwrap_or_default();
        self.scheduler.record_commit();
        self.machine.reset();
        info!(%mv, %san, ?by, "move committed");
        self.events
            .push_back(SessionEvent::MoveCommitted { mv, san, by });
        self.notify_state_changed(now);
        Ok(())
    }

    pub fn new_game(&mut self, now: Instant) {
        if let Some(bridge) = self.bridge.as_mut() {
            if let Err(e) = bridge.new_game() {
                warn!(error = %e, "engine did not accept a new game");
            }
        }
        self.authority.reset();
        self.marks.clear();
        self.events.push_back(SessionEvent::NewGame);
        self.restart(now);
        info!("new game");
    }

    /// Take back the last two plies. Returns false when there are fewer.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(state) = self.authority.undo_round_trip() else {
            debug!("nothing to undo");
            return false;
        };
        self.invalidate_engine();
        self.events.push_back(SessionEvent::Undone { fen: state.fen() });
        self.restart(now);
        true
    }

    pub fn set_skill(&mut self, level: SkillLevel, now: Instant) -> ControllerResult<()> {
        if !level.is_random() && self.bridge.is_none() {
            return Err(ControllerError::EngineTierUnavailable(level.depth()));
        }
        self.skill = level;
        self.invalidate_engine();
        self.events.push_back(SessionEvent::SkillChanged(level));
        // Whatever was pending ran at the old depth; plan the move afresh.
        self.scheduler.cancel();
        self.notify_state_changed(now);
        info!(skill = %level, "skill changed");
        Ok(())
    }

    /// Replace the game with imported FEN or PGN text. Invalid input changes
    /// nothing.
    pub fn import(&mut self, text: &str, now: Instant) -> ControllerResult<Arc<GameState>> {
        let state = match self.authority.load(text) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "import rejected");
                return Err(e);
            }
        };
        self.invalidate_engine();
        self.events
            .push_back(SessionEvent::PositionImported { fen: state.fen() });
        self.restart(now);
        Ok(state)
    }

    fn invalidate_engine(&mut self) {
        self.awaiting_sequence = None;
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.invalidate();
        }
    }

    /// Clear transient state and hand the turn to whoever is on move.
    fn restart(&mut self, now: Instant) {
        self.awaiting_sequence = None;
        self.machine.reset();
        let owner = TurnOwner::for_side(self.authority.state().side_to_move(), self.human_side);
        if let Some(status) = self.scheduler.restart(owner, self.status(), now) {
            self.events.push_back(SessionEvent::GameOver(status));
        }
    }

    fn notify_state_changed(&mut self, now: Instant) {
        if let Some(status) = self.scheduler.on_state_changed(self.status(), now) {
            self.events.push_back(SessionEvent::GameOver(status));
        }
    }
}
