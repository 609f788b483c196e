//! Turn ownership and engine pacing.
//!
//! The scheduler holds the single `TurnOwner` value and the two timers that
//! drive the engine side: the pacing delay before an engine move is started,
//! and the stall deadline for a search that never answers. It is advanced
//! with explicit instants so the session stays deterministic under test.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::game_state::chess_types::{Color, TerminalStatus};

/// Side holding the authority to produce the next move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOwner {
    Human,
    Engine,
}

impl TurnOwner {
    #[inline]
    pub const fn toggled(self) -> Self {
        match self {
            TurnOwner::Human => TurnOwner::Engine,
            TurnOwner::Engine => TurnOwner::Human,
        }
    }

    /// Owner implied by a position where `side_to_move` is to play.
    #[inline]
    pub fn for_side(side_to_move: Color, human_side: Color) -> Self {
        if side_to_move == human_side {
            TurnOwner::Human
        } else {
            TurnOwner::Engine
        }
    }
}

/// Proof that the human may act right now. Only the scheduler hands these
/// out, and every gesture needs one.
#[derive(Debug)]
pub struct HumanTurn {
    _private: (),
}

impl HumanTurn {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

#[derive(Debug, Clone)]
pub struct TurnScheduler {
    owner: TurnOwner,
    think_delay: Duration,
    engine_timeout: Option<Duration>,
    pacing_deadline: Option<Instant>,
    engine_search_since: Option<Instant>,
    game_over_reported: bool,
}

impl TurnScheduler {
    pub fn new(owner: TurnOwner, think_delay: Duration, engine_timeout: Option<Duration>) -> Self {
        Self {
            owner,
            think_delay,
            engine_timeout,
            pacing_deadline: None,
            engine_search_since: None,
            game_over_reported: false,
        }
    }

    #[inline]
    pub fn owner(&self) -> TurnOwner {
        self.owner
    }

    #[inline]
    pub fn think_delay(&self) -> Duration {
        self.think_delay
    }

    #[inline]
    pub fn pacing_deadline(&self) -> Option<Instant> {
        self.pacing_deadline
    }

    #[inline]
    pub fn is_engine_searching(&self) -> bool {
        self.engine_search_since.is_some()
    }

    pub fn human_turn(&self, status: TerminalStatus) -> Option<HumanTurn> {
        (self.owner == TurnOwner::Human && status.is_ongoing()).then(HumanTurn::new)
    }

    /// Called right after a legal commit, and only then.
    pub fn record_commit(&mut self) {
        self.owner = self.owner.toggled();
        self.pacing_deadline = None;
        self.engine_search_since = None;
        debug!(owner = ?self.owner, "turn passed");
    }

    /// Re-evaluate after any snapshot change. Returns the terminal status the
    /// first time the game is seen to be over.
    pub fn on_state_changed(
        &mut self,
        status: TerminalStatus,
        now: Instant,
    ) -> Option<TerminalStatus> {
        if !status.is_ongoing() {
            self.pacing_deadline = None;
            self.engine_search_since = None;
            if self.game_over_reported {
                return None;
            }
            self.game_over_reported = true;
            info!(%status, "game over");
            return Some(status);
        }

        self.game_over_reported = false;
        if self.owner == TurnOwner::Engine
            && self.pacing_deadline.is_none()
            && self.engine_search_since.is_none()
        {
            self.pacing_deadline = Some(now + self.think_delay);
            debug!(delay_ms = self.think_delay.as_millis() as u64, "engine move scheduled");
        }
        None
    }

    /// Fires the pacing timer once its deadline has passed. The action only
    /// goes ahead if the engine still owns the turn and the game is still on.
    pub fn due(&mut self, now: Instant, status: TerminalStatus) -> bool {
        match self.pacing_deadline {
            Some(deadline) if now >= deadline => {
                self.pacing_deadline = None;
                self.owner == TurnOwner::Engine && status.is_ongoing()
            }
            _ => false,
        }
    }

    pub fn engine_search_started(&mut self, now: Instant) {
        self.engine_search_since = Some(now);
    }

    /// True once an engine search has gone unanswered past the timeout.
    pub fn is_stalled(&self, now: Instant) -> bool {
        match (self.engine_timeout, self.engine_search_since) {
            (Some(timeout), Some(since)) => {
                self.owner == TurnOwner::Engine && now.saturating_duration_since(since) >= timeout
            }
            _ => false,
        }
    }

    /// Drop every pending timer; nothing scheduled before this call fires.
    pub fn cancel(&mut self) {
        self.pacing_deadline = None;
        self.engine_search_since = None;
    }

    /// Start over after new game, undo or import.
    pub fn restart(
        &mut self,
        owner: TurnOwner,
        status: TerminalStatus,
        now: Instant,
    ) -> Option<TerminalStatus> {
        self.cancel();
        self.owner = owner;
        self.game_over_reported = false;
        self.on_state_changed(status, now)
    }
}

#[cfg(test)]
mod tests {
    use super::{TurnOwner, TurnScheduler};
    use crate::game_state::chess_types::{Color, TerminalStatus};
    use std::time::{Duration, Instant};

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn owner_follows_side_to_move() {
        assert_eq!(TurnOwner::for_side(Color::White, Color::White), TurnOwner::Human);
        assert_eq!(TurnOwner::for_side(Color::Black, Color::White), TurnOwner::Engine);
        assert_eq!(TurnOwner::Human.toggled(), TurnOwner::Engine);
    }

    #[test]
    fn engine_turn_fires_once_after_delay() {
        let start = Instant::now();
        let mut scheduler = TurnScheduler::new(TurnOwner::Human, DELAY, None);
        assert!(scheduler.human_turn(TerminalStatus::Ongoing).is_some());

        scheduler.record_commit();
        assert_eq!(scheduler.owner(), TurnOwner::Engine);
        assert!(scheduler.human_turn(TerminalStatus::Ongoing).is_none());
        assert_eq!(scheduler.on_state_changed(TerminalStatus::Ongoing, start), None);
        // A second notification must not schedule a second move.
        scheduler.on_state_changed(TerminalStatus::Ongoing, start + DELAY / 2);
        assert_eq!(scheduler.pacing_deadline(), Some(start + DELAY));

        assert!(!scheduler.due(start + DELAY / 2, TerminalStatus::Ongoing));
        assert!(scheduler.due(start + DELAY, TerminalStatus::Ongoing));
        assert!(!scheduler.due(start + DELAY * 2, TerminalStatus::Ongoing));
    }

    #[test]
    fn due_revalidates_preconditions() {
        let start = Instant::now();
        let mut scheduler = TurnScheduler::new(TurnOwner::Engine, DELAY, None);
        scheduler.on_state_changed(TerminalStatus::Ongoing, start);
        assert!(!scheduler.due(start + DELAY, TerminalStatus::Stalemate));
    }

    #[test]
    fn cancel_discards_the_pending_move() {
        let start = Instant::now();
        let mut scheduler = TurnScheduler::new(TurnOwner::Engine, DELAY, None);
        scheduler.on_state_changed(TerminalStatus::Ongoing, start);
        scheduler.cancel();
        assert!(!scheduler.due(start + DELAY * 4, TerminalStatus::Ongoing));
    }

    #[test]
    fn game_over_is_reported_once_and_blocks_the_human() {
        let now = Instant::now();
        let mut scheduler = TurnScheduler::new(TurnOwner::Human, DELAY, None);
        let mate = TerminalStatus::Checkmate {
            winner: Color::White,
        };
        assert_eq!(scheduler.on_state_changed(mate, now), Some(mate));
        assert_eq!(scheduler.on_state_changed(mate, now), None);
        assert!(scheduler.human_turn(mate).is_none());
        assert_eq!(scheduler.pacing_deadline(), None);
    }

    #[test]
    fn stall_needs_a_timeout_and_an_open_search() {
        let start = Instant::now();
        let timeout = Duration::from_secs(5);

        let mut patient = TurnScheduler::new(TurnOwner::Engine, DELAY, None);
        patient.engine_search_started(start);
        assert!(!patient.is_stalled(start + Duration::from_secs(3600)));

        let mut strict = TurnScheduler::new(TurnOwner::Engine, DELAY, Some(timeout));
        assert!(!strict.is_stalled(start + timeout));
        strict.engine_search_started(start);
        assert!(!strict.is_stalled(start + timeout / 2));
        assert!(strict.is_stalled(start + timeout));
        strict.record_commit();
        assert!(!strict.is_stalled(start + timeout * 2));
    }

    #[test]
    fn restart_resets_owner_and_schedules_engine_if_needed() {
        let now = Instant::now();
        let mut scheduler = TurnScheduler::new(TurnOwner::Human, DELAY, None);
        scheduler.restart(TurnOwner::Engine, TerminalStatus::Ongoing, now);
        assert_eq!(scheduler.owner(), TurnOwner::Engine);
        assert_eq!(scheduler.pacing_deadline(), Some(now + DELAY));
    }
}
