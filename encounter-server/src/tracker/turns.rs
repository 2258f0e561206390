//! Turn order and round counting.
//!
//! The table is sorted by descending initiative (stable, so ties keep their
//! current order). Advancing wraps at the end of the table; every wrap back
//! to the first row starts a new round. Dead participants are skipped, with
//! the skip loop bounded by the table length.

use std::cmp::Reverse;

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::state::Tracker;

/// Result of a successful `next_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnAdvance {
    pub turn: usize,
    pub round: i32,
    /// Rounds started by this advance (0, or more when skipping dead rows wrapped).
    pub rounds_started: i32,
    /// Dead participants passed over.
    pub skipped: usize,
}

impl Tracker {
    /// Reorder by descending initiative and hand the turn to the top row.
    pub fn sort_initiative(&mut self) {
        self.participants.sort_by_key(|p| Reverse(p.initiative));
        self.current_turn = 0;
    }

    #[cfg(test)]
    pub(crate) fn is_sorted(&self) -> bool {
        self.participants
            .windows(2)
            .all(|w| w[0].initiative >= w[1].initiative)
    }

    /// Move the current-turn marker. `turn` is taken modulo the table length.
    #[cfg(test)]
    pub(crate) fn set_current_turn(&mut self, turn: usize) -> TrackerResult<()> {
        if self.participants.is_empty() {
            return Err(TrackerError::EmptyRoster);
        }
        self.current_turn = turn % self.participants.len();
        Ok(())
    }

    pub fn round(&self) -> i32 {
        self.round
    }

    pub fn set_round(&mut self, round: i32) -> TrackerResult<()> {
        if round < 1 {
            return Err(TrackerError::invalid("round", round.to_string()));
        }
        self.round = round;
        Ok(())
    }

    /// Advance to the next living participant.
    ///
    /// Fails without touching state when the table is empty or everyone in
    /// it is dead.
    pub fn next_turn(&mut self) -> TrackerResult<TurnAdvance> {
        if self.participants.is_empty() {
            return Err(TrackerError::EmptyRoster);
        }
        if self.participants.iter().all(|p| p.is_dead()) {
            return Err(TrackerError::AllDefeated);
        }

        let start_round = self.round;
        self.step();
        let mut skipped = 0;
        while self.participants[self.current_turn].is_dead() && skipped < self.participants.len() {
            self.step();
            skipped += 1;
        }

        Ok(TurnAdvance {
            turn: self.current_turn,
            round: self.round,
            rounds_started: self.round - start_round,
            skipped,
        })
    }

    fn step(&mut self) {
        self.current_turn = (self.current_turn + 1) % self.participants.len();
        if self.current_turn == 0 {
            self.round = self.round.saturating_add(1);
        }
    }
}
