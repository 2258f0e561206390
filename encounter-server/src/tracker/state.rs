//! Tracker state container.
//!
//! Uses `thread_local!` + `RefCell` for mutable access in single-threaded
//! WASM. The Web Worker keeps the module alive, so the roster survives across
//! `handle_request` calls until the tracker page is reloaded.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::participant::{Participant, Side, StatBlock};

/// Participants in table order plus turn and round bookkeeping.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub(crate) participants: Vec<Participant>,
    /// Index of the participant whose turn it is. Always `< len` when non-empty.
    pub(crate) current_turn: usize,
    /// Starts at 1; restored from session storage by the page.
    pub(crate) round: i32,
    /// Next number handed to a reinforcement, as in "Goblin 4".
    pub(crate) next_npc_id: u32,
    /// Creatures in this encounter, by stat block name, for reinforcing
    /// with more of the same.
    pub(crate) stat_blocks: BTreeMap<String, StatBlock>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            participants: Vec::new(),
            current_turn: 0,
            round: 1,
            next_npc_id: 1,
            stat_blocks: BTreeMap::new(),
        }
    }
}

impl Tracker {
    pub fn new(participants: Vec<Participant>) -> Self {
        let next_npc_id = participants.iter().filter(|p| p.side().tracks_health()).count() as u32 + 1;
        Self {
            participants,
            next_npc_id,
            ..Self::default()
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn current(&self) -> Option<&Participant> {
        self.participants.get(self.current_turn)
    }

    pub fn find(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> TrackerResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| TrackerError::UnknownParticipant(name.to_string()))
    }

    pub fn stat_block(&self, name: &str) -> Option<&StatBlock> {
        self.stat_blocks.get(name)
    }

    pub fn stat_block_names(&self) -> impl Iterator<Item = &str> {
        self.stat_blocks.keys().map(String::as_str)
    }

    pub fn names(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }

    /// Leaving the page is blocked while any enemy is still standing.
    pub fn should_block_unload(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.side() == Side::Enemy && !p.is_dead())
    }
}

thread_local! {
    static TRACKER: RefCell<Tracker> = RefCell::new(Tracker::default());
}

/// Execute a closure with read access to the tracker.
pub fn with_tracker<F, R>(f: F) -> R
where
    F: FnOnce(&Tracker) -> R,
{
    TRACKER.with(|t| f(&t.borrow()))
}

/// Execute a closure with mutable access to the tracker.
pub fn with_tracker_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Tracker) -> R,
{
    TRACKER.with(|t| f(&mut t.borrow_mut()))
}

/// Replace the whole tracker (page reload, tests).
pub fn replace_tracker(new_tracker: Tracker) {
    TRACKER.with(|t| {
        *t.borrow_mut() = new_tracker;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tracker_is_empty_round_one() {
        let t = Tracker::default();
        assert!(t.is_empty());
        assert_eq!(t.round, 1);
        assert!(t.current().is_none());
    }

    #[test]
    fn new_counts_existing_npcs_for_ids() {
        let t = Tracker::new(vec![
            Participant::player("Aria", 12),
            Participant::npc("Goblin 1", Side::Enemy, 10, 7),
            Participant::npc("Goblin 2", Side::Enemy, 8, 7),
        ]);
        assert_eq!(t.next_npc_id, 3);
    }

    #[test]
    fn unload_blocked_until_all_enemies_dead() {
        let mut t = Tracker::new(vec![
            Participant::player("Aria", 12),
            Participant::npc("Goblin 1", Side::Enemy, 10, 7),
            Participant::npc("Wolf 1", Side::Ally, 9, 11),
        ]);
        assert!(t.should_block_unload());
        t.find_mut("Goblin 1").unwrap().set_damage(7).unwrap();
        assert!(!t.should_block_unload());
    }

    #[test]
    fn no_enemies_never_blocks() {
        let t = Tracker::new(vec![Participant::player("Aria", 12)]);
        assert!(!t.should_block_unload());
    }

    #[test]
    fn thread_local_replace_and_read() {
        replace_tracker(Tracker::new(vec![Participant::player("Bram", 3)]));
        assert_eq!(with_tracker(|t| t.names().join(",")), "Bram");
        with_tracker_mut(|t| t.round = 4);
        assert_eq!(with_tracker(|t| t.round), 4);
        replace_tracker(Tracker::default());
    }

    #[test]
    fn find_mut_reports_unknown_names() {
        let mut t = Tracker::default();
        assert_eq!(
            t.find_mut("Nobody").unwrap_err(),
            TrackerError::UnknownParticipant("Nobody".to_string())
        );
    }
}
