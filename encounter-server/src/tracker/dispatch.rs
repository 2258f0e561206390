//! Single entry point for every tracker mutation.
//!
//! Routes translate requests into a `TrackerAction`; `Tracker::dispatch`
//! applies it and reports what changed. Reads (render, save, unload guard)
//! go straight through `with_tracker`.

use std::collections::{BTreeMap, HashSet};

use crate::config::NEXT_TURN_KEY;
use crate::error::{TrackerError, TrackerResult};
use crate::tracker::damage::{DamageChange, DialogOutcome};
use crate::tracker::participant::RosterEntry;
use crate::tracker::persist::{LoadReport, SavedEncounter};
use crate::tracker::reinforce::Reinforcement;
use crate::tracker::state::Tracker;
use crate::tracker::turns::TurnAdvance;

#[derive(Debug, Clone)]
pub enum TrackerAction {
    SetRoster(Vec<RosterEntry>),
    SortByInitiative,
    AdvanceTurn,
    ApplyDamage {
        name: String,
        outcome: DialogOutcome,
        amount: i32,
    },
    SetDamage {
        name: String,
        damage: i32,
    },
    SetInitiative {
        name: String,
        initiative: i32,
    },
    SetNotes {
        name: String,
        notes: String,
    },
    SetRound(i32),
    Load(SavedEncounter),
    Reinforce(Reinforcement),
    /// A key released anywhere on the page.
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    RosterSet(usize),
    Sorted,
    TurnAdvanced(TurnAdvance),
    DamageChanged { name: String, change: DamageChange },
    Updated(String),
    RoundSet(i32),
    Loaded(LoadReport),
    Reinforced(Vec<String>),
    Ignored,
}

impl TrackerEvent {
    /// The round counter moved and session storage needs the new value.
    pub fn round_changed(&self) -> bool {
        match self {
            TrackerEvent::TurnAdvanced(adv) => adv.rounds_started > 0,
            TrackerEvent::RoundSet(_) => true,
            _ => false,
        }
    }
}

impl Tracker {
    pub fn dispatch(&mut self, action: TrackerAction) -> TrackerResult<TrackerEvent> {
        match action {
            TrackerAction::SetRoster(entries) => self.set_roster(entries),
            TrackerAction::SortByInitiative => {
                self.sort_initiative();
                Ok(TrackerEvent::Sorted)
            }
            TrackerAction::AdvanceTurn => {
                let adv = self.next_turn()?;
                if adv.skipped > 0 {
                    log::debug!("passed over {} dead participants", adv.skipped);
                }
                if adv.rounds_started > 0 {
                    log::info!("round {} begins", adv.round);
                }
                Ok(TrackerEvent::TurnAdvanced(adv))
            }
            TrackerAction::ApplyDamage {
                name,
                outcome,
                amount,
            } => {
                let change = self.apply_dialog(&name, outcome, amount)?;
                if change.status_changed {
                    log::info!("{} is {}", name, if change.dead { "down" } else { "back up" });
                }
                Ok(TrackerEvent::DamageChanged { name, change })
            }
            TrackerAction::SetDamage { name, damage } => {
                let change = self.set_damage(&name, damage)?;
                Ok(TrackerEvent::DamageChanged { name, change })
            }
            TrackerAction::SetInitiative { name, initiative } => {
                self.find_mut(&name)?.initiative = initiative;
                Ok(TrackerEvent::Updated(name))
            }
            TrackerAction::SetNotes { name, notes } => {
                self.find_mut(&name)?.notes = notes;
                Ok(TrackerEvent::Updated(name))
            }
            TrackerAction::SetRound(round) => {
                self.set_round(round)?;
                Ok(TrackerEvent::RoundSet(round))
            }
            TrackerAction::Load(saved) => {
                let report = self.load(&saved)?;
                log::info!("loaded encounter file, {} rows applied", report.applied);
                Ok(TrackerEvent::Loaded(report))
            }
            TrackerAction::Reinforce(r) => Ok(TrackerEvent::Reinforced(self.reinforce(&r)?)),
            TrackerAction::Key(key) if key == NEXT_TURN_KEY => {
                self.dispatch(TrackerAction::AdvanceTurn)
            }
            TrackerAction::Key(_) => Ok(TrackerEvent::Ignored),
        }
    }

    fn set_roster(&mut self, entries: Vec<RosterEntry>) -> TrackerResult<TrackerEvent> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(TrackerError::DuplicateParticipant(entry.name.clone()));
            }
        }
        let stat_blocks: BTreeMap<_, _> = entries
            .iter()
            .filter_map(RosterEntry::stat_block)
            .map(|block| (block.name.clone(), block))
            .collect();
        let participants = entries
            .into_iter()
            .map(RosterEntry::into_participant)
            .collect::<TrackerResult<Vec<_>>>()?;

        let round = self.round;
        *self = Tracker::new(participants);
        self.round = round;
        self.stat_blocks = stat_blocks;
        log::info!("roster set with {} participants", self.len());
        Ok(TrackerEvent::RosterSet(self.len()))
    }
}
