//! Mid-encounter reinforcements.
//!
//! New NPCs are appended to the bottom of the table and numbered after the
//! NPCs already present ("Goblin 4", "Goblin 5"). Each rolls its own
//! initiative; the table is not re-sorted until the GM asks for it.
//!
//! Reinforcements either reuse a stat block already in the encounter or
//! describe a new creature by name, initiative modifier and hit points.

use crate::config::{INITIATIVE_DIE, MAX_REINFORCEMENTS};
use crate::dice::RngState;
use crate::error::{TrackerError, TrackerResult};
use crate::tracker::participant::{Participant, Side, StatBlock};
use crate::tracker::state::Tracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReinforcementSource {
    /// More of a creature already in the encounter, by stat block name.
    Existing { stats: String },
    New {
        name: String,
        initiative_mod: i32,
        max_health: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reinforcement {
    pub source: ReinforcementSource,
    pub quantity: u32,
    pub side: Side,
    pub seed: u64,
}

impl Tracker {
    /// Add the reinforcements. Returns the names given to them.
    pub fn reinforce(&mut self, r: &Reinforcement) -> TrackerResult<Vec<String>> {
        if r.side == Side::Player {
            return Err(TrackerError::invalid("side", r.side.as_str()));
        }
        if r.quantity == 0 || r.quantity > MAX_REINFORCEMENTS {
            return Err(TrackerError::invalid("quantity", r.quantity.to_string()));
        }
        let block = self.resolve_source(&r.source)?;

        let mut rng = RngState::from_seed(r.seed);
        let mut rolled = Vec::with_capacity(r.quantity as usize);
        for _ in 0..r.quantity {
            let initiative = (rng.roll(INITIATIVE_DIE) as i32)
                .checked_add(block.initiative_mod)
                .ok_or_else(|| {
                    TrackerError::invalid("initiative_mod", block.initiative_mod.to_string())
                })?;
            rolled.push(initiative);
        }

        let mut added = Vec::with_capacity(rolled.len());
        for initiative in rolled {
            let name = self.next_npc_name(&block.name);
            let mut npc = Participant::npc(name.clone(), r.side, initiative, block.max_health);
            npc.link = block.link.clone();
            self.participants.push(npc);
            added.push(name);
        }
        log::info!("reinforced with {} x {} ({})", r.quantity, block.name, r.side.as_str());
        Ok(added)
    }

    fn resolve_source(&self, source: &ReinforcementSource) -> TrackerResult<StatBlock> {
        match source {
            ReinforcementSource::Existing { stats } => self
                .stat_block(stats)
                .cloned()
                .ok_or_else(|| TrackerError::UnknownStatBlock(stats.clone())),
            ReinforcementSource::New {
                name,
                initiative_mod,
                max_health,
            } => {
                if name.trim().is_empty() {
                    return Err(TrackerError::MissingField("name"));
                }
                if *max_health < 1 {
                    return Err(TrackerError::invalid("max_health", max_health.to_string()));
                }
                Ok(StatBlock {
                    name: name.trim().to_string(),
                    initiative_mod: *initiative_mod,
                    max_health: *max_health,
                    link: None,
                })
            }
        }
    }

    fn next_npc_name(&mut self, base: &str) -> String {
        loop {
            let candidate = format!("{} {}", base, self.next_npc_id);
            self.next_npc_id += 1;
            if self.find(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
