//! Combat participants: one row of the initiative table each.

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Which side a participant fights on. Fixed once the participant exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Enemy,
    Ally,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Enemy => "enemy",
            Side::Ally => "ally",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "player" => Some(Side::Player),
            "enemy" => Some(Side::Enemy),
            "ally" => Some(Side::Ally),
            _ => None,
        }
    }

    /// Players track their own hit points at the table.
    pub fn tracks_health(&self) -> bool {
        !matches!(self, Side::Player)
    }
}

/// Dead iff damage has reached the health threshold.
pub fn update_dead_status(damage: i32, max_health: i32) -> bool {
    damage >= max_health
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub name: String,
    side: Side,
    pub initiative: i32,
    /// `None` for players.
    damage: Option<i32>,
    /// Death threshold. `None` for players.
    max_health: Option<i32>,
    pub notes: String,
    /// Stat block URL, opened as a popup from the name cell.
    pub link: Option<String>,
    dead: bool,
}

impl Participant {
    pub fn player(name: impl Into<String>, initiative: i32) -> Self {
        Self {
            name: name.into(),
            side: Side::Player,
            initiative,
            damage: None,
            max_health: None,
            notes: String::new(),
            link: None,
            dead: false,
        }
    }

    pub fn npc(name: impl Into<String>, side: Side, initiative: i32, max_health: i32) -> Self {
        let mut p = Self {
            name: name.into(),
            side,
            initiative,
            damage: Some(0),
            max_health: Some(max_health),
            notes: String::new(),
            link: None,
            dead: false,
        };
        p.refresh_dead();
        p
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn damage(&self) -> Option<i32> {
        self.damage
    }

    pub fn max_health(&self) -> Option<i32> {
        self.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Recompute `dead` from damage and threshold. Returns the new state.
    pub fn refresh_dead(&mut self) -> bool {
        self.dead = match (self.damage, self.max_health) {
            (Some(damage), Some(max)) => update_dead_status(damage, max),
            _ => false,
        };
        self.dead
    }

    /// Set damage (clamped at 0) and recompute dead status.
    pub fn set_damage(&mut self, damage: i32) -> TrackerResult<()> {
        if !self.side.tracks_health() {
            return Err(TrackerError::NoHealthTrack(self.name.clone()));
        }
        self.damage = Some(damage.max(0));
        self.refresh_dead();
        Ok(())
    }
}

/// Creature template NPC rows are numbered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBlock {
    pub name: String,
    pub initiative_mod: i32,
    pub max_health: i32,
    pub link: Option<String>,
}

/// `"Goblin 2"` -> `"Goblin"`. Names without a trailing number are kept.
pub fn base_name(name: &str) -> &str {
    match name.trim().rsplit_once(' ') {
        Some((base, n)) if !base.is_empty() && n.parse::<u32>().is_ok() => base,
        _ => name.trim(),
    }
}

/// A participant as posted by the server-rendered page on load.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub initiative: i32,
    #[serde(default, alias = "max_hp")]
    pub max_health: Option<i32>,
    #[serde(default)]
    pub damage: Option<i32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Stat block the row was built from; defaults to the name without its
    /// trailing number ("Goblin 2" -> "Goblin").
    #[serde(default)]
    pub stats: Option<String>,
    #[serde(default)]
    pub initiative_mod: i32,
}

impl RosterEntry {
    /// Stat block for later reinforcements. Players have none.
    pub fn stat_block(&self) -> Option<StatBlock> {
        let max_health = self.max_health.filter(|_| self.side.tracks_health())?;
        let name = match &self.stats {
            Some(stats) if !stats.trim().is_empty() => stats.trim().to_string(),
            _ => base_name(&self.name).to_string(),
        };
        Some(StatBlock {
            name,
            initiative_mod: self.initiative_mod,
            max_health,
            link: self.link.clone().filter(|l| !l.is_empty()),
        })
    }

    pub fn into_participant(self) -> TrackerResult<Participant> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::MissingField("name"));
        }
        let mut p = if self.side.tracks_health() {
            let max = self.max_health.ok_or(TrackerError::MissingField("max_health"))?;
            let mut p = Participant::npc(self.name, self.side, self.initiative, max);
            p.set_damage(self.damage.unwrap_or(0))?;
            p
        } else {
            Participant::player(self.name, self.initiative)
        };
        p.notes = self.notes;
        p.link = self.link.filter(|l| !l.is_empty());
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_iff_damage_reaches_threshold() {
        for max in [1, 5, 10] {
            for damage in 0..=12 {
                assert_eq!(update_dead_status(damage, max), damage >= max);
            }
        }
    }

    #[test]
    fn npc_dead_after_enough_damage() {
        let mut p = Participant::npc("Goblin 1", Side::Enemy, 12, 7);
        assert!(!p.is_dead());
        p.set_damage(7).unwrap();
        assert!(p.is_dead());
        p.set_damage(6).unwrap();
        assert!(!p.is_dead());
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut p = Participant::npc("Wolf 1", Side::Ally, 10, 11);
        p.set_damage(-4).unwrap();
        assert_eq!(p.damage, Some(0));
    }

    #[test]
    fn players_have_no_health_track() {
        let mut p = Participant::player("Aria", 15);
        assert_eq!(
            p.set_damage(3),
            Err(TrackerError::NoHealthTrack("Aria".to_string()))
        );
        assert!(!p.refresh_dead());
    }

    #[test]
    fn roster_entry_requires_threshold_for_npcs() {
        let entry: RosterEntry =
            serde_json::from_str(r#"{"name":"Orc 1","type":"enemy","initiative":9}"#).unwrap();
        assert_eq!(
            entry.into_participant(),
            Err(TrackerError::MissingField("max_health"))
        );
    }

    #[test]
    fn roster_entry_accepts_max_hp_alias() {
        let entry: RosterEntry = serde_json::from_str(
            r#"{"name":"Orc 1","type":"enemy","initiative":9,"max_hp":15,"damage":15,"link":"/creatures/orc"}"#,
        )
        .unwrap();
        let p = entry.into_participant().unwrap();
        assert_eq!(p.max_health, Some(15));
        assert!(p.is_dead());
        assert_eq!(p.link.as_deref(), Some("/creatures/orc"));
    }

    #[test]
    fn stat_block_from_roster_entry() {
        let entry: RosterEntry = serde_json::from_str(
            r#"{"name":"Goblin 2","type":"enemy","initiative":9,"max_health":7,"initiative_mod":2,"link":"/creatures/goblin"}"#,
        )
        .unwrap();
        let block = entry.stat_block().unwrap();
        assert_eq!(block.name, "Goblin");
        assert_eq!(block.initiative_mod, 2);
        assert_eq!(block.max_health, 7);
        assert_eq!(block.link.as_deref(), Some("/creatures/goblin"));

        let named: RosterEntry = serde_json::from_str(
            r#"{"name":"Boss","type":"enemy","initiative":9,"max_health":40,"stats":"Ogre"}"#,
        )
        .unwrap();
        assert_eq!(named.stat_block().unwrap().name, "Ogre");

        let player: RosterEntry =
            serde_json::from_str(r#"{"name":"Aria","type":"player","initiative":15}"#).unwrap();
        assert!(player.stat_block().is_none());
    }

    #[test]
    fn base_name_strips_trailing_number() {
        assert_eq!(base_name("Goblin 12"), "Goblin");
        assert_eq!(base_name("Giant Spider 3"), "Giant Spider");
        assert_eq!(base_name("Strahd"), "Strahd");
        assert_eq!(base_name("42"), "42");
    }

    #[test]
    fn side_parses_known_names_only() {
        assert_eq!(Side::parse("ally"), Some(Side::Ally));
        assert_eq!(Side::parse("enemy dead"), None);
        assert_eq!(Side::Enemy.as_str(), "enemy");
    }
}
