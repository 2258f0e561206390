//! Encounter save files.
//!
//! A save file maps participant name to its editable state:
//!
//! ```text
//! {
//!   "Aria":     {"type": "player", "initiative": 15, "notes": "inspired"},
//!   "Goblin 1": {"type": "enemy",  "initiative": 10, "notes": "", "damage": 4}
//! }
//! ```
//!
//! Loading only touches participants already in the table. Side is fixed at
//! creation, so a `type` that disagrees with the table is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::config::EXPORT_PREFIX;
use crate::error::{TrackerError, TrackerResult};
use crate::tracker::participant::Side;
use crate::tracker::state::Tracker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub initiative: i32,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
}

impl SavedRow {
    /// Side named by `type`. Only the first class name counts, so
    /// `"enemy dead"` from older files still reads as an enemy.
    pub fn side(&self) -> Option<Side> {
        self.kind.split_whitespace().next().and_then(Side::parse)
    }
}

pub type SavedEncounter = BTreeMap<String, SavedRow>;

/// What a load did, for logging and the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub applied: usize,
    /// Table rows with no entry in the file (left as they were).
    pub missing: Vec<String>,
    /// File entries with no matching row.
    pub unmatched: Vec<String>,
    /// Rows whose saved `type` disagreed with the table.
    pub side_mismatch: Vec<String>,
}

/// Parse and validate an uploaded save file.
pub fn parse_saved(json: &str) -> TrackerResult<SavedEncounter> {
    if json.trim().is_empty() {
        return Err(TrackerError::MissingField("file"));
    }
    serde_json::from_str(json).map_err(|e| TrackerError::MalformedFile(e.to_string()))
}

/// `encounter_2024-05-01T19:04:11.250Z.json`
pub fn export_filename(now: OffsetDateTime) -> TrackerResult<String> {
    let stamp = now
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .map_err(|e| TrackerError::invalid("timestamp", e.to_string()))?;
    Ok(format!("{}{}.json", EXPORT_PREFIX, stamp))
}

impl Tracker {
    pub fn save(&self) -> SavedEncounter {
        self.participants
            .iter()
            .map(|p| {
                let row = SavedRow {
                    kind: p.side().as_str().to_string(),
                    initiative: p.initiative,
                    notes: p.notes.clone(),
                    damage: if p.side().tracks_health() { p.damage() } else { None },
                };
                (p.name.clone(), row)
            })
            .collect()
    }

    pub fn save_json(&self) -> TrackerResult<String> {
        serde_json::to_string(&self.save()).map_err(|e| TrackerError::MalformedFile(e.to_string()))
    }

    /// Apply a save file to matching rows, then re-sort.
    pub fn load(&mut self, saved: &SavedEncounter) -> TrackerResult<LoadReport> {
        let mut report = LoadReport::default();

        for p in self.participants.iter_mut() {
            let Some(row) = saved.get(&p.name) else {
                report.missing.push(p.name.clone());
                continue;
            };
            if row.side() != Some(p.side()) {
                report.side_mismatch.push(p.name.clone());
            }
            p.initiative = row.initiative;
            p.notes = row.notes.clone();
            if p.side().tracks_health() {
                if let Some(damage) = row.damage {
                    p.set_damage(damage)?;
                }
            }
            p.refresh_dead();
            report.applied += 1;
        }

        report.unmatched = saved
            .keys()
            .filter(|name| self.find(name).is_none())
            .cloned()
            .collect();

        for name in &report.missing {
            log::warn!("load: no saved entry for {}, left unchanged", name);
        }
        for name in &report.unmatched {
            log::warn!("load: saved entry {} has no matching row, ignored", name);
        }
        for name in &report.side_mismatch {
            log::warn!("load: saved type for {} differs from the table, kept table side", name);
        }

        self.sort_initiative();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::participant::Participant;
    use time::macros::datetime;

    fn tracker() -> Tracker {
        let mut goblin = Participant::npc("Goblin 1", Side::Enemy, 10, 10);
        goblin.set_damage(4).unwrap();
        goblin.notes = "prone".to_string();
        let mut aria = Participant::player("Aria", 15);
        aria.notes = "inspired".to_string();
        Tracker::new(vec![aria, goblin, Participant::npc("Wolf 1", Side::Ally, 12, 11)])
    }

    #[test]
    fn save_omits_player_damage() {
        let saved = tracker().save();
        assert_eq!(saved["Aria"].kind, "player");
        assert_eq!(saved["Aria"].damage, None);
        assert_eq!(saved["Goblin 1"].damage, Some(4));
        assert_eq!(saved["Goblin 1"].notes, "prone");

        let json: serde_json::Value = serde_json::from_str(&tracker().save_json().unwrap()).unwrap();
        assert!(json["Aria"].get("damage").is_none());
        assert_eq!(json["Goblin 1"]["damage"], 4);
        assert_eq!(json["Wolf 1"]["type"], "ally");
    }

    #[test]
    fn save_then_load_restores_values() {
        let original = tracker();
        let json = original.save_json().unwrap();

        let mut edited = tracker();
        edited.find_mut("Aria").unwrap().initiative = 1;
        edited.find_mut("Aria").unwrap().notes.clear();
        edited.find_mut("Goblin 1").unwrap().set_damage(10).unwrap();
        edited.find_mut("Wolf 1").unwrap().initiative = 30;

        let report = edited.load(&parse_saved(&json).unwrap()).unwrap();
        assert_eq!(report.applied, 3);
        for p in original.participants() {
            let restored = edited.find(&p.name).unwrap();
            assert_eq!(restored.initiative, p.initiative);
            assert_eq!(restored.notes, p.notes);
            assert_eq!(restored.damage(), p.damage());
            assert_eq!(restored.is_dead(), p.is_dead());
        }
        assert_eq!(edited.names(), vec!["Aria", "Wolf 1", "Goblin 1"]);
        assert_eq!(edited.current_turn(), 0);
    }

    #[test]
    fn load_reports_missing_and_unmatched() {
        let mut t = tracker();
        let saved = parse_saved(
            r#"{"Aria":{"type":"player","initiative":3,"notes":""},
                "Dragon":{"type":"enemy","initiative":25,"notes":"","damage":0}}"#,
        )
        .unwrap();
        let report = t.load(&saved).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.missing, vec!["Goblin 1".to_string(), "Wolf 1".to_string()]);
        assert_eq!(report.unmatched, vec!["Dragon".to_string()]);
        assert_eq!(t.find("Goblin 1").unwrap().damage(), Some(4));
    }

    #[test]
    fn load_keeps_table_side() {
        let mut t = tracker();
        let saved = parse_saved(
            r#"{"Wolf 1":{"type":"enemy dead","initiative":12,"notes":"","damage":11}}"#,
        )
        .unwrap();
        let report = t.load(&saved).unwrap();
        assert_eq!(report.side_mismatch, vec!["Wolf 1".to_string()]);
        let wolf = t.find("Wolf 1").unwrap();
        assert_eq!(wolf.side(), Side::Ally);
        assert!(wolf.is_dead());
    }

    #[test]
    fn malformed_files_rejected() {
        assert!(matches!(parse_saved("not json {{"), Err(TrackerError::MalformedFile(_))));
        assert!(matches!(parse_saved("[1, 2]"), Err(TrackerError::MalformedFile(_))));
        assert!(matches!(
            parse_saved(r#"{"Aria":{"type":"player"}}"#),
            Err(TrackerError::MalformedFile(_))
        ));
        assert_eq!(parse_saved("  "), Err(TrackerError::MissingField("file")));
    }

    #[test]
    fn filename_is_iso_utc_with_millis() {
        let name = export_filename(datetime!(2024-05-01 21:04:11.250 +02:00)).unwrap();
        assert_eq!(name, "encounter_2024-05-01T19:04:11.250Z.json");
    }
}
