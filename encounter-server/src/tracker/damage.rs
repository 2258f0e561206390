//! Damage and healing from the health dialog.
//!
//! The dialog closes with the value of the button that was pressed:
//! `damage_button` adds the entered amount, `heal_button` subtracts it,
//! anything else (escape, backdrop click) leaves the row untouched.

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::state::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Damage,
    Heal,
    Cancel,
}

impl DialogOutcome {
    pub fn from_return_value(value: &str) -> Self {
        match value {
            "damage_button" => DialogOutcome::Damage,
            "heal_button" => DialogOutcome::Heal,
            _ => DialogOutcome::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageChange {
    pub damage: i32,
    pub dead: bool,
    /// `dead` flipped as a result of this change.
    pub status_changed: bool,
}

impl Tracker {
    /// Apply a closed health dialog to the named participant.
    pub fn apply_dialog(
        &mut self,
        name: &str,
        outcome: DialogOutcome,
        amount: i32,
    ) -> TrackerResult<DamageChange> {
        if amount < 0 {
            return Err(TrackerError::invalid("dialog value", amount.to_string()));
        }
        let participant = self.find_mut(name)?;
        let current = participant
            .damage()
            .ok_or_else(|| TrackerError::NoHealthTrack(name.to_string()))?;
        let was_dead = participant.is_dead();

        let next = match outcome {
            DialogOutcome::Damage => current.saturating_add(amount),
            DialogOutcome::Heal => current.saturating_sub(amount),
            DialogOutcome::Cancel => current,
        };
        participant.set_damage(next)?;

        Ok(DamageChange {
            damage: participant.damage().unwrap_or(0),
            dead: participant.is_dead(),
            status_changed: was_dead != participant.is_dead(),
        })
    }

    /// Overwrite damage directly (edited in the table cell).
    pub fn set_damage(&mut self, name: &str, damage: i32) -> TrackerResult<DamageChange> {
        let participant = self.find_mut(name)?;
        let was_dead = participant.is_dead();
        participant.set_damage(damage)?;
        Ok(DamageChange {
            damage: participant.damage().unwrap_or(0),
            dead: participant.is_dead(),
            status_changed: was_dead != participant.is_dead(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::participant::{Participant, Side};

    fn tracker() -> Tracker {
        Tracker::new(vec![
            Participant::player("Aria", 15),
            Participant::npc("Goblin 1", Side::Enemy, 10, 10),
        ])
    }

    #[test]
    fn outcome_from_button_value() {
        assert_eq!(DialogOutcome::from_return_value("damage_button"), DialogOutcome::Damage);
        assert_eq!(DialogOutcome::from_return_value("heal_button"), DialogOutcome::Heal);
        assert_eq!(DialogOutcome::from_return_value(""), DialogOutcome::Cancel);
        assert_eq!(DialogOutcome::from_return_value("null"), DialogOutcome::Cancel);
    }

    #[test]
    fn damage_to_threshold_kills_and_blocks_no_more() {
        let mut t = tracker();
        assert!(t.should_block_unload());
        let change = t.apply_dialog("Goblin 1", DialogOutcome::Damage, 10).unwrap();
        assert_eq!(change.damage, 10);
        assert!(change.dead);
        assert!(change.status_changed);
        assert!(!t.should_block_unload());
    }

    #[test]
    fn heal_revives_and_clamps_at_zero() {
        let mut t = tracker();
        t.apply_dialog("Goblin 1", DialogOutcome::Damage, 12).unwrap();
        let change = t.apply_dialog("Goblin 1", DialogOutcome::Heal, 3).unwrap();
        assert_eq!(change.damage, 9);
        assert!(!change.dead);
        assert!(change.status_changed);

        let change = t.apply_dialog("Goblin 1", DialogOutcome::Heal, 50).unwrap();
        assert_eq!(change.damage, 0);
    }

    #[test]
    fn cancel_leaves_damage() {
        let mut t = tracker();
        t.apply_dialog("Goblin 1", DialogOutcome::Damage, 4).unwrap();
        let change = t.apply_dialog("Goblin 1", DialogOutcome::Cancel, 99).unwrap();
        assert_eq!(change.damage, 4);
        assert!(!change.status_changed);
    }

    #[test]
    fn players_and_unknowns_rejected() {
        let mut t = tracker();
        assert_eq!(
            t.apply_dialog("Aria", DialogOutcome::Damage, 1),
            Err(TrackerError::NoHealthTrack("Aria".to_string()))
        );
        assert!(matches!(
            t.apply_dialog("Ghost", DialogOutcome::Damage, 1),
            Err(TrackerError::UnknownParticipant(_))
        ));
    }

    #[test]
    fn negative_amount_rejected() {
        let mut t = tracker();
        assert!(t.apply_dialog("Goblin 1", DialogOutcome::Damage, -3).is_err());
    }

    #[test]
    fn direct_set_recomputes_dead() {
        let mut t = tracker();
        let change = t.set_damage("Goblin 1", 11).unwrap();
        assert!(change.dead);
        let change = t.set_damage("Goblin 1", 2).unwrap();
        assert!(!change.dead);
    }
}
