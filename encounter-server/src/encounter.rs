//! Payloads for `POST /encounter`, the server endpoint that builds a new
//! encounter and redirects to its initiative page.
//!
//! Bestiary pages either carry a ready-made encounter as JSON, or a creature
//! plus a size expression (`2d4 + 1`) for a random-sized group against the
//! party.

use serde::Serialize;
use serde_json::Value;

use crate::dice::{DiceExpr, RngState};
use crate::error::{TrackerError, TrackerResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomEncounter {
    /// `[[count, creature]]`
    pub npcs: Vec<(u32, Value)>,
    pub pcs: Value,
}

impl RandomEncounter {
    pub fn roll(
        size: &DiceExpr,
        creature: Value,
        party: Value,
        rng: &mut RngState,
    ) -> TrackerResult<Self> {
        let count = size.roll(rng)?;
        log::debug!("random encounter size {} from {} (seed {})", count, size, rng.seed());
        Ok(Self {
            npcs: vec![(count, creature)],
            pcs: party,
        })
    }

    pub fn count(&self) -> u32 {
        self.npcs.iter().map(|(n, _)| n).sum()
    }
}

/// Parse a JSON field from a page data attribute.
pub fn parse_field(field: &'static str, raw: &str) -> TrackerResult<Value> {
    if raw.trim().is_empty() {
        return Err(TrackerError::MissingField(field));
    }
    serde_json::from_str(raw).map_err(|e| TrackerError::invalid(field, e.to_string()))
}

/// Validate a ready-made encounter and return it re-serialized.
pub fn prebuilt_body(raw: &str) -> TrackerResult<String> {
    let value = parse_field("encounter", raw)?;
    if !value.is_object() {
        return Err(TrackerError::invalid("encounter", "expected a JSON object"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn random_encounter_shape() {
        let size = DiceExpr::parse("2d4 + 1").unwrap();
        let mut rng = RngState::from_seed(3);
        let enc = RandomEncounter::roll(&size, json!({"name": "Goblin"}), json!(["Aria", "Bram"]), &mut rng)
            .unwrap();
        assert!((3..=9).contains(&enc.count()));

        let body: Value = serde_json::to_value(&enc).unwrap();
        assert_eq!(body["npcs"][0][1]["name"], "Goblin");
        assert_eq!(body["npcs"][0][0], enc.count());
        assert_eq!(body["pcs"], json!(["Aria", "Bram"]));
    }

    #[test]
    fn flat_size_is_exact() {
        let mut rng = RngState::from_seed(0);
        let enc = RandomEncounter::roll(&DiceExpr::flat(4), json!({}), json!([]), &mut rng).unwrap();
        assert_eq!(enc.count(), 4);
    }

    #[test]
    fn prebuilt_must_be_object() {
        assert!(prebuilt_body(r#"{"enemies":[],"allies":[],"pcs":[],"description":""}"#).is_ok());
        assert!(prebuilt_body("[1]").is_err());
        assert!(prebuilt_body("{oops").is_err());
        assert_eq!(prebuilt_body(""), Err(TrackerError::MissingField("encounter")));
    }
}
