//! Dice expressions for encounter sizes and initiative rolls.
//!
//! Sizes come from page data attributes as `XdY + B` or a bare `B`.
//! Rolls use a seeded RNG; the page supplies the seed with each request so
//! the worker never needs an entropy source.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::{MAX_DICE_COUNT, MAX_DICE_SIDES};
use crate::error::{TrackerError, TrackerResult};

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll one die with `sides` faces (1..=sides).
    pub fn roll(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// `count` dice of `sides` faces plus a flat `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub base: u32,
}

impl DiceExpr {
    pub fn flat(base: u32) -> Self {
        Self {
            count: 0,
            sides: 0,
            base,
        }
    }

    /// Parse `XdY + B`, `XdY`, or `B`. Whitespace is ignored. Counts above
    /// `MAX_DICE_COUNT`, dice above `MAX_DICE_SIDES`, and totals that could
    /// overflow are rejected.
    pub fn parse(input: &str) -> TrackerResult<Self> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let bad = || TrackerError::InvalidDice(input.to_string());
        if compact.is_empty() {
            return Err(bad());
        }

        let (dice, base) = match compact.split_once('+') {
            Some((dice, base)) => (Some(dice), base.parse::<u32>().map_err(|_| bad())?),
            None if compact.contains('d') => (Some(compact.as_str()), 0),
            None => (None, compact.parse::<u32>().map_err(|_| bad())?),
        };

        let Some(dice) = dice else {
            return Ok(Self::flat(base));
        };
        let (count, sides) = dice.split_once('d').ok_or_else(bad)?;
        let count: u32 = count.parse().map_err(|_| bad())?;
        let sides: u32 = sides.parse().map_err(|_| bad())?;
        if sides == 0 || sides > MAX_DICE_SIDES || count > MAX_DICE_COUNT {
            return Err(bad());
        }
        let expr = Self { count, sides, base };
        expr.max().ok_or_else(bad)?;
        Ok(expr)
    }

    pub fn roll(&self, rng: &mut RngState) -> TrackerResult<u32> {
        (0..self.count).try_fold(self.base, |total, _| {
            total
                .checked_add(rng.roll(self.sides))
                .ok_or_else(|| TrackerError::InvalidDice(self.to_string()))
        })
    }

    /// Largest possible total, or `None` if it does not fit in a `u32`.
    pub fn max(&self) -> Option<u32> {
        self.count
            .checked_mul(self.sides)
            .and_then(|dice| dice.checked_add(self.base))
    }
}

impl std::fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.count, self.base) {
            (0, base) => write!(f, "{}", base),
            (count, 0) => write!(f, "{}d{}", count, self.sides),
            (count, base) => write!(f, "{}d{} + {}", count, self.sides, base),
        }
    }
}
