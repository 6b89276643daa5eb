//! D&D dice used by the sheet engine.
//!
//! The engine only rolls dice in two places: spending hit dice during a rest
//! and death saving throws. Everything else is evaluated deterministically by
//! [`crate::formula`]. Rolling goes through the [`DiceRoller`] trait so callers
//! (and tests) decide where the randomness comes from.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for die notation parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid die notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
}

/// Standard D&D die types.
///
/// Serialized in the short form used on class items (`"d10"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

impl FromStr for DieType {
    type Err = DiceError;

    /// Parse `"d8"` or `"1d8"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notation = s.trim().to_lowercase();
        let sides = match notation.split_once('d') {
            Some(("", sides)) | Some(("1", sides)) => sides,
            _ => return Err(DiceError::InvalidNotation(s.to_string())),
        };
        let sides: u32 = sides
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))
    }
}

impl TryFrom<String> for DieType {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DieType> for String {
    fn from(die: DieType) -> Self {
        die.to_string()
    }
}

/// Source of die results.
pub trait DiceRoller: Send {
    /// Roll a single die, returning a value in `1..=sides`.
    fn roll(&mut self, die: DieType) -> u32;

    /// Roll one hit die and add the Constitution modifier.
    fn roll_hit_die(&mut self, die: DieType, con_mod: i32) -> i32 {
        self.roll(die) as i32 + con_mod
    }
}

/// A [`DiceRoller`] backed by a seedable RNG.
pub struct RandomRoller {
    rng: StdRng,
}

impl RandomRoller {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic roller (useful for testing and replays).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomRoller {
    fn roll(&mut self, die: DieType) -> u32 {
        self.rng.gen_range(1..=die.sides())
    }
}
