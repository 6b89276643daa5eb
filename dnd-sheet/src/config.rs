//! Rules configuration threaded into every resolver.
//!
//! Settings a host would normally keep in a global settings store (units,
//! rest variant, slot tables) live here as one immutable value.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

use crate::actor::Size;
use crate::armor::AcCalc;

/// Errors from loading a rules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Spell slots per spell level (1-9) for caster levels 1-20.
pub const SPELL_SLOT_TABLE: [[u8; 9]; 20] = [
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

/// Experience required to reach each character level.
pub const CHARACTER_XP_TABLE: [u32; 20] = [
    0, 300, 900, 2700, 6500, 14000, 23000, 34000, 48000, 64000, 85000, 100000, 120000, 140000,
    165000, 195000, 225000, 265000, 305000, 355000,
];

/// Experience awarded per challenge rating 0-30.
pub const CR_XP_TABLE: [u32; 31] = [
    10, 200, 450, 700, 1100, 1800, 2300, 2900, 3900, 5000, 5900, 7200, 8400, 10000, 11500, 13000,
    15000, 18000, 20000, 22000, 25000, 33000, 41000, 50000, 62000, 75000, 90000, 105000, 120000,
    135000, 155000,
];

lazy_static! {
    /// Built-in armor class formulas by calculation id.
    pub static ref DEFAULT_ARMOR_FORMULAS: BTreeMap<String, String> = [
        ("default", "@attributes.ac.armor + @attributes.ac.dex"),
        ("mage", "13 + @abilities.dex.mod"),
        ("draconic", "13 + @abilities.dex.mod"),
        ("unarmoredMonk", "10 + @abilities.dex.mod + @abilities.wis.mod"),
        ("unarmoredBarb", "10 + @abilities.dex.mod + @abilities.con.mod"),
    ]
    .into_iter()
    .map(|(id, formula)| (id.to_string(), formula.to_string()))
    .collect();
}

/// Unit system used for carrying capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnits {
    #[default]
    Imperial,
    Metric,
}

/// Variant resting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestVariant {
    #[default]
    Normal,
    /// Short rests last 8 hours, long rests a week.
    Gritty,
    /// Short rests last a minute, long rests an hour.
    Epic,
}

impl RestVariant {
    pub fn short_rest_minutes(&self) -> u32 {
        match self {
            RestVariant::Normal => 60,
            RestVariant::Gritty => 480,
            RestVariant::Epic => 1,
        }
    }

    pub fn long_rest_minutes(&self) -> u32 {
        match self {
            RestVariant::Normal => 480,
            RestVariant::Gritty => 10080,
            RestVariant::Epic => 60,
        }
    }

    /// Whether the user is asked if a new day has begun.
    pub fn prompts_new_day(&self, long_rest: bool) -> bool {
        if long_rest {
            *self != RestVariant::Gritty
        } else {
            *self != RestVariant::Epic
        }
    }

    /// Initial answer to the new-day question.
    pub fn default_new_day(&self, long_rest: bool) -> bool {
        long_rest && *self != RestVariant::Epic
    }
}

/// How proficiency is added to rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyMode {
    #[default]
    Bonus,
    /// Roll a proficiency die instead of adding a flat bonus.
    Dice,
}

/// Encumbrance constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncumbranceRules {
    pub currency_per_weight_imperial: f64,
    pub currency_per_weight_metric: f64,
    pub strength_multiplier_imperial: f64,
    pub strength_multiplier_metric: f64,
}

impl Default for EncumbranceRules {
    fn default() -> Self {
        Self {
            currency_per_weight_imperial: 50.0,
            currency_per_weight_metric: 110.0,
            strength_multiplier_imperial: 15.0,
            strength_multiplier_metric: 6.8,
        }
    }
}

impl EncumbranceRules {
    pub fn currency_per_weight(&self, units: WeightUnits) -> f64 {
        match units {
            WeightUnits::Imperial => self.currency_per_weight_imperial,
            WeightUnits::Metric => self.currency_per_weight_metric,
        }
    }

    pub fn strength_multiplier(&self, units: WeightUnits) -> f64 {
        match units {
            WeightUnits::Imperial => self.strength_multiplier_imperial,
            WeightUnits::Metric => self.strength_multiplier_metric,
        }
    }
}

/// Everything the engine needs to know about the table's rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub units: WeightUnits,

    /// Whether coins count toward carried weight.
    pub currency_weight: bool,

    pub rest_variant: RestVariant,

    pub proficiency_mode: ProficiencyMode,

    /// Highest character or caster level.
    pub max_level: i32,

    /// Slot counts per caster level, one row per level starting at 1.
    pub spell_slot_table: Vec<[u8; 9]>,

    pub encumbrance: EncumbranceRules,

    /// Carrying capacity multiplier per creature size.
    pub size_multipliers: BTreeMap<Size, f64>,

    /// Armor class formulas keyed by calculation id.
    pub armor_formulas: BTreeMap<String, String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            units: WeightUnits::default(),
            currency_weight: true,
            rest_variant: RestVariant::default(),
            proficiency_mode: ProficiencyMode::default(),
            max_level: 20,
            spell_slot_table: SPELL_SLOT_TABLE.to_vec(),
            encumbrance: EncumbranceRules::default(),
            size_multipliers: Size::all()
                .iter()
                .map(|size| (*size, size.default_carry_multiplier()))
                .collect(),
            armor_formulas: DEFAULT_ARMOR_FORMULAS.clone(),
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields keep their defaults.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn with_units(mut self, units: WeightUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_currency_weight(mut self, enabled: bool) -> Self {
        self.currency_weight = enabled;
        self
    }

    pub fn with_rest_variant(mut self, variant: RestVariant) -> Self {
        self.rest_variant = variant;
        self
    }

    pub fn with_proficiency_mode(mut self, mode: ProficiencyMode) -> Self {
        self.proficiency_mode = mode;
        self
    }

    pub fn with_max_level(mut self, level: i32) -> Self {
        self.max_level = level;
        self
    }

    /// Override or add an armor class formula.
    pub fn with_armor_formula(mut self, calc: &AcCalc, formula: impl Into<String>) -> Self {
        self.armor_formulas.insert(calc.id().to_string(), formula.into());
        self
    }

    pub fn armor_formula(&self, calc: &AcCalc) -> Option<&str> {
        self.armor_formulas.get(calc.id()).map(String::as_str)
    }

    pub fn default_armor_formula(&self) -> &str {
        self.armor_formula(&AcCalc::Default)
            .unwrap_or("@attributes.ac.armor + @attributes.ac.dex")
    }

    pub fn size_multiplier(&self, size: Size) -> f64 {
        self.size_multipliers
            .get(&size)
            .copied()
            .unwrap_or_else(|| size.default_carry_multiplier())
    }

    /// Slot counts for a caster level. Level 0 has no slots; levels past the
    /// end of the table use the last row.
    pub fn slots_for_level(&self, level: i32) -> [u8; 9] {
        if level <= 0 || self.spell_slot_table.is_empty() {
            return [0; 9];
        }
        let index = (level as usize).min(self.spell_slot_table.len()) - 1;
        self.spell_slot_table[index]
    }

    pub fn uses_proficiency_dice(&self) -> bool {
        self.proficiency_mode == ProficiencyMode::Dice
    }
}

/// Experience needed for a character level, clamped to the table.
pub fn level_experience(level: i32) -> u32 {
    let index = (level.max(1) as usize).min(CHARACTER_XP_TABLE.len()) - 1;
    CHARACTER_XP_TABLE[index]
}

/// Experience awarded for defeating a creature of the given challenge rating.
pub fn challenge_experience(cr: f64) -> u32 {
    if cr < 1.0 {
        return ((200.0 * cr) as u32).max(10);
    }
    let index = (cr.floor() as usize).min(CR_XP_TABLE.len() - 1);
    CR_XP_TABLE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lookup() {
        let config = RulesConfig::default();
        assert_eq!(config.slots_for_level(0), [0; 9]);
        assert_eq!(config.slots_for_level(5), [4, 3, 2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(config.slots_for_level(25), config.slots_for_level(20));
    }

    #[test]
    fn test_slot_lookup_short_table() {
        let mut config = RulesConfig::default();
        config.spell_slot_table.truncate(3);
        assert_eq!(config.slots_for_level(9), [4, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rest_variants() {
        assert_eq!(RestVariant::Normal.long_rest_minutes(), 480);
        assert_eq!(RestVariant::Gritty.long_rest_minutes(), 10080);
        assert_eq!(RestVariant::Epic.short_rest_minutes(), 1);
        assert!(!RestVariant::Gritty.prompts_new_day(true));
        assert!(!RestVariant::Epic.prompts_new_day(false));
        assert!(RestVariant::Normal.default_new_day(true));
        assert!(!RestVariant::Normal.default_new_day(false));
        assert!(!RestVariant::Epic.default_new_day(true));
    }

    #[test]
    fn test_experience_tables() {
        assert_eq!(level_experience(1), 0);
        assert_eq!(level_experience(5), 6500);
        assert_eq!(level_experience(30), 355000);
        assert_eq!(challenge_experience(0.0), 10);
        assert_eq!(challenge_experience(0.25), 50);
        assert_eq!(challenge_experience(0.5), 100);
        assert_eq!(challenge_experience(5.0), 1800);
        assert_eq!(challenge_experience(40.0), 155000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RulesConfig =
            serde_json::from_str(r#"{ "units": "metric", "rest_variant": "gritty" }"#).unwrap();
        assert_eq!(config.units, WeightUnits::Metric);
        assert_eq!(config.rest_variant, RestVariant::Gritty);
        assert_eq!(config.max_level, 20);
        assert_eq!(config.armor_formula(&AcCalc::Mage), Some("13 + @abilities.dex.mod"));
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        tokio::fs::write(&path, r#"{ "currency_weight": false, "max_level": 30 }"#)
            .await
            .unwrap();
        let config = RulesConfig::load_json(&path).await.unwrap();
        assert!(!config.currency_weight);
        assert_eq!(config.max_level, 30);
        assert_eq!(config.encumbrance.strength_multiplier(WeightUnits::Metric), 6.8);
    }
}
