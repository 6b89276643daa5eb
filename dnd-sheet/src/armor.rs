//! Armor class resolution.
//!
//! The calculation mode picks where the base value comes from: a flat
//! number, natural armor, or a formula (named or custom). Shields, bonuses
//! and cover are added on top for every mode except `flat`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::actor::{Ability, Actor};
use crate::formula::{to_integer, Formula};
use crate::items::{ArmorKind, ItemId};
use crate::prepare::PrepContext;

/// Armor class calculation mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AcCalc {
    Flat,
    Natural,
    #[default]
    Default,
    Mage,
    Draconic,
    UnarmoredMonk,
    UnarmoredBarb,
    Custom,
    /// A mode this engine does not recognise. Migrated to `Flat` on preparation.
    Legacy(String),
}

impl AcCalc {
    pub fn id(&self) -> &str {
        match self {
            AcCalc::Flat => "flat",
            AcCalc::Natural => "natural",
            AcCalc::Default => "default",
            AcCalc::Mage => "mage",
            AcCalc::Draconic => "draconic",
            AcCalc::UnarmoredMonk => "unarmoredMonk",
            AcCalc::UnarmoredBarb => "unarmoredBarb",
            AcCalc::Custom => "custom",
            AcCalc::Legacy(id) => id,
        }
    }
}

impl From<String> for AcCalc {
    fn from(id: String) -> Self {
        match id.as_str() {
            "flat" => AcCalc::Flat,
            "natural" => AcCalc::Natural,
            "default" => AcCalc::Default,
            "mage" => AcCalc::Mage,
            "draconic" => AcCalc::Draconic,
            "unarmoredMonk" => AcCalc::UnarmoredMonk,
            "unarmoredBarb" => AcCalc::UnarmoredBarb,
            "custom" => AcCalc::Custom,
            _ => AcCalc::Legacy(id),
        }
    }
}

impl From<AcCalc> for String {
    fn from(calc: AcCalc) -> Self {
        calc.id().to_string()
    }
}

/// Non-fatal problems found while computing armor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcWarning {
    MultipleArmor,
    MultipleShields,
    BadFormula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorClassBlock {
    #[serde(default)]
    pub calc: AcCalc,
    /// Fixed value for `flat`, natural armor floor for `natural`.
    #[serde(default)]
    pub flat: Option<i32>,
    /// Formula for `custom` mode.
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub bonus: i32,
    #[serde(default)]
    pub cover: i32,

    #[serde(default = "unarmored")]
    pub armor: i32,
    #[serde(default)]
    pub dex: i32,
    #[serde(default)]
    pub base: i32,
    #[serde(default)]
    pub shield: i32,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub warnings: Vec<AcWarning>,
    #[serde(default)]
    pub equipped_armor: Option<ItemId>,
    #[serde(default)]
    pub equipped_shield: Option<ItemId>,
}

fn unarmored() -> i32 {
    10
}

impl Default for ArmorClassBlock {
    fn default() -> Self {
        Self {
            calc: AcCalc::Default,
            flat: None,
            formula: String::new(),
            bonus: 0,
            cover: 0,
            armor: unarmored(),
            dex: 0,
            base: 0,
            shield: 0,
            value: 0,
            warnings: Vec::new(),
            equipped_armor: None,
            equipped_shield: None,
        }
    }
}

impl ArmorClassBlock {
    pub fn flat(value: i32) -> Self {
        Self {
            calc: AcCalc::Flat,
            flat: Some(value),
            ..Default::default()
        }
    }

    pub fn with_calc(mut self, calc: AcCalc) -> Self {
        self.calc = calc;
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.calc = AcCalc::Custom;
        self.formula = formula.into();
        self
    }

    fn reset_derived(&mut self) {
        self.armor = unarmored();
        self.dex = 0;
        self.base = 0;
        self.shield = 0;
        self.warnings.clear();
        self.equipped_armor = None;
        self.equipped_shield = None;
    }
}

/// Compute `attributes.ac` from the actor's equipment and calculation mode.
pub fn prepare_armor_class(actor: &mut Actor, ctx: &PrepContext) {
    let dex_mod = actor.ability_mod(Ability::Dexterity);

    let mut armors = Vec::new();
    let mut shields = Vec::new();
    for item in actor.sorted_items() {
        let Some(armor) = item.equipped_armor() else {
            continue;
        };
        if armor.kind.is_armor() {
            armors.push((item.id, armor.clone()));
        } else if armor.kind.is_shield() {
            shields.push((item.id, armor.clone()));
        }
    }

    let ac = &mut actor.attributes.ac;
    ac.reset_derived();

    if let AcCalc::Legacy(id) = &ac.calc {
        warn!(calc = id.as_str(), "unknown armor class mode migrated to flat");
        ac.calc = AcCalc::Flat;
        ac.flat = Some(ac.value);
    }

    match ac.calc {
        AcCalc::Flat => {
            ac.value = ac.flat.unwrap_or(0);
            return;
        }
        AcCalc::Natural => {
            ac.base = ac.flat.unwrap_or(0);
        }
        _ => {
            if armors.len() > 1 {
                ac.warnings.push(AcWarning::MultipleArmor);
            }
            match armors.first() {
                Some((id, armor)) => {
                    ac.armor = armor.value.unwrap_or(ac.armor);
                    ac.dex = if armor.kind == ArmorKind::Heavy {
                        0
                    } else {
                        armor.dex.map_or(dex_mod, |cap| cap.min(dex_mod))
                    };
                    ac.equipped_armor = Some(*id);
                }
                None => ac.dex = dex_mod,
            }

            let formula = match ac.calc {
                AcCalc::Custom => Some(ac.formula.clone()),
                ref calc => ctx.config.armor_formula(calc).map(str::to_string),
            };

            let mut data = ctx.roll_data.clone();
            data.insert("attributes.ac.armor", json!(ac.armor));
            data.insert("attributes.ac.dex", json!(ac.dex));

            let evaluated = formula.and_then(|f| {
                ctx.evaluator
                    .simplify(&Formula::new(f.as_str()), &data)
                    .and_then(to_integer)
                    .map_err(|err| {
                        warn!(calc = ac.calc.id(), formula = f.as_str(), error = %err, "armor class formula failed");
                    })
                    .ok()
            });
            ac.base = match evaluated {
                Some(base) => base,
                None => {
                    ac.warnings.push(AcWarning::BadFormula);
                    let fallback = Formula::new(ctx.config.default_armor_formula());
                    match ctx.evaluator.simplify(&fallback, &data).and_then(to_integer) {
                        Ok(base) => base,
                        Err(err) => {
                            error!(error = %err, "default armor class formula failed");
                            0
                        }
                    }
                }
            };
        }
    }

    if shields.len() > 1 {
        ac.warnings.push(AcWarning::MultipleShields);
    }
    if let Some((id, shield)) = shields.first() {
        ac.shield = shield.value.unwrap_or(0);
        ac.equipped_shield = Some(*id);
    }

    ac.value = ac
        .base
        .saturating_add(ac.shield)
        .saturating_add(ac.bonus)
        .saturating_add(ac.cover);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::formula::FormulaEvaluator;
    use crate::items::Item;

    fn prepare(actor: &mut Actor, config: &RulesConfig) {
        for block in actor.abilities.values_mut() {
            block.modifier = crate::actor::ability_modifier(block.value);
        }
        let ctx = PrepContext::new(config, &FormulaEvaluator, actor.roll_data());
        prepare_armor_class(actor, &ctx);
    }

    fn dex_actor(dex: i32) -> Actor {
        Actor::character("Test", 10).with_ability(Ability::Dexterity, dex)
    }

    #[test]
    fn test_unarmored_default() {
        let mut actor = dex_actor(14);
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.base, 12);
        assert_eq!(actor.attributes.ac.value, 12);
        assert!(actor.attributes.ac.warnings.is_empty());
    }

    #[test]
    fn test_medium_armor_caps_dex() {
        let mut actor = dex_actor(18)
            .with_item(Item::armor("Scale Mail", ArmorKind::Medium, 14, Some(2)).equipped());
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.dex, 2);
        assert_eq!(actor.attributes.ac.value, 16);
    }

    #[test]
    fn test_heavy_armor_ignores_dex() {
        let mut actor = dex_actor(18)
            .with_item(Item::armor("Plate", ArmorKind::Heavy, 18, None).equipped())
            .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped());
        actor.attributes.ac.bonus = 1;
        actor.attributes.ac.cover = 2;
        prepare(&mut actor, &RulesConfig::default());
        let ac = &actor.attributes.ac;
        assert_eq!(ac.dex, 0);
        assert_eq!(ac.base, 18);
        assert_eq!(ac.shield, 2);
        assert_eq!(ac.value, 23);
        assert!(ac.equipped_armor.is_some());
        assert!(ac.equipped_shield.is_some());
    }

    #[test]
    fn test_flat_ignores_shield() {
        let mut actor = dex_actor(14)
            .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped());
        actor.attributes.ac = ArmorClassBlock::flat(15);
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.value, 15);
        assert_eq!(actor.attributes.ac.shield, 0);
    }

    #[test]
    fn test_natural_adds_shield() {
        let mut actor = dex_actor(14)
            .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped());
        actor.attributes.ac = ArmorClassBlock::flat(13).with_calc(AcCalc::Natural);
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.value, 15);
    }

    #[test]
    fn test_multiple_armor_first_wins() {
        let mut actor = dex_actor(10)
            .with_item(Item::armor("Leather", ArmorKind::Light, 11, None).equipped().with_sort(1))
            .with_item(Item::armor("Chain", ArmorKind::Heavy, 16, None).equipped().with_sort(2))
            .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped().with_sort(3))
            .with_item(Item::armor("Shield", ArmorKind::Shield, 3, None).equipped().with_sort(4));
        prepare(&mut actor, &RulesConfig::default());
        let ac = &actor.attributes.ac;
        assert_eq!(ac.armor, 11);
        assert_eq!(ac.shield, 2);
        assert_eq!(
            ac.warnings,
            vec![AcWarning::MultipleArmor, AcWarning::MultipleShields]
        );
    }

    #[test]
    fn test_named_formula() {
        let mut actor = dex_actor(16).with_ability(Ability::Wisdom, 14);
        actor.attributes.ac = ArmorClassBlock::default().with_calc(AcCalc::UnarmoredMonk);
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.value, 15);
    }

    #[test]
    fn test_bad_custom_formula_falls_back() {
        let mut actor = dex_actor(14);
        actor.attributes.ac = ArmorClassBlock::default().with_formula("10 + @nothing.here");
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.warnings, vec![AcWarning::BadFormula]);
        assert_eq!(actor.attributes.ac.value, 12);
    }

    #[test]
    fn test_out_of_range_values_do_not_overflow() {
        let mut actor = dex_actor(14);
        actor.attributes.ac = ArmorClassBlock::default().with_formula("99999999999");
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.warnings, vec![AcWarning::BadFormula]);
        assert_eq!(actor.attributes.ac.value, 12);

        let mut actor = dex_actor(14)
            .with_item(Item::armor("Shield", ArmorKind::Shield, i32::MAX, None).equipped());
        actor.attributes.ac.bonus = i32::MAX;
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.value, i32::MAX);
    }

    #[test]
    fn test_legacy_calc_migrates() {
        let json = serde_json::json!({ "calc": "equipment", "value": 17 });
        let block: ArmorClassBlock = serde_json::from_value(json).unwrap();
        let mut actor = dex_actor(14);
        actor.attributes.ac = block;
        prepare(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.ac.calc, AcCalc::Flat);
        assert_eq!(actor.attributes.ac.flat, Some(17));
        assert_eq!(actor.attributes.ac.value, 17);
    }
}
