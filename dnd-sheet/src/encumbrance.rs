//! Carried weight and carrying capacity.

use serde::{Deserialize, Serialize};

use crate::actor::{Ability, Actor, Size};
use crate::config::RulesConfig;

/// Largest size multiplier Powerful Build can reach.
const MAX_SIZE_MULTIPLIER: f64 = 8.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encumbrance {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub pct: f64,
    #[serde(default)]
    pub encumbered: bool,
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Total carried weight of physical items, plus coins when enabled.
pub fn carried_weight(actor: &Actor, config: &RulesConfig) -> f64 {
    let mut weight: f64 = actor
        .items
        .iter()
        .filter(|item| item.data.kind().is_physical())
        .filter_map(|item| item.physical())
        .map(|physical| physical.quantity as f64 * physical.weight)
        .sum();

    if config.currency_weight {
        let per_unit = config.encumbrance.currency_per_weight(config.units);
        if per_unit > 0.0 {
            weight += actor.currency.coin_count() as f64 / per_unit;
        }
    }
    weight
}

/// Carrying capacity multiplier for a size, doubled by Powerful Build.
pub fn size_multiplier(size: Size, powerful_build: bool, config: &RulesConfig) -> f64 {
    let base = config.size_multiplier(size);
    if powerful_build {
        (base * 2.0).min(MAX_SIZE_MULTIPLIER)
    } else {
        base
    }
}

pub fn prepare_encumbrance(actor: &mut Actor, config: &RulesConfig) {
    let weight = round_tenth(carried_weight(actor, config));
    let strength = actor
        .abilities
        .get(&Ability::Strength)
        .map(|block| block.value)
        .unwrap_or(0) as f64;
    let multiplier = size_multiplier(actor.traits.size, actor.flags.powerful_build, config);
    let max = round_tenth(strength * config.encumbrance.strength_multiplier(config.units) * multiplier);

    let pct = if max > 0.0 {
        (weight * 100.0 / max).clamp(0.0, 100.0)
    } else if weight > 0.0 {
        100.0
    } else {
        0.0
    };

    actor.attributes.encumbrance = Encumbrance {
        value: weight,
        max,
        pct,
        encumbered: pct > 200.0 / 3.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Currency;
    use crate::config::WeightUnits;
    use crate::items::{Item, ItemData, PhysicalData, SpellData};

    fn loot(weight: f64, quantity: u32) -> Item {
        Item::new(
            "Loot",
            ItemData::Loot(PhysicalData {
                quantity,
                weight,
                equipped: false,
            }),
        )
    }

    #[test]
    fn test_weight_and_capacity() {
        let mut actor = Actor::character("Porter", 10)
            .with_ability(Ability::Strength, 10)
            .with_item(loot(2.5, 4))
            .with_item(Item::new("Fireball", ItemData::Spell(SpellData { level: 3 })));
        actor.currency = Currency {
            gp: 100,
            ..Default::default()
        };
        prepare_encumbrance(&mut actor, &RulesConfig::default());
        let enc = &actor.attributes.encumbrance;
        assert_eq!(enc.value, 12.0);
        assert_eq!(enc.max, 150.0);
        assert_eq!(enc.pct, 8.0);
        assert!(!enc.encumbered);
    }

    #[test]
    fn test_currency_toggle() {
        let mut actor = Actor::character("Porter", 10).with_ability(Ability::Strength, 10);
        actor.currency.cp = 500;
        let config = RulesConfig::default().with_currency_weight(false);
        prepare_encumbrance(&mut actor, &config);
        assert_eq!(actor.attributes.encumbrance.value, 0.0);
    }

    #[test]
    fn test_encumbered_boundary_is_strict() {
        // Capacity 150: two thirds is exactly 100.
        let mut actor = Actor::character("Porter", 10)
            .with_ability(Ability::Strength, 10)
            .with_item(loot(100.0, 1));
        let config = RulesConfig::default().with_currency_weight(false);
        prepare_encumbrance(&mut actor, &config);
        assert!(!actor.attributes.encumbrance.encumbered);

        actor.items.push(loot(1.0, 1));
        prepare_encumbrance(&mut actor, &config);
        assert!(actor.attributes.encumbrance.encumbered);
    }

    #[test]
    fn test_powerful_build_and_size() {
        let mut actor = Actor::character("Goliath", 10).with_ability(Ability::Strength, 10);
        actor.flags.powerful_build = true;
        prepare_encumbrance(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.encumbrance.max, 300.0);

        actor.traits.size = Size::Gargantuan;
        prepare_encumbrance(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.encumbrance.max, 1200.0);

        actor.traits.size = Size::Tiny;
        actor.flags.powerful_build = false;
        prepare_encumbrance(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.encumbrance.max, 75.0);
    }

    #[test]
    fn test_metric_units() {
        let mut actor = Actor::character("Porter", 10).with_ability(Ability::Strength, 10);
        actor.currency.gp = 110;
        let config = RulesConfig::default().with_units(WeightUnits::Metric);
        prepare_encumbrance(&mut actor, &config);
        assert_eq!(actor.attributes.encumbrance.max, 68.0);
        assert_eq!(actor.attributes.encumbrance.value, 1.0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut actor = Actor::character("Ghost", 10)
            .with_ability(Ability::Strength, 0)
            .with_item(loot(1.0, 1));
        prepare_encumbrance(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.encumbrance.pct, 100.0);
    }
}
