//! The preparation pass.
//!
//! Every derived block is recomputed from authored data on each call to
//! [`SheetEngine::prepare`]. Stale derived values are discarded, never
//! patched. Resolvers run in a fixed order because each reads what the
//! previous ones produced:
//!
//! 1. base data per actor kind (level, proficiency bonus, experience)
//! 2. ability modifiers, then roll data
//! 3. abilities and saves, encumbrance, skills, initiative
//! 4. spell save DC and spell slots
//! 5. armor class, against freshly rebuilt roll data

use std::sync::Arc;
use tracing::debug;

use crate::abilities::{prepare_abilities, prepare_initiative};
use crate::actor::{ability_modifier, Actor, ActorDetails};
use crate::armor::{prepare_armor_class, AcWarning};
use crate::config::{challenge_experience, level_experience, RulesConfig};
use crate::encumbrance::prepare_encumbrance;
use crate::formula::{simplify_bonus, Evaluator, Formula, FormulaEvaluator, RollData};
use crate::items::ItemId;
use crate::proficiency::Proficiency;
use crate::skills::prepare_skills;
use crate::spellcasting::prepare_spellcasting;

/// Shared inputs for one resolver pass.
pub struct PrepContext<'a> {
    pub config: &'a RulesConfig,
    pub evaluator: &'a dyn Evaluator,
    pub roll_data: RollData,
}

impl<'a> PrepContext<'a> {
    pub fn new(config: &'a RulesConfig, evaluator: &'a dyn Evaluator, roll_data: RollData) -> Self {
        Self {
            config,
            evaluator,
            roll_data,
        }
    }

    /// Evaluate an authored bonus; failures count as 0.
    pub fn bonus(&self, formula: &Formula) -> i32 {
        simplify_bonus(self.evaluator, formula, &self.roll_data)
    }

    /// A proficiency in the configured mode, rounding down.
    pub fn proficiency(&self, base: i32, multiplier: f64) -> Proficiency {
        Proficiency::new(base, multiplier).with_dice(self.config.uses_proficiency_dice())
    }
}

/// What a preparation pass reports back besides the mutated actor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preparation {
    pub warnings: Vec<AcWarning>,
    pub equipped_armor: Option<ItemId>,
    pub equipped_shield: Option<ItemId>,
}

/// Computes derived attributes for actors.
#[derive(Clone)]
pub struct SheetEngine {
    config: Arc<RulesConfig>,
    evaluator: Arc<dyn Evaluator>,
}

impl Default for SheetEngine {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}

impl SheetEngine {
    pub fn new(config: RulesConfig) -> Self {
        Self {
            config: Arc::new(config),
            evaluator: Arc::new(FormulaEvaluator),
        }
    }

    /// Use a different formula evaluator.
    pub fn with_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// Recompute every derived block of `actor`.
    pub fn prepare(&self, actor: &mut Actor) -> Preparation {
        let config = self.config.as_ref();
        let npc_spell_level = prepare_base(actor, config);

        for block in actor.abilities.values_mut() {
            block.modifier = ability_modifier(block.value);
        }

        let mut ctx = PrepContext::new(config, self.evaluator.as_ref(), actor.roll_data());
        prepare_abilities(actor, &ctx);
        prepare_encumbrance(actor, config);
        prepare_skills(actor, &ctx);
        prepare_initiative(actor, &ctx);

        actor.attributes.spelldc = actor
            .attributes
            .spellcasting
            .and_then(|ability| actor.abilities.get(&ability))
            .map(|block| block.dc)
            .unwrap_or(8i32.saturating_add(actor.attributes.prof));
        prepare_spellcasting(actor, config, npc_spell_level);

        ctx.roll_data = actor.roll_data();
        prepare_armor_class(actor, &ctx);

        let ac = &actor.attributes.ac;
        debug!(
            actor = %actor.name,
            level = actor.level(),
            prof = actor.attributes.prof,
            ac = ac.value,
            warnings = ac.warnings.len(),
            "prepared actor"
        );

        Preparation {
            warnings: ac.warnings.clone(),
            equipped_armor: ac.equipped_armor,
            equipped_shield: ac.equipped_shield,
        }
    }
}

/// Per-kind base data. Returns the effective NPC spellcaster level, if any.
fn prepare_base(actor: &mut Actor, config: &RulesConfig) -> Option<i32> {
    let has_spellcasting = actor.attributes.spellcasting.is_some();
    let (level, hit_dice) = actor
        .class_data()
        .iter()
        .fold((0i32, 0i32), |(level, hd), class| {
            (
                level.saturating_add(class.effective_levels()),
                hd.saturating_add(class.hit_dice_available()),
            )
        });

    match &mut actor.details {
        ActorDetails::Character(details) => {
            let level = level.min(config.max_level);
            details.level = level;
            actor.attributes.hd = hit_dice;
            actor.attributes.prof = (level + 7).div_euclid(4);

            let xp = &mut details.xp;
            xp.min = level_experience(level.max(1));
            xp.max = level_experience(level.max(1) + 1);
            let required = xp.max.saturating_sub(xp.min);
            xp.pct = if required == 0 {
                100.0
            } else {
                let gained = xp.value as f64 - xp.min as f64;
                (gained * 100.0 / required as f64).round().clamp(0.0, 100.0)
            };
            None
        }
        ActorDetails::Npc(details) => {
            details.xp.value = challenge_experience(details.cr);
            actor.attributes.prof = ((details.cr.max(1.0) + 7.0) / 4.0).floor() as i32;
            details.effective_spell_level(has_spellcasting)
        }
        ActorDetails::Vehicle => None,
    }
}
