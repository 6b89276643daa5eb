//! Skill resolution.

use std::collections::BTreeMap;

use crate::actor::{Ability, Actor};
use crate::prepare::PrepContext;
use crate::proficiency::ProficiencyLevel;

/// Passive bonus from the Observant feat.
const OBSERVANT_BONUS: i32 = 5;

/// Fill the derived fields of every skill. Vehicles have no skills.
pub fn prepare_skills(actor: &mut Actor, ctx: &PrepContext) {
    if actor.is_vehicle() {
        return;
    }

    let prof = actor.attributes.prof;
    let flags = actor.flags.clone();
    let global_check = ctx.bonus(&actor.bonuses.abilities.check);
    let global_skill = ctx.bonus(&actor.bonuses.abilities.skill);
    let transform = actor.transform.clone();

    // (modifier, the ability's own check bonus)
    let abilities: BTreeMap<Ability, (i32, i32)> = actor
        .abilities
        .iter()
        .map(|(ability, block)| (*ability, (block.modifier, ctx.bonus(&block.bonuses.check))))
        .collect();

    for (skill, block) in actor.skills.iter_mut() {
        let mut multiplier = ProficiencyLevel::from_multiplier(block.value).multiplier();
        let mut round_down = true;

        if multiplier < 0.5 {
            if flags.remarkable_athlete && block.ability.is_physical() {
                multiplier = 0.5;
                round_down = false;
            } else if flags.jack_of_all_trades {
                multiplier = 0.5;
            }
        }

        if let Some(original) = transform.as_ref().and_then(|t| t.original_skill(*skill)) {
            multiplier = multiplier.max(ProficiencyLevel::from_multiplier(original).multiplier());
        }

        let (ability_mod, ability_check) = abilities.get(&block.ability).copied().unwrap_or((0, 0));

        block.proficient = ProficiencyLevel::from_multiplier(multiplier);
        block.modifier = ability_mod;
        block.bonus = [global_check, ability_check, global_skill]
            .into_iter()
            .fold(ctx.bonus(&block.bonuses.check), i32::saturating_add);
        block.prof = ctx.proficiency(prof, multiplier).with_round_down(round_down);
        block.total = block
            .modifier
            .saturating_add(block.bonus)
            .saturating_add(block.prof.numeric_flat());

        let observant = if flags.observant_feat && skill.is_observant() {
            OBSERVANT_BONUS
        } else {
            0
        };
        block.passive = [
            block.modifier,
            block.bonus,
            block.prof.flat(),
            observant,
            ctx.bonus(&block.bonuses.passive),
        ]
        .into_iter()
        .fold(10, i32::saturating_add);
    }
}
