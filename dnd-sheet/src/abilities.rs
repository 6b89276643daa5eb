//! Ability score, saving throw and initiative resolution.

use crate::actor::{ability_modifier, Ability, Actor};
use crate::prepare::PrepContext;

/// Initiative bonus granted by the Alert feat.
const ALERT_BONUS: i32 = 5;

/// Fill the derived fields of every ability block.
pub fn prepare_abilities(actor: &mut Actor, ctx: &PrepContext) {
    let prof = actor.attributes.prof;
    let flags = actor.flags.clone();
    let global_save = ctx.bonus(&actor.bonuses.abilities.save);
    let global_check = ctx.bonus(&actor.bonuses.abilities.check);
    let dc_bonus = ctx.bonus(&actor.bonuses.spell.dc);
    let transform = actor.transform.clone();

    for (ability, block) in actor.abilities.iter_mut() {
        let proficient = if flags.diamond_soul {
            1.0
        } else {
            block.proficient
        };

        block.modifier = ability_modifier(block.value);

        let athlete = flags.remarkable_athlete && ability.is_physical();
        let half = flags.jack_of_all_trades || athlete;
        block.check_prof = ctx
            .proficiency(prof, if half { 0.5 } else { 0.0 })
            .with_round_down(!athlete);

        block.save_bonus = ctx.bonus(&block.bonuses.save).saturating_add(global_save);
        block.check_bonus = ctx.bonus(&block.bonuses.check).saturating_add(global_check);
        block.save_prof = ctx.proficiency(prof, proficient);
        block.save = block
            .modifier
            .saturating_add(block.save_bonus)
            .saturating_add(block.save_prof.numeric_flat());
        block.dc = 8i32
            .saturating_add(prof)
            .saturating_add(block.modifier)
            .saturating_add(dc_bonus);

        if proficient > 0.0 {
            if let Some(original) = transform.as_ref().and_then(|t| t.original_save(*ability)) {
                block.save = block.save.max(original);
            }
        }
    }
}

/// Initiative modifier, proficiency and total.
pub fn prepare_initiative(actor: &mut Actor, ctx: &PrepContext) {
    let prof = actor.attributes.prof;
    let joat = actor.flags.jack_of_all_trades;
    let athlete = actor.flags.remarkable_athlete;
    let alert = if actor.flags.initiative_alert {
        ALERT_BONUS
    } else {
        0
    };
    let (dex_mod, dex_check) = actor
        .abilities
        .get(&Ability::Dexterity)
        .map(|dex| (dex.modifier, dex.check_bonus))
        .unwrap_or((0, 0));

    let init = &mut actor.attributes.init;
    init.modifier = dex_mod;
    init.prof = ctx
        .proficiency(prof, if joat || athlete { 0.5 } else { 0.0 })
        .with_round_down(!athlete);
    let bonus = ctx.bonus(&init.bonus).saturating_add(dex_check).saturating_add(alert);
    init.total = init
        .modifier
        .saturating_add(bonus)
        .saturating_add(init.prof.numeric_flat());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{TransformOptions, Transformation};
    use crate::config::{ProficiencyMode, RulesConfig};
    use crate::formula::{Formula, FormulaEvaluator};

    fn run(actor: &mut Actor, config: &RulesConfig) {
        let ctx = PrepContext::new(config, &FormulaEvaluator, actor.roll_data());
        prepare_abilities(actor, &ctx);
        prepare_initiative(actor, &ctx);
    }

    fn fighter() -> Actor {
        let mut actor = Actor::character("Fighter", 30)
            .with_ability(Ability::Strength, 16)
            .with_ability(Ability::Dexterity, 13)
            .with_ability(Ability::Constitution, 15);
        actor.attributes.prof = 3;
        actor.abilities.get_mut(&Ability::Strength).unwrap().proficient = 1.0;
        actor
    }

    #[test]
    fn test_saves_and_dc() {
        let mut actor = fighter();
        run(&mut actor, &RulesConfig::default());
        let strength = &actor.abilities[&Ability::Strength];
        assert_eq!(strength.modifier, 3);
        assert_eq!(strength.save, 6);
        assert_eq!(strength.dc, 14);
        let con = &actor.abilities[&Ability::Constitution];
        assert_eq!(con.save, 2);
        assert!(!con.save_prof.has_proficiency());
    }

    #[test]
    fn test_bonus_formulas() {
        let mut actor = fighter();
        actor.bonuses.abilities.save = Formula::new("1");
        actor.abilities.get_mut(&Ability::Strength).unwrap().bonuses.save = Formula::new("@prof");
        actor.abilities.get_mut(&Ability::Dexterity).unwrap().bonuses.save = Formula::new("1d4");
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.abilities[&Ability::Strength].save, 3 + 3 + 1 + 3);
        assert_eq!(actor.abilities[&Ability::Dexterity].save, 1 + 1);
    }

    #[test]
    fn test_diamond_soul() {
        let mut actor = fighter();
        actor.flags.diamond_soul = true;
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.abilities[&Ability::Charisma].save, 3);
        assert_eq!(actor.abilities[&Ability::Charisma].proficient, 0.0);
    }

    #[test]
    fn test_check_proficiency_features() {
        let mut actor = fighter();
        actor.flags.remarkable_athlete = true;
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.abilities[&Ability::Strength].check_prof.flat(), 2);
        assert_eq!(actor.abilities[&Ability::Wisdom].check_prof.flat(), 0);

        let mut actor = fighter();
        actor.flags.jack_of_all_trades = true;
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.abilities[&Ability::Wisdom].check_prof.flat(), 1);
    }

    #[test]
    fn test_dice_mode_leaves_flat_out() {
        let mut actor = fighter();
        let config = RulesConfig::default().with_proficiency_mode(ProficiencyMode::Dice);
        run(&mut actor, &config);
        assert_eq!(actor.abilities[&Ability::Strength].save, 3);
        assert_eq!(actor.abilities[&Ability::Strength].save_prof.term().to_string(), "1d6");
    }

    #[test]
    fn test_transform_merges_proficient_saves() {
        let mut actor = fighter();
        actor.transform = Some(Transformation {
            original_actor: crate::actor::ActorId::new(),
            options: TransformOptions {
                merge_saves: true,
                merge_skills: false,
            },
            saves: [(Ability::Strength, 9), (Ability::Constitution, 9)].into_iter().collect(),
            skills: Default::default(),
        });
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.abilities[&Ability::Strength].save, 9);
        assert_eq!(actor.abilities[&Ability::Constitution].save, 2);
    }

    #[test]
    fn test_initiative() {
        let mut actor = fighter();
        actor.flags.initiative_alert = true;
        actor.flags.jack_of_all_trades = true;
        run(&mut actor, &RulesConfig::default());
        let init = &actor.attributes.init;
        assert_eq!(init.modifier, 1);
        assert_eq!(init.prof.flat(), 1);
        assert_eq!(init.total, 1 + 1 + 5);
    }

    #[test]
    fn test_initiative_athlete_rounds_up() {
        let mut actor = fighter();
        actor.flags.remarkable_athlete = true;
        run(&mut actor, &RulesConfig::default());
        assert_eq!(actor.attributes.init.total, 1 + 2);
    }
}
