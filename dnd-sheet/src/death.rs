//! Death saving throws.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::actor::Actor;
use crate::dice::{DiceRoller, DieType};
use crate::formula::simplify_bonus;
use crate::proficiency::{Proficiency, ProficiencyTerm};
use crate::rest::{RestError, Workflow};
use crate::store::{ActorStore, UpdateBatch, UpdateData};

/// Total needed to succeed on a death save.
pub const DEATH_SAVE_TARGET: i32 = 10;

/// Successes or failures that end the dying state.
const DEATH_SAVE_LIMIT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathSaveOutcome {
    /// Natural 20: back on your feet with 1 hit point.
    Revived,
    /// Third success: stable, counters reset.
    Stabilized,
    Success(u8),
    Failure(u8),
    /// Third failure.
    Died,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathSaveResult {
    /// The d20 as rolled (after any lucky reroll).
    pub natural: u32,
    pub total: i32,
    pub outcome: DeathSaveOutcome,
    pub update_data: UpdateData,
}

/// Whether the actor is dying and still rolling death saves.
pub fn can_roll_death_save(actor: &Actor) -> bool {
    let death = &actor.attributes.death;
    actor.attributes.hp.value <= 0
        && death.success < DEATH_SAVE_LIMIT
        && death.failure < DEATH_SAVE_LIMIT
}

fn roll_d20(actor: &Actor, roller: &mut dyn DiceRoller) -> u32 {
    let natural = roller.roll(DieType::D20);
    if natural == 1 && actor.flags.halfling_lucky {
        return roller.roll(DieType::D20);
    }
    natural
}

/// Outcome of a death save and the fields it changes.
pub fn resolve_death_save(actor: &Actor, natural: u32, total: i32) -> (DeathSaveOutcome, UpdateData) {
    let death = &actor.attributes.death;
    let mut updates = UpdateData::new();

    let outcome = if total >= DEATH_SAVE_TARGET {
        let successes = death.success + 1;
        if natural == 20 {
            updates.set("attributes.death.success", 0);
            updates.set("attributes.death.failure", 0);
            updates.set("attributes.hp.value", 1);
            DeathSaveOutcome::Revived
        } else if successes >= DEATH_SAVE_LIMIT {
            updates.set("attributes.death.success", 0);
            updates.set("attributes.death.failure", 0);
            DeathSaveOutcome::Stabilized
        } else {
            updates.set("attributes.death.success", successes);
            DeathSaveOutcome::Success(successes)
        }
    } else {
        let added = if natural == 1 { 2 } else { 1 };
        let failures = (death.failure + added).min(DEATH_SAVE_LIMIT);
        updates.set("attributes.death.failure", failures);
        if failures >= DEATH_SAVE_LIMIT {
            DeathSaveOutcome::Died
        } else {
            DeathSaveOutcome::Failure(failures)
        }
    };
    (outcome, updates)
}

impl<S: ActorStore + ?Sized> Workflow<'_, S> {
    /// Roll a death saving throw. Returns `Ok(None)` without changing
    /// anything if the actor is not dying or has already stabilised or died.
    pub async fn roll_death_save(
        &self,
        actor: &mut Actor,
        roller: &mut dyn DiceRoller,
    ) -> Result<Option<DeathSaveResult>, RestError> {
        if !can_roll_death_save(actor) {
            warn!(actor = %actor.name, "death save not needed");
            return Ok(None);
        }

        let engine = self.engine();
        let roll_data = actor.roll_data();
        let mut bonus = simplify_bonus(engine.evaluator(), &actor.bonuses.abilities.save, &roll_data);
        if actor.flags.diamond_soul {
            let prof = Proficiency::new(actor.attributes.prof, 1.0)
                .with_dice(engine.config().uses_proficiency_dice());
            bonus += match prof.term() {
                ProficiencyTerm::Flat(n) => n,
                ProficiencyTerm::Dice(_) => DieType::from_sides((prof.base * 2).max(0) as u32)
                    .map(|die| roller.roll(die) as i32)
                    .unwrap_or_else(|| prof.flat()),
            };
        }

        let natural = roll_d20(actor, roller);
        let total = natural as i32 + bonus;
        let (outcome, update_data) = resolve_death_save(actor, natural, total);

        let batch = UpdateBatch {
            data: update_data.clone(),
            items: Vec::new(),
        };
        self.commit_batch(actor, &batch).await?;
        info!(actor = %actor.name, natural, total, ?outcome, "death save rolled");

        Ok(Some(DeathSaveResult {
            natural,
            total,
            outcome,
            update_data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dying() -> Actor {
        let mut actor = Actor::character("Hero", 20);
        actor.attributes.hp.value = 0;
        actor
    }

    #[test]
    fn test_guard() {
        let mut actor = dying();
        assert!(can_roll_death_save(&actor));
        actor.attributes.death.failure = 3;
        assert!(!can_roll_death_save(&actor));
        let mut healthy = dying();
        healthy.attributes.hp.value = 1;
        assert!(!can_roll_death_save(&healthy));
    }

    #[test]
    fn test_natural_twenty_revives() {
        let actor = dying();
        let (outcome, updates) = resolve_death_save(&actor, 20, 20);
        assert_eq!(outcome, DeathSaveOutcome::Revived);
        assert_eq!(updates.get("attributes.hp.value"), Some(&1.into()));
    }

    #[test]
    fn test_third_success_stabilizes() {
        let mut actor = dying();
        actor.attributes.death.success = 2;
        let (outcome, updates) = resolve_death_save(&actor, 12, 12);
        assert_eq!(outcome, DeathSaveOutcome::Stabilized);
        assert_eq!(updates.get("attributes.death.success"), Some(&0.into()));
    }

    #[test]
    fn test_natural_one_counts_twice() {
        let mut actor = dying();
        actor.attributes.death.failure = 1;
        let (outcome, updates) = resolve_death_save(&actor, 1, 1);
        assert_eq!(outcome, DeathSaveOutcome::Died);
        assert_eq!(updates.get("attributes.death.failure"), Some(&3.into()));

        let (outcome, _) = resolve_death_save(&dying(), 1, 1);
        assert_eq!(outcome, DeathSaveOutcome::Failure(2));
    }

    #[test]
    fn test_bonus_can_turn_failure_into_success() {
        let actor = dying();
        let (outcome, _) = resolve_death_save(&actor, 8, 10);
        assert_eq!(outcome, DeathSaveOutcome::Success(1));
    }
}
