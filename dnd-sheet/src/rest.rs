//! Short and long rests.
//!
//! A rest runs in three steps: an optional confirmation (during which hit
//! dice may be spent on a short rest), composition of every recovery into
//! one [`UpdateBatch`], and a single commit through the [`ActorStore`].
//! Hit dice spent before confirmation are staged in a [`HitDiceSession`] and
//! only written if the rest goes ahead, so a cancelled rest changes nothing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::actor::{Ability, Actor};
use crate::dice::{DiceRoller, DieType};
use crate::items::{ClassData, Item, ItemId, UsesPeriod};
use crate::prepare::SheetEngine;
use crate::store::{apply_batch, ActorStore, ItemUpdate, StoreError, UpdateBatch, UpdateData};

/// Errors from rest and other actor workflows.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Item is not a class: {0}")]
    NotAClass(String),
}

// ============================================================================
// Results and options
// ============================================================================

/// Summary of a completed rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestResult {
    /// Change in available hit dice.
    pub dhd: i32,
    /// Hit points regained.
    pub dhp: i32,
    pub update_data: UpdateData,
    pub update_items: Vec<ItemUpdate>,
    pub long_rest: bool,
    pub new_day: bool,
}

/// The user's answer to a rest confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestDecision {
    Confirm { new_day: bool },
    Cancel,
}

/// What the confirmation step is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub long_rest: bool,
    /// Whether the new-day choice is offered at all.
    pub prompt_new_day: bool,
    /// Initial answer to the new-day choice.
    pub new_day: bool,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortRestOptions {
    /// Spend hit dice automatically when no prompt is given.
    pub auto_hd: bool,
    /// Keep spending while at least this many hit points are missing.
    pub auto_hd_threshold: i32,
}

impl Default for ShortRestOptions {
    fn default() -> Self {
        Self {
            auto_hd: false,
            auto_hd_threshold: 3,
        }
    }
}

/// Which temporary hit point values a long rest clears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPointRecovery {
    pub recover_temp: bool,
    /// When false, the temporary maximum is kept and counts toward the ceiling.
    pub recover_temp_max: bool,
}

impl Default for HitPointRecovery {
    fn default() -> Self {
        Self {
            recover_temp: true,
            recover_temp_max: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRestOptions {
    /// New-day answer used when no prompt is given.
    pub new_day: bool,
    pub hit_points: HitPointRecovery,
}

impl Default for LongRestOptions {
    fn default() -> Self {
        Self {
            new_day: true,
            hit_points: HitPointRecovery::default(),
        }
    }
}

// ============================================================================
// Hit dice
// ============================================================================

#[derive(Debug, Clone)]
struct StagedClass {
    id: ItemId,
    class: ClassData,
    original_used: i32,
}

/// One hit die spent during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitDieRoll {
    pub die: DieType,
    pub total: i32,
    pub healed: i32,
}

/// Hit dice spent before a short rest is confirmed.
///
/// Works on a snapshot of the actor; nothing is written until the rest is
/// committed.
pub struct HitDiceSession<'r> {
    roller: &'r mut dyn DiceRoller,
    con_mod: i32,
    hp: i32,
    ceiling: i32,
    classes: Vec<StagedClass>,
    rolls: Vec<HitDieRoll>,
}

impl<'r> HitDiceSession<'r> {
    pub fn new(actor: &Actor, roller: &'r mut dyn DiceRoller) -> Self {
        let hp = &actor.attributes.hp;
        let classes = actor
            .sorted_items()
            .into_iter()
            .filter_map(|item| {
                item.as_class().map(|class| StagedClass {
                    id: item.id,
                    class: class.clone(),
                    original_used: class.hit_dice_used,
                })
            })
            .collect();
        Self {
            roller,
            con_mod: actor.ability_mod(Ability::Constitution),
            hp: hp.value,
            ceiling: hp.max + hp.tempmax,
            classes,
            rolls: Vec::new(),
        }
    }

    /// Current (staged) hit points.
    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn available(&self) -> i32 {
        self.classes
            .iter()
            .map(|staged| staged.class.hit_dice_available())
            .sum()
    }

    pub fn can_roll(&self) -> bool {
        self.available() > 0
    }

    /// Remaining dice grouped by denomination, largest first.
    pub fn available_dice(&self) -> Vec<(DieType, i32)> {
        let mut dice: Vec<(DieType, i32)> = Vec::new();
        for staged in &self.classes {
            let remaining = staged.class.hit_dice_available();
            if remaining == 0 {
                continue;
            }
            let hit_dice = staged.class.hit_dice;
            match dice.iter_mut().find(|(die, _)| *die == hit_dice) {
                Some((_, count)) => *count += remaining,
                None => dice.push((hit_dice, remaining)),
            }
        }
        dice.sort_by(|a, b| b.0.cmp(&a.0));
        dice
    }

    pub fn rolls(&self) -> &[HitDieRoll] {
        &self.rolls
    }

    /// Spend one hit die. With no denomination the first class with dice
    /// left is used. Returns `None` if no matching die is available.
    pub fn spend(&mut self, die: Option<DieType>) -> Option<HitDieRoll> {
        let class = &mut self
            .classes
            .iter_mut()
            .find(|staged| {
                staged.class.hit_dice_available() > 0
                    && die.map_or(true, |die| die == staged.class.hit_dice)
            })?
            .class;

        let total = self.roller.roll_hit_die(class.hit_dice, self.con_mod);
        let healed = (self.ceiling - self.hp).min(total).max(0);
        class.hit_dice_used += 1;
        self.hp += healed;

        let roll = HitDieRoll {
            die: class.hit_dice,
            total,
            healed,
        };
        debug!(die = %roll.die, total, healed, "spent hit die");
        self.rolls.push(roll);
        Some(roll)
    }

    /// Spend dice while at least `threshold` hit points are missing.
    /// Returns the number of dice rolled.
    pub fn auto_spend(&mut self, threshold: i32) -> u32 {
        let mut rolled = 0;
        while self.hp + threshold <= self.ceiling {
            if self.spend(None).is_none() {
                break;
            }
            rolled += 1;
        }
        rolled
    }

    fn spent(&self) -> i32 {
        self.rolls.len() as i32
    }

    fn healed(&self) -> i32 {
        self.rolls.iter().map(|roll| roll.healed).sum()
    }

    fn updates(&self) -> (UpdateData, Vec<ItemUpdate>) {
        let mut data = UpdateData::new();
        if !self.rolls.is_empty() {
            data.set("attributes.hp.value", self.hp);
        }
        let items = self
            .classes
            .iter()
            .filter(|staged| staged.class.hit_dice_used != staged.original_used)
            .map(|staged| {
                ItemUpdate::new(staged.id).with("data.hit_dice_used", staged.class.hit_dice_used)
            })
            .collect();
        (data, items)
    }
}

/// The confirmation step of a rest.
#[async_trait]
pub trait RestPrompt: Send {
    /// Confirm a short rest. Hit dice may be spent through `session`.
    async fn confirm_short_rest(
        &mut self,
        request: &RestRequest,
        session: &mut HitDiceSession<'_>,
    ) -> RestDecision;

    async fn confirm_long_rest(&mut self, request: &RestRequest) -> RestDecision;
}

// ============================================================================
// Recovery
// ============================================================================

/// Hit points restored by a long rest, and the updates that restore them.
pub fn hit_point_recovery(actor: &Actor, options: &HitPointRecovery) -> (UpdateData, i32) {
    let hp = &actor.attributes.hp;
    let mut updates = UpdateData::new();
    let mut max = hp.max;

    if options.recover_temp_max {
        updates.set("attributes.hp.tempmax", 0);
    } else {
        max += hp.tempmax;
    }
    updates.set("attributes.hp.value", max);
    if options.recover_temp {
        updates.set("attributes.hp.temp", 0);
    }

    (updates, (max - hp.value).max(0))
}

/// Hit dice regained on a long rest, largest denomination first.
///
/// Defaults to half the character's level (at least one).
pub fn hit_dice_recovery(actor: &Actor, max_hit_dice: Option<i32>) -> (Vec<ItemUpdate>, i32) {
    let budget = max_hit_dice.unwrap_or_else(|| (actor.level() / 2).max(1));
    let mut classes: Vec<&Item> = actor.classes().into_values().collect();
    classes.sort_by_key(|item| item.sort);
    classes.sort_by(|a, b| {
        let sides = |item: &Item| item.as_class().map_or(0, |class| class.hit_dice.sides());
        sides(b).cmp(&sides(a))
    });

    let mut updates = Vec::new();
    let mut recovered = 0;
    for item in classes {
        let Some(class) = item.as_class() else {
            continue;
        };
        if recovered < budget && class.hit_dice_used > 0 {
            let amount = class.hit_dice_used.min(budget - recovered);
            recovered += amount;
            updates.push(
                ItemUpdate::new(item.id).with("data.hit_dice_used", class.hit_dice_used - amount),
            );
        }
    }
    (updates, recovered)
}

/// Resources flagged for the given kind of rest return to their maximum.
pub fn resource_recovery(actor: &Actor, short_rest: bool, long_rest: bool) -> UpdateData {
    let mut updates = UpdateData::new();
    for (key, resource) in &actor.resources {
        let Some(max) = resource.max else {
            continue;
        };
        if (short_rest && resource.sr) || (long_rest && resource.lr) {
            updates.set(format!("resources.{key}.value"), max);
        }
    }
    updates
}

/// Pact slots, and optionally every spell slot, return to their maximum.
pub fn spell_recovery(actor: &Actor, recover_pact: bool, recover_spells: bool) -> UpdateData {
    let mut updates = UpdateData::new();
    if recover_pact {
        updates.set("spells.pact.value", actor.spells.pact.max);
    }
    if recover_spells {
        for (level, block) in &actor.spells.slots {
            updates.set(format!("spells.{level}.value"), block.max);
        }
    }
    updates
}

/// Limited-use items recovered by a rest.
pub fn item_uses_recovery(actor: &Actor, long_rest: bool, new_day: bool) -> Vec<ItemUpdate> {
    let mut updates = Vec::new();
    for item in actor.sorted_items() {
        if let Some(uses) = &item.uses {
            let recovers = match uses.per {
                Some(UsesPeriod::Sr) => true,
                Some(UsesPeriod::Lr) => long_rest,
                Some(UsesPeriod::Day) => new_day,
                Some(UsesPeriod::Charges) | None => false,
            };
            if recovers {
                updates.push(ItemUpdate::new(item.id).with("uses.value", uses.max));
            }
        }
        let needs_recharge = item.recharge.as_ref().is_some_and(|r| r.value.is_some());
        if long_rest && needs_recharge {
            updates.push(ItemUpdate::new(item.id).with("recharge.charged", true));
        }
    }
    updates
}

/// Merge updates for the same item, keeping first-seen order.
fn merge_item_updates(updates: Vec<ItemUpdate>) -> Vec<ItemUpdate> {
    let mut merged: Vec<ItemUpdate> = Vec::new();
    for update in updates {
        match merged.iter_mut().find(|existing| existing.id == update.id) {
            Some(existing) => existing.changes.extend(update.changes),
            None => merged.push(update),
        }
    }
    merged
}

/// Roll one hit die for a class item (no modifiers).
pub fn roll_class_hit_points(item: &Item, roller: &mut dyn DiceRoller) -> Result<i32, RestError> {
    let class = item
        .as_class()
        .ok_or_else(|| RestError::NotAClass(item.name.clone()))?;
    Ok(roller.roll(class.hit_dice) as i32)
}

// ============================================================================
// Workflow
// ============================================================================

/// Runs actor workflows against an engine and a store.
pub struct Workflow<'a, S: ActorStore + ?Sized> {
    engine: &'a SheetEngine,
    store: &'a S,
}

impl<'a, S: ActorStore + ?Sized> Workflow<'a, S> {
    pub fn new(engine: &'a SheetEngine, store: &'a S) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &SheetEngine {
        self.engine
    }

    /// Take a short rest. Returns `Ok(None)` if the prompt cancels.
    pub async fn short_rest(
        &self,
        actor: &mut Actor,
        options: ShortRestOptions,
        prompt: Option<&mut dyn RestPrompt>,
        roller: &mut dyn DiceRoller,
    ) -> Result<Option<RestResult>, RestError> {
        let request = self.request(false);
        let mut session = HitDiceSession::new(actor, roller);

        let new_day = match prompt {
            Some(prompt) => match prompt.confirm_short_rest(&request, &mut session).await {
                RestDecision::Confirm { new_day } => resolve_new_day(&request, new_day),
                RestDecision::Cancel => {
                    debug!(actor = %actor.name, "short rest cancelled");
                    return Ok(None);
                }
            },
            None => {
                if options.auto_hd {
                    session.auto_spend(options.auto_hd_threshold);
                }
                request.new_day
            }
        };

        let dhd = -session.spent();
        let dhp = session.healed();
        let (data, items) = session.updates();

        let mut result = compose_rest(actor, false, new_day, &HitPointRecovery::default());
        result.dhd += dhd;
        result.dhp += dhp;
        let mut update_data = data;
        update_data.extend(result.update_data);
        result.update_data = update_data;
        result.update_items = merge_item_updates(items.into_iter().chain(result.update_items).collect());

        self.commit(actor, &result).await?;
        Ok(Some(result))
    }

    /// Take a long rest. Returns `Ok(None)` if the prompt cancels.
    pub async fn long_rest(
        &self,
        actor: &mut Actor,
        options: LongRestOptions,
        prompt: Option<&mut dyn RestPrompt>,
    ) -> Result<Option<RestResult>, RestError> {
        let request = self.request(true);

        let new_day = match prompt {
            Some(prompt) => match prompt.confirm_long_rest(&request).await {
                RestDecision::Confirm { new_day } => resolve_new_day(&request, new_day),
                RestDecision::Cancel => {
                    debug!(actor = %actor.name, "long rest cancelled");
                    return Ok(None);
                }
            },
            None => options.new_day,
        };

        let result = compose_rest(actor, true, new_day, &options.hit_points);
        self.commit(actor, &result).await?;
        Ok(Some(result))
    }

    fn request(&self, long_rest: bool) -> RestRequest {
        let variant = self.engine.config().rest_variant;
        RestRequest {
            long_rest,
            prompt_new_day: variant.prompts_new_day(long_rest),
            new_day: variant.default_new_day(long_rest),
            duration_minutes: if long_rest {
                variant.long_rest_minutes()
            } else {
                variant.short_rest_minutes()
            },
        }
    }

    /// Write a batch, mirror it in memory and re-prepare the actor.
    pub(crate) async fn commit_batch(
        &self,
        actor: &mut Actor,
        batch: &UpdateBatch,
    ) -> Result<(), RestError> {
        self.store.commit(actor, batch).await?;
        apply_batch(actor, batch)?;
        self.engine.prepare(actor);
        Ok(())
    }

    async fn commit(&self, actor: &mut Actor, result: &RestResult) -> Result<(), RestError> {
        let batch = UpdateBatch {
            data: result.update_data.clone(),
            items: result.update_items.clone(),
        };
        self.commit_batch(actor, &batch).await?;
        info!(
            actor = %actor.name,
            long_rest = result.long_rest,
            new_day = result.new_day,
            dhp = result.dhp,
            dhd = result.dhd,
            "rest completed"
        );
        Ok(())
    }
}

fn resolve_new_day(request: &RestRequest, answer: bool) -> bool {
    if request.prompt_new_day {
        answer
    } else {
        request.new_day
    }
}

/// Gather every recovery for a rest into one result.
fn compose_rest(
    actor: &Actor,
    long_rest: bool,
    new_day: bool,
    hit_points: &HitPointRecovery,
) -> RestResult {
    let mut result = RestResult {
        long_rest,
        new_day,
        ..Default::default()
    };
    let mut item_updates = Vec::new();

    if long_rest {
        let (hp_updates, recovered) = hit_point_recovery(actor, hit_points);
        result.update_data.extend(hp_updates);
        result.dhp = recovered;

        let (hd_updates, recovered) = hit_dice_recovery(actor, None);
        item_updates.extend(hd_updates);
        result.dhd = recovered;
    }

    result
        .update_data
        .extend(resource_recovery(actor, !long_rest, long_rest));
    result
        .update_data
        .extend(spell_recovery(actor, true, long_rest));

    item_updates.extend(item_uses_recovery(actor, long_rest, new_day));
    result.update_items = merge_item_updates(item_updates);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Resource;
    use crate::items::{ItemData, Progression};
    use crate::testing::FixedRoller;

    fn hero() -> Actor {
        let mut actor = Actor::character("Hero", 40)
            .with_ability(Ability::Constitution, 14)
            .with_item(Item::class("Wizard", "wizard", 2, DieType::D6, Progression::Full).with_sort(1))
            .with_item(Item::class("Fighter", "fighter", 3, DieType::D10, Progression::None).with_sort(2));
        SheetEngine::default().prepare(&mut actor);
        actor
    }

    #[test]
    fn test_hit_point_recovery() {
        let mut actor = hero();
        actor.attributes.hp.value = 10;
        actor.attributes.hp.temp = 5;
        actor.attributes.hp.tempmax = 4;
        let (updates, recovered) = hit_point_recovery(&actor, &HitPointRecovery::default());
        assert_eq!(recovered, 30);
        assert_eq!(updates.get("attributes.hp.value"), Some(&40.into()));
        assert_eq!(updates.get("attributes.hp.tempmax"), Some(&0.into()));
        assert_eq!(updates.get("attributes.hp.temp"), Some(&0.into()));

        let keep = HitPointRecovery {
            recover_temp: false,
            recover_temp_max: false,
        };
        let (updates, recovered) = hit_point_recovery(&actor, &keep);
        assert_eq!(recovered, 34);
        assert_eq!(updates.get("attributes.hp.value"), Some(&44.into()));
        assert!(updates.get("attributes.hp.temp").is_none());
    }

    #[test]
    fn test_hit_point_recovery_at_max() {
        let actor = hero();
        let (updates, recovered) = hit_point_recovery(&actor, &HitPointRecovery::default());
        assert_eq!(recovered, 0);
        assert_eq!(updates.get("attributes.hp.value"), Some(&40.into()));
    }

    #[test]
    fn test_hit_dice_recovery_prefers_largest() {
        let mut actor = Actor::character("Hero", 40)
            .with_item(Item::class("Wizard", "wizard", 3, DieType::D6, Progression::Full))
            .with_item(Item::class("Fighter", "fighter", 3, DieType::D10, Progression::None));
        actor.items[0].as_class_mut().unwrap().hit_dice_used = 2;
        actor.items[1].as_class_mut().unwrap().hit_dice_used = 1;
        let fighter_id = actor.items[1].id;

        let (updates, recovered) = hit_dice_recovery(&actor, Some(1));
        assert_eq!(recovered, 1);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, fighter_id);
        assert_eq!(updates[0].changes.get("data.hit_dice_used"), Some(&0.into()));
    }

    #[test]
    fn test_hit_dice_budget_from_level() {
        let mut actor = hero();
        for item in actor.items.iter_mut() {
            let class = item.as_class_mut().unwrap();
            class.hit_dice_used = class.levels;
        }
        let (_, recovered) = hit_dice_recovery(&actor, None);
        assert_eq!(recovered, 2);
    }

    #[test]
    fn test_resource_recovery() {
        let mut actor = hero();
        actor.resources.insert(
            "primary".to_string(),
            Resource {
                label: "Ki".to_string(),
                value: 0,
                max: Some(3),
                sr: true,
                lr: false,
            },
        );
        actor.resources.insert(
            "secondary".to_string(),
            Resource {
                label: "Rage".to_string(),
                value: 0,
                max: Some(2),
                sr: false,
                lr: true,
            },
        );
        actor.resources.insert(
            "tertiary".to_string(),
            Resource {
                label: "Luck".to_string(),
                value: 0,
                max: None,
                sr: true,
                lr: true,
            },
        );
        let short = resource_recovery(&actor, true, false);
        assert_eq!(short.len(), 1);
        assert_eq!(short.get("resources.primary.value"), Some(&3.into()));
        let long = resource_recovery(&actor, false, true);
        assert_eq!(long.len(), 1);
        assert_eq!(long.get("resources.secondary.value"), Some(&2.into()));
    }

    #[test]
    fn test_item_uses_recovery() {
        let actor = Actor::character("Hero", 10)
            .with_item(Item::new("Second Wind", ItemData::Feat).with_uses(0, 1, UsesPeriod::Sr))
            .with_item(Item::new("Arcane Recovery", ItemData::Feat).with_uses(0, 1, UsesPeriod::Lr))
            .with_item(Item::new("Wand", ItemData::Feat).with_uses(0, 7, UsesPeriod::Day))
            .with_item(Item::new("Breath", ItemData::Feat).with_recharge(5, false));

        assert_eq!(item_uses_recovery(&actor, false, false).len(), 1);
        assert_eq!(item_uses_recovery(&actor, false, true).len(), 2);
        let long = item_uses_recovery(&actor, true, true);
        assert_eq!(long.len(), 4);
        assert_eq!(long[3].changes.get("recharge.charged"), Some(&true.into()));
    }

    #[test]
    fn test_session_stages_spends() {
        let mut actor = hero();
        actor.attributes.hp.value = 20;
        let mut roller = FixedRoller::new(vec![4, 6]);
        let mut session = HitDiceSession::new(&actor, &mut roller);
        assert_eq!(session.available(), 5);

        let roll = session.spend(Some(DieType::D10)).unwrap();
        assert_eq!(roll.total, 6);
        assert_eq!(session.hp(), 26);
        let roll = session.spend(None).unwrap();
        assert_eq!(roll.die, DieType::D6);
        assert_eq!(session.available(), 3);
        assert_eq!(session.available_dice(), vec![(DieType::D10, 2), (DieType::D6, 1)]);
        assert!(session.spend(Some(DieType::D12)).is_none());

        // The actor itself is untouched.
        assert_eq!(actor.attributes.hp.value, 20);
    }

    #[test]
    fn test_session_caps_healing() {
        let mut actor = hero();
        actor.attributes.hp.value = 38;
        let mut roller = FixedRoller::new(vec![6]);
        let mut session = HitDiceSession::new(&actor, &mut roller);
        assert_eq!(session.spend(None).unwrap().healed, 2);
        assert_eq!(session.hp(), 40);
    }

    #[test]
    fn test_session_matches_prepared_hit_dice() {
        let mut actor = Actor::character("Squire", 12)
            .with_ability(Ability::Constitution, 14)
            .with_item(Item::class("Fighter", "fighter", 0, DieType::D10, Progression::None));
        SheetEngine::default().prepare(&mut actor);
        actor.attributes.hp.value = 1;
        let mut roller = FixedRoller::new(vec![5]);
        let mut session = HitDiceSession::new(&actor, &mut roller);
        assert_eq!(session.available(), actor.attributes.hd);
        assert_eq!(session.spend(None).unwrap().total, 7);
        assert_eq!(session.available(), 0);
        assert!(session.spend(None).is_none());
        let (_, items) = session.updates();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_auto_spend_threshold() {
        let mut actor = hero();
        actor.attributes.hp.value = 30;
        let mut roller = FixedRoller::new(vec![3]);
        let mut session = HitDiceSession::new(&actor, &mut roller);
        // Each die heals 5: 30 -> 35 -> 40 (stops once fewer than 3 are missing).
        assert_eq!(session.auto_spend(3), 2);
        assert_eq!(session.hp(), 40);
    }

    #[test]
    fn test_roll_class_hit_points() {
        let mut roller = FixedRoller::new(vec![7]);
        let class = Item::class("Fighter", "fighter", 1, DieType::D10, Progression::None);
        assert_eq!(roll_class_hit_points(&class, &mut roller).unwrap(), 7);

        let feat = Item::new("Tough", ItemData::Feat);
        assert!(matches!(
            roll_class_hit_points(&feat, &mut roller),
            Err(RestError::NotAClass(_))
        ));
    }

    #[test]
    fn test_merge_item_updates() {
        let id = ItemId::new();
        let merged = merge_item_updates(vec![
            ItemUpdate::new(id).with("uses.value", 1),
            ItemUpdate::new(ItemId::new()).with("uses.value", 2),
            ItemUpdate::new(id).with("recharge.charged", true),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].changes.len(), 2);
    }
}
