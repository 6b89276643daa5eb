//! Testing utilities.
//!
//! - Sample actors, already prepared
//! - `FixedRoller` for scripted dice
//! - `MemoryStore`, an in-memory [`ActorStore`] that records every batch
//! - `ScriptedPrompt`, a [`RestPrompt`] with a fixed answer

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::actor::{Ability, Actor, Resource, Skill};
use crate::armor::ArmorClassBlock;
use crate::dice::{DiceRoller, DieType};
use crate::items::{ArmorKind, Item, ItemData, PhysicalData, Progression, UsesPeriod};
use crate::prepare::SheetEngine;
use crate::rest::{HitDiceSession, RestDecision, RestPrompt, RestRequest};
use crate::store::{apply_batch, ActorStore, StoreError, UpdateBatch};

// ============================================================================
// Sample actors
// ============================================================================

fn with_scores(mut actor: Actor, scores: [i32; 6]) -> Actor {
    for (ability, score) in Ability::all().into_iter().zip(scores) {
        actor = actor.with_ability(ability, score);
    }
    actor
}

fn proficient_in(actor: &mut Actor, saves: &[Ability], skills: &[Skill]) {
    for ability in saves {
        if let Some(block) = actor.abilities.get_mut(ability) {
            block.proficient = 1.0;
        }
    }
    for skill in skills {
        if let Some(block) = actor.skills.get_mut(skill) {
            block.value = 1.0;
        }
    }
}

fn prepared(mut actor: Actor) -> Actor {
    SheetEngine::default().prepare(&mut actor);
    actor
}

/// A level 5 fighter in chain mail with a shield.
pub fn create_sample_fighter(name: &str) -> Actor {
    let mut actor = with_scores(Actor::character(name, 44), [16, 14, 14, 10, 12, 8])
        .with_item(
            Item::class("Fighter", "fighter", 5, DieType::D10, Progression::None).with_sort(0),
        )
        .with_item(Item::armor("Chain Mail", ArmorKind::Heavy, 16, None).equipped().with_weight(1, 55.0).with_sort(1))
        .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped().with_weight(1, 6.0).with_sort(2))
        .with_item(
            Item::new(
                "Longsword",
                ItemData::Weapon(PhysicalData {
                    quantity: 1,
                    weight: 3.0,
                    equipped: true,
                }),
            )
            .with_sort(3),
        )
        .with_item(Item::new("Second Wind", ItemData::Feat).with_uses(1, 1, UsesPeriod::Sr).with_sort(4))
        .with_item(Item::new("Action Surge", ItemData::Feat).with_uses(1, 1, UsesPeriod::Sr).with_sort(5));
    proficient_in(
        &mut actor,
        &[Ability::Strength, Ability::Constitution],
        &[Skill::Athletics, Skill::Perception, Skill::Intimidation],
    );
    actor.currency.gp = 50;
    prepared(actor)
}

/// A level 5 wizard with Intelligence spellcasting.
pub fn create_sample_wizard(name: &str) -> Actor {
    let mut actor = with_scores(Actor::character(name, 27), [8, 14, 14, 16, 12, 10])
        .with_item(Item::class("Wizard", "wizard", 5, DieType::D6, Progression::Full))
        .with_item(Item::new("Arcane Recovery", ItemData::Feat).with_uses(1, 1, UsesPeriod::Lr).with_sort(1));
    actor.attributes.spellcasting = Some(Ability::Intelligence);
    actor.attributes.ac = ArmorClassBlock::default().with_calc(crate::armor::AcCalc::Mage);
    proficient_in(
        &mut actor,
        &[Ability::Intelligence, Ability::Wisdom],
        &[Skill::Arcana, Skill::History],
    );
    prepared(actor)
}

/// A level 5 warlock with pact magic.
pub fn create_sample_warlock(name: &str) -> Actor {
    let mut actor = with_scores(Actor::character(name, 38), [8, 14, 14, 12, 10, 16])
        .with_item(Item::class("Warlock", "warlock", 5, DieType::D8, Progression::Pact));
    actor.attributes.spellcasting = Some(Ability::Charisma);
    proficient_in(
        &mut actor,
        &[Ability::Wisdom, Ability::Charisma],
        &[Skill::Deception, Skill::Arcana],
    );
    prepared(actor)
}

/// A level 5 paladin (half caster) with Lay on Hands as a resource.
pub fn create_sample_paladin(name: &str) -> Actor {
    let mut actor = with_scores(Actor::character(name, 44), [16, 10, 14, 8, 12, 14])
        .with_item(Item::class("Paladin", "paladin", 5, DieType::D10, Progression::Half));
    actor.attributes.spellcasting = Some(Ability::Charisma);
    actor.resources.insert(
        "primary".to_string(),
        Resource {
            label: "Lay on Hands".to_string(),
            value: 25,
            max: Some(25),
            sr: false,
            lr: true,
        },
    );
    proficient_in(
        &mut actor,
        &[Ability::Wisdom, Ability::Charisma],
        &[Skill::Athletics, Skill::Persuasion],
    );
    prepared(actor)
}

/// A challenge rating 1 NPC with natural armor and a recharge ability.
pub fn create_sample_npc(name: &str) -> Actor {
    let mut actor = with_scores(Actor::npc(name, 1.0, 21), [10, 14, 10, 10, 8, 10])
        .with_item(Item::new("Redirect Attack", ItemData::Feat).with_recharge(5, false))
        .with_item(Item::armor("Shield", ArmorKind::Shield, 2, None).equipped());
    actor.attributes.ac = ArmorClassBlock::flat(15).with_calc(crate::armor::AcCalc::Natural);
    actor.resources.insert(
        "legact".to_string(),
        Resource {
            label: "Legendary Actions".to_string(),
            value: 0,
            max: Some(3),
            sr: false,
            lr: true,
        },
    );
    prepared(actor)
}

/// A vehicle with a flat armor class.
pub fn create_sample_vehicle(name: &str) -> Actor {
    let mut actor = Actor::vehicle(name, 50);
    actor.attributes.ac = ArmorClassBlock::flat(11);
    prepared(actor)
}

// ============================================================================
// Dice
// ============================================================================

/// Returns scripted die results in order, cycling when exhausted.
#[derive(Debug, Clone, Default)]
pub struct FixedRoller {
    values: Vec<u32>,
    index: usize,
    rolled: Vec<DieType>,
}

impl FixedRoller {
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values,
            index: 0,
            rolled: Vec::new(),
        }
    }

    /// Dice rolled so far, in order.
    pub fn rolled(&self) -> &[DieType] {
        &self.rolled
    }
}

impl DiceRoller for FixedRoller {
    fn roll(&mut self, die: DieType) -> u32 {
        self.rolled.push(die);
        if self.values.is_empty() {
            return 1;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }
}

// ============================================================================
// Store
// ============================================================================

/// An in-memory store that records every committed batch.
#[derive(Default)]
pub struct MemoryStore {
    actor: Mutex<Option<Actor>>,
    batches: Mutex<Vec<UpdateBatch>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of `actor` and apply committed batches to it.
    pub fn with_actor(actor: &Actor) -> Self {
        Self {
            actor: Mutex::new(Some(actor.clone())),
            ..Default::default()
        }
    }

    /// A store whose commits always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn batches(&self) -> Vec<UpdateBatch> {
        self.batches.lock().await.clone()
    }

    pub async fn actor(&self) -> Option<Actor> {
        self.actor.lock().await.clone()
    }
}

#[async_trait]
impl ActorStore for MemoryStore {
    async fn commit(&self, actor: &Actor, batch: &UpdateBatch) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Backend("memory store set to fail".to_string()));
        }
        if let Some(stored) = self.actor.lock().await.as_mut() {
            if stored.id != actor.id {
                return Err(StoreError::ActorNotFound(actor.id));
            }
            apply_batch(stored, batch)?;
        }
        self.batches.lock().await.push(batch.clone());
        Ok(())
    }
}

// ============================================================================
// Prompt
// ============================================================================

/// A rest prompt with a scripted answer.
#[derive(Debug, Clone)]
pub struct ScriptedPrompt {
    decision: RestDecision,
    spends: Vec<Option<DieType>>,
    requests: Vec<RestRequest>,
}

impl ScriptedPrompt {
    pub fn confirm(new_day: bool) -> Self {
        Self {
            decision: RestDecision::Confirm { new_day },
            spends: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn cancel() -> Self {
        Self {
            decision: RestDecision::Cancel,
            spends: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Hit dice to spend before answering a short rest.
    pub fn with_spends(mut self, spends: Vec<Option<DieType>>) -> Self {
        self.spends = spends;
        self
    }

    /// Requests this prompt has been shown.
    pub fn requests(&self) -> &[RestRequest] {
        &self.requests
    }
}

#[async_trait]
impl RestPrompt for ScriptedPrompt {
    async fn confirm_short_rest(
        &mut self,
        request: &RestRequest,
        session: &mut HitDiceSession<'_>,
    ) -> RestDecision {
        self.requests.push(request.clone());
        for die in &self.spends {
            session.spend(*die);
        }
        self.decision
    }

    async fn confirm_long_rest(&mut self, request: &RestRequest) -> RestDecision {
        self.requests.push(request.clone());
        self.decision
    }
}
