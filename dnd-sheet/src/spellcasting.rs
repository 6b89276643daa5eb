//! Spell slot progression.
//!
//! Classes contribute caster levels according to their progression. The
//! combined caster level picks a row of the slot table; pact magic is
//! tracked separately.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::actor::Actor;
use crate::config::RulesConfig;
use crate::items::{ClassData, Progression};

/// Spell level 1-9, serialized as `spell1`..`spell9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotLevel(u8);

impl SlotLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=9).contains(&level).then_some(SlotLevel(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = SlotLevel> {
        (1..=9).map(SlotLevel)
    }
}

impl fmt::Display for SlotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell{}", self.0)
    }
}

impl TryFrom<String> for SlotLevel {
    type Error = String;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        key.strip_prefix("spell")
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(SlotLevel::new)
            .ok_or_else(|| format!("invalid spell slot key: {key}"))
    }
}

impl From<SlotLevel> for String {
    fn from(level: SlotLevel) -> Self {
        level.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotBlock {
    #[serde(default)]
    pub value: i32,
    /// Manual maximum replacing the table value.
    #[serde(default, rename = "override")]
    pub override_max: Option<i32>,
    #[serde(default)]
    pub max: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PactSlot {
    #[serde(default)]
    pub value: i32,
    #[serde(default, rename = "override")]
    pub override_max: Option<i32>,
    #[serde(default)]
    pub max: i32,
    /// Spell level pact slots are cast at.
    #[serde(default)]
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spells {
    #[serde(flatten)]
    pub slots: BTreeMap<SlotLevel, SlotBlock>,
    #[serde(default)]
    pub pact: PactSlot,
}

impl Spells {
    pub fn slot(&self, level: u8) -> Option<&SlotBlock> {
        SlotLevel::new(level).and_then(|level| self.slots.get(&level))
    }

    pub fn slot_mut(&mut self, level: u8) -> Option<&mut SlotBlock> {
        SlotLevel::new(level).and_then(|level| self.slots.get_mut(&level))
    }
}

/// Caster levels accumulated over an actor's classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CasterProgression {
    /// Number of classes contributing to shared slots.
    pub classes: u32,
    /// Slot-equivalent caster level.
    pub slot: i32,
    /// Warlock-style pact level.
    pub pact: i32,
}

fn slot_contribution(progression: Progression, levels: i32) -> i32 {
    match progression {
        Progression::Third => levels.div_euclid(3),
        Progression::Half => levels.div_euclid(2),
        Progression::Full => levels,
        Progression::Artificer => levels.div_euclid(2) + levels.rem_euclid(2),
        Progression::None | Progression::Pact => 0,
    }
}

/// Sum caster levels over the given classes.
///
/// A single partial caster rounds its level up instead of down. NPCs never
/// get that exception.
pub fn caster_progression(classes: &[&ClassData], is_npc: bool) -> CasterProgression {
    let mut progression = CasterProgression::default();
    let mut caster: Option<&ClassData> = None;

    for class in classes {
        match class.spellcasting {
            Progression::None => {}
            Progression::Pact => {
                progression.pact = progression.pact.saturating_add(class.effective_levels())
            }
            other => {
                progression.classes += 1;
                progression.slot = progression
                    .slot
                    .saturating_add(slot_contribution(other, class.effective_levels()));
                caster = Some(*class);
            }
        }
    }

    if let Some(caster) = caster {
        let single = progression.classes == 1 && progression.slot > 0;
        let denominator = match caster.spellcasting {
            Progression::Third => Some(3),
            Progression::Half => Some(2),
            _ => None,
        };
        if let Some(denom) = denominator.filter(|_| single && !is_npc) {
            progression.slot = caster.effective_levels().div_euclid(denom)
                + i32::from(caster.effective_levels().rem_euclid(denom) != 0);
        }
    }

    progression
}

/// Number of pact slots for a pact level.
pub fn pact_slot_count(pact_level: i32) -> i32 {
    1.max(pact_level.min(2))
        .max((pact_level - 8).min(3))
        .max((pact_level - 13).min(4))
}

/// Recompute slot maximums and pact slot data.
pub fn prepare_spellcasting(actor: &mut Actor, config: &RulesConfig, npc_spell_level: Option<i32>) {
    if actor.is_vehicle() {
        return;
    }
    let is_npc = actor.is_npc();
    let progression = caster_progression(&actor.class_data(), is_npc);

    let mut caster_level = progression.slot;
    if let Some(level) = npc_spell_level.filter(|level| *level != 0) {
        caster_level = level;
    }
    let caster_level = caster_level.clamp(0, config.max_level);

    let table = config.slots_for_level(caster_level);
    for level in SlotLevel::all() {
        let block = actor.spells.slots.entry(level).or_default();
        block.max = match block.override_max {
            Some(override_max) => override_max.max(0),
            None => table[level.level() as usize - 1] as i32,
        };
    }

    let pact = &mut actor.spells.pact;
    let mut pact_level = progression.pact.clamp(0, config.max_level);
    if is_npc && pact_level == 0 && pact.override_max.is_some() {
        pact_level = npc_spell_level.unwrap_or(0);
    }

    if pact_level > 0 {
        pact.level = (pact_level.min(10) + 1).div_euclid(2);
        pact.max = match pact.override_max {
            Some(override_max) => override_max.max(0),
            None => pact_slot_count(pact_level),
        };
        pact.value = pact.value.min(pact.max);
    } else {
        pact.max = pact.override_max.unwrap_or(0).max(0);
        pact.level = if pact.max > 0 { 1 } else { 0 };
    }
}
