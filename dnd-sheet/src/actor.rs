//! Actor documents: characters, NPCs and vehicles.
//!
//! An [`Actor`] holds authored source data (ability scores, proficiency
//! multipliers, bonus formulas, owned items) alongside the derived blocks
//! the engine fills in on every preparation pass. Derived fields are marked
//! `#[serde(default)]` so documents without them load cleanly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::armor::ArmorClassBlock;
use crate::encumbrance::Encumbrance;
use crate::formula::{Formula, RollData};
use crate::items::{ClassData, Item};
use crate::proficiency::{Proficiency, ProficiencyLevel};
use crate::spellcasting::Spells;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Abilities
// ============================================================================

/// Ability scores. Honor and Sanity are optional and only present on actors
/// that carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "str")]
    Strength,
    #[serde(rename = "dex")]
    Dexterity,
    #[serde(rename = "con")]
    Constitution,
    #[serde(rename = "int")]
    Intelligence,
    #[serde(rename = "wis")]
    Wisdom,
    #[serde(rename = "cha")]
    Charisma,
    #[serde(rename = "hon")]
    Honor,
    #[serde(rename = "san")]
    Sanity,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
            Ability::Honor => "HON",
            Ability::Sanity => "SAN",
        }
    }

    /// Key used in roll data and field paths.
    pub fn id(&self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
            Ability::Honor => "hon",
            Ability::Sanity => "san",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
            Ability::Honor => "Honor",
            Ability::Sanity => "Sanity",
        }
    }

    /// The six core abilities every actor starts with.
    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    pub fn optional() -> [Ability; 2] {
        [Ability::Honor, Ability::Sanity]
    }

    /// Strength, Dexterity and Constitution.
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            Ability::Strength | Ability::Dexterity | Ability::Constitution
        )
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityBonuses {
    #[serde(default)]
    pub check: Formula,
    #[serde(default)]
    pub save: Formula,
}

/// One ability score with its derived modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityBlock {
    pub value: i32,
    /// Saving throw proficiency multiplier.
    #[serde(default)]
    pub proficient: f64,
    #[serde(default)]
    pub bonuses: AbilityBonuses,

    #[serde(default, rename = "mod")]
    pub modifier: i32,
    #[serde(default)]
    pub save_prof: Proficiency,
    #[serde(default)]
    pub check_prof: Proficiency,
    #[serde(default)]
    pub save_bonus: i32,
    #[serde(default)]
    pub check_bonus: i32,
    #[serde(default)]
    pub save: i32,
    #[serde(default)]
    pub dc: i32,
}

impl AbilityBlock {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            proficient: 0.0,
            bonuses: AbilityBonuses::default(),
            modifier: 0,
            save_prof: Proficiency::default(),
            check_prof: Proficiency::default(),
            save_bonus: 0,
            check_bonus: 0,
            save: 0,
            dc: 0,
        }
    }

    pub fn with_save_proficiency(mut self) -> Self {
        self.proficient = 1.0;
        self
    }
}

/// Ability modifier for a score.
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    #[serde(rename = "acr")]
    Acrobatics,
    #[serde(rename = "ani")]
    AnimalHandling,
    #[serde(rename = "arc")]
    Arcana,
    #[serde(rename = "ath")]
    Athletics,
    #[serde(rename = "dec")]
    Deception,
    #[serde(rename = "his")]
    History,
    #[serde(rename = "ins")]
    Insight,
    #[serde(rename = "itm")]
    Intimidation,
    #[serde(rename = "inv")]
    Investigation,
    #[serde(rename = "med")]
    Medicine,
    #[serde(rename = "nat")]
    Nature,
    #[serde(rename = "prc")]
    Perception,
    #[serde(rename = "prf")]
    Performance,
    #[serde(rename = "per")]
    Persuasion,
    #[serde(rename = "rel")]
    Religion,
    #[serde(rename = "slt")]
    SleightOfHand,
    #[serde(rename = "ste")]
    Stealth,
    #[serde(rename = "sur")]
    Survival,
}

impl Skill {
    pub fn all() -> [Skill; 18] {
        [
            Skill::Acrobatics,
            Skill::AnimalHandling,
            Skill::Arcana,
            Skill::Athletics,
            Skill::Deception,
            Skill::History,
            Skill::Insight,
            Skill::Intimidation,
            Skill::Investigation,
            Skill::Medicine,
            Skill::Nature,
            Skill::Perception,
            Skill::Performance,
            Skill::Persuasion,
            Skill::Religion,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Survival,
        ]
    }

    /// The ability a skill uses unless the sheet says otherwise.
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }

    /// Skills whose passive score benefits from the Observant feat.
    pub fn is_observant(&self) -> bool {
        matches!(self, Skill::Perception | Skill::Investigation)
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillBonuses {
    #[serde(default)]
    pub check: Formula,
    #[serde(default)]
    pub passive: Formula,
}

/// One skill with its derived totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBlock {
    /// Stored proficiency multiplier (0, 0.5, 1, 2).
    #[serde(default)]
    pub value: f64,
    pub ability: Ability,
    #[serde(default)]
    pub bonuses: SkillBonuses,

    #[serde(default)]
    pub proficient: ProficiencyLevel,
    #[serde(default, rename = "mod")]
    pub modifier: i32,
    #[serde(default)]
    pub bonus: i32,
    #[serde(default)]
    pub prof: Proficiency,
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub passive: i32,
}

impl SkillBlock {
    pub fn new(skill: Skill) -> Self {
        Self {
            value: 0.0,
            ability: skill.ability(),
            bonuses: SkillBonuses::default(),
            proficient: ProficiencyLevel::None,
            modifier: 0,
            bonus: 0,
            prof: Proficiency::default(),
            total: 0,
            passive: 0,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

// ============================================================================
// Attributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
    #[serde(default)]
    pub temp: i32,
    /// Temporary change to maximum hit points.
    #[serde(default)]
    pub tempmax: i32,
}

impl HitPoints {
    pub fn new(max: i32) -> Self {
        Self {
            value: max,
            max,
            temp: 0,
            tempmax: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitiativeBlock {
    #[serde(default)]
    pub bonus: Formula,

    #[serde(default, rename = "mod")]
    pub modifier: i32,
    #[serde(default)]
    pub prof: Proficiency,
    #[serde(default)]
    pub total: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeathSaves {
    #[serde(default)]
    pub success: u8,
    #[serde(default)]
    pub failure: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub ac: ArmorClassBlock,
    pub hp: HitPoints,
    #[serde(default)]
    pub init: InitiativeBlock,
    #[serde(default)]
    pub death: DeathSaves,
    /// Ability used for spellcasting, if any.
    #[serde(default)]
    pub spellcasting: Option<Ability>,

    #[serde(default)]
    pub prof: i32,
    /// Hit dice remaining across all classes.
    #[serde(default)]
    pub hd: i32,
    #[serde(default)]
    pub spelldc: i32,
    #[serde(default)]
    pub encumbrance: Encumbrance,
}

/// A generic limited resource (Ki, Superiority Dice, Legendary Actions...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub max: Option<i32>,
    /// Recovers on a short rest.
    #[serde(default)]
    pub sr: bool,
    /// Recovers on a long rest.
    #[serde(default)]
    pub lr: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub pp: i64,
    #[serde(default)]
    pub gp: i64,
    #[serde(default)]
    pub ep: i64,
    #[serde(default)]
    pub sp: i64,
    #[serde(default)]
    pub cp: i64,
}

impl Currency {
    /// Number of coins carried, ignoring negative entries.
    pub fn coin_count(&self) -> i64 {
        [self.pp, self.gp, self.ep, self.sp, self.cp]
            .iter()
            .map(|n| (*n).max(0))
            .sum()
    }
}

/// Creature size categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "tiny")]
    Tiny,
    #[serde(rename = "sm")]
    Small,
    #[default]
    #[serde(rename = "med")]
    Medium,
    #[serde(rename = "lg")]
    Large,
    #[serde(rename = "huge")]
    Huge,
    #[serde(rename = "grg")]
    Gargantuan,
}

impl Size {
    pub fn all() -> [Size; 6] {
        [
            Size::Tiny,
            Size::Small,
            Size::Medium,
            Size::Large,
            Size::Huge,
            Size::Gargantuan,
        ]
    }

    pub fn default_carry_multiplier(&self) -> f64 {
        match self {
            Size::Tiny => 0.5,
            Size::Small | Size::Medium => 1.0,
            Size::Large => 2.0,
            Size::Huge => 4.0,
            Size::Gargantuan => 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    #[serde(default)]
    pub size: Size,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityCheckBonuses {
    #[serde(default)]
    pub check: Formula,
    #[serde(default)]
    pub save: Formula,
    #[serde(default)]
    pub skill: Formula,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellBonuses {
    #[serde(default)]
    pub dc: Formula,
}

/// Bonuses that apply across every ability, skill or spell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalBonuses {
    #[serde(default)]
    pub abilities: AbilityCheckBonuses,
    #[serde(default)]
    pub spell: SpellBonuses,
}

/// Special traits granted by class features and feats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorFlags {
    /// Proficient in all saving throws.
    #[serde(default)]
    pub diamond_soul: bool,
    /// Half proficiency (rounded up) on physical ability checks.
    #[serde(default)]
    pub remarkable_athlete: bool,
    /// Half proficiency (rounded down) on any ability check.
    #[serde(default)]
    pub jack_of_all_trades: bool,
    /// +5 to passive Perception and Investigation.
    #[serde(default)]
    pub observant_feat: bool,
    /// Counts as one size larger for carrying capacity.
    #[serde(default)]
    pub powerful_build: bool,
    /// +5 to initiative.
    #[serde(default)]
    pub initiative_alert: bool,
    /// Reroll natural 1s.
    #[serde(default)]
    pub halfling_lucky: bool,
}

// ============================================================================
// Details
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDetails {
    #[serde(default)]
    pub xp: Experience,
    #[serde(default)]
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcDetails {
    /// Challenge rating.
    #[serde(default)]
    pub cr: f64,
    /// Explicit spellcaster level.
    #[serde(default)]
    pub spell_level: Option<i32>,
    #[serde(default)]
    pub xp: Experience,
}

impl NpcDetails {
    /// Caster level used for slots: the explicit value, or the challenge
    /// rating (at least 1) for an NPC that has a spellcasting ability.
    pub fn effective_spell_level(&self, has_spellcasting: bool) -> Option<i32> {
        match self.spell_level {
            Some(level) => Some(level),
            None if has_spellcasting => Some((self.cr as i32).max(1)),
            None => None,
        }
    }
}

/// Subtype-specific details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActorDetails {
    Character(CharacterDetails),
    Npc(NpcDetails),
    Vehicle,
}

// ============================================================================
// Transformation
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(default)]
    pub merge_saves: bool,
    #[serde(default)]
    pub merge_skills: bool,
}

/// A temporary substitution of this actor's data with another creature's.
///
/// The original actor's resolved saves and skill multipliers are captured
/// when the transformation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub original_actor: ActorId,
    #[serde(default)]
    pub options: TransformOptions,
    #[serde(default)]
    pub saves: BTreeMap<Ability, i32>,
    #[serde(default)]
    pub skills: BTreeMap<Skill, f64>,
}

impl Transformation {
    /// Snapshot a prepared actor as the original of a transformation.
    pub fn capture(original: &Actor, options: TransformOptions) -> Self {
        Self {
            original_actor: original.id,
            options,
            saves: original
                .abilities
                .iter()
                .map(|(ability, block)| (*ability, block.save))
                .collect(),
            skills: original
                .skills
                .iter()
                .map(|(skill, block)| (*skill, block.prof.multiplier))
                .collect(),
        }
    }

    pub fn original_save(&self, ability: Ability) -> Option<i32> {
        if self.options.merge_saves {
            self.saves.get(&ability).copied()
        } else {
            None
        }
    }

    pub fn original_skill(&self, skill: Skill) -> Option<f64> {
        if self.options.merge_skills {
            self.skills.get(&skill).copied()
        } else {
            None
        }
    }
}

// ============================================================================
// Actor
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub id: ActorId,
    pub name: String,
    pub details: ActorDetails,
    #[serde(default)]
    pub abilities: BTreeMap<Ability, AbilityBlock>,
    #[serde(default)]
    pub skills: BTreeMap<Skill, SkillBlock>,
    pub attributes: Attributes,
    #[serde(default)]
    pub spells: Spells,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub traits: Traits,
    #[serde(default)]
    pub bonuses: GlobalBonuses,
    #[serde(default)]
    pub flags: ActorFlags,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transformation>,
}

impl Actor {
    /// Create an actor with average ability scores and every skill listed.
    pub fn new(name: impl Into<String>, details: ActorDetails, max_hp: i32) -> Self {
        let skills = match details {
            ActorDetails::Vehicle => BTreeMap::new(),
            _ => Skill::all()
                .into_iter()
                .map(|skill| (skill, SkillBlock::new(skill)))
                .collect(),
        };
        Self {
            id: ActorId::new(),
            name: name.into(),
            details,
            abilities: Ability::all()
                .into_iter()
                .map(|ability| (ability, AbilityBlock::new(10)))
                .collect(),
            skills,
            attributes: Attributes {
                hp: HitPoints::new(max_hp),
                ..Default::default()
            },
            spells: Spells::default(),
            resources: BTreeMap::new(),
            currency: Currency::default(),
            traits: Traits::default(),
            bonuses: GlobalBonuses::default(),
            flags: ActorFlags::default(),
            items: Vec::new(),
            transform: None,
        }
    }

    pub fn character(name: impl Into<String>, max_hp: i32) -> Self {
        Self::new(name, ActorDetails::Character(CharacterDetails::default()), max_hp)
    }

    pub fn npc(name: impl Into<String>, cr: f64, max_hp: i32) -> Self {
        Self::new(
            name,
            ActorDetails::Npc(NpcDetails {
                cr,
                ..Default::default()
            }),
            max_hp,
        )
    }

    pub fn vehicle(name: impl Into<String>, max_hp: i32) -> Self {
        Self::new(name, ActorDetails::Vehicle, max_hp)
    }

    pub fn with_ability(mut self, ability: Ability, value: i32) -> Self {
        self.abilities
            .entry(ability)
            .or_insert_with(|| AbilityBlock::new(value))
            .value = value;
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn is_character(&self) -> bool {
        matches!(self.details, ActorDetails::Character(_))
    }

    pub fn is_npc(&self) -> bool {
        matches!(self.details, ActorDetails::Npc(_))
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self.details, ActorDetails::Vehicle)
    }

    /// Total character level (0 for NPCs and vehicles).
    pub fn level(&self) -> i32 {
        match &self.details {
            ActorDetails::Character(details) => details.level,
            _ => 0,
        }
    }

    pub fn ability_mod(&self, ability: Ability) -> i32 {
        self.abilities
            .get(&ability)
            .map(|block| block.modifier)
            .unwrap_or(0)
    }

    /// Owned items in manual sort order. Ties keep insertion order.
    pub fn sorted_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|item| item.sort);
        items
    }

    /// Class items keyed by class identifier. A later duplicate replaces an
    /// earlier one.
    pub fn classes(&self) -> BTreeMap<String, &Item> {
        self.sorted_items()
            .into_iter()
            .filter_map(|item| {
                item.as_class()
                    .map(|class| (class.identifier.clone(), item))
            })
            .collect()
    }

    /// Class data in the same order as [`Actor::classes`].
    pub fn class_data(&self) -> Vec<&ClassData> {
        self.classes()
            .into_values()
            .filter_map(Item::as_class)
            .collect()
    }

    pub fn item(&self, id: crate::items::ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Variables available to formulas.
    pub fn roll_data(&self) -> RollData {
        let classes: BTreeMap<String, Value> = self
            .classes()
            .into_iter()
            .filter_map(|(id, item)| {
                item.as_class().map(|class| {
                    (
                        id,
                        json!({
                            "levels": class.levels,
                            "hit_dice": class.hit_dice.to_string(),
                            "hit_dice_used": class.hit_dice_used,
                        }),
                    )
                })
            })
            .collect();

        RollData::new(json!({
            "abilities": to_json(&self.abilities),
            "skills": to_json(&self.skills),
            "attributes": to_json(&self.attributes),
            "details": to_json(&self.details),
            "resources": to_json(&self.resources),
            "currency": to_json(&self.currency),
            "traits": to_json(&self.traits),
            "classes": classes,
            "prof": self.attributes.prof,
        }))
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
