//! Items owned by an actor.
//!
//! Every item carries a type tag and a type-specific data block. The engine
//! only reads the parts it needs: class levels and hit dice, armor values,
//! physical weight, and limited uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::dice::DieType;

/// Unique identifier for an owned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Item
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    pub name: String,
    /// Manual ordering key; items are always processed in ascending order.
    #[serde(default)]
    pub sort: i64,
    pub data: ItemData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Uses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recharge: Option<Recharge>,
}

impl Item {
    pub fn new(name: impl Into<String>, data: ItemData) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            sort: 0,
            data,
            uses: None,
            recharge: None,
        }
    }

    pub fn with_sort(mut self, sort: i64) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_uses(mut self, value: i32, max: i32, per: UsesPeriod) -> Self {
        self.uses = Some(Uses {
            value,
            max,
            per: Some(per),
        });
        self
    }

    pub fn with_recharge(mut self, value: u8, charged: bool) -> Self {
        self.recharge = Some(Recharge {
            value: Some(value),
            charged,
        });
        self
    }

    /// Short form for a class item.
    pub fn class(
        name: impl Into<String>,
        identifier: impl Into<String>,
        levels: i32,
        hit_dice: DieType,
        spellcasting: Progression,
    ) -> Self {
        Self::new(
            name,
            ItemData::Class(ClassData {
                identifier: identifier.into(),
                levels,
                hit_dice,
                hit_dice_used: 0,
                spellcasting,
            }),
        )
    }

    /// Short form for a piece of armor or a shield.
    pub fn armor(name: impl Into<String>, kind: ArmorKind, value: i32, dex_cap: Option<i32>) -> Self {
        Self::new(
            name,
            ItemData::Equipment(EquipmentData {
                physical: PhysicalData::default(),
                armor: Some(ArmorData {
                    kind,
                    value: Some(value),
                    dex: dex_cap,
                }),
            }),
        )
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            ItemData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.data {
            ItemData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn physical(&self) -> Option<&PhysicalData> {
        self.data.physical()
    }

    pub fn physical_mut(&mut self) -> Option<&mut PhysicalData> {
        match &mut self.data {
            ItemData::Weapon(p)
            | ItemData::Consumable(p)
            | ItemData::Tool(p)
            | ItemData::Backpack(p)
            | ItemData::Loot(p) => Some(p),
            ItemData::Equipment(e) => Some(&mut e.physical),
            _ => None,
        }
    }

    /// Equipped armor data, if this is worn equipment with an armor block.
    pub fn equipped_armor(&self) -> Option<&ArmorData> {
        match &self.data {
            ItemData::Equipment(e) if e.physical.equipped => e.armor.as_ref(),
            _ => None,
        }
    }

    /// Mark this item as equipped (no-op for non-physical items).
    pub fn equipped(mut self) -> Self {
        if let Some(physical) = self.physical_mut() {
            physical.equipped = true;
        }
        self
    }

    pub fn with_weight(mut self, quantity: u32, weight: f64) -> Self {
        if let Some(physical) = self.physical_mut() {
            physical.quantity = quantity;
            physical.weight = weight;
        }
        self
    }
}

// ============================================================================
// Item data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemData {
    Class(ClassData),
    Weapon(PhysicalData),
    Equipment(EquipmentData),
    Consumable(PhysicalData),
    Tool(PhysicalData),
    Backpack(PhysicalData),
    Loot(PhysicalData),
    Spell(SpellData),
    Feat,
}

impl ItemData {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemData::Class(_) => ItemKind::Class,
            ItemData::Weapon(_) => ItemKind::Weapon,
            ItemData::Equipment(_) => ItemKind::Equipment,
            ItemData::Consumable(_) => ItemKind::Consumable,
            ItemData::Tool(_) => ItemKind::Tool,
            ItemData::Backpack(_) => ItemKind::Backpack,
            ItemData::Loot(_) => ItemKind::Loot,
            ItemData::Spell(_) => ItemKind::Spell,
            ItemData::Feat => ItemKind::Feat,
        }
    }

    /// Quantity and weight for physically carried kinds.
    pub fn physical(&self) -> Option<&PhysicalData> {
        match self {
            ItemData::Weapon(p)
            | ItemData::Consumable(p)
            | ItemData::Tool(p)
            | ItemData::Backpack(p)
            | ItemData::Loot(p) => Some(p),
            ItemData::Equipment(e) => Some(&e.physical),
            _ => None,
        }
    }
}

/// Item type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Class,
    Weapon,
    Equipment,
    Consumable,
    Tool,
    Backpack,
    Loot,
    Spell,
    Feat,
}

impl ItemKind {
    /// Kinds that have weight and count toward encumbrance.
    pub const PHYSICAL: [ItemKind; 6] = [
        ItemKind::Weapon,
        ItemKind::Equipment,
        ItemKind::Consumable,
        ItemKind::Tool,
        ItemKind::Backpack,
        ItemKind::Loot,
    ];

    pub fn is_physical(&self) -> bool {
        Self::PHYSICAL.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalData {
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub equipped: bool,
}

fn default_quantity() -> u32 {
    1
}

impl Default for PhysicalData {
    fn default() -> Self {
        Self {
            quantity: 1,
            weight: 0.0,
            equipped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentData {
    #[serde(flatten)]
    pub physical: PhysicalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorData {
    #[serde(rename = "type")]
    pub kind: ArmorKind,
    #[serde(default)]
    pub value: Option<i32>,
    /// Maximum Dexterity modifier this armor allows.
    #[serde(default)]
    pub dex: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorKind {
    Light,
    Medium,
    Heavy,
    Natural,
    Bonus,
    Shield,
    Clothing,
    Trinket,
}

impl ArmorKind {
    /// Body armor that sets the base armor value.
    pub fn is_armor(&self) -> bool {
        matches!(self, ArmorKind::Light | ArmorKind::Medium | ArmorKind::Heavy)
    }

    pub fn is_shield(&self) -> bool {
        *self == ArmorKind::Shield
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellData {
    #[serde(default)]
    pub level: u8,
}

// ============================================================================
// Classes
// ============================================================================

/// Spell slot progression a class contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    #[default]
    None,
    Third,
    Half,
    Full,
    Artificer,
    Pact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassData {
    pub identifier: String,
    #[serde(default = "default_levels")]
    pub levels: i32,
    pub hit_dice: DieType,
    #[serde(default)]
    pub hit_dice_used: i32,
    #[serde(default)]
    pub spellcasting: Progression,
}

fn default_levels() -> i32 {
    1
}

impl ClassData {
    /// Levels this class counts for. A class item always counts as at least
    /// one level.
    pub fn effective_levels(&self) -> i32 {
        self.levels.max(1)
    }

    /// Hit dice not yet spent.
    pub fn hit_dice_available(&self) -> i32 {
        self.effective_levels()
            .saturating_sub(self.hit_dice_used)
            .max(0)
    }
}

// ============================================================================
// Uses
// ============================================================================

/// When limited uses come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsesPeriod {
    /// Short rest (and therefore also long rest).
    Sr,
    /// Long rest.
    Lr,
    /// Start of a new day.
    Day,
    /// Charges that only come back through other means.
    Charges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uses {
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub max: i32,
    #[serde(default)]
    pub per: Option<UsesPeriod>,
}

/// Recharge-on-a-roll abilities ("Recharge 5-6").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recharge {
    #[serde(default)]
    pub value: Option<u8>,
    #[serde(default)]
    pub charged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serde_tag() {
        let item = Item::class("Fighter", "fighter", 3, DieType::D10, Progression::None);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["data"]["type"], "class");
        assert_eq!(json["data"]["hit_dice"], "d10");
        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_equipment_flatten() {
        let json = serde_json::json!({
            "name": "Chain Mail",
            "data": {
                "type": "equipment",
                "weight": 55.0,
                "equipped": true,
                "armor": { "type": "heavy", "value": 16 }
            }
        });
        let item: Item = serde_json::from_value(json).unwrap();
        let armor = item.equipped_armor().unwrap();
        assert_eq!(armor.kind, ArmorKind::Heavy);
        assert_eq!(armor.value, Some(16));
        assert_eq!(item.physical().unwrap().quantity, 1);
    }

    #[test]
    fn test_unequipped_armor_ignored() {
        let item = Item::armor("Leather", ArmorKind::Light, 11, None);
        assert!(item.equipped_armor().is_none());
        assert!(item.equipped().equipped_armor().is_some());
    }

    #[test]
    fn test_physical_kinds() {
        assert!(ItemKind::Loot.is_physical());
        assert!(!ItemKind::Spell.is_physical());
        assert!(!ItemKind::Class.is_physical());
    }

    #[test]
    fn test_hit_dice_available() {
        let mut item = Item::class("Wizard", "wizard", 4, DieType::D6, Progression::Full);
        item.as_class_mut().unwrap().hit_dice_used = 5;
        assert_eq!(item.as_class().unwrap().hit_dice_available(), 0);
    }

    #[test]
    fn test_zero_level_class_counts_as_one() {
        let mut item = Item::class("Wizard", "wizard", 0, DieType::D6, Progression::Full);
        let class = item.as_class().unwrap();
        assert_eq!(class.effective_levels(), 1);
        assert_eq!(class.hit_dice_available(), 1);
        item.as_class_mut().unwrap().hit_dice_used = 1;
        assert_eq!(item.as_class().unwrap().hit_dice_available(), 0);
    }
}
