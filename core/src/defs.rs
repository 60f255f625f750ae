//! Immutable definition records shared by every instance of a kind.
//!
//! Tables of these records are loaded once by the data layer and never mutated
//! by gameplay. Placed furniture keeps a private copy of its definition so a
//! single instance can change state without touching the template.

use serde::{Deserialize, Serialize};

use crate::{Offset, TileId};

/// Static description of a floor tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileDef {
    /// Index of the tile in the tile table.
    pub id: TileId,
    /// Unique kind name.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Text shown when the tile is described.
    pub description: String,
    /// Largest total bulk the tile can hold.
    pub max_bulk: i32,
    /// Damage dealt to walking creatures entering the tile.
    pub damage_per_turn: i32,
    /// Whether light passes through the tile.
    pub transparent: bool,
    /// Kind the tile turns into when activated mechanically.
    pub activation_kind: Option<String>,
    /// Kind the tile turns into when activated by a creature.
    pub user_activation_kind: Option<String>,
    /// Item kind required for user activation.
    pub required_item: Option<String>,
}

impl Default for TileDef {
    /// The void tile substituted for cells outside the level or unknown ids.
    fn default() -> Self {
        Self {
            id: TileId::default(),
            kind: "void".to_owned(),
            name: "void".to_owned(),
            description: String::new(),
            max_bulk: 0,
            damage_per_turn: 0,
            transparent: false,
            activation_kind: None,
            user_activation_kind: None,
            required_item: None,
        }
    }
}

/// Static description of a creature kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureDef {
    /// Index of the creature in the creature table.
    pub id: u32,
    /// Unique kind name.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Text shown when the creature is described.
    pub description: String,
    /// Hit points of a fresh instance.
    pub max_hp: i32,
    /// Base damage dealt in melee.
    pub strength: i32,
    /// Damage absorbed from every hit.
    pub defence: i32,
    /// Time cost of a single action; lower is faster.
    pub speed: i32,
    /// Space the creature occupies in a cell.
    pub bulk: i32,
    /// Flying creatures ignore tile damage.
    pub flying: bool,
    /// Faction label; creatures of the same category do not fight.
    pub category: String,
    /// Default willpower of spawned instances.
    pub willpower: i32,
    /// Number of general purpose inventory slots.
    pub inventory_slot_count: usize,
    /// Whether the creature can wield a weapon.
    pub has_offensive_slot: bool,
    /// Whether the creature can wear armour.
    pub has_defensive_slot: bool,
    /// Item kinds placed in the inventory on spawn.
    pub starting_inventory: Vec<String>,
}

impl Default for CreatureDef {
    fn default() -> Self {
        Self {
            id: 0,
            kind: String::new(),
            name: String::new(),
            description: String::new(),
            max_hp: 1,
            strength: 0,
            defence: 0,
            speed: 10,
            bulk: 1,
            flying: false,
            category: String::new(),
            willpower: 1,
            inventory_slot_count: 0,
            has_offensive_slot: false,
            has_defensive_slot: false,
            starting_inventory: Vec::new(),
        }
    }
}

/// Broad item families that decide slot placement and use behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// Held in the offensive slot.
    Weapon,
    /// Held in the defensive slot.
    Armour,
    /// Consumed by furniture that requires it.
    Key,
    /// Drunk to restore hit points.
    Potion,
    /// Consumed on contact to upgrade the spirit.
    Orb,
    /// Anything else.
    #[default]
    #[serde(other)]
    Misc,
}

/// Static description of an item kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    /// Index of the item in the item table.
    pub id: u32,
    /// Unique kind name.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Text shown when the item is described.
    pub description: String,
    /// Family of the item.
    pub category: ItemCategory,
    /// Damage added while wielded.
    pub attack_bonus: i32,
    /// Damage absorbed while worn.
    pub defence_bonus: i32,
}

/// Chance of an item kind appearing on a furniture piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Item kind to place.
    pub item_kind: String,
    /// Probability in `[0, 1]`.
    pub chance: f32,
}

/// Static description of a furniture kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FurnitureDef {
    /// Sprite used to draw the furniture and to remember it.
    pub icon_id: u32,
    /// Unique kind name.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Text shown when the furniture is described.
    pub description: String,
    /// Space the furniture occupies in a cell.
    pub bulk: i32,
    /// Minimum pusher bulk needed to move the furniture.
    pub push_threshold: i32,
    /// Sort key; lower values are drawn first.
    pub draw_order: i32,
    /// Damage dealt to walking creatures entering the cell.
    pub damage_per_turn: i32,
    /// Whether light passes through the furniture.
    pub transparent: bool,
    /// Kind the furniture turns into when triggered mechanically.
    pub activation_kind: Option<String>,
    /// Kind the furniture turns into when operated by a creature.
    pub user_activation_kind: Option<String>,
    /// Message reported when a creature operates the furniture.
    pub user_activation_text: Option<String>,
    /// Item kind consumed when a creature operates the furniture.
    pub required_item: Option<String>,
    /// Cells re-triggered on activation, relative to the owning room origin.
    pub activation_targets: Vec<Offset>,
    /// Items rolled once when the furniture is placed.
    pub loot_table: Vec<LootEntry>,
}

impl Default for FurnitureDef {
    fn default() -> Self {
        Self {
            icon_id: 0,
            kind: String::new(),
            name: String::new(),
            description: String::new(),
            bulk: 0,
            push_threshold: i32::MAX,
            draw_order: 0,
            damage_per_turn: 0,
            transparent: true,
            activation_kind: None,
            user_activation_kind: None,
            user_activation_text: None,
            required_item: None,
            activation_targets: Vec::new(),
            loot_table: Vec::new(),
        }
    }
}

impl FurnitureDef {
    /// Takes over every field of `other` except the trigger list.
    ///
    /// The instance keeps its own activation targets so that a transformed
    /// piece, such as a pressed plate, keeps driving the same cells.
    pub fn assume(&mut self, other: &FurnitureDef) {
        let targets = std::mem::take(&mut self.activation_targets);
        *self = other.clone();
        self.activation_targets = targets;
    }
}

/// Kinds of inventory slot a creature may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Holds a weapon.
    Offensive,
    /// Holds armour.
    Defensive,
    /// Holds anything.
    General,
}

impl SlotKind {
    /// Reports whether an item of the provided category fits in the slot.
    #[must_use]
    pub const fn accepts(self, category: ItemCategory) -> bool {
        match self {
            Self::Offensive => matches!(category, ItemCategory::Weapon),
            Self::Defensive => matches!(category, ItemCategory::Armour),
            Self::General => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_keeps_own_activation_targets() {
        let mut plate = FurnitureDef {
            kind: "pressureplate".to_owned(),
            bulk: 0,
            activation_targets: vec![Offset::new(2, 0)],
            ..FurnitureDef::default()
        };
        let pressed = FurnitureDef {
            kind: "pressureplatedown".to_owned(),
            icon_id: 7,
            activation_targets: vec![Offset::new(9, 9)],
            ..FurnitureDef::default()
        };

        plate.assume(&pressed);

        assert_eq!(plate.kind, "pressureplatedown");
        assert_eq!(plate.icon_id, 7);
        assert_eq!(plate.activation_targets, vec![Offset::new(2, 0)]);
    }

    #[test]
    fn slots_accept_matching_categories() {
        assert!(SlotKind::Offensive.accepts(ItemCategory::Weapon));
        assert!(!SlotKind::Offensive.accepts(ItemCategory::Armour));
        assert!(SlotKind::Defensive.accepts(ItemCategory::Armour));
        assert!(SlotKind::General.accepts(ItemCategory::Potion));
    }

    #[test]
    fn unknown_item_categories_fall_back_to_misc() {
        let item: ItemDef =
            serde_json::from_str(r#"{"kind": "bone", "category": "trinket"}"#).expect("parse");
        assert_eq!(item.category, ItemCategory::Misc);
        assert_eq!(item.kind, "bone");
    }

    #[test]
    fn missing_tile_fields_describe_the_void() {
        let tile: TileDef = serde_json::from_str("{}").expect("parse");
        assert_eq!(tile.max_bulk, 0);
        assert!(!tile.transparent);
    }
}
