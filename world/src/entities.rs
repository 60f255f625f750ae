//! Mutable instances owned by a level.

use std::{collections::BTreeMap, rc::Rc};

use spirit_crypt_core::{
    CreatureDef, CreatureId, FurnitureDef, ItemCategory, ItemDef, ItemId, Position, SlotKind,
};
use thiserror::Error;
use tracing::warn;

use crate::properties;

/// Errors raised by inventory manipulation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// No free slot accepts the item.
    #[error("no free slot can hold the {name}")]
    Full {
        /// Display name of the rejected item.
        name: String,
    },
    /// The slot index does not exist.
    #[error("slot {index} does not exist")]
    NoSuchSlot {
        /// Requested zero-based slot index.
        index: usize,
    },
    /// The slot kind cannot hold the item.
    #[error("the {name} does not fit in slot {index}")]
    Rejected {
        /// Display name of the rejected item.
        name: String,
        /// Zero-based slot index.
        index: usize,
    },
}

/// A single inventory slot.
#[derive(Clone, Debug)]
pub struct ItemSlot {
    kind: SlotKind,
    held: Option<Rc<ItemDef>>,
}

impl ItemSlot {
    /// Creates an empty slot of the provided kind.
    #[must_use]
    pub const fn empty(kind: SlotKind) -> Self {
        Self { kind, held: None }
    }

    /// Kind of the slot.
    #[must_use]
    pub const fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Item held in the slot, if any.
    #[must_use]
    pub fn held(&self) -> Option<&Rc<ItemDef>> {
        self.held.as_ref()
    }

    fn accepts(&self, category: ItemCategory) -> bool {
        self.kind.accepts(category)
    }
}

/// A living or dead creature placed in a level.
#[derive(Clone, Debug)]
pub struct Creature {
    id: CreatureId,
    position: Position,
    def: Rc<CreatureDef>,
    /// Remaining hit points; zero or less means dying.
    pub current_hp: i32,
    /// Willpower; zero disables autonomous actions.
    pub willpower: i32,
    /// Accumulated simulated time not yet spent on actions.
    pub time: i32,
    inventory: Vec<ItemSlot>,
    /// Set once death has been handled; purged by the next cleanup pass.
    pub is_dead: bool,
}

impl Creature {
    /// Creates a creature at full health with an empty inventory.
    ///
    /// Slots are laid out offensive first, then defensive, then general.
    #[must_use]
    pub fn new(id: CreatureId, def: Rc<CreatureDef>, position: Position, willpower: i32) -> Self {
        let mut inventory = Vec::with_capacity(def.inventory_slot_count + 2);
        if def.has_offensive_slot {
            inventory.push(ItemSlot::empty(SlotKind::Offensive));
        }
        if def.has_defensive_slot {
            inventory.push(ItemSlot::empty(SlotKind::Defensive));
        }
        inventory.extend((0..def.inventory_slot_count).map(|_| ItemSlot::empty(SlotKind::General)));

        Self {
            id,
            position,
            current_hp: def.max_hp,
            def,
            willpower,
            time: 0,
            inventory,
            is_dead: false,
        }
    }

    /// Identifier of the creature within its level.
    #[must_use]
    pub const fn id(&self) -> CreatureId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: CreatureId) {
        self.id = id;
    }

    /// Cell the creature occupies.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Shared definition of the creature's kind.
    #[must_use]
    pub fn def(&self) -> &Rc<CreatureDef> {
        &self.def
    }

    /// Inventory slots in display order.
    #[must_use]
    pub fn inventory(&self) -> &[ItemSlot] {
        &self.inventory
    }

    /// Reports whether the creature still takes part in the simulation.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead && self.current_hp > 0
    }

    /// First item held in a slot of the provided kind.
    #[must_use]
    pub fn first_item_in(&self, kind: SlotKind) -> Option<&Rc<ItemDef>> {
        self.inventory
            .iter()
            .filter(|slot| slot.kind == kind)
            .find_map(|slot| slot.held.as_ref())
    }

    /// Attack bonus of the wielded weapon.
    #[must_use]
    pub fn weapon_bonus(&self) -> i32 {
        self.first_item_in(SlotKind::Offensive)
            .map_or(0, |item| item.attack_bonus)
    }

    /// Defence bonus of the worn armour.
    #[must_use]
    pub fn armour_bonus(&self) -> i32 {
        self.first_item_in(SlotKind::Defensive)
            .map_or(0, |item| item.defence_bonus)
    }

    /// Stores an item in the first free slot that accepts it.
    pub fn pickup(&mut self, item: Rc<ItemDef>) -> Result<usize, InventoryError> {
        let Some(index) = self
            .inventory
            .iter()
            .position(|slot| slot.held.is_none() && slot.accepts(item.category))
        else {
            return Err(InventoryError::Full {
                name: item.name.clone(),
            });
        };
        self.inventory[index].held = Some(item);
        Ok(index)
    }

    /// Reports whether any slot holds an item of the provided kind.
    #[must_use]
    pub fn has_item(&self, kind: &str) -> bool {
        self.inventory
            .iter()
            .any(|slot| slot.held.as_ref().is_some_and(|item| item.kind == kind))
    }

    /// Removes the first item of the provided kind, reporting whether one was found.
    pub fn remove_item(&mut self, kind: &str) -> bool {
        let slot = self
            .inventory
            .iter_mut()
            .find(|slot| slot.held.as_ref().is_some_and(|item| item.kind == kind));
        match slot {
            Some(slot) => {
                slot.held = None;
                true
            }
            None => false,
        }
    }

    /// Empties a slot and returns what it held.
    pub fn take_slot(&mut self, index: usize) -> Result<Option<Rc<ItemDef>>, InventoryError> {
        self.inventory
            .get_mut(index)
            .map(|slot| slot.held.take())
            .ok_or(InventoryError::NoSuchSlot { index })
    }

    /// Exchanges the contents of two slots if both can hold what they receive.
    pub fn swap_slots(&mut self, from: usize, to: usize) -> Result<(), InventoryError> {
        let len = self.inventory.len();
        for index in [from, to] {
            if index >= len {
                return Err(InventoryError::NoSuchSlot { index });
            }
        }

        for (source, target) in [(from, to), (to, from)] {
            if let Some(item) = &self.inventory[source].held {
                if !self.inventory[target].accepts(item.category) {
                    return Err(InventoryError::Rejected {
                        name: item.name.clone(),
                        index: target,
                    });
                }
            }
        }

        let moved = self.inventory[from].held.take();
        self.inventory[from].held = self.inventory[to].held.take();
        self.inventory[to].held = moved;
        Ok(())
    }

    /// Empties every slot, returning the items in slot order.
    pub fn take_all_items(&mut self) -> Vec<Rc<ItemDef>> {
        self.inventory
            .iter_mut()
            .filter_map(|slot| slot.held.take())
            .collect()
    }
}

/// An item lying on the floor.
#[derive(Clone, Debug)]
pub struct Item {
    id: ItemId,
    position: Position,
    def: Rc<ItemDef>,
}

impl Item {
    pub(crate) fn new(id: ItemId, def: Rc<ItemDef>, position: Position) -> Self {
        Self { id, position, def }
    }

    /// Identifier of the item within its level.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Cell the item lies on.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Shared definition of the item's kind.
    #[must_use]
    pub fn def(&self) -> &Rc<ItemDef> {
        &self.def
    }
}

/// A furniture piece with its own copy of its definition.
#[derive(Clone, Debug)]
pub struct PlacedFurniture {
    /// Cell the furniture occupies.
    pub position: Position,
    /// Origin of the room the furniture was stamped with; activation
    /// targets are resolved against it.
    pub room_origin: Position,
    /// Private definition copy; swapped wholesale on activation.
    pub def: FurnitureDef,
}

impl PlacedFurniture {
    /// Creates a furniture piece from a template and applies per-object overrides.
    ///
    /// Malformed overrides are reported and skipped.
    #[must_use]
    pub fn from_definition(
        template: &FurnitureDef,
        position: Position,
        room_origin: Position,
        overrides: &BTreeMap<String, String>,
    ) -> Self {
        let mut def = template.clone();
        for (key, value) in overrides {
            if let Err(error) = properties::apply(&mut def, key, value) {
                warn!(kind = %def.kind, %error, "furniture_override_skipped");
            }
        }

        Self {
            position,
            room_origin,
            def,
        }
    }
}

/// A rectangle of lore text shown the first time the player enters it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptionZone {
    /// Top-left cell of the zone.
    pub origin: Position,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
    /// Text to reveal.
    pub text: String,
    /// Whether the text has been revealed.
    pub is_read: bool,
}

impl DescriptionZone {
    /// Reports whether the zone covers the provided cell.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x() >= self.origin.x()
            && position.y() >= self.origin.y()
            && position.x() < self.origin.x() + self.width
            && position.y() < self.origin.y() + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: &str, category: ItemCategory) -> Rc<ItemDef> {
        Rc::new(ItemDef {
            kind: kind.to_owned(),
            name: kind.to_owned(),
            category,
            attack_bonus: 3,
            defence_bonus: 2,
            ..ItemDef::default()
        })
    }

    fn knight() -> Creature {
        let def = Rc::new(CreatureDef {
            kind: "knight".to_owned(),
            max_hp: 12,
            has_offensive_slot: true,
            has_defensive_slot: true,
            inventory_slot_count: 1,
            ..CreatureDef::default()
        });
        Creature::new(CreatureId::new(1), def, Position::new(0, 0), 3)
    }

    #[test]
    fn slots_are_ordered_offensive_defensive_general() {
        let creature = knight();
        let kinds: Vec<_> = creature.inventory().iter().map(ItemSlot::kind).collect();
        assert_eq!(
            kinds,
            vec![SlotKind::Offensive, SlotKind::Defensive, SlotKind::General]
        );
        assert_eq!(creature.current_hp, 12);
    }

    #[test]
    fn pickup_prefers_matching_slots() {
        let mut creature = knight();
        assert_eq!(creature.pickup(item("sword", ItemCategory::Weapon)), Ok(0));
        assert_eq!(creature.pickup(item("mail", ItemCategory::Armour)), Ok(1));
        assert_eq!(creature.pickup(item("axe", ItemCategory::Weapon)), Ok(2));
        assert!(matches!(
            creature.pickup(item("key", ItemCategory::Key)),
            Err(InventoryError::Full { .. })
        ));
        assert_eq!(creature.weapon_bonus(), 3);
        assert_eq!(creature.armour_bonus(), 2);
    }

    #[test]
    fn swap_refuses_slots_that_reject_the_item() {
        let mut creature = knight();
        let _ = creature.pickup(item("key", ItemCategory::Key));
        assert!(matches!(
            creature.swap_slots(2, 0),
            Err(InventoryError::Rejected { index: 0, .. })
        ));
        assert_eq!(creature.swap_slots(2, 5), Err(InventoryError::NoSuchSlot { index: 5 }));
    }

    #[test]
    fn removing_items_by_kind_empties_one_slot() {
        let mut creature = knight();
        let _ = creature.pickup(item("key", ItemCategory::Key));
        assert!(creature.has_item("key"));
        assert!(creature.remove_item("key"));
        assert!(!creature.has_item("key"));
        assert!(!creature.remove_item("key"));
    }

    #[test]
    fn description_zone_bounds_are_half_open() {
        let zone = DescriptionZone {
            origin: Position::new(2, 2),
            width: 2,
            height: 1,
            text: "dust".to_owned(),
            is_read: false,
        };
        assert!(zone.contains(Position::new(3, 2)));
        assert!(!zone.contains(Position::new(4, 2)));
        assert!(!zone.contains(Position::new(2, 3)));
    }
}
