#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for the Spirit Crypt.
//!
//! A [`Level`] owns the tile grid, the per-cell memory overlay, and every
//! furniture, creature and item instance placed on it. Systems mutate levels
//! through the methods defined here and in the [`activation`] and
//! [`visibility`] modules; presenters read them through [`query`].

use std::rc::Rc;

use spirit_crypt_core::{
    CreatureDef, CreatureId, GridError, ItemDef, ItemId, Position, TileDef, TileId,
};
use tracing::warn;

pub mod activation;
mod catalog;
mod dungeon;
mod entities;
mod messages;
mod properties;
pub mod visibility;

pub use activation::{PressureRule, MAX_TRIGGER_DEPTH, MAX_TRIGGER_STEPS};
pub use catalog::Catalog;
pub use dungeon::Dungeon;
pub use entities::{
    Creature, DescriptionZone, InventoryError, Item, ItemSlot, PlacedFurniture,
};
pub use messages::{LogLine, MessageLog, MessageTone};
pub use visibility::CellMemory;

/// A single depth of the dungeon.
#[derive(Debug)]
pub struct Level {
    width: i32,
    height: i32,
    depth: u32,
    tiles: Vec<TileId>,
    memory: Vec<CellMemory>,
    furnitures: Vec<PlacedFurniture>,
    creatures: Vec<Creature>,
    items: Vec<Item>,
    descriptions: Vec<DescriptionZone>,
    catalog: Rc<Catalog>,
    next_creature_id: u32,
    next_item_id: u32,
    fov_pass: u32,
}

impl Level {
    /// Creates a level filled with a single tile kind.
    #[must_use]
    pub fn new(width: i32, height: i32, depth: u32, fill: TileId, catalog: Rc<Catalog>) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let cell_count = usize::try_from(width * height).unwrap_or(0);

        Self {
            width,
            height,
            depth,
            tiles: vec![fill; cell_count],
            memory: vec![CellMemory::default(); cell_count],
            furnitures: Vec::new(),
            creatures: Vec::new(),
            items: Vec::new(),
            descriptions: Vec::new(),
            catalog,
            next_creature_id: 0,
            next_item_id: 0,
            fov_pass: 0,
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// One-based depth of the level within its dungeon.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Definition tables the level resolves kinds against.
    #[must_use]
    pub fn catalog(&self) -> &Rc<Catalog> {
        &self.catalog
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn is_in_bounds(&self, position: Position) -> bool {
        position.x() >= 0
            && position.y() >= 0
            && position.x() < self.width
            && position.y() < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.is_in_bounds(position) {
            return None;
        }
        usize::try_from(position.y() * self.width + position.x()).ok()
    }

    fn out_of_bounds(&self, position: Position) -> GridError {
        let error = GridError::OutOfBounds {
            x: position.x(),
            y: position.y(),
            width: self.width,
            height: self.height,
        };
        warn!(%error, "grid_access_out_of_bounds");
        error
    }

    /// Tile id stored at the cell.
    pub fn tile_id(&self, position: Position) -> Result<TileId, GridError> {
        self.index(position)
            .map(|index| self.tiles[index])
            .ok_or_else(|| self.out_of_bounds(position))
    }

    /// Replaces the tile id stored at the cell.
    pub fn set_tile_id(&mut self, position: Position, tile: TileId) -> Result<(), GridError> {
        let index = self
            .index(position)
            .ok_or_else(|| self.out_of_bounds(position))?;
        self.tiles[index] = tile;
        Ok(())
    }

    /// Tile definition at the cell; cells outside the grid read as void.
    #[must_use]
    pub fn tile_def_at(&self, position: Position) -> &TileDef {
        match self.index(position) {
            Some(index) => self.catalog.tile_or_void(self.tiles[index]),
            None => self.catalog.void_tile(),
        }
    }

    /// Furniture pieces at the cell, in draw order.
    pub fn furniture_at(&self, position: Position) -> impl Iterator<Item = &PlacedFurniture> {
        self.furnitures
            .iter()
            .filter(move |furniture| furniture.position == position)
    }

    /// Indices of the furniture pieces at the cell, in draw order.
    #[must_use]
    pub fn furniture_indices_at(&self, position: Position) -> Vec<usize> {
        self.furnitures
            .iter()
            .enumerate()
            .filter(|(_, furniture)| furniture.position == position)
            .map(|(index, _)| index)
            .collect()
    }

    /// Every furniture piece, in draw order.
    #[must_use]
    pub fn furnitures(&self) -> &[PlacedFurniture] {
        &self.furnitures
    }

    /// Living creature standing at the cell.
    #[must_use]
    pub fn creature_at(&self, position: Position) -> Option<&Creature> {
        self.creatures
            .iter()
            .find(|creature| creature.position() == position && !creature.is_dead)
    }

    /// Every creature, including the dead awaiting cleanup.
    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    /// Items lying on the cell.
    pub fn items_at(&self, position: Position) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(move |item| item.position() == position)
    }

    /// Every item lying on the floor.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Description zones stamped into the level.
    #[must_use]
    pub fn descriptions(&self) -> &[DescriptionZone] {
        &self.descriptions
    }

    /// Sum of furniture bulk at the cell.
    #[must_use]
    pub fn total_furniture_bulk_at(&self, position: Position) -> i32 {
        self.furniture_at(position)
            .map(|furniture| furniture.def.bulk)
            .sum()
    }

    /// Furniture bulk plus the bulk of the creature standing at the cell.
    #[must_use]
    pub fn occupied_bulk_at(&self, position: Position) -> i32 {
        let creature_bulk = self
            .creature_at(position)
            .map_or(0, |creature| creature.def().bulk);
        self.total_furniture_bulk_at(position) + creature_bulk
    }

    /// Reports whether an entity of the given bulk fits beside the cell's furniture.
    ///
    /// Creatures already standing at the cell are not counted; callers check
    /// for occupants separately since entering an occupied cell is an attack.
    #[must_use]
    pub fn can_hold(&self, bulk: i32, position: Position) -> bool {
        self.is_in_bounds(position)
            && self.total_furniture_bulk_at(position) + bulk <= self.tile_def_at(position).max_bulk
    }

    /// Light passes only if the tile and every furniture piece are transparent.
    #[must_use]
    pub fn is_transparent(&self, position: Position) -> bool {
        self.is_in_bounds(position)
            && self.tile_def_at(position).transparent
            && self.furniture_at(position).all(|furniture| furniture.def.transparent)
    }

    /// Damage dealt to walking creatures entering the cell.
    #[must_use]
    pub fn tile_damage_at(&self, position: Position) -> i32 {
        let furniture_damage: i32 = self
            .furniture_at(position)
            .map(|furniture| furniture.def.damage_per_turn)
            .sum();
        self.tile_def_at(position).damage_per_turn + furniture_damage
    }

    /// Inserts a furniture piece after every piece with an equal or lower draw order.
    pub fn insert_furniture(&mut self, furniture: PlacedFurniture) -> usize {
        let index = self
            .furnitures
            .iter()
            .position(|existing| existing.def.draw_order > furniture.def.draw_order)
            .unwrap_or(self.furnitures.len());
        self.furnitures.insert(index, furniture);
        index
    }

    /// Moves a furniture piece to another cell without any capacity check.
    pub fn move_furniture(&mut self, index: usize, to: Position) {
        if let Some(furniture) = self.furnitures.get_mut(index) {
            furniture.position = to;
        }
    }

    /// Restores draw order after definitions were swapped.
    pub(crate) fn resort_furniture(&mut self) {
        self.furnitures.sort_by_key(|furniture| furniture.def.draw_order);
    }

    /// Spawns a fresh creature, filling its inventory from the definition.
    ///
    /// Starting items that cannot be resolved or do not fit are skipped.
    pub fn spawn_creature(
        &mut self,
        def: Rc<CreatureDef>,
        position: Position,
        willpower: Option<i32>,
    ) -> CreatureId {
        let id = self.allocate_creature_id();
        let willpower = willpower.unwrap_or(def.willpower);
        let mut creature = Creature::new(id, Rc::clone(&def), position, willpower);

        for kind in &def.starting_inventory {
            match self.catalog.item(kind) {
                Ok(item) => {
                    if let Err(error) = creature.pickup(item) {
                        warn!(creature = %def.kind, %error, "starting_item_skipped");
                    }
                }
                Err(error) => warn!(creature = %def.kind, %error, "starting_item_skipped"),
            }
        }

        self.creatures.push(creature);
        id
    }

    /// Takes ownership of a creature that left another level.
    pub fn adopt_creature(&mut self, mut creature: Creature, position: Position) -> CreatureId {
        let id = self.allocate_creature_id();
        creature.set_id(id);
        creature.set_position(position);
        self.creatures.push(creature);
        id
    }

    fn allocate_creature_id(&mut self) -> CreatureId {
        let id = CreatureId::new(self.next_creature_id);
        self.next_creature_id = self.next_creature_id.wrapping_add(1);
        id
    }

    /// Creature with the provided identifier.
    #[must_use]
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|creature| creature.id() == id)
    }

    /// Mutable creature with the provided identifier.
    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|creature| creature.id() == id)
    }

    /// Removes a creature from the level and hands it to the caller.
    pub fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let index = self.creatures.iter().position(|creature| creature.id() == id)?;
        Some(self.creatures.remove(index))
    }

    /// Moves a creature to another cell without any capacity check.
    pub fn relocate_creature(&mut self, id: CreatureId, to: Position) {
        if let Some(creature) = self.creature_mut(id) {
            creature.set_position(to);
        }
    }

    /// Identifiers of every creature, in insertion order.
    #[must_use]
    pub fn creature_ids(&self) -> Vec<CreatureId> {
        self.creatures.iter().map(Creature::id).collect()
    }

    /// Drops creatures whose death has been handled.
    pub fn cleanup_dead_creatures(&mut self) {
        self.creatures.retain(|creature| !creature.is_dead);
    }

    /// Places an item on the floor.
    pub fn add_item(&mut self, def: Rc<ItemDef>, position: Position) -> ItemId {
        let id = ItemId::new(self.next_item_id);
        self.next_item_id = self.next_item_id.wrapping_add(1);
        self.items.push(Item::new(id, def, position));
        id
    }

    /// Item with the provided identifier.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Removes an item from the floor.
    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Registers a description zone.
    pub fn add_description(&mut self, zone: DescriptionZone) {
        self.descriptions.push(zone);
    }

    /// Marks every unread zone covering the cell as read and returns their texts.
    pub fn take_unread_descriptions(&mut self, position: Position) -> Vec<String> {
        self.descriptions
            .iter_mut()
            .filter(|zone| !zone.is_read && zone.contains(position))
            .map(|zone| {
                zone.is_read = true;
                zone.text.clone()
            })
            .collect()
    }
}

/// Read-only projections consumed by presenters.
pub mod query {
    use spirit_crypt_core::{Position, TileId, Visibility};

    use crate::Level;

    /// What a presenter should draw for a single cell.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CellView {
        /// Knowledge state of the cell.
        pub visibility: Visibility,
        /// Tile to draw; the remembered tile for cells out of sight.
        pub tile: Option<TileId>,
        /// Icon of the first furniture piece at the cell.
        pub furniture_icon: Option<u32>,
        /// Kind of the creature standing in the cell, if currently visible.
        pub creature_kind: Option<String>,
        /// Whether at least one item lies in the cell, if currently visible.
        pub has_items: bool,
    }

    /// Projects the cell as the player currently knows it.
    #[must_use]
    pub fn cell_view(level: &Level, position: Position) -> CellView {
        let Some(memory) = level.memory_at(position) else {
            return CellView {
                visibility: Visibility::Unknown,
                tile: None,
                furniture_icon: None,
                creature_kind: None,
                has_items: false,
            };
        };

        match memory.visibility() {
            Visibility::Unknown => CellView {
                visibility: Visibility::Unknown,
                tile: None,
                furniture_icon: None,
                creature_kind: None,
                has_items: false,
            },
            Visibility::Remembered => CellView {
                visibility: Visibility::Remembered,
                tile: Some(memory.remembered_tile()),
                furniture_icon: memory.remembered_furniture_icon(),
                creature_kind: None,
                has_items: false,
            },
            Visibility::Visible => CellView {
                visibility: Visibility::Visible,
                tile: level.tile_id(position).ok(),
                furniture_icon: level
                    .furniture_at(position)
                    .next()
                    .map(|furniture| furniture.def.icon_id),
                creature_kind: level
                    .creature_at(position)
                    .map(|creature| creature.def().kind.clone()),
                has_items: level.items_at(position).next().is_some(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use spirit_crypt_core::FurnitureDef;

    use super::*;

    fn catalog() -> Rc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.insert_tile(TileDef {
            id: TileId::new(0),
            kind: "floor".to_owned(),
            max_bulk: 20,
            transparent: true,
            ..TileDef::default()
        });
        catalog.insert_creature(CreatureDef {
            kind: "rat".to_owned(),
            bulk: 3,
            ..CreatureDef::default()
        });
        Rc::new(catalog)
    }

    fn furniture(kind: &str, bulk: i32, draw_order: i32, at: Position) -> PlacedFurniture {
        let template = FurnitureDef {
            kind: kind.to_owned(),
            bulk,
            draw_order,
            ..FurnitureDef::default()
        };
        PlacedFurniture::from_definition(&template, at, Position::new(0, 0), &BTreeMap::new())
    }

    #[test]
    fn out_of_bounds_access_reports_an_error() {
        let mut level = Level::new(4, 3, 1, TileId::new(0), catalog());
        let outside = Position::new(4, 0);
        assert_eq!(
            level.tile_id(outside),
            Err(GridError::OutOfBounds {
                x: 4,
                y: 0,
                width: 4,
                height: 3
            })
        );
        assert!(level.set_tile_id(Position::new(-1, 1), TileId::new(0)).is_err());
        assert_eq!(level.tile_def_at(outside).max_bulk, 0);
        assert!(!level.is_transparent(outside));
    }

    #[test]
    fn furniture_insertion_keeps_draw_order_stable() {
        let mut level = Level::new(4, 4, 1, TileId::new(0), catalog());
        let at = Position::new(1, 1);
        let _ = level.insert_furniture(furniture("rug", 0, 1, at));
        let _ = level.insert_furniture(furniture("table", 5, 3, at));
        let _ = level.insert_furniture(furniture("candle", 0, 1, at));

        let kinds: Vec<_> = level.furniture_at(at).map(|f| f.def.kind.as_str()).collect();
        assert_eq!(kinds, vec!["rug", "candle", "table"]);
        assert_eq!(level.total_furniture_bulk_at(at), 5);
    }

    #[test]
    fn occupied_bulk_counts_the_standing_creature_once() {
        let mut level = Level::new(4, 4, 1, TileId::new(0), catalog());
        let at = Position::new(2, 2);
        let _ = level.insert_furniture(furniture("crate", 6, 0, at));
        let rat = level.catalog().creature("rat").expect("rat");
        let _ = level.spawn_creature(rat, at, None);

        assert_eq!(level.occupied_bulk_at(at), 9);
        assert!(level.can_hold(14, at));
        assert!(!level.can_hold(15, at));
    }

    #[test]
    fn opaque_furniture_blocks_sight_on_open_tiles() {
        let mut level = Level::new(4, 4, 1, TileId::new(0), catalog());
        let at = Position::new(1, 2);
        assert!(level.is_transparent(at));
        let mut wall = furniture("bookcase", 10, 0, at);
        wall.def.transparent = false;
        let _ = level.insert_furniture(wall);
        assert!(!level.is_transparent(at));
    }

    #[test]
    fn description_zones_are_revealed_once() {
        let mut level = Level::new(6, 6, 1, TileId::new(0), catalog());
        level.add_description(DescriptionZone {
            origin: Position::new(1, 1),
            width: 2,
            height: 2,
            text: "old bones".to_owned(),
            is_read: false,
        });
        assert!(level.take_unread_descriptions(Position::new(0, 0)).is_empty());
        assert_eq!(
            level.take_unread_descriptions(Position::new(2, 2)),
            vec!["old bones".to_owned()]
        );
        assert!(level.take_unread_descriptions(Position::new(2, 2)).is_empty());
    }

    #[test]
    fn dead_creatures_are_hidden_then_purged() {
        let mut level = Level::new(4, 4, 1, TileId::new(0), catalog());
        let rat = level.catalog().creature("rat").expect("rat");
        let at = Position::new(1, 1);
        let id = level.spawn_creature(rat, at, Some(0));
        assert_eq!(level.creature(id).map(|c| c.willpower), Some(0));

        level.creature_mut(id).expect("rat").is_dead = true;
        assert!(level.creature_at(at).is_none());
        assert_eq!(level.creatures().len(), 1);
        level.cleanup_dead_creatures();
        assert!(level.creatures().is_empty());
    }
}
