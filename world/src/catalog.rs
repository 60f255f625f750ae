//! Lookup tables for every definition kind.

use std::{collections::BTreeMap, rc::Rc};

use spirit_crypt_core::{
    CreatureDef, DataError, DefinitionTable, FurnitureDef, ItemDef, TileDef, TileId,
};
use tracing::debug;

/// Immutable definition tables shared by every level of a dungeon.
///
/// Creature and item instances hold `Rc` handles into the catalog. Furniture
/// instances clone their definition so they can change state independently.
#[derive(Debug, Default)]
pub struct Catalog {
    tiles: BTreeMap<TileId, Rc<TileDef>>,
    creatures: BTreeMap<String, Rc<CreatureDef>>,
    items: BTreeMap<String, Rc<ItemDef>>,
    furniture: BTreeMap<String, Rc<FurnitureDef>>,
    void: TileDef,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from fully loaded definition tables.
    #[must_use]
    pub fn from_tables(
        tiles: Vec<TileDef>,
        creatures: Vec<CreatureDef>,
        items: Vec<ItemDef>,
        furniture: Vec<FurnitureDef>,
    ) -> Self {
        let mut catalog = Self::new();
        tiles.into_iter().for_each(|def| catalog.insert_tile(def));
        creatures
            .into_iter()
            .for_each(|def| catalog.insert_creature(def));
        items.into_iter().for_each(|def| catalog.insert_item(def));
        furniture
            .into_iter()
            .for_each(|def| catalog.insert_furniture(def));
        catalog
    }

    /// Registers a tile definition, replacing any previous entry with the same id.
    pub fn insert_tile(&mut self, def: TileDef) {
        let _ = self.tiles.insert(def.id, Rc::new(def));
    }

    /// Registers a creature definition under its kind.
    pub fn insert_creature(&mut self, def: CreatureDef) {
        let _ = self.creatures.insert(def.kind.clone(), Rc::new(def));
    }

    /// Registers an item definition under its kind.
    pub fn insert_item(&mut self, def: ItemDef) {
        let _ = self.items.insert(def.kind.clone(), Rc::new(def));
    }

    /// Registers a furniture definition under its kind.
    pub fn insert_furniture(&mut self, def: FurnitureDef) {
        let _ = self.furniture.insert(def.kind.clone(), Rc::new(def));
    }

    /// Looks up a tile definition by id.
    pub fn tile(&self, id: TileId) -> Result<&Rc<TileDef>, DataError> {
        self.tiles
            .get(&id)
            .ok_or(DataError::UnknownTile { id: id.get() })
    }

    /// Looks up a tile definition by id, substituting the void tile when missing.
    #[must_use]
    pub fn tile_or_void(&self, id: TileId) -> &TileDef {
        match self.tiles.get(&id) {
            Some(def) => def,
            None => {
                debug!(tile = id.get(), "unknown_tile_treated_as_void");
                &self.void
            }
        }
    }

    /// The tile substituted for cells outside a level.
    #[must_use]
    pub fn void_tile(&self) -> &TileDef {
        &self.void
    }

    /// Looks up a creature definition by kind.
    pub fn creature(&self, kind: &str) -> Result<Rc<CreatureDef>, DataError> {
        self.creatures
            .get(kind)
            .cloned()
            .ok_or_else(|| unknown(DefinitionTable::Creature, kind))
    }

    /// Looks up an item definition by kind.
    pub fn item(&self, kind: &str) -> Result<Rc<ItemDef>, DataError> {
        self.items
            .get(kind)
            .cloned()
            .ok_or_else(|| unknown(DefinitionTable::Item, kind))
    }

    /// Looks up a furniture template by kind.
    pub fn furniture(&self, kind: &str) -> Result<Rc<FurnitureDef>, DataError> {
        self.furniture
            .get(kind)
            .cloned()
            .ok_or_else(|| unknown(DefinitionTable::Furniture, kind))
    }

    /// Display name of an item kind, falling back to the kind itself.
    #[must_use]
    pub fn item_name<'a>(&'a self, kind: &'a str) -> &'a str {
        self.items
            .get(kind)
            .map_or(kind, |def| def.name.as_str())
    }
}

fn unknown(table: DefinitionTable, kind: &str) -> DataError {
    DataError::UnknownKind {
        table,
        kind: kind.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tiles_resolve_to_void() {
        let catalog = Catalog::new();
        let tile = catalog.tile_or_void(TileId::new(3));
        assert_eq!(tile.max_bulk, 0);
        assert!(matches!(
            catalog.tile(TileId::new(3)),
            Err(DataError::UnknownTile { id: 3 })
        ));
    }

    #[test]
    fn lookups_report_the_table_and_kind() {
        let catalog = Catalog::new();
        let error = catalog.furniture("lever").expect_err("missing");
        assert_eq!(
            error,
            DataError::UnknownKind {
                table: DefinitionTable::Furniture,
                kind: "lever".to_owned(),
            }
        );
    }

    #[test]
    fn item_names_fall_back_to_kind() {
        let mut catalog = Catalog::new();
        catalog.insert_item(ItemDef {
            kind: "key".to_owned(),
            name: "rusty key".to_owned(),
            ..ItemDef::default()
        });
        assert_eq!(catalog.item_name("key"), "rusty key");
        assert_eq!(catalog.item_name("gem"), "gem");
    }
}
