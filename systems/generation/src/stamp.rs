//! Copies room fragment layers onto a level.

use std::rc::Rc;

use rand::Rng;
use spirit_crypt_core::{
    FragmentObject, Position, RoomFragment, SpawnKind, TileId, TILE_PIXELS,
};
use spirit_crypt_world::{DescriptionZone, Level, PlacedFurniture};
use tracing::warn;

/// Cell of an editor object anchored at its bottom-left corner.
fn object_cell(origin: Position, x_px: i32, y_px: i32) -> Position {
    origin.translate(x_px / TILE_PIXELS, y_px / TILE_PIXELS - 1)
}

/// Stamps every layer of `fragment` with its top-left tile at `origin`.
///
/// Unknown kinds are reported and skipped so a single malformed fragment
/// cannot spoil an otherwise playable level.
pub(crate) fn stamp_room<R: Rng + ?Sized>(
    level: &mut Level,
    fragment: &RoomFragment,
    origin: Position,
    rng: &mut R,
) {
    stamp_tiles(level, fragment, origin);

    for zone in &fragment.descriptions {
        level.add_description(DescriptionZone {
            origin: origin.translate(zone.x_px / TILE_PIXELS, zone.y_px / TILE_PIXELS),
            width: zone.width_px / TILE_PIXELS,
            height: zone.height_px / TILE_PIXELS,
            text: zone.text.clone(),
            is_read: false,
        });
    }

    for object in &fragment.furniture {
        stamp_furniture(level, fragment, object, origin, rng);
    }

    for spawn in &fragment.spawns {
        if rng.gen::<f32>() >= spawn.chance {
            continue;
        }
        let cell = object_cell(origin, spawn.x_px, spawn.y_px);
        let catalog = Rc::clone(level.catalog());
        match spawn.spawns {
            SpawnKind::Creature => match catalog.creature(&spawn.kind) {
                Ok(def) => {
                    let _ = level.spawn_creature(def, cell, spawn.willpower);
                }
                Err(error) => warn!(room = %fragment.name, %error, "spawn_skipped"),
            },
            SpawnKind::Item => match catalog.item(&spawn.kind) {
                Ok(def) => {
                    let _ = level.add_item(def, cell);
                }
                Err(error) => warn!(room = %fragment.name, %error, "spawn_skipped"),
            },
        }
    }
}

fn stamp_tiles(level: &mut Level, fragment: &RoomFragment, origin: Position) {
    for y in 0..fragment.tile_height() {
        for x in 0..fragment.tile_width() {
            let gid = fragment.tile_gid(x, y).unwrap_or(0);
            if gid == 0 {
                continue;
            }
            // Out of range cells are reported by the level itself.
            let _ = level.set_tile_id(origin.translate(x, y), TileId::new(gid - 1));
        }
    }
}

fn stamp_furniture<R: Rng + ?Sized>(
    level: &mut Level,
    fragment: &RoomFragment,
    object: &FragmentObject,
    origin: Position,
    rng: &mut R,
) {
    let catalog = Rc::clone(level.catalog());

    let kind = if object.kind.is_empty() {
        let Some(gid) = object.gid.filter(|gid| *gid > 0) else {
            warn!(room = %fragment.name, "furniture_without_kind_skipped");
            return;
        };
        match catalog.tile(TileId::new(gid - 1)) {
            Ok(tile) => tile.kind.clone(),
            Err(error) => {
                warn!(room = %fragment.name, %error, "furniture_skipped");
                return;
            }
        }
    } else {
        object.kind.clone()
    };

    let template = match catalog.furniture(&kind) {
        Ok(template) => template,
        Err(error) => {
            warn!(room = %fragment.name, %error, "furniture_skipped");
            return;
        }
    };

    let cell = object_cell(origin, object.x_px, object.y_px);
    let furniture =
        PlacedFurniture::from_definition(&template, cell, origin, &object.properties);

    for entry in &furniture.def.loot_table {
        if rng.gen::<f32>() >= entry.chance {
            continue;
        }
        match catalog.item(&entry.item_kind) {
            Ok(item) => {
                let _ = level.add_item(item, cell);
            }
            Err(error) => warn!(room = %fragment.name, %error, "loot_skipped"),
        }
    }

    let _ = level.insert_furniture(furniture);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use spirit_crypt_core::{
        DescriptionObject, FurnitureDef, ItemDef, LootEntry, SpawnObject, TileDef,
    };
    use spirit_crypt_world::Catalog;

    use super::*;

    fn catalog() -> Rc<Catalog> {
        let mut catalog = Catalog::new();
        for (id, kind, max_bulk) in [(0, "floor", 20), (1, "wall", 0), (4, "chest", 20)] {
            catalog.insert_tile(TileDef {
                id: TileId::new(id),
                kind: kind.to_owned(),
                max_bulk,
                transparent: max_bulk > 0,
                ..TileDef::default()
            });
        }
        catalog.insert_furniture(FurnitureDef {
            kind: "chest".to_owned(),
            bulk: 5,
            loot_table: vec![LootEntry {
                item_kind: "coin".to_owned(),
                chance: 1.0,
            }],
            ..FurnitureDef::default()
        });
        catalog.insert_item(ItemDef {
            kind: "coin".to_owned(),
            ..ItemDef::default()
        });
        Rc::new(catalog)
    }

    fn fragment() -> RoomFragment {
        let mut properties = BTreeMap::new();
        let _ = properties.insert("activationtarget".to_owned(), "[[1, 0]]".to_owned());
        RoomFragment {
            name: "vault".to_owned(),
            width_px: 48,
            height_px: 32,
            tiles: vec![2, 1, 0, 1, 1, 2],
            furniture: vec![
                FragmentObject {
                    kind: String::new(),
                    gid: Some(5),
                    x_px: 16,
                    y_px: 32,
                    properties,
                },
                FragmentObject {
                    kind: "throne".to_owned(),
                    x_px: 0,
                    y_px: 16,
                    ..FragmentObject::default()
                },
            ],
            descriptions: vec![DescriptionObject {
                x_px: 0,
                y_px: 16,
                width_px: 48,
                height_px: 16,
                text: "a cold vault".to_owned(),
            }],
            spawns: vec![SpawnObject {
                kind: "coin".to_owned(),
                spawns: SpawnKind::Item,
                x_px: 32,
                y_px: 16,
                chance: 0.0,
                willpower: None,
            }],
        }
    }

    #[test]
    fn tiles_are_shifted_by_one_and_blanks_skipped() {
        let mut level = Level::new(6, 6, 1, TileId::new(1), catalog());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        stamp_room(&mut level, &fragment(), Position::new(1, 1), &mut rng);

        assert_eq!(level.tile_id(Position::new(1, 1)), Ok(TileId::new(1)));
        assert_eq!(level.tile_id(Position::new(2, 1)), Ok(TileId::new(0)));
        assert_eq!(level.tile_id(Position::new(3, 1)), Ok(TileId::new(1)));
        assert_eq!(level.tile_id(Position::new(3, 2)), Ok(TileId::new(1)));
    }

    #[test]
    fn furniture_kind_is_inferred_from_the_editor_tile() {
        let mut level = Level::new(6, 6, 1, TileId::new(1), catalog());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        stamp_room(&mut level, &fragment(), Position::new(1, 1), &mut rng);

        let chest: Vec<_> = level.furniture_at(Position::new(2, 2)).collect();
        assert_eq!(chest.len(), 1);
        assert_eq!(chest[0].def.kind, "chest");
        assert_eq!(chest[0].room_origin, Position::new(1, 1));
        assert_eq!(chest[0].def.activation_targets.len(), 1);
        assert_eq!(level.items_at(Position::new(2, 2)).count(), 1);
        assert_eq!(level.furnitures().len(), 1, "unknown throne is skipped");
    }

    #[test]
    fn descriptions_use_their_own_rows_and_spawns_roll_chance() {
        let mut level = Level::new(6, 6, 1, TileId::new(1), catalog());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        stamp_room(&mut level, &fragment(), Position::new(1, 1), &mut rng);

        let zone = &level.descriptions()[0];
        assert_eq!(zone.origin, Position::new(1, 2));
        assert_eq!((zone.width, zone.height), (3, 1));
        assert_eq!(level.items_at(Position::new(3, 1)).count(), 0);
    }
}
