//! Built-in content used when no external data is supplied.
//!
//! Rooms are sketched as character grids: `#` is wall, `~` is lava and every
//! other character stands on floor. Letters place furniture and spawns; see
//! [`Sketch::build`] for the legend.

use std::{collections::BTreeMap, rc::Rc};

use spirit_crypt_core::{
    CreatureDef, DescriptionObject, FragmentObject, FurnitureDef, ItemCategory, ItemDef,
    LootEntry, RoomFragment, SpawnKind, SpawnObject, TileDef, TileId, ROOM_SPAN, TILE_PIXELS,
};
use spirit_crypt_system_generation::{RoomLibrary, RoomPool};
use spirit_crypt_world::Catalog;

const FLOOR_GID: u32 = 1;
const WALL_GID: u32 = 2;
const LAVA_GID: u32 = 3;

/// Glyph of a tile in the level dump.
pub(crate) fn tile_glyph(tile: TileId) -> char {
    match tile.get() {
        0 => '.',
        1 => '#',
        2 => '~',
        _ => '?',
    }
}

/// Glyph of a furniture icon in the level dump.
pub(crate) fn furniture_glyph(icon: u32) -> char {
    match icon {
        1 => '<',
        2 => '>',
        3 | 5 => '+',
        4 => '\'',
        6 => '^',
        7 => '_',
        8 => '/',
        9 => '\\',
        10 => '0',
        11 => '&',
        12 => '%',
        _ => '?',
    }
}

/// Definition tables for the demo dungeon.
pub(crate) fn catalog() -> Catalog {
    let tiles = vec![
        TileDef {
            id: TileId::new(0),
            kind: "floor".to_owned(),
            name: "stone floor".to_owned(),
            description: "Worn flagstones.".to_owned(),
            max_bulk: 20,
            transparent: true,
            ..TileDef::default()
        },
        TileDef {
            id: TileId::new(1),
            kind: "wall".to_owned(),
            name: "wall".to_owned(),
            description: "Solid rock.".to_owned(),
            ..TileDef::default()
        },
        TileDef {
            id: TileId::new(2),
            kind: "lava".to_owned(),
            name: "lava".to_owned(),
            description: "A pool of molten rock.".to_owned(),
            max_bulk: 20,
            damage_per_turn: 3,
            transparent: true,
            ..TileDef::default()
        },
    ];

    let creatures = vec![
        CreatureDef {
            id: 0,
            max_hp: 10,
            strength: 3,
            bulk: 3,
            willpower: 2,
            inventory_slot_count: 2,
            has_offensive_slot: true,
            has_defensive_slot: true,
            ..creature("ghoul", "undead", "A hunched ghoul, hungry for the living.")
        },
        CreatureDef {
            id: 1,
            max_hp: 8,
            strength: 3,
            defence: 1,
            bulk: 3,
            willpower: 3,
            inventory_slot_count: 1,
            has_offensive_slot: true,
            ..creature("skeleton", "undead", "Bones held together by old magic.")
        },
        CreatureDef {
            id: 2,
            max_hp: 3,
            strength: 1,
            speed: 8,
            inventory_slot_count: 1,
            starting_inventory: vec!["key".to_owned()],
            ..creature("rat", "vermin", "A fat rat with something shiny in its mouth.")
        },
        CreatureDef {
            id: 3,
            max_hp: 2,
            strength: 1,
            speed: 5,
            flying: true,
            ..creature("bat", "vermin", "A bat flitting through the dark.")
        },
        CreatureDef {
            id: 4,
            max_hp: 25,
            strength: 6,
            defence: 1,
            speed: 14,
            bulk: 9,
            willpower: 4,
            inventory_slot_count: 2,
            has_offensive_slot: true,
            has_defensive_slot: true,
            ..creature("ogre", "giant", "A lumbering ogre. Doors are no obstacle to it.")
        },
        CreatureDef {
            id: 5,
            max_hp: 40,
            strength: 8,
            defence: 2,
            bulk: 5,
            willpower: 12,
            ..creature("vitalius", "lich", "Vitalius, master of the crypt.")
        },
    ];

    let items = vec![
        item(0, "key", "rusty key", ItemCategory::Key, "It might fit a lock."),
        item(1, "potion", "healing potion", ItemCategory::Potion, "A red, warm liquid."),
        item(2, "orb", "spirit orb", ItemCategory::Orb, "It hums with trapped souls."),
        ItemDef {
            attack_bonus: 3,
            ..item(3, "sword", "sword", ItemCategory::Weapon, "A notched blade.")
        },
        ItemDef {
            defence_bonus: 2,
            ..item(4, "armour", "leather armour", ItemCategory::Armour, "Stiff, but it holds.")
        },
    ];

    let furniture = vec![
        FurnitureDef {
            icon_id: 1,
            ..furniture("stairsup", "stairs up", "Stairs leading up.")
        },
        FurnitureDef {
            icon_id: 2,
            ..furniture("stairsdown", "stairs down", "Stairs leading deeper.")
        },
        FurnitureDef {
            icon_id: 3,
            bulk: 20,
            transparent: false,
            activation_kind: Some("dooropen".to_owned()),
            user_activation_kind: Some("dooropen".to_owned()),
            ..furniture("door", "door", "A heavy wooden door.")
        },
        FurnitureDef {
            icon_id: 4,
            activation_kind: Some("door".to_owned()),
            user_activation_kind: Some("door".to_owned()),
            ..furniture("dooropen", "open door", "An open doorway.")
        },
        FurnitureDef {
            icon_id: 5,
            bulk: 20,
            transparent: false,
            user_activation_kind: Some("dooropen".to_owned()),
            user_activation_text: Some("The lock gives way.".to_owned()),
            required_item: Some("key".to_owned()),
            ..furniture("lockeddoor", "locked door", "An iron-bound door with a keyhole.")
        },
        FurnitureDef {
            icon_id: 6,
            ..furniture("pressureplate", "pressure plate", "A stone slab that gives slightly.")
        },
        FurnitureDef {
            icon_id: 7,
            ..furniture("pressureplatedown", "pressure plate", "The slab is pressed down.")
        },
        FurnitureDef {
            icon_id: 8,
            bulk: 2,
            user_activation_kind: Some("leverpulled".to_owned()),
            user_activation_text: Some("You pull the lever.".to_owned()),
            ..furniture("lever", "lever", "A rusted lever set in the floor.")
        },
        FurnitureDef {
            icon_id: 9,
            bulk: 2,
            user_activation_kind: Some("lever".to_owned()),
            user_activation_text: Some("You push the lever back.".to_owned()),
            ..furniture("leverpulled", "lever", "The lever has been pulled.")
        },
        FurnitureDef {
            icon_id: 10,
            bulk: 8,
            push_threshold: 3,
            draw_order: 1,
            ..furniture("crate", "crate", "A crate full of rubble.")
        },
        FurnitureDef {
            icon_id: 11,
            bulk: 5,
            loot_table: vec![
                LootEntry {
                    item_kind: "potion".to_owned(),
                    chance: 0.5,
                },
                LootEntry {
                    item_kind: "key".to_owned(),
                    chance: 0.2,
                },
            ],
            ..furniture("chest", "chest", "An old chest, its lid broken.")
        },
        FurnitureDef {
            icon_id: 12,
            ..furniture("bones", "pile of bones", "Someone did not make it out.")
        },
    ];

    Catalog::from_tables(tiles, creatures, items, furniture)
}

fn creature(kind: &str, category: &str, description: &str) -> CreatureDef {
    CreatureDef {
        kind: kind.to_owned(),
        name: kind.to_owned(),
        category: category.to_owned(),
        description: description.to_owned(),
        ..CreatureDef::default()
    }
}

fn item(id: u32, kind: &str, name: &str, category: ItemCategory, description: &str) -> ItemDef {
    ItemDef {
        id,
        kind: kind.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        category,
        ..ItemDef::default()
    }
}

fn furniture(kind: &str, name: &str, description: &str) -> FurnitureDef {
    FurnitureDef {
        kind: kind.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        ..FurnitureDef::default()
    }
}

/// Room fragments for the demo dungeon.
pub(crate) fn library() -> RoomLibrary {
    let base = vec![
        Sketch::walled("hall", 1).build(),
        Sketch::walled("pillars", 1)
            .put(3, 3, '#')
            .put(8, 3, '#')
            .put(3, 8, '#')
            .put(8, 8, '#')
            .build(),
        Sketch::walled("cistern", 1)
            .row(9, 2, "~~~")
            .row(2, 8, "~~")
            .build(),
    ];
    let puzzles = vec![plate_vault(), locked_archive()];
    let other = vec![
        Sketch::walled("armoury", 1)
            .row(2, 2, "s.a")
            .put(9, 2, 'H')
            .put(9, 9, 'r')
            .build(),
        Sketch::walled("shrine", 1)
            .put(6, 2, 'O')
            .put(3, 9, 'z')
            .describe("A forgotten shrine. Faint light pulses in a glass orb.")
            .build(),
    ];
    let kennel = Sketch::walled("kennel", 1)
        .put(3, 3, 'r')
        .put(8, 3, 'r')
        .put(3, 8, 'r')
        .build();
    let roost = Sketch::walled("roost", 1)
        .put(2, 2, 'b')
        .put(9, 9, 'b')
        .build();
    let ossuary = Sketch::walled("ossuary", 1)
        .put(3, 8, 'z')
        .put(8, 3, 'z')
        .put(9, 9, 'B')
        .build();
    let den = Sketch::walled("den", 1)
        .put(8, 8, 'o')
        .put(2, 9, 'B')
        .build();
    let barrow = Sketch::walled("barrow", 1)
        .put(3, 3, 'g')
        .put(8, 8, 'g')
        .put(9, 2, 'H')
        .build();

    let shallow = RoomPool {
        puzzles: puzzles.clone(),
        other: other.clone(),
        pregenerated: vec![Rc::clone(&kennel), Rc::clone(&roost), Rc::clone(&ossuary)],
        base: base.clone(),
    };
    let middle = RoomPool {
        pregenerated: vec![
            Rc::clone(&roost),
            Rc::clone(&ossuary),
            Rc::clone(&den),
            Rc::clone(&barrow),
        ],
        ..shallow.clone()
    };
    let deep = RoomPool {
        puzzles,
        other,
        pregenerated: vec![ossuary, den, barrow],
        base,
    };

    RoomLibrary {
        shallow,
        middle,
        deep,
        start: Some(
            Sketch::walled("crypt entrance", 1)
                .put(9, 3, 'g')
                .put(2, 2, 'p')
                .put(2, 9, 'B')
                .describe(
                    "Cold stone walls surround you. Somewhere below, the lich Vitalius waits.",
                )
                .build(),
        ),
        boss: Some(
            Sketch::walled("throne of vitalius", 2)
                .row(12, 10, "z.V.z")
                .put(3, 20, 'B')
                .put(20, 3, 'B')
                .describe("The air grows cold. Vitalius rises from his throne.")
                .build(),
        ),
    }
}

fn plate_vault() -> Rc<RoomFragment> {
    Sketch::walled("plate vault", 2)
        .row(9, 9, "######")
        .row(10, 9, "#.O..#")
        .row(11, 9, "#....#")
        .row(12, 9, "#..p.#")
        .row(13, 9, "#....#")
        .row(14, 9, "##d###")
        .row(19, 8, "P.C")
        .describe("Dust lies thick on a pressure plate before a sealed vault.")
        .build()
}

fn locked_archive() -> Rc<RoomFragment> {
    Sketch::walled("locked archive", 2)
        .row(9, 9, "######")
        .row(10, 9, "#.O..#")
        .row(11, 9, "#..s.#")
        .row(12, 9, "#....#")
        .row(13, 9, "#....#")
        .row(14, 9, "##L###")
        .row(2, 9, "######")
        .row(3, 9, "#.a..#")
        .row(4, 9, "##d###")
        .put(3, 20, 'T')
        .put(20, 20, 'r')
        .build()
}

/// A room drawn as a character grid before it becomes a fragment.
struct Sketch {
    name: &'static str,
    cells: Vec<Vec<char>>,
    descriptions: Vec<DescriptionObject>,
}

impl Sketch {
    /// Floor surrounded by wall, open in the middle of every slot edge.
    fn walled(name: &'static str, slots: i32) -> Self {
        let span = slots * ROOM_SPAN;
        let opening = |i: i32| matches!(i % ROOM_SPAN, 5 | 6);
        let cells = (0..span)
            .map(|y| {
                (0..span)
                    .map(|x| {
                        let edge_x = x == 0 || x == span - 1;
                        let edge_y = y == 0 || y == span - 1;
                        let closed = (edge_x && !opening(y)) || (edge_y && !opening(x));
                        if closed {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            name,
            cells,
            descriptions: Vec::new(),
        }
    }

    fn put(mut self, x: usize, y: usize, glyph: char) -> Self {
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = glyph;
        }
        self
    }

    fn row(self, y: usize, x: usize, glyphs: &str) -> Self {
        glyphs
            .chars()
            .enumerate()
            .fold(self, |sketch, (offset, glyph)| sketch.put(x + offset, y, glyph))
    }

    /// Covers the whole room with a lore zone.
    fn describe(mut self, text: &str) -> Self {
        let size = self.span() * TILE_PIXELS;
        self.descriptions.push(DescriptionObject {
            x_px: 0,
            y_px: 0,
            width_px: size,
            height_px: size,
            text: text.to_owned(),
        });
        self
    }

    fn span(&self) -> i32 {
        i32::try_from(self.cells.len()).unwrap_or(0)
    }

    /// Converts the grid into a fragment.
    ///
    /// Furniture: `D` door, `d` door driven by the room's plates and levers,
    /// `L` locked door, `P` pressure plate, `T` lever, `C` crate, `H` chest,
    /// `B` bones. Creatures: `g` ghoul, `z` skeleton, `r` rat, `b` bat,
    /// `o` ogre, `V` Vitalius. Items: `k` key, `p` potion, `O` orb,
    /// `s` sword, `a` armour.
    fn build(self) -> Rc<RoomFragment> {
        let cells: Vec<(i32, i32, char)> = self
            .cells
            .iter()
            .zip(0..)
            .flat_map(|(row, y)| row.iter().zip(0..).map(move |(glyph, x)| (x, y, *glyph)))
            .collect();

        let targets = cells
            .iter()
            .filter(|(_, _, glyph)| *glyph == 'd')
            .map(|(x, y, _)| format!("[{x}, {y}]"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut fragment = RoomFragment {
            name: self.name.to_owned(),
            width_px: self.span() * TILE_PIXELS,
            height_px: self.span() * TILE_PIXELS,
            descriptions: self.descriptions,
            ..RoomFragment::default()
        };

        for (x, y, glyph) in cells {
            fragment.tiles.push(match glyph {
                '#' => WALL_GID,
                '~' => LAVA_GID,
                _ => FLOOR_GID,
            });

            let x_px = x * TILE_PIXELS;
            let y_px = (y + 1) * TILE_PIXELS;
            if let Some(kind) = furniture_kind(glyph) {
                let mut properties = BTreeMap::new();
                if matches!(glyph, 'P' | 'T') {
                    let _ = properties.insert("activationtarget".to_owned(), format!("[{targets}]"));
                }
                fragment.furniture.push(FragmentObject {
                    kind: kind.to_owned(),
                    gid: None,
                    x_px,
                    y_px,
                    properties,
                });
            } else if let Some((spawns, kind)) = spawn_kind(glyph) {
                fragment.spawns.push(SpawnObject {
                    spawns,
                    kind: kind.to_owned(),
                    x_px,
                    y_px,
                    ..SpawnObject::default()
                });
            }
        }

        Rc::new(fragment)
    }
}

fn furniture_kind(glyph: char) -> Option<&'static str> {
    let kind = match glyph {
        'D' | 'd' => "door",
        'L' => "lockeddoor",
        'P' => "pressureplate",
        'T' => "lever",
        'C' => "crate",
        'H' => "chest",
        'B' => "bones",
        _ => return None,
    };
    Some(kind)
}

fn spawn_kind(glyph: char) -> Option<(SpawnKind, &'static str)> {
    let spawn = match glyph {
        'g' => (SpawnKind::Creature, "ghoul"),
        'z' => (SpawnKind::Creature, "skeleton"),
        'r' => (SpawnKind::Creature, "rat"),
        'b' => (SpawnKind::Creature, "bat"),
        'o' => (SpawnKind::Creature, "ogre"),
        'V' => (SpawnKind::Creature, "vitalius"),
        'k' => (SpawnKind::Item, "key"),
        'p' => (SpawnKind::Item, "potion"),
        'O' => (SpawnKind::Item, "orb"),
        's' => (SpawnKind::Item, "sword"),
        'a' => (SpawnKind::Item, "armour"),
        _ => return None,
    };
    Some(spawn)
}
