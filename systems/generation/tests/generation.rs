use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use spirit_crypt_core::{FurnitureDef, Position, RoomFragment, TileDef, TileId};
use spirit_crypt_system_generation::{
    Config, DungeonGenerator, GenerationError, RoomLibrary, RoomPool, RoomRole,
};
use spirit_crypt_world::Catalog;

fn room(name: &str, slots: i32) -> Rc<RoomFragment> {
    let span = slots * 12;
    Rc::new(RoomFragment {
        name: name.to_owned(),
        width_px: span * 16,
        height_px: span * 16,
        tiles: vec![1; usize::try_from(span * span).unwrap_or(0)],
        ..RoomFragment::default()
    })
}

fn catalog() -> Rc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.insert_tile(TileDef {
        id: TileId::new(0),
        kind: "floor".to_owned(),
        max_bulk: 20,
        transparent: true,
        ..TileDef::default()
    });
    catalog.insert_tile(TileDef {
        id: TileId::new(1),
        kind: "wall".to_owned(),
        ..TileDef::default()
    });
    for kind in ["stairsup", "stairsdown"] {
        catalog.insert_furniture(FurnitureDef {
            kind: kind.to_owned(),
            ..FurnitureDef::default()
        });
    }
    Rc::new(catalog)
}

fn pool(prefix: &str) -> RoomPool {
    RoomPool {
        puzzles: vec![room(&format!("{prefix}-puzzle-a"), 2), room(&format!("{prefix}-puzzle-b"), 2)],
        other: vec![room(&format!("{prefix}-other"), 1)],
        pregenerated: vec![
            room(&format!("{prefix}-pre-a"), 1),
            room(&format!("{prefix}-pre-b"), 1),
        ],
        base: vec![room(&format!("{prefix}-base"), 1)],
    }
}

fn library() -> RoomLibrary {
    RoomLibrary {
        shallow: pool("shallow"),
        middle: pool("middle"),
        deep: pool("deep"),
        start: Some(room("start", 1)),
        boss: Some(room("boss", 2)),
    }
}

fn generator(config: Config) -> DungeonGenerator {
    DungeonGenerator::new(config, library(), catalog()).expect("valid configuration")
}

#[test]
fn first_depth_holds_one_start_and_one_puzzle_room() {
    let mut generator = generator(Config::default());
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    let generated = generator.generate_level(1, &mut rng).expect("level generates");

    assert_eq!(generated.level.width(), 62);
    assert_eq!(generated.level.height(), 62);
    assert_eq!(generated.plan.rooms_with_role(RoomRole::Start).count(), 1);
    assert_eq!(generated.plan.rooms_with_role(RoomRole::Puzzle).count(), 1);
    assert_eq!(generated.plan.rooms_with_role(RoomRole::Boss).count(), 0);
    assert!(generated.plan.start_slot.is_some());

    let covered: i32 = generated
        .plan
        .rooms
        .iter()
        .map(|room| if room.fragment.tile_width() >= 24 { 4 } else { 1 })
        .sum();
    assert_eq!(covered, 25, "every slot is covered exactly once");
}

#[test]
fn stairs_are_placed_in_distinct_slots() {
    let mut generator = generator(Config::default());
    let mut rng = ChaCha8Rng::seed_from_u64(17);

    let generated = generator.generate_level(2, &mut rng).expect("level generates");
    let up = generated.plan.up_stairs.expect("up stairs placed");
    let down = generated.plan.down_stairs.expect("down stairs placed");
    assert_ne!(up, down);

    let stairs_up = up.origin().translate(5, 5);
    assert!(generated
        .level
        .furniture_at(stairs_up)
        .any(|furniture| furniture.def.kind == "stairsup"));
    let stairs_down = down.origin().translate(6, 6);
    assert!(generated
        .level
        .furniture_at(stairs_down)
        .any(|furniture| furniture.def.kind == "stairsdown"));
}

#[test]
fn final_depth_has_a_boss_and_no_way_down() {
    let config = Config {
        final_depth: 2,
        ..Config::default()
    };
    let mut generator = generator(config);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let _ = generator.generate_level(1, &mut rng).expect("first level");
    let last = generator.generate_level(2, &mut rng).expect("final level");

    assert_eq!(last.plan.rooms_with_role(RoomRole::Boss).count(), 1);
    assert!(last.plan.boss_slot.is_some());
    assert!(last.plan.down_stairs.is_none());
    assert!(last.plan.up_stairs.is_some());
}

#[test]
fn stamped_rooms_overwrite_the_fill_tile() {
    let mut generator = generator(Config::default());
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let generated = generator.generate_level(1, &mut rng).expect("level generates");

    assert_eq!(generated.level.tile_id(Position::new(0, 0)), Ok(TileId::new(1)));
    assert_eq!(generated.level.tile_id(Position::new(1, 1)), Ok(TileId::new(0)));
}

#[test]
fn missing_start_room_is_an_error() {
    let mut library = library();
    library.start = None;
    let mut generator =
        DungeonGenerator::new(Config::default(), library, catalog()).expect("valid configuration");
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let error = generator.generate_level(1, &mut rng).expect_err("start is mandatory");
    assert_eq!(error, GenerationError::MissingMandatoryRoom { role: "start" });
}

#[test]
fn single_slot_grid_cannot_hold_the_boss() {
    let config = Config {
        rooms_x: 1,
        rooms_y: 1,
        final_depth: 1,
        ..Config::default()
    };
    let mut generator = generator(config);
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let error = generator.generate_level(1, &mut rng).expect_err("boss needs four slots");
    assert_eq!(
        error,
        GenerationError::MandatoryRoomUnplaced {
            role: "boss",
            depth: 1
        }
    );
}

#[test]
fn empty_slot_grid_is_rejected() {
    let config = Config {
        rooms_x: 0,
        ..Config::default()
    };
    let error = DungeonGenerator::new(config, library(), catalog()).expect_err("no slots");
    assert_eq!(
        error,
        GenerationError::GridTooSmall {
            rooms_x: 0,
            rooms_y: 5
        }
    );
}
