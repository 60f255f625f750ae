#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural level assembly for the Spirit Crypt.
//!
//! Levels are built from a grid of 12x12 room slots surrounded by a one-tile
//! border. A [`DungeonGenerator`] picks rooms for the slots with bounded random
//! placement, then stamps the chosen fragments and the staircases onto a fresh
//! [`Level`].

use std::{
    collections::{BTreeMap, HashSet},
    rc::Rc,
};

use rand::Rng;
use spirit_crypt_core::{Offset, Position, TileId, ROOM_SPAN};
use spirit_crypt_world::{Catalog, Level, PlacedFurniture};
use thiserror::Error;
use tracing::{info, warn};

mod library;
mod plan;
mod stamp;

pub use library::{DepthBand, RoomLibrary, RoomPool};
pub use plan::{Footprint, LevelPlan, PlacedRoom, RoomRole, SlotCoord};

/// Attempts made by each random slot search before giving up.
pub const PLACEMENT_ATTEMPTS: u32 = 10_000;

/// Configuration parameters required to construct the generator.
#[derive(Clone, Debug)]
pub struct Config {
    /// Slot columns per level.
    pub rooms_x: i32,
    /// Slot rows per level.
    pub rooms_y: i32,
    /// Depth holding the boss room; no stairs lead further down.
    pub final_depth: u32,
    /// Attempts made by each random slot search.
    pub placement_attempts: u32,
    /// Pregenerated rooms attempted per level.
    pub pregenerated_rooms: usize,
    /// Probability of placing the optional extra room.
    pub other_room_chance: f64,
    /// Tile filling every cell no room covers.
    pub fill_tile: TileId,
    /// Furniture kind of the up staircase.
    pub stairs_up_kind: String,
    /// Furniture kind of the down staircase.
    pub stairs_down_kind: String,
    /// Cell of the up staircase within its slot.
    pub stairs_up_offset: Offset,
    /// Cell of the down staircase within its slot.
    pub stairs_down_offset: Offset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rooms_x: 5,
            rooms_y: 5,
            final_depth: 9,
            placement_attempts: PLACEMENT_ATTEMPTS,
            pregenerated_rooms: 8,
            other_room_chance: 0.5,
            fill_tile: TileId::new(1),
            stairs_up_kind: "stairsup".to_owned(),
            stairs_down_kind: "stairsdown".to_owned(),
            stairs_up_offset: Offset::new(5, 5),
            stairs_down_offset: Offset::new(6, 6),
        }
    }
}

impl Config {
    /// Width of generated levels in tiles.
    #[must_use]
    pub const fn level_width(&self) -> i32 {
        self.rooms_x * ROOM_SPAN + 2
    }

    /// Height of generated levels in tiles.
    #[must_use]
    pub const fn level_height(&self) -> i32 {
        self.rooms_y * ROOM_SPAN + 2
    }
}

/// Errors raised while generating a level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The slot grid has no room for even a single slot.
    #[error("slot grid {rooms_x}x{rooms_y} is too small")]
    GridTooSmall {
        /// Configured slot columns.
        rooms_x: i32,
        /// Configured slot rows.
        rooms_y: i32,
    },
    /// The library lacks a room the depth requires.
    #[error("room library has no {role} room")]
    MissingMandatoryRoom {
        /// Role of the missing room.
        role: &'static str,
    },
    /// A required room could not be placed within the attempt budget.
    #[error("could not place the {role} room on depth {depth}")]
    MandatoryRoomUnplaced {
        /// Role of the unplaced room.
        role: &'static str,
        /// Depth being generated.
        depth: u32,
    },
}

/// A freshly assembled level and the layout it was stamped from.
#[derive(Debug)]
pub struct GeneratedLevel {
    /// The stamped level.
    pub level: Level,
    /// Room layout, including the start slot on the first depth.
    pub plan: LevelPlan,
}

/// Builds levels from a room library while tracking room uniqueness.
#[derive(Debug)]
pub struct DungeonGenerator {
    config: Config,
    library: RoomLibrary,
    catalog: Rc<Catalog>,
    appeared: HashSet<String>,
}

impl DungeonGenerator {
    /// Creates a new generator using the supplied configuration.
    pub fn new(
        config: Config,
        library: RoomLibrary,
        catalog: Rc<Catalog>,
    ) -> Result<Self, GenerationError> {
        if config.rooms_x < 1 || config.rooms_y < 1 {
            return Err(GenerationError::GridTooSmall {
                rooms_x: config.rooms_x,
                rooms_y: config.rooms_y,
            });
        }

        Ok(Self {
            config,
            library,
            catalog,
            appeared: HashSet::new(),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Definition tables stamped levels resolve kinds against.
    #[must_use]
    pub fn catalog(&self) -> &Rc<Catalog> {
        &self.catalog
    }

    /// Assembles the level at the provided one-based depth.
    pub fn generate_level<R: Rng + ?Sized>(
        &mut self,
        depth: u32,
        rng: &mut R,
    ) -> Result<GeneratedLevel, GenerationError> {
        let plan = plan::Planner::new(&self.config, &mut self.appeared, rng)
            .plan(&self.library, depth)?;

        let mut level = Level::new(
            self.config.level_width(),
            self.config.level_height(),
            depth,
            self.config.fill_tile,
            Rc::clone(&self.catalog),
        );

        for room in &plan.rooms {
            stamp::stamp_room(&mut level, &room.fragment, room.slot.origin(), rng);
        }

        if let Some(slot) = plan.up_stairs {
            self.place_stairs(&mut level, &self.config.stairs_up_kind, slot, self.config.stairs_up_offset);
        }
        if let Some(slot) = plan.down_stairs {
            self.place_stairs(
                &mut level,
                &self.config.stairs_down_kind,
                slot,
                self.config.stairs_down_offset,
            );
        }

        info!(
            depth,
            rooms = plan.rooms.len(),
            creatures = level.creatures().len(),
            "level_generated"
        );
        Ok(GeneratedLevel { level, plan })
    }

    fn place_stairs(&self, level: &mut Level, kind: &str, slot: SlotCoord, offset: Offset) {
        let template = match self.catalog.furniture(kind) {
            Ok(template) => template,
            Err(error) => {
                warn!(%error, "stairs_skipped");
                return;
            }
        };
        let origin = slot.origin();
        let furniture =
            PlacedFurniture::from_definition(&template, origin.offset(offset), origin, &BTreeMap::new());
        let _ = level.insert_furniture(furniture);
    }
}

/// Cell inside a slot where the player materialises.
#[must_use]
pub fn spawn_point(slot: SlotCoord, offset: Offset) -> Position {
    slot.origin().offset(offset)
}
