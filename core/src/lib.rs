#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Spirit Crypt engine.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! level state, and the simulation systems. Adapters translate input into
//! [`PlayerCommand`] values, the turn scheduler resolves those commands against
//! the level, and then reports what happened as [`Event`] values that
//! presenters may consume. Immutable definition tables live in [`defs`] and the
//! hand-authored room layouts consumed by the generator live in [`fragments`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod defs;
pub mod fragments;

pub use defs::{
    CreatureDef, FurnitureDef, ItemCategory, ItemDef, LootEntry, SlotKind, TileDef,
};
pub use fragments::{DescriptionObject, FragmentObject, RoomFragment, SpawnKind, SpawnObject};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the Spirit Crypt.";

/// Edge length of a single tile in room fragment pixel units.
pub const TILE_PIXELS: i32 = 16;

/// Edge length of a single room slot measured in tiles.
pub const ROOM_SPAN: i32 = 12;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so speculative probes beyond the level edges can be
/// expressed and rejected by bounds checks instead of wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position shifted by the provided relative offset.
    #[must_use]
    pub const fn offset(self, offset: Offset) -> Self {
        self.translate(offset.dx, offset.dy)
    }

    /// Returns the position shifted by the provided deltas.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns the neighbouring position in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        self.offset(direction.delta())
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Relative cell offset, used for activation targets and stair anchors.
///
/// Serialized as a two element `[dx, dy]` array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Offset {
    /// Horizontal component of the offset.
    pub dx: i32,
    /// Vertical component of the offset.
    pub dy: i32,
}

impl Offset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl From<[i32; 2]> for Offset {
    fn from(value: [i32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Offset> for [i32; 2] {
    fn from(value: Offset) -> Self {
        [value.dx, value.dy]
    }
}

/// Cardinal directions available to the player, plus the current cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
    /// The cell the actor already occupies.
    Here,
}

impl Direction {
    /// Unit offset travelled when moving in this direction.
    #[must_use]
    pub const fn delta(self) -> Offset {
        match self {
            Self::North => Offset::new(0, -1),
            Self::East => Offset::new(1, 0),
            Self::South => Offset::new(0, 1),
            Self::West => Offset::new(-1, 0),
            Self::Here => Offset::new(0, 0),
        }
    }

    /// Reports whether the direction leaves the current cell.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        !matches!(self, Self::Here)
    }
}

/// Index into the tile definition table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a creature instance within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(u32);

impl CreatureId {
    /// Creates a new creature identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item lying on the floor of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Knowledge the player has about a single cell.
///
/// Cells start [`Visibility::Unknown`] and never return to it once seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// The cell has never been seen.
    #[default]
    Unknown,
    /// The cell lies inside the current field of view.
    Visible,
    /// The cell was seen before and is drawn from memory.
    Remembered,
}

/// Abstract player intents, already translated from raw input devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Moves the player, or waits when the direction is [`Direction::Here`].
    Step {
        /// Direction of the step.
        direction: Direction,
        /// Whether the possession modifier is held.
        possess: bool,
    },
    /// Asks for a direction and activates the furniture found there.
    Activate,
    /// Asks for a direction and pushes whatever occupies that cell.
    Push,
    /// Asks for a direction and describes that cell.
    Describe,
    /// Picks up an item from the player's cell.
    PickUp,
    /// Follows the stairs under the player.
    UseStairs,
    /// Selects a numbered entry: an inventory slot or a prompt option.
    Choose {
        /// One-based number of the entry.
        number: u8,
    },
    /// Applies an action to the inventory slot opened by [`PlayerCommand::Choose`].
    ItemAction(ItemAction),
    /// Abandons the pending follow-up prompt.
    Cancel,
}

/// Actions offered by the inventory slot menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemAction {
    /// Consumes or applies the held item.
    Use,
    /// Places the held item on the floor.
    Drop,
    /// Swaps the held item into another slot.
    Move,
}

/// Events reported by the turn scheduler after resolving a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that autonomous creatures received simulated time.
    TurnAdvanced {
        /// Time granted to every creature accumulator.
        delta: i32,
    },
    /// Confirms that a creature relocated between two cells.
    CreatureMoved {
        /// Identifier of the creature that moved.
        creature: CreatureId,
        /// Cell the creature occupied before moving.
        from: Position,
        /// Cell the creature occupies after moving.
        to: Position,
    },
    /// Reports a resolved melee exchange.
    CreatureAttacked {
        /// Identifier of the attacking creature.
        attacker: CreatureId,
        /// Identifier of the defending creature.
        defender: CreatureId,
        /// Hit points removed from the defender.
        damage: i32,
    },
    /// Reports that a creature's hit points were exhausted.
    CreatureDied {
        /// Identifier of the creature that died.
        creature: CreatureId,
        /// Category of the attacker or kind of tile that caused the death.
        cause: String,
    },
    /// Reports the outcome of a possession attempt.
    PossessionAttempted {
        /// Creature the spirit tried to take over.
        target: CreatureId,
        /// Probability used for the roll, clamped to `[0, 1]`.
        chance: f32,
        /// Whether the spirit took control.
        success: bool,
    },
    /// Reports that the spirit left its body.
    SpiritDetached {
        /// Body the spirit left behind.
        body: CreatureId,
        /// Whether the body died and forced the spirit out.
        ejected: bool,
    },
    /// Reports a change of depth through a staircase.
    LevelEntered {
        /// Depth the player arrived at.
        depth: u32,
    },
    /// Announces that the final boss was slain.
    Victory {
        /// Category of the attacker or kind of tile that slew the boss.
        cause: String,
    },
    /// Announces that the spirit ran out of stability.
    SpiritDissipated,
}

/// Errors raised when a grid cell is addressed outside the level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The cell lies outside `[0, width) x [0, height)`.
    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested column.
        x: i32,
        /// Requested row.
        y: i32,
        /// Width of the grid.
        width: i32,
        /// Height of the grid.
        height: i32,
    },
}

/// Definition tables consulted by lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionTable {
    /// Tile definitions.
    Tile,
    /// Creature definitions.
    Creature,
    /// Item definitions.
    Item,
    /// Furniture definitions.
    Furniture,
}

impl fmt::Display for DefinitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Tile => "tile",
            Self::Creature => "creature",
            Self::Item => "item",
            Self::Furniture => "furniture",
        };
        f.write_str(label)
    }
}

/// Data integrity faults raised while resolving authored content.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// A referenced kind is missing from its table.
    #[error("{table} kind `{kind}` is not defined")]
    UnknownKind {
        /// Table the lookup was performed against.
        table: DefinitionTable,
        /// Kind that could not be resolved.
        kind: String,
    },
    /// A tile identifier is missing from the tile table.
    #[error("tile id {id} is not defined")]
    UnknownTile {
        /// Identifier that could not be resolved.
        id: u32,
    },
    /// A per-object override could not be interpreted.
    #[error("property `{key}` has malformed value `{value}`")]
    MalformedProperty {
        /// Name of the property.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
}
