//! Hand-authored room layouts stamped into generated levels.
//!
//! Fragments are expressed in the units of the map editor that produced them:
//! dimensions and object positions are in pixels, tile layers hold one-based
//! global tile ids where zero means "leave the cell alone".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TILE_PIXELS;

/// A rectangular room layout with its object layers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomFragment {
    /// Name used in logs.
    pub name: String,
    /// Width of the room in pixels.
    pub width_px: i32,
    /// Height of the room in pixels.
    pub height_px: i32,
    /// Row-major global tile ids; zero leaves the level tile untouched.
    pub tiles: Vec<u32>,
    /// Furniture objects.
    pub furniture: Vec<FragmentObject>,
    /// Rectangles of lore text revealed when entered.
    pub descriptions: Vec<DescriptionObject>,
    /// Creature and item spawn points.
    pub spawns: Vec<SpawnObject>,
}

impl RoomFragment {
    /// Width of the room in tiles.
    #[must_use]
    pub fn tile_width(&self) -> i32 {
        self.width_px / TILE_PIXELS
    }

    /// Height of the room in tiles.
    #[must_use]
    pub fn tile_height(&self) -> i32 {
        self.height_px / TILE_PIXELS
    }

    /// Global tile id stored at the provided local tile coordinate.
    #[must_use]
    pub fn tile_gid(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.tile_width() || y >= self.tile_height() {
            return None;
        }
        let index = usize::try_from(y * self.tile_width() + x).ok()?;
        self.tiles.get(index).copied()
    }
}

/// A furniture object placed by the editor.
///
/// Tile objects are anchored at their bottom-left corner, so the stamped row
/// is one less than `y_px / 16`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentObject {
    /// Furniture kind; empty when it should be inferred from `gid`.
    pub kind: String,
    /// Global tile id of the editor tile used to draw the object.
    pub gid: Option<u32>,
    /// Horizontal pixel position.
    pub x_px: i32,
    /// Vertical pixel position of the bottom edge.
    pub y_px: i32,
    /// Per-object overrides applied to the furniture copy.
    pub properties: BTreeMap<String, String>,
}

/// A lore rectangle in pixel units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionObject {
    /// Left edge in pixels.
    pub x_px: i32,
    /// Top edge in pixels.
    pub y_px: i32,
    /// Width in pixels.
    pub width_px: i32,
    /// Height in pixels.
    pub height_px: i32,
    /// Text logged the first time the player enters.
    pub text: String,
}

/// What a spawn point produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    /// A creature of the named kind.
    #[default]
    Creature,
    /// An item of the named kind.
    Item,
}

/// A probabilistic creature or item spawn point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnObject {
    /// Whether a creature or an item is spawned.
    pub spawns: SpawnKind,
    /// Kind name looked up in the matching table.
    pub kind: String,
    /// Horizontal pixel position.
    pub x_px: i32,
    /// Vertical pixel position.
    pub y_px: i32,
    /// Probability in `[0, 1]` that the spawn happens.
    pub chance: f32,
    /// Willpower override for spawned creatures.
    pub willpower: Option<i32>,
}

impl Default for SpawnObject {
    fn default() -> Self {
        Self {
            spawns: SpawnKind::Creature,
            kind: String::new(),
            x_px: 0,
            y_px: 0,
            chance: 1.0,
            willpower: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_convert_from_pixels() {
        let fragment = RoomFragment {
            width_px: 384,
            height_px: 192,
            ..RoomFragment::default()
        };
        assert_eq!(fragment.tile_width(), 24);
        assert_eq!(fragment.tile_height(), 12);
    }

    #[test]
    fn tile_gid_rejects_cells_outside_the_fragment() {
        let fragment = RoomFragment {
            width_px: 32,
            height_px: 32,
            tiles: vec![1, 2, 3, 4],
            ..RoomFragment::default()
        };
        assert_eq!(fragment.tile_gid(1, 1), Some(4));
        assert_eq!(fragment.tile_gid(2, 0), None);
        assert_eq!(fragment.tile_gid(-1, 0), None);
    }
}
