//! Room fragments grouped by depth band and role.

use std::rc::Rc;

use spirit_crypt_core::RoomFragment;

/// Depth ranges that draw from distinct room pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthBand {
    /// Depths 1 to 3.
    Shallow,
    /// Depths 4 to 6.
    Middle,
    /// Depth 7 and below.
    Deep,
}

impl DepthBand {
    /// Band a one-based depth belongs to.
    #[must_use]
    pub const fn for_depth(depth: u32) -> Self {
        match depth {
            0..=3 => Self::Shallow,
            4..=6 => Self::Middle,
            _ => Self::Deep,
        }
    }
}

/// Rooms available to a single depth band.
#[derive(Clone, Debug, Default)]
pub struct RoomPool {
    /// Two by two rooms, one of which is placed on every level.
    pub puzzles: Vec<Rc<RoomFragment>>,
    /// Rooms placed with a fixed chance; unique across the dungeon.
    pub other: Vec<Rc<RoomFragment>>,
    /// Rooms placed several times per level; preferably unseen.
    pub pregenerated: Vec<Rc<RoomFragment>>,
    /// Filler rooms for every slot left free.
    pub base: Vec<Rc<RoomFragment>>,
}

/// Every room fragment the generator may stamp.
#[derive(Clone, Debug, Default)]
pub struct RoomLibrary {
    /// Pool for depths 1 to 3.
    pub shallow: RoomPool,
    /// Pool for depths 4 to 6.
    pub middle: RoomPool,
    /// Pool for depth 7 and below.
    pub deep: RoomPool,
    /// Mandatory single-slot room on the first depth.
    pub start: Option<Rc<RoomFragment>>,
    /// Mandatory two by two room on the final depth.
    pub boss: Option<Rc<RoomFragment>>,
}

impl RoomLibrary {
    /// Pool used by the provided band.
    #[must_use]
    pub fn pool(&self, band: DepthBand) -> &RoomPool {
        match band {
            DepthBand::Shallow => &self.shallow,
            DepthBand::Middle => &self.middle,
            DepthBand::Deep => &self.deep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DepthBand;

    #[test]
    fn depths_map_to_bands() {
        assert_eq!(DepthBand::for_depth(1), DepthBand::Shallow);
        assert_eq!(DepthBand::for_depth(3), DepthBand::Shallow);
        assert_eq!(DepthBand::for_depth(4), DepthBand::Middle);
        assert_eq!(DepthBand::for_depth(6), DepthBand::Middle);
        assert_eq!(DepthBand::for_depth(7), DepthBand::Deep);
        assert_eq!(DepthBand::for_depth(12), DepthBand::Deep);
    }
}
