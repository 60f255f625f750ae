//! Stack of generated levels linked by depth.

use crate::Level;

/// Every level generated so far, ordered by depth, plus the active one.
///
/// Levels are generated lazily on first descent and kept afterwards, so
/// walking back up the stairs returns to the exact state that was left.
#[derive(Debug)]
pub struct Dungeon {
    levels: Vec<Level>,
    current: usize,
}

impl Dungeon {
    /// Starts a dungeon from its first level.
    #[must_use]
    pub fn new(first: Level) -> Self {
        Self {
            levels: vec![first],
            current: 0,
        }
    }

    /// The level the player is on.
    #[must_use]
    pub fn current(&self) -> &Level {
        &self.levels[self.current]
    }

    /// Mutable access to the level the player is on.
    pub fn current_mut(&mut self) -> &mut Level {
        &mut self.levels[self.current]
    }

    /// Level at the provided one-based depth, if generated.
    #[must_use]
    pub fn level(&self, depth: u32) -> Option<&Level> {
        let index = usize::try_from(depth).ok()?.checked_sub(1)?;
        self.levels.get(index)
    }

    /// Depth of the active level.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.current().depth()
    }

    /// Reports whether the level below the active one already exists.
    #[must_use]
    pub fn deeper_generated(&self) -> bool {
        self.current + 1 < self.levels.len()
    }

    /// Appends a freshly generated level below the deepest one.
    pub fn push_deeper(&mut self, level: Level) {
        self.levels.push(level);
    }

    /// Makes the level below active, returning whether it existed.
    pub fn descend(&mut self) -> bool {
        if !self.deeper_generated() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Makes the level above active, returning whether it existed.
    pub fn ascend(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }
}
