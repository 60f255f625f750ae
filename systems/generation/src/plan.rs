//! Constrained random placement of rooms on the slot grid.

use std::{collections::HashSet, rc::Rc};

use rand::{seq::SliceRandom, Rng};
use spirit_crypt_core::{Position, RoomFragment, ROOM_SPAN};
use tracing::{debug, warn};

use crate::{
    library::{DepthBand, RoomLibrary},
    Config, GenerationError,
};

/// Coordinate of a room slot on the level's slot grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCoord {
    /// Slot column.
    pub x: i32,
    /// Slot row.
    pub y: i32,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left tile of the slot, past the one-tile outer border.
    #[must_use]
    pub const fn origin(self) -> Position {
        Position::new(self.x * ROOM_SPAN + 1, self.y * ROOM_SPAN + 1)
    }
}

/// Number of slots a room covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Footprint {
    /// One slot.
    Single,
    /// Two by two slots.
    Double,
}

impl Footprint {
    /// Footprint implied by a fragment's width.
    #[must_use]
    pub fn of(fragment: &RoomFragment) -> Self {
        if fragment.tile_width() >= 2 * ROOM_SPAN {
            Self::Double
        } else {
            Self::Single
        }
    }
}

/// Why a room was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomRole {
    /// The level's puzzle room.
    Puzzle,
    /// The dungeon's start room.
    Start,
    /// The dungeon's boss room.
    Boss,
    /// The optional extra room.
    Other,
    /// A pregenerated room.
    Pregenerated,
    /// A filler room.
    Base,
}

/// A room chosen for a slot.
#[derive(Clone, Debug)]
pub struct PlacedRoom {
    /// Top-left slot of the room.
    pub slot: SlotCoord,
    /// Slots covered by the room.
    pub footprint: Footprint,
    /// Why the room was placed.
    pub role: RoomRole,
    /// Layout stamped into the level.
    pub fragment: Rc<RoomFragment>,
}

/// Complete room layout of a single level.
#[derive(Clone, Debug, Default)]
pub struct LevelPlan {
    /// Rooms in placement order.
    pub rooms: Vec<PlacedRoom>,
    /// Slot of the start room, on the first depth.
    pub start_slot: Option<SlotCoord>,
    /// Slot of the boss room, on the final depth.
    pub boss_slot: Option<SlotCoord>,
    /// Slot holding the up staircase.
    pub up_stairs: Option<SlotCoord>,
    /// Slot holding the down staircase; absent on the final depth.
    pub down_stairs: Option<SlotCoord>,
}

impl LevelPlan {
    /// Rooms placed for the provided role.
    pub fn rooms_with_role(&self, role: RoomRole) -> impl Iterator<Item = &PlacedRoom> {
        self.rooms.iter().filter(move |room| room.role == role)
    }
}

/// Occupancy of the slot grid during planning.
#[derive(Debug)]
pub(crate) struct SlotGrid {
    columns: i32,
    rows: i32,
    taken: Vec<bool>,
}

impl SlotGrid {
    pub(crate) fn new(columns: i32, rows: i32) -> Self {
        let count = usize::try_from(columns.max(0) * rows.max(0)).unwrap_or(0);
        Self {
            columns,
            rows,
            taken: vec![false; count],
        }
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        if slot.x < 0 || slot.y < 0 || slot.x >= self.columns || slot.y >= self.rows {
            return None;
        }
        usize::try_from(slot.y * self.columns + slot.x).ok()
    }

    fn is_free(&self, slot: SlotCoord) -> bool {
        self.index(slot).is_some_and(|index| !self.taken[index])
    }

    fn covered(slot: SlotCoord, footprint: Footprint) -> Vec<SlotCoord> {
        match footprint {
            Footprint::Single => vec![slot],
            Footprint::Double => vec![
                slot,
                SlotCoord::new(slot.x + 1, slot.y),
                SlotCoord::new(slot.x, slot.y + 1),
                SlotCoord::new(slot.x + 1, slot.y + 1),
            ],
        }
    }

    fn fits(&self, slot: SlotCoord, footprint: Footprint) -> bool {
        Self::covered(slot, footprint)
            .into_iter()
            .all(|covered| self.is_free(covered))
    }

    fn occupy(&mut self, slot: SlotCoord, footprint: Footprint) {
        for covered in Self::covered(slot, footprint) {
            if let Some(index) = self.index(covered) {
                self.taken[index] = true;
            }
        }
    }

    /// Samples random top-left slots until a free footprint turns up.
    ///
    /// This is a bounded retry loop rather than an exhaustive search.
    fn random_free<R: Rng + ?Sized>(
        &self,
        footprint: Footprint,
        attempts: u32,
        rng: &mut R,
    ) -> Option<SlotCoord> {
        let span = match footprint {
            Footprint::Single => 1,
            Footprint::Double => 2,
        };
        let max_x = self.columns - span + 1;
        let max_y = self.rows - span + 1;
        if max_x <= 0 || max_y <= 0 {
            return None;
        }

        (0..attempts)
            .map(|_| SlotCoord::new(rng.gen_range(0..max_x), rng.gen_range(0..max_y)))
            .find(|slot| self.fits(*slot, footprint))
    }

    fn free_slots(&self) -> Vec<SlotCoord> {
        (0..self.rows)
            .flat_map(|y| (0..self.columns).map(move |x| SlotCoord::new(x, y)))
            .filter(|slot| self.is_free(*slot))
            .collect()
    }
}

pub(crate) struct Planner<'a, R: Rng + ?Sized> {
    config: &'a Config,
    grid: SlotGrid,
    appeared: &'a mut HashSet<String>,
    rng: &'a mut R,
    plan: LevelPlan,
}

impl<'a, R: Rng + ?Sized> Planner<'a, R> {
    pub(crate) fn new(config: &'a Config, appeared: &'a mut HashSet<String>, rng: &'a mut R) -> Self {
        Self {
            config,
            grid: SlotGrid::new(config.rooms_x, config.rooms_y),
            appeared,
            rng,
            plan: LevelPlan::default(),
        }
    }

    pub(crate) fn plan(
        mut self,
        library: &RoomLibrary,
        depth: u32,
    ) -> Result<LevelPlan, GenerationError> {
        let pool = library.pool(DepthBand::for_depth(depth));

        match self.pick_unique(&pool.puzzles, true) {
            Some(puzzle) => {
                if self.place(puzzle, Footprint::Double, RoomRole::Puzzle).is_none() {
                    warn!(depth, "puzzle_room_unplaced");
                }
            }
            None => warn!(depth, "puzzle_pool_empty"),
        }

        if depth == 1 {
            let start = library
                .start
                .clone()
                .ok_or(GenerationError::MissingMandatoryRoom { role: "start" })?;
            let slot = self
                .place(start, Footprint::Single, RoomRole::Start)
                .ok_or(GenerationError::MandatoryRoomUnplaced { role: "start", depth })?;
            self.plan.start_slot = Some(slot);
        }

        if depth == self.config.final_depth {
            let boss = library
                .boss
                .clone()
                .ok_or(GenerationError::MissingMandatoryRoom { role: "boss" })?;
            let slot = self
                .place(boss, Footprint::Double, RoomRole::Boss)
                .ok_or(GenerationError::MandatoryRoomUnplaced { role: "boss", depth })?;
            self.plan.boss_slot = Some(slot);
        }

        if self.rng.gen_bool(self.config.other_room_chance.clamp(0.0, 1.0)) {
            if let Some(room) = self.pick_unique(&pool.other, false) {
                let footprint = Footprint::of(&room);
                if self.place(room, footprint, RoomRole::Other).is_none() {
                    debug!(depth, "other_room_unplaced");
                }
            }
        }

        let mut drawn = HashSet::new();
        for _ in 0..self.config.pregenerated_rooms {
            let Some(room) = self.pick_pregenerated(&pool.pregenerated, &mut drawn) else {
                break;
            };
            let footprint = Footprint::of(&room);
            if self.place(room, footprint, RoomRole::Pregenerated).is_none() {
                debug!(depth, "pregenerated_room_unplaced");
            }
        }

        let free = self.grid.free_slots();
        if !free.is_empty() && pool.base.is_empty() {
            warn!(depth, free = free.len(), "base_pool_empty");
        }
        for slot in free {
            if let Some(room) = pool.base.choose(&mut *self.rng).cloned() {
                self.grid.occupy(slot, Footprint::Single);
                self.plan.rooms.push(PlacedRoom {
                    slot,
                    footprint: Footprint::Single,
                    role: RoomRole::Base,
                    fragment: room,
                });
            }
        }

        self.plan.up_stairs = Some(self.random_slot());
        if depth < self.config.final_depth {
            let up = self.plan.up_stairs;
            let mut down = self.random_slot();
            for _ in 0..self.config.placement_attempts {
                if Some(down) != up {
                    break;
                }
                down = self.random_slot();
            }
            self.plan.down_stairs = Some(down);
        }

        Ok(self.plan)
    }

    fn random_slot(&mut self) -> SlotCoord {
        SlotCoord::new(
            self.rng.gen_range(0..self.config.rooms_x),
            self.rng.gen_range(0..self.config.rooms_y),
        )
    }

    fn place(
        &mut self,
        fragment: Rc<RoomFragment>,
        footprint: Footprint,
        role: RoomRole,
    ) -> Option<SlotCoord> {
        let slot = self
            .grid
            .random_free(footprint, self.config.placement_attempts, &mut *self.rng)?;
        self.grid.occupy(slot, footprint);
        debug!(room = %fragment.name, x = slot.x, y = slot.y, ?role, "room_placed");
        self.plan.rooms.push(PlacedRoom {
            slot,
            footprint,
            role,
            fragment,
        });
        Some(slot)
    }

    /// Picks a room that has not appeared in the dungeon yet.
    ///
    /// With `allow_repeat` an exhausted pool falls back to any room.
    fn pick_unique(
        &mut self,
        pool: &[Rc<RoomFragment>],
        allow_repeat: bool,
    ) -> Option<Rc<RoomFragment>> {
        let unseen: Vec<_> = pool
            .iter()
            .filter(|room| !self.appeared.contains(&room.name))
            .collect();
        let chosen = match unseen.choose(&mut *self.rng) {
            Some(room) => Rc::clone(room),
            None if allow_repeat => Rc::clone(pool.choose(&mut *self.rng)?),
            None => return None,
        };
        let _ = self.appeared.insert(chosen.name.clone());
        Some(chosen)
    }

    /// Draws without replacement for this pass, preferring rooms unseen in the dungeon.
    fn pick_pregenerated(
        &mut self,
        pool: &[Rc<RoomFragment>],
        drawn: &mut HashSet<String>,
    ) -> Option<Rc<RoomFragment>> {
        let fresh: Vec<_> = pool
            .iter()
            .filter(|room| !drawn.contains(&room.name))
            .collect();
        let unseen: Vec<_> = fresh
            .iter()
            .copied()
            .filter(|room| !self.appeared.contains(&room.name))
            .collect();

        let chosen = if let Some(room) = unseen.choose(&mut *self.rng) {
            Rc::clone(room)
        } else if let Some(room) = fresh.choose(&mut *self.rng) {
            Rc::clone(room)
        } else {
            Rc::clone(pool.choose(&mut *self.rng)?)
        };

        let _ = drawn.insert(chosen.name.clone());
        let _ = self.appeared.insert(chosen.name.clone());
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn double_footprints_need_two_slots_each_way() {
        let grid = SlotGrid::new(1, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(grid.random_free(Footprint::Double, 100, &mut rng), None);
        assert!(grid.random_free(Footprint::Single, 100, &mut rng).is_some());
    }

    #[test]
    fn occupied_slots_are_never_returned() {
        let mut grid = SlotGrid::new(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        grid.occupy(SlotCoord::new(0, 0), Footprint::Single);
        assert_eq!(grid.random_free(Footprint::Double, 1_000, &mut rng), None);

        for _ in 0..50 {
            let slot = grid
                .random_free(Footprint::Single, 1_000, &mut rng)
                .expect("three slots remain");
            assert_ne!(slot, SlotCoord::new(0, 0));
        }
        assert_eq!(grid.free_slots().len(), 3);
    }

    #[test]
    fn slot_origins_skip_the_border() {
        assert_eq!(SlotCoord::new(0, 0).origin(), Position::new(1, 1));
        assert_eq!(SlotCoord::new(2, 1).origin(), Position::new(25, 13));
    }

    #[test]
    fn wide_fragments_cover_four_slots() {
        let wide = RoomFragment {
            width_px: 384,
            height_px: 384,
            ..RoomFragment::default()
        };
        let narrow = RoomFragment {
            width_px: 192,
            height_px: 192,
            ..RoomFragment::default()
        };
        assert_eq!(Footprint::of(&wide), Footprint::Double);
        assert_eq!(Footprint::of(&narrow), Footprint::Single);
    }
}
