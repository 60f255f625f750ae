//! Field of view and the remembered-cell overlay.
//!
//! Each turn [`Level::calculate_fov`] marks every cell in sight as visible and
//! snapshots its appearance, then [`Level::mark_remembered`] demotes cells that
//! were visible before but were not refreshed by the latest pass. Cells never
//! return to [`Visibility::Unknown`].

use spirit_crypt_core::{Position, TileId, Visibility};

use crate::Level;

/// Octant transforms `(xx, xy, yx, yy)` for recursive shadowcasting.
const OCTANTS: [(i32, i32, i32, i32); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

/// What the player knows about a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellMemory {
    visibility: Visibility,
    remembered_tile: TileId,
    remembered_furniture_icon: Option<u32>,
    seen_pass: u32,
}

impl CellMemory {
    /// Knowledge state of the cell.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Tile last seen at the cell.
    #[must_use]
    pub const fn remembered_tile(&self) -> TileId {
        self.remembered_tile
    }

    /// Icon of the first furniture piece last seen at the cell.
    #[must_use]
    pub const fn remembered_furniture_icon(&self) -> Option<u32> {
        self.remembered_furniture_icon
    }
}

struct Octant {
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

impl Level {
    /// Memory of a single cell, if it lies inside the grid.
    #[must_use]
    pub fn memory_at(&self, position: Position) -> Option<&CellMemory> {
        self.index(position).map(|index| &self.memory[index])
    }

    /// Marks every cell within `radius` that is in sight of `origin` as visible.
    pub fn calculate_fov(&mut self, origin: Position, radius: i32) {
        self.fov_pass = self.fov_pass.wrapping_add(1);
        self.reveal(origin);

        for (xx, xy, yx, yy) in OCTANTS {
            let octant = Octant { xx, xy, yx, yy };
            self.cast_light(origin, radius, 1, 1.0, 0.0, &octant);
        }
    }

    fn cast_light(
        &mut self,
        origin: Position,
        radius: i32,
        row: i32,
        mut start: f32,
        end: f32,
        octant: &Octant,
    ) {
        if start < end {
            return;
        }

        let radius_squared = radius * radius;
        let mut next_start = start;

        for distance in row..=radius {
            let dy = -distance;
            let mut blocked = false;

            for dx in -distance..=0 {
                let left_slope = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let right_slope = (dx as f32 + 0.5) / (dy as f32 - 0.5);

                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                let cell = origin.translate(
                    dx * octant.xx + dy * octant.xy,
                    dx * octant.yx + dy * octant.yy,
                );

                if dx * dx + dy * dy <= radius_squared {
                    self.reveal(cell);
                }

                let opaque = !self.is_transparent(cell);
                if blocked {
                    if opaque {
                        next_start = right_slope;
                    } else {
                        blocked = false;
                        start = next_start;
                    }
                } else if opaque && distance < radius {
                    blocked = true;
                    self.cast_light(origin, radius, distance + 1, start, left_slope, octant);
                    next_start = right_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }

    fn reveal(&mut self, cell: Position) {
        let Some(index) = self.index(cell) else {
            return;
        };
        let icon = self
            .furniture_at(cell)
            .next()
            .map(|furniture| furniture.def.icon_id);
        let tile = self.tiles[index];
        let pass = self.fov_pass;

        let memory = &mut self.memory[index];
        memory.visibility = Visibility::Visible;
        memory.remembered_tile = tile;
        memory.remembered_furniture_icon = icon;
        memory.seen_pass = pass;
    }

    /// Demotes cells around `origin` that the latest pass did not refresh.
    ///
    /// Scans one cell beyond `radius` so cells left behind by a single step
    /// are demoted as well.
    pub fn mark_remembered(&mut self, origin: Position, radius: i32) {
        let reach = radius + 1;
        let pass = self.fov_pass;

        for y in (origin.y() - reach)..=(origin.y() + reach) {
            for x in (origin.x() - reach)..=(origin.x() + reach) {
                let Some(index) = self.index(Position::new(x, y)) else {
                    continue;
                };
                let memory = &mut self.memory[index];
                if memory.visibility == Visibility::Visible && memory.seen_pass != pass {
                    memory.visibility = Visibility::Remembered;
                }
            }
        }
    }

    /// Demotes every visible cell, used when the player leaves the level.
    pub fn forget_sight(&mut self) {
        for memory in &mut self.memory {
            if memory.visibility == Visibility::Visible {
                memory.visibility = Visibility::Remembered;
            }
        }
    }

    /// Reports whether every cell strictly between `from` and `to` lets light through.
    #[must_use]
    pub fn line_of_sight(&self, from: Position, to: Position) -> bool {
        let dx = (to.x() - from.x()).abs();
        let dy = -(to.y() - from.y()).abs();
        let step_x = if from.x() < to.x() { 1 } else { -1 };
        let step_y = if from.y() < to.y() { 1 } else { -1 };
        let mut error = dx + dy;
        let (mut x, mut y) = (from.x(), from.y());

        loop {
            if x == to.x() && y == to.y() {
                return true;
            }
            let current = Position::new(x, y);
            if current != from && !self.is_transparent(current) {
                return false;
            }

            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use spirit_crypt_core::TileDef;

    use super::*;
    use crate::Catalog;

    const FLOOR: TileId = TileId::new(0);
    const WALL: TileId = TileId::new(1);

    fn open_level(width: i32, height: i32) -> Level {
        let mut catalog = Catalog::new();
        catalog.insert_tile(TileDef {
            id: FLOOR,
            kind: "floor".to_owned(),
            max_bulk: 20,
            transparent: true,
            ..TileDef::default()
        });
        catalog.insert_tile(TileDef {
            id: WALL,
            kind: "wall".to_owned(),
            ..TileDef::default()
        });
        Level::new(width, height, 1, FLOOR, Rc::new(catalog))
    }

    fn visibility(level: &Level, x: i32, y: i32) -> Visibility {
        level
            .memory_at(Position::new(x, y))
            .map_or(Visibility::Unknown, CellMemory::visibility)
    }

    #[test]
    fn open_rooms_are_visible_within_radius() {
        let mut level = open_level(15, 15);
        level.calculate_fov(Position::new(7, 7), 3);

        assert_eq!(visibility(&level, 7, 7), Visibility::Visible);
        assert_eq!(visibility(&level, 10, 7), Visibility::Visible);
        assert_eq!(visibility(&level, 7, 4), Visibility::Visible);
        assert_eq!(visibility(&level, 11, 7), Visibility::Unknown);
    }

    #[test]
    fn walls_cast_shadows() {
        let mut level = open_level(15, 5);
        level
            .set_tile_id(Position::new(4, 2), WALL)
            .expect("in bounds");
        level.calculate_fov(Position::new(2, 2), 7);

        assert_eq!(visibility(&level, 4, 2), Visibility::Visible);
        assert_eq!(visibility(&level, 6, 2), Visibility::Unknown);
        assert!(!level.line_of_sight(Position::new(2, 2), Position::new(6, 2)));
        assert!(level.line_of_sight(Position::new(2, 2), Position::new(4, 2)));
        assert!(level.line_of_sight(Position::new(2, 1), Position::new(6, 1)));
    }

    #[test]
    fn cells_out_of_sight_are_remembered_not_forgotten() {
        let mut level = open_level(20, 5);
        level.calculate_fov(Position::new(2, 2), 3);
        level.mark_remembered(Position::new(2, 2), 3);
        assert_eq!(visibility(&level, 0, 2), Visibility::Visible);

        level.calculate_fov(Position::new(3, 2), 3);
        level.mark_remembered(Position::new(3, 2), 3);
        assert_eq!(visibility(&level, 0, 2), Visibility::Visible);

        level.calculate_fov(Position::new(4, 2), 3);
        level.mark_remembered(Position::new(4, 2), 3);
        assert_eq!(visibility(&level, 0, 2), Visibility::Remembered);
        assert_eq!(
            level
                .memory_at(Position::new(0, 2))
                .map(CellMemory::remembered_tile),
            Some(FLOOR)
        );
    }

    #[test]
    fn visibility_never_regresses_to_unknown() {
        let mut level = open_level(30, 30);
        let path = [(3, 3), (6, 4), (12, 12), (20, 25), (4, 27), (15, 15)];
        let mut known = vec![false; 30 * 30];

        for (x, y) in path {
            let origin = Position::new(x, y);
            level.calculate_fov(origin, 7);
            level.mark_remembered(origin, 7);

            for cy in 0..30 {
                for cx in 0..30 {
                    let index = usize::try_from(cy * 30 + cx).expect("index");
                    let state = visibility(&level, cx, cy);
                    if known[index] {
                        assert_ne!(state, Visibility::Unknown, "cell ({cx}, {cy}) regressed");
                    }
                    known[index] = state != Visibility::Unknown;
                }
            }
        }

        level.forget_sight();
        assert!(known
            .iter()
            .enumerate()
            .filter(|(_, seen)| **seen)
            .all(|(index, _)| {
                let index = i32::try_from(index).expect("index");
                visibility(&level, index % 30, index / 30) == Visibility::Remembered
            }));
    }
}
