//! Shortest paths over the 4-connected tile grid.

use std::{cmp::Reverse, collections::BinaryHeap};

use spirit_crypt_core::{Direction, Position};

const NEIGHBOURS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// Finds a unit-cost shortest path from `from` to `to`.
///
/// The search expands from `to`, so the returned path starts at `from`, ends
/// at `to`, and its second entry is the first hop. Both endpoints are always
/// considered traversable. Returns an empty path when `to` is unreachable.
pub(crate) fn shortest_path<F>(
    width: i32,
    height: i32,
    from: Position,
    to: Position,
    mut passable: F,
) -> Vec<Position>
where
    F: FnMut(Position) -> bool,
{
    let Some(goal) = index(width, height, from) else {
        return Vec::new();
    };
    let Some(source) = index(width, height, to) else {
        return Vec::new();
    };

    let cell_count = usize::try_from(width * height).unwrap_or(0);
    let mut distances = vec![u32::MAX; cell_count];
    let mut next_hop: Vec<Option<usize>> = vec![None; cell_count];
    let mut frontier = BinaryHeap::new();

    distances[source] = 0;
    frontier.push(Reverse((0_u32, source)));

    while let Some(Reverse((distance, current))) = frontier.pop() {
        if current == goal {
            break;
        }
        if distance > distances[current] {
            continue;
        }

        let cell = position(width, current);
        for direction in NEIGHBOURS {
            let neighbour = cell.step(direction);
            let Some(neighbour_index) = index(width, height, neighbour) else {
                continue;
            };
            if neighbour_index != goal && !passable(neighbour) {
                continue;
            }

            let candidate = distance + 1;
            if candidate < distances[neighbour_index] {
                distances[neighbour_index] = candidate;
                next_hop[neighbour_index] = Some(current);
                frontier.push(Reverse((candidate, neighbour_index)));
            }
        }
    }

    if distances[goal] == u32::MAX {
        return Vec::new();
    }

    let mut path = vec![from];
    let mut current = goal;
    while let Some(hop) = next_hop[current] {
        path.push(position(width, hop));
        current = hop;
    }
    path
}

fn index(width: i32, height: i32, cell: Position) -> Option<usize> {
    if cell.x() < 0 || cell.y() < 0 || cell.x() >= width || cell.y() >= height {
        return None;
    }
    usize::try_from(cell.y() * width + cell.x()).ok()
}

fn position(width: i32, index: usize) -> Position {
    let index = i32::try_from(index).unwrap_or(i32::MAX);
    Position::new(index % width, index / width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_runs_from_seeker_to_target() {
        let path = shortest_path(5, 1, Position::new(0, 0), Position::new(4, 0), |_| true);
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], Position::new(0, 0));
        assert_eq!(path[1], Position::new(1, 0));
        assert_eq!(path[4], Position::new(4, 0));
    }

    #[test]
    fn walls_force_a_detour() {
        // A vertical wall at x = 2 with a gap at the bottom row.
        let wall = |cell: Position| !(cell.x() == 2 && cell.y() < 2);
        let path = shortest_path(5, 3, Position::new(0, 0), Position::new(4, 0), wall);
        assert_eq!(path.len(), 9);
        assert!(path.iter().all(|cell| wall(*cell)));
    }

    #[test]
    fn unreachable_targets_yield_no_path() {
        let wall = |cell: Position| cell.x() != 2;
        assert!(shortest_path(5, 3, Position::new(0, 0), Position::new(4, 0), wall).is_empty());
    }

    #[test]
    fn standing_on_the_target_is_a_single_step_path() {
        let path = shortest_path(3, 3, Position::new(1, 1), Position::new(1, 1), |_| false);
        assert_eq!(path, vec![Position::new(1, 1)]);
    }
}
