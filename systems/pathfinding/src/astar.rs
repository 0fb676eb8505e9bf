//! Cost-aware A* search over the walkable grid.

use std::{cmp::Reverse, collections::BinaryHeap};

use fogline_core::{CellCoord, GridView, Path};

const NO_PREDECESSOR: usize = usize::MAX;

/// Finds a minimum-cost route from `start` to `goal`.
///
/// Entering a cell costs that cell's movement cost and the heuristic is the
/// Manhattan distance, which never overestimates because every cost is at
/// least one. The returned path excludes `start` and includes `goal`.
///
/// An empty path is returned when either endpoint is outside the grid or not
/// walkable, when `start == goal`, or when no route exists. Frontier entries
/// with equal priority are expanded in insertion order, so identical inputs
/// always produce identical paths.
#[must_use]
pub fn find_path(grid: GridView<'_>, start: CellCoord, goal: CellCoord) -> Path {
    if start == goal || !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return Path::empty();
    }
    let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
        return Path::empty();
    };

    let cell_count = grid.cell_count();
    let mut g_costs = vec![u64::MAX; cell_count];
    let mut predecessors = vec![NO_PREDECESSOR; cell_count];
    let mut closed = vec![false; cell_count];

    // (f, insertion sequence, cell index); `Reverse` turns the max-heap into a
    // min-heap and the sequence keeps ties first-in, first-out.
    let mut frontier: BinaryHeap<Reverse<(u64, u64, usize)>> = BinaryHeap::new();
    let mut sequence: u64 = 0;

    g_costs[start_index] = 0;
    frontier.push(Reverse((heuristic(start, goal), sequence, start_index)));

    while let Some(Reverse((_, _, current))) = frontier.pop() {
        if closed[current] {
            continue;
        }
        closed[current] = true;

        if current == goal_index {
            return reconstruct(grid, &predecessors, start_index, goal_index);
        }

        let Some(cell) = grid.coord(current) else {
            continue;
        };
        let current_g = g_costs[current];

        for neighbor in grid.neighbors(cell) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }
            let Some(terrain) = grid.cell_at(neighbor) else {
                continue;
            };

            let tentative = current_g.saturating_add(u64::from(terrain.move_cost.get()));
            if tentative < g_costs[neighbor_index] {
                g_costs[neighbor_index] = tentative;
                predecessors[neighbor_index] = current;
                sequence += 1;
                frontier.push(Reverse((
                    tentative.saturating_add(heuristic(neighbor, goal)),
                    sequence,
                    neighbor_index,
                )));
            }
        }
    }

    Path::empty()
}

/// Sums the movement costs of `path` when walked from `start`.
///
/// Returns `None` when a step is not orthogonally adjacent to the previous
/// cell or enters a cell that is missing or blocked.
#[must_use]
pub fn path_cost(grid: GridView<'_>, start: CellCoord, path: &Path) -> Option<u64> {
    let mut previous = start;
    let mut total: u64 = 0;

    for &cell in path.remaining() {
        let _ = previous.direction_to(cell)?;
        let terrain = grid.cell_at(cell).filter(|terrain| terrain.walkable)?;
        total = total.saturating_add(u64::from(terrain.move_cost.get()));
        previous = cell;
    }

    Some(total)
}

fn heuristic(from: CellCoord, to: CellCoord) -> u64 {
    u64::from(from.manhattan_distance(to))
}

fn reconstruct(
    grid: GridView<'_>,
    predecessors: &[usize],
    start_index: usize,
    goal_index: usize,
) -> Path {
    let mut cells = Vec::new();
    let mut current = goal_index;

    while current != start_index {
        let Some(cell) = grid.coord(current) else {
            return Path::empty();
        };
        cells.push(cell);

        current = predecessors[current];
        if current == NO_PREDECESSOR {
            return Path::empty();
        }
    }

    cells.reverse();
    Path::new(cells)
}
