//! Cave terrain grown by cellular automata.
//!
//! The map starts as noise inside a solid border and is smoothed a few times
//! so walls clump into cave walls. Only the largest connected floor region
//! survives, and a handful of short pillars break up its open areas.

use fogline_core::{Cell, CellCoord, Direction, GridView};
use fogline_system_pathfinding::scan_layers;
use fogline_world::Grid;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

const WALL_CHANCE: f64 = 0.38;
const SMOOTHING_PASSES: usize = 3;
const MIN_PILLARS: u32 = 3;
const PILLAR_ATTEMPTS_PER_PILLAR: u32 = 20;
// Smallest side that still leaves room for pillars away from the border.
const PILLAR_MIN_SIDE: u32 = 7;

/// Generates a connected cave of the provided size.
///
/// Border cells are always walls and every floor cell is reachable from every
/// other one. A map too small to hold any floor comes back fully walled.
pub(crate) fn generate(columns: u32, rows: u32, rng: &mut ChaCha8Rng) -> Grid {
    let mut cave = Cave::seeded(columns, rows, rng);
    for _ in 0..SMOOTHING_PASSES {
        cave = cave.smoothed();
    }
    cave.keep_largest_region();
    cave.add_pillars(rng);
    // A pillar may pinch off a pocket of floor.
    cave.keep_largest_region();

    debug!(
        columns,
        rows,
        floor = cave.cells.iter().filter(|cell| cell.walkable).count(),
        "cave generated"
    );
    cave.into_grid()
}

struct Cave {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Cave {
    fn seeded(columns: u32, rows: u32, rng: &mut ChaCha8Rng) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| (column, row)))
            .map(|(column, row)| {
                let border = column == 0 || row == 0 || column + 1 == columns || row + 1 == rows;
                if border || rng.gen_bool(WALL_CHANCE) {
                    Cell::WALL
                } else {
                    Cell::FLOOR
                }
            })
            .collect();
        Self {
            columns,
            rows,
            cells,
        }
    }

    fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows)
    }

    /// Walls among the eight surrounding cells; the outside counts as wall.
    fn surrounding_walls(&self, cell: CellCoord) -> usize {
        let view = self.view();
        let mut walls = 0;
        for row_offset in -1_i64..=1 {
            for column_offset in -1_i64..=1 {
                if row_offset == 0 && column_offset == 0 {
                    continue;
                }
                let column = u32::try_from(i64::from(cell.column()) + column_offset);
                let row = u32::try_from(i64::from(cell.row()) + row_offset);
                let open = match (column, row) {
                    (Ok(column), Ok(row)) => view.is_walkable(CellCoord::new(column, row)),
                    _ => false,
                };
                if !open {
                    walls += 1;
                }
            }
        }
        walls
    }

    fn smoothed(&self) -> Self {
        let view = self.view();
        let cells = view
            .coords()
            .map(|cell| match self.surrounding_walls(cell) {
                walls if walls > 4 => Cell::WALL,
                walls if walls < 4 => Cell::FLOOR,
                _ => view.cell_at(cell).unwrap_or(Cell::WALL),
            })
            .collect();
        Self {
            columns: self.columns,
            rows: self.rows,
            cells,
        }
    }

    /// Walls over every floor region except the largest one.
    ///
    /// Ties go to the region found first in row-major order.
    fn keep_largest_region(&mut self) {
        let view = self.view();
        let cell_count = u32::try_from(view.cell_count()).unwrap_or(u32::MAX);
        let mut seen = vec![false; view.cell_count()];
        let mut largest: Vec<CellCoord> = Vec::new();

        for cell in view.coords() {
            let Some(index) = view.index(cell) else {
                continue;
            };
            if seen[index] || !view.is_walkable(cell) {
                continue;
            }
            let region: Vec<CellCoord> = scan_layers(view, cell, cell_count)
                .iter()
                .flatten()
                .copied()
                .collect();
            for member in region.iter().filter_map(|member| view.index(*member)) {
                seen[member] = true;
            }
            if region.len() > largest.len() {
                largest = region;
            }
        }

        let keep: Vec<usize> = largest
            .iter()
            .filter_map(|cell| view.index(*cell))
            .collect();
        self.cells.fill(Cell::WALL);
        for index in keep {
            self.cells[index] = Cell::FLOOR;
        }
    }

    fn add_pillars(&mut self, rng: &mut ChaCha8Rng) {
        if self.columns < PILLAR_MIN_SIDE || self.rows < PILLAR_MIN_SIDE {
            return;
        }
        let wanted = MIN_PILLARS.max(self.columns / 6);
        let mut placed = 0;
        for _ in 0..wanted * PILLAR_ATTEMPTS_PER_PILLAR {
            if placed == wanted {
                break;
            }
            let cell = CellCoord::new(
                rng.gen_range(3..=self.columns - 4),
                rng.gen_range(3..=self.rows - 4),
            );
            if !self.raise_wall(cell) {
                continue;
            }
            if rng.gen_bool(0.5) {
                let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                if let Some(next) = cell.step(direction).filter(|next| self.is_inner(*next)) {
                    let _ = self.raise_wall(next);
                }
            }
            placed += 1;
        }
    }

    /// Cells at least two steps away from the border.
    fn is_inner(&self, cell: CellCoord) -> bool {
        cell.column() > 1
            && cell.row() > 1
            && cell.column() + 2 < self.columns
            && cell.row() + 2 < self.rows
    }

    /// Turns a floor cell into a wall, reporting whether it was floor.
    fn raise_wall(&mut self, cell: CellCoord) -> bool {
        let Some(index) = self.view().index(cell) else {
            return false;
        };
        if !self.cells[index].walkable {
            return false;
        }
        self.cells[index] = Cell::WALL;
        true
    }

    fn into_grid(self) -> Grid {
        let mut grid = Grid::open(self.columns, self.rows);
        let view = self.view();
        for cell in view.coords().filter(|cell| !view.is_walkable(*cell)) {
            let _ = grid.set_walkable(cell, false);
        }
        grid
    }
}
