//! Dense terrain grid describing walkability and movement costs.

use fogline_core::{Cell, CellCoord, GridView, MoveCost, Neighbors};

/// Rectangular, row-major terrain grid.
///
/// Every in-bounds coordinate resolves to exactly one [`Cell`]. Mutation
/// happens between frames through world commands; searches borrow the grid
/// through [`Grid::view`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    columns: u32,
    rows: u32,
}

impl Grid {
    /// Creates a grid where every cell is walkable floor with unit cost.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            cells: vec![Cell::FLOOR; capacity],
            columns,
            rows,
        }
    }

    /// Parses a text layout into a grid.
    ///
    /// `.` is floor, `#` is a wall and the digits `1` to `9` are floor with
    /// that movement cost. Every row must have the same width.
    pub fn from_rows(layout: &[&str]) -> Result<Self, GridError> {
        let Some(first) = layout.first() else {
            return Err(GridError::Empty);
        };
        let width = first.chars().count();
        if width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(width * layout.len());
        for (row, line) in layout.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                cells.push(parse_glyph(glyph).ok_or(GridError::UnknownGlyph {
                    glyph,
                    column,
                    row,
                })?);
            }
        }

        let columns = u32::try_from(width).map_err(|_| GridError::TooLarge)?;
        let rows = u32::try_from(layout.len()).map_err(|_| GridError::TooLarge)?;
        Ok(Self {
            cells,
            columns,
            rows,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Borrowed view consumed by searches and systems.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows)
    }

    /// Terrain of the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, cell: CellCoord) -> Option<Cell> {
        self.view().cell_at(cell)
    }

    /// Reports whether the cell exists and may be entered.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.view().is_walkable(cell)
    }

    /// Walkable orthogonal neighbours in north, east, south, west order.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> Neighbors {
        self.view().neighbors(cell)
    }

    /// Marks a cell walkable or blocked. Returns `false` outside the grid.
    pub fn set_walkable(&mut self, cell: CellCoord, walkable: bool) -> bool {
        match self.cell_mut(cell) {
            Some(target) => {
                target.walkable = walkable;
                true
            }
            None => false,
        }
    }

    /// Replaces the movement cost of a cell. Returns `false` outside the grid.
    pub fn set_move_cost(&mut self, cell: CellCoord, cost: MoveCost) -> bool {
        match self.cell_mut(cell) {
            Some(target) => {
                target.move_cost = cost;
                true
            }
            None => false,
        }
    }

    fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut Cell> {
        let index = self.view().index(cell)?;
        self.cells.get_mut(index)
    }
}

fn parse_glyph(glyph: char) -> Option<Cell> {
    match glyph {
        '.' => Some(Cell::FLOOR),
        '#' => Some(Cell::WALL),
        digit @ '1'..='9' => digit
            .to_digit(10)
            .and_then(MoveCost::new)
            .map(Cell::floor_with_cost),
        _ => None,
    }
}

/// Reasons a text layout cannot be turned into a grid.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The layout has no rows or its rows are empty.
    #[error("grid layout is empty")]
    Empty,
    /// A row differs in width from the first row.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A glyph is not part of the layout alphabet.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column of the glyph.
        column: usize,
        /// Zero-based row of the glyph.
        row: usize,
    },
    /// The layout exceeds the addressable grid size.
    #[error("grid layout is too large")]
    TooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grid_is_walkable_everywhere() {
        let grid = Grid::open(4, 3);
        assert_eq!(grid.view().cell_count(), 12);
        assert!(grid.view().coords().all(|cell| grid.is_walkable(cell)));
        assert_eq!(grid.cell_at(CellCoord::new(4, 0)), None);
    }

    #[test]
    fn from_rows_parses_walls_and_costs() {
        let grid = Grid::from_rows(&[".#", "3."]).expect("valid layout");
        assert_eq!((grid.columns(), grid.rows()), (2, 2));
        assert!(!grid.is_walkable(CellCoord::new(1, 0)));
        let costly = grid.cell_at(CellCoord::new(0, 1)).expect("cell inside grid");
        assert!(costly.walkable);
        assert_eq!(costly.move_cost.get(), 3);
    }

    #[test]
    fn from_rows_rejects_malformed_layouts() {
        assert_eq!(Grid::from_rows(&[]), Err(GridError::Empty));
        assert_eq!(
            Grid::from_rows(&["...", ".."]),
            Err(GridError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Grid::from_rows(&["..0"]),
            Err(GridError::UnknownGlyph {
                glyph: '0',
                column: 2,
                row: 0
            })
        );
    }

    #[test]
    fn edits_are_observed_by_neighbor_queries() {
        let mut grid = Grid::open(3, 3);
        let centre = CellCoord::new(1, 1);
        assert_eq!(grid.neighbors(centre).count(), 4);

        assert!(grid.set_walkable(CellCoord::new(1, 0), false));
        assert_eq!(grid.neighbors(centre).count(), 3);

        assert!(!grid.set_walkable(CellCoord::new(9, 9), false));
        assert!(!grid.set_move_cost(CellCoord::new(3, 0), MoveCost::UNIT));
    }
}
