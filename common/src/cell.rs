use crate::error::EngineError;
use itertools::Itertools;
use std::fmt;

/// A 0-indexed `(row, col)` coordinate on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The dimensions of a board. Every coordinate that crosses into the
/// engine is validated against these once, at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub height: usize,
    pub width: usize,
}

impl Bounds {
    pub const fn new(height: usize, width: usize) -> Self {
        Bounds { height, width }
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Returns the cell back if it lies on the board.
    pub fn check(&self, cell: Cell) -> Result<Cell, EngineError> {
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(EngineError::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Every cell on the board, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        (0..self.height)
            .cartesian_product(0..self.width)
            .map(Cell::from)
    }

    /// All in-bounds cells within one row and column of `cell`, not
    /// including the cell itself. Handles edges and corners.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let height = self.height as isize;
        let width = self.width as isize;

        (-1..=1isize).flat_map(move |dr| {
            (-1..=1isize).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let row = cell.row as isize + dr;
                let col = cell.col as isize + dc;

                if row >= 0 && row < height && col >= 0 && col < width {
                    Some(Cell::new(row as usize, col as usize))
                } else {
                    None
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_counts() {
        let bounds = Bounds::new(3, 3);

        // Corner cell (0,0) should have 3 neighbors
        assert_eq!(bounds.neighbors(Cell::new(0, 0)).count(), 3);

        // Center cell (1,1) should have 8 neighbors
        assert_eq!(bounds.neighbors(Cell::new(1, 1)).count(), 8);

        // Edge cell (0,1) should have 5 neighbors
        assert_eq!(bounds.neighbors(Cell::new(0, 1)).count(), 5);
    }

    #[test]
    fn test_neighbors_exclude_self_and_stay_adjacent() {
        let bounds = Bounds::new(4, 6);
        let center = Cell::new(2, 3);
        for n in bounds.neighbors(center) {
            assert_ne!(n, center);
            assert!(n.row.abs_diff(center.row) <= 1);
            assert!(n.col.abs_diff(center.col) <= 1);
            assert!(bounds.contains(n));
        }
    }

    #[test]
    fn test_cells_row_major() {
        let bounds = Bounds::new(2, 3);
        let cells: Vec<Cell> = bounds.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[3], Cell::new(1, 0));
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_check_rejects_out_of_bounds() {
        let bounds = Bounds::new(3, 3);
        assert_eq!(bounds.check(Cell::new(2, 2)), Ok(Cell::new(2, 2)));
        assert_eq!(
            bounds.check(Cell::new(3, 0)),
            Err(EngineError::OutOfBounds {
                cell: Cell::new(3, 0),
                height: 3,
                width: 3,
            })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::new(4, 7).to_string(), "(4, 7)");
    }
}
