use crate::cell::Cell;
use crate::error::EngineError;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// A revealed '2' next to three unknown cells becomes `{a, b, c} = 2`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Sentence {
    /// Builds a sentence, rejecting a count larger than the cell set.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self, EngineError> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(EngineError::CountExceedsCells {
                count,
                cells: cells.len(),
            });
        }
        Ok(Sentence { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty sentence is fully resolved and carries no information.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// Every cell is a mine when the count covers the whole set.
    pub fn known_mines(&self) -> Option<&BTreeSet<Cell>> {
        (!self.is_empty() && self.count == self.cells.len()).then_some(&self.cells)
    }

    /// Every cell is safe when the count is zero.
    pub fn known_safes(&self) -> Option<&BTreeSet<Cell>> {
        (!self.is_empty() && self.count == 0).then_some(&self.cells)
    }

    /// Fails if `cell` is a member but cannot be a mine.
    pub fn admits_mine(&self, cell: Cell) -> Result<(), EngineError> {
        if self.contains(&cell) && self.count == 0 {
            return Err(EngineError::CountUnderflow { cell });
        }
        Ok(())
    }

    /// Fails if `cell` is a member but cannot be safe.
    pub fn admits_safe(&self, cell: Cell) -> Result<(), EngineError> {
        if self.contains(&cell) && self.count == self.cells.len() {
            return Err(EngineError::CountExceedsCells {
                count: self.count,
                cells: self.cells.len() - 1,
            });
        }
        Ok(())
    }

    /// Drops a proven mine from the sentence. Returns whether the cell was
    /// present. Leaves the sentence untouched on error.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool, EngineError> {
        self.admits_mine(cell)?;
        if !self.cells.remove(&cell) {
            return Ok(false);
        }
        self.count -= 1;
        Ok(true)
    }

    /// Drops a proven safe cell from the sentence. Returns whether the cell
    /// was present. Leaves the sentence untouched on error.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, EngineError> {
        self.admits_safe(cell)?;
        Ok(self.cells.remove(&cell))
    }

    pub fn is_strict_subset_of(&self, other: &Sentence) -> bool {
        !self.is_empty() && self.len() < other.len() && self.cells.is_subset(&other.cells)
    }

    /// Subset inference: `self - subset` holds `self.count - subset.count` mines.
    pub fn subtract(&self, subset: &Sentence) -> Result<Sentence, EngineError> {
        let count =
            self.count
                .checked_sub(subset.count)
                .ok_or_else(|| EngineError::SubsetUnderflow {
                    subset: subset.clone(),
                    superset: self.clone(),
                })?;
        Sentence::new(self.cells.difference(&subset.cells).copied(), count)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", itertools::join(&self.cells, ", "), self.count)
    }
}
