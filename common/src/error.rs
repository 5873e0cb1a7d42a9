use crate::cell::Cell;
use crate::sentence::Sentence;

/// Failures surfaced by the inference core.
///
/// Apart from `OutOfBounds`, every variant means the observations fed to
/// the engine were inconsistent with any single mine layout. An honest
/// driver never produces them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("cell {cell} is outside the {height}x{width} board")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error("sentence claims {count} mines among {cells} cells")]
    CountExceedsCells { count: usize, cells: usize },

    #[error("marking {cell} as a mine drives a sentence count below zero")]
    CountUnderflow { cell: Cell },

    #[error("subset {subset} holds more mines than its superset {superset}")]
    SubsetUnderflow { subset: Sentence, superset: Sentence },

    #[error("sentences over the same cells disagree: {first} vs {second}")]
    ConflictingSentences { first: Sentence, second: Sentence },

    #[error("cell {cell} is proven both safe and a mine")]
    Contradiction { cell: Cell },
}
