use crate::cell::Cell;
use crate::error::EngineError;
use crate::sentence::Sentence;
use std::collections::BTreeSet;

/// Everything the player has learned so far.
///
/// The sentence list is an indexed arena: derived sentences replace their
/// parent by position, never by value. Cells leave every sentence the
/// moment they become known, so no sentence ever mentions a known cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBase {
    /// Cells that have been probed.
    moves_made: BTreeSet<Cell>,
    /// Cells proven safe, probed or not.
    known_safe: BTreeSet<Cell>,
    /// Cells proven to be mines.
    known_mines: BTreeSet<Cell>,
    /// Active constraints.
    sentences: Vec<Sentence>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.known_safe
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.known_mines
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn is_known(&self, cell: &Cell) -> bool {
        self.known_safe.contains(cell) || self.known_mines.contains(cell)
    }

    /// Returns `false` if the cell had already been probed.
    pub fn record_move(&mut self, cell: Cell) -> bool {
        self.moves_made.insert(cell)
    }

    /// Records `cell` as a mine and removes it from every sentence,
    /// decrementing their counts. Returns `false` if already known.
    /// Nothing changes when any sentence rejects the mine.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool, EngineError> {
        if self.known_mines.contains(&cell) {
            return Ok(false);
        }
        if self.known_safe.contains(&cell) {
            return Err(EngineError::Contradiction { cell });
        }
        for sentence in &self.sentences {
            sentence.admits_mine(cell)?;
        }
        self.known_mines.insert(cell);
        for sentence in &mut self.sentences {
            sentence.mark_mine(cell)?;
        }
        Ok(true)
    }

    /// Records `cell` as safe and removes it from every sentence.
    /// Returns `false` if already known. Nothing changes when any sentence
    /// rejects the cell.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, EngineError> {
        if self.known_safe.contains(&cell) {
            return Ok(false);
        }
        if self.known_mines.contains(&cell) {
            return Err(EngineError::Contradiction { cell });
        }
        for sentence in &self.sentences {
            sentence.admits_safe(cell)?;
        }
        self.known_safe.insert(cell);
        for sentence in &mut self.sentences {
            sentence.mark_safe(cell)?;
        }
        Ok(true)
    }

    /// Adds a sentence unless it is empty or already present.
    pub fn insert(&mut self, sentence: Sentence) -> Result<bool, EngineError> {
        if sentence.is_empty() {
            return Ok(false);
        }
        if let Some(existing) = self.same_cells(&sentence, None) {
            return self.settle_duplicate(existing, sentence).map(|_| false);
        }
        self.sentences.push(sentence);
        Ok(true)
    }

    /// Swaps the sentence at `index` for one derived from it. When the
    /// replacement duplicates another sentence the slot is dropped instead.
    pub fn replace(&mut self, index: usize, sentence: Sentence) -> Result<(), EngineError> {
        match self.same_cells(&sentence, Some(index)) {
            Some(existing) => {
                self.settle_duplicate(existing, sentence)?;
                self.sentences.remove(index);
            }
            None => self.sentences[index] = sentence,
        }
        Ok(())
    }

    /// Removes resolved (empty) sentences, returning how many went.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.sentences.len();
        self.sentences.retain(|s| !s.is_empty());
        before - self.sentences.len()
    }

    /// Checks the structural invariants: the safe and mine sets are
    /// disjoint, no sentence mentions a known cell, and no count exceeds
    /// its cell set.
    pub fn verify(&self) -> Result<(), EngineError> {
        if let Some(&cell) = self.known_safe.intersection(&self.known_mines).next() {
            return Err(EngineError::Contradiction { cell });
        }
        for sentence in &self.sentences {
            if sentence.count() > sentence.len() {
                return Err(EngineError::CountExceedsCells {
                    count: sentence.count(),
                    cells: sentence.len(),
                });
            }
            if let Some(&cell) = sentence.cells().iter().find(|c| self.is_known(c)) {
                return Err(EngineError::Contradiction { cell });
            }
        }
        Ok(())
    }

    fn same_cells(&self, sentence: &Sentence, skip: Option<usize>) -> Option<usize> {
        self.sentences
            .iter()
            .enumerate()
            .find(|&(i, s)| Some(i) != skip && s.cells() == sentence.cells())
            .map(|(i, _)| i)
    }

    fn settle_duplicate(&self, existing: usize, sentence: Sentence) -> Result<(), EngineError> {
        let first = &self.sentences[existing];
        if first.count() != sentence.count() {
            return Err(EngineError::ConflictingSentences {
                first: first.clone(),
                second: sentence,
            });
        }
        Ok(())
    }
}
