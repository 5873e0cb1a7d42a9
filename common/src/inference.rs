//! The inference loop: turns observations into sentences and runs the
//! direct and subset rules until nothing new can be derived.

use crate::cell::{Bounds, Cell};
use crate::config::SubsetStrategy;
use crate::error::EngineError;
use crate::knowledge::KnowledgeBase;
use crate::sentence::Sentence;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// A revealed cell and the number of mines adjacent to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub cell: Cell,
    pub count: u8,
}

/// Facts newly proven by a single call into the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deductions {
    pub safes: BTreeSet<Cell>,
    pub mines: BTreeSet<Cell>,
    /// Sentences produced by subset inference.
    pub derivations: usize,
    /// Propagation passes run, including the final quiet one.
    pub passes: usize,
}

impl Deductions {
    pub fn is_empty(&self) -> bool {
        self.safes.is_empty() && self.mines.is_empty()
    }
}

/// The minesweeper player's reasoning core.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InferenceEngine {
    bounds: Bounds,
    strategy: SubsetStrategy,
    knowledge: KnowledgeBase,
    observations: Vec<Observation>,
}

impl InferenceEngine {
    pub fn new(bounds: Bounds) -> Self {
        Self::with_strategy(bounds, SubsetStrategy::default())
    }

    pub fn with_strategy(bounds: Bounds, strategy: SubsetStrategy) -> Self {
        InferenceEngine {
            bounds,
            strategy,
            knowledge: KnowledgeBase::new(),
            observations: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn strategy(&self) -> SubsetStrategy {
        self.strategy
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Every observation received, in arrival order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Called when the board tells us how many mines surround a revealed,
    /// safe cell. Records the move, adds a sentence over the cell's
    /// unknown neighbors and runs inference to a fixed point.
    ///
    /// Reporting a cell that was already probed changes nothing. A rejected
    /// observation leaves the engine exactly as it was.
    pub fn add_observation(&mut self, cell: Cell, count: u8) -> Result<Deductions, EngineError> {
        self.bounds.check(cell)?;
        if self.knowledge.moves_made().contains(&cell) {
            return Ok(Deductions::default());
        }
        let sentence = self.neighbor_sentence(cell, count)?;

        let deductions = self.atomically(|engine| {
            let mut deductions = Deductions::default();
            engine.knowledge.mark_safe(cell)?;
            engine.knowledge.record_move(cell);
            if let Some(sentence) = sentence {
                debug!(%cell, count, %sentence, "observation");
                engine.knowledge.insert(sentence)?;
            }
            engine.propagate_into(&mut deductions)?;
            Ok(deductions)
        })?;
        self.observations.push(Observation { cell, count });
        Ok(deductions)
    }

    /// Asserts an externally known constraint over arbitrary cells. Known
    /// cells are stripped first (mines take one off the count).
    pub fn add_sentence(
        &mut self,
        cells: impl IntoIterator<Item = Cell>,
        count: usize,
    ) -> Result<Deductions, EngineError> {
        let cells = cells
            .into_iter()
            .map(|c| self.bounds.check(c))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let sentence = self.strip_known(cells, count)?;

        self.atomically(|engine| {
            let mut deductions = Deductions::default();
            engine.knowledge.insert(sentence)?;
            engine.propagate_into(&mut deductions)?;
            Ok(deductions)
        })
    }

    /// Marks a mine without propagating. Returns `false` if already known.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool, EngineError> {
        self.knowledge.mark_mine(self.bounds.check(cell)?)
    }

    /// Marks a safe cell without propagating. Returns `false` if already known.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, EngineError> {
        self.knowledge.mark_safe(self.bounds.check(cell)?)
    }

    /// Applies the inference rules until a full pass changes nothing.
    pub fn propagate(&mut self) -> Result<Deductions, EngineError> {
        self.atomically(|engine| {
            let mut deductions = Deductions::default();
            engine.propagate_into(&mut deductions)?;
            Ok(deductions)
        })
    }

    /// Runs `op`, rolling the knowledge base back if it fails.
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let saved = self.knowledge.clone();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!(%err, "rolled back");
                self.knowledge = saved;
                Err(err)
            }
        }
    }

    fn propagate_into(&mut self, deductions: &mut Deductions) -> Result<(), EngineError> {
        loop {
            deductions.passes += 1;

            let mut changed = self.apply_known_mines(deductions)?;
            changed |= self.apply_known_safes(deductions)?;
            changed |= self.knowledge.prune_empty() > 0;

            let derived = self.apply_subsets()?;
            deductions.derivations += derived;
            changed |= derived > 0;

            if !changed {
                break;
            }
        }

        debug!(
            passes = deductions.passes,
            safes = deductions.safes.len(),
            mines = deductions.mines.len(),
            sentences = self.knowledge.sentences().len(),
            "fixed point"
        );
        Ok(())
    }

    /// Every cell of a sentence whose count equals its size is a mine.
    fn apply_known_mines(&mut self, deductions: &mut Deductions) -> Result<bool, EngineError> {
        let mut changed = false;
        // Marking never removes sentences, so indices stay put.
        for i in 0..self.knowledge.sentences().len() {
            let Some(mines) = self.knowledge.sentences()[i].known_mines() else {
                continue;
            };
            let mines: Vec<Cell> = mines.iter().copied().collect();
            for cell in mines {
                if self.knowledge.mark_mine(cell)? {
                    deductions.mines.insert(cell);
                }
            }
            changed = true;
        }
        Ok(changed)
    }

    /// Every cell of a sentence with a zero count is safe.
    fn apply_known_safes(&mut self, deductions: &mut Deductions) -> Result<bool, EngineError> {
        let mut changed = false;
        for i in 0..self.knowledge.sentences().len() {
            let Some(safes) = self.knowledge.sentences()[i].known_safes() else {
                continue;
            };
            let safes: Vec<Cell> = safes.iter().copied().collect();
            for cell in safes {
                if self.knowledge.mark_safe(cell)? {
                    deductions.safes.insert(cell);
                }
            }
            changed = true;
        }
        Ok(changed)
    }

    /// Scans ordered pairs `(a, b)` for `a ⊂ b` and replaces `b` with
    /// `b - a`. Under `OnePerPass` the scan stops at the first derivation.
    fn apply_subsets(&mut self) -> Result<usize, EngineError> {
        let mut derived = 0;
        let mut a = 0;
        while a < self.knowledge.sentences().len() {
            let mut b = 0;
            // Lengths are re-read: a replacement may collapse a duplicate.
            while b < self.knowledge.sentences().len() && a < self.knowledge.sentences().len() {
                let sentences = self.knowledge.sentences();
                if a != b && sentences[a].is_strict_subset_of(&sentences[b]) {
                    let next = sentences[b].subtract(&sentences[a])?;
                    trace!(subset = %sentences[a], superset = %sentences[b], derived = %next, "subset");
                    self.knowledge.replace(b, next)?;
                    derived += 1;
                    if self.strategy == SubsetStrategy::OnePerPass {
                        return Ok(derived);
                    }
                }
                b += 1;
            }
            a += 1;
        }
        Ok(derived)
    }

    /// The sentence contributed by a freshly revealed cell.
    fn neighbor_sentence(&self, cell: Cell, count: u8) -> Result<Option<Sentence>, EngineError> {
        let neighbors: BTreeSet<Cell> = self
            .bounds
            .neighbors(cell)
            .filter(|n| !self.knowledge.known_safe().contains(n))
            .collect();
        let sentence = self.strip_known(neighbors, count as usize)?;
        Ok((!sentence.is_empty()).then_some(sentence))
    }

    fn strip_known(&self, cells: BTreeSet<Cell>, count: usize) -> Result<Sentence, EngineError> {
        let mut count = count;
        let mut unknown = BTreeSet::new();
        for cell in cells {
            if self.knowledge.known_mines().contains(&cell) {
                count = count
                    .checked_sub(1)
                    .ok_or(EngineError::CountUnderflow { cell })?;
            } else if !self.knowledge.known_safe().contains(&cell) {
                unknown.insert(cell);
            }
        }
        Sentence::new(unknown, count)
    }
}
