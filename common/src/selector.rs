use crate::cell::Cell;
use crate::inference::InferenceEngine;
use rand::Rng;
use rand::seq::IndexedRandom;

/// A probe chosen by the player, tagged with whether logic backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Move {
    /// The cell is proven safe.
    Safe(Cell),
    /// No safe cell is known; this one is a guess.
    Guess(Cell),
}

impl Move {
    pub fn cell(&self) -> Cell {
        match *self {
            Move::Safe(cell) | Move::Guess(cell) => cell,
        }
    }
}

impl InferenceEngine {
    /// A cell known to be safe that has not been probed yet.
    pub fn make_safe_move(&self) -> Option<Cell> {
        let kb = self.knowledge();
        kb.known_safe()
            .difference(kb.moves_made())
            .next()
            .copied()
    }

    /// A uniformly random cell that has not been probed and is not a
    /// known mine. The cell is not necessarily safe.
    pub fn make_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let kb = self.knowledge();
        let candidates: Vec<Cell> = self
            .bounds()
            .cells()
            .filter(|c| !kb.moves_made().contains(c) && !kb.known_mines().contains(c))
            .collect();
        candidates.choose(rng).copied()
    }

    /// Prefers a proven-safe probe, falling back to a random one.
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        self.make_safe_move()
            .map(Move::Safe)
            .or_else(|| self.make_random_move(rng).map(Move::Guess))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Bounds;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_fresh_engine_has_no_safe_move() {
        let engine = InferenceEngine::new(Bounds::new(4, 4));
        assert_eq!(engine.make_safe_move(), None);
    }

    #[test]
    fn test_safe_move_is_unprobed_safe_cell() {
        let mut engine = InferenceEngine::new(Bounds::new(3, 3));
        engine.add_observation(Cell::new(0, 0), 0).unwrap();

        let before = engine.clone();
        let cell = engine.make_safe_move().unwrap();
        assert!(engine.knowledge().known_safe().contains(&cell));
        assert!(!engine.knowledge().moves_made().contains(&cell));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_random_move_avoids_moves_and_mines() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = InferenceEngine::new(Bounds::new(3, 3));
        engine.add_observation(Cell::new(1, 1), 2).unwrap();
        engine.mark_mine(Cell::new(0, 0)).unwrap();
        engine.mark_mine(Cell::new(2, 2)).unwrap();

        for _ in 0..200 {
            let cell = engine.make_random_move(&mut rng).unwrap();
            assert_ne!(cell, Cell::new(1, 1));
            assert_ne!(cell, Cell::new(0, 0));
            assert_ne!(cell, Cell::new(2, 2));
        }
    }

    #[test]
    fn test_random_move_exhausted() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = InferenceEngine::new(Bounds::new(1, 2));
        engine.add_observation(Cell::new(0, 0), 1).unwrap();

        // (0,1) is now a known mine and (0,0) was probed.
        assert_eq!(engine.make_random_move(&mut rng), None);
        assert_eq!(engine.next_move(&mut rng), None);
    }

    #[test]
    fn test_next_move_prefers_safe() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut engine = InferenceEngine::new(Bounds::new(5, 5));
        assert!(matches!(engine.next_move(&mut rng), Some(Move::Guess(_))));

        engine.add_observation(Cell::new(0, 0), 0).unwrap();
        let next = engine.next_move(&mut rng).unwrap();
        assert!(matches!(next, Move::Safe(_)));
        assert!(engine.knowledge().known_safe().contains(&next.cell()));
    }
}
