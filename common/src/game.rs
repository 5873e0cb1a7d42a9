use crate::cell::{Bounds, Cell};
use crate::config::Config;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeMap, BTreeSet};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// What the board reports back when a cell is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Mine,
    /// The number of mines among the cell's neighbors.
    Clear(u8),
}

/// The hidden minefield the player probes. It knows where every mine is
/// and answers reveals; the player only ever sees the counts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub height: usize,
    pub width: usize,
    mines: BTreeSet<Cell>,
    /// Revealed cells and their adjacent mine counts.
    revealed: BTreeMap<Cell, u8>,
    /// Cells the player has flagged as mines.
    flagged: BTreeSet<Cell>,
    pub game_state: GameState,
}

impl Game {
    /// Places `config.mines` mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> anyhow::Result<Self> {
        config.validate()?;
        let cells: Vec<Cell> = config.bounds().cells().collect();
        let mines = cells.choose_multiple(rng, config.mines).copied();
        Self::with_mines(config.height, config.width, mines)
    }

    /// A board with a fixed mine layout.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> anyhow::Result<Self> {
        let bounds = Bounds::new(height, width);
        let mines: BTreeSet<Cell> = mines
            .into_iter()
            .map(|c| bounds.check(c))
            .collect::<Result<_, _>>()?;
        if mines.len() >= bounds.len() {
            anyhow::bail!("total mines must be less than the number of cells on the board");
        }
        Ok(Game {
            height,
            width,
            mines,
            revealed: BTreeMap::new(),
            flagged: BTreeSet::new(),
            game_state: GameState::Playing,
        })
    }

    /// Deserializes a game state from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.height, self.width)
    }

    pub fn total_mines(&self) -> usize {
        self.mines.len()
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// The revealed count at `cell`, if it has been revealed.
    pub fn revealed(&self, cell: Cell) -> Option<u8> {
        self.revealed.get(&cell).copied()
    }

    pub fn is_flagged(&self, cell: Cell) -> bool {
        self.flagged.contains(&cell)
    }

    /// Number of mines within one row and column of `cell`, not
    /// including the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> u8 {
        self.bounds()
            .neighbors(cell)
            .filter(|n| self.is_mine(*n))
            .count() as u8
    }

    /// Probes a cell. Hitting a mine ends the game; revealing the last
    /// safe cell wins it. Re-probing a revealed cell repeats its count.
    pub fn reveal(&mut self, cell: Cell) -> anyhow::Result<Reveal> {
        self.bounds().check(cell)?;
        if let Some(count) = self.revealed(cell) {
            return Ok(Reveal::Clear(count));
        }
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        if self.is_mine(cell) {
            self.game_state = GameState::Lost;
            return Ok(Reveal::Mine);
        }

        let count = self.nearby_mines(cell);
        self.revealed.insert(cell, count);
        if self.won() {
            self.game_state = GameState::Won;
        }
        Ok(Reveal::Clear(count))
    }

    /// Flags a cell the player believes to be a mine.
    pub fn flag(&mut self, cell: Cell) -> anyhow::Result<()> {
        self.bounds().check(cell)?;
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }
        if self.revealed.contains_key(&cell) {
            anyhow::bail!("cannot flag revealed cell {cell}");
        }
        self.flagged.insert(cell);
        if self.won() {
            self.game_state = GameState::Won;
        }
        Ok(())
    }

    /// Won once every safe cell is revealed, or exactly the mines are flagged.
    pub fn won(&self) -> bool {
        let cleared = self.revealed.len() + self.mines.len() == self.bounds().len();
        cleared || (!self.mines.is_empty() && self.flagged == self.mines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_game_initialization() {
        let config = Config {
            height: 5,
            width: 6,
            mines: 7,
            seed: Some(1),
            ..Config::default()
        };
        let game = Game::new(&config, &mut config.rng()).unwrap();
        assert_eq!(game.bounds(), Bounds::new(5, 6));
        assert_eq!(game.total_mines(), 7);
        assert_eq!(game.game_state, GameState::Playing);
        assert!(game.bounds().cells().all(|c| game.revealed(c).is_none()));
    }

    #[test]
    fn test_game_initialization_too_many_mines() {
        let config = Config {
            height: 3,
            width: 3,
            mines: 9,
            ..Config::default()
        };
        assert!(Game::new(&config, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_nearby_mines() {
        let game = Game::with_mines(3, 3, [Cell::new(0, 0), Cell::new(2, 2)]).unwrap();
        assert_eq!(game.nearby_mines(Cell::new(1, 1)), 2);
        assert_eq!(game.nearby_mines(Cell::new(0, 1)), 1);
        assert_eq!(game.nearby_mines(Cell::new(2, 0)), 0);
        // A mine does not count itself.
        assert_eq!(game.nearby_mines(Cell::new(0, 0)), 0);
    }

    #[test]
    fn test_hitting_mine() {
        let mut game = Game::with_mines(2, 2, [Cell::new(1, 1)]).unwrap();
        assert_eq!(game.reveal(Cell::new(1, 1)).unwrap(), Reveal::Mine);
        assert_eq!(game.game_state, GameState::Lost);
        assert!(game.reveal(Cell::new(0, 0)).is_err());
    }

    #[test]
    fn test_flagging_after_loss_is_rejected() {
        let mut game = Game::with_mines(2, 2, [Cell::new(1, 1)]).unwrap();
        game.reveal(Cell::new(1, 1)).unwrap();

        // Every mine flagged would otherwise count as a win.
        assert!(game.flag(Cell::new(1, 1)).is_err());
        assert_eq!(game.game_state, GameState::Lost);
        assert!(!game.is_flagged(Cell::new(1, 1)));
    }

    #[test]
    fn test_revealing_all_safe_cells_wins() {
        let mut game = Game::with_mines(2, 2, [Cell::new(1, 1)]).unwrap();
        for cell in [Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0)] {
            assert_eq!(game.reveal(cell).unwrap(), Reveal::Clear(1));
        }
        assert_eq!(game.game_state, GameState::Won);
        // Repeats are harmless even after the game ends.
        assert_eq!(game.reveal(Cell::new(0, 0)).unwrap(), Reveal::Clear(1));
    }

    #[test]
    fn test_flagging_every_mine_wins() {
        let mut game = Game::with_mines(3, 3, [Cell::new(0, 2)]).unwrap();
        game.reveal(Cell::new(0, 0)).unwrap();
        game.flag(Cell::new(0, 2)).unwrap();
        assert_eq!(game.game_state, GameState::Won);
        assert!(game.flag(Cell::new(0, 0)).is_err());
    }

    #[test]
    fn test_serialization() {
        let mut game = Game::with_mines(4, 4, [Cell::new(3, 0), Cell::new(1, 2)]).unwrap();
        game.reveal(Cell::new(0, 0)).unwrap();
        game.flag(Cell::new(3, 0)).unwrap();

        let restored = Game::deserialize(&game.serialize().unwrap()).unwrap();
        assert_eq!(restored, game);
    }
}
