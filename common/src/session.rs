use crate::cell::Cell;
use crate::config::Config;
use crate::game::{Game, GameState, Reveal};
use crate::inference::{Deductions, InferenceEngine};
use crate::selector::Move;
use rand::Rng;
use tracing::{debug, info};

/// One probe and what came of it.
#[derive(Debug, Clone)]
pub struct Turn {
    pub mv: Move,
    pub reveal: Reveal,
    pub deductions: Deductions,
}

/// A game paired with the player reasoning about it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub game: Game,
    pub engine: InferenceEngine,
    pub moves: usize,
}

impl Session {
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> anyhow::Result<Self> {
        let game = Game::new(config, rng)?;
        Ok(Self::from_game(game, config))
    }

    pub fn from_game(game: Game, config: &Config) -> Self {
        let engine = InferenceEngine::with_strategy(game.bounds(), config.strategy);
        Session {
            game,
            engine,
            moves: 0,
        }
    }

    /// Deserializes a session from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the session to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Lets the player pick and probe one cell. Returns `None` once the
    /// game is over or no move is left.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<Option<Turn>> {
        if self.game.game_state != GameState::Playing {
            return Ok(None);
        }
        let Some(mv) = self.engine.next_move(rng) else {
            return Ok(None);
        };
        let turn = self.probe(mv)?;
        Ok(Some(turn))
    }

    /// Probes a cell chosen outside the engine, e.g. by a human player.
    pub fn reveal(&mut self, cell: Cell) -> anyhow::Result<Turn> {
        let cell = self.game.bounds().check(cell)?;
        let mv = if self.engine.knowledge().known_safe().contains(&cell) {
            Move::Safe(cell)
        } else {
            Move::Guess(cell)
        };
        self.probe(mv)
    }

    /// Plays until the game ends or the player runs out of moves.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<GameState> {
        while self.step(rng)?.is_some() {}
        Ok(self.game.game_state)
    }

    fn probe(&mut self, mv: Move) -> anyhow::Result<Turn> {
        let cell = mv.cell();
        self.moves += 1;

        let reveal = self.game.reveal(cell)?;
        let deductions = match reveal {
            Reveal::Mine => {
                info!(%cell, moves = self.moves, "hit a mine");
                Deductions::default()
            }
            Reveal::Clear(count) => {
                let deductions = self.engine.add_observation(cell, count)?;
                for &mine in &deductions.mines {
                    if self.game.game_state != GameState::Playing {
                        break;
                    }
                    self.game.flag(mine)?;
                }
                deductions
            }
        };

        debug!(
            ?mv,
            safes = deductions.safes.len(),
            mines = deductions.mines.len(),
            state = ?self.game.game_state,
            "turn"
        );
        Ok(Turn {
            mv,
            reveal,
            deductions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_mine_free_board_is_won_from_one_guess() {
        let game = Game::with_mines(4, 5, Vec::new()).unwrap();
        let mut session = Session::from_game(game, &Config::default());
        let mut rng = StdRng::seed_from_u64(0);

        let first = session.step(&mut rng).unwrap().unwrap();
        assert!(matches!(first.mv, Move::Guess(_)));

        assert_eq!(session.play(&mut rng).unwrap(), GameState::Won);
        assert_eq!(session.moves, 20);
    }

    #[test]
    fn test_safe_moves_never_hit_mines() {
        for seed in 0..25 {
            let config = Config {
                height: 8,
                width: 8,
                mines: 10,
                seed: Some(seed),
                ..Config::default()
            };
            let mut rng = config.rng();
            let mut session = Session::new(&config, &mut rng).unwrap();

            while let Some(turn) = session.step(&mut rng).unwrap() {
                if let Move::Safe(_) = turn.mv {
                    assert_ne!(turn.reveal, Reveal::Mine);
                }
                for mine in &turn.deductions.mines {
                    assert!(session.game.is_mine(*mine));
                    assert!(
                        session.game.is_flagged(*mine)
                            || session.game.game_state == GameState::Won
                    );
                }
                session.engine.knowledge().verify().unwrap();
            }
            assert_ne!(session.game.game_state, GameState::Playing);
        }
    }

    #[test]
    fn test_manual_reveal_feeds_engine() {
        let game = Game::with_mines(3, 3, [Cell::new(2, 2)]).unwrap();
        let mut session = Session::from_game(game, &Config::default());

        let turn = session.reveal(Cell::new(0, 0)).unwrap();
        assert_eq!(turn.reveal, Reveal::Clear(0));
        assert_eq!(turn.deductions.safes.len(), 3);
        assert!(matches!(session.reveal(Cell::new(0, 1)).unwrap().mv, Move::Safe(_)));
        assert!(session.reveal(Cell::new(5, 5)).is_err());
    }

    #[test]
    fn test_winning_reveal_skips_flagging() {
        let game = Game::with_mines(1, 3, [Cell::new(0, 2)]).unwrap();
        let mut session = Session::from_game(game, &Config::default());

        session.reveal(Cell::new(0, 0)).unwrap();
        // The last safe cell ends the game and proves the mine at once.
        let turn = session.reveal(Cell::new(0, 1)).unwrap();
        assert!(turn.deductions.mines.contains(&Cell::new(0, 2)));
        assert_eq!(session.game.game_state, GameState::Won);
        assert!(!session.game.is_flagged(Cell::new(0, 2)));
    }

    #[test]
    fn test_serialization_resumes_play() {
        let config = Config {
            height: 6,
            width: 6,
            mines: 5,
            seed: Some(42),
            ..Config::default()
        };
        let mut rng = config.rng();
        let mut session = Session::new(&config, &mut rng).unwrap();
        session.step(&mut rng).unwrap();

        let restored = Session::deserialize(&session.serialize().unwrap()).unwrap();
        assert_eq!(restored, session);
    }
}
