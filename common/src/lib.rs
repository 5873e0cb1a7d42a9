//! A logical minesweeper player.
//!
//! The player keeps a knowledge base of sentences of the form "exactly
//! `n` of these cells are mines", derived from the counts the board
//! reports for each revealed cell. After every observation it runs direct
//! and subset inference until nothing more can be derived, then probes a
//! proven-safe cell or, failing that, guesses.
//!
//! ```
//! use minesweeper_ai::{Bounds, Cell, InferenceEngine};
//!
//! let mut engine = InferenceEngine::new(Bounds::new(3, 3));
//! engine.add_observation(Cell::new(0, 0), 0)?;
//! assert!(engine.make_safe_move().is_some());
//! # Ok::<(), minesweeper_ai::EngineError>(())
//! ```

pub mod audit;
pub mod cell;
pub mod config;
pub mod error;
pub mod game;
pub mod inference;
pub mod knowledge;
pub mod selector;
pub mod sentence;
pub mod session;

pub use audit::{Audit, DeducedState, audit};
pub use cell::{Bounds, Cell};
pub use config::{Config, SubsetStrategy};
pub use error::EngineError;
pub use game::{Game, GameState, Reveal};
pub use inference::{Deductions, InferenceEngine, Observation};
pub use knowledge::KnowledgeBase;
pub use selector::Move;
pub use sentence::Sentence;
pub use session::{Session, Turn};
