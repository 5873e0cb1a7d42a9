use crate::cell::Bounds;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// How the subset rule is applied inside one propagation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SubsetStrategy {
    /// Derive a single sentence, then go back to direct inference.
    #[default]
    OnePerPass,
    /// Derive every subset sentence reachable in the pass before rescanning.
    Exhaustive,
}

/// Parameters for a game session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    /// Fixes mine placement and guesses for reproducible runs.
    pub seed: Option<u64>,
    pub strategy: SubsetStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
            strategy: SubsetStrategy::default(),
        }
    }
}

impl Config {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.height, self.width)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.height == 0 || self.width == 0 {
            anyhow::bail!("board must have at least one row and one column");
        }
        if self.mines >= self.height * self.width {
            anyhow::bail!("total mines must be less than the number of cells on the board");
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_default_matches_classic_board() {
        let config = Config::default();
        assert_eq!(config.bounds(), Bounds::new(8, 8));
        assert_eq!(config.mines, 8);
        assert_eq!(config.strategy, SubsetStrategy::OnePerPass);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_full_board() {
        let config = Config {
            height: 3,
            width: 3,
            mines: 9,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let empty = Config {
            height: 0,
            ..Config::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = Config {
            seed: Some(7),
            ..Config::default()
        };
        let a: u64 = config.rng().random();
        let b: u64 = config.rng().random();
        assert_eq!(a, b);
    }
}
