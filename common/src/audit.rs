//! Cross-checks the rule engine against a SAT solver.
//!
//! Every observation the engine received is re-encoded as an exact
//! cardinality constraint over the observed cell's unrevealed neighbors,
//! without any of the engine's derived state. Each frontier cell is then
//! tested under both assumptions. A cell the engine proved but the solver
//! does not force is unsound; a cell the solver forces but the engine left
//! open is merely missed (pairwise rules are incomplete).

use crate::cell::Cell;
use crate::inference::InferenceEngine;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// The possible outcomes of the solver's analysis for a single hidden cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // All valid layouts put a mine here.
    ForcedSafe,   // No valid layout puts a mine here.
    Undetermined, // Valid layouts exist either way.
}

#[derive(Debug, Clone, Default)]
pub struct Audit {
    /// Solver verdict for every unrevealed cell next to an observation.
    pub deductions: BTreeMap<Cell, DeducedState>,
    /// Cells the engine proved that the solver does not force.
    pub unsound: BTreeSet<Cell>,
    /// Cells the solver forces that the engine has not proven.
    pub missed: BTreeSet<Cell>,
}

impl Audit {
    pub fn is_sound(&self) -> bool {
        self.unsound.is_empty()
    }
}

/// Runs the SAT cross-check over everything `engine` has observed.
pub fn audit(engine: &InferenceEngine) -> anyhow::Result<Audit> {
    let bounds = engine.bounds();
    let kb = engine.knowledge();
    let probed = kb.moves_made();

    let mut solver = Solver::new();
    let mut var_map: BTreeMap<Cell, Var> = BTreeMap::new();
    let mut formula = CnfFormula::new();

    for observation in engine.observations() {
        let lits: Vec<Lit> = bounds
            .neighbors(observation.cell)
            .filter(|n| !probed.contains(n))
            .map(|n| {
                let var = *var_map.entry(n).or_insert_with(|| solver.new_var());
                Lit::from_var(var, true)
            })
            .collect();
        encode_exactly_k(&mut formula, &lits, observation.count as usize);
    }
    solver.add_formula(&formula);

    if !solver.solve()? {
        anyhow::bail!("observations admit no mine layout");
    }

    let mut report = Audit::default();
    for (&cell, &var) in &var_map {
        let mine_possible = solvable_with(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = solvable_with(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision"),
        };
        report.deductions.insert(cell, state);

        let engine_mine = kb.known_mines().contains(&cell);
        let engine_safe = kb.known_safe().contains(&cell);
        match state {
            DeducedState::ForcedMine if engine_safe => report.unsound.insert(cell),
            DeducedState::ForcedSafe if engine_mine => report.unsound.insert(cell),
            DeducedState::Undetermined if engine_mine || engine_safe => report.unsound.insert(cell),
            DeducedState::ForcedMine if !engine_mine => report.missed.insert(cell),
            DeducedState::ForcedSafe if !engine_safe => report.missed.insert(cell),
            _ => false,
        };
    }

    if !report.is_sound() {
        warn!(unsound = ?report.unsound, "engine facts not forced by observations");
    }
    Ok(report)
}

fn solvable_with(solver: &mut Solver, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve()?;
    solver.assume(&[]);
    Ok(result)
}

/// Exactly `k` of `lits` are true. Neighborhoods hold at most eight
/// cells, so the pairwise-combination encoding stays small.
fn encode_exactly_k(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k > lits.len() {
        // Unsatisfiable.
        formula.add_clause(&[]);
        return;
    }

    // At most k: every (k+1)-subset has a false literal.
    for combo in lits.iter().copied().combinations(k + 1) {
        let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
        formula.add_clause(&clause);
    }

    // At least k: every (n-k+1)-subset has a true literal.
    if k > 0 {
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Bounds;
    use crate::config::Config;
    use crate::session::Session;

    #[test]
    fn test_simple_analysis() {
        let mut engine = InferenceEngine::new(Bounds::new(1, 3));
        // The middle cell sees one mine between the two ends.
        engine.add_observation(Cell::new(0, 1), 1).unwrap();

        let report = audit(&engine).unwrap();
        assert_eq!(
            report.deductions.get(&Cell::new(0, 0)),
            Some(&DeducedState::Undetermined)
        );
        assert_eq!(
            report.deductions.get(&Cell::new(0, 2)),
            Some(&DeducedState::Undetermined)
        );
        assert!(report.is_sound());
        assert!(report.missed.is_empty());
    }

    #[test]
    fn test_forced_cells_agree_with_engine() {
        let mut engine = InferenceEngine::new(Bounds::new(3, 3));
        engine.add_observation(Cell::new(1, 1), 8).unwrap();

        let report = audit(&engine).unwrap();
        assert_eq!(report.deductions.len(), 8);
        assert!(
            report
                .deductions
                .values()
                .all(|&s| s == DeducedState::ForcedMine)
        );
        assert!(report.is_sound());
        assert!(report.missed.is_empty());
    }

    #[test]
    fn test_played_games_are_sound() {
        for seed in 0..15 {
            let config = Config {
                height: 7,
                width: 7,
                mines: 8,
                seed: Some(seed),
                ..Config::default()
            };
            let mut rng = config.rng();
            let mut session = Session::new(&config, &mut rng).unwrap();
            while session.step(&mut rng).unwrap().is_some() {
                assert!(audit(&session.engine).unwrap().is_sound());
            }
        }
    }
}
