//! Scoring-backend abstraction.
//!
//! A family of named backends, each reducing a fixed (receptor, ligand,
//! grid box) triple to a single affinity. Exactly one backend, the primary
//! engine, must be available; the rest are optional, auto-detected once at
//! startup by [`registry::ScorerRegistry`], and simply excluded when absent.
//! A backend that crashes, times out, or reports an implausible value is
//! recorded as failed without disturbing its siblings.

pub mod peers;
pub mod process;
pub mod registry;
pub mod vina;

use crate::engine::config::ScoreOptions;
use crate::engine::grid::GridBox;
use registry::ScorerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("engine executable is not available: {0}")]
    Unavailable(String),

    #[error("engine invocation failed: {0}")]
    ExecutionFailed(String),

    #[error("engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not parse an affinity from engine output: {0}")]
    ParseFailure(String),

    #[error("I/O error during scoring: {0}")]
    Io(#[from] std::io::Error),
}

/// One backend's verdict for one docking call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub engine: String,
    /// Predicted binding free energy, kcal/mol; `None` when the backend failed.
    pub affinity: Option<f64>,
    /// Captured failure detail; `None` on success.
    pub error: Option<String>,
}

impl ScoringResult {
    pub fn success(engine: impl Into<String>, affinity: f64) -> Self {
        Self {
            engine: engine.into(),
            affinity: Some(affinity),
            error: None,
        }
    }

    pub fn failure(engine: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            affinity: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.affinity.is_some()
    }
}

/// A scoring backend. Implementations wrap one external engine executable.
pub trait Scorer: Send + Sync {
    /// Stable engine name used in registries, records, and logs.
    fn name(&self) -> &str;

    /// Probes whether the backing executable is present and responsive.
    /// Called once at startup by the registry, never per docking call.
    fn is_available(&self) -> bool;

    /// Scores one receptor/ligand pair inside `grid`.
    fn score(
        &self,
        receptor: &Path,
        ligand: &Path,
        grid: &GridBox,
        options: &ScoreOptions,
    ) -> Result<f64, ScoreError>;
}

/// Runs one backend and folds every failure mode into a [`ScoringResult`].
///
/// Affinities that are non-finite or whose magnitude exceeds
/// `plausibility_bound` are backend failures, not scores: extreme positive
/// energies from steric explosions must never enter the consensus.
pub fn run_scorer(
    scorer: &dyn Scorer,
    receptor: &Path,
    ligand: &Path,
    grid: &GridBox,
    options: &ScoreOptions,
    plausibility_bound: f64,
) -> ScoringResult {
    match scorer.score(receptor, ligand, grid, options) {
        Ok(affinity) if !affinity.is_finite() => {
            warn!(engine = scorer.name(), "Backend reported a non-finite affinity");
            ScoringResult::failure(scorer.name(), "reported a non-finite affinity")
        }
        Ok(affinity) if affinity.abs() > plausibility_bound => {
            warn!(
                engine = scorer.name(),
                affinity, plausibility_bound, "Backend affinity outside plausibility window"
            );
            ScoringResult::failure(
                scorer.name(),
                format!(
                    "affinity {affinity:.2} kcal/mol outside the plausibility window (|dG| <= {plausibility_bound})"
                ),
            )
        }
        Ok(affinity) => {
            info!(engine = scorer.name(), affinity, "Backend score");
            ScoringResult::success(scorer.name(), affinity)
        }
        Err(e) => {
            warn!(engine = scorer.name(), error = %e, "Backend failed");
            ScoringResult::failure(scorer.name(), e.to_string())
        }
    }
}

/// Invokes every backend in the registry against the same prepared inputs.
///
/// Backend invocations are independent of one another; results are collected
/// into a name-keyed map first so that aggregation stays deterministic
/// regardless of completion order, then emitted in registry order.
pub fn score_ensemble(
    registry: &ScorerRegistry,
    receptor: &Path,
    ligand: &Path,
    grid: &GridBox,
    options: &ScoreOptions,
    plausibility_bound: f64,
) -> Vec<ScoringResult> {
    let mut by_name: BTreeMap<String, ScoringResult> = BTreeMap::new();
    for scorer in registry.iter() {
        let result = run_scorer(scorer, receptor, ligand, grid, options, plausibility_bound);
        by_name.insert(result.engine.clone(), result);
    }

    registry
        .names()
        .filter_map(|name| by_name.remove(name))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Scorer double driven entirely by a canned response.
    pub struct FakeScorer {
        pub name: String,
        pub available: bool,
        pub response: Result<f64, String>,
    }

    impl FakeScorer {
        pub fn returning(name: &str, affinity: f64) -> Self {
            Self {
                name: name.to_string(),
                available: true,
                response: Ok(affinity),
            }
        }

        pub fn failing(name: &str, error: &str) -> Self {
            Self {
                name: name.to_string(),
                available: true,
                response: Err(error.to_string()),
            }
        }

        pub fn absent(name: &str) -> Self {
            Self {
                name: name.to_string(),
                available: false,
                response: Err("not installed".to_string()),
            }
        }
    }

    impl Scorer for FakeScorer {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn score(
            &self,
            _receptor: &Path,
            _ligand: &Path,
            _grid: &GridBox,
            _options: &ScoreOptions,
        ) -> Result<f64, ScoreError> {
            self.response
                .clone()
                .map_err(ScoreError::ExecutionFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeScorer;
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn grid() -> GridBox {
        GridBox {
            center: Point3::origin(),
            size: Vector3::new(20.0, 20.0, 20.0),
        }
    }

    fn run(scorer: &dyn Scorer, bound: f64) -> ScoringResult {
        run_scorer(
            scorer,
            Path::new("receptor.pdbqt"),
            Path::new("ligand.pdbqt"),
            &grid(),
            &ScoreOptions::default(),
            bound,
        )
    }

    #[test]
    fn successful_score_is_recorded_with_affinity() {
        let scorer = FakeScorer::returning("vina", -7.43);
        let result = run(&scorer, 50.0);
        assert!(result.succeeded());
        assert_eq!(result.affinity, Some(-7.43));
        assert_eq!(result.error, None);
    }

    #[test]
    fn backend_error_is_captured_not_propagated() {
        let scorer = FakeScorer::failing("gnina", "process crashed");
        let result = run(&scorer, 50.0);
        assert!(!result.succeeded());
        assert!(result.error.as_deref().unwrap().contains("process crashed"));
    }

    #[test]
    fn implausible_affinity_is_a_backend_failure() {
        let scorer = FakeScorer::returning("vina", 9_000.0);
        let result = run(&scorer, 50.0);
        assert!(!result.succeeded());
        assert!(result.error.as_deref().unwrap().contains("plausibility"));
    }

    #[test]
    fn non_finite_affinity_is_a_backend_failure() {
        let scorer = FakeScorer::returning("vina", f64::NAN);
        let result = run(&scorer, 50.0);
        assert!(!result.succeeded());
    }

    #[test]
    fn boundary_affinity_is_still_plausible() {
        let scorer = FakeScorer::returning("vina", -50.0);
        let result = run(&scorer, 50.0);
        assert!(result.succeeded());
    }
}
