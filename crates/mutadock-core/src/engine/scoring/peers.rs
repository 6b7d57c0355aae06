//! Optional peer scoring engines.
//!
//! Each peer re-scores the same receptor/ligand pair with an independent
//! scoring function. Peers are auto-detected at startup and silently excluded
//! when their executable is absent; they are never a reason to fail a call.

use super::process::run_with_timeout;
use super::vina::{map_process_error, probe_help};
use super::{ScoreError, Scorer};
use crate::engine::config::ScoreOptions;
use crate::engine::grid::GridBox;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::debug;

static CNN_AFFINITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CNNaffinity\s*:\s*([-+]?\d+\.\d+)").unwrap());

static FIRST_FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([-+]?\d+\.\d+)").unwrap());

/// GNINA: CNN-based rescoring of the complex (score-only mode).
pub struct GninaScorer {
    executable: PathBuf,
}

impl GninaScorer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for GninaScorer {
    fn default() -> Self {
        Self::new("gnina")
    }
}

impl Scorer for GninaScorer {
    fn name(&self) -> &str {
        "gnina"
    }

    fn is_available(&self) -> bool {
        probe_help(&self.executable)
    }

    fn score(
        &self,
        receptor: &Path,
        ligand: &Path,
        _grid: &GridBox,
        options: &ScoreOptions,
    ) -> Result<f64, ScoreError> {
        let mut command = Command::new(&self.executable);
        command
            .arg("-r")
            .arg(receptor)
            .arg("-l")
            .arg(ligand)
            .arg("--score_only");

        debug!(engine = self.name(), ?command, "Invoking scoring engine");
        let run = run_with_timeout(&mut command, options.timeout).map_err(map_process_error)?;
        if !run.status_success {
            return Err(ScoreError::ExecutionFailed(run.stderr.trim().to_string()));
        }

        let output = run.combined();
        CNN_AFFINITY
            .captures(&output)
            .and_then(|captures| captures[1].parse::<f64>().ok())
            .ok_or_else(|| {
                ScoreError::ParseFailure("no CNNaffinity found in engine report".to_string())
            })
    }
}

/// RF-Score: random-forest rescoring. Output format varies by build, so the
/// first floating-point value in the report is taken as the prediction.
pub struct RfScorer {
    executable: PathBuf,
}

impl RfScorer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for RfScorer {
    fn default() -> Self {
        Self::new("rf_score")
    }
}

impl Scorer for RfScorer {
    fn name(&self) -> &str {
        "rf-score"
    }

    fn is_available(&self) -> bool {
        probe_help(&self.executable)
    }

    fn score(
        &self,
        receptor: &Path,
        ligand: &Path,
        _grid: &GridBox,
        options: &ScoreOptions,
    ) -> Result<f64, ScoreError> {
        let mut command = Command::new(&self.executable);
        command.arg(receptor).arg(ligand);

        debug!(engine = self.name(), ?command, "Invoking scoring engine");
        let run = run_with_timeout(&mut command, options.timeout).map_err(map_process_error)?;
        if !run.status_success {
            return Err(ScoreError::ExecutionFailed(run.stderr.trim().to_string()));
        }

        let output = run.combined();
        FIRST_FLOAT
            .captures(&output)
            .and_then(|captures| captures[1].parse::<f64>().ok())
            .ok_or_else(|| {
                ScoreError::ParseFailure("no numeric prediction found in engine report".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnn_affinity_pattern_matches_gnina_report() {
        let output = "CNNscore: 0.84\nCNNaffinity : -6.12\n";
        let captures = CNN_AFFINITY.captures(output).unwrap();
        assert_eq!(&captures[1], "-6.12");
    }

    #[test]
    fn first_float_pattern_picks_the_prediction() {
        let output = "predicted pKd equivalent: -5.90 (model v3)";
        let captures = FIRST_FLOAT.captures(output).unwrap();
        assert_eq!(&captures[1], "-5.90");
    }

    #[test]
    fn absent_peers_report_unavailable() {
        assert!(!GninaScorer::new("definitely-not-gnina-mutadock").is_available());
        assert!(!RfScorer::new("definitely-not-rf-mutadock").is_available());
    }
}
