use super::process::{run_with_timeout, ProcessError};
use super::{ScoreError, Scorer};
use crate::engine::config::ScoreOptions;
use crate::engine::grid::GridBox;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// How long an availability probe may take before the engine is declared absent.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Vina 1.2.x results table: mode 1's affinity is the reported score.
static TABLE_AFFINITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*1\s+([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)\s").unwrap()
});

/// Legacy pattern: a numeric value followed by the kcal/mol unit.
static LEGACY_AFFINITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)\s+kcal/mol").unwrap()
});

/// The mandatory primary docking engine: AutoDock Vina.
///
/// Runs a full docking pass (pose generation plus scoring); the best mode's
/// affinity is the engine's verdict and the pose file lands next to the
/// prepared ligand.
pub struct VinaScorer {
    executable: PathBuf,
}

impl VinaScorer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for VinaScorer {
    fn default() -> Self {
        Self::new("vina")
    }
}

pub(crate) fn probe_help(executable: &Path) -> bool {
    let mut command = Command::new(executable);
    command.arg("--help");
    run_with_timeout(&mut command, PROBE_TIMEOUT).is_ok()
}

pub(crate) fn map_process_error(error: ProcessError) -> ScoreError {
    match error {
        ProcessError::Spawn(e) => ScoreError::Unavailable(e.to_string()),
        ProcessError::Timeout(limit) => ScoreError::Timeout(limit),
        ProcessError::Io(e) => ScoreError::Io(e),
    }
}

/// Parses the binding affinity from a Vina-family report.
pub(crate) fn parse_vina_affinity(output: &str) -> Result<f64, ScoreError> {
    if let Some(captures) = TABLE_AFFINITY.captures(output) {
        if let Ok(affinity) = captures[1].parse::<f64>() {
            return Ok(affinity);
        }
    }
    if let Some(captures) = LEGACY_AFFINITY.captures(output) {
        if let Ok(affinity) = captures[1].parse::<f64>() {
            return Ok(affinity);
        }
    }
    Err(ScoreError::ParseFailure(
        "no affinity found in engine report".to_string(),
    ))
}

impl Scorer for VinaScorer {
    fn name(&self) -> &str {
        "vina"
    }

    fn is_available(&self) -> bool {
        probe_help(&self.executable)
    }

    fn score(
        &self,
        receptor: &Path,
        ligand: &Path,
        grid: &GridBox,
        options: &ScoreOptions,
    ) -> Result<f64, ScoreError> {
        let pose_output = docked_pose_path(ligand);

        let mut command = Command::new(&self.executable);
        command
            .arg("--receptor")
            .arg(receptor)
            .arg("--ligand")
            .arg(ligand)
            .arg("--out")
            .arg(&pose_output)
            .arg("--cpu")
            .arg(options.cpu.to_string())
            .arg("--num_modes")
            .arg(options.num_modes.to_string())
            .arg("--exhaustiveness")
            .arg(options.exhaustiveness.to_string());
        if let Some(flex) = &options.flexible_residues {
            command.arg("--flex").arg(flex);
        }
        command.args(grid.to_engine_args());

        debug!(engine = self.name(), ?command, "Invoking docking engine");
        let run = run_with_timeout(&mut command, options.timeout).map_err(map_process_error)?;
        if !run.status_success {
            return Err(ScoreError::ExecutionFailed(run.stderr.trim().to_string()));
        }

        let affinity = parse_vina_affinity(&run.combined())?;
        info!(
            engine = self.name(),
            affinity,
            pose = %pose_output.display(),
            "Docking completed"
        );
        Ok(affinity)
    }
}

/// The generated pose sits next to the prepared ligand, which lives in the
/// docking call's scratch directory and is cleaned up with it.
fn docked_pose_path(ligand: &Path) -> PathBuf {
    let stem = ligand
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ligand");
    ligand.with_file_name(format!("{stem}_docked.pdbqt"))
}
