use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::MolecularSystem;
use crate::engine::relax::{MinimizeError, Minimizer, RestraintSpec};
use crate::engine::scoring::process::{run_with_timeout, ProcessError};
use crate::engine::scoring::vina::probe_help;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

const MINIMIZE_TIMEOUT: Duration = Duration::from_secs(600);

/// [`Minimizer`] backed by an external minimization engine executable.
///
/// The structure is written to a scratch PDB, the engine is invoked with the
/// force field, iteration cap, and optional backbone restraint, and the
/// minimized structure is read back. The engine owns all the numerics; this
/// type owns the invocation contract and the cleanup guarantees.
pub struct ExternalMinimizer {
    executable: PathBuf,
    force_field: String,
}

impl ExternalMinimizer {
    pub fn new(executable: impl Into<PathBuf>, force_field: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            force_field: force_field.into(),
        }
    }
}

impl Default for ExternalMinimizer {
    /// The conventional engine setup: an `mdmin` wrapper with the AMBER14
    /// force field and implicit solvent.
    fn default() -> Self {
        Self::new("mdmin", "amber14-implicit")
    }
}

impl Minimizer for ExternalMinimizer {
    fn name(&self) -> &str {
        "mdmin"
    }

    fn is_available(&self) -> bool {
        probe_help(&self.executable)
    }

    fn minimize(
        &self,
        structure: &MolecularSystem,
        restraints: &RestraintSpec,
        max_iterations: usize,
    ) -> Result<MolecularSystem, MinimizeError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("input.pdb");
        let output = scratch.path().join("minimized.pdb");

        PdbFile::write_to_path(structure, &input)
            .map_err(|e| MinimizeError::Failed(format!("could not stage input structure: {e}")))?;

        let mut command = Command::new(&self.executable);
        command
            .arg("--in")
            .arg(&input)
            .arg("--out")
            .arg(&output)
            .arg("--force-field")
            .arg(&self.force_field)
            .arg("--max-iterations")
            .arg(max_iterations.to_string());
        if restraints.is_active() {
            command
                .arg("--restrain-atoms")
                .arg(restraints.anchor_atoms.join(","))
                .arg("--stiffness")
                .arg(restraints.stiffness.to_string());
        }

        debug!(engine = self.name(), ?command, "Invoking physics engine");
        let run = match run_with_timeout(&mut command, MINIMIZE_TIMEOUT) {
            Ok(run) => run,
            Err(ProcessError::Spawn(e)) => return Err(MinimizeError::Unavailable(e.to_string())),
            Err(ProcessError::Timeout(limit)) => {
                return Err(MinimizeError::Failed(format!(
                    "minimization exceeded the {limit:?} time limit"
                )));
            }
            Err(ProcessError::Io(e)) => return Err(MinimizeError::Io(e)),
        };
        if !run.status_success {
            return Err(MinimizeError::Failed(run.stderr.trim().to_string()));
        }

        let minimized = PdbFile::read_from_path(&output)
            .map_err(|e| MinimizeError::Failed(format!("engine wrote an unreadable structure: {e}")))?;
        info!(
            engine = self.name(),
            atoms = minimized.atom_count(),
            "Minimized structure read back"
        );
        Ok(minimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_engine_is_not_available() {
        let minimizer = ExternalMinimizer::new("definitely-not-mdmin-mutadock", "amber14");
        assert!(!minimizer.is_available());
    }

    #[test]
    fn minimize_with_missing_engine_reports_unavailable() {
        let minimizer = ExternalMinimizer::new("definitely-not-mdmin-mutadock", "amber14");
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', crate::core::models::chain::ChainType::Protein);
        let residue = system.add_residue(chain, 1, "GLY").unwrap();
        let atom = crate::core::models::atom::Atom::new(
            "CA",
            residue,
            nalgebra::Point3::origin(),
        );
        system.add_atom_to_residue(residue, atom).unwrap();

        let result = minimizer.minimize(&system, &RestraintSpec::backbone(0.0), 100);
        assert!(matches!(result, Err(MinimizeError::Unavailable(_))));
    }
}
