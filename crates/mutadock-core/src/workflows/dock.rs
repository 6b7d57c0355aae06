use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::MolecularSystem;
use crate::engine::config::DockingConfig;
use crate::engine::consensus;
use crate::engine::convert::{Converter, MoleculeKind};
use crate::engine::error::EngineError;
use crate::engine::grid::compute_box;
use crate::engine::mutation::{apply_mutation, MutationSpec};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::relax::{relax, Minimizer, RelaxationRequest};
use crate::engine::scoring::registry::ScorerRegistry;
use crate::engine::scoring::{run_scorer, score_ensemble};
use crate::workflows::record::DockingRecord;
use crate::workflows::CancellationToken;
use nalgebra::Point3;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Inputs for one docking call.
#[derive(Debug, Clone)]
pub struct DockingInputs {
    /// Receptor structure, PDB format.
    pub receptor: PathBuf,
    /// Ligand structure; a `.pdbqt` file is used as-is, anything else is
    /// converted by the chemistry toolkit.
    pub ligand: PathBuf,
    /// Pocket center the search volume is built around, Angstroms.
    pub center: Point3<f64>,
    /// Optional single-residue substitution applied before docking.
    pub mutation: Option<MutationSpec>,
}

/// The external collaborators a docking call depends on, injected explicitly
/// so nothing reads ambient global state.
pub struct Collaborators<'a> {
    pub scorers: &'a ScorerRegistry,
    pub converter: &'a dyn Converter,
    pub minimizer: &'a dyn Minimizer,
}

/// Executes one complete docking call.
///
/// Stages run strictly in sequence: load → mutate (optional) → relax
/// (optional) → prepare → score → aggregate. The relaxation stage degrades
/// rather than fails; scoring backends fail individually; the only fatal
/// outcomes are invalid inputs and an ensemble with no usable affinity.
#[instrument(skip_all, name = "docking_workflow")]
pub fn run(
    inputs: &DockingInputs,
    config: &DockingConfig,
    collaborators: &Collaborators<'_>,
    reporter: &ProgressReporter<'_>,
    cancel: &CancellationToken,
) -> Result<DockingRecord, EngineError> {
    // === Stage 0: Load structures and derive the search volume ===
    reporter.report(Progress::StageStart { name: "Load" });
    let wild_type = PdbFile::read_from_path(&inputs.receptor)?;
    info!(
        receptor = %inputs.receptor.display(),
        atoms = wild_type.atom_count(),
        "Receptor loaded"
    );

    let ligand_points = load_ligand_geometry(&inputs.ligand);
    let grid = compute_box(inputs.center, ligand_points.as_deref(), &config.grid)?;
    info!(
        center = ?(grid.center.x, grid.center.y, grid.center.z),
        size = ?(grid.size.x, grid.size.y, grid.size.z),
        "Search volume computed"
    );
    reporter.report(Progress::StageFinish);

    // === Stage 1: Mutation (optional) ===
    check_cancelled(cancel, "mutation")?;
    let (working, mutation_label) = match &inputs.mutation {
        Some(spec) => {
            reporter.report(Progress::StageStart { name: "Mutation" });
            let mutated = apply_mutation(&wild_type, spec)?;
            reporter.report(Progress::StageFinish);
            (mutated, Some(spec.to_string()))
        }
        None => (wild_type, None),
    };

    // === Stage 2: Relaxation (optional, never fatal) ===
    check_cancelled(cancel, "relaxation")?;
    let (working, relaxation) = match &config.relaxation {
        Some(settings) => {
            reporter.report(Progress::StageStart { name: "Relaxation" });
            let request = RelaxationRequest::new(&working, settings);
            let outcome = relax(&request, collaborators.minimizer);
            let summary = (outcome.status, outcome.stiffness);
            if !outcome.relaxed() {
                reporter.report(Progress::StageSkipped {
                    name: "Relaxation",
                    reason: outcome.status.to_string(),
                });
            } else {
                reporter.report(Progress::StageFinish);
            }
            (outcome.structure, Some(summary))
        }
        None => (working, None),
    };

    // === Stage 3: Preparation (conversion into engine-ready formats) ===
    check_cancelled(cancel, "preparation")?;
    reporter.report(Progress::StageStart { name: "Preparation" });
    let scratch = tempfile::tempdir()?;

    let staged_receptor = scratch.path().join("receptor.pdb");
    PdbFile::write_to_path(&working, &staged_receptor)?;
    let prepared_receptor = collaborators.converter.convert(
        &staged_receptor,
        &scratch.path().join("receptor.pdbqt"),
        MoleculeKind::Receptor,
        &config.conversion,
    )?;

    let prepared_ligand = if is_prepared(&inputs.ligand) {
        info!(ligand = %inputs.ligand.display(), "Using pre-prepared ligand");
        inputs.ligand.clone()
    } else {
        collaborators.converter.convert(
            &inputs.ligand,
            &scratch.path().join("ligand.pdbqt"),
            MoleculeKind::Ligand,
            &config.conversion,
        )?
    };
    reporter.report(Progress::StageFinish);

    // === Stage 4: Scoring ===
    check_cancelled(cancel, "scoring")?;
    reporter.report(Progress::StageStart { name: "Scoring" });
    let results = if config.consensus.is_some() {
        score_ensemble(
            collaborators.scorers,
            &prepared_receptor,
            &prepared_ligand,
            &grid,
            &config.score,
            config.plausibility_bound,
        )
    } else {
        vec![run_scorer(
            collaborators.scorers.primary(),
            &prepared_receptor,
            &prepared_ligand,
            &grid,
            &config.score,
            config.plausibility_bound,
        )]
    };
    reporter.report(Progress::StageFinish);

    // === Stage 5: Aggregation and the result record ===
    let verdict = consensus::aggregate(
        results,
        config.consensus,
        collaborators.scorers.primary_name(),
    )?;

    let record = DockingRecord::new(
        &inputs.receptor,
        &inputs.ligand,
        mutation_label,
        relaxation,
        collaborators.scorers.primary_name(),
        &verdict,
    );
    info!(
        primary_affinity = record.primary_affinity,
        consensus_affinity = ?record.consensus_affinity,
        "Docking call complete"
    );
    Ok(record)
}

fn check_cancelled(cancel: &CancellationToken, stage: &'static str) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        warn!(stage, "Docking call cancelled");
        return Err(EngineError::Cancelled { stage });
    }
    Ok(())
}

fn is_prepared(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdbqt"))
}

/// Reads the ligand's atom positions for grid sizing. A ligand that cannot be
/// parsed is not fatal here: the box falls back to its default size and the
/// scoring engines will judge the file themselves.
fn load_ligand_geometry(path: &Path) -> Option<Vec<Point3<f64>>> {
    match PdbFile::read_from_path(path) {
        Ok(system) => Some(
            system
                .atoms_iter()
                .map(|(_, atom)| atom.position)
                .collect(),
        ),
        Err(e) => {
            warn!(
                ligand = %path.display(),
                error = %e,
                "Could not read ligand geometry; using the default box size"
            );
            None
        }
    }
}
