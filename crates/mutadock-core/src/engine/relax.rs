use crate::core::models::atom::{AtomRole, RESTRAINT_ANCHOR_NAMES};
use crate::core::models::system::MolecularSystem;
use crate::engine::config::RelaxationSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MinimizeError {
    #[error("physics engine is not available: {0}")]
    Unavailable(String),

    #[error("minimization failed: {0}")]
    Failed(String),

    #[error("I/O error during minimization: {0}")]
    Io(#[from] std::io::Error),
}

/// Harmonic positional restraint applied during minimization.
///
/// When `stiffness` is positive, the named anchor atoms are bound toward their
/// pre-relaxation positions with the given spring constant while every other
/// atom stays fully free. The anchor list defaults to the three canonical
/// backbone atoms per residue; it is carried here as data so a per-residue
/// override can be added later without changing the [`Minimizer`] contract.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintSpec {
    /// Spring constant, kJ/mol/nm^2.
    pub stiffness: f64,
    /// Atom names bound by the restraint.
    pub anchor_atoms: Vec<String>,
}

impl RestraintSpec {
    /// The standard backbone restraint on N, CA, and C.
    pub fn backbone(stiffness: f64) -> Self {
        Self {
            stiffness,
            anchor_atoms: RESTRAINT_ANCHOR_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.stiffness > 0.0
    }
}

/// The physics-engine boundary.
///
/// Implementations wrap an external minimization engine; the pipeline never
/// integrates a force field itself. Minimization stops when the engine's
/// gradient tolerance is met or `max_iterations` is reached, whichever comes
/// first; hitting the cap is not an error, the best structure so far is
/// returned.
pub trait Minimizer {
    fn name(&self) -> &str;

    /// Whether the engine and its force field can be loaded at all.
    fn is_available(&self) -> bool;

    fn minimize(
        &self,
        structure: &MolecularSystem,
        restraints: &RestraintSpec,
        max_iterations: usize,
    ) -> Result<MolecularSystem, MinimizeError>;
}

/// One relaxation request. Created per mutation event, consumed once; the
/// result is a new structure and the original stays available for fallback.
#[derive(Debug, Clone, Copy)]
pub struct RelaxationRequest<'a> {
    pub structure: &'a MolecularSystem,
    /// Backbone restraint strength, kJ/mol/nm^2; 0 leaves the backbone free.
    pub stiffness: f64,
    pub max_iterations: usize,
}

impl<'a> RelaxationRequest<'a> {
    pub fn new(structure: &'a MolecularSystem, settings: &RelaxationSettings) -> Self {
        Self {
            structure,
            stiffness: settings.stiffness,
            max_iterations: settings.max_iterations,
        }
    }
}

/// Terminal state of the relaxation stage, carried in the result record so
/// every degraded path stays observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationStatus {
    /// Minimization ran and produced a usable structure.
    Relaxed,
    /// The input has nothing the physics engine can work on.
    SkippedIncompatibleInput,
    /// The engine or its force field could not be loaded.
    SkippedEngineUnavailable,
    /// The engine ran but diverged or errored; the original structure is used.
    FailedMinimization,
}

impl RelaxationStatus {
    pub fn relaxed(&self) -> bool {
        matches!(self, Self::Relaxed)
    }
}

impl fmt::Display for RelaxationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Relaxed => "relaxed",
            Self::SkippedIncompatibleInput => "skipped_incompatible_input",
            Self::SkippedEngineUnavailable => "skipped_engine_unavailable",
            Self::FailedMinimization => "failed_minimization",
        };
        write!(f, "{name}")
    }
}

/// What the relaxation stage produced: always a usable structure, plus the
/// terminal state that says whether it was actually relaxed.
#[derive(Debug, Clone)]
pub struct RelaxationOutcome {
    pub structure: MolecularSystem,
    pub status: RelaxationStatus,
    /// The restraint strength that was requested, for the result record.
    pub stiffness: f64,
}

impl RelaxationOutcome {
    pub fn relaxed(&self) -> bool {
        self.status.relaxed()
    }
}

/// Relaxes a structure, degrading gracefully at every step.
///
/// This stage never fails the pipeline. The state machine is: input check →
/// engine check → minimize → divergence check; any non-success path returns
/// the original structure unchanged with the corresponding skipped/failed
/// status.
pub fn relax(request: &RelaxationRequest<'_>, minimizer: &dyn Minimizer) -> RelaxationOutcome {
    let original = request.structure;
    let fall_back = |status: RelaxationStatus| RelaxationOutcome {
        structure: original.clone(),
        status,
        stiffness: request.stiffness,
    };

    let protein_atoms = original
        .atoms_iter()
        .filter(|(_, atom)| {
            matches!(atom.role, AtomRole::Backbone | AtomRole::Sidechain)
        })
        .count();
    if protein_atoms == 0 {
        warn!("Structure has no protein atoms; relaxation skipped");
        return fall_back(RelaxationStatus::SkippedIncompatibleInput);
    }

    if !minimizer.is_available() {
        warn!(
            engine = minimizer.name(),
            "Physics engine unavailable; relaxation skipped"
        );
        return fall_back(RelaxationStatus::SkippedEngineUnavailable);
    }

    let restraints = RestraintSpec::backbone(request.stiffness);
    info!(
        engine = minimizer.name(),
        stiffness = request.stiffness,
        max_iterations = request.max_iterations,
        restrained = restraints.is_active(),
        "Starting energy minimization"
    );

    match minimizer.minimize(original, &restraints, request.max_iterations) {
        Ok(relaxed) => {
            if relaxed.atom_count() != original.atom_count() {
                warn!(
                    before = original.atom_count(),
                    after = relaxed.atom_count(),
                    "Minimized structure lost atoms; using the original"
                );
                return fall_back(RelaxationStatus::FailedMinimization);
            }
            let diverged = relaxed.atoms_iter().any(|(_, atom)| {
                !(atom.position.x.is_finite()
                    && atom.position.y.is_finite()
                    && atom.position.z.is_finite())
            });
            if diverged {
                warn!("Minimization diverged to non-finite coordinates; using the original");
                return fall_back(RelaxationStatus::FailedMinimization);
            }
            info!("Energy minimization complete");
            RelaxationOutcome {
                structure: relaxed,
                status: RelaxationStatus::Relaxed,
                stiffness: request.stiffness,
            }
        }
        Err(e) => {
            warn!(error = %e, "Minimization failed; using the original structure");
            fall_back(RelaxationStatus::FailedMinimization)
        }
    }
}
