use crate::engine::consensus::{ConsensusMethod, ConsensusResult};
use crate::engine::relax::RelaxationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// One backend's entry in the persisted per-engine breakdown: an affinity or a
/// failure marker, never silently absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineOutcome {
    Scored { affinity: f64 },
    Failed { error: String },
}

/// The persisted result of one docking call, consumed by reporting tooling.
///
/// The primary engine's raw affinity is always present; consensus fields are
/// null when consensus was not requested; relaxation fields are null when the
/// relaxation stage did not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingRecord {
    pub receptor: String,
    pub ligand: String,
    /// Mutation shorthand (e.g. `A:D87G`), when a mutation was applied.
    pub mutation: Option<String>,
    /// Whether the relaxation stage actually relaxed the structure.
    pub relaxed: Option<bool>,
    /// The relaxation stage's terminal state.
    pub relaxation_status: Option<RelaxationStatus>,
    /// Backbone restraint strength used, kJ/mol/nm^2.
    pub stiffness: Option<f64>,
    pub primary_engine: String,
    /// The primary engine's own affinity, kcal/mol.
    pub primary_affinity: f64,
    pub consensus_affinity: Option<f64>,
    /// Population standard deviation across succeeded backends.
    pub uncertainty: Option<f64>,
    pub consensus_method: Option<ConsensusMethod>,
    pub per_engine: BTreeMap<String, EngineOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl DockingRecord {
    /// Assembles the record from a finished docking call.
    pub fn new(
        receptor: &Path,
        ligand: &Path,
        mutation: Option<String>,
        relaxation: Option<(RelaxationStatus, f64)>,
        primary_engine: &str,
        consensus: &ConsensusResult,
    ) -> Self {
        let per_engine = consensus
            .per_engine
            .iter()
            .map(|result| {
                let outcome = match result.affinity {
                    Some(affinity) => EngineOutcome::Scored { affinity },
                    None => EngineOutcome::Failed {
                        error: result
                            .error
                            .clone()
                            .unwrap_or_else(|| "no result recorded".to_string()),
                    },
                };
                (result.engine.clone(), outcome)
            })
            .collect();

        let (relaxation_status, stiffness) = match relaxation {
            Some((status, stiffness)) => (Some(status), Some(stiffness)),
            None => (None, None),
        };

        Self {
            receptor: receptor.display().to_string(),
            ligand: ligand.display().to_string(),
            mutation,
            relaxed: relaxation_status.map(|s| s.relaxed()),
            relaxation_status,
            stiffness,
            primary_engine: primary_engine.to_string(),
            primary_affinity: consensus.primary_affinity,
            consensus_affinity: consensus.consensus_affinity,
            uncertainty: consensus.uncertainty,
            consensus_method: consensus.method,
            per_engine,
            timestamp: Utc::now(),
        }
    }

    /// Writes the record as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(io::Error::other)
    }
}
