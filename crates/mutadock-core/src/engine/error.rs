use thiserror::Error;

use crate::core::io::pdb::PdbError;
use crate::engine::convert::ConvertError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Residue {chain}:{residue_number} not found in structure")]
    ResidueNotFound { chain: char, residue_number: isize },

    #[error(
        "Residue mismatch at {chain}:{residue_number}: expected {expected}, found {found}"
    )]
    ResidueMismatch {
        chain: char,
        residue_number: isize,
        expected: String,
        found: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Primary scoring engine '{name}' is not available: {detail}")]
    PrimaryScorerUnavailable { name: String, detail: String },

    #[error("Primary scoring engine '{name}' failed: {detail}")]
    PrimaryScorerFailed { name: String, detail: String },

    #[error("All scoring backends failed: {details}")]
    AllScorersFailed { details: String },

    #[error("Structure preparation failed: {source}")]
    Conversion {
        #[from]
        source: ConvertError,
    },

    #[error("Failed to read structure file: {source}")]
    StructureFile {
        #[from]
        source: PdbError,
    },

    #[error("Docking call cancelled before stage '{stage}'")]
    Cancelled { stage: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error came from invalid user input rather than a pipeline
    /// failure. Callers use this to pick an exit status.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ResidueNotFound { .. }
                | Self::ResidueMismatch { .. }
                | Self::InvalidGeometry(_)
                | Self::StructureFile { .. }
        )
    }
}
