use crate::engine::scoring::process::{run_with_timeout, ProcessError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Partial-charge model requested from the chemistry toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeModel {
    /// Gasteiger-Marsili empirical charges, the Vina-family default.
    #[default]
    Gasteiger,
    /// Electronegativity-equalization charges.
    Eem,
    /// MMFF94 charges.
    Mmff94,
}

impl ChargeModel {
    fn toolkit_name(&self) -> &'static str {
        match self {
            Self::Gasteiger => "gasteiger",
            Self::Eem => "eem",
            Self::Mmff94 => "mmff94",
        }
    }
}

impl fmt::Display for ChargeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.toolkit_name())
    }
}

/// What kind of molecule is being prepared; receptors are written as rigid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoleculeKind {
    Receptor,
    Ligand,
}

/// Options for a structure format conversion.
///
/// pH and charge model are always explicit; the toolkit's own defaults are
/// never relied on.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub ph: f64,
    pub add_hydrogens: bool,
    pub charge_model: ChargeModel,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ph: 7.4,
            add_hydrogens: true,
            charge_model: ChargeModel::Gasteiger,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("chemistry toolkit '{tool}' is not available: {detail}")]
    ToolkitUnavailable { tool: String, detail: String },

    #[error("conversion of '{input}' failed: {detail}")]
    Failed { input: PathBuf, detail: String },

    #[error("prepared file '{path}' is not usable: {reason}")]
    InvalidOutput { path: PathBuf, reason: String },

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// The chemistry-toolkit boundary: structure format conversion, protonation,
/// and charge assignment. The toolkit is a black-box collaborator; this trait
/// is the whole contract the pipeline depends on.
pub trait Converter {
    /// Converts `input` into the engine-ready format at `output`, protonating
    /// at the requested pH and assigning the requested charge model.
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        kind: MoleculeKind,
        options: &ConvertOptions,
    ) -> Result<PathBuf, ConvertError>;
}

const CONVERT_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenBabel-backed [`Converter`] implementation.
pub struct ObabelConverter {
    executable: PathBuf,
}

impl ObabelConverter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for ObabelConverter {
    fn default() -> Self {
        Self::new("obabel")
    }
}

impl Converter for ObabelConverter {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        kind: MoleculeKind,
        options: &ConvertOptions,
    ) -> Result<PathBuf, ConvertError> {
        info!(
            input = %input.display(),
            output = %output.display(),
            ph = options.ph,
            charges = %options.charge_model,
            "Converting structure"
        );

        let mut command = Command::new(&self.executable);
        command.arg(input).arg("-O").arg(output);
        if kind == MoleculeKind::Receptor {
            // Rigid receptor output; torsion-tree records are ligand-only.
            command.arg("-xr");
        }
        if options.add_hydrogens {
            command.arg("-h");
        }
        command
            .arg(format!("-p{}", options.ph))
            .arg("--partialcharge")
            .arg(options.charge_model.toolkit_name());

        let result = run_with_timeout(&mut command, CONVERT_TIMEOUT);
        match result {
            Ok(run) if run.status_success => {
                validate_prepared(output)?;
                debug!(output = %output.display(), "Conversion succeeded");
                Ok(output.to_path_buf())
            }
            Ok(run) => Err(ConvertError::Failed {
                input: input.to_path_buf(),
                detail: run.stderr.trim().to_string(),
            }),
            Err(ProcessError::Spawn(e)) => Err(ConvertError::ToolkitUnavailable {
                tool: self.executable.display().to_string(),
                detail: e.to_string(),
            }),
            Err(ProcessError::Timeout(limit)) => Err(ConvertError::Failed {
                input: input.to_path_buf(),
                detail: format!("conversion exceeded the {limit:?} time limit"),
            }),
            Err(ProcessError::Io(e)) => Err(ConvertError::Io(e)),
        }
    }
}

/// Sanity check on a prepared structure file: non-empty and containing at
/// least one atom record. Catches toolkit runs that "succeed" while writing
/// nothing usable.
pub fn validate_prepared(path: &Path) -> Result<(), ConvertError> {
    let content = fs::read_to_string(path).map_err(|_| ConvertError::InvalidOutput {
        path: path.to_path_buf(),
        reason: "file does not exist or is unreadable".to_string(),
    })?;

    if content.trim().is_empty() {
        return Err(ConvertError::InvalidOutput {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    if !content
        .lines()
        .any(|line| line.starts_with("ATOM") || line.starts_with("HETATM"))
    {
        return Err(ConvertError::InvalidOutput {
            path: path.to_path_buf(),
            reason: "no ATOM or HETATM records found".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_accepts_files_with_atom_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdbqt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "ATOM      1  N   ASP A  87      11.104  13.207   9.852").unwrap();
        assert!(validate_prepared(&path).is_ok());
    }

    #[test]
    fn validate_rejects_missing_empty_and_atomless_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.pdbqt");
        assert!(matches!(
            validate_prepared(&missing),
            Err(ConvertError::InvalidOutput { .. })
        ));

        let empty = dir.path().join("empty.pdbqt");
        fs::write(&empty, "   \n").unwrap();
        assert!(matches!(
            validate_prepared(&empty),
            Err(ConvertError::InvalidOutput { .. })
        ));

        let atomless = dir.path().join("atomless.pdbqt");
        fs::write(&atomless, "REMARK nothing\n").unwrap();
        assert!(matches!(
            validate_prepared(&atomless),
            Err(ConvertError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn missing_toolkit_reports_unavailable() {
        let converter = ObabelConverter::new("definitely-not-obabel-mutadock");
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdb");
        fs::write(&input, "ATOM\n").unwrap();
        let output = dir.path().join("out.pdbqt");

        let result = converter.convert(
            &input,
            &output,
            MoleculeKind::Receptor,
            &ConvertOptions::default(),
        );
        assert!(matches!(
            result,
            Err(ConvertError::ToolkitUnavailable { .. })
        ));
    }
}
