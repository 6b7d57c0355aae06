use crate::cli::PrepareArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use mutadock::core::io::pdb::PdbFile;
use mutadock::core::io::traits::MolecularFile;
use mutadock::engine::convert::{ConvertOptions, Converter, MoleculeKind};
use mutadock::engine::error::EngineError;
use mutadock::engine::mutation::{apply_mutation, MutationSpec};
use std::path::PathBuf;
use tracing::info;

pub fn run(args: PrepareArgs) -> Result<()> {
    let file = FileConfig::load_or_default(&args.config)?;

    let mut system = PdbFile::read_from_path(&args.input).map_err(EngineError::from)?;
    info!(
        input = %args.input.display(),
        atoms = system.atom_count(),
        "Structure loaded"
    );

    let mutated = match &args.mutation {
        Some(spec_text) => {
            let spec =
                MutationSpec::parse(spec_text).map_err(|e| CliError::Argument(e.to_string()))?;
            system = apply_mutation(&system, &spec).map_err(CliError::Engine)?;
            true
        }
        None => false,
    };

    let staged = staged_path(&args, mutated);
    PdbFile::write_to_path(&system, &staged).map_err(EngineError::from)?;

    if args.no_convert {
        println!("Prepared file: {}", staged.display());
        return Ok(());
    }

    let converter = file.engines.build_converter();
    let options = ConvertOptions {
        ph: args.ph.unwrap_or_else(|| ConvertOptions::default().ph),
        ..ConvertOptions::default()
    };
    let prepared = converter
        .convert(
            &staged,
            &staged.with_extension("pdbqt"),
            MoleculeKind::Receptor,
            &options,
        )
        .map_err(EngineError::from)?;

    println!("Prepared file: {}", prepared.display());
    Ok(())
}

/// Where the (possibly mutated) PDB lands before conversion.
fn staged_path(args: &PrepareArgs, mutated: bool) -> PathBuf {
    if let Some(output) = &args.output {
        return match output.extension().and_then(|e| e.to_str()) {
            Some("pdbqt") => output.with_extension("pdb"),
            _ => output.clone(),
        };
    }
    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    let name = if mutated {
        format!("{stem}_mutant.pdb")
    } else {
        format!("{stem}_prepared.pdb")
    };
    args.input.with_file_name(name)
}
