use crate::cli::DockArgs;
use crate::config::{build_docking_config, FileConfig};
use crate::error::{CliError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mutadock::engine::mutation::MutationSpec;
use mutadock::engine::progress::{Progress, ProgressReporter};
use mutadock::workflows::dock::{run as run_docking, Collaborators, DockingInputs};
use mutadock::workflows::record::DockingRecord;
use mutadock::workflows::CancellationToken;
use nalgebra::Point3;
use std::time::Duration;
use tracing::info;

pub fn run(args: DockArgs) -> Result<()> {
    let file = FileConfig::load_or_default(&args.config)?;
    let config = build_docking_config(&args, &file)?;

    let center = parse_center(&args.center)?;
    let mutation = args
        .mutation
        .as_deref()
        .map(MutationSpec::parse)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let scorers = file.engines.build_registry()?;
    let converter = file.engines.build_converter();
    let minimizer = file.engines.build_minimizer();

    let inputs = DockingInputs {
        receptor: args.receptor.clone(),
        ligand: args.ligand.clone(),
        center,
        mutation,
    };

    let spinner = stage_spinner();
    let reporter_spinner = spinner.clone();
    let reporter = ProgressReporter::with_callback(Box::new(move |event| match event {
        Progress::StageStart { name } => reporter_spinner.set_message(name),
        Progress::StageSkipped { name, reason } => {
            reporter_spinner.set_message(format!("{name} ({reason})"))
        }
        Progress::StageFinish => {}
        Progress::Message(text) => reporter_spinner.set_message(text),
    }));

    let record = run_docking(
        &inputs,
        &config,
        &Collaborators {
            scorers: &scorers,
            converter: &converter,
            minimizer: &minimizer,
        },
        &reporter,
        &CancellationToken::new(),
    );
    spinner.finish_and_clear();
    let record = record?;

    match &args.output {
        Some(path) => {
            record.save(path)?;
            info!(record = %path.display(), "Result record written");
            print_summary(&record);
        }
        None => {
            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| CliError::Other(e.into()))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn parse_center(text: &str) -> Result<Point3<f64>> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(CliError::Argument(format!(
            "center must be three comma-separated coordinates, got '{text}'"
        )));
    }
    let mut coords = [0.0f64; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| {
            CliError::Argument(format!("bad center coordinate '{part}' in '{text}'"))
        })?;
    }
    Ok(Point3::new(coords[0], coords[1], coords[2]))
}

fn stage_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_summary(record: &DockingRecord) {
    println!(
        "Binding Affinity ({}): {:.2} kcal/mol",
        record.primary_engine, record.primary_affinity
    );
    if let (Some(consensus), Some(uncertainty)) =
        (record.consensus_affinity, record.uncertainty)
    {
        println!("Consensus Binding Affinity: {consensus:.2} \u{00b1} {uncertainty:.2} kcal/mol");
    }
    if let Some(mutation) = &record.mutation {
        println!("Mutation: {mutation}");
    }
    if let Some(status) = &record.relaxation_status {
        println!("Relaxation: {status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_parses_three_coordinates() {
        let center = parse_center("1.5, -2.0, 3").unwrap();
        assert_eq!(center, Point3::new(1.5, -2.0, 3.0));
    }

    #[test]
    fn center_rejects_wrong_arity_and_garbage() {
        assert!(matches!(parse_center("1,2"), Err(CliError::Argument(_))));
        assert!(matches!(
            parse_center("1,2,3,4"),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            parse_center("1,two,3"),
            Err(CliError::Argument(_))
        ));
    }
}
