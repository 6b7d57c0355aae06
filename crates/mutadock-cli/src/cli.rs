use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "MutaDock Developers",
    version,
    about = "MutaDock CLI - structure-based docking with in-silico mutagenesis, restrained relaxation, and multi-engine consensus scoring.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one docking call: optional mutation, optional relaxation, scoring,
    /// and consensus aggregation.
    Dock(DockArgs),
    /// Prepare a structure only: apply a mutation and convert to the
    /// engine-ready format.
    Prepare(PrepareArgs),
}

/// Arguments for the `dock` subcommand.
#[derive(Args, Debug)]
pub struct DockArgs {
    // --- Core Arguments ---
    /// Path to the receptor structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub receptor: PathBuf,

    /// Path to the ligand structure (PDB, or a pre-prepared PDBQT used as-is).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub ligand: PathBuf,

    /// Pocket center the search box is built around, as "x,y,z" in Angstroms.
    #[arg(short, long, required = true, value_name = "X,Y,Z")]
    pub center: String,

    /// Path for the JSON result record. Printed to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a TOML configuration file with engine paths and tuning knobs.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Mutation ---
    /// Point mutation to apply first: RES:NEW, CHAIN:RES:NEW, or
    /// CHAIN:RES:OLD:NEW (e.g. 87:G, A:87:G, A:87:D:G).
    #[arg(short, long, value_name = "SPEC")]
    pub mutation: Option<String>,

    // --- Consensus ---
    /// Score with every detected backend and aggregate into a consensus.
    #[arg(long)]
    pub consensus: bool,

    /// Consensus aggregation method: mean, median, or weighted.
    #[arg(long, value_name = "METHOD", default_value = "mean")]
    pub consensus_method: String,

    /// Flexible-residue file forwarded to engines that support it.
    #[arg(long, value_name = "PATH")]
    pub flex: Option<PathBuf>,

    // --- Relaxation ---
    /// Relax the (mutated) structure with the physics engine before docking.
    #[arg(long)]
    pub relax: bool,

    /// Backbone restraint strength for relaxation, kJ/mol/nm^2.
    /// 0 leaves the backbone fully free; hundreds preserve the fold;
    /// >=1000 effectively freezes it.
    #[arg(long, value_name = "FLOAT", default_value_t = 0.0)]
    pub stiffness: f64,

    /// Maximum minimization iterations.
    #[arg(long, value_name = "INT", default_value_t = 1000)]
    pub max_iterations: usize,

    // --- Preparation ---
    /// Protonation pH for structure preparation (default: 7.4).
    #[arg(long, value_name = "FLOAT")]
    pub ph: Option<f64>,
}

/// Arguments for the `prepare` subcommand.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Path to the input structure (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Point mutation to apply: RES:NEW, CHAIN:RES:NEW, or CHAIN:RES:OLD:NEW.
    #[arg(short, long, value_name = "SPEC")]
    pub mutation: Option<String>,

    /// Path for the prepared output. Derived from the input when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Stop after mutation; write a PDB instead of converting to PDBQT.
    #[arg(long)]
    pub no_convert: bool,

    /// Protonation pH for structure preparation (default: 7.4).
    #[arg(long, value_name = "FLOAT")]
    pub ph: Option<f64>,

    /// Path to a TOML configuration file with engine paths and tuning knobs.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
