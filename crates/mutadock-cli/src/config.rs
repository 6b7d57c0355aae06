use crate::cli::DockArgs;
use crate::error::{CliError, Result};
use mutadock::engine::config::{
    DockingConfig, GridConfig, RelaxationSettings, ScoreOptions,
};
use mutadock::engine::consensus::ConsensusMethod;
use mutadock::engine::convert::{ChargeModel, ConvertOptions, ObabelConverter};
use mutadock::engine::minimize::ExternalMinimizer;
use mutadock::engine::scoring::peers::{GninaScorer, RfScorer};
use mutadock::engine::scoring::registry::ScorerRegistry;
use mutadock::engine::scoring::vina::VinaScorer;
use mutadock::engine::scoring::Scorer;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// TOML configuration file. Every field is optional; anything unset falls back
/// to the engine defaults, and a handful of knobs can still be overridden by
/// CLI flags.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    #[serde(default)]
    pub grid: GridSection,
    #[serde(default)]
    pub score: ScoreSection,
    #[serde(default)]
    pub engines: EnginesSection,
    #[serde(default)]
    pub conversion: ConversionSection,
    /// Affinity magnitude beyond which a backend result is rejected, kcal/mol.
    pub plausibility_bound: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GridSection {
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub buffer: Option<f64>,
    pub default_size: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ScoreSection {
    pub cpu: Option<usize>,
    pub num_modes: Option<usize>,
    pub exhaustiveness: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct EnginesSection {
    pub vina: Option<PathBuf>,
    pub gnina: Option<PathBuf>,
    pub rf_score: Option<PathBuf>,
    pub minimizer: Option<PathBuf>,
    pub force_field: Option<String>,
    pub obabel: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConversionSection {
    pub ph: Option<f64>,
    pub add_hydrogens: Option<bool>,
    /// gasteiger, eem, or mmff94.
    pub charge_model: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| {
            CliError::Config(format!("cannot parse '{}': {e}", path.display()))
        })
    }

    /// Loads the file when a path was given, otherwise starts from defaults.
    pub fn load_or_default(path: &Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

impl EnginesSection {
    pub fn build_registry(&self) -> Result<ScorerRegistry> {
        let primary: Box<dyn Scorer> = match &self.vina {
            Some(path) => Box::new(VinaScorer::new(path.clone())),
            None => Box::new(VinaScorer::default()),
        };
        let optional: Vec<Box<dyn Scorer>> = vec![
            match &self.gnina {
                Some(path) => Box::new(GninaScorer::new(path.clone())),
                None => Box::new(GninaScorer::default()),
            },
            match &self.rf_score {
                Some(path) => Box::new(RfScorer::new(path.clone())),
                None => Box::new(RfScorer::default()),
            },
        ];
        Ok(ScorerRegistry::detect(primary, optional)?)
    }

    pub fn build_converter(&self) -> ObabelConverter {
        match &self.obabel {
            Some(path) => ObabelConverter::new(path.clone()),
            None => ObabelConverter::default(),
        }
    }

    pub fn build_minimizer(&self) -> ExternalMinimizer {
        let force_field = self
            .force_field
            .clone()
            .unwrap_or_else(|| "amber14-implicit".to_string());
        match &self.minimizer {
            Some(path) => ExternalMinimizer::new(path.clone(), force_field),
            None => ExternalMinimizer::new("mdmin", force_field),
        }
    }
}

impl ConversionSection {
    fn charge_model(&self) -> Result<ChargeModel> {
        match self.charge_model.as_deref() {
            None => Ok(ChargeModel::default()),
            Some("gasteiger") => Ok(ChargeModel::Gasteiger),
            Some("eem") => Ok(ChargeModel::Eem),
            Some("mmff94") => Ok(ChargeModel::Mmff94),
            Some(other) => Err(CliError::Config(format!(
                "unknown charge model '{other}' (expected gasteiger, eem, or mmff94)"
            ))),
        }
    }
}

/// Assembles the engine configuration from the config file plus CLI overrides.
pub fn build_docking_config(args: &DockArgs, file: &FileConfig) -> Result<DockingConfig> {
    let grid_defaults = GridConfig::default();
    let grid = GridConfig {
        min_size: file.grid.min_size.unwrap_or(grid_defaults.min_size),
        max_size: file.grid.max_size.unwrap_or(grid_defaults.max_size),
        buffer: file.grid.buffer.unwrap_or(grid_defaults.buffer),
        default_size: file.grid.default_size.unwrap_or(grid_defaults.default_size),
    };

    let score_defaults = ScoreOptions::default();
    let score = ScoreOptions {
        cpu: file.score.cpu.unwrap_or(score_defaults.cpu),
        num_modes: file.score.num_modes.unwrap_or(score_defaults.num_modes),
        exhaustiveness: file
            .score
            .exhaustiveness
            .unwrap_or(score_defaults.exhaustiveness),
        flexible_residues: args.flex.clone(),
        timeout: file
            .score
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(score_defaults.timeout),
    };

    let conversion_defaults = ConvertOptions::default();
    let conversion = ConvertOptions {
        ph: args
            .ph
            .or(file.conversion.ph)
            .unwrap_or(conversion_defaults.ph),
        add_hydrogens: file
            .conversion
            .add_hydrogens
            .unwrap_or(conversion_defaults.add_hydrogens),
        charge_model: file.conversion.charge_model()?,
    };

    let mut builder = DockingConfig::builder()
        .grid(grid)
        .score(score)
        .conversion(conversion);

    if let Some(bound) = file.plausibility_bound {
        builder = builder.plausibility_bound(bound);
    }
    if args.consensus {
        let method: ConsensusMethod = args
            .consensus_method
            .parse()
            .map_err(|e: mutadock::engine::consensus::ParseConsensusMethodError| {
                CliError::Argument(e.to_string())
            })?;
        builder = builder.consensus(method);
    }
    if args.relax {
        builder = builder.relaxation(RelaxationSettings {
            stiffness: args.stiffness,
            max_iterations: args.max_iterations,
        });
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}
