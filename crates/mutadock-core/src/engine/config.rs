use crate::engine::consensus::ConsensusMethod;
use crate::engine::convert::ConvertOptions;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Narrowest legal search box edge, in Angstroms. Below this the search space
/// cannot contain typical drug-like ligands.
pub const MIN_BOX_SIZE: f64 = 10.0;

/// Widest legal search box edge, in Angstroms. Beyond this the external
/// engine's sampling becomes unreliable and runtimes explode. An engineering
/// contract, not a physical law; override through [`GridConfig`].
pub const MAX_BOX_SIZE: f64 = 60.0;

/// Default padding added around the ligand extent, per side, in Angstroms.
/// Smaller buffers (historically 6 A) produced box-wall clash artifacts with
/// spuriously high energies.
pub const DEFAULT_BUFFER: f64 = 15.0;

/// Edge length used when no ligand geometry is supplied, in Angstroms.
pub const DEFAULT_BOX_SIZE: f64 = 20.0;

/// Affinities with magnitude beyond this bound (kcal/mol) are treated as
/// backend failures: real binding free energies of drug-like ligands sit well
/// inside it, and values outside almost always come from steric explosions.
/// An empirical threshold, configurable through [`DockingConfig`].
pub const DEFAULT_PLAUSIBILITY_BOUND: f64 = 50.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Sizing policy for the docking search volume.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Lower clamp for each box edge, Angstroms.
    pub min_size: f64,
    /// Upper clamp for each box edge, Angstroms.
    pub max_size: f64,
    /// Padding added on each side of the ligand extent, Angstroms.
    pub buffer: f64,
    /// Edge length used when no ligand geometry is available, Angstroms.
    pub default_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_BOX_SIZE,
            max_size: MAX_BOX_SIZE,
            buffer: DEFAULT_BUFFER,
            default_size: DEFAULT_BOX_SIZE,
        }
    }
}

/// Options forwarded to every scoring-backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOptions {
    pub cpu: usize,
    pub num_modes: usize,
    pub exhaustiveness: usize,
    /// Optional flexible-residue file handed to engines that support it.
    pub flexible_residues: Option<PathBuf>,
    /// Wall-clock bound on a single backend invocation.
    pub timeout: Duration,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            cpu: 4,
            num_modes: 9,
            exhaustiveness: 8,
            flexible_residues: None,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Parameters for the optional post-mutation relaxation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationSettings {
    /// Backbone restraint strength, kJ/mol/nm^2. Zero leaves the backbone
    /// fully free; values in the hundreds preserve the fold while side chains
    /// resolve clashes; >=1000 effectively freezes backbone geometry.
    pub stiffness: f64,
    pub max_iterations: usize,
}

impl Default for RelaxationSettings {
    fn default() -> Self {
        Self {
            stiffness: 0.0,
            max_iterations: 1000,
        }
    }
}

/// Complete engine-side configuration for a docking call.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingConfig {
    pub grid: GridConfig,
    pub score: ScoreOptions,
    /// `Some` enables consensus aggregation across all available backends;
    /// `None` scores with the primary engine only.
    pub consensus: Option<ConsensusMethod>,
    /// Affinity magnitude beyond which a backend result is rejected.
    pub plausibility_bound: f64,
    /// `Some` enables the relaxation stage after mutation.
    pub relaxation: Option<RelaxationSettings>,
    pub conversion: ConvertOptions,
}

impl DockingConfig {
    pub fn builder() -> DockingConfigBuilder {
        DockingConfigBuilder::default()
    }
}

impl Default for DockingConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            score: ScoreOptions::default(),
            consensus: None,
            plausibility_bound: DEFAULT_PLAUSIBILITY_BOUND,
            relaxation: None,
            conversion: ConvertOptions::default(),
        }
    }
}

#[derive(Default)]
pub struct DockingConfigBuilder {
    grid: Option<GridConfig>,
    score: Option<ScoreOptions>,
    consensus: Option<ConsensusMethod>,
    plausibility_bound: Option<f64>,
    relaxation: Option<RelaxationSettings>,
    conversion: Option<ConvertOptions>,
}

impl DockingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(mut self, grid: GridConfig) -> Self {
        self.grid = Some(grid);
        self
    }
    pub fn score(mut self, score: ScoreOptions) -> Self {
        self.score = Some(score);
        self
    }
    pub fn consensus(mut self, method: ConsensusMethod) -> Self {
        self.consensus = Some(method);
        self
    }
    pub fn plausibility_bound(mut self, bound: f64) -> Self {
        self.plausibility_bound = Some(bound);
        self
    }
    pub fn relaxation(mut self, settings: RelaxationSettings) -> Self {
        self.relaxation = Some(settings);
        self
    }
    pub fn conversion(mut self, options: ConvertOptions) -> Self {
        self.conversion = Some(options);
        self
    }

    pub fn build(self) -> Result<DockingConfig, ConfigError> {
        let grid = self.grid.unwrap_or_default();
        if !(grid.min_size > 0.0 && grid.min_size <= grid.max_size) {
            return Err(ConfigError::InvalidParameter {
                parameter: "grid",
                reason: format!(
                    "box bounds must satisfy 0 < min <= max, got [{}, {}]",
                    grid.min_size, grid.max_size
                ),
            });
        }
        if grid.buffer < 0.0 || !grid.buffer.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "grid.buffer",
                reason: format!("buffer must be finite and non-negative, got {}", grid.buffer),
            });
        }

        let plausibility_bound = self.plausibility_bound.unwrap_or(DEFAULT_PLAUSIBILITY_BOUND);
        if !(plausibility_bound > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "plausibility_bound",
                reason: format!("must be positive, got {plausibility_bound}"),
            });
        }

        if let Some(relaxation) = &self.relaxation {
            if relaxation.stiffness < 0.0 || !relaxation.stiffness.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    parameter: "relaxation.stiffness",
                    reason: format!(
                        "must be finite and non-negative, got {}",
                        relaxation.stiffness
                    ),
                });
            }
            if relaxation.max_iterations == 0 {
                return Err(ConfigError::InvalidParameter {
                    parameter: "relaxation.max_iterations",
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let conversion = self.conversion.unwrap_or_default();
        if !conversion.ph.is_finite() {
            return Err(ConfigError::InvalidParameter {
                parameter: "conversion.ph",
                reason: format!("pH must be finite, got {}", conversion.ph),
            });
        }

        Ok(DockingConfig {
            grid,
            score: self.score.unwrap_or_default(),
            consensus: self.consensus,
            plausibility_bound,
            relaxation: self.relaxation,
            conversion,
        })
    }
}
