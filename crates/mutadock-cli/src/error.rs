use mutadock::engine::error::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status: 2 for invalid input parameters, 1 for anything
    /// unrecoverable in the pipeline itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Argument(_) | Self::Config(_) => 2,
            Self::Engine(engine) if engine.is_input_error() => 2,
            _ => 1,
        }
    }
}
