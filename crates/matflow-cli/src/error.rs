use matflow::core::lammps::input::LammpsError;
use matflow::core::models::error::ModelError;
use matflow::engine::error::EngineError;
use matflow::workflows::config::ConfigError;
use matflow::workflows::powerups::PowerupError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Powerup(#[from] PowerupError),

    #[error(transparent)]
    Lammps(#[from] LammpsError),

    #[error(transparent)]
    WorkflowConfig(#[from] ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("{count} firework(s) fizzled")]
    Fizzled { count: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
