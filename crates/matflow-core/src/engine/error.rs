use crate::core::io::incar::IncarError;
use crate::core::lammps::input::LammpsError;
use crate::core::models::error::ModelError;
use crate::core::models::ids::FwId;
use crate::core::utils::env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("INCAR error: {0}")]
    Incar(#[from] IncarError),

    #[error("LAMMPS input error: {0}")]
    Lammps(#[from] LammpsError),

    #[error("Worker environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Invalid workflow: {0}")]
    Model(#[from] ModelError),

    #[error("Task '{task}' cannot run on the replay backend")]
    Unsupported { task: String },

    #[error("Command is empty")]
    EmptyCommand,

    #[error("Command '{command}' exited with status {status:?}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
    },

    #[error("Replay input mismatch in {file}: {detail}")]
    ReplayMismatch { file: String, detail: String },

    #[error("Firework {0} is not on the launchpad")]
    UnknownFirework(FwId),
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        }
    }
}
