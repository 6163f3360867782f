use super::ids::FwId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    #[error("Firework index {index} out of bounds (workflow has {len} fireworks)")]
    FireworkIndexOutOfBounds { index: usize, len: usize },

    #[error("Task index {index} out of bounds in firework '{firework}' ({len} tasks)")]
    TaskIndexOutOfBounds {
        firework: String,
        index: usize,
        len: usize,
    },

    #[error("Duplicate firework id {0}")]
    DuplicateFwId(FwId),

    #[error("Link references unknown firework id {0}")]
    UnknownFwId(FwId),

    #[error("Workflow links contain a cycle through firework {0}")]
    Cycle(FwId),
}
