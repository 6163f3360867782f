use crate::core::utils::env::WorkerEnv;
use serde_json::Value;

/// The machine a firework runs on, as seen by tasks.
///
/// `env` feeds `>>key<<` references in task parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    pub name: String,
    pub env: WorkerEnv,
}

impl Default for Worker {
    fn default() -> Self {
        Self::new("Automatically generated Worker")
    }
}

impl Worker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: WorkerEnv::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: Value) -> Self {
        self.env.insert(key.into(), value);
        self
    }
}
