use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Worker environment: values a task can look up at execution time.
pub type WorkerEnv = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("'{0}' is not an environment reference (expected '>>key<<')")]
    NotAReference(String),

    #[error("Worker environment has no key '{0}'")]
    MissingKey(String),

    #[error("Worker environment value for '{key}' has the wrong shape: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Extracts `key` from a `>>key<<` reference.
pub fn env_key(reference: &str) -> Option<&str> {
    reference.strip_prefix(">>")?.strip_suffix("<<")
}

/// A parameter given either literally or as a `>>key<<` reference into the
/// worker environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvChk<T> {
    Env(String),
    Value(T),
}

impl<T: DeserializeOwned + Clone> EnvChk<T> {
    pub fn reference(key: &str) -> Self {
        EnvChk::Env(format!(">>{key}<<"))
    }

    pub fn resolve(&self, env: &WorkerEnv) -> Result<T, EnvError> {
        match self {
            EnvChk::Value(v) => Ok(v.clone()),
            EnvChk::Env(reference) => {
                let key = env_key(reference)
                    .ok_or_else(|| EnvError::NotAReference(reference.clone()))?;
                let value = env
                    .get(key)
                    .ok_or_else(|| EnvError::MissingKey(key.to_string()))?;
                serde_json::from_value(value.clone()).map_err(|source| EnvError::InvalidValue {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }
}
