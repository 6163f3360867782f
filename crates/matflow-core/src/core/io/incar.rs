use crate::core::models::task::IncarParams;
use serde_json::{Number, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncarError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Line {line}: expected 'KEY = VALUE', found '{text}'")]
    Syntax { line: usize, text: String },
    #[error("Cannot multiply INCAR tag '{0}': it is not set")]
    MissingKey(String),
    #[error("Cannot multiply INCAR tag '{key}': value {value} is not numeric")]
    NotNumeric { key: String, value: Value },
}

/// VASP INCAR parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Incar {
    params: IncarParams,
}

impl Incar {
    pub fn new(params: IncarParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IncarParams {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn read_from_path(path: &Path) -> Result<Self, IncarError> {
        let text = std::fs::read_to_string(path).map_err(|source| IncarError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        text.parse()
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), IncarError> {
        std::fs::write(path, self.to_string()).map_err(|source| IncarError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    /// Sets every given tag, overwriting existing values.
    pub fn update(&mut self, changes: &IncarParams) {
        for (key, value) in changes {
            self.params.insert(key.to_uppercase(), value.clone());
        }
    }

    /// Multiplies existing numeric tags (or lists of numbers) by the given factors.
    pub fn multiply(&mut self, factors: &IncarParams) -> Result<(), IncarError> {
        for (key, factor) in factors {
            let key = key.to_uppercase();
            let current = self
                .params
                .get(&key)
                .ok_or_else(|| IncarError::MissingKey(key.clone()))?;
            let product = multiply_value(current, factor).ok_or_else(|| IncarError::NotNumeric {
                key: key.clone(),
                value: current.clone(),
            })?;
            self.params.insert(key, product);
        }
        Ok(())
    }
}

impl FromStr for Incar {
    type Err = IncarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut params = IncarParams::new();
        for (idx, raw) in s.lines().enumerate() {
            let line = raw.split(['!', '#']).next().unwrap_or_default();
            for statement in line.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                let (key, value) =
                    statement
                        .split_once('=')
                        .ok_or_else(|| IncarError::Syntax {
                            line: idx + 1,
                            text: statement.to_string(),
                        })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(IncarError::Syntax {
                        line: idx + 1,
                        text: statement.to_string(),
                    });
                }
                params.insert(key.to_uppercase(), parse_value(value.trim()));
            }
        }
        Ok(Self { params })
    }
}

impl fmt::Display for Incar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.params {
            writeln!(f, "{key} = {}", format_value(value))?;
        }
        Ok(())
    }
}

fn parse_value(raw: &str) -> Value {
    match raw.to_uppercase().as_str() {
        ".TRUE." | ".T." | "T" | "TRUE" => return Value::Bool(true),
        ".FALSE." | ".F." | "F" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => ".TRUE.".to_string(),
        Value::Bool(false) => ".FALSE.".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

fn multiply_value(value: &Value, factor: &Value) -> Option<Value> {
    match (value, factor) {
        (Value::Array(items), _) => items
            .iter()
            .map(|item| multiply_value(item, factor))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x.checked_mul(y).map(Value::from),
            _ => Number::from_f64(a.as_f64()? * b.as_f64()?).map(Value::Number),
        },
        _ => None,
    }
}
