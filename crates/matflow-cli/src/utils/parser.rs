use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format for '{0}'. Expected KEY=VALUE.")]
    MissingSeparator(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),

    #[error("Key '{0}' is given more than once.")]
    DuplicateKey(String),
}

/// Splits `KEY=VALUE`. The value is read as JSON when it parses as JSON
/// (numbers, booleans, lists, objects), otherwise kept as a plain string.
pub fn parse_key_value(pair: &str) -> Result<(String, Value), ParseError> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Collects repeated `KEY=VALUE` arguments, keeping their order.
pub fn parse_key_values(pairs: &[String]) -> Result<Map<String, Value>, ParseError> {
    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = parse_key_value(pair)?;
        if map.contains_key(&key) {
            return Err(ParseError::DuplicateKey(key));
        }
        map.insert(key, value);
    }
    Ok(map)
}
