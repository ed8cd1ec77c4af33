//! Environment variable management
//!
//! Loads `.env` and reads typed configuration values. A variable that is unset or blank
//! counts as absent; a variable that is present but malformed is an error.

use std::env;
use std::str::FromStr;

use crate::error::{Result, SweepError};

/// Load environment variables from .env file
///
/// Does not fail if .env file doesn't exist (optional configuration).
pub fn load_env() -> Result<()> {
    dotenv::dotenv().ok();
    Ok(())
}

/// Trimmed value of a variable, `None` when unset or blank
pub fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable with `FromStr`
///
/// # Errors
/// Returns `InvalidConfig` naming the variable if the value does not parse
pub fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
            SweepError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))
        }),
    }
}

/// Parse a boolean flag; accepts true/false, 1/0, yes/no, on/off
pub fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(SweepError::InvalidConfig(format!(
                "{}={:?}: expected a boolean",
                key, raw
            ))),
        },
    }
}

/// Parse a comma-separated list; empty items are skipped
pub fn env_list<T>(key: &str) -> Result<Option<Vec<T>>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = match env_string(key) {
        None => return Ok(None),
        Some(raw) => raw,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>().map_err(|e| {
                SweepError::InvalidConfig(format!("{}: item {:?}: {}", key, item, e))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}
