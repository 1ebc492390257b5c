//! Environment variable parsing for pool settings.
//!
//! Unset variables fall back to the default. A variable that is set but
//! unparseable is an error rather than a silent default.

use std::str::FromStr;

use crate::DbConfigError;

pub fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, DbConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| DbConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
