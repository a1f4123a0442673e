//! Loading `GameConfig` from JSON.
//!
//! Missing fields fall back to their defaults, so a file only needs the
//! values it changes. Everything loaded is validated before it is returned.

use std::io::Read;
use std::path::Path;

use broadside_logic::config::GameConfig;

use crate::error::EngineError;

/// Parse and validate a config from any reader.
pub fn load_config<R: Read>(reader: R) -> Result<GameConfig, EngineError> {
    let config: GameConfig = serde_json::from_reader(reader)?;
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(EngineError::InvalidConfig(errors));
    }
    Ok(config)
}

pub fn load_config_file(path: impl AsRef<Path>) -> Result<GameConfig, EngineError> {
    let file = std::fs::File::open(path)?;
    load_config(std::io::BufReader::new(file))
}

pub fn config_to_json(config: &GameConfig) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(config)?)
}
