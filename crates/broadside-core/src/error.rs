//! Engine errors.
//!
//! Nothing in the tick path returns these. They come from construction,
//! configuration loading, and the command API when it is pointed at an
//! entity that does not exist or cannot do what was asked.

use broadside_logic::config::ConfigError;
use broadside_logic::grapple::{LaunchError, ZiplineError};

#[derive(Debug)]
pub enum EngineError {
    InvalidConfig(Vec<ConfigError>),
    ConfigParse(serde_json::Error),
    Io(std::io::Error),
    NoSuchEntity,
    /// A player command arrived while the player commands no vessel.
    NoPlayerVessel,
    MissingComponent(&'static str),
    Component(hecs::ComponentError),
    Launch(LaunchError),
    Zipline(ZiplineError),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::ConfigParse(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<LaunchError> for EngineError {
    fn from(e: LaunchError) -> Self {
        EngineError::Launch(e)
    }
}

impl From<ZiplineError> for EngineError {
    fn from(e: ZiplineError) -> Self {
        EngineError::Zipline(e)
    }
}

impl From<hecs::NoSuchEntity> for EngineError {
    fn from(_: hecs::NoSuchEntity) -> Self {
        EngineError::NoSuchEntity
    }
}

impl From<hecs::ComponentError> for EngineError {
    fn from(e: hecs::ComponentError) -> Self {
        match e {
            hecs::ComponentError::NoSuchEntity => EngineError::NoSuchEntity,
            missing => EngineError::Component(missing),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidConfig(errors) => {
                write!(f, "invalid configuration:")?;
                for e in errors {
                    write!(f, " {};", e)?;
                }
                Ok(())
            }
            EngineError::ConfigParse(e) => write!(f, "config parse error: {}", e),
            EngineError::Io(e) => write!(f, "IO error: {}", e),
            EngineError::NoSuchEntity => write!(f, "no such entity"),
            EngineError::NoPlayerVessel => write!(f, "player commands no vessel"),
            EngineError::MissingComponent(name) => write!(f, "entity has no {} component", name),
            EngineError::Component(e) => write!(f, "{}", e),
            EngineError::Launch(e) => write!(f, "grapple launch refused: {}", e),
            EngineError::Zipline(e) => write!(f, "zipline refused: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::ConfigParse(e) => Some(e),
            EngineError::Io(e) => Some(e),
            EngineError::Launch(e) => Some(e),
            EngineError::Zipline(e) => Some(e),
            EngineError::Component(e) => Some(e),
            _ => None,
        }
    }
}
