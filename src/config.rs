use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::input::{KeyMap, KeyPhase};

/// Input configuration for a [`ReconcilingGrid`](crate::widget::ReconcilingGrid).
///
/// Every field is optional in TOML; missing ones keep their defaults.
///
/// ```
/// use grid_reconcile::config::GridConfig;
/// use grid_reconcile::grid::Direction;
/// use grid_reconcile::input::KeyPhase;
///
/// let cfg = GridConfig::from_toml_str("key_event = \"keyup\"\n[keys]\nup = \"w\"\n").unwrap();
/// assert_eq!(cfg.key_event, KeyPhase::KeyUp);
/// assert_eq!(cfg.keys.direction_for("w"), Some(Direction::Up));
/// assert_eq!(cfg.keys.direction_for("ArrowDown"), Some(Direction::Down));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub key_event: KeyPhase,
    pub keys: KeyMap,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("key {key:?} is bound to both {first} and {second}")]
    DuplicateBinding { key: String, first: Direction, second: Direction },
}

impl GridConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: GridConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Reject a key bound to more than one motion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.keys.duplicate_binding() {
            Some((key, first, second)) => Err(ConfigError::DuplicateBinding { key: key.to_string(), first, second }),
            None => Ok(()),
        }
    }
}
