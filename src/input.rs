//! Key bindings: which key name triggers which motion, and which key-event
//! phase to listen on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// Phase of a key event a grid listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    #[default]
    KeyDown,
    KeyPress,
    KeyUp,
}

impl KeyPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyPhase::KeyDown => "keydown",
            KeyPhase::KeyPress => "keypress",
            KeyPhase::KeyUp => "keyup",
        }
    }
}

impl fmt::Display for KeyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown key phase {0:?} (expected keydown, keypress or keyup)")]
pub struct ParseKeyPhaseError(pub String);

impl FromStr for KeyPhase {
    type Err = ParseKeyPhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keydown" => Ok(KeyPhase::KeyDown),
            "keypress" => Ok(KeyPhase::KeyPress),
            "keyup" => Ok(KeyPhase::KeyUp),
            _ => Err(ParseKeyPhaseError(s.to_string())),
        }
    }
}

/// Key name bound to each motion. Defaults to the arrow keys.
///
/// ```
/// use grid_reconcile::grid::Direction;
/// use grid_reconcile::input::KeyMap;
/// let keys = KeyMap::default().with_binding(Direction::Up, "w");
/// assert_eq!(keys.direction_for("w"), Some(Direction::Up));
/// assert_eq!(keys.direction_for("ArrowLeft"), Some(Direction::Left));
/// assert_eq!(keys.direction_for("ArrowUp"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap {
            up: "ArrowUp".to_string(),
            down: "ArrowDown".to_string(),
            left: "ArrowLeft".to_string(),
            right: "ArrowRight".to_string(),
        }
    }
}

impl KeyMap {
    pub fn key_for(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }

    /// Motion bound to `key`, if any. Matching is exact.
    pub fn direction_for(&self, key: &str) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| self.key_for(d) == key)
    }

    pub fn with_binding(mut self, direction: Direction, key: impl Into<String>) -> Self {
        let key = key.into();
        match direction {
            Direction::Up => self.up = key,
            Direction::Down => self.down = key,
            Direction::Left => self.left = key,
            Direction::Right => self.right = key,
        }
        self
    }

    /// First key that is bound to two motions, with both motions.
    pub fn duplicate_binding(&self) -> Option<(&str, Direction, Direction)> {
        for (i, &a) in Direction::ALL.iter().enumerate() {
            for &b in &Direction::ALL[i + 1..] {
                if self.key_for(a) == self.key_for(b) {
                    return Some((self.key_for(a), a, b));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_arrow_keys() {
        let keys = KeyMap::default();
        assert_eq!(keys.direction_for("ArrowUp"), Some(Direction::Up));
        assert_eq!(keys.direction_for("ArrowDown"), Some(Direction::Down));
        assert_eq!(keys.direction_for("ArrowLeft"), Some(Direction::Left));
        assert_eq!(keys.direction_for("ArrowRight"), Some(Direction::Right));
        assert_eq!(keys.direction_for("arrowup"), None);
        assert_eq!(keys.duplicate_binding(), None);
    }

    #[test]
    fn it_reports_duplicate_bindings() {
        let keys = KeyMap::default().with_binding(Direction::Right, "ArrowLeft");
        assert_eq!(keys.duplicate_binding(), Some(("ArrowLeft", Direction::Left, Direction::Right)));
    }

    #[test]
    fn it_parses_key_phases() {
        assert_eq!(KeyPhase::default(), KeyPhase::KeyDown);
        assert_eq!("keyup".parse::<KeyPhase>(), Ok(KeyPhase::KeyUp));
        assert_eq!("KeyPress".parse::<KeyPhase>(), Ok(KeyPhase::KeyPress));
        assert!("keyhold".parse::<KeyPhase>().is_err());
        assert_eq!(serde_json::to_string(&KeyPhase::KeyPress).unwrap(), "\"keypress\"");
    }
}
