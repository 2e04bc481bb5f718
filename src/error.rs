//! Error types for the non-simulation boundaries.
//!
//! The simulation itself never fails: degenerate state is corrected in place.
//! These errors only surface from the account flow and from parsing stored or
//! user-supplied data, where callers usually log them and fall back to a
//! default.

use std::fmt;

#[derive(Debug)]
pub enum BrickfallError {
    /// Account name was empty after trimming.
    EmptyUsername,
    /// An account with this name already exists.
    UsernameTaken(String),
    /// No account with this name.
    UnknownUser(String),
    /// A stored value could not be decoded.
    CorruptStore {
        /// Storage key that held the bad value.
        key: &'static str,
        source: serde_json::Error,
    },
    /// Tuning JSON could not be parsed.
    InvalidTuning(serde_json::Error),
}

impl fmt::Display for BrickfallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrickfallError::EmptyUsername => write!(f, "username must not be empty"),
            BrickfallError::UsernameTaken(name) => write!(f, "username '{}' already exists", name),
            BrickfallError::UnknownUser(name) => write!(f, "no account named '{}'", name),
            BrickfallError::CorruptStore { key, source } => {
                write!(f, "stored value under '{}' is corrupt: {}", key, source)
            }
            BrickfallError::InvalidTuning(e) => write!(f, "invalid tuning: {}", e),
        }
    }
}

impl std::error::Error for BrickfallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrickfallError::CorruptStore { source, .. } => Some(source),
            BrickfallError::InvalidTuning(e) => Some(e),
            _ => None,
        }
    }
}
