use std::fmt;

/// Errors that can occur when using a typed map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Failed to acquire lock on a shared map
    LockError,
    /// A backing store holds a value whose type does not match its key
    TypeMismatch {
        /// Display form of the offending key (`name#id`)
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The shared map still has other handles
    StillShared,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MapError::LockError => write!(f, "Failed to acquire lock"),
            MapError::TypeMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "Type mismatch for key {}: expected {}, found {}",
                key, expected, found
            ),
            MapError::StillShared => write!(f, "Map is still shared by other handles"),
        }
    }
}

impl std::error::Error for MapError {}
