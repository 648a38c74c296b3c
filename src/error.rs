//! Status values returned by tree operations.
//!
//! The taxonomy is errno-like on purpose: each variant names a semantic
//! failure mode, not a mechanism. Errors never cross an operation boundary;
//! every operation returns the status of its own attempt and leaves the tree
//! exactly as it found it.

use std::fmt;

/// Why a tree operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Malformed path, or a `move` whose target lies inside the source.
    InvalidArgument,

    /// A directory on the path (or the final component) does not exist.
    NotFound,

    /// The directory to create, or the move target, is already present.
    Exists,

    /// The directory to remove still has children.
    NotEmpty,

    /// The operation is forbidden on the root.
    Busy,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),

            Self::NotFound => write!(f, "no such directory"),

            Self::Exists => write!(f, "directory already exists"),

            Self::NotEmpty => write!(f, "directory not empty"),

            Self::Busy => write!(f, "directory busy"),
        }
    }
}

impl std::error::Error for TreeError {}
