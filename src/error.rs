//! Fatal, whole-file errors (spec section 7): capacity overflow and I/O
//! failure. Unlike [`crate::diagnostics`], these abort the current file
//! immediately rather than accumulating.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum AssemblerError {
    /// `ic + dc + LOADING_BASE` exceeded `MAX_MEMORY_SIZE`.
    CapacityExceeded { ic: i32, dc: i32 },
    Io { path: String, source: io::Error },
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblerError::CapacityExceeded { .. } => {
                write!(f, "error: code and data exceed memory limit")
            }
            AssemblerError::Io { path, source } => write!(f, "{path}: {source}"),
        }
    }
}

impl std::error::Error for AssemblerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssemblerError::Io { source, .. } => Some(source),
            AssemblerError::CapacityExceeded { .. } => None,
        }
    }
}
