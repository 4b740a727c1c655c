//! Typed per-file scan failures.
//!
//! Every error here is local to a single input file: the caller reports it,
//! folds the file-error bit into the process status, and moves on.

use std::io;
use std::path::PathBuf;

/// A condition that stops the scan of one file.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The file could not be opened at all.
    #[error("cannot open script {} for reading: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file opened but a read failed partway through.
    #[error("error reading script {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// The path the failure relates to.
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::Unreadable { path, .. } | ScanError::Read { path, .. } => path,
        }
    }
}
