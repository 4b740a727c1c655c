//! portsh checks POSIX `/bin/sh` scripts (and `make`-interpreted files)
//! for bashisms: constructs that bash accepts but POSIX sh does not
//! guarantee. The scan is line-oriented and quote-aware rather than a full
//! shell parse; see [`scanner`] for the pipeline and [`patterns`] for the
//! construct tables.

pub mod error;
pub mod patterns;
pub mod preamble;
pub mod report;
pub mod scanner;

pub use error::ScanError;
pub use report::{Diagnostic, ExitStatus, ScanEvent};
pub use scanner::{scan_lines, scan_path, ScanOptions};
