//! Diagnostics and exit-status accumulation.
//!
//! Each pattern match becomes one [`Diagnostic`], emitted the moment it is
//! found. The process exit code is a bitmask OR-accumulated across all
//! scanned files: bit 0 for "bashism found", bit 1 for "file unreadable or
//! rejected".

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

/// A single bashism found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the match was found in.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// Original line text, untruncated (comments and quotes intact).
    pub text: String,
    /// The substring that matched the pattern.
    pub matched: String,
    /// Human-readable explanation of the construct.
    pub explanation: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "possible bashism in {} line {} ({}):\n{}",
            self.file.display(),
            self.line,
            self.explanation,
            self.text
        )
    }
}

/// One unit of streamed scanner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A bashism diagnostic; carries the bashism bit.
    Bashism(Diagnostic),
    /// A skip/eligibility notice; the associated bits are returned by the
    /// scan functions, not by the event itself.
    Warning(String),
}

/// Process-wide exit-status bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitStatus(u8);

impl ExitStatus {
    /// Nothing found, all files readable.
    pub const CLEAN: ExitStatus = ExitStatus(0);
    /// At least one bashism matched.
    pub const BASHISM: ExitStatus = ExitStatus(1);
    /// At least one file was unreadable or rejected as non-shell.
    pub const FILE_ERROR: ExitStatus = ExitStatus(2);

    /// Whether all bits of `other` are set in `self`.
    pub fn contains(self, other: ExitStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_clean(self) -> bool {
        self.0 == 0
    }

    /// The value to pass to `process::exit`.
    pub fn code(self) -> i32 {
        i32::from(self.0)
    }
}

impl BitOr for ExitStatus {
    type Output = ExitStatus;

    fn bitor(self, rhs: ExitStatus) -> ExitStatus {
        ExitStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExitStatus {
    fn bitor_assign(&mut self, rhs: ExitStatus) {
        self.0 |= rhs.0;
    }
}
