//! Wrapper-script detection.
//!
//! Packaging systems commonly install a small sh wrapper that tweaks the
//! environment and then re-execs the real program via `$0`. Checking the
//! whole file would mean checking the wrapped payload, so the scanner only
//! checks the lines before the re-exec. This module classifies a file as
//! such a wrapper and reports how many physical lines precede the exec.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ScanError;

/// Non-blank, non-comment lines examined before giving up.
const PREAMBLE_BUDGET: usize = 55;

static SELF_ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+)=\$0\s*;").expect("self-assign pattern should compile"));

fn exec_pattern(var: &str) -> Regex {
    let var = regex::escape(var);
    let pattern = format!(
        r#"(?:^\s*|\beval\s*['"]|(?:;|&&|\b(?:then|else))\s*)exec\s+.*\$\{{?{var}\}}?"#
    );
    Regex::new(&pattern).expect("exec pattern should compile")
}

/// Returns `Ok(Some(n))` when `path` is a wrapper script whose re-exec
/// sits on physical line `n + 1`; the first `n` lines are the eligible
/// scanning prefix. `Ok(None)` means the file is not a wrapper.
pub fn wrapper_prefix(path: &Path) -> Result<Option<usize>, ScanError> {
    let file = File::open(path).map_err(|source| ScanError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    // `$0` itself until a self-assignment renames the sentinel.
    let mut var = String::from("0");
    let mut exec_re = exec_pattern(&var);
    let mut examined = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(caps) = SELF_ASSIGN_RE.captures(&line) {
            let name = &caps[1];
            if name != var {
                var = name.to_string();
                exec_re = exec_pattern(&var);
            }
        }
        if exec_re.is_match(&line) {
            return Ok(Some(idx));
        }

        examined += 1;
        if examined >= PREAMBLE_BUDGET {
            break;
        }
    }

    Ok(None)
}
