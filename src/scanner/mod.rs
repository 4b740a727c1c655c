//! The per-file line scanner.
//!
//! Scanning is a single pass over the lines of one file. The first line
//! picks the construct tables (shell or Makefile mode) and may reject the
//! file outright. Every following line runs through a fixed pipeline:
//! Makefile preprocessing, multi-line quote continuation, comment handling,
//! heredoc body skipping, nested-shell suppression, quote-state detection,
//! pattern application, and finally heredoc-start detection. Diagnostics
//! stream to the caller's sink the moment they are found.
//!
//! This is an approximate tokenizer, not a shell parser; the quote and
//! heredoc state it keeps is exactly enough to avoid flagging constructs
//! inside literal text.

pub mod quotes;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ScanError;
use crate::patterns::{PatternEntry, PatternOptions, PatternTables, TableCache, TableMode};
use crate::preamble;
use crate::report::{Diagnostic, ExitStatus, ScanEvent};
use self::quotes::{Mask, QuoteScan};

static INTERPRETER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#!\s*(\S+)").expect("interpreter pattern should compile"));

static NESTED_SHELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s+)(?:(?:/usr)?/bin/)?(?:(?:b|d)?a|k|z|t?c)sh\s+-c\s*.+")
        .expect("nested shell pattern should compile")
});

static HEREDOC_OP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:&|\d)?<<-?").expect("heredoc pattern should compile"));

static MAKEFILE_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w%.,/+-]+:").expect("rule pattern should compile"));

static MAKEFILE_SHELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:override\s+)?SHELL\s*:{0,2}=\s*(?:\S*/)?bash(?:\s|$)")
        .expect("SHELL pattern should compile")
});

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}\.\s+([^\s;]+)\s+([^\s;]+)",
        crate::patterns::LEADIN
    ))
    .expect("source pattern should compile")
});

static SOURCE_ARG_OP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:&|\||\d?[<>])").expect("operator pattern should compile"));

/// Per-invocation scanning options, shared by every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Skip the wrapper and interpreter eligibility checks.
    pub force: bool,
    /// Enable the pedantic pattern set.
    pub extra: bool,
    /// Flag `echo -n`.
    pub echo_newline: bool,
}

/// An open heredoc; body lines are opaque until the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heredoc {
    terminator: String,
    strip_tabs: bool,
}

/// Per-file state carried from line to line. At most one of `quote` and
/// `heredoc` is active: heredoc starts are not recognized while a quoted
/// block is open.
#[derive(Debug, Default)]
struct ScanState {
    quote: Option<char>,
    heredoc: Option<Heredoc>,
    last_continued: bool,
    continued: bool,
    found_rules: bool,
}

enum Gate {
    Proceed(TableMode),
    Skip(ExitStatus),
}

fn interpreter_gate(
    first: &str,
    display: &Path,
    opts: &ScanOptions,
    sink: &mut dyn FnMut(ScanEvent),
) -> Gate {
    if let Some(caps) = INTERPRETER_RE.captures(first) {
        let interpreter = &caps[1];
        let base = interpreter.rsplit('/').next().unwrap_or(interpreter);
        if base == "make" {
            return Gate::Proceed(TableMode::Makefile);
        }
        if !opts.force {
            if interpreter.ends_with("/bash") {
                sink(ScanEvent::Warning(format!(
                    "script {} is already a bash script; skipping",
                    display.display()
                )));
                return Gate::Skip(ExitStatus::FILE_ERROR);
            }
            if !interpreter.ends_with("/sh") && !interpreter.ends_with("/posh") {
                sink(ScanEvent::Warning(format!(
                    "script {} does not appear to be a /bin/sh script; skipping",
                    display.display()
                )));
                return Gate::Skip(ExitStatus::FILE_ERROR);
            }
        }
    } else {
        sink(ScanEvent::Warning(format!(
            "script {} does not appear to have a #!/bin/sh interpreter line;\nyou may get strange results",
            display.display()
        )));
    }
    Gate::Proceed(TableMode::Shell)
}

/// Whether a line ends with an unescaped backslash; an even run of
/// trailing backslashes is literal backslashes, not a continuation.
fn ends_continued(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Index of the first unescaped closing `quote` in `line`.
fn close_quote_index(line: &str, quote: char) -> Option<usize> {
    if quote == '\'' {
        // Nothing is special inside single quotes.
        return line.find('\'');
    }
    let mut iter = line.char_indices();
    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => {
                iter.next();
            }
            c if c == quote => return Some(i),
            _ => {}
        }
    }
    None
}

/// Index of the first `#` starting a word, given a copy with quoted
/// content blanked out. `$#` and `foo#bar` do not start comments.
fn comment_offset(blanked: &str) -> Option<usize> {
    let bytes = blanked.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return Some(i);
        }
    }
    None
}

/// Bytes a masked region would drop from positions before `pos`.
fn collapsed_offset(scan: &QuoteScan, mask: Mask, pos: usize) -> usize {
    let mut dropped = 0;
    for region in &scan.regions {
        if region.end < pos && mask.covers(region.quote) {
            dropped += region.end - region.start - 1;
        }
    }
    pos - dropped
}

/// Find a heredoc operator in `blanked` (offsets valid in `working` too)
/// and parse its terminator word from `working`. `<<<` here-strings and
/// `>>`/`<<` run-ons are not operators.
fn heredoc_start(blanked: &str, working: &str) -> Option<Heredoc> {
    let bytes = blanked.as_bytes();
    for m in HEREDOC_OP_RE.find_iter(blanked) {
        let lt = if m.as_str().starts_with('<') {
            m.start()
        } else {
            m.start() + 1
        };
        if lt > 0 && matches!(bytes[lt - 1], b'<' | b'>') {
            continue;
        }
        if m.end() < bytes.len() && bytes[m.end()] == b'<' {
            continue;
        }
        let strip_tabs = m.as_str().ends_with('-');
        let rest = working[m.end()..].trim_start_matches([' ', '\t']);
        let rest = rest.strip_prefix('\\').unwrap_or(rest);
        let terminator = if let Some(stripped) = rest.strip_prefix('\'') {
            stripped.split('\'').next().unwrap_or("")
        } else if let Some(stripped) = rest.strip_prefix('"') {
            stripped.split('"').next().unwrap_or("")
        } else {
            rest.split([' ', '\t', ';', '&', ')', '<', '>'])
                .next()
                .unwrap_or("")
        };
        if terminator.is_empty() {
            continue;
        }
        return Some(Heredoc {
            terminator: terminator.to_string(),
            strip_tabs,
        });
    }
    None
}

struct LineChecker<'a> {
    file: &'a Path,
    mode: TableMode,
    tables: &'a PatternTables,
    state: ScanState,
}

impl<'a> LineChecker<'a> {
    fn new(file: &'a Path, mode: TableMode, tables: &'a PatternTables) -> Self {
        LineChecker {
            file,
            mode,
            tables,
            state: ScanState::default(),
        }
    }

    fn apply(
        &self,
        entries: &[PatternEntry],
        copy: &str,
        raw: &str,
        lineno: usize,
        status: &mut ExitStatus,
        sink: &mut dyn FnMut(ScanEvent),
    ) {
        for entry in entries {
            if let Some(m) = entry.regex.find(copy) {
                *status |= ExitStatus::BASHISM;
                sink(ScanEvent::Bashism(Diagnostic {
                    file: self.file.to_path_buf(),
                    line: lineno,
                    text: raw.to_string(),
                    matched: m.as_str().to_string(),
                    explanation: entry.explanation.to_string(),
                }));
            }
        }
    }

    /// Run one line through the pipeline. Returns `false` when scanning of
    /// the whole file should stop.
    fn check_line(
        &mut self,
        raw: &str,
        lineno: usize,
        status: &mut ExitStatus,
        sink: &mut dyn FnMut(ScanEvent),
    ) -> bool {
        let mut working = raw.to_string();
        let mut apply_patterns = true;

        if self.mode == TableMode::Makefile {
            self.state.last_continued = self.state.continued;
            self.state.continued = ends_continued(&working);
            // Rule headers start in column 0; continuation lines are still
            // part of the previous logical line.
            if !self.state.last_continued && MAKEFILE_RULE_RE.is_match(&working) {
                self.state.found_rules = true;
            }
            if MAKEFILE_SHELL_RE.is_match(&working) {
                sink(ScanEvent::Warning(format!(
                    "script {} sets SHELL to bash at line {}; skipping the remainder",
                    self.file.display(),
                    lineno
                )));
                return false;
            }
            if let Some(stripped) = working.strip_prefix('\t') {
                working = stripped.to_string();
            }
            working = working.replace("$$", "$");
            // Before the first rule the file is make syntax, not shell.
            if !self.state.found_rules {
                apply_patterns = false;
            }
        }

        if let Some(q) = self.state.quote {
            match close_quote_index(&working, q) {
                Some(i) => {
                    working = working[i + 1..].to_string();
                    self.state.quote = None;
                }
                None => return true,
            }
        }

        if working.trim_start().starts_with('#') {
            return true;
        }

        let scan = quotes::scan_quotes(&working);
        let blanked = quotes::blank_quoted(&working, &scan, Mask::AllQuoted);
        if let Some(i) = comment_offset(&blanked) {
            working.truncate(i);
        }

        if let Some(heredoc) = &self.state.heredoc {
            let body = if heredoc.strip_tabs {
                working.trim_start_matches('\t')
            } else {
                working.as_str()
            };
            if body.trim() == heredoc.terminator {
                self.state.heredoc = None;
            }
            return true;
        }

        let suppress = NESTED_SHELL_RE.is_match(&working);

        let scan = quotes::scan_quotes(&working);
        let mut intact = working.clone();
        let mut single_collapsed = quotes::collapse_quoted(&working, &scan, Mask::SingleQuoted);
        let mut all_collapsed = quotes::collapse_quoted(&working, &scan, Mask::AllQuoted);
        if let Some(open) = scan.open {
            self.state.quote = Some(open.quote);
            // Keep the opening delimiter, drop the unterminated tail.
            intact.truncate(open.start + 1);
            single_collapsed.truncate(collapsed_offset(&scan, Mask::SingleQuoted, open.start) + 1);
            all_collapsed.truncate(collapsed_offset(&scan, Mask::AllQuoted, open.start) + 1);
        }

        if apply_patterns && !suppress {
            if let Some(caps) = SOURCE_RE.captures(&all_collapsed) {
                if let Some(arg) = caps.get(2) {
                    if !SOURCE_ARG_OP_RE.is_match(arg.as_str()) {
                        *status |= ExitStatus::BASHISM;
                        sink(ScanEvent::Bashism(Diagnostic {
                            file: self.file.to_path_buf(),
                            line: lineno,
                            text: raw.to_string(),
                            matched: caps[0].to_string(),
                            explanation: "sourced script with arguments".to_string(),
                        }));
                    }
                }
            }
            self.apply(
                &self.tables.singlequote_bashisms,
                &intact,
                raw,
                lineno,
                status,
                sink,
            );
            self.apply(
                &self.tables.string_bashisms,
                &single_collapsed,
                raw,
                lineno,
                status,
                sink,
            );
            self.apply(&self.tables.bashisms, &all_collapsed, raw, lineno, status, sink);
        }

        if self.state.quote.is_none() && self.state.heredoc.is_none() {
            let blanked = quotes::blank_quoted(&working, &scan, Mask::AllQuoted);
            self.state.heredoc = heredoc_start(&blanked, &working);
        }

        true
    }
}

/// Scan lines from an already-open reader. `cutoff` limits scanning to the
/// first `n` physical lines (the eligible prefix of a wrapper script).
pub fn scan_lines<R: BufRead>(
    reader: R,
    display: &Path,
    opts: &ScanOptions,
    cache: &mut TableCache,
    cutoff: Option<usize>,
    sink: &mut dyn FnMut(ScanEvent),
) -> Result<ExitStatus, ScanError> {
    let mut status = ExitStatus::CLEAN;
    if cutoff == Some(0) {
        return Ok(status);
    }

    let mut lines = reader.lines();
    let first = match lines.next() {
        Some(line) => line.map_err(|source| ScanError::Read {
            path: display.to_path_buf(),
            source,
        })?,
        None => return Ok(status),
    };

    let mode = match interpreter_gate(&first, display, opts, sink) {
        Gate::Proceed(mode) => mode,
        Gate::Skip(bits) => return Ok(bits),
    };

    let tables = cache.get(PatternOptions {
        mode,
        extra: opts.extra,
        echo_newline: opts.echo_newline,
    });
    let mut checker = LineChecker::new(display, mode, tables);

    let mut lineno = 1;
    if !checker.check_line(&first, lineno, &mut status, sink) {
        return Ok(status);
    }
    for line in lines {
        lineno += 1;
        if let Some(limit) = cutoff {
            if lineno > limit {
                break;
            }
        }
        let line = line.map_err(|source| ScanError::Read {
            path: display.to_path_buf(),
            source,
        })?;
        if !checker.check_line(&line, lineno, &mut status, sink) {
            break;
        }
    }
    Ok(status)
}

/// Scan one file from disk: wrapper classification (unless forced), open,
/// and the line scan. I/O failures become warnings plus the file-error bit;
/// scanning always moves on to the caller's next file.
pub fn scan_path(
    path: &Path,
    opts: &ScanOptions,
    cache: &mut TableCache,
    sink: &mut dyn FnMut(ScanEvent),
) -> ExitStatus {
    let cutoff = if opts.force {
        None
    } else {
        match preamble::wrapper_prefix(path) {
            Ok(Some(n)) => {
                sink(ScanEvent::Warning(format!(
                    "script {} is a shell wrapper; only checking the first {} lines",
                    path.display(),
                    n
                )));
                Some(n)
            }
            Ok(None) => None,
            Err(err) => {
                sink(ScanEvent::Warning(err.to_string()));
                return ExitStatus::FILE_ERROR;
            }
        }
    };

    let file = match File::open(path) {
        Ok(file) => file,
        Err(source) => {
            let err = ScanError::Unreadable {
                path: path.to_path_buf(),
                source,
            };
            sink(ScanEvent::Warning(err.to_string()));
            return ExitStatus::FILE_ERROR;
        }
    };

    match scan_lines(BufReader::new(file), path, opts, cache, cutoff, sink) {
        Ok(status) => status,
        Err(err) => {
            sink(ScanEvent::Warning(err.to_string()));
            ExitStatus::FILE_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(script: &str, opts: &ScanOptions) -> (Vec<ScanEvent>, ExitStatus) {
        let mut cache = TableCache::new();
        run_with_cache(script, opts, &mut cache)
    }

    fn run_with_cache(
        script: &str,
        opts: &ScanOptions,
        cache: &mut TableCache,
    ) -> (Vec<ScanEvent>, ExitStatus) {
        let mut events = Vec::new();
        let status = scan_lines(
            Cursor::new(script),
            Path::new("test.sh"),
            opts,
            cache,
            None,
            &mut |event| events.push(event),
        )
        .expect("in-memory reads cannot fail");
        (events, status)
    }

    fn bashisms(events: &[ScanEvent]) -> Vec<&Diagnostic> {
        events
            .iter()
            .filter_map(|event| match event {
                ScanEvent::Bashism(diag) => Some(diag),
                ScanEvent::Warning(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_close_quote_index_skips_escapes() {
        assert_eq!(close_quote_index(r#"a \" b" c"#, '"'), Some(6));
        assert_eq!(close_quote_index("no close", '"'), None);
        assert_eq!(close_quote_index(r"it\'s", '\''), Some(3));
    }

    #[test]
    fn test_comment_offset_requires_word_start() {
        assert_eq!(comment_offset("echo hi # tail"), Some(8));
        assert_eq!(comment_offset("echo $#"), None);
        assert_eq!(comment_offset("foo#bar"), None);
        assert_eq!(comment_offset("# full"), Some(0));
    }

    #[test]
    fn test_heredoc_start_parses_terminators() {
        let h = heredoc_start("cat <<EOF", "cat <<EOF").expect("plain");
        assert_eq!(h.terminator, "EOF");
        assert!(!h.strip_tabs);

        let line = "cat <<-'END'";
        let blanked = "cat <<-'   '";
        let h = heredoc_start(blanked, line).expect("quoted");
        assert_eq!(h.terminator, "END");
        assert!(h.strip_tabs);

        assert!(heredoc_start("cat <<< word", "cat <<< word").is_none());
        assert!(heredoc_start("cat <<", "cat <<").is_none());
    }

    #[test]
    fn test_double_bracket_diagnostic() {
        let (events, status) = run("#!/bin/sh\nif [[ -f foo ]]; then\n:\nfi\n", &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].text, "if [[ -f foo ]]; then");
        assert_eq!(
            found[0].explanation,
            "alternative test command ([[ foo ]] should be [ foo ])"
        );
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_heredoc_body_is_opaque() {
        let script = "#!/bin/sh\ncat <<EOF\nif [[ -f x ]]; then\nEOF\necho ${a/b/c}\n";
        let (events, status) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 5);
        assert_eq!(found[0].explanation, "${parm/?/pat[/str]}");
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_bash_shebang_is_skipped() {
        let (events, status) = run("#!/bin/bash\nif [[ x ]]; then\n", &ScanOptions::default());
        assert!(bashisms(&events).is_empty());
        assert_eq!(events.len(), 1);
        match &events[0] {
            ScanEvent::Warning(text) => assert!(text.contains("already a bash script")),
            other => panic!("expected a warning, got {other:?}"),
        }
        assert_eq!(status, ExitStatus::FILE_ERROR);
    }

    #[test]
    fn test_force_mode_scans_bash_scripts() {
        let opts = ScanOptions {
            force: true,
            ..ScanOptions::default()
        };
        let (events, status) = run("#!/bin/bash\nif [[ x ]]; then\n", &opts);
        assert_eq!(bashisms(&events).len(), 1);
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_missing_shebang_warns_but_scans() {
        let (events, status) = run("echo $RANDOM\n", &ScanOptions::default());
        assert_eq!(bashisms(&events).len(), 1);
        assert!(events.iter().any(|event| matches!(
            event,
            ScanEvent::Warning(text) if text.contains("interpreter line")
        )));
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_echo_n_needs_the_newline_flag() {
        let script = "#!/bin/sh\necho -n hello\n";
        let (events, status) = run(script, &ScanOptions::default());
        assert!(bashisms(&events).is_empty());
        assert!(status.is_clean());

        let opts = ScanOptions {
            echo_newline: true,
            ..ScanOptions::default()
        };
        let (events, status) = run(script, &opts);
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].explanation, "echo -n");
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_single_quotes_suppress_string_constructs() {
        let (events, status) = run("#!/bin/sh\necho '$RANDOM'\n", &ScanOptions::default());
        assert!(events.is_empty());
        assert!(status.is_clean());

        let (events, _) = run("#!/bin/sh\necho \"$RANDOM\"\n", &ScanOptions::default());
        assert_eq!(bashisms(&events).len(), 1);
    }

    #[test]
    fn test_comments_are_not_scanned() {
        let script = "#!/bin/sh\n# if [[ x ]]; then\necho hi # declare -i y\n";
        let (events, status) = run(script, &ScanOptions::default());
        assert!(events.is_empty());
        assert!(status.is_clean());
    }

    #[test]
    fn test_nested_shell_lines_are_suppressed() {
        let (events, status) = run("#!/bin/sh\nbash -c 'echo $RANDOM'\n", &ScanOptions::default());
        assert!(events.is_empty());
        assert!(status.is_clean());
    }

    #[test]
    fn test_multiline_quote_block() {
        let script = "#!/bin/sh\necho \"start\nif [[ inside ]]; then\nend\"\ndeclare -i y\n";
        let (events, _) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 5);
        assert_eq!(found[0].explanation, "'declare' is not POSIX");
    }

    #[test]
    fn test_sourced_with_arguments() {
        let (events, _) = run("#!/bin/sh\n. ./lib.sh init\n", &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].explanation, "sourced script with arguments");

        // A redirection is not an argument.
        let (events, _) = run("#!/bin/sh\n. ./lib.sh 2>/dev/null\n", &ScanOptions::default());
        assert!(bashisms(&events).is_empty());
    }

    #[test]
    fn test_sourced_with_arguments_mid_statement() {
        let script = "#!/bin/sh\nif true; then . ./lib.sh conf; fi\n";
        let (events, _) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].explanation, "sourced script with arguments");

        let (events, _) = run("#!/bin/sh\ntrue && . ./lib.sh conf\n", &ScanOptions::default());
        assert_eq!(bashisms(&events).len(), 1);
    }

    #[test]
    fn test_makefile_mode_checks_recipes_only() {
        let script =
            "#!/usr/bin/make -f\nVAR += unchecked\nall:\n\tif [[ -f x ]]; then echo y; fi\n";
        let (events, status) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 4);
        assert_eq!(
            found[0].explanation,
            "alternative test command ([[ foo ]] should be [ foo ])"
        );
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_makefile_shell_bash_stops_the_file() {
        let script = "#!/usr/bin/make -f\nSHELL := /bin/bash\nall:\n\tdeclare -i y\n";
        let (events, status) = run(script, &ScanOptions::default());
        assert!(bashisms(&events).is_empty());
        assert!(events.iter().any(|event| matches!(
            event,
            ScanEvent::Warning(text) if text.contains("sets SHELL to bash")
        )));
        assert!(status.is_clean());
    }

    #[test]
    fn test_escaped_backslash_is_not_a_continuation() {
        assert!(ends_continued("DEPS = foo \\"));
        assert!(!ends_continued("DEPS = foo\\\\"));
        assert!(ends_continued("DEPS = foo\\\\\\"));
        assert!(!ends_continued("DEPS = foo"));

        // A line ending in a literal backslash does not swallow the rule
        // header on the next line.
        let script = "#!/usr/bin/make -f\nDEPS = foo\\\\\nall:\n\tdeclare -i x\n";
        let (events, _) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 4);
    }

    #[test]
    fn test_makefile_double_dollar_collapses() {
        let script = "#!/usr/bin/make -f\nall:\n\techo $$RANDOM\n";
        let (events, _) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].explanation, "$RANDOM");
    }

    #[test]
    fn test_heredoc_dash_with_quoted_terminator() {
        let script = "#!/bin/sh\ncat <<-'EOF'\n\tdeclare x\n\tEOF\ndeclare -i y\n";
        let (events, _) = run(script, &ScanOptions::default());
        let found = bashisms(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 5);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let script = "#!/bin/sh\nif [[ -f foo ]]; then\ncat <<EOF\n$RANDOM\nEOF\necho done\n";
        let mut cache = TableCache::new();
        let (first_events, first_status) =
            run_with_cache(script, &ScanOptions::default(), &mut cache);
        let (second_events, second_status) =
            run_with_cache(script, &ScanOptions::default(), &mut cache);
        assert_eq!(first_events, second_events);
        assert_eq!(first_status, second_status);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cutoff_limits_scanned_lines() {
        let script = "#!/bin/sh\ndeclare -i a\ndeclare -i b\n";
        let mut cache = TableCache::new();
        let mut events = Vec::new();
        let status = scan_lines(
            Cursor::new(script),
            Path::new("test.sh"),
            &ScanOptions::default(),
            &mut cache,
            Some(2),
            &mut |event| events.push(event),
        )
        .expect("in-memory reads cannot fail");
        assert_eq!(bashisms(&events).len(), 1);
        assert_eq!(status, ExitStatus::BASHISM);
    }

    #[test]
    fn test_scan_path_missing_file() {
        let mut cache = TableCache::new();
        let mut events = Vec::new();
        let status = scan_path(
            Path::new("/nonexistent/portsh-test.sh"),
            &ScanOptions::default(),
            &mut cache,
            &mut |event| events.push(event),
        );
        assert_eq!(status, ExitStatus::FILE_ERROR);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ScanEvent::Warning(text) => assert!(text.contains("cannot open script")),
            other => panic!("expected a warning, got {other:?}"),
        }
    }
}
