//! Bashism pattern tables.
//!
//! Three ordered tables of (regex, explanation) pairs, each applied to a
//! differently-stripped copy of a line:
//!
//! - [`PatternTables::bashisms`] — checked after both single- and
//!   double-quoted regions have been collapsed;
//! - [`PatternTables::string_bashisms`] — checked with double-quoted
//!   regions intact (constructs that still expand inside double quotes,
//!   e.g. `$RANDOM`);
//! - [`PatternTables::singlequote_bashisms`] — checked with all quoting
//!   intact (e.g. unsafe `echo` backslash escapes inside single quotes).
//!
//! Tables are built by a pure function of [`PatternOptions`] and memoized
//! in a [`TableCache`], so switching between shell and Makefile mode from
//! one file to the next is a lookup, not a rebuild. Entries live in `Vec`s
//! so the order diagnostics come out in is deterministic.

use regex::Regex;
use std::collections::HashMap;

/// Statement-boundary prefix shared by most patterns: start of line, after
/// `` ` ``/`&`/`;`/`(`/`|`/`{`, or after `if`/`then`/`do`/`while`/`shell`.
/// Keeps keywords from matching as substrings of identifiers or arguments.
pub(crate) const LEADIN: &str = r"(?:(?:^|[`&;(|{])\s*|(?:if|then|do|while|shell)\s+)";

/// Which construct set applies to the current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableMode {
    /// Plain `/bin/sh` script.
    Shell,
    /// File interpreted by `make`; recipe lines are shell, but `VAR+=` is
    /// legitimate make syntax and `$(<D)`/`$(<F)` are automatic variables.
    Makefile,
}

/// Parameters the tables are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternOptions {
    pub mode: TableMode,
    /// Pedantic set: `$BASH`, assignments to bash-reserved names, `$SHLVL`.
    pub extra: bool,
    /// Flag `echo -n` (not required for portability by every policy, so
    /// opt-in).
    pub echo_newline: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        PatternOptions {
            mode: TableMode::Shell,
            extra: false,
            echo_newline: false,
        }
    }
}

/// One detectable construct.
#[derive(Debug)]
pub struct PatternEntry {
    pub regex: Regex,
    pub explanation: &'static str,
}

/// The three tables for one [`PatternOptions`] combination.
#[derive(Debug)]
pub struct PatternTables {
    pub bashisms: Vec<PatternEntry>,
    pub string_bashisms: Vec<PatternEntry>,
    pub singlequote_bashisms: Vec<PatternEntry>,
}

fn entry(pattern: &str, explanation: &'static str) -> PatternEntry {
    PatternEntry {
        regex: Regex::new(pattern).expect("bashism pattern should compile"),
        explanation,
    }
}

fn leadin(tail: &str) -> String {
    format!("{}{}", LEADIN, tail)
}

impl PatternTables {
    /// Build the tables for the given options. Pure; callers memoize via
    /// [`TableCache`].
    pub fn build(opts: PatternOptions) -> Self {
        let mut bashisms = vec![
            entry(
                r"(?:^|\s+)function\s+[\w-]+(?:\s*\(\s*\))?\s*\{",
                "'function' is useless",
            ),
            entry(&leadin(r"select\s+\w+"), "'select' is not POSIX"),
            entry(r"(?:test|\[)\s+\S+\s+==\s", "should be 'b = a'"),
            entry(r"\s\|\&", "pipelining is not POSIX"),
            entry(
                &leadin(r"source\s+(?:\./|/|\$|[\w~.-])\S*"),
                "should be '.', not 'source'",
            ),
            entry(r"<<<", "'<<<' here string"),
            entry(&leadin(r"\(\("), "'((' should be '$(('"),
            entry(&leadin(r"let\s"), "'let ...' should be '$((...))'"),
            entry(&leadin(r"echo\s+-[A-Za-z]*[eE]\b"), "echo -e"),
            entry(
                &leadin(r"\[\["),
                "alternative test command ([[ foo ]] should be [ foo ])",
            ),
            entry(&leadin(r"exec\s+-[acl]"), "exec -c/-a/-l is not POSIX"),
            entry(r"\blocal\s+-[A-Za-z]+", "local with option"),
            entry(r"\blocal\s+\w+=", "local foo=bar"),
            entry(&leadin(r"suspend(?:\s|$)"), "'suspend' is not POSIX"),
            entry(&leadin(r"caller(?:\s|$)"), "'caller' is not POSIX"),
            entry(&leadin(r"compgen(?:\s|$)"), "'compgen' is not POSIX"),
            entry(&leadin(r"complete(?:\s|$)"), "'complete' is not POSIX"),
            entry(&leadin(r"disown(?:\s|$)"), "'disown' is not POSIX"),
            entry(&leadin(r"builtin\s"), "'builtin' is not POSIX"),
            entry(&leadin(r"dirs(?:\s|$)"), "'dirs' is not POSIX"),
            entry(
                &leadin(r"(?:push|pop)d(?:\s|$)"),
                "'pushd'/'popd' are not POSIX",
            ),
            entry(&leadin(r"shopt(?:\s|$)"), "'shopt' is not POSIX"),
            entry(&leadin(r"declare(?:\s|$)"), "'declare' is not POSIX"),
            entry(&leadin(r"typeset(?:\s|$)"), "'typeset' is not POSIX"),
            entry(&leadin(r"ulimit(?:\s|$)"), "'ulimit' is not POSIX"),
            entry(
                &leadin(r"(?:mapfile|readarray)(?:\s|$)"),
                "'mapfile'/'readarray' are not POSIX",
            ),
            entry(&leadin(r"coproc(?:\s|$)"), "'coproc' is not POSIX"),
            entry(r";;?\&", "';&' and ';;&' are not POSIX"),
            entry(
                &leadin(r"read\s+-[A-Za-z]*[a-qs-zA-Z]"),
                "read with option other than -r",
            ),
            entry(&leadin(r"read\s*(?:;|$)"), "read without variable"),
            entry(r"\&>", "should be '>word 2>&1'"),
            entry(r"\d*>\&\s*[A-Za-z_/]", "should be '>word 2>&1'"),
            entry(
                &leadin(r"kill\s+-(?:\d+|[A-Z][A-Za-z0-9]*)\b"),
                "kill -[0-9] or -[A-Z]",
            ),
            entry(r"trap\s+.+\s(?:ERR|DEBUG|RETURN)\b", "trap with ERR|DEBUG|RETURN"),
            entry(
                r"trap\s+.+\sSIG[A-Z]+",
                "trap with SIGfoo (signal names have no 'SIG' prefix)",
            ),
            entry(
                &leadin(r"jobs\s+-[A-Za-z]*[a-km-oq-z]"),
                "'jobs' flags other than -l or -p",
            ),
            entry(
                &leadin(r"export\s+-[A-Za-z]*[a-oq-zA-Z]"),
                "export only takes -p as an option",
            ),
            entry(
                r"(?:^|\s)(?:\S*[^\s$])?\{[^\s{}]*,[^\s{}]*\}",
                "brace expansion",
            ),
            entry(r"\{\w+\.\.\w+\}", "brace expansion, should be seq a b"),
            entry(r"(?:^|\s)\w+\[\d+\]=", "bash arrays, name[index]=value"),
            entry(
                r"\$\(\([^)]*(?:\+\+|--)",
                "'++' and '--' are not POSIX arithmetic operators",
            ),
            entry(r"(?:^|\s)[<>]\(", "process substitution is not POSIX"),
        ];

        match opts.mode {
            TableMode::Shell => {
                bashisms.push(entry(
                    &leadin(r"\w+\+="),
                    "should be VAR=\"${VAR}foo\"",
                ));
                bashisms.push(entry(
                    r"(?:\$\(|`)\s*<\s*\S+\s*(?:\)|`)",
                    "'$(< foo)' should be '$(cat foo)'",
                ));
            }
            TableMode::Makefile => {
                // $(<D) and $(<F) are make automatic variables, not command
                // substitution over a file.
                bashisms.push(entry(
                    r"(?:\$\(|`)\s*<\s*(?:[^\sDF)][^\s)]+|[^\sDF)])\s*(?:\)|`)",
                    "'$(< foo)' should be '$(cat foo)'",
                ));
            }
        }

        if opts.echo_newline {
            bashisms.push(entry(&leadin(r"echo\s+-[A-Za-z]*n"), "echo -n"));
        }

        let mut string_bashisms = vec![
            entry(
                &leadin(r#"echo\s+(?:-[A-Za-z]+\s+)?"[^"]*\\[abcEfnrtv0][^"]*""#),
                "unsafe echo with backslash",
            ),
            entry(r"\$\[\w+\]", "'$[' should be '$(('"),
            entry(r"\$\{\w+:\d+(?::\d+)?\}", "${foo:3[:1]}"),
            entry(r"\$\{\w+/[^}]*\}", "${parm/?/pat[/str]}"),
            entry(r"\$\{#?\w+\[[0-9*@]+\]\}", "bash arrays, ${name[0|*|@]}"),
            entry(r"\$\{!\w+[@*]\}", "${!prefix[*|@]}"),
            entry(r"\$\{!\w+\}", "${!name}"),
            entry(
                r"\$\{\w+(?:\^\^?|,,?)\}",
                "${parm^^} or ${parm,,} case modification",
            ),
            entry(r"\$\{?RANDOM\}?\b", "$RANDOM"),
            entry(r"\$\{?(?:OS|MACH)TYPE\}?\b", "$(OS|MACH)TYPE"),
            entry(r"\$\{?HOST(?:TYPE|NAME)\}?\b", "$HOST(TYPE|NAME)"),
            entry(r"\$\{?DIRSTACK\}?\b", "$DIRSTACK"),
            entry(r"\$\{?EUID\}?\b", "$EUID should be \"$(id -u)\""),
            entry(r"\$\{?UID\}?\b", "$UID should be \"$(id -ru)\""),
            entry(r"\$\{?SECONDS\}?\b", "$SECONDS"),
            entry(r"\$\{?BASH_[A-Z]+\}?\b", "$BASH_SOMETHING"),
            entry(r"\$\{?SHELLOPTS\}?\b", "$SHELLOPTS"),
            entry(r"\$\{?PIPESTATUS\}?\b", "$PIPESTATUS"),
            entry(r"\$\{?FUNCNAME\}?\b", "$FUNCNAME"),
        ];

        if opts.extra {
            string_bashisms.push(entry(r"\$\{?BASH\}?\b", "$BASH"));
            string_bashisms.push(entry(r"(?:^|\s+)RANDOM=", "RANDOM="));
            string_bashisms.push(entry(r"(?:^|\s+)(?:OS|MACH)TYPE=", "OSTYPE=/MACHTYPE="));
            string_bashisms.push(entry(
                r"(?:^|\s+)HOST(?:TYPE|NAME)=",
                "HOSTTYPE=/HOSTNAME=",
            ));
            string_bashisms.push(entry(r"(?:^|\s+)DIRSTACK=", "DIRSTACK="));
            string_bashisms.push(entry(r"(?:^|\s+)EUID=", "EUID="));
            string_bashisms.push(entry(r"(?:^|\s+)UID=", "UID="));
            string_bashisms.push(entry(r"(?:^|\s+)BASH(?:_[A-Z]+)?=", "BASH(_...)="));
            string_bashisms.push(entry(r"(?:^|\s+)SHELLOPTS=", "SHELLOPTS="));
            bashisms.push(entry(r"\$\{?SHLVL\}?\b", "$SHLVL"));
        }

        let singlequote_bashisms = vec![
            entry(
                &leadin(r"echo\s+(?:-[A-Za-z]+\s+)?'[^']*\\[abcEfnrtv0][^']*'"),
                "unsafe echo with backslash",
            ),
            entry(
                r"(?:^|\s+|=)\$'(?:\\.|[^\\'])*'",
                "$'...' should be \"...\"",
            ),
        ];

        PatternTables {
            bashisms,
            string_bashisms,
            singlequote_bashisms,
        }
    }
}

/// Memoizes built tables by their options. The shell/Makefile mode can flip
/// from one input file to the next; each combination is built once.
#[derive(Debug, Default)]
pub struct TableCache {
    cache: HashMap<PatternOptions, PatternTables>,
}

impl TableCache {
    pub fn new() -> Self {
        TableCache::default()
    }

    /// The tables for `opts`, building them on first use.
    pub fn get(&mut self, opts: PatternOptions) -> &PatternTables {
        self.cache
            .entry(opts)
            .or_insert_with(|| PatternTables::build(opts))
    }

    /// How many distinct option combinations have been built.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
