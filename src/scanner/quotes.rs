//! Escape-aware quote-region scanning.
//!
//! A single pass over a line records every balanced single- or
//! double-quoted region plus any quote left open at end of line. From that
//! record the scanner derives the working copies it needs: an
//! offset-preserving copy with quoted content blanked to spaces (for
//! locating comments and heredoc operators) and collapsed copies with
//! quoted content dropped (for pattern matching).
//!
//! Quoting rules follow sh: a backslash escapes the next character outside
//! quotes and inside double quotes; nothing is special inside single
//! quotes; the other quote character is literal inside an open region.

/// Which quoted regions a derived copy should remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    /// Only single-quoted regions.
    SingleQuoted,
    /// Both single- and double-quoted regions.
    AllQuoted,
}

impl Mask {
    pub(crate) fn covers(self, quote: char) -> bool {
        match self {
            Mask::SingleQuoted => quote == '\'',
            Mask::AllQuoted => true,
        }
    }
}

/// A balanced quoted region; offsets are byte positions of the delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRegion {
    pub start: usize,
    pub end: usize,
    pub quote: char,
}

/// A quote opened but not closed on this line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenQuote {
    pub quote: char,
    pub start: usize,
}

/// The quoting structure of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteScan {
    pub regions: Vec<QuoteRegion>,
    pub open: Option<OpenQuote>,
}

/// Scan `line` for quoted regions.
pub fn scan_quotes(line: &str) -> QuoteScan {
    let mut regions = Vec::new();
    let mut state: Option<(char, usize)> = None;
    let mut iter = line.char_indices();

    while let Some((i, c)) = iter.next() {
        match state {
            None => match c {
                '\\' => {
                    iter.next();
                }
                '\'' | '"' => state = Some((c, i)),
                _ => {}
            },
            Some(('\'', start)) => {
                if c == '\'' {
                    regions.push(QuoteRegion {
                        start,
                        end: i,
                        quote: '\'',
                    });
                    state = None;
                }
            }
            Some(('"', start)) => match c {
                '\\' => {
                    iter.next();
                }
                '"' => {
                    regions.push(QuoteRegion {
                        start,
                        end: i,
                        quote: '"',
                    });
                    state = None;
                }
                _ => {}
            },
            Some(_) => unreachable!("only quote characters enter the state"),
        }
    }

    let open = state.map(|(quote, start)| OpenQuote { quote, start });
    QuoteScan { regions, open }
}

/// An offset-preserving copy of `line` with the content of masked regions
/// (and of any open region's tail) replaced by spaces. Delimiters are kept.
pub fn blank_quoted(line: &str, scan: &QuoteScan, mask: Mask) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pos = 0;

    for region in &scan.regions {
        if !mask.covers(region.quote) {
            continue;
        }
        out.push_str(&line[pos..=region.start]);
        let content_len = region.end - region.start - 1;
        for _ in 0..content_len {
            out.push(' ');
        }
        out.push_str(&line[region.end..=region.end]);
        pos = region.end + 1;
    }

    match scan.open {
        Some(open) if mask.covers(open.quote) => {
            out.push_str(&line[pos..=open.start]);
            for _ in 0..line.len() - open.start - 1 {
                out.push(' ');
            }
        }
        _ => out.push_str(&line[pos..]),
    }

    out
}

/// A copy of `line` with the content of masked balanced regions dropped,
/// keeping the delimiters (`echo "hello world"` becomes `echo ""`). An open
/// region's tail is left as-is; callers truncate at the opening delimiter.
pub fn collapse_quoted(line: &str, scan: &QuoteScan, mask: Mask) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pos = 0;

    for region in &scan.regions {
        if !mask.covers(region.quote) {
            continue;
        }
        out.push_str(&line[pos..=region.start]);
        out.push_str(&line[region.end..=region.end]);
        pos = region.end + 1;
    }
    out.push_str(&line[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_regions() {
        let scan = scan_quotes(r#"echo "a b" 'c d' end"#);
        assert_eq!(scan.regions.len(), 2);
        assert_eq!(scan.regions[0].quote, '"');
        assert_eq!(scan.regions[1].quote, '\'');
        assert!(scan.open.is_none());
    }

    #[test]
    fn test_open_quote_detected() {
        let scan = scan_quotes(r#"echo "starts here"#);
        assert!(scan.regions.is_empty());
        let open = scan.open.expect("quote should be open");
        assert_eq!(open.quote, '"');
        assert_eq!(open.start, 5);
    }

    #[test]
    fn test_escaped_quote_does_not_open() {
        let scan = scan_quotes(r#"echo \"not quoted\" x"#);
        assert!(scan.regions.is_empty());
        assert!(scan.open.is_none());
    }

    #[test]
    fn test_single_inside_double_is_literal() {
        let scan = scan_quotes(r#"echo "don't panic""#);
        assert_eq!(scan.regions.len(), 1);
        assert_eq!(scan.regions[0].quote, '"');
        assert!(scan.open.is_none());
    }

    #[test]
    fn test_escaped_quote_inside_double() {
        let scan = scan_quotes(r#"echo "a \" b" tail"#);
        assert_eq!(scan.regions.len(), 1);
        assert!(scan.open.is_none());
    }

    #[test]
    fn test_blank_preserves_offsets() {
        let line = r##"echo "# x" # real"##;
        let scan = scan_quotes(line);
        let blanked = blank_quoted(line, &scan, Mask::AllQuoted);
        assert_eq!(blanked.len(), line.len());
        assert_eq!(&blanked, r##"echo "   " # real"##);
        // The '#' inside quotes is gone; the real one kept its offset.
        assert_eq!(blanked.find('#'), line.rfind('#').into());
    }

    #[test]
    fn test_blank_covers_open_tail() {
        let line = r#"echo "no # here"#;
        let scan = scan_quotes(line);
        let blanked = blank_quoted(line, &scan, Mask::AllQuoted);
        assert!(!blanked.contains('#'));
        assert_eq!(blanked.len(), line.len());
    }

    #[test]
    fn test_collapse_single_only_keeps_double() {
        let line = r#"echo '$RANDOM' "$RANDOM""#;
        let scan = scan_quotes(line);
        let collapsed = collapse_quoted(line, &scan, Mask::SingleQuoted);
        assert_eq!(collapsed, r#"echo '' "$RANDOM""#);
    }

    #[test]
    fn test_collapse_all() {
        let line = r#"echo '$RANDOM' "$RANDOM" $RANDOM"#;
        let scan = scan_quotes(line);
        let collapsed = collapse_quoted(line, &scan, Mask::AllQuoted);
        assert_eq!(collapsed, r#"echo '' "" $RANDOM"#);
    }
}
