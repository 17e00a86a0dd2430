//! Lazy tokenizer with structural recognition rules.
//!
//! Tokens are produced line by line from any [`BufRead`] source and run
//! through a caller-extensible chain of predicate filters during
//! production, so a large document never has to be materialized in full.
//! Words hyphenated across a line break are joined before tokenization,
//! and e-mail addresses, acronyms, web URLs and IPv4 dotted quads are
//! preserved as single tokens.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::VecDeque;
use std::io::BufRead;

lazy_static! {
    /// Structural rules tried in priority order against each
    /// whitespace-delimited fragment. A full match emits the fragment
    /// unchanged, bypassing the filter chain.
    static ref RULES: [Regex; 4] = [
        // E-mail address
        Regex::new(r"\A[-A-Za-z0-9_.]+@[A-Za-z][A-Za-z0-9_]+\.[a-z]+\z").expect("valid regex"),
        // Acronym, with or without periods (C.A.T or CAT)
        Regex::new(r"\A[A-Z](?:\.?[A-Z])+\z").expect("valid regex"),
        // Web address
        Regex::new(r"\A(?:https?|ftp|file)://[-a-zA-Z0-9+&@#/%?=~_|!:,.;]*[-a-zA-Z0-9+&@#/%=~_|]\z")
            .expect("valid regex"),
        // IPv4 dotted quad
        Regex::new(r"\A(?:\d{1,3})(?:\.\d{1,3}){3}\z").expect("valid regex"),
    ];
    static ref LEADING_JUNK: Regex = Regex::new(r"\A[^A-Za-z0-9]+").expect("valid regex");
    // A trailing hyphen survives trimming; the numeric check below
    // treats combined forms such as 10-10 as one number.
    static ref TRAILING_JUNK: Regex = Regex::new(r"[^-A-Za-z0-9]+\z").expect("valid regex");
    static ref SPLIT: Regex = Regex::new(r"[^\sA-Za-z0-9]+").expect("valid regex");
    static ref NUMERIC: Regex = Regex::new(r"\A(?:-?\d+(?:\.\d+)?)+\z").expect("valid regex");
}

/// True for purely numeric strings, including hyphen-combined forms
/// such as `10-10` and decimals such as `3.14`.
pub fn is_numeric(value: &str) -> bool {
    NUMERIC.is_match(value)
}

type Filter<'a> = Box<dyn Fn(&str) -> bool + 'a>;

/// Single-pass token iterator over a buffered source.
///
/// Filters combine with logical AND on top of the built-in non-empty
/// check and must all be installed before consumption begins.
pub struct Tokenizer<'a, R: BufRead> {
    source: R,
    buffer: VecDeque<String>,
    /// Accumulates lines joined across hyphenated line breaks.
    pending: String,
    filters: Vec<Filter<'a>>,
    exhausted: bool,
}

impl<'a, R: BufRead> Tokenizer<'a, R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
            pending: String::new(),
            filters: vec![Box::new(|t: &str| !t.is_empty())],
            exhausted: false,
        }
    }

    /// Install an additional token predicate. Filtering happens inline
    /// while tokens are produced, never as a post-pass.
    pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + 'a) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    fn accept(&self, token: &str) -> bool {
        self.filters.iter().all(|f| f(token))
    }

    /// Read lines until at least one token is buffered or the source is
    /// drained. A line that cannot be read is logged and skipped.
    fn fill(&mut self) {
        while self.buffer.is_empty() && !self.exhausted {
            let mut raw = String::new();
            match self.source.read_line(&mut raw) {
                Ok(0) => {
                    self.exhausted = true;
                    if !self.pending.is_empty() {
                        let line = std::mem::take(&mut self.pending);
                        self.scan_line(&line);
                    }
                }
                Ok(_) => {
                    let cleaned: String = raw
                        .trim()
                        .chars()
                        .filter(|c| ('\x20'..='\x7e').contains(c))
                        .collect();
                    self.pending.push_str(&cleaned);
                    if self.pending.is_empty() {
                        continue;
                    }
                    if self.pending.ends_with('-') {
                        // Word hyphenated across a line break: join with
                        // the next line before tokenizing.
                        self.pending.pop();
                        continue;
                    }
                    let line = std::mem::take(&mut self.pending);
                    self.scan_line(&line);
                }
                Err(err) => {
                    tracing::warn!(%err, "unable to tokenize line, skipping");
                    if err.kind() != std::io::ErrorKind::InvalidData {
                        self.exhausted = true;
                    }
                }
            }
        }
    }

    fn scan_line(&mut self, line: &str) {
        for fragment in line.split_whitespace() {
            let trimmed = LEADING_JUNK.replace(fragment, "");
            let trimmed = TRAILING_JUNK.replace(&trimmed, "");
            if RULES.iter().any(|rule| rule.is_match(&trimmed)) {
                self.buffer.push_back(trimmed.into_owned());
                continue;
            }
            // Capitalized multi-word phrases and quote-delimited phrases
            // are intentionally not joined into single tokens; joining
            // them would break phrasal query resolution.
            for piece in SPLIT.split(&trimmed) {
                let piece = piece.trim();
                if self.accept(piece) {
                    self.buffer.push_back(piece.to_string());
                }
            }
        }
    }
}

impl<'a, R: BufRead> Iterator for Tokenizer<'a, R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            self.fill();
        }
        self.buffer.pop_front()
    }
}
