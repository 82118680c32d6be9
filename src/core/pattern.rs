//! Wildcard (glob) patterns used by `matches(..)` leaves.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use regex::{Regex, RegexBuilder};

use crate::error::PatternError;

/// Glob pattern with its own case-sensitivity flag.
///
/// `*` matches any run of characters, `?` exactly one, `[abc]`/`[a-z]` a class
/// (negated with a leading `!` or `^`), and `\` escapes the next character.
/// Identity (`==`, `Hash`, `Ord`) is the pattern text plus the flag.
#[derive(Clone)]
pub struct WildcardPattern {
    text: String,
    case_sensitive: bool,
    matcher: Regex,
}

#[derive(Debug, PartialEq)]
enum Piece {
    Literal(char),
    AnyRun,
    AnyChar,
    Class(String),
}

fn pieces(text: &str) -> Vec<Piece> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        match chars[pos] {
            '*' => out.push(Piece::AnyRun),
            '?' => out.push(Piece::AnyChar),
            '\\' if pos + 1 < chars.len() => {
                pos += 1;
                out.push(Piece::Literal(chars[pos]));
            }
            '[' => match chars[pos + 1..].iter().position(|c| *c == ']') {
                // `[]` and an unclosed `[` are literal brackets.
                Some(len) if len > 0 => {
                    out.push(Piece::Class(chars[pos + 1..pos + 1 + len].iter().collect()));
                    pos += len + 1;
                }
                _ => out.push(Piece::Literal('[')),
            },
            other => out.push(Piece::Literal(other)),
        }
        pos += 1;
    }
    out
}

fn class_to_regex(body: &str) -> String {
    let mut out = String::from("[");
    let mut chars = body.chars().peekable();
    if matches!(chars.peek(), Some('!') | Some('^')) {
        chars.next();
        out.push('^');
    }
    for ch in chars {
        match ch {
            '-' => out.push('-'),
            '\\' | '[' | ']' | '^' | '&' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            other => out.push(other),
        }
    }
    out.push(']');
    out
}

impl WildcardPattern {
    /// Compiles a glob pattern.
    pub fn new(text: impl Into<String>, case_sensitive: bool) -> Result<Self, PatternError> {
        let text = text.into();
        let mut source = String::from("^");
        for piece in pieces(&text) {
            match piece {
                Piece::Literal(ch) => source.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
                Piece::AnyRun => source.push_str(".*"),
                Piece::AnyChar => source.push('.'),
                Piece::Class(body) => source.push_str(&class_to_regex(&body)),
            }
        }
        source.push('$');
        let matcher = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| PatternError {
                pattern: text.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            text,
            case_sensitive,
            matcher,
        })
    }

    /// Returns true when `value` matches the whole pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }

    /// Pattern text as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.text
    }

    /// Whether matching distinguishes letter case.
    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The unescaped text when the pattern contains no wildcard at all.
    #[must_use]
    pub fn literal(&self) -> Option<String> {
        pieces(&self.text)
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(ch) => Some(ch),
                _ => None,
            })
            .collect()
    }

    /// True for a non-empty pattern made only of `*`, which matches every string.
    #[must_use]
    pub fn matches_everything(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|ch| ch == '*')
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WildcardPattern")
            .field("text", &self.text)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.case_sensitive == other.case_sensitive && self.text == other.text
    }
}

impl Eq for WildcardPattern {}

impl Ord for WildcardPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text
            .cmp(&other.text)
            .then(other.case_sensitive.cmp(&self.case_sensitive))
    }
}

impl PartialOrd for WildcardPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for WildcardPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.case_sensitive.hash(state);
    }
}
