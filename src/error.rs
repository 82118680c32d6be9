//! Error types surfaced by construction, evaluation and parsing.

use thiserror::Error;

/// Raised when a predicate node would violate a structural invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// `And`/`Or` built with fewer than two operands.
    #[error("Invalid arity for {op}: expected at least 2 operands, got {got}")]
    InvalidArity {
        /// Combinator name.
        op: &'static str,
        /// Number of operands supplied.
        got: usize,
    },
    /// `In` built without any value.
    #[error("contains({0}, ..) requires at least one value")]
    EmptySet(String),
    /// Null supplied where only concrete literals are meaningful.
    #[error("{op} on '{attribute}' does not accept null")]
    NullValue {
        /// Attribute the leaf refers to.
        attribute: String,
        /// Operator that rejected the null.
        op: &'static str,
    },
    /// The node would nest deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("Predicate depth {depth} exceeds the limit of {limit}")]
    TooDeep {
        /// Depth of the rejected node.
        depth: usize,
        /// Maximum depth.
        limit: usize,
    },
    /// Wildcard pattern could not be compiled.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Raised when a wildcard pattern cannot be compiled into a matcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid wildcard pattern {pattern:?}: {reason}")]
pub struct PatternError {
    /// Offending pattern text.
    pub pattern: String,
    /// Matcher compilation failure.
    pub reason: String,
}

/// Raised while evaluating a predicate against a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The context cannot resolve the attribute.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),
    /// The resolved value cannot be compared with the literal.
    #[error("Type mismatch for attribute '{attribute}': cannot compare {actual} with {expected}")]
    TypeMismatch {
        /// Attribute being evaluated.
        attribute: String,
        /// Type family of the literal.
        expected: &'static str,
        /// Type family of the resolved value.
        actual: &'static str,
    },
}

/// Raised when predicate text is malformed. Positions are byte offsets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token.
    #[error("Unexpected character {found:?} at {position}")]
    UnexpectedChar {
        /// Offending character.
        found: char,
        /// Byte offset.
        position: usize,
    },
    /// A token other than the one the grammar requires.
    #[error("Expected {expected} at {position}, found {found}")]
    Expected {
        /// Description of the expected token.
        expected: &'static str,
        /// Description of the actual token.
        found: String,
        /// Byte offset.
        position: usize,
    },
    /// String literal missing its closing quote.
    #[error("Unterminated string starting at {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// Numeric literal that does not fit `i64` or `f64`.
    #[error("Invalid number {text:?} at {position}")]
    InvalidNumber {
        /// Literal text.
        text: String,
        /// Byte offset.
        position: usize,
    },
    /// Nesting deeper than the configured limit.
    #[error("Expression nested deeper than {limit} at {position}")]
    TooDeep {
        /// Configured limit.
        limit: usize,
        /// Byte offset.
        position: usize,
    },
    /// Well-formed text describing an invalid node.
    #[error("Invalid predicate at {position}: {source}")]
    Invalid {
        /// Byte offset of the node.
        position: usize,
        /// Construction failure.
        #[source]
        source: PredicateError,
    },
}

impl ParseError {
    /// Byte offset the error refers to.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedChar { position, .. }
            | ParseError::Expected { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::TooDeep { position, .. }
            | ParseError::Invalid { position, .. } => *position,
        }
    }
}
