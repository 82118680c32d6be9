//! Textual form: `Display` prints a predicate, `FromStr` parses one back.

mod lexer;
mod parser;
mod printer;

use std::str::FromStr;

pub use parser::PredicateParser;

use crate::{core::Predicate, error::ParseError};

impl FromStr for Predicate {
    type Err = ParseError;

    /// Parses with the default [`ParserOptions`](crate::ParserOptions).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        PredicateParser::default().parse(input)
    }
}
