#![deny(missing_docs)]
//! Boolean predicates over named attributes.
//!
//! A [`Predicate`] combines comparisons (`==`, `>`, `<`), wildcard matching
//! and set membership with `&&`, `||` and `!`. Predicates can be
//!
//! - evaluated against any record through an [`AttributeContext`],
//! - printed and parsed in a compact textual form (`Display` / `FromStr`),
//! - compared for *semantic* equivalence: `==` and `Hash` work on a canonical
//!   sum of prime implicants, so `!(a || b) == !a && !b`,
//! - split into disjunctive clauses and joined back without loss.
//!
//! ```
//! use tonbo_predicate::{Predicate, RecordContext, ScalarValue};
//! use std::collections::HashMap;
//!
//! let left: Predicate = "!(house == \"Slytherin\" || birthYear > 1980)".parse().unwrap();
//! let right: Predicate = "house != \"Slytherin\" && !(birthYear > 1980)".parse().unwrap();
//! assert_eq!(left, right);
//!
//! let record = HashMap::from([
//!     ("house".to_owned(), ScalarValue::from("Gryffindor")),
//!     ("birthYear".to_owned(), ScalarValue::from(1980)),
//! ]);
//! assert_eq!(left.evaluate(&RecordContext, &record), Ok(true));
//! ```

mod canonical;
mod core;
/// Error types for construction, evaluation and parsing.
pub mod error;
mod eval;
mod logging;
mod option;
mod split;
mod text;

pub use crate::{
    core::{Predicate, PredicateBuilder, PredicateNode, ScalarValue, WildcardPattern, MAX_DEPTH},
    error::{EvalError, ParseError, PatternError, PredicateError},
    eval::{AttributeContext, RecordContext},
    option::ParserOptions,
    text::PredicateParser,
};
