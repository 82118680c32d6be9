//! Core predicate structures: literals, patterns, nodes and the builder.

mod builder;
mod node;
mod pattern;
mod value;

pub use builder::PredicateBuilder;
pub use node::{Predicate, PredicateNode, MAX_DEPTH};
pub use pattern::WildcardPattern;
pub(crate) use value::{write_quoted, Family};
pub use value::ScalarValue;
