//! Builder for composing predicate trees.

use super::{Predicate, PredicateNode, ScalarValue, WildcardPattern};
use crate::error::PredicateError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuilderCombine {
    Leaf,
    Conjunction,
    Disjunction,
}

/// Builder for composing predicates incrementally.
///
/// Leaf validation is deferred: the first invalid clause is reported by
/// [`PredicateBuilder::build`].
#[derive(Debug)]
pub struct PredicateBuilder {
    combine: BuilderCombine,
    clauses: Vec<Result<Predicate, PredicateError>>,
}

impl PredicateBuilder {
    const fn new(combine: BuilderCombine) -> Self {
        Self {
            combine,
            clauses: Vec::new(),
        }
    }

    /// Creates a builder that expects a single clause.
    #[must_use]
    pub fn leaf() -> Self {
        Self::new(BuilderCombine::Leaf)
    }

    /// Creates a builder that emits an `AND` of all clauses.
    #[must_use]
    pub fn and() -> Self {
        Self::new(BuilderCombine::Conjunction)
    }

    /// Creates a builder that emits an `OR` of all clauses.
    #[must_use]
    pub fn or() -> Self {
        Self::new(BuilderCombine::Disjunction)
    }

    /// Adds an existing predicate to the builder.
    #[must_use]
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.clauses.push(Ok(predicate));
        self
    }

    /// Adds an `attribute == value` clause.
    #[must_use]
    pub fn equals(mut self, attribute: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.clauses.push(Ok(Predicate::equal_to(attribute, value)));
        self
    }

    /// Adds an `attribute != value` clause.
    #[must_use]
    pub fn not_equals(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        self.clauses.push(Ok(Predicate::negation(Predicate::equal_to(
            attribute, value,
        ))));
        self
    }

    /// Adds an `attribute > value` clause.
    #[must_use]
    pub fn greater_than(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        self.clauses.push(Predicate::greater_than(attribute, value));
        self
    }

    /// Adds an `attribute >= value` clause, expressed as `> || ==`.
    #[must_use]
    pub fn greater_than_or_equal(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        self.clauses.push(or_equal(attribute.into(), value.into(), |a, v| {
            Predicate::greater_than(a, v)
        }));
        self
    }

    /// Adds an `attribute < value` clause.
    #[must_use]
    pub fn lesser_than(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        self.clauses.push(Predicate::lesser_than(attribute, value));
        self
    }

    /// Adds an `attribute <= value` clause, expressed as `< || ==`.
    #[must_use]
    pub fn lesser_than_or_equal(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        self.clauses.push(or_equal(attribute.into(), value.into(), |a, v| {
            Predicate::lesser_than(a, v)
        }));
        self
    }

    /// Adds a `matches(attribute, pattern)` clause.
    #[must_use]
    pub fn matches(
        mut self,
        attribute: impl Into<String>,
        pattern: &str,
        case_sensitive: bool,
    ) -> Self {
        let attribute = attribute.into();
        self.clauses.push(
            WildcardPattern::new(pattern, case_sensitive)
                .map(|pattern| Predicate::like(attribute, pattern))
                .map_err(PredicateError::from),
        );
        self
    }

    /// Adds a `contains(attribute, {values})` clause.
    #[must_use]
    pub fn contains<I, V>(mut self, attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        self.clauses.push(Predicate::in_set(attribute, values));
        self
    }

    fn branch<F>(mut self, combine: BuilderCombine, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        let predicate = build(PredicateBuilder::new(combine)).build();
        self.clauses.push(predicate);
        self
    }

    /// Adds a nested conjunction built by the supplied closure.
    #[must_use]
    pub fn and_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.branch(BuilderCombine::Conjunction, build)
    }

    /// Adds a nested disjunction built by the supplied closure.
    #[must_use]
    pub fn or_group<F>(self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        self.branch(BuilderCombine::Disjunction, build)
    }

    /// Adds the negation of a single clause built by the supplied closure.
    #[must_use]
    pub fn not_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(PredicateBuilder) -> PredicateBuilder,
    {
        let negated = build(PredicateBuilder::leaf())
            .build()
            .map(Predicate::negation);
        self.clauses.push(negated);
        self
    }

    /// Consumes the builder and returns the composed predicate.
    pub fn build(self) -> Result<Predicate, PredicateError> {
        let clauses = self.clauses.into_iter().collect::<Result<Vec<_>, _>>()?;
        match self.combine {
            BuilderCombine::Leaf => {
                let mut clauses = clauses;
                match clauses.len() {
                    1 => clauses.pop().ok_or(PredicateError::InvalidArity {
                        op: "Leaf",
                        got: 0,
                    }),
                    got => Err(PredicateError::InvalidArity { op: "Leaf", got }),
                }
            }
            BuilderCombine::Conjunction => Predicate::from_node(PredicateNode::And(clauses)),
            BuilderCombine::Disjunction => Predicate::from_node(PredicateNode::Or(clauses)),
        }
    }
}

fn or_equal(
    attribute: String,
    value: ScalarValue,
    strict: fn(String, ScalarValue) -> Result<Predicate, PredicateError>,
) -> Result<Predicate, PredicateError> {
    let bound = strict(attribute.clone(), value.clone())?;
    Predicate::or([bound, Predicate::equal_to(attribute, value)])
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::leaf()
    }
}
