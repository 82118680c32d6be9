//! Evaluation of predicates against host records.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use crate::{
    core::{Family, Predicate, PredicateNode, ScalarValue, WildcardPattern},
    error::EvalError,
};

/// Resolves attribute values of a host record.
///
/// Implemented for closures `Fn(&B, &str) -> Result<ScalarValue, EvalError>`
/// and for [`RecordContext`].
pub trait AttributeContext<B: ?Sized> {
    /// Value of `attribute` on `bean`. Unknown attributes must be reported as
    /// [`EvalError::UnknownAttribute`], never mapped to a default value.
    fn value(&self, bean: &B, attribute: &str) -> Result<ScalarValue, EvalError>;
}

impl<B, F> AttributeContext<B> for F
where
    B: ?Sized,
    F: Fn(&B, &str) -> Result<ScalarValue, EvalError>,
{
    fn value(&self, bean: &B, attribute: &str) -> Result<ScalarValue, EvalError> {
        self(bean, attribute)
    }
}

/// Context for records stored as attribute maps.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordContext;

impl AttributeContext<HashMap<String, ScalarValue>> for RecordContext {
    fn value(
        &self,
        bean: &HashMap<String, ScalarValue>,
        attribute: &str,
    ) -> Result<ScalarValue, EvalError> {
        bean.get(attribute)
            .cloned()
            .ok_or_else(|| EvalError::UnknownAttribute(attribute.to_owned()))
    }
}

impl AttributeContext<BTreeMap<String, ScalarValue>> for RecordContext {
    fn value(
        &self,
        bean: &BTreeMap<String, ScalarValue>,
        attribute: &str,
    ) -> Result<ScalarValue, EvalError> {
        bean.get(attribute)
            .cloned()
            .ok_or_else(|| EvalError::UnknownAttribute(attribute.to_owned()))
    }
}

fn mismatch(attribute: &str, expected: Family, actual: Family) -> EvalError {
    EvalError::TypeMismatch {
        attribute: attribute.to_owned(),
        expected: expected.name(),
        actual: actual.name(),
    }
}

fn ordering(attribute: &str, value: &ScalarValue, bound: &ScalarValue) -> Result<Ordering, EvalError> {
    value
        .compare(bound)
        .ok_or_else(|| mismatch(attribute, bound.family(), value.family()))
}

fn equal_to(attribute: &str, value: &ScalarValue, literal: &ScalarValue) -> Result<bool, EvalError> {
    match (value.is_null(), literal.is_null()) {
        (true, true) => Ok(true),
        (true, false) | (false, true) => Ok(false),
        (false, false) => Ok(ordering(attribute, value, literal)?.is_eq()),
    }
}

fn like(attribute: &str, value: &ScalarValue, pattern: &WildcardPattern) -> Result<bool, EvalError> {
    match value {
        ScalarValue::Null => Ok(false),
        ScalarValue::Utf8(text) => Ok(pattern.matches(text)),
        other => Err(mismatch(attribute, Family::Utf8, other.family())),
    }
}

fn member(attribute: &str, value: &ScalarValue, values: &[ScalarValue]) -> Result<bool, EvalError> {
    if value.is_null() {
        return Ok(false);
    }
    let family = value.family();
    let mut comparable = false;
    for candidate in values {
        if candidate.family() == family {
            comparable = true;
            if candidate == value {
                return Ok(true);
            }
        }
    }
    match values.first() {
        Some(first) if !comparable => Err(mismatch(attribute, first.family(), family)),
        _ => Ok(false),
    }
}

impl Predicate {
    /// Evaluates this predicate against `bean`.
    ///
    /// Comparisons, patterns and membership are false on a null attribute;
    /// `attribute == null` is true only there. `And`/`Or` short-circuit, so an
    /// attribute that is never reached is never resolved.
    pub fn evaluate<B, C>(&self, context: &C, bean: &B) -> Result<bool, EvalError>
    where
        B: ?Sized,
        C: AttributeContext<B> + ?Sized,
    {
        match self.kind() {
            PredicateNode::True => Ok(true),
            PredicateNode::False => Ok(false),
            PredicateNode::EqualTo { attribute, value } => {
                equal_to(attribute, &context.value(bean, attribute)?, value)
            }
            PredicateNode::GreaterThan { attribute, value } => {
                let actual = context.value(bean, attribute)?;
                if actual.is_null() {
                    return Ok(false);
                }
                Ok(ordering(attribute, &actual, value)?.is_gt())
            }
            PredicateNode::LesserThan { attribute, value } => {
                let actual = context.value(bean, attribute)?;
                if actual.is_null() {
                    return Ok(false);
                }
                Ok(ordering(attribute, &actual, value)?.is_lt())
            }
            PredicateNode::Like { attribute, pattern } => {
                like(attribute, &context.value(bean, attribute)?, pattern)
            }
            PredicateNode::In { attribute, values } => {
                member(attribute, &context.value(bean, attribute)?, values)
            }
            PredicateNode::Not(inner) => Ok(!inner.evaluate(context, bean)?),
            PredicateNode::And(children) => {
                for child in children {
                    if !child.evaluate(context, bean)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            PredicateNode::Or(children) => {
                for child in children {
                    if child.evaluate(context, bean)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}
