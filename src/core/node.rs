use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    hash::{Hash, Hasher},
    ops,
};

use once_cell::sync::OnceCell;

use super::{ScalarValue, WildcardPattern};
use crate::{canonical, error::PredicateError};

/// Recursive predicate node; leaf and branch variants coexist.
#[derive(Clone, Debug)]
pub enum PredicateNode {
    /// Always-true literal.
    True,
    /// Always-false literal.
    False,
    /// Null-safe equality; `value` may be `Null`.
    EqualTo {
        /// Attribute resolved through the evaluation context.
        attribute: String,
        /// Literal compared against.
        value: ScalarValue,
    },
    /// Strict `attribute > value`; false when the attribute is null.
    GreaterThan {
        /// Attribute resolved through the evaluation context.
        attribute: String,
        /// Non-null bound.
        value: ScalarValue,
    },
    /// Strict `attribute < value`; false when the attribute is null.
    LesserThan {
        /// Attribute resolved through the evaluation context.
        attribute: String,
        /// Non-null bound.
        value: ScalarValue,
    },
    /// Wildcard match; false when the attribute is null.
    Like {
        /// Attribute resolved through the evaluation context.
        attribute: String,
        /// Glob to match.
        pattern: WildcardPattern,
    },
    /// Set membership; false when the attribute is null.
    In {
        /// Attribute resolved through the evaluation context.
        attribute: String,
        /// Non-empty, duplicate-free, insertion-ordered candidates.
        values: Vec<ScalarValue>,
    },
    /// Logical negation.
    Not(Box<Predicate>),
    /// Conjunction over at least two predicates.
    And(Vec<Predicate>),
    /// Disjunction over at least two predicates.
    Or(Vec<Predicate>),
}

impl PredicateNode {
    /// Returns true when the node has no child predicates.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_)
        )
    }

    /// Attribute consulted by a comparison leaf.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            PredicateNode::EqualTo { attribute, .. }
            | PredicateNode::GreaterThan { attribute, .. }
            | PredicateNode::LesserThan { attribute, .. }
            | PredicateNode::Like { attribute, .. }
            | PredicateNode::In { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

/// Deepest tree a [`Predicate`] may hold. A leaf has depth 1.
pub const MAX_DEPTH: usize = 1024;

fn node_depth(kind: &PredicateNode) -> usize {
    match kind {
        PredicateNode::Not(inner) => inner.depth + 1,
        PredicateNode::And(children) | PredicateNode::Or(children) => {
            children.iter().map(|child| child.depth).max().unwrap_or(0) + 1
        }
        _ => 1,
    }
}

/// Immutable boolean predicate over named attributes.
///
/// Equality and hashing are semantic: two predicates are equal when their
/// canonical forms are. Use [`Predicate::strict_eq`] for structural identity.
/// The canonical form is computed at most once per instance.
///
/// Trees never nest deeper than [`MAX_DEPTH`]. The fallible constructors
/// reject deeper nodes; `!`, `&` and `|` replace an operand that would cross
/// the limit by its canonical form.
#[derive(Clone)]
pub struct Predicate {
    kind: PredicateNode,
    depth: usize,
    // `Some(None)` marks a predicate that is its own canonical form.
    canonical: OnceCell<Option<Box<Predicate>>>,
}

impl Predicate {
    /// Returns a reference to the underlying node.
    #[must_use]
    pub fn kind(&self) -> &PredicateNode {
        &self.kind
    }

    /// Nesting depth of the tree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Constant predicate.
    #[must_use]
    pub fn constant(value: bool) -> Self {
        Self::from_kind(if value {
            PredicateNode::True
        } else {
            PredicateNode::False
        })
    }

    /// `attribute == value`; a `Null` value matches only null attributes.
    #[must_use]
    pub fn equal_to(attribute: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::from_kind(PredicateNode::EqualTo {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// `attribute > value`.
    pub fn greater_than(
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Result<Self, PredicateError> {
        Self::from_node(PredicateNode::GreaterThan {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// `attribute < value`.
    pub fn lesser_than(
        attribute: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Result<Self, PredicateError> {
        Self::from_node(PredicateNode::LesserThan {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// `matches(attribute, pattern)`.
    #[must_use]
    pub fn like(attribute: impl Into<String>, pattern: WildcardPattern) -> Self {
        Self::from_kind(PredicateNode::Like {
            attribute: attribute.into(),
            pattern,
        })
    }

    /// `contains(attribute, {values})`. Duplicates are dropped, first occurrence wins.
    pub fn in_set<I, V>(attribute: impl Into<String>, values: I) -> Result<Self, PredicateError>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self::from_node(PredicateNode::In {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Logical negation of `operand`.
    #[must_use]
    pub fn negation(operand: Predicate) -> Self {
        Self::from_kind(PredicateNode::Not(Box::new(operand)))
    }

    /// Builds a conjunction, flattening nested conjunctions.
    ///
    /// Fails when fewer than two operands are supplied.
    pub fn and<I>(operands: I) -> Result<Self, PredicateError>
    where
        I: IntoIterator<Item = Predicate>,
    {
        Self::from_node(PredicateNode::And(operands.into_iter().collect()))
    }

    /// Builds a disjunction, flattening nested disjunctions.
    ///
    /// Fails when fewer than two operands are supplied.
    pub fn or<I>(operands: I) -> Result<Self, PredicateError>
    where
        I: IntoIterator<Item = Predicate>,
    {
        Self::from_node(PredicateNode::Or(operands.into_iter().collect()))
    }

    /// Builds a predicate from a node after checking the node's own invariants.
    pub fn from_node(node: PredicateNode) -> Result<Self, PredicateError> {
        let node = match node {
            PredicateNode::GreaterThan { attribute, value } => {
                if value.is_null() {
                    return Err(PredicateError::NullValue { attribute, op: ">" });
                }
                PredicateNode::GreaterThan { attribute, value }
            }
            PredicateNode::LesserThan { attribute, value } => {
                if value.is_null() {
                    return Err(PredicateError::NullValue { attribute, op: "<" });
                }
                PredicateNode::LesserThan { attribute, value }
            }
            PredicateNode::In { attribute, values } => {
                if values.is_empty() {
                    return Err(PredicateError::EmptySet(attribute));
                }
                if values.iter().any(ScalarValue::is_null) {
                    return Err(PredicateError::NullValue {
                        attribute,
                        op: "contains",
                    });
                }
                let mut seen = HashSet::with_capacity(values.len());
                let values = values
                    .into_iter()
                    .filter(|value| seen.insert(value.clone()))
                    .collect();
                PredicateNode::In { attribute, values }
            }
            PredicateNode::And(operands) => {
                if operands.len() < 2 {
                    return Err(PredicateError::InvalidArity {
                        op: "And",
                        got: operands.len(),
                    });
                }
                PredicateNode::And(flatten(operands, true))
            }
            PredicateNode::Or(operands) => {
                if operands.len() < 2 {
                    return Err(PredicateError::InvalidArity {
                        op: "Or",
                        got: operands.len(),
                    });
                }
                PredicateNode::Or(flatten(operands, false))
            }
            other => other,
        };
        let depth = node_depth(&node);
        if depth > MAX_DEPTH {
            return Err(PredicateError::TooDeep {
                depth,
                limit: MAX_DEPTH,
            });
        }
        Ok(Self::from_kind(node))
    }

    /// Conjunction with the neutral element for empty input.
    pub(crate) fn conjunction(operands: Vec<Predicate>) -> Self {
        match operands.len() {
            0 => Self::constant(true),
            1 => operands.into_iter().next().unwrap_or_else(|| Self::constant(true)),
            _ => Self::from_kind(PredicateNode::And(flatten(operands, true))),
        }
    }

    /// Disjunction with the neutral element for empty input.
    pub(crate) fn disjunction(operands: Vec<Predicate>) -> Self {
        match operands.len() {
            0 => Self::constant(false),
            1 => operands.into_iter().next().unwrap_or_else(|| Self::constant(false)),
            _ => Self::from_kind(PredicateNode::Or(flatten(operands, false))),
        }
    }

    pub(crate) fn from_kind(kind: PredicateNode) -> Self {
        let kind = if node_depth(&kind) > MAX_DEPTH {
            shorten(kind)
        } else {
            kind
        };
        Self {
            depth: node_depth(&kind),
            kind,
            canonical: OnceCell::new(),
        }
    }

    /// The canonical form: a sorted sum of prime implicants.
    ///
    /// Computed on first use and cached on this instance.
    #[must_use]
    pub fn canonical(&self) -> &Predicate {
        let cached = self.canonical.get_or_init(|| {
            let form = canonical::canonicalize(self);
            if form.strict_eq(self) {
                None
            } else {
                let _ = form.canonical.set(None);
                Some(Box::new(form))
            }
        });
        match cached {
            Some(form) => form,
            None => self,
        }
    }

    /// Owned copy of [`Predicate::canonical`].
    #[must_use]
    pub fn canonicalize(&self) -> Predicate {
        self.canonical().clone()
    }

    /// Whether this tree already is its own canonical form.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        std::ptr::eq(self.canonical(), self)
    }

    /// Structural identity without canonicalisation.
    ///
    /// Literals must be identical, so `x == 1` is not strictly equal to `x == 1.0`.
    #[must_use]
    pub fn strict_eq(&self, other: &Predicate) -> bool {
        self.same_structure(other, ScalarValue::identical)
    }

    fn same_structure(
        &self,
        other: &Predicate,
        values_eq: fn(&ScalarValue, &ScalarValue) -> bool,
    ) -> bool {
        use PredicateNode::*;
        match (&self.kind, &other.kind) {
            (True, True) | (False, False) => true,
            (
                EqualTo {
                    attribute: la,
                    value: lv,
                },
                EqualTo {
                    attribute: ra,
                    value: rv,
                },
            )
            | (
                GreaterThan {
                    attribute: la,
                    value: lv,
                },
                GreaterThan {
                    attribute: ra,
                    value: rv,
                },
            )
            | (
                LesserThan {
                    attribute: la,
                    value: lv,
                },
                LesserThan {
                    attribute: ra,
                    value: rv,
                },
            ) => la == ra && values_eq(lv, rv),
            (
                Like {
                    attribute: la,
                    pattern: lp,
                },
                Like {
                    attribute: ra,
                    pattern: rp,
                },
            ) => la == ra && lp == rp,
            (
                In {
                    attribute: la,
                    values: lv,
                },
                In {
                    attribute: ra,
                    values: rv,
                },
            ) => {
                la == ra
                    && lv.len() == rv.len()
                    && lv.iter().zip(rv).all(|(l, r)| values_eq(l, r))
            }
            (Not(l), Not(r)) => l.same_structure(r, values_eq),
            (And(l), And(r)) | (Or(l), Or(r)) => {
                l.len() == r.len()
                    && l.iter()
                        .zip(r)
                        .all(|(l, r)| l.same_structure(r, values_eq))
            }
            _ => false,
        }
    }

    fn hash_structure<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.kind).hash(state);
        match &self.kind {
            PredicateNode::True | PredicateNode::False => {}
            PredicateNode::EqualTo { attribute, value }
            | PredicateNode::GreaterThan { attribute, value }
            | PredicateNode::LesserThan { attribute, value } => {
                attribute.hash(state);
                value.hash(state);
            }
            PredicateNode::Like { attribute, pattern } => {
                attribute.hash(state);
                pattern.hash(state);
            }
            PredicateNode::In { attribute, values } => {
                attribute.hash(state);
                values.hash(state);
            }
            PredicateNode::Not(inner) => inner.hash_structure(state),
            PredicateNode::And(children) | PredicateNode::Or(children) => {
                children.len().hash(state);
                for child in children {
                    child.hash_structure(state);
                }
            }
        }
    }

    /// Every attribute this predicate consults.
    #[must_use]
    pub fn attributes(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match &self.kind {
            PredicateNode::Not(inner) => inner.collect_attributes(out),
            PredicateNode::And(children) | PredicateNode::Or(children) => {
                for child in children {
                    child.collect_attributes(out);
                }
            }
            leaf => {
                if let Some(attribute) = leaf.attribute() {
                    out.insert(attribute);
                }
            }
        }
    }

    /// Same shape with every literal replaced by the string `"?"`.
    ///
    /// Predicates sharing a template consult the same attributes the same way.
    #[must_use]
    pub fn template(&self) -> Predicate {
        let placeholder = || ScalarValue::from("?");
        let kind = match &self.kind {
            PredicateNode::True => PredicateNode::True,
            PredicateNode::False => PredicateNode::False,
            PredicateNode::EqualTo { attribute, .. } => PredicateNode::EqualTo {
                attribute: attribute.clone(),
                value: placeholder(),
            },
            PredicateNode::GreaterThan { attribute, .. } => PredicateNode::GreaterThan {
                attribute: attribute.clone(),
                value: placeholder(),
            },
            PredicateNode::LesserThan { attribute, .. } => PredicateNode::LesserThan {
                attribute: attribute.clone(),
                value: placeholder(),
            },
            PredicateNode::Like { attribute, pattern } => PredicateNode::Like {
                attribute: attribute.clone(),
                pattern: WildcardPattern::new("?", pattern.is_case_sensitive())
                    .unwrap_or_else(|_| pattern.clone()),
            },
            PredicateNode::In { attribute, .. } => PredicateNode::In {
                attribute: attribute.clone(),
                values: vec![placeholder()],
            },
            PredicateNode::Not(inner) => PredicateNode::Not(Box::new(inner.template())),
            PredicateNode::And(children) => {
                PredicateNode::And(children.iter().map(Predicate::template).collect())
            }
            PredicateNode::Or(children) => {
                PredicateNode::Or(children.iter().map(Predicate::template).collect())
            }
        };
        Self::from_kind(kind)
    }
}

/// Swaps every child at the depth limit for its canonical form, which is at
/// most four levels deep.
fn shorten(kind: PredicateNode) -> PredicateNode {
    let shallow = |child: Predicate| {
        if child.depth >= MAX_DEPTH {
            child.canonicalize()
        } else {
            child
        }
    };
    match kind {
        PredicateNode::Not(inner) => PredicateNode::Not(Box::new(shallow(*inner))),
        PredicateNode::And(children) => PredicateNode::And(children.into_iter().map(shallow).collect()),
        PredicateNode::Or(children) => PredicateNode::Or(children.into_iter().map(shallow).collect()),
        leaf => leaf,
    }
}

fn flatten(operands: Vec<Predicate>, conjunction: bool) -> Vec<Predicate> {
    let mut acc = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand.kind {
            PredicateNode::And(nested) if conjunction => acc.extend(nested),
            PredicateNode::Or(nested) if !conjunction => acc.extend(nested),
            kind => acc.push(Predicate {
                kind,
                depth: operand.depth,
                canonical: operand.canonical,
            }),
        }
    }
    acc
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.canonical()
            .same_structure(other.canonical(), |l, r| l == r)
    }
}

impl Eq for Predicate {}

impl Hash for Predicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash_structure(state);
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::constant(value)
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::negation(self)
    }
}

impl ops::BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        Predicate::conjunction(vec![self, rhs])
    }
}

impl ops::BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        Predicate::disjunction(vec![self, rhs])
    }
}
