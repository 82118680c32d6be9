//! Canonical forms: the complete sum of prime implicants of a predicate.
//!
//! A predicate is mapped onto a cube cover over per-attribute cell domains
//! (see [`cover`]). Iterated consensus turns the cover into every prime
//! implicant, and [`render`] prints the primes back as a sorted disjunction.
//! Two predicates denote the same function exactly when their canonical
//! forms are structurally equal.

mod cell_set;
mod cover;
mod range;
mod render;

use std::cmp::Ordering;

use log::Level;

use crate::{
    core::{Predicate, PredicateNode},
    logging::predicate_log,
};

/// Computes the canonical form of `predicate` from scratch.
///
/// Must not consult the memoised canonical form of its input.
pub(crate) fn canonicalize(predicate: &Predicate) -> Predicate {
    let domain = cover::Domain::collect(predicate);
    let cubes = domain.cover(predicate, false);
    let initial = cubes.len();
    let (primes, rounds) = cover::prime_implicants(cubes);
    predicate_log!(
        Level::Debug,
        "canonicalize",
        "variables={} cubes={} primes={} rounds={}",
        domain.variables().len(),
        initial,
        primes.len(),
        rounds
    );
    render::render(&domain, &primes)
}

/// Fixed structural order used to sort canonical children.
///
/// Constants sort first, then literals (leaves and negated leaves), negated
/// composites, conjunctions and disjunctions. Literals order by attribute,
/// kind, polarity and value.
pub(crate) fn structural_cmp(left: &Predicate, right: &Predicate) -> Ordering {
    let left_class = class(left);
    left_class.cmp(&class(right)).then_with(|| match left_class {
        0 => matches!(left.kind(), PredicateNode::True)
            .cmp(&matches!(right.kind(), PredicateNode::True)),
        1 => literal_cmp(left, right),
        2 => match (left.kind(), right.kind()) {
            (PredicateNode::Not(l), PredicateNode::Not(r)) => structural_cmp(l, r),
            _ => Ordering::Equal,
        },
        _ => match (left.kind(), right.kind()) {
            (PredicateNode::And(l), PredicateNode::And(r))
            | (PredicateNode::Or(l), PredicateNode::Or(r)) => children_cmp(l, r),
            _ => Ordering::Equal,
        },
    })
}

fn class(predicate: &Predicate) -> u8 {
    match predicate.kind() {
        PredicateNode::True | PredicateNode::False => 0,
        PredicateNode::Not(inner) if inner.kind().is_leaf() => 1,
        PredicateNode::Not(_) => 2,
        PredicateNode::And(_) => 3,
        PredicateNode::Or(_) => 4,
        _ => 1,
    }
}

fn kind_rank(node: &PredicateNode) -> u8 {
    match node {
        PredicateNode::EqualTo { .. } => 0,
        PredicateNode::GreaterThan { .. } => 1,
        PredicateNode::LesserThan { .. } => 2,
        PredicateNode::In { .. } => 3,
        PredicateNode::Like { .. } => 4,
        PredicateNode::True => 5,
        PredicateNode::False => 6,
        PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_) => 7,
    }
}

fn literal_parts(predicate: &Predicate) -> (&PredicateNode, bool) {
    match predicate.kind() {
        PredicateNode::Not(inner) => (inner.kind(), true),
        node => (node, false),
    }
}

fn literal_cmp(left: &Predicate, right: &Predicate) -> Ordering {
    let (l, l_negated) = literal_parts(left);
    let (r, r_negated) = literal_parts(right);
    l.attribute()
        .cmp(&r.attribute())
        .then_with(|| kind_rank(l).cmp(&kind_rank(r)))
        .then_with(|| l_negated.cmp(&r_negated))
        .then_with(|| match (l, r) {
            (
                PredicateNode::EqualTo { value: lv, .. },
                PredicateNode::EqualTo { value: rv, .. },
            )
            | (
                PredicateNode::GreaterThan { value: lv, .. },
                PredicateNode::GreaterThan { value: rv, .. },
            )
            | (
                PredicateNode::LesserThan { value: lv, .. },
                PredicateNode::LesserThan { value: rv, .. },
            ) => lv.cmp(rv),
            (PredicateNode::In { values: lv, .. }, PredicateNode::In { values: rv, .. }) => {
                lv.cmp(rv)
            }
            (PredicateNode::Like { pattern: lp, .. }, PredicateNode::Like { pattern: rp, .. }) => {
                lp.cmp(rp)
            }
            _ => Ordering::Equal,
        })
}

fn children_cmp(left: &[Predicate], right: &[Predicate]) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(l, r)| structural_cmp(l, r))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}
