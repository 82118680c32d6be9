//! Lossless decomposition of a predicate into disjunctive clauses and back.

use std::collections::BTreeMap;

use log::Level;

use crate::{
    canonical::structural_cmp,
    core::{Predicate, PredicateNode, ScalarValue},
    logging::predicate_log,
};

fn disjuncts(predicate: &Predicate) -> Vec<Predicate> {
    match predicate.kind() {
        PredicateNode::False => Vec::new(),
        PredicateNode::Or(children) => children.clone(),
        _ => vec![predicate.clone()],
    }
}

fn literals(clause: &Predicate) -> Vec<Predicate> {
    match clause.kind() {
        PredicateNode::True => Vec::new(),
        PredicateNode::And(children) => children.clone(),
        _ => vec![clause.clone()],
    }
}

fn positive_equality(literal: &Predicate) -> Option<(&str, &ScalarValue)> {
    match literal.kind() {
        PredicateNode::EqualTo { attribute, value } if !value.is_null() => {
            Some((attribute, value))
        }
        _ => None,
    }
}

fn not_equality(literal: &Predicate) -> Option<(&str, &ScalarValue)> {
    match literal.kind() {
        PredicateNode::Not(inner) => positive_equality(inner),
        _ => None,
    }
}

/// Replaces two or more `x != v` literals on one attribute by `!contains(x, {..})`.
fn fold_not_equal(literals: Vec<Predicate>) -> Vec<Predicate> {
    let mut excluded: BTreeMap<String, Vec<ScalarValue>> = BTreeMap::new();
    for literal in &literals {
        if let Some((attribute, value)) = not_equality(literal) {
            excluded
                .entry(attribute.to_owned())
                .or_default()
                .push(value.clone());
        }
    }
    excluded.retain(|_, values| values.len() > 1);
    if excluded.is_empty() {
        return literals;
    }
    let mut out: Vec<Predicate> = literals
        .into_iter()
        .filter(|literal| {
            not_equality(literal).map_or(true, |(attribute, _)| !excluded.contains_key(attribute))
        })
        .collect();
    for (attribute, values) in excluded {
        out.push(!Predicate::from_kind(PredicateNode::In { attribute, values }));
    }
    out
}

fn point_set(literal: &Predicate) -> Option<(&str, Vec<ScalarValue>)> {
    match literal.kind() {
        PredicateNode::In { attribute, values } => Some((attribute, values.clone())),
        _ => positive_equality(literal).map(|(attribute, value)| (attribute, vec![value.clone()])),
    }
}

/// Merges two sorted clauses that differ in exactly one point literal on the
/// same attribute. Identical clauses merge into one.
fn merge_pair(left: &[Predicate], right: &[Predicate]) -> Option<Vec<Predicate>> {
    if left.len() != right.len() {
        return None;
    }
    let mut differing = (0..left.len()).filter(|index| !left[*index].strict_eq(&right[*index]));
    let Some(index) = differing.next() else {
        return Some(left.to_vec());
    };
    if differing.next().is_some() {
        return None;
    }
    let (attribute, mut values) = point_set(&left[index])?;
    let (other, extra) = point_set(&right[index])?;
    if attribute != other {
        return None;
    }
    for value in extra {
        if !values.contains(&value) {
            values.push(value);
        }
    }
    let literal = match values.len() {
        1 => Predicate::equal_to(attribute, values.remove(0)),
        _ => Predicate::from_kind(PredicateNode::In {
            attribute: attribute.to_owned(),
            values,
        }),
    };
    let mut merged = left.to_vec();
    merged[index] = literal;
    merged.sort_by(structural_cmp);
    Some(merged)
}

/// Merges clauses that differ only by one `x == v` on the same attribute.
fn merge_equalities(mut clauses: Vec<Vec<Predicate>>) -> Vec<Predicate> {
    for clause in &mut clauses {
        clause.sort_by(structural_cmp);
    }
    'merge: loop {
        for i in 0..clauses.len() {
            for j in (i + 1)..clauses.len() {
                if let Some(merged) = merge_pair(&clauses[i], &clauses[j]) {
                    clauses[i] = merged;
                    clauses.remove(j);
                    continue 'merge;
                }
            }
        }
        break;
    }
    clauses.into_iter().map(Predicate::conjunction).collect()
}

impl Predicate {
    /// Splits the canonical form into its disjunctive clauses.
    ///
    /// Each `contains(x, {..})` is exploded into one clause per value, so a
    /// clause holding several sets yields their product. `!contains` stays a
    /// single clause. `False` splits into no clauses.
    #[must_use]
    pub fn split(&self) -> Vec<Predicate> {
        let canonical = self.canonical();
        let mut out = Vec::new();
        for clause in disjuncts(canonical) {
            let mut expanded: Vec<Vec<Predicate>> = vec![Vec::new()];
            for literal in literals(&clause) {
                let choices = match literal.kind() {
                    PredicateNode::In { attribute, values } => values
                        .iter()
                        .map(|value| Predicate::equal_to(attribute.clone(), value.clone()))
                        .collect(),
                    _ => vec![literal.clone()],
                };
                expanded = expanded
                    .iter()
                    .flat_map(|prefix| {
                        choices.iter().map(move |choice| {
                            let mut next = prefix.clone();
                            next.push(choice.clone());
                            next
                        })
                    })
                    .collect();
            }
            out.extend(expanded.into_iter().map(Predicate::conjunction));
        }
        predicate_log!(Level::Debug, "split", "clauses={}", out.len());
        out
    }

    /// Recombines clauses produced by [`Predicate::split`].
    ///
    /// Clauses differing only by one equality on the same attribute are merged
    /// back into `contains(..)`, and the disjunction is canonicalised. No
    /// clauses join to `False`.
    #[must_use]
    pub fn join<I>(clauses: I) -> Predicate
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut inputs = 0usize;
        let mut conjunctions = Vec::new();
        for clause in clauses {
            inputs += 1;
            for disjunct in disjuncts(clause.canonical()) {
                conjunctions.push(fold_not_equal(literals(&disjunct)));
            }
        }
        let merged = merge_equalities(conjunctions);
        let merged_len = merged.len();
        let joined = Predicate::disjunction(merged).canonicalize();
        predicate_log!(
            Level::Debug,
            "join",
            "inputs={} merged={}",
            inputs,
            merged_len
        );
        joined
    }
}
