//! Common test utilities for integration tests.
#![allow(dead_code)]

use tonbo_predicate::{Predicate, PredicateParser};

/// Parses `text` with default options, panicking with the input on failure.
pub fn parse(text: &str) -> Predicate {
    text.parse()
        .unwrap_or_else(|err| panic!("failed to parse {text:?}: {err}"))
}

/// Parses `text` with an explicit parser.
pub fn parse_with(parser: &PredicateParser, text: &str) -> Predicate {
    parser
        .parse(text)
        .unwrap_or_else(|err| panic!("failed to parse {text:?}: {err}"))
}

/// Checks the algebraic identities every predicate must satisfy.
pub fn assert_identities(predicate: &Predicate) {
    let canonical = predicate.canonicalize();
    assert_eq!(predicate, &canonical, "canonical form of {predicate}");
    assert!(canonical.is_canonical(), "{canonical} should be canonical");

    let contradiction = predicate.clone() & !predicate.clone();
    assert_eq!(contradiction, Predicate::constant(false), "{predicate} && !({predicate})");
    let tautology = predicate.clone() | !predicate.clone();
    assert_eq!(tautology, Predicate::constant(true), "{predicate} || !({predicate})");

    let not = (!predicate.clone()).canonicalize();
    let not_not = (!not).canonicalize();
    assert_eq!(predicate, &not_not, "double negation of {predicate}");

    let joined = Predicate::join(predicate.split());
    assert_eq!(predicate, &joined, "split/join of {predicate}");
}

const DRESSINGS: [(&str, &str); 5] = [
    ("", ""),
    ("j && (", ")"),
    ("j || (", ")"),
    ("j && !(", ")"),
    ("j || !(", ")"),
];

/// Compares two expressions bare and wrapped in a few extra combinators.
pub fn assert_equivalence(equal: bool, expected: &str, value: &str) {
    assert_equivalence_with(&PredicateParser::default(), equal, expected, value);
}

/// [`assert_equivalence`] with an explicit parser.
pub fn assert_equivalence_with(
    parser: &PredicateParser,
    equal: bool,
    expected: &str,
    value: &str,
) {
    for (prefix, suffix) in DRESSINGS {
        let expected = format!("{prefix}{expected}{suffix}");
        let value = format!("{prefix}{value}{suffix}");

        let left = parse_with(parser, &expected);
        let right = parse_with(parser, &value);
        assert_identities(&left);
        assert_identities(&right);

        if equal {
            assert_eq!(left, right, "{expected:?} should equal {value:?}");
            assert_eq!(right, left, "{value:?} should equal {expected:?}");
        } else {
            assert_ne!(left, right, "{expected:?} should not equal {value:?}");
            assert_ne!(right, left, "{value:?} should not equal {expected:?}");
        }

        assert!(left.strict_eq(&parse_with(parser, &expected)));
        assert!(right.strict_eq(&parse_with(parser, &value)));
    }
}

/// Shorthand for [`assert_equivalence`] with `equal = true`.
pub fn assert_equivalent(expected: &str, value: &str) {
    assert_equivalence(true, expected, value);
}

/// True when some clause is semantically equal to `text`.
pub fn contains_clause(clauses: &[Predicate], text: &str) -> bool {
    let wanted = parse(text);
    clauses.iter().any(|clause| *clause == wanted)
}

/// Number of `contains(..)` leaves (positive or negated) in `predicate`.
pub fn count_sets(predicate: &Predicate) -> usize {
    use tonbo_predicate::PredicateNode;
    match predicate.kind() {
        PredicateNode::In { .. } => 1,
        PredicateNode::Not(inner) => count_sets(inner),
        PredicateNode::And(children) | PredicateNode::Or(children) => {
            children.iter().map(count_sets).sum()
        }
        _ => 0,
    }
}
