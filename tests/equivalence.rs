mod common;

use std::collections::HashMap;

use common::{assert_equivalence, assert_equivalence_with, assert_equivalent, parse};
use tonbo_predicate::{
    EvalError, ParserOptions, Predicate, PredicateParser, RecordContext, ScalarValue,
    WildcardPattern,
};

fn eq(attribute: &str, value: &str) -> Predicate {
    Predicate::equal_to(attribute, value)
}

fn glob(text: &str) -> WildcardPattern {
    WildcardPattern::new(text, true).expect("valid pattern")
}

fn born_after_1980() -> Predicate {
    Predicate::greater_than("birthYear", 1980).expect("valid")
}

/// Printing yields `text`, and `text` parses back to the same tree.
fn assert_prints(predicate: &Predicate, text: &str) {
    assert_eq!(predicate.to_string(), text);
    let parsed = parse(text);
    assert!(parsed.strict_eq(predicate), "{text:?} parsed as {parsed:?}");
    assert_eq!(&parsed, predicate);
}

#[test]
fn to_string_negated_equality_with_group() {
    let predicate = !eq("lastName", "Weasley") & (eq("house", "Ravenclaw") | born_after_1980());
    assert_prints(
        &predicate,
        r#"lastName != "Weasley" && (house == "Ravenclaw" || birthYear > 1980)"#,
    );
}

#[test]
fn to_string_negated_group() {
    let predicate = !eq("lastName", "Weasley") & !(eq("house", "Ravenclaw") | born_after_1980());
    assert_prints(
        &predicate,
        r#"lastName != "Weasley" && !(house == "Ravenclaw" || birthYear > 1980)"#,
    );

    let nested = !(!(eq("house", "Ravenclaw") | born_after_1980()) & eq("lastName", "Weasley"));
    assert_prints(
        &nested,
        r#"!(!(house == "Ravenclaw" || birthYear > 1980) && lastName == "Weasley")"#,
    );
}

#[test]
fn to_string_repeated_negation() {
    let like = Predicate::like("lastName", glob("P*"));
    assert_prints(&like, r#"matches(lastName, "P*")"#);
    assert_prints(&!like.clone(), r#"!matches(lastName, "P*")"#);
    assert_prints(&!!like.clone(), r#"!(!matches(lastName, "P*"))"#);
    assert_prints(&!!!like, r#"!(!(!matches(lastName, "P*")))"#);
}

#[test]
fn to_string_drops_redundant_parentheses() {
    let predicate = (Predicate::like("firstName", glob("L*")) & eq("house", "Ravenclaw"))
        | (born_after_1980() & eq("lastName", "Weasley"));
    assert_prints(
        &predicate,
        r#"matches(firstName, "L*") && house == "Ravenclaw" || birthYear > 1980 && lastName == "Weasley""#,
    );
}

#[test]
fn to_string_sets() {
    let houses = Predicate::in_set("house", ["Hufflepuff", "Slytherin"]).expect("valid");
    assert_prints(&houses, r#"contains(house, {"Hufflepuff", "Slytherin"})"#);

    let year = Predicate::equal_to("birthYear", 1980);
    assert_prints(
        &(houses.clone() & year.clone()),
        r#"contains(house, {"Hufflepuff", "Slytherin"}) && birthYear == 1980"#,
    );
    assert_prints(
        &(year | houses),
        r#"birthYear == 1980 || contains(house, {"Hufflepuff", "Slytherin"})"#,
    );
}

#[test]
fn conjunction_order_is_irrelevant() {
    assert_equivalent("(a && b) && (c && d)", "(a && d) && (c && b)");
    assert_equivalent(
        r#"(matches(firstName, "L*") && house == "Ravenclaw") && (birthYear > 1980 && lastName == "Weasley")"#,
        r#"(matches(firstName, "L*") && lastName == "Weasley") && (birthYear > 1980 && house == "Ravenclaw")"#,
    );
    assert_equivalence(
        false,
        r#"(matches(firstName, "L*") && house == "Ravenclaw") && (birthYear > 1980 && lastName == "Weasley")"#,
        r#"(matches(firstName, "L*") && lastName == "Granger") && (birthYear > 1980 && house == "Ravenclaw")"#,
    );
}

#[test]
fn de_morgan_and_disjunction_order() {
    let base = r#"!(matches(firstName, "L*") && house == "Ravenclaw") || birthYear > 1980 || lastName == "Weasley""#;
    assert_equivalent(
        base,
        r#"(!matches(firstName, "L*") || house != "Ravenclaw") || birthYear > 1980 || lastName == "Weasley""#,
    );
    assert_equivalent(
        base,
        r#"(lastName == "Weasley" || !matches(firstName, "L*") || house != "Ravenclaw") || birthYear > 1980"#,
    );
    assert_equivalent(
        base,
        r#"birthYear > 1980 || lastName == "Weasley" || !matches(firstName, "L*") || house != "Ravenclaw""#,
    );
    assert_equivalence(
        false,
        r#"birthYear > 1980 || lastName == "Weasley" || matches(firstName, "L*") || house != "Ravenclaw""#,
        base,
    );
    assert_equivalence(
        false,
        base,
        r#"birthYear > 1980 || !matches(firstName, "L*") || house != "Ravenclaw""#,
    );
    assert_equivalence(
        false,
        base,
        r#"birthYear > 1980 && lastName == "Weasley" && !matches(firstName, "L*") && house != "Ravenclaw""#,
    );
}

#[test]
fn patterns_are_compared_by_attribute_and_text() {
    assert_equivalence(false, r#"matches(firstName, "L*")"#, r#"matches(lastName, "L*")"#);
    assert_equivalence(false, r#"matches(firstName, "L*")"#, r#"matches(firstName, "*l")"#);
    assert_equivalence(false, r#"matches(firstName, "L*")"#, r#"!matches(firstName, "L*")"#);
    assert_equivalent(r#"matches(firstName, "L*")"#, r#"!(!matches(firstName, "L*"))"#);
}

#[test]
fn bounds_on_one_attribute() {
    // A negated comparison also holds on null and on values of other types.
    assert_equivalence(false, "x < 10 || x == null", "!(x > 10) && !(x == 10)");
    assert_equivalence(false, "x < 10", "!(x > 10) && !(x == 10)");
    assert_equivalent("!(x < 10) && x != 10", "!(x < 10 || x == 10)");
    assert_equivalent("!(x < 10)", "x >= 10 || !(x < 10) && !(x > 10)");
    assert_equivalent("!(x > 10)", "x <= 10 || !(x > 10) && !(x < 10)");
    assert_equivalent(
        "x != 10",
        "x > 10 || x < 10 || x != 10 && !(x > 10) && !(x < 10)",
    );
    assert_equivalence(false, "x == 10 || x == null", "!(x > 10) && !(x < 10)");
    assert_equivalence(false, "x != 10 && x != null", "x > 10 || x < 10");
    assert_equivalence(false, "x != 10", "x > 10 || x < 10");

    assert_equivalent("false", "x > 10 && x < 10");
    assert_equivalent("x > 20", "x > 10 && x > 20");
    assert_equivalent("x > 10", "x > 10 || x > 20");
    assert_equivalent("true", "x > 10 || !(x > 10)");
    assert_equivalent("x > 10", "x != 0 && x > 10");
    assert_equivalent("false", "x == 0 && x > 10");
    assert_equivalent("x == 20", "x == 20 && x > 10");
    assert_equivalent("false", "x == 20 && x < 10");
    assert_equivalent("x < 10", "x != 20 && x < 10");
    assert_equivalent("x < 10", "x < 10 && x < 20");
    assert_equivalent("false", "x < 10 && x == 10");
    assert_equivalent("false", "x > 10 && x == 10");
    assert_equivalent("x > 10", "x > 10 && x != 10");
    assert_equivalent("x < 20", "x < 10 || x < 20");
    assert_equivalent("false", "x > 10 && x < -10");
    assert_equivalent("!(!((a && b) || (c && d)))", "(a && b) || (c && d)");
}

#[test]
fn bounds_only_cover_their_own_type() {
    assert_equivalent("false", r#"x > 5 && x == "a""#);
    assert_equivalent("false", r#"x < "a" && x == 3"#);
    assert_equivalent("false", "x > 5 && x == true");
    assert_equivalent(r#"x == "a""#, r#"!(x > 5) && x == "a""#);
    assert_equivalent("x > 5", r#"x > 5 && x != "a""#);
    assert_equivalence(false, "x > 5", r#"x > 5 || x == "a""#);

    // Where the original reports a type mismatch, its canonical form is false.
    let mixed = parse(r#"x > 5 && x == "a""#);
    let record = HashMap::from([("x".to_owned(), ScalarValue::from("a"))]);
    assert!(matches!(
        mixed.evaluate(&RecordContext, &record),
        Err(EvalError::TypeMismatch { .. })
    ));
    assert!(mixed.canonical().strict_eq(&Predicate::constant(false)));
    assert_eq!(mixed.canonical().evaluate(&RecordContext, &record), Ok(false));
}

#[test]
fn overlapping_bounded_ranges() {
    let cases = [
        ("x > 2 && x < 3", "(x > 0 && x < 3) && (x > 2 && x < 5)"),
        ("x > 0 && x < 5", "(x > 0 && x < 3) || (x > 2 && x < 5)"),
        ("x > 2 && x < 3", "(x > 0 && x < 3) && (x > 2 && x <= 5)"),
        ("x > 0 && x <= 5", "(x > 0 && x < 3) || (x > 2 && x <= 5)"),
        ("x >= 2 && x < 3", "(x > 0 && x < 3) && (x >= 2 && x < 5)"),
        ("x > 0 && x < 5", "(x > 0 && x < 3) || (x >= 2 && x < 5)"),
        ("x > 2 && x <= 3", "(x > 0 && x <= 3) && (x > 2 && x < 5)"),
        ("x > 0 && x < 5", "(x > 0 && x <= 3) || (x > 2 && x < 5)"),
        ("x >= 2 && x <= 3", "(x > 0 && x <= 3) && (x >= 2 && x <= 5)"),
        ("x > 0 && x <= 5", "(x > 0 && x <= 3) || (x >= 2 && x <= 5)"),
        ("x > 2 && x < 3", "(x >= 0 && x < 3) && (x > 2 && x < 5)"),
        ("x >= 0 && x < 5", "(x >= 0 && x < 3) || (x > 2 && x < 5)"),
        ("x >= 2 && x < 3", "(x >= 0 && x < 3) && (x >= 2 && x <= 5)"),
        ("x >= 0 && x <= 5", "(x >= 0 && x < 3) || (x >= 2 && x <= 5)"),
        ("x > 2 && x <= 3", "(x >= 0 && x <= 3) && (x > 2 && x <= 5)"),
        ("x >= 0 && x <= 5", "(x >= 0 && x <= 3) || (x > 2 && x <= 5)"),
        ("x >= 2 && x <= 3", "(x >= 0 && x <= 3) && (x >= 2 && x < 5)"),
        ("x >= 0 && x < 5", "(x >= 0 && x <= 3) || (x >= 2 && x < 5)"),
    ];
    for (expected, value) in cases {
        assert_equivalent(expected, value);
    }
}

#[test]
fn overlapping_unbounded_ranges() {
    let cases = [
        ("x > 2 && x < 3", "(x < 3) && (x > 2 && x < 5)"),
        ("x < 5", "(x < 3) || (x > 2 && x < 5)"),
        ("x > 2 && x <= 3", "(x <= 3) && (x > 2 && x < 5)"),
        ("x >= 2 && x < 3", "(x < 3) && (x >= 2 && x < 5)"),
        ("x <= 5", "(x < 3) || (x > 2 && x <= 5)"),
        ("x >= 2 && x <= 3", "(x <= 3) && (x >= 2 && x < 5)"),
        ("x <= 5", "(x <= 3) || (x >= 2 && x <= 5)"),
        ("x > 2 && x < 3", "(x > 0 && x < 3) && (x > 2)"),
        ("x > 0", "(x > 0 && x < 3) || (x > 2)"),
        ("x >= 2 && x < 3", "(x > 0 && x < 3) && (x >= 2)"),
        ("x > 0", "(x > 0 && x <= 3) || (x >= 2)"),
        ("x > 2 && x < 3", "(x >= 0 && x < 3) && (x > 2)"),
        ("x >= 0", "(x >= 0 && x < 3) || (x > 2)"),
        ("x >= 2 && x <= 3", "(x >= 0 && x <= 3) && (x >= 2)"),
        ("x >= 0", "(x >= 0 && x <= 3) || (x >= 2)"),
    ];
    for (expected, value) in cases {
        assert_equivalent(expected, value);
    }
}

#[test]
fn sets_intersect_and_merge() {
    assert_equivalent(
        r#"contains(x, {"Slytherin", "Gryffindor", "Ravenclaw"})"#,
        r#"contains(x, {"Ravenclaw", "Gryffindor", "Slytherin"})"#,
    );
    assert_equivalent(
        "false",
        r#"contains(x, {"Gryffindor", "Slytherin"}) && contains(x, {"Ravenclaw", "Hufflepuff"})"#,
    );
    assert_equivalent(
        r#"x == "Ravenclaw""#,
        r#"contains(x, {"Gryffindor", "Ravenclaw"}) && contains(x, {"Ravenclaw", "Hufflepuff"})"#,
    );
    assert_equivalent(
        "false",
        r#"contains(x, {"Gryffindor", "Ravenclaw"}) && !contains(x, {"Ravenclaw", "Gryffindor"})"#,
    );
    assert_equivalent(
        r#"x == "Hufflepuff""#,
        r#"contains(x, {"Gryffindor", "Ravenclaw", "Hufflepuff"}) && !contains(x, {"Ravenclaw", "Gryffindor"})"#,
    );
    assert_equivalent(
        r#"contains(x, {"Gryffindor", "Slytherin", "Hufflepuff", "Ravenclaw"})"#,
        r#"contains(x, {"Gryffindor", "Slytherin"}) || contains(x, {"Ravenclaw", "Hufflepuff"})"#,
    );
}

/// `simple` and `complex` are equivalent and share one canonical tree.
fn assert_simplifies(simple: &str, complex: &str) {
    assert_equivalent(simple, complex);
    let simple = parse(simple);
    let complex = parse(complex);
    assert!(
        simple.canonical().strict_eq(complex.canonical()),
        "{} vs {}",
        simple.canonical(),
        complex.canonical()
    );
}

#[test]
fn simplification() {
    assert_simplifies("a || b", "a || b || a || b || a");
    assert_simplifies("a && b", "a && b && a && b && a");
    assert_simplifies("false", "a && !a");
    assert_simplifies("false", "b && a && !a");
    assert_simplifies("true", "a || !a");
    assert_simplifies("true", "b || a || !a");
    assert_simplifies("b", "b || (a && !a)");
    assert_simplifies("b || c", "b || c || (a && !a)");
    assert_simplifies("b", "b || (c && a && !a)");
    assert_simplifies("true", "(a && b) || !(a && b)");
    assert_simplifies("false", "(a || b) && !(a || b)");

    assert_simplifies("(a && c) || b", "(a && b) || (a && (b || c)) || (b && (b || c))");
    assert_simplifies(
        "(a && !b) || (!b && !c) || (b && c)",
        "(!a && !b && !c) || (!a && b && c) || (a && !b && !c) || (a && !b && c) || (a && b && c)",
    );
    assert_simplifies("a && b", "(a || !a) && ((a && b) || (a && b && !c))");
    assert_simplifies("c", "(b && c) || (!b && c)");
    assert_simplifies(
        "!a && b",
        "(!a && b) || (b && !a && !c) || (b && c && d && !a) || (b && e && !a && !c && !d)",
    );
    assert_simplifies(
        "(!a && c) || (!b && c)",
        "(a && !b && c) || (!a && b && c) || (!a && !b && c)",
    );
}

#[test]
fn literal_patterns_equal_equalities() {
    let strict = PredicateParser::new(ParserOptions::default().case_sensitive(true));
    assert_equivalence_with(&strict, true, r#"matches(x, "HELLO")"#, r#"x == "HELLO""#);
    assert_equivalence_with(&strict, true, r#"matches(x, "hello")"#, r#"x == "hello""#);
    assert_equivalence_with(&strict, false, r#"matches(x, "HELLO")"#, r#"x == "hello""#);
    assert_equivalence_with(&strict, false, r#"matches(x, "hello")"#, r#"x == "HELLO""#);
    assert_equivalence_with(&strict, true, "x != null", r#"matches(x, "*")"#);

    let relaxed = PredicateParser::new(ParserOptions::default().case_sensitive(false));
    assert_equivalence_with(&relaxed, false, r#"matches(x, "HELLO")"#, r#"x == "HELLO""#);
    assert_equivalence_with(&relaxed, true, r#"imatches(x, "A*")"#, r#"matches(x, "A*")"#);
    assert_equivalence_with(&relaxed, true, "x != null", r#"matches(x, "*")"#);
}
