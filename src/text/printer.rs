use std::fmt;

use crate::core::{write_quoted, Predicate, PredicateNode, ScalarValue, WildcardPattern};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Or,
    And,
    Unary,
}

/// `(op, attribute, value)` when `children` is the `x > v || x == v` shape.
fn inclusive_bound(children: &[Predicate]) -> Option<(&'static str, &str, &ScalarValue)> {
    let [bound, equal] = children else {
        return None;
    };
    let PredicateNode::EqualTo {
        attribute: eq_attribute,
        value: eq_value,
    } = equal.kind()
    else {
        return None;
    };
    let (op, attribute, value) = match bound.kind() {
        PredicateNode::GreaterThan { attribute, value } => (">=", attribute.as_str(), value),
        PredicateNode::LesserThan { attribute, value } => ("<=", attribute.as_str(), value),
        _ => return None,
    };
    (attribute == eq_attribute.as_str() && value.identical(eq_value)).then_some((op, attribute, value))
}

fn precedence(predicate: &Predicate) -> Precedence {
    match predicate.kind() {
        PredicateNode::Or(children) if inclusive_bound(children).is_none() => Precedence::Or,
        PredicateNode::And(_) => Precedence::And,
        _ => Precedence::Unary,
    }
}

fn write_pattern(
    f: &mut fmt::Formatter<'_>,
    attribute: &str,
    pattern: &WildcardPattern,
) -> fmt::Result {
    let name = if pattern.is_case_sensitive() {
        "matches"
    } else {
        "imatches"
    };
    write!(f, "{name}({attribute}, ")?;
    write_quoted(f, pattern.pattern())?;
    f.write_str(")")
}

fn write_set(f: &mut fmt::Formatter<'_>, attribute: &str, values: &[ScalarValue]) -> fmt::Result {
    write!(f, "contains({attribute}, {{")?;
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("})")
}

/// Writes `child` inside a parent of precedence `parent`. Same-level children
/// are parenthesised so nesting survives a round trip.
fn write_operand(f: &mut fmt::Formatter<'_>, child: &Predicate, parent: Precedence) -> fmt::Result {
    if precedence(child) <= parent {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    children: &[Predicate],
    level: Precedence,
    separator: &str,
) -> fmt::Result {
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write_operand(f, child, level)?;
    }
    Ok(())
}

fn write_negation(f: &mut fmt::Formatter<'_>, inner: &Predicate) -> fmt::Result {
    match inner.kind() {
        PredicateNode::EqualTo { attribute, value } => write!(f, "{attribute} != {value}"),
        PredicateNode::Like { attribute, pattern } => {
            f.write_str("!")?;
            write_pattern(f, attribute, pattern)
        }
        PredicateNode::In { attribute, values } => {
            f.write_str("!")?;
            write_set(f, attribute, values)
        }
        PredicateNode::True | PredicateNode::False => write!(f, "!{inner}"),
        _ => write!(f, "!({inner})"),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PredicateNode::True => f.write_str("true"),
            PredicateNode::False => f.write_str("false"),
            PredicateNode::EqualTo { attribute, value } => write!(f, "{attribute} == {value}"),
            PredicateNode::GreaterThan { attribute, value } => write!(f, "{attribute} > {value}"),
            PredicateNode::LesserThan { attribute, value } => write!(f, "{attribute} < {value}"),
            PredicateNode::Like { attribute, pattern } => write_pattern(f, attribute, pattern),
            PredicateNode::In { attribute, values } => write_set(f, attribute, values),
            PredicateNode::Not(inner) => write_negation(f, inner),
            PredicateNode::And(children) => write_joined(f, children, Precedence::And, " && "),
            PredicateNode::Or(children) => match inclusive_bound(children) {
                Some((op, attribute, value)) => write!(f, "{attribute} {op} {value}"),
                None => write_joined(f, children, Precedence::Or, " || "),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Predicate, PredicateBuilder, ScalarValue, WildcardPattern};

    fn eq(attribute: &str, value: impl Into<ScalarValue>) -> Predicate {
        Predicate::equal_to(attribute, value)
    }

    #[test]
    fn leaves() {
        assert_eq!(eq("lastName", "Weasley").to_string(), r#"lastName == "Weasley""#);
        assert_eq!(eq("lastName", ScalarValue::Null).to_string(), "lastName == null");
        assert_eq!((!eq("lastName", "Weasley")).to_string(), r#"lastName != "Weasley""#);
        assert_eq!(
            Predicate::greater_than("birthYear", 1980).expect("gt").to_string(),
            "birthYear > 1980"
        );
        assert_eq!(
            Predicate::like("a", WildcardPattern::new(r#"x"\*"#, false).expect("pattern"))
                .to_string(),
            r#"imatches(a, "x\"\\*")"#
        );
        assert_eq!(
            (!Predicate::in_set("house", ["Slytherin", "Gryffindor"]).expect("in")).to_string(),
            r#"!contains(house, {"Slytherin", "Gryffindor"})"#
        );
        assert_eq!(Predicate::in_set("x", [2.5]).expect("in").to_string(), "contains(x, {2.5})");
        assert_eq!((!Predicate::constant(true)).to_string(), "!true");
    }

    #[test]
    fn minimal_parentheses() {
        let predicate = (eq("a", 1) & eq("b", 2)) | (eq("c", 3) & (eq("d", 4) | eq("e", 5)));
        assert_eq!(
            predicate.to_string(),
            "a == 1 && b == 2 || c == 3 && (d == 4 || e == 5)"
        );
        let negated = !(eq("a", 1) | eq("b", 2));
        assert_eq!(negated.to_string(), "!(a == 1 || b == 2)");
        let bound = !Predicate::lesser_than("a", 1).expect("lt");
        assert_eq!(bound.to_string(), "!(a < 1)");
        assert_eq!((!!eq("a", 1)).to_string(), "!(a != 1)");
    }

    #[test]
    fn inclusive_bounds() {
        let built = PredicateBuilder::and()
            .greater_than_or_equal("a", 1)
            .lesser_than_or_equal("b", 2.5)
            .build()
            .expect("valid tree");
        assert_eq!(built.to_string(), "a >= 1 && b <= 2.5");
        let swapped = Predicate::or([eq("a", 1), Predicate::greater_than("a", 1).expect("gt")])
            .expect("or");
        assert_eq!(swapped.to_string(), "a == 1 || a > 1");
        assert_eq!((!built.clone()).to_string(), "!(a >= 1 && b <= 2.5)");
    }
}
