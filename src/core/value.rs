use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// Literal values accepted by predicate leaves and returned by attribute contexts.
///
/// Values carry a total order: `Null` first, then booleans, numbers and strings.
/// Integers and floats share the number family and compare numerically, so
/// `Int64(1) == Float64(1.0)`. NaN sorts after every other number.
#[derive(Clone, Debug)]
pub enum ScalarValue {
    /// Absent value.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

/// Type family used for cross-type ordering and mismatch reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Family {
    Null,
    Boolean,
    Number,
    Utf8,
}

impl Family {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Family::Null => "null",
            Family::Boolean => "boolean",
            Family::Number => "number",
            Family::Utf8 => "string",
        }
    }
}

impl ScalarValue {
    /// Returns true when the literal is the `Null` variant.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(value) => Some(value),
            _ => None,
        }
    }

    /// Compares this scalar with another, returning the ordering when both sides are comparable.
    ///
    /// Null and values of different families are not comparable.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let family = self.family();
        if family == Family::Null || family != other.family() {
            return None;
        }
        Some(self.cmp(other))
    }

    /// Exact identity: same variant and same payload bits.
    ///
    /// Unlike `==`, `Int64(1)` is not identical to `Float64(1.0)`.
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Null, ScalarValue::Null) => true,
            (ScalarValue::Boolean(a), ScalarValue::Boolean(b)) => a == b,
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a == b,
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.to_bits() == b.to_bits(),
            (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn family(&self) -> Family {
        match self {
            ScalarValue::Null => Family::Null,
            ScalarValue::Boolean(_) => Family::Boolean,
            ScalarValue::Int64(_) | ScalarValue::Float64(_) => Family::Number,
            ScalarValue::Utf8(_) => Family::Utf8,
        }
    }
}

fn cmp_float(lhs: f64, rhs: f64) -> Ordering {
    match (lhs.is_nan(), rhs.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
    }
}

// i64::MAX as f64 rounds up to 2^63, so anything at or above it is larger than every i64.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;

fn cmp_int_float(lhs: i64, rhs: f64) -> Ordering {
    if rhs.is_nan() || rhs >= I64_UPPER {
        return Ordering::Less;
    }
    if rhs < I64_LOWER {
        return Ordering::Greater;
    }
    let truncated = rhs.trunc();
    match lhs.cmp(&(truncated as i64)) {
        Ordering::Equal if rhs > truncated => Ordering::Less,
        Ordering::Equal if rhs < truncated => Ordering::Greater,
        other => other,
    }
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(lhs), Boolean(rhs)) => lhs.cmp(rhs),
            (Int64(lhs), Int64(rhs)) => lhs.cmp(rhs),
            (Float64(lhs), Float64(rhs)) => cmp_float(*lhs, *rhs),
            (Int64(lhs), Float64(rhs)) => cmp_int_float(*lhs, *rhs),
            (Float64(lhs), Int64(rhs)) => cmp_int_float(*rhs, *lhs).reverse(),
            (Utf8(lhs), Utf8(rhs)) => lhs.cmp(rhs),
            _ => self.family().cmp(&other.family()),
        }
    }
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family().hash(state);
        match self {
            ScalarValue::Null => {}
            ScalarValue::Boolean(value) => value.hash(state),
            ScalarValue::Int64(value) => value.hash(state),
            ScalarValue::Float64(value) => {
                // Integral floats must hash like the integer they equal.
                if value.is_nan() {
                    u64::MAX.hash(state);
                } else if value.fract() == 0.0 && *value >= I64_LOWER && *value < I64_UPPER {
                    (*value as i64).hash(state);
                } else {
                    value.to_bits().hash(state);
                }
            }
            ScalarValue::Utf8(value) => value.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Boolean(value) => write!(f, "{value}"),
            ScalarValue::Int64(value) => write!(f, "{value}"),
            ScalarValue::Float64(value) => write!(f, "{value:?}"),
            ScalarValue::Utf8(value) => write_quoted(f, value),
        }
    }
}

/// Writes `text` as a double-quoted literal, escaping `"` and `\`.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{ch}")?;
    }
    f.write_str("\"")
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int64(i64::from(value))
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_owned())
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}
