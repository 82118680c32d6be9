//! Multi-valued cube covers and prime implicant generation.
//!
//! Every attribute compared with `==`, `>`, `<` or `contains` becomes an
//! ordered variable. Its cells partition the attribute's values by type
//! family and around the sorted distinct constants the predicate mentions:
//!
//! ```text
//! cell 0          null
//! segment cells   one run per family with constants, in family order:
//!                 gap, constant, gap, .., constant, gap
//! last cell       values of every family without constants
//! ```
//!
//! A bound only covers cells of its own family, so `x > 5` never holds on a
//! string. Wildcard patterns that cannot be reduced to a comparison become
//! two-cell boolean variables (`0` no match, `1` match).

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    ops::Range,
};

use log::Level;

use super::cell_set::{Cell, CellSet};
use crate::{
    core::{Family, Predicate, PredicateNode, ScalarValue, WildcardPattern},
    logging::predicate_log,
};

const FAMILIES: [Family; 3] = [Family::Boolean, Family::Number, Family::Utf8];

/// Cells of one type family inside an ordered variable.
#[derive(Clone, Debug)]
pub(crate) struct Segment {
    pub(crate) family: Family,
    /// Sorted, distinct and never empty.
    pub(crate) points: Vec<ScalarValue>,
    pub(crate) first: Cell,
}

impl Segment {
    pub(crate) fn cells(&self) -> Range<Cell> {
        self.first..self.first + 2 * self.points.len() as Cell + 1
    }

    fn point_cell(&self, value: &ScalarValue) -> Cell {
        self.first + 2 * self.points.partition_point(|point| point < value) as Cell + 1
    }
}

/// One dimension of the cover.
#[derive(Clone, Debug)]
pub(crate) enum Variable {
    /// Attribute compared against non-null constants.
    Ordered {
        attribute: String,
        segments: Vec<Segment>,
        /// Cell of the families no constant belongs to, if any is left.
        foreign: Option<Cell>,
    },
    /// Whether `attribute` matches `pattern`.
    Pattern {
        attribute: String,
        pattern: WildcardPattern,
    },
}

impl Variable {
    /// Lays out the cells of `attribute` around `values`. Nulls are ignored.
    pub(crate) fn ordered(attribute: String, mut values: Vec<ScalarValue>) -> Self {
        values.retain(|value| !value.is_null());
        values.sort();
        values.dedup();
        let mut segments: Vec<Segment> = Vec::new();
        let mut next: Cell = 1;
        for family in FAMILIES {
            let points: Vec<ScalarValue> = values
                .iter()
                .filter(|value| value.family() == family)
                .cloned()
                .collect();
            if points.is_empty() {
                continue;
            }
            let segment = Segment {
                family,
                points,
                first: next,
            };
            next = segment.cells().end;
            segments.push(segment);
        }
        let foreign = (segments.len() < FAMILIES.len()).then_some(next);
        Variable::Ordered {
            attribute,
            segments,
            foreign,
        }
    }

    pub(crate) fn width(&self) -> Cell {
        match self {
            Variable::Ordered {
                segments, foreign, ..
            } => match foreign {
                Some(cell) => cell + 1,
                None => segments.last().map_or(1, |segment| segment.cells().end),
            },
            Variable::Pattern { .. } => 2,
        }
    }

    pub(crate) fn full(&self) -> CellSet {
        CellSet::from_range(0..self.width())
    }

    fn segment(&self, family: Family) -> Option<&Segment> {
        match self {
            Variable::Ordered { segments, .. } => {
                segments.iter().find(|segment| segment.family == family)
            }
            Variable::Pattern { .. } => None,
        }
    }

    fn point_cell(&self, value: &ScalarValue) -> Option<Cell> {
        self.segment(value.family())
            .map(|segment| segment.point_cell(value))
    }
}

/// How a `matches(..)` leaf takes part in the cover.
pub(crate) enum LikeShape {
    /// Case-sensitive and wildcard free: plain equality.
    Literal(String),
    /// Matches any string: a non-null test.
    Everything,
    /// Anything else: an independent boolean variable.
    Glob,
}

pub(crate) fn like_shape(pattern: &WildcardPattern) -> LikeShape {
    if pattern.matches_everything() {
        return LikeShape::Everything;
    }
    match pattern.literal() {
        Some(text) if pattern.is_case_sensitive() => LikeShape::Literal(text),
        _ => LikeShape::Glob,
    }
}

/// Product of one cell set per variable.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cube {
    sets: Vec<CellSet>,
}

impl Cube {
    pub(crate) fn sets(&self) -> &[CellSet] {
        &self.sets
    }

    fn intersect(&self, other: &Cube) -> Option<Cube> {
        let mut sets = Vec::with_capacity(self.sets.len());
        for (left, right) in self.sets.iter().zip(&other.sets) {
            let set = left.intersect(right);
            if set.is_empty() {
                return None;
            }
            sets.push(set);
        }
        Some(Cube { sets })
    }

    /// Whether `other` lies entirely inside `self`.
    fn covers(&self, other: &Cube) -> bool {
        other
            .sets
            .iter()
            .zip(&self.sets)
            .all(|(inner, outer)| inner.is_subset(outer))
    }
}

/// The variables of one predicate and the mapping from leaves to cells.
#[derive(Debug)]
pub(crate) struct Domain {
    variables: Vec<Variable>,
    ordered: HashMap<String, usize>,
    patterns: HashMap<(String, WildcardPattern), usize>,
}

impl Domain {
    /// Collects every variable `predicate` consults.
    pub(crate) fn collect(predicate: &Predicate) -> Self {
        let mut ordered = BTreeMap::<String, Vec<ScalarValue>>::new();
        let mut patterns = BTreeSet::<(String, WildcardPattern)>::new();
        collect_leaves(predicate, &mut ordered, &mut patterns);

        let mut domain = Domain {
            variables: Vec::with_capacity(ordered.len() + patterns.len()),
            ordered: HashMap::with_capacity(ordered.len()),
            patterns: HashMap::with_capacity(patterns.len()),
        };
        for (attribute, values) in ordered {
            domain
                .ordered
                .insert(attribute.clone(), domain.variables.len());
            domain.variables.push(Variable::ordered(attribute, values));
        }
        for (attribute, pattern) in patterns {
            domain
                .patterns
                .insert((attribute.clone(), pattern.clone()), domain.variables.len());
            domain
                .variables
                .push(Variable::Pattern { attribute, pattern });
        }
        domain
    }

    pub(crate) fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn full_cube(&self) -> Cube {
        Cube {
            sets: self.variables.iter().map(Variable::full).collect(),
        }
    }

    fn ordered_index(&self, attribute: &str) -> Option<usize> {
        self.ordered.get(attribute).copied()
    }

    /// Variable and cell set selected by a comparison leaf.
    fn leaf_cells(&self, node: &PredicateNode) -> Option<(usize, CellSet)> {
        match node {
            PredicateNode::EqualTo { attribute, value } => {
                let index = self.ordered_index(attribute)?;
                let cell = if value.is_null() {
                    0
                } else {
                    self.variables[index].point_cell(value)?
                };
                Some((index, CellSet::single(cell)))
            }
            PredicateNode::GreaterThan { attribute, value } => {
                let index = self.ordered_index(attribute)?;
                let segment = self.variables[index].segment(value.family())?;
                let first = segment.point_cell(value) + 1;
                Some((index, CellSet::from_range(first..segment.cells().end)))
            }
            PredicateNode::LesserThan { attribute, value } => {
                let index = self.ordered_index(attribute)?;
                let segment = self.variables[index].segment(value.family())?;
                let end = segment.point_cell(value);
                Some((index, CellSet::from_range(segment.first..end)))
            }
            PredicateNode::In { attribute, values } => {
                let index = self.ordered_index(attribute)?;
                let variable = &self.variables[index];
                let cells = values
                    .iter()
                    .map(|value| variable.point_cell(value))
                    .collect::<Option<CellSet>>()?;
                Some((index, cells))
            }
            PredicateNode::Like { attribute, pattern } => match like_shape(pattern) {
                LikeShape::Literal(text) => {
                    let index = self.ordered_index(attribute)?;
                    let cell = self.variables[index].point_cell(&ScalarValue::Utf8(text))?;
                    Some((index, CellSet::single(cell)))
                }
                LikeShape::Everything => {
                    let index = self.ordered_index(attribute)?;
                    Some((
                        index,
                        CellSet::from_range(1..self.variables[index].width()),
                    ))
                }
                LikeShape::Glob => {
                    let index = *self.patterns.get(&(attribute.clone(), pattern.clone()))?;
                    Some((index, CellSet::single(1)))
                }
            },
            PredicateNode::True
            | PredicateNode::False
            | PredicateNode::Not(_)
            | PredicateNode::And(_)
            | PredicateNode::Or(_) => None,
        }
    }

    /// Absorbed cube cover of `predicate`, or of its negation when `negated`.
    pub(crate) fn cover(&self, predicate: &Predicate, negated: bool) -> Vec<Cube> {
        match predicate.kind() {
            PredicateNode::True => self.constant(!negated),
            PredicateNode::False => self.constant(negated),
            PredicateNode::Not(inner) => self.cover(inner, !negated),
            PredicateNode::And(children) if !negated => self.product(children, false),
            PredicateNode::And(children) => self.sum(children, true),
            PredicateNode::Or(children) if !negated => self.sum(children, false),
            PredicateNode::Or(children) => self.product(children, true),
            leaf => {
                let Some((variable, mut cells)) = self.leaf_cells(leaf) else {
                    return Vec::new();
                };
                if negated {
                    cells = self.variables[variable].full().difference(&cells);
                }
                if cells.is_empty() {
                    return Vec::new();
                }
                let mut cube = self.full_cube();
                cube.sets[variable] = cells;
                vec![cube]
            }
        }
    }

    fn constant(&self, value: bool) -> Vec<Cube> {
        if value {
            vec![self.full_cube()]
        } else {
            Vec::new()
        }
    }

    fn sum(&self, children: &[Predicate], negated: bool) -> Vec<Cube> {
        let mut cubes = Vec::new();
        for child in children {
            for cube in self.cover(child, negated) {
                absorb_insert(&mut cubes, cube);
            }
        }
        cubes
    }

    fn product(&self, children: &[Predicate], negated: bool) -> Vec<Cube> {
        let mut acc = vec![self.full_cube()];
        for child in children {
            let factor = self.cover(child, negated);
            let mut next = Vec::new();
            for left in &acc {
                for right in &factor {
                    if let Some(cube) = left.intersect(right) {
                        absorb_insert(&mut next, cube);
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            acc = next;
        }
        acc
    }
}

fn collect_leaves(
    predicate: &Predicate,
    ordered: &mut BTreeMap<String, Vec<ScalarValue>>,
    patterns: &mut BTreeSet<(String, WildcardPattern)>,
) {
    match predicate.kind() {
        PredicateNode::True | PredicateNode::False => {}
        PredicateNode::EqualTo { attribute, value }
        | PredicateNode::GreaterThan { attribute, value }
        | PredicateNode::LesserThan { attribute, value } => {
            add_points(ordered, attribute, [value.clone()]);
        }
        PredicateNode::In { attribute, values } => {
            add_points(ordered, attribute, values.iter().cloned());
        }
        PredicateNode::Like { attribute, pattern } => match like_shape(pattern) {
            LikeShape::Literal(text) => add_points(ordered, attribute, [ScalarValue::Utf8(text)]),
            LikeShape::Everything => add_points(ordered, attribute, std::iter::empty()),
            LikeShape::Glob => {
                patterns.insert((attribute.clone(), pattern.clone()));
            }
        },
        PredicateNode::Not(inner) => collect_leaves(inner, ordered, patterns),
        PredicateNode::And(children) | PredicateNode::Or(children) => {
            for child in children {
                collect_leaves(child, ordered, patterns);
            }
        }
    }
}

fn add_points<I>(ordered: &mut BTreeMap<String, Vec<ScalarValue>>, attribute: &str, values: I)
where
    I: IntoIterator<Item = ScalarValue>,
{
    ordered
        .entry(attribute.to_owned())
        .or_default()
        .extend(values);
}

/// Adds `cube` unless an existing cube covers it, dropping cubes it covers.
///
/// Returns whether the cube was added.
fn absorb_insert(cubes: &mut Vec<Cube>, cube: Cube) -> bool {
    if cubes.iter().any(|kept| kept.covers(&cube)) {
        return false;
    }
    cubes.retain(|kept| !cube.covers(kept));
    cubes.push(cube);
    true
}

/// Multi-valued consensus of two cubes.
///
/// Disjoint in two or more variables: none. Disjoint in exactly one: the
/// consensus on that variable. Otherwise one candidate per variable.
fn consensus(left: &Cube, right: &Cube) -> Vec<Cube> {
    let meet: Vec<CellSet> = left
        .sets
        .iter()
        .zip(&right.sets)
        .map(|(l, r)| l.intersect(r))
        .collect();
    let disjoint: Vec<usize> = meet
        .iter()
        .enumerate()
        .filter(|(_, set)| set.is_empty())
        .map(|(variable, _)| variable)
        .collect();
    let on = |variable: usize| {
        let mut sets = meet.clone();
        sets[variable] = left.sets[variable].union(&right.sets[variable]);
        Cube { sets }
    };
    match disjoint.as_slice() {
        [] => (0..meet.len()).map(on).collect(),
        [variable] => vec![on(*variable)],
        _ => Vec::new(),
    }
}

/// Every prime implicant of the function covered by `cubes`, via iterated
/// consensus with absorption. Also returns the number of rounds run.
pub(crate) fn prime_implicants(cubes: Vec<Cube>) -> (Vec<Cube>, usize) {
    let mut primes: Vec<Cube> = Vec::with_capacity(cubes.len());
    for cube in cubes {
        absorb_insert(&mut primes, cube);
    }
    let mut fresh = vec![true; primes.len()];
    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut candidates = Vec::new();
        for i in 0..primes.len() {
            for j in (i + 1)..primes.len() {
                if fresh[i] || fresh[j] {
                    candidates.extend(consensus(&primes[i], &primes[j]));
                }
            }
        }
        let mut added = 0usize;
        let mut next: Vec<(Cube, bool)> = primes.into_iter().map(|cube| (cube, false)).collect();
        for candidate in candidates {
            if next.iter().any(|(kept, _)| kept.covers(&candidate)) {
                continue;
            }
            next.retain(|(kept, _)| !candidate.covers(kept));
            next.push((candidate, true));
            added += 1;
        }
        predicate_log!(
            Level::Trace,
            "consensus_round",
            "round={} cubes={} added={}",
            rounds,
            next.len(),
            added
        );
        fresh = next.iter().map(|(_, is_fresh)| *is_fresh).collect();
        primes = next.into_iter().map(|(cube, _)| cube).collect();
        if added == 0 {
            return (primes, rounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{prime_implicants, Domain, Variable};
    use crate::{
        canonical::cell_set::CellSet,
        core::{Family, Predicate, ScalarValue, WildcardPattern},
    };

    fn gt(attribute: &str, value: i64) -> Predicate {
        Predicate::greater_than(attribute, value).expect("gt")
    }

    fn lt(attribute: &str, value: i64) -> Predicate {
        Predicate::lesser_than(attribute, value).expect("lt")
    }

    fn cells(set: &CellSet) -> Vec<u32> {
        set.iter().collect()
    }

    #[test]
    fn domain_sorts_points_and_separates_patterns() {
        let predicate = (gt("x", 5) | Predicate::equal_to("x", 1))
            & Predicate::like("name", WildcardPattern::new("P*", true).expect("pattern"))
            & Predicate::like("name", WildcardPattern::new("Potter", true).expect("pattern"))
            & Predicate::equal_to("x", 5.0);
        let domain = Domain::collect(&predicate);
        let variables = domain.variables();
        assert_eq!(variables.len(), 3);
        match &variables[1] {
            Variable::Ordered {
                attribute,
                segments,
                foreign,
            } => {
                assert_eq!(attribute, "x");
                assert_eq!(segments.len(), 1);
                assert_eq!(segments[0].family, Family::Number);
                assert_eq!(
                    segments[0].points,
                    vec![ScalarValue::Int64(1), ScalarValue::Int64(5)]
                );
                assert_eq!(segments[0].cells(), 1..6);
                assert_eq!(*foreign, Some(6));
            }
            other => panic!("expected x, got {other:?}"),
        }
        match &variables[0] {
            Variable::Ordered {
                attribute,
                segments,
                ..
            } => {
                assert_eq!(attribute, "name");
                assert_eq!(segments[0].family, Family::Utf8);
                assert_eq!(segments[0].points, vec![ScalarValue::from("Potter")]);
            }
            other => panic!("expected name, got {other:?}"),
        }
        assert!(matches!(&variables[2], Variable::Pattern { .. }));
    }

    #[test]
    fn leaves_select_expected_cells() {
        // null=0, (..3)=1, 3=2, (3,7)=3, 7=4, (7..)=5, other types=6
        let predicate = gt("x", 3) & lt("x", 7);
        let domain = Domain::collect(&predicate);
        let cover = domain.cover(&predicate, false);
        assert_eq!(cover.len(), 1);
        assert_eq!(cells(&cover[0].sets()[0]), vec![3]);

        let negated = domain.cover(&predicate, true);
        let mut union: Vec<u32> = negated.iter().flat_map(|cube| cells(&cube.sets()[0])).collect();
        union.sort_unstable();
        union.dedup();
        assert_eq!(union, vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn bounds_stay_inside_their_family() {
        // null=0, number: (..5)=1, 5=2, (5..)=3, utf8: (..a)=4, a=5, (a..)=6, boolean=7
        let predicate = gt("x", 5) | Predicate::lesser_than("x", "a").expect("lt");
        let domain = Domain::collect(&predicate);
        assert_eq!(domain.variables()[0].width(), 8);
        let cover = domain.cover(&predicate, false);
        let mut union: Vec<u32> = cover.iter().flat_map(|cube| cells(&cube.sets()[0])).collect();
        union.sort_unstable();
        assert_eq!(union, vec![3, 4]);

        let mixed = gt("x", 5) & Predicate::equal_to("x", "a");
        assert!(Domain::collect(&mixed).cover(&mixed, false).is_empty());
    }

    #[test]
    fn every_family_present_leaves_no_foreign_cell() {
        let predicate = Predicate::equal_to("x", 1)
            | Predicate::equal_to("x", "a")
            | Predicate::equal_to("x", true);
        let domain = Domain::collect(&predicate);
        match &domain.variables()[0] {
            Variable::Ordered {
                segments, foreign, ..
            } => {
                let families: Vec<Family> = segments.iter().map(|segment| segment.family).collect();
                assert_eq!(families, vec![Family::Boolean, Family::Number, Family::Utf8]);
                assert_eq!(*foreign, None);
            }
            other => panic!("expected x, got {other:?}"),
        }
        assert_eq!(domain.variables()[0].width(), 10);
    }

    #[test]
    fn contradiction_has_empty_cover() {
        let predicate = Predicate::equal_to("x", 1) & !Predicate::equal_to("x", 1);
        let domain = Domain::collect(&predicate);
        assert!(domain.cover(&predicate, false).is_empty());
        let (primes, _) = prime_implicants(domain.cover(&predicate, true));
        assert_eq!(primes.len(), 1);
        assert_eq!(cells(&primes[0].sets()[0]), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn consensus_finds_hidden_prime() {
        // (a && b) || (!a && c) has the consensus term (b && c).
        let a = Predicate::equal_to("a", true);
        let b = Predicate::equal_to("b", true);
        let c = Predicate::equal_to("c", true);
        let predicate = (a.clone() & b.clone()) | (!a & c.clone());
        let domain = Domain::collect(&predicate);
        let cover = domain.cover(&predicate, false);
        assert_eq!(cover.len(), 2);
        let (primes, rounds) = prime_implicants(cover);
        assert_eq!(primes.len(), 3);
        assert!(rounds >= 2);
        let target = domain.cover(&(b & c), false);
        assert!(primes.contains(&target[0]));
    }

    #[test]
    fn overlapping_intervals_merge_into_one_prime() {
        let predicate = (gt("x", 0) & lt("x", 3)) | (gt("x", 2) & lt("x", 5));
        let domain = Domain::collect(&predicate);
        let (primes, _) = prime_implicants(domain.cover(&predicate, false));
        assert_eq!(primes.len(), 1);
        // Points 0, 2, 3, 5: everything strictly between 0 and 5.
        assert_eq!(cells(&primes[0].sets()[0]), vec![3, 4, 5, 6, 7]);
    }
}
