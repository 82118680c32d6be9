//! Turns prime implicants back into a sorted sum of conjunctions.

use std::ops::Bound;

use super::{
    cell_set::{Cell, CellSet},
    cover::{Cube, Domain, Segment, Variable},
    range::{KeyRange, RangeSet},
    structural_cmp,
};
use crate::core::{Predicate, PredicateNode, ScalarValue};

/// Maximal run of ranges separated only by single excluded values.
#[derive(Debug, PartialEq)]
enum Block {
    Point(ScalarValue),
    Interval {
        start: Bound<ScalarValue>,
        end: Bound<ScalarValue>,
        holes: Vec<ScalarValue>,
    },
}

/// Range of the cell at offset `local` inside a segment over `points`.
fn cell_range(points: &[ScalarValue], local: Cell) -> KeyRange<ScalarValue> {
    let index = local as usize / 2;
    if local % 2 == 1 {
        return KeyRange::point(points[index].clone());
    }
    let start = match index {
        0 => Bound::Unbounded,
        i => Bound::Excluded(points[i - 1].clone()),
    };
    let end = match points.get(index) {
        Some(point) => Bound::Excluded(point.clone()),
        None => Bound::Unbounded,
    };
    KeyRange::new(start, end)
}

fn blocks(ranges: Vec<KeyRange<ScalarValue>>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::new();
    for range in ranges {
        if let Some(point) = range.as_point() {
            out.push(Block::Point(point.clone()));
            continue;
        }
        if let (
            Some(Block::Interval { end, holes, .. }),
            Bound::Excluded(start),
        ) = (out.last_mut(), &range.start)
        {
            if matches!(end, Bound::Excluded(hole) if hole == start) {
                holes.push(start.clone());
                *end = range.end;
                continue;
            }
        }
        out.push(Block::Interval {
            start: range.start,
            end: range.end,
            holes: Vec::new(),
        });
    }
    out
}

fn segment_blocks(segment: &Segment, set: &CellSet) -> Vec<Block> {
    let ranges = segment
        .cells()
        .filter(|cell| set.contains(*cell))
        .map(|cell| cell_range(&segment.points, cell - segment.first))
        .collect();
    blocks(RangeSet::from_ranges(ranges).into_ranges())
}

fn covers_segment(segment: &Segment, set: &CellSet) -> bool {
    segment.cells().all(|cell| set.contains(cell))
}

struct Literals<'a> {
    attribute: &'a str,
}

impl Literals<'_> {
    fn equal_to(&self, value: &ScalarValue) -> Predicate {
        Predicate::equal_to(self.attribute, value.clone())
    }

    fn not_equal_to(&self, value: &ScalarValue) -> Predicate {
        Predicate::negation(self.equal_to(value))
    }

    fn greater_than(&self, value: &ScalarValue) -> Predicate {
        Predicate::from_kind(PredicateNode::GreaterThan {
            attribute: self.attribute.to_owned(),
            value: value.clone(),
        })
    }

    fn lesser_than(&self, value: &ScalarValue) -> Predicate {
        Predicate::from_kind(PredicateNode::LesserThan {
            attribute: self.attribute.to_owned(),
            value: value.clone(),
        })
    }

    fn points(&self, mut values: Vec<ScalarValue>) -> Option<Predicate> {
        match values.len() {
            0 => None,
            1 => values.pop().map(|value| self.equal_to(&value)),
            _ => Some(Predicate::from_kind(PredicateNode::In {
                attribute: self.attribute.to_owned(),
                values,
            })),
        }
    }

    fn holes<'h>(
        &'h self,
        holes: &'h [ScalarValue],
        keep: impl Fn(&ScalarValue) -> bool + 'h,
    ) -> impl Iterator<Item = Predicate> + 'h {
        holes
            .iter()
            .filter(move |hole| keep(*hole))
            .map(move |hole| self.not_equal_to(hole))
    }

    /// Conjunction false on every value of the segment whose smallest
    /// constant is `min`, true on null and on every other type.
    fn outside(&self, min: &ScalarValue) -> Vec<Predicate> {
        vec![
            !self.lesser_than(min),
            self.not_equal_to(min),
            !self.greater_than(min),
        ]
    }

    /// Conjunction matching `block` inside its own type, and every value of
    /// another type or null.
    fn loose_block(&self, block: &Block) -> Vec<Predicate> {
        let (start, end, holes) = match block {
            Block::Point(value) => return vec![!self.lesser_than(value), !self.greater_than(value)],
            Block::Interval { start, end, holes } => (start, end, holes),
        };
        let mut literals = Vec::with_capacity(holes.len() + 4);
        match start {
            Bound::Excluded(value) => {
                literals.push(!self.lesser_than(value));
                literals.push(self.not_equal_to(value));
            }
            Bound::Included(value) => literals.push(!self.lesser_than(value)),
            Bound::Unbounded => {}
        }
        match end {
            Bound::Excluded(value) => {
                literals.push(!self.greater_than(value));
                literals.push(self.not_equal_to(value));
            }
            Bound::Included(value) => literals.push(!self.greater_than(value)),
            Bound::Unbounded => {}
        }
        literals.extend(self.holes(holes, |_| true));
        literals
    }

    /// Alternatives matching exactly `block`. Isolated points go to
    /// `singles`.
    ///
    /// Only `>` and `<` confine a literal to one type, so an interval with
    /// no strict bound is split around a constant: its lower end, its upper
    /// end or the segment's smallest constant `min`.
    fn strict_block(
        &self,
        block: &Block,
        min: &ScalarValue,
        singles: &mut Vec<ScalarValue>,
    ) -> Vec<Vec<Predicate>> {
        let (start, end, holes) = match block {
            Block::Point(value) => {
                singles.push(value.clone());
                return Vec::new();
            }
            Block::Interval { start, end, holes } => (start, end, holes),
        };
        if matches!(start, Bound::Excluded(_)) || matches!(end, Bound::Excluded(_)) {
            let mut literals = Vec::with_capacity(holes.len() + 2);
            match start {
                Bound::Excluded(value) => literals.push(self.greater_than(value)),
                Bound::Included(value) => literals.push(!self.lesser_than(value)),
                Bound::Unbounded => {}
            }
            match end {
                Bound::Excluded(value) => literals.push(self.lesser_than(value)),
                Bound::Included(value) => literals.push(!self.greater_than(value)),
                Bound::Unbounded => {}
            }
            literals.extend(self.holes(holes, |_| true));
            return vec![literals];
        }

        let anchor = match (start, end) {
            (Bound::Included(value), _) | (_, Bound::Included(value)) => value,
            _ => min,
        };
        let mut out = Vec::with_capacity(2);
        if let Bound::Unbounded = start {
            let mut below = vec![self.lesser_than(anchor)];
            below.extend(self.holes(holes, |hole| hole < anchor));
            out.push(below);
        }
        if !holes.contains(anchor) {
            singles.push(anchor.clone());
        }
        match end {
            Bound::Included(value) if value == anchor => {}
            _ => {
                let mut above = vec![self.greater_than(anchor)];
                if let Bound::Included(value) = end {
                    above.push(!self.greater_than(value));
                }
                above.extend(self.holes(holes, |hole| hole > anchor));
                out.push(above);
            }
        }
        out
    }
}

/// Alternatives (each a list of literals to conjoin) describing `set`.
///
/// When `set` holds every value of some type, the main alternative is a
/// conjunction of literals that are true on other types. Otherwise every
/// alternative is confined to null or to a single type.
fn alternatives(variable: &Variable, set: &CellSet) -> Vec<Vec<Predicate>> {
    let (attribute, segments, foreign) = match variable {
        Variable::Pattern { attribute, pattern } => {
            let like = Predicate::like(attribute.clone(), pattern.clone());
            return if set.contains(1) {
                vec![vec![like]]
            } else {
                vec![vec![!like]]
            };
        }
        Variable::Ordered {
            attribute,
            segments,
            foreign,
        } => (attribute, segments, *foreign),
    };
    let literals = Literals { attribute };
    let nullable = set.contains(0);
    let loose = match foreign {
        Some(cell) => set.contains(cell),
        None => segments.iter().any(|segment| covers_segment(segment, set)),
    };

    let mut out = Vec::new();
    let mut main = Vec::new();
    if loose && !nullable {
        main.push(literals.not_equal_to(&ScalarValue::Null));
    } else if !loose && nullable {
        out.push(vec![literals.equal_to(&ScalarValue::Null)]);
    }
    for segment in segments {
        let Some(min) = segment.points.first() else {
            continue;
        };
        let mut blocks = segment_blocks(segment, set).into_iter();
        if loose {
            match blocks.next() {
                Some(block) => main.extend(literals.loose_block(&block)),
                None => main.extend(literals.outside(min)),
            }
        }
        let mut singles = Vec::new();
        for block in blocks {
            out.extend(literals.strict_block(&block, min, &mut singles));
        }
        if let Some(points) = literals.points(singles) {
            out.push(vec![points]);
        }
    }
    if loose {
        out.push(main);
    }
    out
}

/// Renders a prime cover as a sorted disjunction of sorted conjunctions.
pub(crate) fn render(domain: &Domain, primes: &[Cube]) -> Predicate {
    let mut clauses = Vec::new();
    for cube in primes {
        let mut partial: Vec<Vec<Predicate>> = vec![Vec::new()];
        for (variable, set) in domain.variables().iter().zip(cube.sets()) {
            if *set == variable.full() {
                continue;
            }
            let choices = alternatives(variable, set);
            partial = partial
                .iter()
                .flat_map(|prefix| {
                    choices.iter().map(move |choice| {
                        let mut literals = prefix.clone();
                        literals.extend(choice.iter().cloned());
                        literals
                    })
                })
                .collect();
        }
        for mut literals in partial {
            literals.sort_by(structural_cmp);
            clauses.push(Predicate::conjunction(literals));
        }
    }
    clauses.sort_by(structural_cmp);
    clauses.dedup_by(|left, right| structural_cmp(left, right).is_eq());
    Predicate::disjunction(clauses)
}
