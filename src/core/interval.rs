// Copyright 2025 Joinkit Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Intervals with open or closed endpoints.
//!
//! Intervals participate in joins through the `Contains` / `Within`
//! predicates (interval vs. point) and the set-relation predicates
//! (interval vs. interval). Endpoints are [`Datum`] scalars; callers are
//! expected to build intervals with `lo <= hi`.

use std::cmp::Ordering;
use std::fmt;

use super::datum::Datum;

/// An interval over ordered scalars, with per-endpoint closedness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    lo: Datum,
    hi: Datum,
    lo_closed: bool,
    hi_closed: bool,
}

impl Interval {
    /// Closed interval `[lo, hi]`.
    pub fn closed(lo: impl Into<Datum>, hi: impl Into<Datum>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
            lo_closed: true,
            hi_closed: true,
        }
    }

    /// Open interval `(lo, hi)`.
    pub fn open(lo: impl Into<Datum>, hi: impl Into<Datum>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
            lo_closed: false,
            hi_closed: false,
        }
    }

    /// Half-open interval `[lo, hi)`.
    pub fn half_open(lo: impl Into<Datum>, hi: impl Into<Datum>) -> Self {
        Self {
            lo: lo.into(),
            hi: hi.into(),
            lo_closed: true,
            hi_closed: false,
        }
    }

    /// Lower endpoint.
    pub fn lo(&self) -> &Datum {
        &self.lo
    }

    /// Upper endpoint.
    pub fn hi(&self) -> &Datum {
        &self.hi
    }

    /// Whether the lower endpoint is included.
    pub fn lo_closed(&self) -> bool {
        self.lo_closed
    }

    /// Whether the upper endpoint is included.
    pub fn hi_closed(&self) -> bool {
        self.hi_closed
    }

    /// Whether `point` lies inside this interval, honoring endpoint
    /// closedness.
    pub fn contains(&self, point: &Datum) -> bool {
        let above_lo = match point.cmp(&self.lo) {
            Ordering::Greater => true,
            Ordering::Equal => self.lo_closed,
            Ordering::Less => false,
        };
        let below_hi = match point.cmp(&self.hi) {
            Ordering::Less => true,
            Ordering::Equal => self.hi_closed,
            Ordering::Greater => false,
        };
        above_lo && below_hi
    }

    /// Whether the two intervals denote the same point set.
    fn set_eq(&self, other: &Interval) -> bool {
        self.lo == other.lo
            && self.hi == other.hi
            && self.lo_closed == other.lo_closed
            && self.hi_closed == other.hi_closed
    }

    /// `self ⊆ other`.
    pub fn subset_of(&self, other: &Interval) -> bool {
        let lo_ok = match other.lo.cmp(&self.lo) {
            Ordering::Less => true,
            Ordering::Equal => other.lo_closed || !self.lo_closed,
            Ordering::Greater => false,
        };
        let hi_ok = match self.hi.cmp(&other.hi) {
            Ordering::Less => true,
            Ordering::Equal => other.hi_closed || !self.hi_closed,
            Ordering::Greater => false,
        };
        lo_ok && hi_ok
    }

    /// `self ⊊ other`.
    pub fn proper_subset_of(&self, other: &Interval) -> bool {
        self.subset_of(other) && !self.set_eq(other)
    }

    /// `self ⊇ other`.
    pub fn superset_of(&self, other: &Interval) -> bool {
        other.subset_of(self)
    }

    /// `self ⊋ other`.
    pub fn proper_superset_of(&self, other: &Interval) -> bool {
        other.proper_subset_of(self)
    }

    /// Whether the two intervals share at least one point (`¬disjoint`).
    pub fn overlaps(&self, other: &Interval) -> bool {
        let left_of = |a: &Interval, b: &Interval| match a.hi.cmp(&b.lo) {
            Ordering::Less => true,
            Ordering::Equal => !(a.hi_closed && b.lo_closed),
            Ordering::Greater => false,
        };
        !left_of(self, other) && !left_of(other, self)
    }

    /// Numeric midpoint, when both endpoints are numeric. Used by the
    /// `closest`-inside-interval reduction.
    pub fn midpoint(&self) -> Option<f64> {
        Some((self.lo.as_f64()? + self.hi.as_f64()?) / 2.0)
    }
}

// Lexicographic total order so intervals can live in sorted datum columns.
// This orders by bounds, not by set inclusion.
impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lo
            .cmp(&other.lo)
            .then_with(|| other.lo_closed.cmp(&self.lo_closed))
            .then_with(|| self.hi.cmp(&other.hi))
            .then_with(|| self.hi_closed.cmp(&other.hi_closed))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lo_closed { '[' } else { '(' },
            self.lo,
            self.hi,
            if self.hi_closed { ']' } else { ')' },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_honors_closedness() {
        let closed = Interval::closed(0, 3);
        assert!(closed.contains(&Datum::Int(0)));
        assert!(closed.contains(&Datum::Int(3)));
        assert!(closed.contains(&Datum::Int(2)));
        assert!(!closed.contains(&Datum::Int(-1)));
        assert!(!closed.contains(&Datum::Int(4)));

        let open = Interval::open(0, 3);
        assert!(!open.contains(&Datum::Int(0)));
        assert!(!open.contains(&Datum::Int(3)));
        assert!(open.contains(&Datum::Int(1)));

        let half = Interval::half_open(0, 3);
        assert!(half.contains(&Datum::Int(0)));
        assert!(!half.contains(&Datum::Int(3)));
    }

    #[test]
    fn test_subset_relations() {
        let outer = Interval::closed(0, 10);
        let inner = Interval::closed(2, 5);
        assert!(inner.subset_of(&outer));
        assert!(inner.proper_subset_of(&outer));
        assert!(outer.superset_of(&inner));
        assert!(outer.proper_superset_of(&inner));
        assert!(!outer.subset_of(&inner));

        // An interval is a subset of itself, but not a proper one
        assert!(outer.subset_of(&outer));
        assert!(!outer.proper_subset_of(&outer));

        // Same bounds, open endpoint is the smaller set
        let open = Interval::open(0, 10);
        assert!(open.subset_of(&outer));
        assert!(open.proper_subset_of(&outer));
        assert!(!outer.subset_of(&open));
    }

    #[test]
    fn test_overlaps() {
        let a = Interval::closed(0, 5);
        let b = Interval::closed(5, 10);
        let c = Interval::closed(6, 10);
        assert!(a.overlaps(&b)); // touch at a closed endpoint
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));

        // Touching at an open endpoint is disjoint
        let half = Interval::half_open(0, 5);
        assert!(!half.overlaps(&Interval::closed(5, 10)));
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(Interval::closed(0, 4).midpoint(), Some(2.0));
        assert_eq!(Interval::closed(1.0, 2.0).midpoint(), Some(1.5));
        assert_eq!(Interval::closed("a", "b").midpoint(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Interval::closed(0, 3).to_string(), "[0, 3]");
        assert_eq!(Interval::half_open(0, 3).to_string(), "[0, 3)");
    }
}
