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

//! Result-shape configuration: non-match policy, match multiplicity,
//! grouping, cardinality assertions, and mode pinning.
//!
//! Options are validated up front, before any data is scanned; a
//! contradictory combination is a [`Error::Config`] and never a silent
//! reinterpretation.

use std::fmt;

use crate::core::{Error, Result, Side};
use crate::mode::Mode;

/// Whether unmatched elements of a side still appear in the output,
/// paired with an absent counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonMatch {
    /// Unmatched elements are omitted.
    #[default]
    Drop,
    /// Unmatched elements appear with `None` on the other side.
    Keep,
}

/// How multiple matches for one element of the opposite side are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Multi {
    /// Keep every match.
    #[default]
    All,
    /// Keep the match with the smallest original index.
    First,
    /// Keep the match with the largest original index.
    Last,
    /// Keep the closest match, as defined by the anchor condition
    /// (minimal key for `<`/`<=`, maximal for `>`/`>=`, nearest to the
    /// interval midpoint for `contains`, minimal metric distance for
    /// distance conditions). Ties break toward the smallest index.
    Closest,
}

/// Flat output or output grouped by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// One output row per match pair.
    #[default]
    None,
    /// One output row per left element, holding all its right matches.
    Left,
    /// One output row per right element, holding all its left matches.
    Right,
}

/// Asserted bounds on the per-element match count of a side.
///
/// Checked after assembly; a violation is a typed error naming the side
/// and the first offending element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// No constraint (`*`).
    #[default]
    Any,
    /// At least one match (`+`).
    AtLeastOne,
    /// Exactly `n` matches.
    Exactly(usize),
    /// Between `a` and `b` matches, inclusive.
    Between(usize, usize),
}

impl Cardinality {
    /// Whether a per-element match count satisfies the assertion.
    pub fn admits(&self, count: usize) -> bool {
        match self {
            Cardinality::Any => true,
            Cardinality::AtLeastOne => count >= 1,
            Cardinality::Exactly(n) => count == *n,
            Cardinality::Between(a, b) => (*a..=*b).contains(&count),
        }
    }

    /// Whether any checking is needed at all.
    pub(crate) fn is_checked(&self) -> bool {
        !matches!(self, Cardinality::Any)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Any => write!(f, "*"),
            Cardinality::AtLeastOne => write!(f, "+"),
            Cardinality::Exactly(n) => write!(f, "={}", n),
            Cardinality::Between(a, b) => write!(f, "{}..{}", a, b),
        }
    }
}

/// A pair of per-side values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerSide<T> {
    pub left: T,
    pub right: T,
}

impl<T: Clone> PerSide<T> {
    /// The same value on both sides.
    pub fn both(value: T) -> Self {
        PerSide {
            left: value.clone(),
            right: value,
        }
    }
}

impl<T> PerSide<T> {
    /// Per-side values.
    pub fn new(left: T, right: T) -> Self {
        PerSide { left, right }
    }

    /// The value for one side.
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// The pair with sides exchanged.
    pub fn swapped(self) -> Self {
        PerSide {
            left: self.right,
            right: self.left,
        }
    }
}

/// Options controlling join execution and result shape.
///
/// Defaults: drop non-matches on both sides, keep all matches, flat
/// output, no cardinality constraint, automatic mode selection.
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    /// Whether unmatched elements of each side appear in the output.
    pub nonmatches: PerSide<NonMatch>,
    /// Match multiplicity policy per side. `multi.left` reduces the right
    /// matches of each left element; `multi.right` is the symmetric policy.
    pub multi: PerSide<Multi>,
    /// Flat output or grouped by one side.
    pub groupby: GroupBy,
    /// Per-side cardinality assertions.
    pub cardinality: PerSide<Cardinality>,
    /// Pinned execution mode. `None` selects automatically; a pinned mode
    /// the condition does not support fails instead of falling back.
    pub mode: Option<Mode>,
}

impl JoinOptions {
    /// Inner join: drop non-matches on both sides.
    pub fn inner() -> Self {
        Self::default()
    }

    /// Left join: keep unmatched left elements.
    pub fn left() -> Self {
        Self {
            nonmatches: PerSide::new(NonMatch::Keep, NonMatch::Drop),
            ..Default::default()
        }
    }

    /// Right join: keep unmatched right elements.
    pub fn right() -> Self {
        Self {
            nonmatches: PerSide::new(NonMatch::Drop, NonMatch::Keep),
            ..Default::default()
        }
    }

    /// Outer join: keep unmatched elements of both sides.
    pub fn outer() -> Self {
        Self {
            nonmatches: PerSide::both(NonMatch::Keep),
            ..Default::default()
        }
    }

    /// Set the multiplicity policy for the left side (how the right-side
    /// matches of each left element are reduced).
    pub fn with_multi(mut self, multi: Multi) -> Self {
        self.multi.left = multi;
        self
    }

    /// Set the multiplicity policy for the right side.
    pub fn with_multi_right(mut self, multi: Multi) -> Self {
        self.multi.right = multi;
        self
    }

    /// Group the output by one side.
    pub fn with_groupby(mut self, groupby: GroupBy) -> Self {
        self.groupby = groupby;
        self
    }

    /// Set the non-match policy per side.
    pub fn with_nonmatches(mut self, nonmatches: PerSide<NonMatch>) -> Self {
        self.nonmatches = nonmatches;
        self
    }

    /// Assert a cardinality bound on the left side.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality.left = cardinality;
        self
    }

    /// Assert a cardinality bound on the right side.
    pub fn with_cardinality_right(mut self, cardinality: Cardinality) -> Self {
        self.cardinality.right = cardinality;
        self
    }

    /// Pin the execution mode.
    ///
    /// `Mode::SortChain` additionally asserts that the probed side is
    /// already sorted by its key; the engine does not verify this.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Check the option combination before execution.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.multi.left != Multi::All && self.nonmatches.right == NonMatch::Keep {
            return Err(Error::config(
                "multi on the left side reduces right-side matches, so kept right \
                 non-matches would be ambiguous; use multi = all or drop them",
            ));
        }
        if self.multi.right != Multi::All && self.nonmatches.left == NonMatch::Keep {
            return Err(Error::config(
                "multi on the right side reduces left-side matches, so kept left \
                 non-matches would be ambiguous; use multi = all or drop them",
            ));
        }
        if self.multi.left != Multi::All && self.multi.right != Multi::All {
            return Err(Error::config(
                "multi cannot reduce both sides at once; pick one side",
            ));
        }
        Ok(())
    }

    /// The options with sides exchanged (grouping flips with them).
    pub(crate) fn side_swapped(&self) -> Self {
        Self {
            nonmatches: self.nonmatches.swapped(),
            multi: self.multi.swapped(),
            groupby: match self.groupby {
                GroupBy::None => GroupBy::None,
                GroupBy::Left => GroupBy::Right,
                GroupBy::Right => GroupBy::Left,
            },
            cardinality: self.cardinality.swapped(),
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = JoinOptions::default();
        assert_eq!(opts.nonmatches, PerSide::both(NonMatch::Drop));
        assert_eq!(opts.multi, PerSide::both(Multi::All));
        assert_eq!(opts.groupby, GroupBy::None);
        assert_eq!(opts.cardinality, PerSide::both(Cardinality::Any));
        assert!(opts.mode.is_none());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(
            JoinOptions::left().nonmatches,
            PerSide::new(NonMatch::Keep, NonMatch::Drop)
        );
        assert_eq!(
            JoinOptions::right().nonmatches,
            PerSide::new(NonMatch::Drop, NonMatch::Keep)
        );
        assert_eq!(
            JoinOptions::outer().nonmatches,
            PerSide::both(NonMatch::Keep)
        );
    }

    #[test]
    fn test_multi_vs_keep_rejected() {
        let opts = JoinOptions::right().with_multi(Multi::First);
        assert!(opts.validate().is_err());

        let opts = JoinOptions::left().with_multi_right(Multi::Last);
        assert!(opts.validate().is_err());

        // Reducing matches while dropping the opposite side is fine
        let opts = JoinOptions::inner().with_multi(Multi::First);
        assert!(opts.validate().is_ok());

        // Keeping the side whose own matches are reduced is fine too
        let opts = JoinOptions::left().with_multi(Multi::Closest);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_multi_both_sides_rejected() {
        let opts = JoinOptions::inner()
            .with_multi(Multi::First)
            .with_multi_right(Multi::First);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_cardinality_admits() {
        assert!(Cardinality::Any.admits(0));
        assert!(!Cardinality::AtLeastOne.admits(0));
        assert!(Cardinality::AtLeastOne.admits(3));
        assert!(Cardinality::Exactly(2).admits(2));
        assert!(!Cardinality::Exactly(2).admits(1));
        assert!(Cardinality::Between(1, 3).admits(1));
        assert!(Cardinality::Between(1, 3).admits(3));
        assert!(!Cardinality::Between(1, 3).admits(4));
    }

    #[test]
    fn test_cardinality_display() {
        assert_eq!(Cardinality::Any.to_string(), "*");
        assert_eq!(Cardinality::AtLeastOne.to_string(), "+");
        assert_eq!(Cardinality::Exactly(2).to_string(), "=2");
        assert_eq!(Cardinality::Between(1, 3).to_string(), "1..3");
    }

    #[test]
    fn test_side_swapped() {
        let opts = JoinOptions::left()
            .with_multi(Multi::First)
            .with_groupby(GroupBy::Left)
            .with_cardinality(Cardinality::AtLeastOne);
        let sw = opts.side_swapped();
        assert_eq!(sw.nonmatches, PerSide::new(NonMatch::Drop, NonMatch::Keep));
        assert_eq!(sw.multi, PerSide::new(Multi::All, Multi::First));
        assert_eq!(sw.groupby, GroupBy::Right);
        assert_eq!(
            sw.cardinality,
            PerSide::new(Cardinality::Any, Cardinality::AtLeastOne)
        );
    }
}
