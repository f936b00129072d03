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

//! Join results: owned index structures and zero-copy record views.
//!
//! [`IndexJoin`] owns only indices and is independent of the inputs.
//! [`JoinResult`] additionally borrows both sides and resolves indices into
//! record references without copying; [`JoinResult::materialize`] is the
//! one operation that clones records into owned containers. Absent
//! counterparts (kept non-matches) surface as `None`.

use crate::core::Side;

/// A flat match pair: left index, right index. `None` marks a kept
/// non-match on that side.
pub type IndexPair = (Option<usize>, Option<usize>);

/// One group of a grouped result: the key indexes the grouped side, the
/// members index the other side.
///
/// A `None` key carries the unmatched elements of the non-grouped side
/// (present only when that side keeps non-matches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: Option<usize>,
    pub members: Vec<usize>,
}

/// The index structure of a join result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// One entry per match pair, ascending by left index; kept right
    /// non-matches trail, ascending by right index.
    Flat(Vec<IndexPair>),
    /// One group per element of the grouped side, ascending by its index.
    Grouped { by: Side, groups: Vec<Group> },
}

/// A join result holding only indices. Fully owned; no borrow of the
/// inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexJoin {
    pub(crate) shape: Shape,
}

impl IndexJoin {
    /// The underlying index structure.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Flat pairs, when the result is flat.
    pub fn flat(&self) -> Option<&[IndexPair]> {
        match &self.shape {
            Shape::Flat(pairs) => Some(pairs),
            Shape::Grouped { .. } => None,
        }
    }

    /// Groups, when the result is grouped.
    pub fn groups(&self) -> Option<&[Group]> {
        match &self.shape {
            Shape::Flat(_) => None,
            Shape::Grouped { groups, .. } => Some(groups),
        }
    }

    /// The side the result is grouped by, if any.
    pub fn grouped_by(&self) -> Option<Side> {
        match &self.shape {
            Shape::Flat(_) => None,
            Shape::Grouped { by, .. } => Some(*by),
        }
    }

    /// Number of output rows (pairs or groups).
    pub fn len(&self) -> usize {
        match &self.shape {
            Shape::Flat(pairs) => pairs.len(),
            Shape::Grouped { groups, .. } => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A join result as lightweight views into the two input sides.
///
/// Valid as long as the borrowed inputs are; the engine never copies
/// records. Use [`materialize`](JoinResult::materialize) for an owned copy.
#[derive(Debug)]
pub struct JoinResult<'a, L, R> {
    left: &'a [L],
    right: &'a [R],
    index: IndexJoin,
}

impl<'a, L, R> JoinResult<'a, L, R> {
    pub(crate) fn new(left: &'a [L], right: &'a [R], index: IndexJoin) -> Self {
        Self { left, right, index }
    }

    /// The index structure behind the views.
    pub fn indices(&self) -> &IndexJoin {
        &self.index
    }

    /// Discard the views, keeping the owned indices.
    pub fn into_indices(self) -> IndexJoin {
        self.index
    }

    /// Number of output rows (pairs or groups).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Record view of a flat result. Empty for grouped results.
    pub fn pairs(&self) -> impl Iterator<Item = (Option<&'a L>, Option<&'a R>)> + '_ {
        let left = self.left;
        let right = self.right;
        self.index
            .flat()
            .into_iter()
            .flatten()
            .map(move |&(l, r)| (l.map(|i| &left[i]), r.map(|i| &right[i])))
    }

    /// Record view of a grouped result. Empty for flat results.
    pub fn groups(&self) -> impl Iterator<Item = GroupView<'a, '_, L, R>> {
        let by = self.index.grouped_by().unwrap_or(Side::Left);
        let left = self.left;
        let right = self.right;
        self.index
            .groups()
            .into_iter()
            .flatten()
            .map(move |group| GroupView {
                by,
                left,
                right,
                group,
            })
    }

    /// Deep-copy the viewed records into owned containers. No other
    /// semantic change.
    pub fn materialize(&self) -> Materialized<L, R>
    where
        L: Clone,
        R: Clone,
    {
        match &self.index.shape {
            Shape::Flat(pairs) => Materialized::Flat(
                pairs
                    .iter()
                    .map(|&(l, r)| {
                        (
                            l.map(|i| self.left[i].clone()),
                            r.map(|i| self.right[i].clone()),
                        )
                    })
                    .collect(),
            ),
            Shape::Grouped {
                by: Side::Left,
                groups,
            } => Materialized::GroupedLeft(
                groups
                    .iter()
                    .map(|g| {
                        (
                            g.key.map(|i| self.left[i].clone()),
                            g.members.iter().map(|&i| self.right[i].clone()).collect(),
                        )
                    })
                    .collect(),
            ),
            Shape::Grouped {
                by: Side::Right,
                groups,
            } => Materialized::GroupedRight(
                groups
                    .iter()
                    .map(|g| {
                        (
                            g.key.map(|i| self.right[i].clone()),
                            g.members.iter().map(|&i| self.left[i].clone()).collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }
}

/// Zero-copy view of one group of a grouped result.
pub struct GroupView<'a, 's, L, R> {
    by: Side,
    left: &'a [L],
    right: &'a [R],
    group: &'s Group,
}

impl<'a, L, R> GroupView<'a, '_, L, R> {
    /// The side this group is keyed by.
    pub fn by(&self) -> Side {
        self.by
    }

    /// Index of the group key on the grouped side. `None` for the trailing
    /// group of unmatched elements of the other side.
    pub fn key_index(&self) -> Option<usize> {
        self.group.key
    }

    /// Indices of the members on the non-grouped side.
    pub fn member_indices(&self) -> &[usize] {
        &self.group.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.group.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.members.is_empty()
    }

    /// The key record, for results grouped by the left side.
    pub fn key_left(&self) -> Option<&'a L> {
        match (self.by, self.group.key) {
            (Side::Left, Some(i)) => Some(&self.left[i]),
            _ => None,
        }
    }

    /// The key record, for results grouped by the right side.
    pub fn key_right(&self) -> Option<&'a R> {
        match (self.by, self.group.key) {
            (Side::Right, Some(i)) => Some(&self.right[i]),
            _ => None,
        }
    }

    /// Member records on the right side (grouped by left). Empty otherwise.
    pub fn members_right(&self) -> impl Iterator<Item = &'a R> + '_ {
        let right = self.right;
        let take = self.by == Side::Left;
        self.group
            .members
            .iter()
            .filter(move |_| take)
            .map(move |&i| &right[i])
    }

    /// Member records on the left side (grouped by right). Empty otherwise.
    pub fn members_left(&self) -> impl Iterator<Item = &'a L> + '_ {
        let left = self.left;
        let take = self.by == Side::Right;
        self.group
            .members
            .iter()
            .filter(move |_| take)
            .map(move |&i| &left[i])
    }
}

/// An owned copy of a join result, produced by
/// [`JoinResult::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized<L, R> {
    Flat(Vec<(Option<L>, Option<R>)>),
    GroupedLeft(Vec<(Option<L>, Vec<R>)>),
    GroupedRight(Vec<(Option<R>, Vec<L>)>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_result<'a>(
        left: &'a [i64],
        right: &'a [i64],
        pairs: Vec<IndexPair>,
    ) -> JoinResult<'a, i64, i64> {
        JoinResult::new(
            left,
            right,
            IndexJoin {
                shape: Shape::Flat(pairs),
            },
        )
    }

    #[test]
    fn test_pair_views_resolve_records() {
        let left = vec![10i64, 20];
        let right = vec![30i64];
        let result = flat_result(&left, &right, vec![(Some(1), Some(0)), (Some(0), None)]);

        let rows: Vec<_> = result.pairs().collect();
        assert_eq!(rows, vec![(Some(&20), Some(&30)), (Some(&10), None)]);
    }

    #[test]
    fn test_materialize_flat() {
        let left = vec![1i64];
        let right = vec![2i64];
        let result = flat_result(&left, &right, vec![(Some(0), Some(0)), (None, Some(0))]);
        match result.materialize() {
            Materialized::Flat(rows) => {
                assert_eq!(rows, vec![(Some(1), Some(2)), (None, Some(2))]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_group_views() {
        let left = vec![100i64, 200];
        let right = vec![7i64, 8, 9];
        let result = JoinResult::new(
            &left,
            &right,
            IndexJoin {
                shape: Shape::Grouped {
                    by: Side::Left,
                    groups: vec![
                        Group {
                            key: Some(0),
                            members: vec![0, 2],
                        },
                        Group {
                            key: Some(1),
                            members: vec![],
                        },
                    ],
                },
            },
        );

        let views: Vec<_> = result.groups().collect();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].key_left(), Some(&100));
        assert!(views[0].key_right().is_none());
        let members: Vec<_> = views[0].members_right().collect();
        assert_eq!(members, vec![&7, &9]);
        assert!(views[1].is_empty());

        match result.materialize() {
            Materialized::GroupedLeft(groups) => {
                assert_eq!(groups[0], (Some(100), vec![7, 9]));
                assert_eq!(groups[1], (Some(200), vec![]));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
