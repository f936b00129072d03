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

//! Hash executor for key-equality conditions.
//!
//! The full-multiplicity path stores groups in inverse-CSR layout: right
//! indices sharing a key occupy `rperm[starts[g] .. starts[g + 1])`, with a
//! dictionary from key to group id. Group lookup is O(1) and yields a
//! contiguous view; `rperm` is filled in input order, so every group lists
//! its indices ascending.
//!
//! When the caller only wants the first or last match per element and no
//! post-filter can reject candidates, a single-slot map replaces the CSR
//! (first insert wins, or every insert overwrites).
//!
//! One pass over the right side to build, O(1) amortized per probe, no
//! allocation during probing.

use rustc_hash::FxHashMap;

use crate::condition::{Accessor, Condition};
use crate::core::Datum;

use super::{Candidates, Probe};

/// Inverse-CSR group index: key → contiguous run of right indices.
struct GroupIndex {
    ids: FxHashMap<Datum, usize>,
    starts: Vec<usize>,
    rperm: Vec<usize>,
}

impl GroupIndex {
    fn build<R>(right: &[R], key: &Accessor<R>) -> Self {
        let mut ids: FxHashMap<Datum, usize> = FxHashMap::default();
        let mut gid_of = Vec::with_capacity(right.len());
        let mut counts: Vec<usize> = Vec::new();

        for r in right {
            let next = counts.len();
            let gid = *ids.entry(key.get(r)).or_insert(next);
            if gid == counts.len() {
                counts.push(0);
            }
            counts[gid] += 1;
            gid_of.push(gid);
        }

        let mut starts = Vec::with_capacity(counts.len() + 1);
        starts.push(0);
        for &c in &counts {
            starts.push(starts.last().unwrap() + c);
        }

        let mut cursor: Vec<usize> = starts[..counts.len()].to_vec();
        let mut rperm = vec![0usize; right.len()];
        for (ri, &gid) in gid_of.iter().enumerate() {
            rperm[cursor[gid]] = ri;
            cursor[gid] += 1;
        }

        Self { ids, starts, rperm }
    }

    fn group(&self, key: &Datum) -> &[usize] {
        match self.ids.get(key) {
            Some(&gid) => &self.rperm[self.starts[gid]..self.starts[gid + 1]],
            None => &[],
        }
    }
}

enum HashIndex {
    Groups(GroupIndex),
    /// key → single right index (first occurrence kept, or last overwrote)
    Single(FxHashMap<Datum, usize>),
}

pub(crate) struct HashProbe<'a, L> {
    left: &'a [L],
    left_key: Accessor<L>,
    index: HashIndex,
}

impl<'a, L> HashProbe<'a, L> {
    fn keys<R>(anchor: &Condition<L, R>) -> (Accessor<L>, &Accessor<R>) {
        match anchor {
            Condition::Key { left, right } => (left.clone(), right),
            other => unreachable!("planner selected Hash for {:?}", other),
        }
    }

    /// Full-multiplicity index (inverse CSR).
    pub(crate) fn grouped<R>(left: &'a [L], right: &[R], anchor: &Condition<L, R>) -> Self {
        let (left_key, right_key) = Self::keys(anchor);
        Self {
            left,
            left_key,
            index: HashIndex::Groups(GroupIndex::build(right, right_key)),
        }
    }

    /// Single-slot index: keep the first occurrence per key, or the last
    /// when `last` is set.
    pub(crate) fn single<R>(
        left: &'a [L],
        right: &[R],
        anchor: &Condition<L, R>,
        last: bool,
    ) -> Self {
        let (left_key, right_key) = Self::keys(anchor);
        let mut map: FxHashMap<Datum, usize> = FxHashMap::default();
        for (ri, r) in right.iter().enumerate() {
            let key = right_key.get(r);
            if last {
                map.insert(key, ri);
            } else {
                map.entry(key).or_insert(ri);
            }
        }
        Self {
            left,
            left_key,
            index: HashIndex::Single(map),
        }
    }
}

impl<L> Probe for HashProbe<'_, L> {
    fn candidates(&self, li: usize) -> Candidates<'_> {
        let key = self.left_key.get(&self.left[li]);
        match &self.index {
            HashIndex::Groups(groups) => {
                let run = groups.group(&key);
                if run.is_empty() {
                    Candidates::Empty
                } else {
                    Candidates::Slice(run)
                }
            }
            HashIndex::Single(map) => match map.get(&key) {
                Some(&ri) => Candidates::One(ri),
                None => Candidates::Empty,
            },
        }
    }
}
