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

//! Sort-based executor.
//!
//! Prepares once: a permutation of the right side sorted ascending by key,
//! ties broken by original index, with the key column cached alongside.
//! Each probe then binary-searches the bounds of the matching run and hands
//! out a *slice* of the permutation: no per-probe allocation, O(log |R|)
//! per lookup.
//!
//! `SortChain` is the same probe with the sort skipped: the caller asserts
//! the right side is already ascending by its key. The assertion is checked
//! only in debug builds.

use crate::condition::{Accessor, Condition, PredOp};
use crate::core::Datum;

use super::{Candidates, Probe};

pub(crate) struct SortProbe<'a, L> {
    left: &'a [L],
    left_key: Accessor<L>,
    op: PredOp,
    /// Right indices, ascending by `(key, index)`.
    perm: Vec<usize>,
    /// Keys aligned with `perm`.
    keys: Vec<Datum>,
}

impl<'a, L> SortProbe<'a, L> {
    /// Build the sorted permutation (or adopt the existing order when
    /// `chain` asserts the right side is pre-sorted).
    pub(crate) fn new<R>(
        left: &'a [L],
        right: &'a [R],
        anchor: &Condition<L, R>,
        chain: bool,
    ) -> Self {
        let (left_key, op, right_key) = match anchor {
            Condition::Key { left, right } => (left.clone(), PredOp::Eq, right),
            Condition::Pred { left, op, right } => (left.clone(), *op, right),
            other => unreachable!("planner selected Sort for {:?}", other),
        };

        let mut keyed: Vec<(Datum, usize)> = right
            .iter()
            .enumerate()
            .map(|(i, r)| (right_key.get(r), i))
            .collect();
        if !chain {
            // (key, index) pairs: unstable sort is stable on the key
            keyed.sort_unstable();
        } else {
            debug_assert!(
                keyed.windows(2).all(|w| w[0].0 <= w[1].0),
                "SortChain asserts a right side pre-sorted by its key"
            );
        }

        let mut perm = Vec::with_capacity(keyed.len());
        let mut keys = Vec::with_capacity(keyed.len());
        for (key, idx) in keyed {
            keys.push(key);
            perm.push(idx);
        }

        Self {
            left,
            left_key,
            op,
            perm,
            keys,
        }
    }

    fn slice(&self, lo: usize, hi: usize) -> Candidates<'_> {
        if lo >= hi {
            Candidates::Empty
        } else {
            Candidates::Slice(&self.perm[lo..hi])
        }
    }
}

impl<L> Probe for SortProbe<'_, L> {
    fn candidates(&self, li: usize) -> Candidates<'_> {
        let k = self.left_key.get(&self.left[li]);
        let n = self.keys.len();
        match self.op {
            // Matching run: keys equal to k
            PredOp::Eq => {
                let lo = self.keys.partition_point(|x| x < &k);
                let hi = self.keys.partition_point(|x| x <= &k);
                self.slice(lo, hi)
            }
            // All right keys strictly greater than k
            PredOp::Lt => {
                let lo = self.keys.partition_point(|x| x <= &k);
                self.slice(lo, n)
            }
            // All right keys greater than or equal to k
            PredOp::Le => {
                let lo = self.keys.partition_point(|x| x < &k);
                self.slice(lo, n)
            }
            // All right keys strictly less than k
            PredOp::Gt => {
                let hi = self.keys.partition_point(|x| x < &k);
                self.slice(0, hi)
            }
            // All right keys less than or equal to k
            PredOp::Ge => {
                let hi = self.keys.partition_point(|x| x <= &k);
                self.slice(0, hi)
            }
            // Right keys inside the left interval, honoring closedness
            PredOp::Contains => {
                let Some(iv) = k.as_interval() else {
                    return Candidates::Empty;
                };
                let lo = if iv.lo_closed() {
                    self.keys.partition_point(|x| x < iv.lo())
                } else {
                    self.keys.partition_point(|x| x <= iv.lo())
                };
                let hi = if iv.hi_closed() {
                    self.keys.partition_point(|x| x <= iv.hi())
                } else {
                    self.keys.partition_point(|x| x < iv.hi())
                };
                self.slice(lo, hi)
            }
            other => unreachable!("planner selected Sort for operator {}", other),
        }
    }
}
