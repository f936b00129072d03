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

//! Execution backends behind one seam: prepare a per-side index once, then
//! answer "which right indices are candidates for this left element".
//!
//! Candidate sets are *views* wherever the backing structure allows it: the
//! sort executor hands out slices of its permutation, the hash executor
//! slices of its inverse-CSR array. Only the scanning executors (nested
//! loop, metric tree) materialize per-probe buffers, and those stay on the
//! stack for small results via `SmallVec`.
//!
//! Every prepared structure lives for a single join call.

pub mod hash;
pub mod metric_tree;
pub mod nested_loop;
pub mod sort;

use smallvec::SmallVec;

use crate::condition::Condition;
use crate::mode::Mode;
use crate::options::Multi;

/// Candidate right indices for one left element.
pub(crate) enum Candidates<'p> {
    /// No candidates.
    Empty,
    /// Exactly one candidate (single-slot hash path).
    One(usize),
    /// A contiguous view into the executor's index (sorted permutation or
    /// inverse-CSR group).
    Slice(&'p [usize]),
    /// A per-probe buffer (nested loop, metric tree).
    Owned(SmallVec<[usize; 8]>),
}

impl Candidates<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Candidates::Empty => true,
            Candidates::One(_) => false,
            Candidates::Slice(s) => s.is_empty(),
            Candidates::Owned(v) => v.is_empty(),
        }
    }

    pub(crate) fn iter(&self) -> CandidateIter<'_> {
        match self {
            Candidates::Empty => CandidateIter::One(None),
            Candidates::One(i) => CandidateIter::One(Some(*i)),
            Candidates::Slice(s) => CandidateIter::Slice(s.iter()),
            Candidates::Owned(v) => CandidateIter::Slice(v.iter()),
        }
    }
}

/// Iterator over a candidate set.
pub(crate) enum CandidateIter<'a> {
    One(Option<usize>),
    Slice(std::slice::Iter<'a, usize>),
}

impl Iterator for CandidateIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self {
            CandidateIter::One(slot) => slot.take(),
            CandidateIter::Slice(it) => it.next().copied(),
        }
    }
}

/// A prepared per-side index answering candidate queries for left elements.
pub(crate) trait Probe {
    fn candidates(&self, li: usize) -> Candidates<'_>;
}

/// Build the probe structure for a planned mode.
///
/// `anchor` is the condition the index is built over: the whole condition
/// for the nested loop, the anchor child for indexed modes. The planner
/// guarantees the anchor shape matches the mode.
pub(crate) fn prepare<'a, L, R>(
    mode: Mode,
    anchor: &'a Condition<L, R>,
    left: &'a [L],
    right: &'a [R],
    multi_left: Multi,
    post_filtered: bool,
) -> Box<dyn Probe + Sync + 'a>
where
    L: Sync,
    R: Sync,
{
    match mode {
        Mode::NestedLoop => Box::new(nested_loop::NestedLoopProbe::new(left, right, anchor)),
        Mode::Sort => Box::new(sort::SortProbe::new(left, right, anchor, false)),
        Mode::SortChain => Box::new(sort::SortProbe::new(left, right, anchor, true)),
        Mode::Hash => {
            // The single-slot map is only sound when the reduction sees the
            // genuine first/last match, i.e. no post-filter can reject it.
            let single = !post_filtered
                && matches!(multi_left, Multi::First | Multi::Last);
            if single {
                Box::new(hash::HashProbe::single(
                    left,
                    right,
                    anchor,
                    multi_left == Multi::Last,
                ))
            } else {
                Box::new(hash::HashProbe::grouped(left, right, anchor))
            }
        }
        Mode::Tree => Box::new(metric_tree::TreeProbe::new(left, right, anchor)),
    }
}
