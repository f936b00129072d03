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

//! Nested loop executor.
//!
//! Evaluates `is_match` on every pair. O(|L|·|R|), supports every condition,
//! and serves as the correctness oracle for the other executors in the
//! property-test suite. Never selected automatically when an indexed mode
//! applies; pin `Mode::NestedLoop` to force it.

use smallvec::SmallVec;

use super::{Candidates, Probe};
use crate::condition::Condition;

pub(crate) struct NestedLoopProbe<'a, L, R> {
    left: &'a [L],
    right: &'a [R],
    condition: &'a Condition<L, R>,
}

impl<'a, L, R> NestedLoopProbe<'a, L, R> {
    pub(crate) fn new(left: &'a [L], right: &'a [R], condition: &'a Condition<L, R>) -> Self {
        Self {
            left,
            right,
            condition,
        }
    }
}

impl<L, R> Probe for NestedLoopProbe<'_, L, R> {
    fn candidates(&self, li: usize) -> Candidates<'_> {
        let l = &self.left[li];
        let mut out: SmallVec<[usize; 8]> = SmallVec::new();
        for (ri, r) in self.right.iter().enumerate() {
            if self.condition.is_match(l, r, li, ri) {
                out.push(ri);
            }
        }
        if out.is_empty() {
            Candidates::Empty
        } else {
            Candidates::Owned(out)
        }
    }
}
