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

//! Execution modes, the capability table, and mode selection.
//!
//! Which modes can evaluate which conditions:
//!
//! | Condition | NestedLoop | Sort | SortChain | Hash | Tree |
//! |---|---|---|---|---|---|
//! | `Key` | yes | yes | yes | yes | no |
//! | `Pred` (`<`, `<=`, `=`, `>=`, `>`, `contains`) | yes | yes | no | no | no |
//! | `Pred` (set relations, `within`, `overlaps`) | yes | no | no | no | no |
//! | `Distance` | yes | no | no | no | yes |
//! | `NotSame` | yes | no | no | no | no |
//! | `All` | yes | anchor + filter | anchor + filter | anchor + filter | anchor + filter |
//!
//! Automatic selection prefers `Hash > Tree > Sort`; `SortChain` (which
//! asserts a pre-sorted input) and `NestedLoop` never beat an indexed mode.
//! When nothing indexed applies the nested loop is selected, so that
//! set-relation joins stay callable without pinning. A *pinned* mode the
//! condition does not support fails: the engine never silently falls back.

use std::fmt;

use crate::condition::Condition;
use crate::core::{Error, Result};

/// An algorithmic strategy for evaluating a join condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Scan every pair. O(|L|·|R|); the correctness reference.
    NestedLoop,
    /// Sort the right side once, binary-search per left element.
    Sort,
    /// Like `Sort`, but the caller asserts the right side is already
    /// sorted by its key; no permutation is materialized.
    SortChain,
    /// Build a key→indices map on the right side, probe per left element.
    Hash,
    /// Build a metric tree on right-side coordinates, radius-query per
    /// left element.
    Tree,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::NestedLoop => write!(f, "NestedLoop"),
            Mode::Sort => write!(f, "Sort"),
            Mode::SortChain => write!(f, "SortChain"),
            Mode::Hash => write!(f, "Hash"),
            Mode::Tree => write!(f, "Tree"),
        }
    }
}

/// Whether `mode` can evaluate `condition` (for a conjunction: anchor one
/// child in that mode and post-filter the rest).
pub fn supports<L, R>(condition: &Condition<L, R>, mode: Mode) -> bool {
    match condition {
        Condition::All(children) => match mode {
            Mode::NestedLoop => true,
            _ => children.iter().any(|c| atom_supports(c, mode)),
        },
        atom => atom_supports(atom, mode),
    }
}

fn atom_supports<L, R>(atom: &Condition<L, R>, mode: Mode) -> bool {
    match mode {
        Mode::NestedLoop => true,
        Mode::Sort => match atom {
            Condition::Key { .. } => true,
            Condition::Pred { op, .. } => op.sortable(),
            _ => false,
        },
        Mode::SortChain | Mode::Hash => matches!(atom, Condition::Key { .. }),
        Mode::Tree => matches!(atom, Condition::Distance { .. }),
    }
}

/// Indexability rank of an atom, for anchor selection: `Hash > Tree > Sort`.
fn atom_rank<L, R>(atom: &Condition<L, R>) -> u8 {
    if atom_supports(atom, Mode::Hash) {
        3
    } else if atom_supports(atom, Mode::Tree) {
        2
    } else if atom_supports(atom, Mode::Sort) {
        1
    } else {
        0
    }
}

/// The anchor automatic selection would pick: the earliest atom with the
/// highest indexability rank.
///
/// Also the fixed reference for `multi = closest` ranking, so the chosen
/// pair does not depend on the executed mode.
pub(crate) fn auto_anchor<L, R>(condition: &Condition<L, R>) -> usize {
    let mut best = 0;
    let mut best_rank = 0;
    for (i, atom) in condition.atoms().iter().enumerate() {
        let rank = atom_rank(atom);
        if rank > best_rank {
            best = i;
            best_rank = rank;
        }
    }
    best
}

/// The execution plan for one join call: a mode plus the anchor child that
/// the mode's index is built over (the remaining children post-filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Plan {
    pub mode: Mode,
    pub anchor: usize,
}

/// Pick the plan for a condition, honoring a pinned mode.
pub(crate) fn plan<L, R>(condition: &Condition<L, R>, pinned: Option<Mode>) -> Result<Plan> {
    match pinned {
        Some(mode) => {
            if !supports(condition, mode) {
                return Err(Error::UnsupportedMode {
                    mode,
                    condition: condition.describe(),
                });
            }
            let anchor = match mode {
                Mode::NestedLoop => auto_anchor(condition),
                _ => condition
                    .atoms()
                    .iter()
                    .position(|c| atom_supports(c, mode))
                    .expect("supports() verified an anchor exists"),
            };
            Ok(Plan { mode, anchor })
        }
        None => {
            let atoms = condition.atoms();
            // An empty conjunction matches every pair; only the scan
            // evaluates it.
            if atoms.is_empty() {
                return Ok(Plan {
                    mode: Mode::NestedLoop,
                    anchor: 0,
                });
            }
            let anchor = auto_anchor(condition);
            let mode = match atom_rank(&atoms[anchor]) {
                3 => Mode::Hash,
                2 => Mode::Tree,
                1 => Mode::Sort,
                _ => Mode::NestedLoop,
            };
            Ok(Plan { mode, anchor })
        }
    }
}
