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

//! Result assembly: the left-side sweep that turns executor candidates into
//! the final match set.
//!
//! One pass over the left side in index order: fetch candidates from the
//! prepared executor, apply the composite post-filter, reduce by the
//! multiplicity policy, emit. Unmatched-right bookkeeping and cardinality
//! checks run over the emitted pairs afterwards.
//!
//! A right-side multiplicity policy executes with the sides exchanged and
//! the pairs flipped back and re-sorted, so a single left-driven sweep
//! serves both directions.
//!
//! The sweep is embarrassingly parallel over left indices; above a size
//! threshold it fans out through rayon and collects in index order.

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::condition::{Accessor, Condition, Metric, PredOp};
use crate::core::{Datum, Error, Result, Side};
use crate::executor;
use crate::mode::{self, Mode};
use crate::options::{Cardinality, JoinOptions, Multi, NonMatch, PerSide};
use crate::result::Group;

/// One emitted match: left index, right index. `None` marks a kept
/// non-match on the absent side.
pub(crate) type Pair = (Option<usize>, Option<usize>);

/// Left-side size at which the probe sweep fans out through rayon.
pub(crate) const PARALLEL_PROBE_THRESHOLD: usize = 4096;

/// Run the left-driven sweep and return flat pairs in output order:
/// matched and kept-left pairs ascending by left index, then kept-right
/// non-matches ascending by right index.
pub(crate) fn execute_flat<L, R>(
    left: &[L],
    right: &[R],
    condition: &Condition<L, R>,
    options: &JoinOptions,
) -> Result<Vec<Pair>>
where
    L: Sync,
    R: Sync,
{
    // A right-side reduction runs right-driven: exchange sides, sweep,
    // flip back. Validation guarantees the left side is not also reduced.
    if options.multi.right != Multi::All {
        let swapped_cond = condition.clone().swapped();
        let swapped_opts = options.side_swapped();
        let pairs = execute_flat(right, left, &swapped_cond, &swapped_opts)?;
        return Ok(unswap_pairs(pairs));
    }

    let plan = mode::plan(condition, options.mode)?;
    let atoms = condition.atoms();

    // The nested loop evaluates the whole condition; indexed modes probe
    // the anchor child and post-filter with the remaining children.
    let (probe_cond, filters): (&Condition<L, R>, Vec<&Condition<L, R>>) = match plan.mode {
        Mode::NestedLoop => (condition, Vec::new()),
        _ => (
            &atoms[plan.anchor],
            atoms
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != plan.anchor)
                .map(|(_, c)| c)
                .collect(),
        ),
    };

    // Closest ranks against the anchor automatic selection would pick, so
    // the chosen pair does not depend on the executed mode.
    let closeness = if options.multi.left == Multi::Closest {
        match atoms.get(mode::auto_anchor(condition)) {
            Some(anchor) => Some(closeness_for(anchor)?),
            // Empty conjunction: every pair matches equally
            None => Some(Closeness::First),
        }
    } else {
        None
    };

    let probe = executor::prepare(
        plan.mode,
        probe_cond,
        left,
        right,
        options.multi.left,
        !filters.is_empty(),
    );

    let reduce = |li: usize| -> Result<SmallVec<[usize; 8]>> {
        let l = &left[li];
        let found = probe.candidates(li);
        if found.is_empty() {
            return Ok(SmallVec::new());
        }
        let mut cands: SmallVec<[usize; 8]> = SmallVec::new();
        for ri in found.iter() {
            if filters.iter().all(|f| f.is_match(l, &right[ri], li, ri)) {
                cands.push(ri);
            }
        }
        match options.multi.left {
            Multi::All => Ok(cands),
            Multi::First => Ok(cands.iter().copied().min().into_iter().collect()),
            Multi::Last => Ok(cands.iter().copied().max().into_iter().collect()),
            Multi::Closest => {
                let closeness = closeness.as_ref().expect("built for Closest above");
                Ok(reduce_closest(closeness, l, &cands, right)?
                    .into_iter()
                    .collect())
            }
        }
    };

    let reduced: Vec<SmallVec<[usize; 8]>> = if left.len() >= PARALLEL_PROBE_THRESHOLD {
        (0..left.len())
            .into_par_iter()
            .map(|li| reduce(li))
            .collect::<Result<Vec<_>>>()?
    } else {
        (0..left.len())
            .map(|li| reduce(li))
            .collect::<Result<Vec<_>>>()?
    };

    let keep_left = options.nonmatches.left == NonMatch::Keep;
    let mut out: Vec<Pair> = Vec::new();
    for (li, cands) in reduced.iter().enumerate() {
        if cands.is_empty() {
            if keep_left {
                out.push((Some(li), None));
            }
        } else {
            for &ri in cands {
                out.push((Some(li), Some(ri)));
            }
        }
    }

    // Kept right non-matches trail the matched pairs, ascending
    if options.nonmatches.right == NonMatch::Keep {
        let mut matched = vec![false; right.len()];
        for (_, r) in &out {
            if let Some(ri) = r {
                matched[*ri] = true;
            }
        }
        for (ri, hit) in matched.iter().enumerate() {
            if !hit {
                out.push((None, Some(ri)));
            }
        }
    }

    Ok(out)
}

/// Flip pairs produced by a side-exchanged sweep back into caller order.
fn unswap_pairs(pairs: Vec<Pair>) -> Vec<Pair> {
    let mut out: Vec<Pair> = pairs.into_iter().map(|(a, b)| (b, a)).collect();
    out.sort_unstable_by_key(|&(l, r)| match l {
        Some(li) => (0usize, li, r.unwrap_or(usize::MAX)),
        None => (1, r.unwrap_or(0), 0),
    });
    out
}

/// Collapse flat pairs (ascending by left index) into groups keyed by the
/// left index. A kept left non-match becomes an empty group; kept right
/// non-matches collect into one trailing key-less group.
pub(crate) fn group_pairs(pairs: Vec<Pair>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut tail: Vec<usize> = Vec::new();
    for (l, r) in pairs {
        match l {
            Some(li) => {
                if groups.last().map_or(true, |g| g.key != Some(li)) {
                    groups.push(Group {
                        key: Some(li),
                        members: Vec::new(),
                    });
                }
                if let Some(ri) = r {
                    groups.last_mut().unwrap().members.push(ri);
                }
            }
            None => {
                if let Some(ri) = r {
                    tail.push(ri);
                }
            }
        }
    }
    if !tail.is_empty() {
        groups.push(Group {
            key: None,
            members: tail,
        });
    }
    groups
}

/// Enforce per-side cardinality assertions over the emitted pairs.
///
/// Counts cover *every* element of a side, matched or not, so `+` asserts
/// a lossless join even when non-matches are dropped from the output.
/// `frame_swapped` maps side names back to the caller's orientation when
/// the pairs were produced in an exchanged frame.
pub(crate) fn check_cardinality(
    pairs: &[Pair],
    left_len: usize,
    right_len: usize,
    cardinality: &PerSide<Cardinality>,
    frame_swapped: bool,
) -> Result<()> {
    let report = |side: Side| {
        if frame_swapped {
            side.opposite()
        } else {
            side
        }
    };

    if cardinality.left.is_checked() {
        let mut counts = vec![0usize; left_len];
        for (l, r) in pairs {
            if let (Some(li), Some(_)) = (l, r) {
                counts[*li] += 1;
            }
        }
        for (index, &observed) in counts.iter().enumerate() {
            if !cardinality.left.admits(observed) {
                return Err(Error::Cardinality {
                    side: report(Side::Left),
                    index,
                    observed,
                    expected: cardinality.left,
                });
            }
        }
    }

    if cardinality.right.is_checked() {
        let mut counts = vec![0usize; right_len];
        for (l, r) in pairs {
            if let (Some(_), Some(ri)) = (l, r) {
                counts[*ri] += 1;
            }
        }
        for (index, &observed) in counts.iter().enumerate() {
            if !cardinality.right.admits(observed) {
                return Err(Error::Cardinality {
                    side: report(Side::Right),
                    index,
                    observed,
                    expected: cardinality.right,
                });
            }
        }
    }

    Ok(())
}

// ============================================================================
// Closest reduction
// ============================================================================

/// How to rank candidates for `multi = closest`, derived from the anchor
/// condition. Key equality has no distance notion, so every match ranks
/// the same and the reduction degenerates to `first`.
enum Closeness<'c, L, R> {
    First,
    /// Minimal right key wins (`<`, `<=`)
    MinKey(&'c Accessor<R>),
    /// Maximal right key wins (`>`, `>=`)
    MaxKey(&'c Accessor<R>),
    /// Nearest to the left interval's midpoint (`contains`)
    MidLeft {
        left: &'c Accessor<L>,
        right: &'c Accessor<R>,
    },
    /// Left point nearest to the right interval's midpoint (`within`)
    MidRight {
        left: &'c Accessor<L>,
        right: &'c Accessor<R>,
    },
    /// Minimal metric distance (distance conditions)
    ByMetric {
        left: &'c Accessor<L>,
        right: &'c Accessor<R>,
        metric: &'c Metric,
    },
}

fn closeness_for<L, R>(anchor: &Condition<L, R>) -> Result<Closeness<'_, L, R>> {
    let unsupported =
        || Error::config(format!("`closest` is not defined for {}", anchor.describe()));
    match anchor {
        Condition::Key { .. } => Ok(Closeness::First),
        Condition::Pred { left, op, right } => match op {
            PredOp::Eq => Ok(Closeness::First),
            PredOp::Lt | PredOp::Le => Ok(Closeness::MinKey(right)),
            PredOp::Gt | PredOp::Ge => Ok(Closeness::MaxKey(right)),
            PredOp::Contains => Ok(Closeness::MidLeft { left, right }),
            PredOp::Within => Ok(Closeness::MidRight { left, right }),
            _ => Err(unsupported()),
        },
        Condition::Distance {
            left,
            right,
            metric,
            ..
        } => Ok(Closeness::ByMetric {
            left,
            right,
            metric,
        }),
        Condition::NotSame | Condition::All(_) => Err(unsupported()),
    }
}

/// Pick the closest candidate. All ties break toward the smallest right
/// index.
fn reduce_closest<L, R>(
    closeness: &Closeness<'_, L, R>,
    l: &L,
    cands: &[usize],
    right: &[R],
) -> Result<Option<usize>> {
    if cands.is_empty() {
        return Ok(None);
    }
    match closeness {
        Closeness::First => Ok(cands.iter().copied().min()),
        Closeness::MinKey(acc) => {
            let mut best: Option<(Datum, usize)> = None;
            for &ri in cands {
                let key = acc.get(&right[ri]);
                let better = match &best {
                    None => true,
                    Some((bk, bi)) => key < *bk || (key == *bk && ri < *bi),
                };
                if better {
                    best = Some((key, ri));
                }
            }
            Ok(best.map(|(_, ri)| ri))
        }
        Closeness::MaxKey(acc) => {
            let mut best: Option<(Datum, usize)> = None;
            for &ri in cands {
                let key = acc.get(&right[ri]);
                let better = match &best {
                    None => true,
                    Some((bk, bi)) => key > *bk || (key == *bk && ri < *bi),
                };
                if better {
                    best = Some((key, ri));
                }
            }
            Ok(best.map(|(_, ri)| ri))
        }
        Closeness::MidLeft { left, right: racc } => {
            let lv = left.get(l);
            let mid = lv
                .as_interval()
                .and_then(|iv| iv.midpoint())
                .ok_or_else(|| {
                    Error::config(
                        "`closest` inside an interval requires numeric interval endpoints",
                    )
                })?;
            Ok(nearest_to(mid, cands, |ri| racc.get(&right[ri]).as_f64()))
        }
        Closeness::MidRight { left, right: racc } => {
            let x = left.get(l).as_f64().ok_or_else(|| {
                Error::config("`closest` within an interval requires a numeric left key")
            })?;
            Ok(nearest_to(x, cands, |ri| {
                racc.get(&right[ri])
                    .as_interval()
                    .and_then(|iv| iv.midpoint())
            }))
        }
        Closeness::ByMetric {
            left,
            right: racc,
            metric,
        } => {
            let q = left.get(l);
            let mut best: Option<(f64, usize)> = None;
            for &ri in cands {
                let d = metric.eval(&q, &racc.get(&right[ri]));
                let better = match &best {
                    None => true,
                    Some((bd, bi)) => {
                        d.total_cmp(bd).is_lt() || (d.total_cmp(bd).is_eq() && ri < *bi)
                    }
                };
                if better {
                    best = Some((d, ri));
                }
            }
            Ok(best.map(|(_, ri)| ri))
        }
    }
}

/// Minimal `|value - target|` with ties toward the smaller index.
/// Candidates without a numeric value rank last.
fn nearest_to(
    target: f64,
    cands: &[usize],
    value: impl Fn(usize) -> Option<f64>,
) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for &ri in cands {
        let d = value(ri)
            .map(|v| (v - target).abs())
            .unwrap_or(f64::INFINITY);
        let better = match &best {
            None => true,
            Some((bd, bi)) => d < *bd || (d == *bd && ri < *bi),
        };
        if better {
            best = Some((d, ri));
        }
    }
    best.map(|(_, ri)| ri)
}
