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

//! # Joinkit - generalized joins for in-memory collections
//!
//! Joinkit pairs elements of two slices according to a declarative join
//! condition, producing flat or grouped results as cheap views into the
//! inputs. One engine covers:
//!
//! - **Equi-joins** - [`by_key`] / [`by_keys`], hash-executed
//! - **Range and asof joins** - [`by_pred`] with `<`, `<=`, `>=`, `>`,
//!   sort-executed, with `closest` multiplicity for asof semantics
//! - **Interval joins** - interval-contains-point and interval set
//!   relations over [`Interval`]
//! - **Nearest-neighbor joins** - [`by_distance`] with a black-box metric,
//!   executed through a vantage-point tree
//! - **Conjunctions** - combine conditions with `&`; the best-indexed child
//!   anchors the search and the rest post-filter
//!
//! Result shaping is orthogonal: keep or drop non-matches per side
//! (inner/left/right/outer), reduce multiple matches (`first`, `last`,
//! `closest`), group by either side, and assert per-element cardinality
//! bounds.
//!
//! ## Quick Start
//!
//! ```rust
//! use joinkit::{by_keys, JoinOptions};
//!
//! let users = [("alice", 1i64), ("bob", 2)];
//! let orders = [(1i64, "book"), (1, "pen"), (3, "ink")];
//!
//! let result = joinkit::join_indices(
//!     &users,
//!     &orders,
//!     by_keys(|u: &(&str, i64)| u.1, |o: &(i64, &str)| o.0),
//!     JoinOptions::inner(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     result.flat().unwrap(),
//!     &[(Some(0), Some(0)), (Some(0), Some(1))]
//! );
//! ```
//!
//! ## Modules
//!
//! - [`core`] - runtime values ([`Datum`], [`Interval`]), sides, errors
//! - [`condition`] - the condition model and its constructors
//! - [`options`] - result-shape configuration ([`JoinOptions`])
//! - [`mode`] - execution modes and the capability table
//! - [`result`] - index results, record views, materialization

#![forbid(unsafe_code)]

mod assemble;
pub mod condition;
pub mod core;
mod executor;
pub mod mode;
pub mod options;
pub mod result;

pub use crate::core::{Datum, Error, Interval, Result, Side};
pub use condition::{
    by_distance, by_distance_lr, by_key, by_keys, by_pred, not_same, Accessor, Condition,
    IntoAccessor, Metric, PredOp, Radius, Record,
};
pub use mode::{supports, Mode};
pub use options::{Cardinality, GroupBy, JoinOptions, Multi, NonMatch, PerSide};
pub use result::{Group, GroupView, IndexJoin, IndexPair, JoinResult, Materialized, Shape};

/// Join two sides, returning record views into both.
///
/// The result borrows `left` and `right` for its lifetime; use
/// [`JoinResult::materialize`] for an owned copy, or [`join_indices`] when
/// only indices are needed.
///
/// # Errors
///
/// [`Error::Config`] / [`Error::UnsupportedMode`] for contradictory options
/// or a pinned mode the condition does not support, raised before any data
/// is scanned; [`Error::Cardinality`] when an asserted bound fails after
/// assembly.
pub fn join<'a, L, R>(
    left: &'a [L],
    right: &'a [R],
    condition: Condition<L, R>,
    options: JoinOptions,
) -> Result<JoinResult<'a, L, R>>
where
    L: Sync,
    R: Sync,
{
    let index = join_indices(left, right, condition, options)?;
    Ok(JoinResult::new(left, right, index))
}

/// Join two sides, returning only the matched index structure.
pub fn join_indices<L, R>(
    left: &[L],
    right: &[R],
    condition: Condition<L, R>,
    options: JoinOptions,
) -> Result<IndexJoin>
where
    L: Sync,
    R: Sync,
{
    options.validate()?;

    let shape = match options.groupby {
        GroupBy::None => {
            let pairs = assemble::execute_flat(left, right, &condition, &options)?;
            assemble::check_cardinality(
                &pairs,
                left.len(),
                right.len(),
                &options.cardinality,
                false,
            )?;
            Shape::Flat(pairs)
        }
        GroupBy::Left => {
            let pairs = assemble::execute_flat(left, right, &condition, &options)?;
            assemble::check_cardinality(
                &pairs,
                left.len(),
                right.len(),
                &options.cardinality,
                false,
            )?;
            Shape::Grouped {
                by: Side::Left,
                groups: assemble::group_pairs(pairs),
            }
        }
        // Grouping by the right side runs side-swapped and relabels: the
        // groups key the right side directly, no flip-back needed.
        GroupBy::Right => {
            let swapped_cond = condition.swapped();
            let swapped_opts = options.side_swapped();
            let pairs = assemble::execute_flat(right, left, &swapped_cond, &swapped_opts)?;
            assemble::check_cardinality(
                &pairs,
                right.len(),
                left.len(),
                &swapped_opts.cardinality,
                true,
            )?;
            Shape::Grouped {
                by: Side::Right,
                groups: assemble::group_pairs(pairs),
            }
        }
    };

    Ok(IndexJoin { shape })
}
