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

//! The join condition model: accessors, atomic conditions, and conjunction.
//!
//! A [`Condition<L, R>`] declares when a left record matches a right record.
//! Atomic conditions carry one [`Accessor`] per side (pairing with the input
//! sides is positional and enforced by the type parameters); conjunction via
//! the `&` operator keeps the child list flat, never nested.
//!
//! Every condition knows how to [`swap`](Condition::swapped) itself, which
//! exchanges the accessors and inverts ordered operators. Swapping is how
//! the engine serves `groupby = right` and right-side `multi` policies
//! without separate right-driven executors.

use std::fmt;
use std::ops::BitAnd;
use std::sync::Arc;

use crate::core::{Datum, Interval};

// ============================================================================
// Accessors
// ============================================================================

/// A record type that supports field lookup by name.
///
/// Implementing this enables the bare-field-name sugar: `by_key("name")`
/// expands into a field-lookup closure over this trait.
pub trait Record {
    /// Project the named field into a [`Datum`].
    fn field(&self, name: &str) -> Datum;
}

/// A pure unary projection from a record to a [`Datum`].
///
/// Built from any closure returning a value convertible into `Datum`, or
/// from a field name when the record type implements [`Record`].
pub struct Accessor<T> {
    f: Arc<dyn Fn(&T) -> Datum + Send + Sync>,
}

impl<T> Accessor<T> {
    /// Wrap a closure as an accessor.
    pub fn new<D, F>(f: F) -> Self
    where
        D: Into<Datum>,
        F: Fn(&T) -> D + Send + Sync + 'static,
    {
        Accessor {
            f: Arc::new(move |record: &T| f(record).into()),
        }
    }

    /// Field-lookup accessor equivalent to "fetch the field named `name`".
    pub fn field(name: impl Into<String>) -> Self
    where
        T: Record,
    {
        let name = name.into();
        Accessor {
            f: Arc::new(move |record: &T| record.field(&name)),
        }
    }

    /// Apply the accessor to a record.
    #[inline]
    pub fn get(&self, record: &T) -> Datum {
        (self.f)(record)
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Accessor {
            f: Arc::clone(&self.f),
        }
    }
}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor")
    }
}

/// Marker for closure-based [`IntoAccessor`] conversion.
pub struct FnMarker;
/// Marker for field-name [`IntoAccessor`] conversion.
pub struct FieldMarker;
/// Marker for the identity [`IntoAccessor`] conversion.
pub struct ReadyMarker;

/// Anything the condition constructors accept as an accessor: a closure, a
/// field name (for [`Record`] types), or an [`Accessor`] itself.
///
/// The `M` marker parameter only disambiguates the impls; inference always
/// picks it, callers never name it.
pub trait IntoAccessor<T, M> {
    fn into_accessor(self) -> Accessor<T>;
}

impl<T, D, F> IntoAccessor<T, (FnMarker, D)> for F
where
    D: Into<Datum>,
    F: Fn(&T) -> D + Send + Sync + 'static,
{
    fn into_accessor(self) -> Accessor<T> {
        Accessor::new(self)
    }
}

impl<T: Record> IntoAccessor<T, FieldMarker> for &str {
    fn into_accessor(self) -> Accessor<T> {
        Accessor::field(self)
    }
}

impl<T: Record> IntoAccessor<T, FieldMarker> for String {
    fn into_accessor(self) -> Accessor<T> {
        Accessor::field(self)
    }
}

impl<T> IntoAccessor<T, ReadyMarker> for Accessor<T> {
    fn into_accessor(self) -> Accessor<T> {
        self
    }
}

// ============================================================================
// Distance metrics
// ============================================================================

/// A black-box distance function over accessor outputs.
///
/// The engine treats the metric as opaque. The spatial index prunes its
/// search with the triangle inequality and re-verifies every candidate with
/// the exact metric, so a function that is not a true metric can only cause
/// missed matches, never false ones.
pub struct Metric(Arc<dyn Fn(&Datum, &Datum) -> f64 + Send + Sync>);

impl Metric {
    /// Wrap a distance closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Datum, &Datum) -> f64 + Send + Sync + 'static,
    {
        Metric(Arc::new(f))
    }

    /// Evaluate the metric.
    #[inline]
    pub fn eval(&self, a: &Datum, b: &Datum) -> f64 {
        (self.0)(a, b)
    }
}

impl Clone for Metric {
    fn clone(&self) -> Self {
        Metric(Arc::clone(&self.0))
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Metric")
    }
}

/// The matching radius of a distance condition: `d <= tau` or `d < tau`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Radius {
    tau: f64,
    strict: bool,
}

impl Radius {
    /// Non-strict radius: matches when `distance <= tau`.
    pub fn at_most(tau: f64) -> Self {
        Radius { tau, strict: false }
    }

    /// Strict radius: matches when `distance < tau`.
    pub fn less_than(tau: f64) -> Self {
        Radius { tau, strict: true }
    }

    /// The radius bound.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Whether a distance satisfies the radius predicate.
    #[inline]
    pub fn admits(&self, distance: f64) -> bool {
        if self.strict {
            distance < self.tau
        } else {
            distance <= self.tau
        }
    }
}

// ============================================================================
// Predicate operators
// ============================================================================

/// Comparison operator of a predicate condition.
///
/// The point operators relate scalar keys; `Contains`/`Within` relate an
/// interval to a point; the set operators and `Overlaps` relate two
/// intervals. `Within` exists so that [`PredOp::swapped`] is closed: it is
/// the mirror of `Contains` and, like the set operators, only the nested
/// loop can evaluate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredOp {
    /// `f_L(l) < f_R(r)`
    Lt,
    /// `f_L(l) <= f_R(r)`
    Le,
    /// `f_L(l) = f_R(r)`
    Eq,
    /// `f_L(l) >= f_R(r)`
    Ge,
    /// `f_L(l) > f_R(r)`
    Gt,
    /// Left interval contains right point
    Contains,
    /// Left point lies within right interval
    Within,
    /// Left interval is a subset of right interval
    Subset,
    /// Left interval is a proper subset of right interval
    ProperSubset,
    /// Left interval is a superset of right interval
    Superset,
    /// Left interval is a proper superset of right interval
    ProperSuperset,
    /// The two intervals share at least one point
    Overlaps,
}

impl PredOp {
    /// The operator with its sides exchanged.
    pub fn swapped(self) -> PredOp {
        match self {
            PredOp::Lt => PredOp::Gt,
            PredOp::Le => PredOp::Ge,
            PredOp::Eq => PredOp::Eq,
            PredOp::Ge => PredOp::Le,
            PredOp::Gt => PredOp::Lt,
            PredOp::Contains => PredOp::Within,
            PredOp::Within => PredOp::Contains,
            PredOp::Subset => PredOp::Superset,
            PredOp::ProperSubset => PredOp::ProperSuperset,
            PredOp::Superset => PredOp::Subset,
            PredOp::ProperSuperset => PredOp::ProperSubset,
            PredOp::Overlaps => PredOp::Overlaps,
        }
    }

    /// Whether the sort executor can evaluate this operator with binary
    /// search over a right-side key column.
    pub(crate) fn sortable(self) -> bool {
        matches!(
            self,
            PredOp::Lt | PredOp::Le | PredOp::Eq | PredOp::Ge | PredOp::Gt | PredOp::Contains
        )
    }

    /// Evaluate the operator on two accessor outputs.
    ///
    /// An interval operator applied to non-interval operands matches
    /// nothing, mirroring how a key comparison across incompatible types
    /// simply fails to match.
    pub fn matches(self, lhs: &Datum, rhs: &Datum) -> bool {
        match self {
            PredOp::Lt => lhs < rhs,
            PredOp::Le => lhs <= rhs,
            PredOp::Eq => lhs == rhs,
            PredOp::Ge => lhs >= rhs,
            PredOp::Gt => lhs > rhs,
            PredOp::Contains => match lhs.as_interval() {
                Some(iv) => iv.contains(rhs),
                None => false,
            },
            PredOp::Within => match rhs.as_interval() {
                Some(iv) => iv.contains(lhs),
                None => false,
            },
            PredOp::Subset => Self::both(lhs, rhs, Interval::subset_of),
            PredOp::ProperSubset => Self::both(lhs, rhs, Interval::proper_subset_of),
            PredOp::Superset => Self::both(lhs, rhs, Interval::superset_of),
            PredOp::ProperSuperset => Self::both(lhs, rhs, Interval::proper_superset_of),
            PredOp::Overlaps => Self::both(lhs, rhs, Interval::overlaps),
        }
    }

    fn both(lhs: &Datum, rhs: &Datum, rel: impl Fn(&Interval, &Interval) -> bool) -> bool {
        match (lhs.as_interval(), rhs.as_interval()) {
            (Some(a), Some(b)) => rel(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for PredOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredOp::Lt => "<",
            PredOp::Le => "<=",
            PredOp::Eq => "=",
            PredOp::Ge => ">=",
            PredOp::Gt => ">",
            PredOp::Contains => "contains",
            PredOp::Within => "within",
            PredOp::Subset => "subset",
            PredOp::ProperSubset => "proper-subset",
            PredOp::Superset => "superset",
            PredOp::ProperSuperset => "proper-superset",
            PredOp::Overlaps => "overlaps",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// A declarative join condition between a left record type and a right
/// record type.
///
/// `All` always holds a flat list of atomic children; [`Condition::and`] and
/// the `&` operator splice lists instead of nesting.
pub enum Condition<L, R> {
    /// Keys from both sides are equal.
    Key {
        left: Accessor<L>,
        right: Accessor<R>,
    },
    /// Accessor outputs satisfy a comparison operator.
    Pred {
        left: Accessor<L>,
        op: PredOp,
        right: Accessor<R>,
    },
    /// Coordinates lie within a radius under a metric.
    Distance {
        left: Accessor<L>,
        right: Accessor<R>,
        metric: Metric,
        radius: Radius,
    },
    /// The two indices differ. Only meaningful in self-joins.
    NotSame,
    /// Conjunction: matches iff every child matches.
    All(Vec<Condition<L, R>>),
}

impl<L, R> Condition<L, R> {
    /// Conjoin two conditions, keeping the child list flat.
    pub fn and(self, other: Condition<L, R>) -> Condition<L, R> {
        let mut children = match self {
            Condition::All(cs) => cs,
            c => vec![c],
        };
        match other {
            Condition::All(cs) => children.extend(cs),
            c => children.push(c),
        }
        Condition::All(children)
    }

    /// The condition with its sides exchanged: accessors swap slots and
    /// ordered operators invert.
    pub fn swapped(self) -> Condition<R, L> {
        match self {
            Condition::Key { left, right } => Condition::Key {
                left: right,
                right: left,
            },
            Condition::Pred { left, op, right } => Condition::Pred {
                left: right,
                op: op.swapped(),
                right: left,
            },
            Condition::Distance {
                left,
                right,
                metric,
                radius,
            } => Condition::Distance {
                left: right,
                right: left,
                metric,
                radius,
            },
            Condition::NotSame => Condition::NotSame,
            Condition::All(cs) => Condition::All(cs.into_iter().map(|c| c.swapped()).collect()),
        }
    }

    /// Whether the pair `(l, r)` at indices `(li, ri)` matches.
    pub fn is_match(&self, l: &L, r: &R, li: usize, ri: usize) -> bool {
        match self {
            Condition::Key { left, right } => left.get(l) == right.get(r),
            Condition::Pred { left, op, right } => op.matches(&left.get(l), &right.get(r)),
            Condition::Distance {
                left,
                right,
                metric,
                radius,
            } => radius.admits(metric.eval(&left.get(l), &right.get(r))),
            Condition::NotSame => li != ri,
            Condition::All(cs) => cs.iter().all(|c| c.is_match(l, r, li, ri)),
        }
    }

    /// The flat list of atomic children (the condition itself when atomic).
    pub(crate) fn atoms(&self) -> &[Condition<L, R>] {
        match self {
            Condition::All(cs) => cs,
            other => std::slice::from_ref(other),
        }
    }

    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Condition::Key { .. } => "by_key".to_string(),
            Condition::Pred { op, .. } => format!("by_pred({})", op),
            Condition::Distance { .. } => "by_distance".to_string(),
            Condition::NotSame => "not_same".to_string(),
            Condition::All(cs) => {
                let parts: Vec<String> = cs.iter().map(|c| c.describe()).collect();
                parts.join(" & ")
            }
        }
    }
}

impl<L, R> Clone for Condition<L, R> {
    fn clone(&self) -> Self {
        match self {
            Condition::Key { left, right } => Condition::Key {
                left: left.clone(),
                right: right.clone(),
            },
            Condition::Pred { left, op, right } => Condition::Pred {
                left: left.clone(),
                op: *op,
                right: right.clone(),
            },
            Condition::Distance {
                left,
                right,
                metric,
                radius,
            } => Condition::Distance {
                left: left.clone(),
                right: right.clone(),
                metric: metric.clone(),
                radius: *radius,
            },
            Condition::NotSame => Condition::NotSame,
            Condition::All(cs) => Condition::All(cs.clone()),
        }
    }
}

impl<L, R> fmt::Debug for Condition<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<L, R> BitAnd for Condition<L, R> {
    type Output = Condition<L, R>;

    fn bitand(self, rhs: Condition<L, R>) -> Condition<L, R> {
        self.and(rhs)
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Equi-join condition with one accessor applied to both sides.
pub fn by_key<T, M>(key: impl IntoAccessor<T, M>) -> Condition<T, T> {
    let acc = key.into_accessor();
    Condition::Key {
        left: acc.clone(),
        right: acc,
    }
}

/// Equi-join condition with a separate accessor per side.
pub fn by_keys<L, R, ML, MR>(
    left: impl IntoAccessor<L, ML>,
    right: impl IntoAccessor<R, MR>,
) -> Condition<L, R> {
    Condition::Key {
        left: left.into_accessor(),
        right: right.into_accessor(),
    }
}

/// Predicate condition: `op` relates the left accessor output to the right.
pub fn by_pred<L, R, ML, MR>(
    left: impl IntoAccessor<L, ML>,
    op: PredOp,
    right: impl IntoAccessor<R, MR>,
) -> Condition<L, R> {
    Condition::Pred {
        left: left.into_accessor(),
        op,
        right: right.into_accessor(),
    }
}

/// Distance condition with one coordinate accessor applied to both sides.
pub fn by_distance<T, M>(
    coord: impl IntoAccessor<T, M>,
    metric: impl Fn(&Datum, &Datum) -> f64 + Send + Sync + 'static,
    radius: Radius,
) -> Condition<T, T> {
    let acc = coord.into_accessor();
    Condition::Distance {
        left: acc.clone(),
        right: acc,
        metric: Metric::new(metric),
        radius,
    }
}

/// Distance condition with a separate coordinate accessor per side.
///
/// The two accessors must produce commensurable coordinates for the metric.
pub fn by_distance_lr<L, R, ML, MR>(
    left: impl IntoAccessor<L, ML>,
    right: impl IntoAccessor<R, MR>,
    metric: impl Fn(&Datum, &Datum) -> f64 + Send + Sync + 'static,
    radius: Radius,
) -> Condition<L, R> {
    Condition::Distance {
        left: left.into_accessor(),
        right: right.into_accessor(),
        metric: Metric::new(metric),
        radius,
    }
}

/// Self-join guard: matches iff the two indices differ.
pub fn not_same<T>() -> Condition<T, T> {
    Condition::NotSame
}
