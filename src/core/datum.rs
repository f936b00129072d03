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

//! Runtime value produced by record accessors.
//!
//! Every accessor projects a record into a [`Datum`]. The engine compares,
//! orders, and hashes datums without knowing anything about the user's record
//! types, which is what lets one set of executors serve arbitrary inputs.
//!
//! `Datum` carries a *total* order:
//!
//! - `Int` and `Float` compare numerically across variants (so
//!   `Int(1) == Float(1.0)`), with NaN admitted and sorted after all finite
//!   floats via [`f64::total_cmp`].
//! - Other variants compare within their own type; mixed variants fall back
//!   to a stable type code, so a sort key column with heterogeneous values
//!   still sorts deterministically.
//!
//! Hashing is consistent with equality: a `Float` that round-trips through
//! `i64` hashes exactly like the corresponding `Int`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::interval::Interval;

/// A runtime value projected out of a record by an accessor.
///
/// `Text` uses `Arc<str>` so that cloning a datum during index construction
/// is a refcount bump, not a string copy.
#[derive(Debug, Clone)]
pub enum Datum {
    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// UTF-8 text (Arc for cheap cloning)
    Text(Arc<str>),

    /// Interval with open/closed endpoints (boxed to keep `Datum` small)
    Interval(Box<Interval>),
}

impl Datum {
    /// Create an integer datum.
    pub fn int(value: i64) -> Self {
        Datum::Int(value)
    }

    /// Create a float datum.
    pub fn float(value: f64) -> Self {
        Datum::Float(value)
    }

    /// Create a text datum.
    pub fn text(value: impl Into<String>) -> Self {
        Datum::Text(Arc::from(value.into().as_str()))
    }

    /// Create a boolean datum.
    pub fn boolean(value: bool) -> Self {
        Datum::Bool(value)
    }

    /// Create an interval datum.
    pub fn interval(value: Interval) -> Self {
        Datum::Interval(Box::new(value))
    }

    /// Numeric view of this datum, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Int(i) => Some(*i as f64),
            Datum::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Interval view of this datum, when it is one.
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Datum::Interval(iv) => Some(iv),
            _ => None,
        }
    }

    /// Stable code used to order datums of different types.
    fn type_code(&self) -> u8 {
        match self {
            Datum::Bool(_) => 0,
            Datum::Int(_) => 1,
            Datum::Float(_) => 2,
            Datum::Text(_) => 3,
            Datum::Interval(_) => 4,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Datum {}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Int(x), Datum::Int(y)) => x.cmp(y),
            (Datum::Float(x), Datum::Float(y)) => x.total_cmp(y),
            // Cross-type numeric comparison
            (Datum::Int(x), Datum::Float(y)) => (*x as f64).total_cmp(y),
            (Datum::Float(x), Datum::Int(y)) => x.total_cmp(&(*y as f64)),
            (Datum::Bool(x), Datum::Bool(y)) => x.cmp(y),
            (Datum::Text(x), Datum::Text(y)) => x.cmp(y),
            (Datum::Interval(x), Datum::Interval(y)) => x.cmp(y),
            // Different types: stable ordering by type code
            _ => self.type_code().cmp(&other.type_code()),
        }
    }
}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Datum::Bool(b) => {
                0_u8.hash(state);
                b.hash(state);
            }
            Datum::Int(i) => {
                1_u8.hash(state);
                i.hash(state);
            }
            Datum::Float(f) => {
                // Keep Hash consistent with Eq: a float that round-trips
                // through i64 is equal to that Int and must hash like it.
                let as_int = *f as i64;
                if (as_int as f64).to_bits() == f.to_bits() {
                    1_u8.hash(state);
                    as_int.hash(state);
                } else {
                    2_u8.hash(state);
                    f.to_bits().hash(state);
                }
            }
            Datum::Text(s) => {
                3_u8.hash(state);
                s.hash(state);
            }
            Datum::Interval(iv) => {
                4_u8.hash(state);
                iv.lo().hash(state);
                iv.hi().hash(state);
                iv.lo_closed().hash(state);
                iv.hi_closed().hash(state);
            }
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::Float(x) => write!(f, "{}", x),
            Datum::Text(s) => write!(f, "{}", s),
            Datum::Interval(iv) => write!(f, "{}", iv),
        }
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Int(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Int(value as i64)
    }
}

impl From<usize> for Datum {
    fn from(value: usize) -> Self {
        Datum::Int(value as i64)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Float(value)
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Text(Arc::from(value))
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(Arc::from(value.as_str()))
    }
}

impl From<Arc<str>> for Datum {
    fn from(value: Arc<str>) -> Self {
        Datum::Text(value)
    }
}

impl From<Interval> for Datum {
    fn from(value: Interval) -> Self {
        Datum::Interval(Box::new(value))
    }
}
