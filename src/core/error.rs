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

//! Error types for joinkit.
//!
//! Two kinds of failure are observable from the public surface:
//! *configuration* errors (contradictory options, a pinned mode the
//! condition does not support) raised before any data is scanned, and
//! *cardinality violations* raised after assembly with structured context.

use thiserror::Error;

use super::Side;
use crate::mode::Mode;
use crate::options::Cardinality;

/// Result type alias for join operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for join operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Contradictory or malformed options, detected before execution
    #[error("invalid join configuration: {0}")]
    Config(String),

    /// A pinned execution mode that the condition does not support.
    /// The engine never silently falls back to another mode.
    #[error("mode {mode} does not support the join condition {condition}")]
    UnsupportedMode { mode: Mode, condition: String },

    /// A cardinality assertion failed after assembly
    #[error(
        "cardinality violated on the {side} side: element {index} has {observed} matches, expected {expected}"
    )]
    Cardinality {
        side: Side,
        index: usize,
        observed: usize,
        expected: Cardinality,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Check if this is a configuration error (including pinned-mode errors)
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::UnsupportedMode { .. })
    }

    /// Check if this is a cardinality violation
    pub fn is_cardinality(&self) -> bool {
        matches!(self, Error::Cardinality { .. })
    }
}
