// Copyright 2025 eraflo
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

//! Error types shared across the workspace.
//!
//! None of these is ever fatal to the host application: the tracker recovers
//! from every one of them locally and, at worst, collects no data.

use crate::timing::EntryType;

/// A specialized `Result` type for host observation operations.
pub type ObservationResult<T> = Result<T, ObservationError>;

/// An error raised by a host runtime while setting up or feeding observations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    /// The host does not support observing this entry type.
    #[error("entry type `{0}` is not supported by the host")]
    Unsupported(EntryType),
    /// The host is not a client context; nothing can be observed.
    #[error("performance observation is unavailable outside a client context")]
    EnvironmentUnavailable,
    /// A measure referenced a mark that was never set.
    #[error("no mark named `{0}`")]
    UnknownMark(String),
    /// The receiving side of a delivery channel is gone.
    #[error("the delivery channel is disconnected")]
    Disconnected,
}

/// A delivered entry lacks a field its kind requires.
///
/// Only used for diagnostics: the classifier skips the affected assignment and
/// logs this value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {entry_type} entry `{name}`: missing `{field}`")]
pub struct MalformedEntry {
    /// Kind of the offending entry.
    pub entry_type: EntryType,
    /// Name of the offending entry.
    pub name: String,
    /// The missing field, by its host name.
    pub field: &'static str,
}
