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

//! # Tempo Infra
//!
//! Concrete implementations of the `tempo-core` host contract.
//!
//! - [`SimulatedHost`]: an in-process client context driven by explicit calls,
//!   used by the sandbox and the tests.
//! - [`DetachedHost`]: a server-side context where nothing can be observed.
//! - [`SessionTrace`]: a recorded session that can be replayed into a host.

#![warn(missing_docs)]

pub mod host;
pub mod trace;

pub use host::{DetachedHost, SimulatedHost};
pub use trace::{SessionTrace, TraceStep};
