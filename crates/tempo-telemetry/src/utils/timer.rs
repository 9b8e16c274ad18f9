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

//! RAII guard ending a server render phase when it goes out of scope.

use crate::server::ServerRenderMetrics;
use std::ops::{Deref, DerefMut};

/// Starts a phase on creation and ends it when dropped.
///
/// The phase is closed even on early returns or panics. The guard derefs to
/// the metrics so requests can be recorded while it is alive.
#[derive(Debug)]
pub struct ScopedPhase<'a> {
    metrics: &'a mut ServerRenderMetrics,
}

impl<'a> ScopedPhase<'a> {
    /// Starts `name` on `metrics`, ending the phase in progress if any.
    pub fn new(metrics: &'a mut ServerRenderMetrics, name: impl Into<String>) -> Self {
        metrics.start_phase(name);
        Self { metrics }
    }
}

impl Deref for ScopedPhase<'_> {
    type Target = ServerRenderMetrics;

    fn deref(&self) -> &Self::Target {
        self.metrics
    }
}

impl DerefMut for ScopedPhase<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.metrics
    }
}

impl Drop for ScopedPhase<'_> {
    fn drop(&mut self) {
        if self.metrics.end_phase().is_none() {
            log::warn!("[ScopedPhase] No phase in progress when the guard was dropped");
        }
    }
}
