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

//! Timing of a server-side render: named phases, external requests and the
//! process memory footprint.
//!
//! Times are milliseconds relative to the moment the metrics were created, so
//! they share the [`TimingPhase`] shape of the client-side metrics.

use crate::format::{format_bytes, format_ms};
use crate::utils::ScopedPhase;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tempo_core::timing::TimingPhase;

/// One named phase of a server render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerPhase {
    /// Phase name, e.g. `"data-fetch"`.
    pub name: String,
    /// Start, end and duration relative to the render start.
    #[serde(flatten)]
    pub timing: TimingPhase,
}

/// An API call or database query made while rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRequest {
    /// Target of the request.
    pub url: String,
    /// HTTP method or operation name.
    pub method: String,
    /// Start, end and duration relative to the render start.
    #[serde(flatten)]
    pub timing: TimingPhase,
    /// Response status, if known.
    pub status: Option<u16>,
    /// Whether the request succeeded.
    pub success: bool,
}

impl ExternalRequest {
    /// A successful request spanning `start..end`.
    pub fn new(url: impl Into<String>, method: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            timing: TimingPhase::between(start, end),
            status: None,
            success: true,
        }
    }

    /// Sets the response status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Marks the request as failed.
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

/// Process memory, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size.
    pub resident: u64,
    /// Virtual memory size.
    pub virtual_memory: u64,
}

impl MemoryUsage {
    /// Samples the current process, `None` when the platform does not tell.
    pub fn sample() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                log::debug!("Process memory unavailable: {e}");
                return None;
            }
        };
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|process| Self {
            resident: process.memory(),
            virtual_memory: process.virtual_memory(),
        })
    }
}

/// Signed change in process memory over a render, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDelta {
    /// Change in resident set size.
    pub resident: i64,
    /// Change in virtual memory size.
    pub virtual_memory: i64,
}

/// Serializable form of [`ServerRenderMetrics`], handed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRenderReport {
    /// Render duration, once completed.
    pub total_render_time: Option<f64>,
    /// Phases in the order they started.
    pub phases: Vec<ServerPhase>,
    /// External requests in the order they were recorded.
    pub external_requests: Vec<ExternalRequest>,
    /// Memory sampled at creation.
    pub memory_start: Option<MemoryUsage>,
    /// Memory sampled at completion.
    pub memory_end: Option<MemoryUsage>,
    /// Difference between the two samples.
    pub memory_delta: Option<MemoryDelta>,
}

/// Measures one server render.
#[derive(Debug)]
pub struct ServerRenderMetrics {
    started: Instant,
    finished_at: Option<f64>,
    phases: Vec<ServerPhase>,
    current: Option<usize>,
    requests: Vec<ExternalRequest>,
    memory_start: Option<MemoryUsage>,
    memory_end: Option<MemoryUsage>,
}

impl ServerRenderMetrics {
    /// Starts the render clock and samples the process memory.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            finished_at: None,
            phases: Vec::new(),
            current: None,
            requests: Vec::new(),
            memory_start: MemoryUsage::sample(),
            memory_end: None,
        }
    }

    /// Milliseconds since the render started.
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Starts a phase, ending the one in progress first.
    pub fn start_phase(&mut self, name: impl Into<String>) {
        if self.current.is_some() {
            self.end_phase();
        }
        let name = name.into();
        log::trace!("Server phase `{name}` started");
        self.phases.push(ServerPhase {
            name,
            timing: TimingPhase::starting_at(self.elapsed()),
        });
        self.current = Some(self.phases.len() - 1);
    }

    /// Ends the phase in progress and returns it.
    pub fn end_phase(&mut self) -> Option<&ServerPhase> {
        let index = self.current.take()?;
        let now = self.elapsed();
        let phase = &mut self.phases[index];
        let start = phase.timing.start.unwrap_or_default();
        phase.timing = TimingPhase::between(start, now);
        log::trace!("Server phase `{}` took {}ms", phase.name, now - start);
        Some(&*phase)
    }

    /// Starts a phase that ends when the returned guard is dropped.
    pub fn scoped_phase(&mut self, name: impl Into<String>) -> ScopedPhase<'_> {
        ScopedPhase::new(self, name)
    }

    /// Runs `operation` inside a phase named `name`.
    pub fn track<T>(&mut self, name: impl Into<String>, operation: impl FnOnce() -> T) -> T {
        let _phase = self.scoped_phase(name);
        operation()
    }

    /// Records an external request.
    pub fn record_request(&mut self, request: ExternalRequest) -> &ExternalRequest {
        log::trace!(
            "{} {} took {}ms",
            request.method,
            request.url,
            request.timing.duration.unwrap_or_default()
        );
        self.requests.push(request);
        &self.requests[self.requests.len() - 1]
    }

    /// Times `request` and records it; an `Err` marks it as failed.
    pub fn track_request<T, E>(
        &mut self,
        url: impl Into<String>,
        method: impl Into<String>,
        request: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let start = self.elapsed();
        let result = request();
        let mut record = ExternalRequest::new(url, method, start, self.elapsed());
        if result.is_err() {
            record = record.failed();
        }
        self.record_request(record);
        result
    }

    /// Ends the phase in progress, stops the clock and samples memory again.
    ///
    /// Only the first call has an effect.
    pub fn complete(&mut self) {
        if self.finished_at.is_some() {
            return;
        }
        self.end_phase();
        self.finished_at = Some(self.elapsed());
        self.memory_end = MemoryUsage::sample();
        log::debug!(
            "Server render completed in {}",
            format_ms(self.total_render_time())
        );
    }

    /// Render duration, once [`complete`](Self::complete) was called.
    pub fn total_render_time(&self) -> Option<f64> {
        self.finished_at
    }

    /// The first phase named `name`.
    pub fn phase(&self, name: &str) -> Option<&ServerPhase> {
        self.phases.iter().find(|phase| phase.name == name)
    }

    /// Duration of the first phase named `name`, once ended.
    pub fn phase_duration(&self, name: &str) -> Option<f64> {
        self.phase(name).and_then(|phase| phase.timing.duration)
    }

    /// Phases in the order they started.
    pub fn phases(&self) -> &[ServerPhase] {
        &self.phases
    }

    /// Recorded external requests.
    pub fn requests(&self) -> &[ExternalRequest] {
        &self.requests
    }

    /// Memory change between creation and completion.
    pub fn memory_delta(&self) -> Option<MemoryDelta> {
        let (start, end) = (self.memory_start?, self.memory_end?);
        Some(MemoryDelta {
            resident: end.resident as i64 - start.resident as i64,
            virtual_memory: end.virtual_memory as i64 - start.virtual_memory as i64,
        })
    }

    /// Formatted values keyed by metric name.
    pub fn summary(&self) -> BTreeMap<String, String> {
        let mut summary = BTreeMap::new();
        summary.insert(
            "totalRenderTime".to_owned(),
            format_ms(self.total_render_time()),
        );
        for phase in &self.phases {
            if let Some(duration) = phase.timing.duration {
                summary
                    .entry(format!("phase_{}", phase.name))
                    .or_insert_with(|| format_ms(Some(duration)));
            }
        }
        if !self.requests.is_empty() {
            let failed = self.requests.iter().filter(|r| !r.success).count();
            summary.insert(
                "externalRequests".to_owned(),
                format!("{} ({failed} failed)", self.requests.len()),
            );
        }
        if let Some(delta) = self.memory_delta() {
            summary.insert("memoryUsed".to_owned(), format_bytes(Some(delta.resident)));
            summary.insert(
                "memoryTotal".to_owned(),
                format_bytes(Some(delta.virtual_memory)),
            );
        }
        summary
    }

    /// A serializable copy of the measurements.
    pub fn report(&self) -> ServerRenderReport {
        ServerRenderReport {
            total_render_time: self.total_render_time(),
            phases: self.phases.clone(),
            external_requests: self.requests.clone(),
            memory_start: self.memory_start,
            memory_end: self.memory_end,
            memory_delta: self.memory_delta(),
        }
    }
}

impl Default for ServerRenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}
