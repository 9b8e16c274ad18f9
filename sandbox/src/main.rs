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

// Tempo Sandbox
// Replays a recorded session through the tracker and prints what a
// metrics panel would show.
//
// Usage: sandbox [TRACE.json] [CONFIG.json]

use std::sync::Arc;

use anyhow::{Context, Result};
use tempo_infra::{SessionTrace, SimulatedHost};
use tempo_telemetry::server::ExternalRequest;
use tempo_telemetry::{MetricsPanel, PerformanceTracker, ServerRenderMetrics, TrackerConfig};

const DEMO_TRACE: &str = include_str!("../traces/demo.json");

fn load_inputs() -> Result<(SessionTrace, TrackerConfig)> {
    let mut args = std::env::args().skip(1);
    let trace = match args.next() {
        Some(path) => SessionTrace::load(&path)?,
        None => SessionTrace::from_json_str(DEMO_TRACE)?,
    };
    let config = match args.next() {
        Some(path) => TrackerConfig::from_path(&path)
            .with_context(|| format!("invalid tracker config {path}"))?,
        None => TrackerConfig::default(),
    };
    Ok((trace, config))
}

fn print_panel(panel: &MetricsPanel) {
    println!("--- Page performance (cycle {}) ---", panel.snapshot().generation);
    for (label, value) in panel.summary() {
        println!("{label:>26}: {value}");
    }
}

fn render_server_demo() -> ServerRenderMetrics {
    let mut metrics = ServerRenderMetrics::new();
    metrics.track("route", || std::thread::sleep(std::time::Duration::from_millis(2)));
    {
        let mut phase = metrics.scoped_phase("data-fetch");
        let products: Result<Vec<&str>, &str> =
            phase.track_request("https://api.example.test/products", "GET", || {
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(vec!["lamp", "desk"])
            });
        log::info!("Fetched {} products", products.map(|p| p.len()).unwrap_or_default());
        let start = phase.elapsed();
        phase.record_request(
            ExternalRequest::new("db://inventory", "SELECT", start, start + 1.5).with_status(200),
        );
    }
    metrics.track("render", || std::thread::sleep(std::time::Duration::from_millis(3)));
    metrics.complete();
    metrics
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let (trace, config) = load_inputs()?;
    let host = SimulatedHost::new();
    let mut tracker = PerformanceTracker::new(Arc::new(host.clone()), config);
    tracker.start();
    let mut panel = tracker.panel();
    panel.set_open(true);

    tracker.mark_hydration_start();
    host.advance(35.0);
    tracker.mark_hydration_end();

    let router = tracker
        .navigation_sender()
        .context("tracker stopped before the replay")?;
    trace.replay(&host, &router, || {
        tracker.tick();
        if panel.refresh() {
            print_panel(&panel);
        }
    })?;

    println!(
        "\n--- Snapshot ---\n{}",
        serde_json::to_string_pretty(panel.snapshot())?
    );

    println!("\n--- Page loads ---");
    for load in tracker.page_loads().iter() {
        println!(
            "{}: TTFB {}, full load {}, {} paints",
            load.url,
            tempo_telemetry::format::format_ms(load.time_to_first_byte()),
            tempo_telemetry::format::format_ms(load.full_load()),
            load.paints.len()
        );
    }

    println!("\n--- Navigation history ---");
    for navigation in tracker.history().iter() {
        println!(
            "{} -> {} ({:?}): {}",
            navigation.from.as_deref().unwrap_or("?"),
            navigation.to.as_deref().unwrap_or("?"),
            navigation.kind,
            tempo_telemetry::format::format_ms(navigation.duration())
        );
    }

    let server = render_server_demo();
    println!("\n--- Server render ---");
    for (key, value) in server.summary() {
        println!("{key:>26}: {value}");
    }

    tracker.stop();
    Ok(())
}
