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

//! Display helpers for timings and byte counts.

/// Placeholder shown for a value that was never measured.
pub const NOT_AVAILABLE: &str = "N/A";

const BYTE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a duration as whole milliseconds, e.g. `"150ms"`.
pub fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) if ms.is_finite() => format!("{}ms", ms.round()),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

/// Formats a signed byte count with one decimal, e.g. `"1.5 MB"`.
pub fn format_bytes(value: Option<i64>) -> String {
    let Some(bytes) = value else {
        return NOT_AVAILABLE.to_owned();
    };

    let mut size = bytes.unsigned_abs() as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let sign = if bytes < 0 { "-" } else { "" };
    format!("{sign}{size:.1} {}", BYTE_UNITS[unit])
}
