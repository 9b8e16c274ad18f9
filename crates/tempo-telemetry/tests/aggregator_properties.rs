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

use proptest::prelude::*;
use tempo_core::navigation::ResetScope;
use tempo_core::timing::{DeliveryType, PhaseId, ResourceRecord, TimingPhase};
use tempo_telemetry::{MetricsAggregator, PhaseUpdate};

fn record_strategy() -> impl Strategy<Value = ResourceRecord> {
    (
        "[a-z]{1,8}",
        0.1f64..5_000.0,
        prop_oneof![
            Just(None),
            Just(Some(DeliveryType::Cache)),
            Just(Some(DeliveryType::Network)),
            Just(Some(DeliveryType::NavigationalPrefetch)),
        ],
        any::<bool>(),
    )
        .prop_map(|(name, duration, delivery, render_blocking)| ResourceRecord {
            delivery,
            render_blocking,
            ..ResourceRecord::new(name, duration)
        })
}

proptest! {
    #[test]
    fn prop_cache_hits_never_exceed_total(records in prop::collection::vec(record_strategy(), 0..64)) {
        let mut aggregator = MetricsAggregator::default();
        for record in records {
            aggregator.apply_update(PhaseUpdate::Resource(record));
            let resources = aggregator.resources();
            prop_assert!(resources.from_cache_count() <= resources.total_count());
        }
    }

    #[test]
    fn prop_blocking_flag_is_monotonic(records in prop::collection::vec(record_strategy(), 1..64)) {
        let mut aggregator = MetricsAggregator::default();
        let mut seen_blocking = false;
        for record in records {
            seen_blocking |= record.render_blocking;
            aggregator.apply_update(PhaseUpdate::Resource(record));
            prop_assert_eq!(aggregator.resources().has_blocking_resource(), seen_blocking);
        }
    }

    #[test]
    fn prop_recent_resources_are_newest_first(records in prop::collection::vec(record_strategy(), 1..32)) {
        let mut aggregator = MetricsAggregator::default();
        let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        for record in records {
            aggregator.apply_update(PhaseUpdate::Resource(record));
        }
        let recent: Vec<String> = aggregator
            .resources()
            .recent_resources()
            .iter()
            .map(|r| r.name.clone())
            .collect();
        let expected: Vec<String> = names.into_iter().rev().collect();
        prop_assert_eq!(recent, expected);
    }

    #[test]
    fn prop_complete_phases_satisfy_the_duration_invariant(start in 0.0f64..10_000.0, length in 0.0f64..10_000.0) {
        let phase = TimingPhase::between(start, start + length);
        prop_assert!(phase.is_complete());
        prop_assert_eq!(phase.duration, Some((start + length) - start));
    }

    #[test]
    fn prop_full_reset_returns_to_the_initial_state(
        paints in prop::collection::vec(0.0f64..1_000.0, 0..8),
        records in prop::collection::vec(record_strategy(), 0..16),
        spa_start in 0.0f64..1_000.0,
    ) {
        let pristine = MetricsAggregator::default().snapshot();
        let mut aggregator = MetricsAggregator::default();
        for start in paints {
            aggregator.apply_update(PhaseUpdate::Paint {
                phase: PhaseId::FirstPaint,
                timing: TimingPhase::from_entry(start, 0.0),
            });
        }
        for record in records {
            aggregator.apply_update(PhaseUpdate::Resource(record));
        }
        aggregator.set_spa_navigation(TimingPhase::starting_at(spa_start));

        aggregator.reset_scope(ResetScope::Full);

        let snapshot = aggregator.snapshot();
        prop_assert_eq!(snapshot.phases, pristine.phases);
        prop_assert_eq!(snapshot.resources, pristine.resources);
        prop_assert_eq!(snapshot.dom_complete_mark, None);
    }

    #[test]
    fn prop_first_paint_keeps_the_first_value(starts in prop::collection::vec(0.0f64..1_000.0, 1..16)) {
        let mut aggregator = MetricsAggregator::default();
        for &start in &starts {
            aggregator.apply_update(PhaseUpdate::Paint {
                phase: PhaseId::FirstPaint,
                timing: TimingPhase::from_entry(start, 0.0),
            });
        }
        prop_assert_eq!(aggregator.phase(PhaseId::FirstPaint).start, Some(starts[0]));
    }
}
