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

//! Measures client-side navigations and resets the metrics between them.

use crate::aggregator::MetricsAggregator;
use serde::Serialize;
use std::mem;
use tempo_core::navigation::{NavigationInfo, NavigationKind, NavigationSignal, ResetScope};
use tempo_core::timing::TimingPhase;

/// Where the controller stands in the navigation lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavigationState {
    /// No navigation is being measured.
    #[default]
    Idle,
    /// A navigation started and has not completed yet.
    InFlight {
        /// Host time at which the navigation started.
        started_at: f64,
        /// The navigation announced by the router.
        info: NavigationInfo,
    },
}

/// A finished client-side navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedNavigation {
    /// Route the navigation left.
    pub from: Option<String>,
    /// Route the navigation reached.
    pub to: Option<String>,
    /// How the navigation was triggered.
    pub kind: NavigationKind,
    /// Start, end and duration of the navigation.
    pub timing: TimingPhase,
}

impl CompletedNavigation {
    /// Duration in milliseconds.
    pub fn duration(&self) -> Option<f64> {
        self.timing.duration
    }
}

/// Reacts to router signals.
///
/// Before a navigation the configured [`ResetScope`] is cleared and the SPA
/// phase starts; after it the SPA phase gets its end and duration.
#[derive(Debug, Default)]
pub struct NavigationResetController {
    scope: ResetScope,
    state: NavigationState,
}

impl NavigationResetController {
    /// Creates an idle controller resetting `scope` on every navigation.
    pub fn new(scope: ResetScope) -> Self {
        Self {
            scope,
            state: NavigationState::Idle,
        }
    }

    /// The scope cleared before each navigation.
    pub fn scope(&self) -> ResetScope {
        self.scope
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Returns `true` while a navigation is being measured.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, NavigationState::InFlight { .. })
    }

    /// Starts measuring a navigation.
    ///
    /// A second call before [`after_navigate`](Self::after_navigate) restarts
    /// the measurement from `now`.
    pub fn before_navigate(
        &mut self,
        info: NavigationInfo,
        now: f64,
        aggregator: &mut MetricsAggregator,
    ) {
        if let NavigationState::InFlight { started_at, .. } = &self.state {
            log::debug!("Navigation started at {started_at}ms superseded at {now}ms");
        }

        aggregator.reset_scope(self.scope);
        aggregator.set_spa_navigation(TimingPhase::starting_at(now));
        log::trace!("Navigation {:?} -> {:?} started at {now}ms", info.from, info.to);
        self.state = NavigationState::InFlight {
            started_at: now,
            info,
        };
    }

    /// Completes the in-flight navigation, if any.
    ///
    /// `info` describes the route actually reached; missing fields fall back to
    /// what was announced before the navigation.
    pub fn after_navigate(
        &mut self,
        info: NavigationInfo,
        now: f64,
        aggregator: &mut MetricsAggregator,
    ) -> Option<CompletedNavigation> {
        let NavigationState::InFlight {
            started_at,
            info: announced,
        } = mem::replace(&mut self.state, NavigationState::Idle)
        else {
            log::debug!("after_navigate without a navigation in flight; ignored");
            return None;
        };

        let timing = TimingPhase::between(started_at, now);
        aggregator.set_spa_navigation(timing);

        let completed = CompletedNavigation {
            from: info.from.or(announced.from),
            to: info.to.or(announced.to),
            kind: info.kind,
            timing,
        };
        log::debug!(
            "Navigation to {:?} took {}ms",
            completed.to,
            completed.duration().unwrap_or_default()
        );
        Some(completed)
    }

    /// Routes a router signal to the matching handler.
    pub fn handle(
        &mut self,
        signal: NavigationSignal,
        now: f64,
        aggregator: &mut MetricsAggregator,
    ) -> Option<CompletedNavigation> {
        match signal {
            NavigationSignal::BeforeNavigate(info) => {
                self.before_navigate(info, now, aggregator);
                None
            }
            NavigationSignal::AfterNavigate(info) => self.after_navigate(info, now, aggregator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PhaseUpdate;
    use tempo_core::timing::PhaseId;

    fn paint(aggregator: &mut MetricsAggregator) {
        aggregator.apply_update(PhaseUpdate::Paint {
            phase: PhaseId::FirstPaint,
            timing: TimingPhase::from_entry(80.0, 0.0),
        });
    }

    #[test]
    fn measures_spa_navigation() {
        let mut aggregator = MetricsAggregator::default();
        let mut controller = NavigationResetController::new(ResetScope::Full);

        controller.before_navigate(NavigationInfo::link("/", "/about"), 500.0, &mut aggregator);
        let spa = aggregator.phase(PhaseId::SpaNavigation);
        assert_eq!(spa.start, Some(500.0));
        assert_eq!(spa.end, None);
        assert!(controller.is_in_flight());

        let completed = controller
            .after_navigate(NavigationInfo::new(NavigationKind::Link), 650.0, &mut aggregator)
            .expect("navigation was in flight");

        assert_eq!(aggregator.phase(PhaseId::SpaNavigation).duration, Some(150.0));
        assert_eq!(completed.duration(), Some(150.0));
        assert_eq!(completed.to.as_deref(), Some("/about"));
        assert_eq!(controller.state(), &NavigationState::Idle);
    }

    #[test]
    fn after_navigate_while_idle_is_a_no_op() {
        let mut aggregator = MetricsAggregator::default();
        let mut controller = NavigationResetController::new(ResetScope::Full);
        paint(&mut aggregator);
        let before = aggregator.snapshot();

        let completed =
            controller.after_navigate(NavigationInfo::link("/", "/x"), 10.0, &mut aggregator);

        assert!(completed.is_none());
        assert_eq!(aggregator.snapshot(), before);
    }

    #[test]
    fn full_scope_clears_page_load_phases() {
        let mut aggregator = MetricsAggregator::default();
        let mut controller = NavigationResetController::new(ResetScope::Full);
        paint(&mut aggregator);

        controller.before_navigate(NavigationInfo::link("/", "/a"), 100.0, &mut aggregator);

        assert!(aggregator.phase(PhaseId::FirstPaint).is_absent());
    }

    #[test]
    fn spa_only_scope_keeps_page_load_phases() {
        let mut aggregator = MetricsAggregator::default();
        let mut controller = NavigationResetController::new(ResetScope::SpaOnly);
        paint(&mut aggregator);

        controller.before_navigate(NavigationInfo::link("/", "/a"), 100.0, &mut aggregator);

        assert!(aggregator.phase(PhaseId::FirstPaint).is_measured());
    }

    #[test]
    fn second_before_navigate_restarts_measurement() {
        let mut aggregator = MetricsAggregator::default();
        let mut controller = NavigationResetController::new(ResetScope::Full);

        controller.handle(
            NavigationSignal::BeforeNavigate(NavigationInfo::link("/", "/a")),
            100.0,
            &mut aggregator,
        );
        controller.handle(
            NavigationSignal::BeforeNavigate(NavigationInfo::link("/", "/b")),
            300.0,
            &mut aggregator,
        );
        let completed = controller.handle(
            NavigationSignal::AfterNavigate(NavigationInfo::new(NavigationKind::Link)),
            350.0,
            &mut aggregator,
        );

        let completed = completed.expect("navigation was in flight");
        assert_eq!(completed.duration(), Some(50.0));
        assert_eq!(completed.to.as_deref(), Some("/b"));
    }
}
