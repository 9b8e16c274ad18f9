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

//! Router lifecycle signals.

use serde::{Deserialize, Serialize};

/// What triggered a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// The app was loaded for the first time.
    Enter,
    /// A form submission.
    Form,
    /// The user is leaving the app (document unload).
    Leave,
    /// A link click.
    Link,
    /// A programmatic navigation.
    Goto,
    /// Browser back/forward.
    Popstate,
}

impl NavigationKind {
    /// Returns `true` if the transition stays inside the current document.
    pub fn is_client_side(self) -> bool {
        !matches!(self, NavigationKind::Leave)
    }
}

/// Metadata carried by a navigation signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationInfo {
    /// The route being left, if any.
    #[serde(default)]
    pub from: Option<String>,
    /// The route being entered, if known.
    #[serde(default)]
    pub to: Option<String>,
    /// What triggered the navigation.
    pub kind: NavigationKind,
}

impl NavigationInfo {
    /// Creates metadata with no routes.
    pub fn new(kind: NavigationKind) -> Self {
        Self {
            from: None,
            to: None,
            kind,
        }
    }

    /// A link navigation between two routes.
    pub fn link(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(NavigationKind::Link)
            .with_from(from)
            .with_to(to)
    }

    /// Sets the route being left.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the route being entered.
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }
}

/// A lifecycle signal emitted by the router collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSignal {
    /// Fired synchronously before a navigation begins.
    BeforeNavigate(NavigationInfo),
    /// Fired once the navigation has completed.
    AfterNavigate(NavigationInfo),
}

impl NavigationSignal {
    /// The metadata carried by the signal.
    pub fn info(&self) -> &NavigationInfo {
        match self {
            NavigationSignal::BeforeNavigate(info) | NavigationSignal::AfterNavigate(info) => info,
        }
    }
}

/// Which state a "before navigate" signal resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetScope {
    /// Every navigation-level phase, paint phases and resource statistics.
    #[default]
    Full,
    /// Only the SPA navigation phase.
    SpaOnly,
}
