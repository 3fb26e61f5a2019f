//! Client actions and the per-turn action collector
//!
//! Tools that alter UI state return a `client_action` directive instead of
//! mutating CRM data. The collector gathers those directives over one
//! orchestration run and orders them for delivery: at most one navigation
//! is primary, everything else is deferred until the UI has settled on the
//! new page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A UI directive returned to the calling client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    /// Navigate the UI to a route
    Navigate {
        /// Route path, e.g. `/pipeline`
        route: String,
        /// Logical target name, e.g. `pipeline`
        target: String,
    },
    /// Any non-navigation UI-state change
    UiAction {
        /// UI scope the action applies to, e.g. `contacts`
        scope: String,
        /// Action name, e.g. `set_filter`
        action: String,
        /// Action-specific payload
        payload: Value,
    },
}

impl ClientAction {
    /// Returns true for navigation directives
    pub fn is_navigate(&self) -> bool {
        matches!(self, ClientAction::Navigate { .. })
    }
}

/// Actions collected from one orchestration run, partitioned for delivery
///
/// `primary` holds the first navigation (if any); `deferred` holds every
/// other action in emission order, including surplus navigations. The
/// actual delay between the phases is a UI-rendering concern; this core
/// only guarantees the ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedActions {
    /// The single navigation delivered first, when present
    pub primary: Option<ClientAction>,
    /// Remaining actions, delivered after the navigation settles
    pub deferred: Vec<ClientAction>,
}

impl CollectedActions {
    /// Flattens the two phases into one delivery-ordered list
    pub fn into_ordered(self) -> Vec<ClientAction> {
        let mut ordered = Vec::with_capacity(self.deferred.len() + 1);
        if let Some(primary) = self.primary {
            ordered.push(primary);
        }
        ordered.extend(self.deferred);
        ordered
    }

    /// Returns true when no actions were collected
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.deferred.is_empty()
    }
}

/// Accumulates client actions emitted by tool results during one turn
#[derive(Debug, Default)]
pub struct ActionCollector {
    actions: Vec<ClientAction>,
}

impl ActionCollector {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one action in emission order
    pub fn record(&mut self, action: ClientAction) {
        self.actions.push(action);
    }

    /// Partitions the collected actions for delivery
    ///
    /// The first navigation becomes primary; any further navigations
    /// degrade to deferred actions so a single response never fires two
    /// navigations.
    pub fn finish(self) -> CollectedActions {
        let mut primary = None;
        let mut deferred = Vec::new();

        for action in self.actions {
            if primary.is_none() && action.is_navigate() {
                primary = Some(action);
            } else {
                deferred.push(action);
            }
        }

        CollectedActions { primary, deferred }
    }
}
