//! Shared application state for axum handlers.

use std::sync::Arc;

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_app::services::activation::ActivationWorkflow;
use flotilla_app::services::rule_list::RuleListService;
use flotilla_app::services::rule_service::RuleService;
use flotilla_app::services::tracker_service::TrackerService;

/// Application state shared across all axum handlers.
///
/// Generic over the backend and inventory port types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the services themselves do
/// not need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<B, I> {
    /// Validated rule CRUD.
    pub rules: Arc<RuleService<B>>,
    /// Preview-gated activation sessions.
    pub activation: Arc<ActivationWorkflow<B>>,
    /// Ordered per-instance rule views.
    pub rule_list: Arc<RuleListService<B>>,
    /// Tracker identity resolution.
    pub trackers: Arc<TrackerService<I>>,
}

impl<B, I> Clone for AppState<B, I> {
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            activation: Arc::clone(&self.activation),
            rule_list: Arc::clone(&self.rule_list),
            trackers: Arc::clone(&self.trackers),
        }
    }
}

impl<B, I> AppState<B, I>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        rules: RuleService<B>,
        activation: ActivationWorkflow<B>,
        rule_list: RuleListService<B>,
        trackers: TrackerService<I>,
    ) -> Self {
        Self {
            rules: Arc::new(rules),
            activation: Arc::new(activation),
            rule_list: Arc::new(rule_list),
            trackers: Arc::new(trackers),
        }
    }
}
