//! Ordered rule collections — cached per-instance views with optimistic
//! reordering and rollback.
//!
//! The cached view is what listing surfaces render. A reorder rewrites it
//! optimistically (every rule's `sort_order` becomes its new 1-based index)
//! before the mutation is issued; if the instance rejects the mutation, the
//! pre-reorder snapshot is restored verbatim. On success the view is
//! refreshed from the backend so any server-side renumbering wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use flotilla_domain::error::FlotillaError;
use flotilla_domain::id::{InstanceId, RuleId};
use flotilla_domain::rule::AutomationRule;

use super::rule_service::as_reorder_rolled_back;
use crate::ports::RuleBackend;

#[derive(Debug, Default, Clone)]
struct CachedList {
    rules: Vec<AutomationRule>,
    populated: bool,
    reorder_in_flight: bool,
}

/// Sort rules the way the list renders: by sort order, with the id as the
/// tie-break for equal values.
fn sort_rules(rules: &mut [AutomationRule]) {
    rules.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Rewrite rules to the requested id order, renumbering 1-based. Ids missing
/// from the request keep their relative position at the end of the list.
fn apply_order(rules: &[AutomationRule], ordered_ids: &[RuleId]) -> Vec<AutomationRule> {
    let mut remaining: Vec<AutomationRule> = rules.to_vec();
    let mut reordered = Vec::with_capacity(rules.len());
    for id in ordered_ids {
        if let Some(position) = remaining.iter().position(|rule| rule.id == *id) {
            reordered.push(remaining.remove(position));
        }
    }
    reordered.extend(remaining);
    for (index, rule) in reordered.iter_mut().enumerate() {
        rule.sort_order = i32::try_from(index + 1).unwrap_or(i32::MAX);
    }
    reordered
}

/// Per-instance cached rule views with optimistic reordering.
pub struct RuleListService<B> {
    backend: B,
    cache: Mutex<HashMap<InstanceId, CachedList>>,
}

impl<B: RuleBackend> RuleListService<B> {
    /// Create a new service backed by the given instance backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InstanceId, CachedList>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sorted rules for an instance, fetching from the backend on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the initial fetch fails.
    pub async fn list(&self, instance: InstanceId) -> Result<Vec<AutomationRule>, FlotillaError> {
        {
            let cache = self.lock();
            if let Some(cached) = cache.get(&instance) {
                if cached.populated {
                    return Ok(cached.rules.clone());
                }
            }
        }
        self.refresh(instance).await
    }

    /// Reload an instance's rules from the backend.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the instance.
    pub async fn refresh(
        &self,
        instance: InstanceId,
    ) -> Result<Vec<AutomationRule>, FlotillaError> {
        let mut rules = self.backend.list_rules(instance).await?;
        sort_rules(&mut rules);
        let mut cache = self.lock();
        let cached = cache.entry(instance).or_default();
        cached.rules = rules.clone();
        cached.populated = true;
        Ok(rules)
    }

    /// Drop the cached view, forcing a refetch on next access.
    pub fn invalidate(&self, instance: InstanceId) {
        self.lock().remove(&instance);
    }

    /// Fold a committed rule into the cached view.
    pub fn apply_committed(&self, instance: InstanceId, rule: AutomationRule) {
        let mut cache = self.lock();
        if let Some(cached) = cache.get_mut(&instance) {
            if !cached.populated {
                return;
            }
            match cached.rules.iter_mut().find(|found| found.id == rule.id) {
                Some(existing) => *existing = rule,
                None => cached.rules.push(rule),
            }
            sort_rules(&mut cached.rules);
        }
    }

    /// Remove a deleted rule from the cached view.
    pub fn apply_removed(&self, instance: InstanceId, rule_id: RuleId) {
        let mut cache = self.lock();
        if let Some(cached) = cache.get_mut(&instance) {
            cached.rules.retain(|rule| rule.id != rule_id);
        }
    }

    /// Rewrite a cached rule's enabled flag.
    ///
    /// Used both for the optimistic flip while a destructive preview is
    /// pending and for restoring the prior value when it is cancelled.
    pub fn set_enabled(&self, instance: InstanceId, rule_id: RuleId, enabled: bool) {
        let mut cache = self.lock();
        if let Some(cached) = cache.get_mut(&instance) {
            if let Some(rule) = cached.rules.iter_mut().find(|found| found.id == rule_id) {
                rule.enabled = enabled;
            }
        }
    }

    /// Reorder an instance's rules.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::ReorderInFlight`] while a previous reorder is
    /// unresolved, or [`FlotillaError::ReorderRolledBack`] when the instance
    /// rejects the mutation — the previous view is restored verbatim before
    /// the error is returned.
    #[tracing::instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
    pub async fn reorder(
        &self,
        instance: InstanceId,
        ordered_ids: Vec<RuleId>,
    ) -> Result<Vec<AutomationRule>, FlotillaError> {
        // a rollback needs a populated pre-image
        if !self.lock().get(&instance).is_some_and(|c| c.populated) {
            self.refresh(instance).await?;
        }

        let snapshot = {
            let mut cache = self.lock();
            let cached = cache.entry(instance).or_default();
            if cached.reorder_in_flight {
                return Err(FlotillaError::ReorderInFlight);
            }
            cached.reorder_in_flight = true;
            let snapshot = cached.rules.clone();
            cached.rules = apply_order(&snapshot, &ordered_ids);
            snapshot
        };

        match self.backend.reorder_rules(instance, ordered_ids).await {
            Ok(()) => {
                if let Some(cached) = self.lock().get_mut(&instance) {
                    cached.reorder_in_flight = false;
                }
                self.refresh(instance).await
            }
            Err(err) => {
                {
                    let mut cache = self.lock();
                    let cached = cache.entry(instance).or_default();
                    cached.rules = snapshot;
                    cached.reorder_in_flight = false;
                }
                Err(as_reorder_rolled_back(err))
            }
        }
    }
}
