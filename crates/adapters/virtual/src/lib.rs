//! # flotilla-adapter-virtual
//!
//! Simulated torrent-client instances for testing and demonstration.
//!
//! [`VirtualCluster`] implements both the [`RuleBackend`] and
//! [`TrackerInventory`] ports over an in-memory set of seeded instances. The
//! preview evaluator is a small stand-in for a real engine (tracker scope +
//! `name`/`category`/`tag` condition leaves), which is enough to exercise the
//! preview-gated activation and pagination paths honestly. Failure points can
//! be armed per call site so error paths (preview fetch failures, commit
//! failures, reorder rollback) are testable end to end.
//!
//! ## Dependency rule
//!
//! Depends on `flotilla-app` (port traits) and `flotilla-domain` only.

mod instance;

pub use instance::{VirtualInstance, VirtualTorrent};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_domain::error::{BackendError, FlotillaError, NotFoundError};
use flotilla_domain::id::{CustomizationId, InstanceId, RuleId};
use flotilla_domain::preview::PreviewResult;
use flotilla_domain::rule::{AutomationRule, RulePayload};
use flotilla_domain::tracker::TrackerCustomization;

/// Call sites that can be armed to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Preview,
    Create,
    Update,
    Delete,
    Reorder,
}

#[derive(Default)]
struct ClusterState {
    instances: HashMap<InstanceId, VirtualInstance>,
    customizations: Vec<TrackerCustomization>,
    fail_next: Option<FailurePoint>,
}

/// In-memory cluster of simulated instances.
///
/// Cloning is cheap and shares the underlying state, so one cluster can back
/// several services at once.
#[derive(Clone, Default)]
pub struct VirtualCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl VirtualCluster {
    /// An empty cluster with no instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an instance with the given torrent population.
    pub fn add_instance(&self, name: &str, torrents: Vec<VirtualTorrent>) -> InstanceId {
        let id = InstanceId::new();
        self.lock().instances.insert(
            id,
            VirtualInstance {
                name: name.to_string(),
                torrents,
                rules: Vec::new(),
            },
        );
        id
    }

    /// Replace the operator-defined tracker customizations.
    pub fn set_customizations(&self, customizations: Vec<TrackerCustomization>) {
        self.lock().customizations = customizations;
    }

    /// Arm a failure for the next call hitting `point`.
    pub fn fail_next(&self, point: FailurePoint) {
        self.lock().fail_next = Some(point);
    }

    fn take_failure(
        state: &mut ClusterState,
        point: FailurePoint,
    ) -> Result<(), FlotillaError> {
        if state.fail_next == Some(point) {
            state.fail_next = None;
            return Err(BackendError::new(format!("injected {point:?} failure")).into());
        }
        Ok(())
    }

    fn with_instance<T>(
        &self,
        instance: InstanceId,
        point: Option<FailurePoint>,
        operate: impl FnOnce(&mut VirtualInstance) -> Result<T, FlotillaError>,
    ) -> Result<T, FlotillaError> {
        let mut state = self.lock();
        if let Some(point) = point {
            Self::take_failure(&mut state, point)?;
        }
        let found = state.instances.get_mut(&instance).ok_or(NotFoundError {
            entity: "Instance",
            id: instance.to_string(),
        })?;
        operate(found)
    }

    /// A cluster seeded with one demo instance, returned with its id.
    #[must_use]
    pub fn demo(instance_name: &str) -> (Self, InstanceId) {
        let cluster = Self::new();
        cluster.set_customizations(vec![TrackerCustomization {
            id: CustomizationId::new(),
            display_name: "Bitvault".to_string(),
            domains: vec![
                "tracker.bitvault.cc".to_string(),
                "bv-announce.net".to_string(),
            ],
        }]);

        let days_ago = |days: i64| flotilla_domain::time::now() - chrono::Duration::days(days);
        let mut torrents = vec![
            VirtualTorrent::new("1b4e", "debian-12.7.0-amd64-DVD-1.iso", "linux-iso.example")
                .category("iso")
                .tags(["keep"]),
            VirtualTorrent::new("9f21", "ubuntu-24.04.1-live-server.iso", "linux-iso.example")
                .category("iso"),
            VirtualTorrent::new("77ac", "grand.budapest.2014.1080p", "tracker.bitvault.cc")
                .category("movies")
                .content_group("gb-2014"),
            VirtualTorrent::new("d052", "grand.budapest.2014.1080p", "bv-announce.net")
                .category("movies")
                .content_group("gb-2014"),
            VirtualTorrent::new("3e88", "stalled-upload-001", "archive.example"),
            VirtualTorrent::new("5c19", "stalled-upload-002", "archive.example"),
        ];
        for (index, torrent) in torrents.iter_mut().enumerate() {
            torrent.added_at = days_ago(i64::try_from(index).unwrap_or(0));
        }

        let instance = cluster.add_instance(instance_name, torrents);
        (cluster, instance)
    }
}

impl RuleBackend for VirtualCluster {
    async fn list_rules(
        &self,
        instance: InstanceId,
    ) -> Result<Vec<AutomationRule>, FlotillaError> {
        self.with_instance(instance, None, |found| Ok(found.rules.clone()))
    }

    async fn create_rule(
        &self,
        instance: InstanceId,
        payload: RulePayload,
    ) -> Result<AutomationRule, FlotillaError> {
        self.with_instance(instance, Some(FailurePoint::Create), |found| {
            let rule = payload.into_rule(RuleId::new(), found.next_sort_order());
            found.rules.push(rule.clone());
            Ok(rule)
        })
    }

    async fn update_rule(
        &self,
        instance: InstanceId,
        rule: RuleId,
        payload: RulePayload,
    ) -> Result<AutomationRule, FlotillaError> {
        self.with_instance(instance, Some(FailurePoint::Update), |found| {
            let existing = found
                .rules
                .iter_mut()
                .find(|candidate| candidate.id == rule)
                .ok_or(NotFoundError {
                    entity: "Rule",
                    id: rule.to_string(),
                })?;
            let sort_order = existing.sort_order;
            *existing = payload.into_rule(rule, sort_order);
            Ok(existing.clone())
        })
    }

    async fn delete_rule(&self, instance: InstanceId, rule: RuleId) -> Result<(), FlotillaError> {
        self.with_instance(instance, Some(FailurePoint::Delete), |found| {
            let before = found.rules.len();
            found.rules.retain(|candidate| candidate.id != rule);
            if found.rules.len() == before {
                return Err(NotFoundError {
                    entity: "Rule",
                    id: rule.to_string(),
                }
                .into());
            }
            Ok(())
        })
    }

    async fn reorder_rules(
        &self,
        instance: InstanceId,
        ordered: Vec<RuleId>,
    ) -> Result<(), FlotillaError> {
        self.with_instance(instance, Some(FailurePoint::Reorder), |found| {
            let mut remaining = std::mem::take(&mut found.rules);
            let mut reordered = Vec::with_capacity(remaining.len());
            for id in &ordered {
                if let Some(position) = remaining.iter().position(|rule| rule.id == *id) {
                    reordered.push(remaining.remove(position));
                }
            }
            reordered.extend(remaining);
            for (index, rule) in reordered.iter_mut().enumerate() {
                rule.sort_order = i32::try_from(index + 1).unwrap_or(i32::MAX);
            }
            found.rules = reordered;
            Ok(())
        })
    }

    async fn preview_rule(
        &self,
        instance: InstanceId,
        payload: RulePayload,
        limit: u32,
        offset: u64,
    ) -> Result<PreviewResult, FlotillaError> {
        self.with_instance(instance, Some(FailurePoint::Preview), |found| {
            Ok(found.evaluate(&payload, limit, offset))
        })
    }
}

impl TrackerInventory for VirtualCluster {
    async fn list_customizations(&self) -> Result<Vec<TrackerCustomization>, FlotillaError> {
        Ok(self.lock().customizations.clone())
    }

    async fn list_instance_domains(
        &self,
        instance: InstanceId,
    ) -> Result<Vec<String>, FlotillaError> {
        self.with_instance(instance, None, |found| Ok(found.tracker_domains()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_domain::rule::{DeleteMode, RuleAction};

    fn payload(name: &str) -> RulePayload {
        AutomationRule::builder()
            .name(name)
            .action(RuleAction::Pause)
            .build()
            .unwrap()
            .to_payload()
    }

    fn cluster_with_instance() -> (VirtualCluster, InstanceId) {
        let cluster = VirtualCluster::new();
        let instance = cluster.add_instance(
            "test",
            vec![
                VirtualTorrent::new("aaa", "one", "a.example"),
                VirtualTorrent::new("bbb", "two", "b.example"),
            ],
        );
        (cluster, instance)
    }

    #[tokio::test]
    async fn should_assign_increasing_sort_orders_on_create() {
        let (cluster, instance) = cluster_with_instance();
        let first = cluster.create_rule(instance, payload("one")).await.unwrap();
        let second = cluster.create_rule(instance, payload("two")).await.unwrap();
        assert_eq!(first.sort_order, 1);
        assert_eq!(second.sort_order, 2);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_instance() {
        let cluster = VirtualCluster::new();
        let result = cluster.list_rules(InstanceId::new()).await;
        assert!(matches!(result, Err(FlotillaError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing_rule() {
        let (cluster, instance) = cluster_with_instance();
        let result = cluster
            .update_rule(instance, RuleId::new(), payload("x"))
            .await;
        assert!(matches!(result, Err(FlotillaError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_preserve_sort_order_on_update() {
        let (cluster, instance) = cluster_with_instance();
        cluster.create_rule(instance, payload("one")).await.unwrap();
        let second = cluster.create_rule(instance, payload("two")).await.unwrap();

        let updated = cluster
            .update_rule(instance, second.id, payload("renamed"))
            .await
            .unwrap();
        assert_eq!(updated.sort_order, 2);
        assert_eq!(updated.name, "renamed");
    }

    #[tokio::test]
    async fn should_renumber_rules_on_reorder() {
        let (cluster, instance) = cluster_with_instance();
        let a = cluster.create_rule(instance, payload("a")).await.unwrap();
        let b = cluster.create_rule(instance, payload("b")).await.unwrap();
        let c = cluster.create_rule(instance, payload("c")).await.unwrap();

        cluster
            .reorder_rules(instance, vec![c.id, a.id, b.id])
            .await
            .unwrap();
        let rules = cluster.list_rules(instance).await.unwrap();
        let names: Vec<&str> = rules.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        let orders: Vec<i32> = rules.iter().map(|rule| rule.sort_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn should_fail_once_when_failure_point_armed() {
        let (cluster, instance) = cluster_with_instance();
        cluster.fail_next(FailurePoint::Create);

        let failed = cluster.create_rule(instance, payload("x")).await;
        assert!(matches!(failed, Err(FlotillaError::Backend(_))));

        // the failure is consumed; the next call succeeds
        let created = cluster.create_rule(instance, payload("x")).await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn should_not_trip_unrelated_failure_points() {
        let (cluster, instance) = cluster_with_instance();
        cluster.fail_next(FailurePoint::Reorder);

        let created = cluster.create_rule(instance, payload("x")).await;
        assert!(created.is_ok());

        let reorder = cluster.reorder_rules(instance, vec![]).await;
        assert!(matches!(reorder, Err(FlotillaError::Backend(_))));
    }

    #[tokio::test]
    async fn should_delete_rule_and_reject_double_delete() {
        let (cluster, instance) = cluster_with_instance();
        let created = cluster.create_rule(instance, payload("x")).await.unwrap();

        cluster.delete_rule(instance, created.id).await.unwrap();
        let again = cluster.delete_rule(instance, created.id).await;
        assert!(matches!(again, Err(FlotillaError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_list_instance_domains_from_torrents() {
        let (cluster, instance) = cluster_with_instance();
        let domains = cluster.list_instance_domains(instance).await.unwrap();
        assert_eq!(domains, vec!["a.example", "b.example"]);
    }

    #[tokio::test]
    async fn should_seed_demo_instance_with_cross_seeded_torrents() {
        let (cluster, instance) = VirtualCluster::demo("demo");
        let domains = cluster.list_instance_domains(instance).await.unwrap();
        assert!(domains.contains(&"tracker.bitvault.cc".to_string()));

        let customizations = cluster.list_customizations().await.unwrap();
        assert_eq!(customizations.len(), 1);
        assert_eq!(customizations[0].display_name, "Bitvault");

        let mut category_payload = AutomationRule::builder()
            .name("Sort films")
            .action(RuleAction::Category {
                category: "films".to_string(),
                include_cross_seeds: true,
            })
            .build()
            .unwrap()
            .to_payload();
        category_payload.enabled = true;
        let preview = cluster
            .preview_rule(instance, category_payload, 25, 0)
            .await
            .unwrap();
        assert_eq!(preview.total_matches, 6);
        assert_eq!(preview.cross_seed_count, Some(2));
    }

    #[tokio::test]
    async fn should_evaluate_delete_preview_against_tracker_scope() {
        let (cluster, instance) = VirtualCluster::demo("demo");
        let mut scoped = AutomationRule::builder()
            .name("Purge bitvault")
            .tracker_domains(["tracker.bitvault.cc", "bv-announce.net"])
            .action(RuleAction::Delete {
                mode: DeleteMode::WithFilesPreserveCrossSeeds,
            })
            .build()
            .unwrap()
            .to_payload();
        scoped.enabled = true;
        let preview = cluster.preview_rule(instance, scoped, 25, 0).await.unwrap();
        assert_eq!(preview.total_matches, 2);
    }
}
