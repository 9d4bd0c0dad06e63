//! Rule service — validated CRUD use-cases for automation rules.

use flotilla_domain::error::{FlotillaError, NotFoundError};
use flotilla_domain::id::{InstanceId, RuleId};
use flotilla_domain::rule::{AutomationRule, RulePayload};

use crate::ports::RuleBackend;

/// Reclassify a raw backend failure as a commit failure; everything else
/// passes through untouched.
pub(crate) fn as_commit(err: FlotillaError) -> FlotillaError {
    match err {
        FlotillaError::Backend(backend) => FlotillaError::Commit(backend),
        other => other,
    }
}

/// Reclassify a raw backend failure as a preview-fetch failure.
pub(crate) fn as_preview_fetch(err: FlotillaError) -> FlotillaError {
    match err {
        FlotillaError::Backend(backend) => FlotillaError::PreviewFetch(backend),
        other => other,
    }
}

/// Reclassify a raw backend failure as a rolled-back reorder.
pub(crate) fn as_reorder_rolled_back(err: FlotillaError) -> FlotillaError {
    match err {
        FlotillaError::Backend(backend) => FlotillaError::ReorderRolledBack(backend),
        other => other,
    }
}

/// Application service for rule CRUD operations on a managed instance.
///
/// Enabling destructive rules goes through
/// [`ActivationWorkflow`](crate::services::activation::ActivationWorkflow)
/// instead; this service is the plain, ungated path.
pub struct RuleService<B> {
    backend: B,
}

impl<B: RuleBackend> RuleService<B> {
    /// Create a new service backed by the given instance backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// List all rules of an instance.
    ///
    /// # Errors
    ///
    /// Returns a backend error propagated from the instance.
    pub async fn list(&self, instance: InstanceId) -> Result<Vec<AutomationRule>, FlotillaError> {
        self.backend.list_rules(instance).await
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::NotFound`] when no rule with `rule_id`
    /// exists, or a backend error from the instance.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &self,
        instance: InstanceId,
        rule_id: RuleId,
    ) -> Result<AutomationRule, FlotillaError> {
        let rules = self.backend.list_rules(instance).await?;
        rules
            .into_iter()
            .find(|rule| rule.id == rule_id)
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Rule",
                    id: rule_id.to_string(),
                }
                .into()
            })
    }

    /// Create a new rule after validating payload invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] if invariants fail, or
    /// [`FlotillaError::Commit`] when the instance rejects the mutation.
    #[tracing::instrument(skip(self, payload), fields(rule_name = %payload.name))]
    pub async fn create(
        &self,
        instance: InstanceId,
        payload: RulePayload,
    ) -> Result<AutomationRule, FlotillaError> {
        payload.validate()?;
        self.backend
            .create_rule(instance, payload)
            .await
            .map_err(as_commit)
    }

    /// Update an existing rule.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] if invariants fail, or
    /// [`FlotillaError::Commit`] when the instance rejects the mutation.
    #[tracing::instrument(skip(self, payload))]
    pub async fn update(
        &self,
        instance: InstanceId,
        rule_id: RuleId,
        payload: RulePayload,
    ) -> Result<AutomationRule, FlotillaError> {
        payload.validate()?;
        self.backend
            .update_rule(instance, rule_id, payload)
            .await
            .map_err(as_commit)
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Commit`] when the instance rejects the
    /// mutation.
    #[tracing::instrument(skip(self))]
    pub async fn delete(
        &self,
        instance: InstanceId,
        rule_id: RuleId,
    ) -> Result<(), FlotillaError> {
        self.backend
            .delete_rule(instance, rule_id)
            .await
            .map_err(as_commit)
    }

    /// Copy a rule into `target_instance` as a new, independent rule.
    ///
    /// The copy always lands disabled: a destructive copy must pass back
    /// through the preview gate before it can act.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::NotFound`] when the source rule does not
    /// exist, or [`FlotillaError::Commit`] when the create is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn duplicate(
        &self,
        instance: InstanceId,
        rule_id: RuleId,
        target_instance: InstanceId,
    ) -> Result<AutomationRule, FlotillaError> {
        let source = self.get(instance, rule_id).await?;
        let mut payload = source.to_payload();
        payload.enabled = false;
        self.backend
            .create_rule(target_instance, payload)
            .await
            .map_err(as_commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_domain::error::BackendError;
    use flotilla_domain::preview::PreviewResult;
    use flotilla_domain::rule::{DeleteMode, RuleAction};
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryBackend {
        store: Mutex<HashMap<InstanceId, Vec<AutomationRule>>>,
        fail_mutations: Mutex<bool>,
    }

    impl InMemoryBackend {
        fn with(instance: InstanceId, rules: Vec<AutomationRule>) -> Self {
            let backend = Self::default();
            backend.store.lock().unwrap().insert(instance, rules);
            backend
        }

        fn check_failure(&self) -> Result<(), FlotillaError> {
            if *self.fail_mutations.lock().unwrap() {
                return Err(BackendError::new("injected failure").into());
            }
            Ok(())
        }
    }

    impl RuleBackend for InMemoryBackend {
        fn list_rules(
            &self,
            instance: InstanceId,
        ) -> impl Future<Output = Result<Vec<AutomationRule>, FlotillaError>> + Send {
            let rules = self
                .store
                .lock()
                .unwrap()
                .get(&instance)
                .cloned()
                .unwrap_or_default();
            async { Ok(rules) }
        }

        fn create_rule(
            &self,
            instance: InstanceId,
            payload: RulePayload,
        ) -> impl Future<Output = Result<AutomationRule, FlotillaError>> + Send {
            let result = self.check_failure().map(|()| {
                let mut store = self.store.lock().unwrap();
                let rules = store.entry(instance).or_default();
                let sort_order = i32::try_from(rules.len()).unwrap_or(i32::MAX) + 1;
                let rule = payload.into_rule(RuleId::new(), sort_order);
                rules.push(rule.clone());
                rule
            });
            async { result }
        }

        fn update_rule(
            &self,
            instance: InstanceId,
            rule: RuleId,
            payload: RulePayload,
        ) -> impl Future<Output = Result<AutomationRule, FlotillaError>> + Send {
            let result = self.check_failure().and_then(|()| {
                let mut store = self.store.lock().unwrap();
                let rules = store.entry(instance).or_default();
                let existing = rules
                    .iter_mut()
                    .find(|found| found.id == rule)
                    .ok_or_else(|| {
                        FlotillaError::from(NotFoundError {
                            entity: "Rule",
                            id: rule.to_string(),
                        })
                    })?;
                *existing = payload.into_rule(rule, existing.sort_order);
                Ok(existing.clone())
            });
            async { result }
        }

        fn delete_rule(
            &self,
            instance: InstanceId,
            rule: RuleId,
        ) -> impl Future<Output = Result<(), FlotillaError>> + Send {
            let result = self.check_failure().map(|()| {
                let mut store = self.store.lock().unwrap();
                store.entry(instance).or_default().retain(|r| r.id != rule);
            });
            async { result }
        }

        fn reorder_rules(
            &self,
            _instance: InstanceId,
            _ordered: Vec<RuleId>,
        ) -> impl Future<Output = Result<(), FlotillaError>> + Send {
            async { Ok(()) }
        }

        fn preview_rule(
            &self,
            _instance: InstanceId,
            _payload: RulePayload,
            _limit: u32,
            _offset: u64,
        ) -> impl Future<Output = Result<PreviewResult, FlotillaError>> + Send {
            async { Ok(PreviewResult::default()) }
        }
    }

    fn valid_payload(name: &str) -> RulePayload {
        AutomationRule::builder()
            .name(name)
            .action(RuleAction::Pause)
            .build()
            .unwrap()
            .to_payload()
    }

    #[tokio::test]
    async fn should_create_rule_when_payload_valid() {
        let instance = InstanceId::new();
        let service = RuleService::new(InMemoryBackend::default());

        let created = service
            .create(instance, valid_payload("Pause all"))
            .await
            .unwrap();
        assert_eq!(created.name, "Pause all");

        let fetched = service.get(instance, created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn should_reject_create_when_name_is_empty() {
        let service = RuleService::new(InMemoryBackend::default());
        let mut payload = valid_payload("x");
        payload.name.clear();

        let result = service.create(InstanceId::new(), payload).await;
        assert!(matches!(result, Err(FlotillaError::Validation(_))));
    }

    #[tokio::test]
    async fn should_return_not_found_when_rule_missing() {
        let service = RuleService::new(InMemoryBackend::default());
        let result = service.get(InstanceId::new(), RuleId::new()).await;
        assert!(matches!(result, Err(FlotillaError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_classify_backend_failure_as_commit_error() {
        let backend = InMemoryBackend::default();
        *backend.fail_mutations.lock().unwrap() = true;
        let service = RuleService::new(backend);

        let result = service.create(InstanceId::new(), valid_payload("x")).await;
        assert!(matches!(result, Err(FlotillaError::Commit(_))));
    }

    #[tokio::test]
    async fn should_update_rule_content() {
        let instance = InstanceId::new();
        let service = RuleService::new(InMemoryBackend::default());
        let created = service
            .create(instance, valid_payload("Before"))
            .await
            .unwrap();

        let updated = service
            .update(instance, created.id, valid_payload("After"))
            .await
            .unwrap();
        assert_eq!(updated.name, "After");
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn should_delete_rule() {
        let instance = InstanceId::new();
        let service = RuleService::new(InMemoryBackend::default());
        let created = service.create(instance, valid_payload("Gone")).await.unwrap();

        service.delete(instance, created.id).await.unwrap();
        let result = service.get(instance, created.id).await;
        assert!(matches!(result, Err(FlotillaError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_duplicate_rule_disabled_with_fresh_identity() {
        let instance = InstanceId::new();
        let target = InstanceId::new();
        let source = AutomationRule::builder()
            .name("Purge old")
            .action(RuleAction::Delete {
                mode: DeleteMode::WithFiles,
            })
            .enabled(true)
            .build()
            .unwrap();
        let source_id = source.id;
        let service = RuleService::new(InMemoryBackend::with(instance, vec![source]));

        let copy = service.duplicate(instance, source_id, target).await.unwrap();
        assert_ne!(copy.id, source_id);
        assert!(!copy.enabled);
        assert_eq!(copy.name, "Purge old");

        let listed = service.list(target).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
