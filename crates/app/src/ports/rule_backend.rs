//! Rule backend port — the managed instance's rule API.

use std::future::Future;

use flotilla_domain::error::FlotillaError;
use flotilla_domain::id::{InstanceId, RuleId};
use flotilla_domain::preview::PreviewResult;
use flotilla_domain::rule::{AutomationRule, RulePayload};

/// Rule operations served by a managed torrent-client instance.
///
/// Implementations translate these calls into whatever transport the
/// instance speaks. Transport failures surface as
/// [`FlotillaError::Backend`](flotilla_domain::error::FlotillaError::Backend);
/// the use-case layer reclassifies them by context.
pub trait RuleBackend {
    /// List every rule owned by the instance.
    fn list_rules(
        &self,
        instance: InstanceId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, FlotillaError>> + Send;

    /// Create a new rule from a payload.
    fn create_rule(
        &self,
        instance: InstanceId,
        payload: RulePayload,
    ) -> impl Future<Output = Result<AutomationRule, FlotillaError>> + Send;

    /// Replace an existing rule's content.
    fn update_rule(
        &self,
        instance: InstanceId,
        rule: RuleId,
        payload: RulePayload,
    ) -> impl Future<Output = Result<AutomationRule, FlotillaError>> + Send;

    /// Delete a rule.
    fn delete_rule(
        &self,
        instance: InstanceId,
        rule: RuleId,
    ) -> impl Future<Output = Result<(), FlotillaError>> + Send;

    /// Persist a new rule ordering for the whole instance.
    fn reorder_rules(
        &self,
        instance: InstanceId,
        ordered: Vec<RuleId>,
    ) -> impl Future<Output = Result<(), FlotillaError>> + Send;

    /// Trial-evaluate a candidate rule without persisting anything.
    ///
    /// Returns up to `limit` example rows starting at `offset`, plus the
    /// authoritative total match count at evaluation time.
    fn preview_rule(
        &self,
        instance: InstanceId,
        payload: RulePayload,
        limit: u32,
        offset: u64,
    ) -> impl Future<Output = Result<PreviewResult, FlotillaError>> + Send;
}
