//! Automation rules — tracker-scoped, condition-gated, single-action rules
//! owned by a managed torrent-client instance.
//!
//! A rule matches torrents by tracker scope (a wildcard or an explicit domain
//! list) plus an optional [`RuleCondition`] tree, and applies exactly one
//! [`RuleAction`] to them. Rules are ordered within their instance by
//! `sort_order`.

mod action;
mod condition;

pub use action::{
    ActionKind, ActionSlots, CategoryParams, DeleteMode, DeleteParams, ExternalProgramParams,
    MoveParams, NoParams, RuleAction, SCHEMA_VERSION, ShareLimitsParams, Slot, SpeedLimitsParams,
    TagMode, TagParams,
};
pub use condition::{LogicalOp, RuleCondition};

use serde::{Deserialize, Serialize};

use crate::error::{FlotillaError, ValidationError};
use crate::id::RuleId;

/// The literal tracker pattern meaning "match every tracker".
pub const TRACKER_WILDCARD: &str = "*";

/// Derive the pattern for a domain list: the wildcard when empty, the
/// comma-joined list otherwise.
#[must_use]
pub fn tracker_pattern_for(domains: &[String]) -> String {
    if domains.is_empty() {
        TRACKER_WILDCARD.to_string()
    } else {
        domains.join(",")
    }
}

/// An automation rule as persisted by a managed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: RuleId,
    pub name: String,
    /// Derived from `tracker_domains`; never edited directly.
    pub tracker_pattern: String,
    /// Ordered raw tracker domains; empty iff the rule applies to all
    /// trackers.
    pub tracker_domains: Vec<String>,
    pub enabled: bool,
    /// Ordering key, unique within the owning instance.
    pub sort_order: i32,
    pub conditions: ActionSlots,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `tracker_pattern` is not derivable from `tracker_domains`
    ///   ([`ValidationError::InconsistentTrackerPattern`])
    pub fn validate(&self) -> Result<(), FlotillaError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.tracker_pattern != tracker_pattern_for(&self.tracker_domains) {
            return Err(ValidationError::InconsistentTrackerPattern.into());
        }
        Ok(())
    }

    /// Whether the rule applies to every tracker.
    #[must_use]
    pub fn applies_to_all_trackers(&self) -> bool {
        self.tracker_domains.is_empty()
    }

    /// The rule's active action and its condition, if any slot is enabled.
    #[must_use]
    pub fn active_action(&self) -> Option<(RuleAction, Option<RuleCondition>)> {
        self.conditions.active()
    }

    /// A payload carrying this rule's content, for re-submission or copying.
    #[must_use]
    pub fn to_payload(&self) -> RulePayload {
        RulePayload {
            name: self.name.clone(),
            enabled: self.enabled,
            tracker_pattern: self.tracker_pattern.clone(),
            tracker_domains: self.tracker_domains.clone(),
            conditions: self.conditions.clone(),
        }
    }
}

/// Create/update wire body: a rule without identity or ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub name: String,
    pub enabled: bool,
    pub tracker_pattern: String,
    pub tracker_domains: Vec<String>,
    pub conditions: ActionSlots,
}

impl RulePayload {
    /// Check payload invariants (same rules as [`AutomationRule::validate`]).
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] on an empty name or an
    /// inconsistent tracker pattern.
    pub fn validate(&self) -> Result<(), FlotillaError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.tracker_pattern != tracker_pattern_for(&self.tracker_domains) {
            return Err(ValidationError::InconsistentTrackerPattern.into());
        }
        Ok(())
    }

    /// Kind of the payload's active action, if any slot is enabled.
    #[must_use]
    pub fn action_kind(&self) -> Option<ActionKind> {
        self.conditions.active_kind()
    }

    /// Whether enabling this payload requires a confirmed preview.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.action_kind().is_some_and(ActionKind::is_destructive)
    }

    /// Materialize the payload into a rule with the given identity and
    /// ordering (backend-side helper).
    #[must_use]
    pub fn into_rule(self, id: RuleId, sort_order: i32) -> AutomationRule {
        AutomationRule {
            id,
            name: self.name,
            tracker_pattern: self.tracker_pattern,
            tracker_domains: self.tracker_domains,
            enabled: self.enabled,
            sort_order,
            conditions: self.conditions,
        }
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    enabled: Option<bool>,
    sort_order: Option<i32>,
    tracker_domains: Vec<String>,
    action: Option<RuleAction>,
    condition: Option<RuleCondition>,
    slots: Option<ActionSlots>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Scope the rule to these raw tracker domains. Not calling this (or
    /// passing an empty list) leaves the rule applying to all trackers.
    #[must_use]
    pub fn tracker_domains<D>(mut self, domains: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        self.tracker_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn action(mut self, action: RuleAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: RuleCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Use a pre-built action container instead of `action`/`condition`.
    #[must_use]
    pub fn slots(mut self, slots: ActionSlots) -> Self {
        self.slots = Some(slots);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// A builder without an action produces a rule whose container has no
    /// enabled slot; such rules can exist on the wire and decode to the inert
    /// form default.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] if required fields are missing
    /// or empty.
    pub fn build(self) -> Result<AutomationRule, FlotillaError> {
        let conditions = match (self.slots, self.action) {
            (Some(slots), _) => slots,
            (None, Some(action)) => ActionSlots::single(action, self.condition),
            (None, None) => ActionSlots::default(),
        };
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            tracker_pattern: tracker_pattern_for(&self.tracker_domains),
            tracker_domains: self.tracker_domains,
            enabled: self.enabled.unwrap_or(true),
            sort_order: self.sort_order.unwrap_or(0),
            conditions,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rule() -> AutomationRule {
        AutomationRule::builder()
            .name("Pause stalled freeleech")
            .tracker_domains(["tracker.example.org"])
            .action(RuleAction::Pause)
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_rule_when_required_fields_provided() {
        let rule = valid_rule();
        assert_eq!(rule.name, "Pause stalled freeleech");
        assert!(rule.enabled);
        assert_eq!(rule.tracker_pattern, "tracker.example.org");
        assert_eq!(rule.conditions.active_kind(), Some(ActionKind::Pause));
    }

    #[test]
    fn should_derive_wildcard_pattern_when_no_domains_given() {
        let rule = AutomationRule::builder()
            .name("Everything")
            .action(RuleAction::Recheck)
            .build()
            .unwrap();
        assert_eq!(rule.tracker_pattern, TRACKER_WILDCARD);
        assert!(rule.tracker_domains.is_empty());
        assert!(rule.applies_to_all_trackers());
    }

    #[test]
    fn should_derive_joined_pattern_from_domain_list() {
        let rule = AutomationRule::builder()
            .name("Two trackers")
            .tracker_domains(["a.example", "b.example"])
            .action(RuleAction::Resume)
            .build()
            .unwrap();
        assert_eq!(rule.tracker_pattern, "a.example,b.example");
        assert!(!rule.applies_to_all_trackers());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = AutomationRule::builder().action(RuleAction::Pause).build();
        assert!(matches!(
            result,
            Err(FlotillaError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_inconsistent_tracker_pattern() {
        let mut rule = valid_rule();
        rule.tracker_pattern = TRACKER_WILDCARD.to_string();
        assert!(matches!(
            rule.validate(),
            Err(FlotillaError::Validation(
                ValidationError::InconsistentTrackerPattern
            ))
        ));
    }

    #[test]
    fn should_build_rule_without_action_as_empty_container() {
        let rule = AutomationRule::builder().name("Inert").build().unwrap();
        assert!(rule.active_action().is_none());
    }

    #[test]
    fn should_roundtrip_rule_through_serde_json() {
        let rule = valid_rule();
        let json = serde_json::to_string(&rule).unwrap();
        let parsed: AutomationRule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn should_carry_rule_content_into_payload() {
        let rule = valid_rule();
        let payload = rule.to_payload();
        assert_eq!(payload.name, rule.name);
        assert_eq!(payload.tracker_pattern, rule.tracker_pattern);
        assert_eq!(payload.conditions, rule.conditions);
    }

    #[test]
    fn should_classify_destructive_payloads() {
        let delete = RulePayload {
            name: "Purge".to_string(),
            enabled: true,
            tracker_pattern: TRACKER_WILDCARD.to_string(),
            tracker_domains: vec![],
            conditions: ActionSlots::single(
                RuleAction::Delete {
                    mode: DeleteMode::Torrent,
                },
                None,
            ),
        };
        assert!(delete.is_destructive());

        let pause = RulePayload {
            conditions: ActionSlots::single(RuleAction::Pause, None),
            ..delete.clone()
        };
        assert!(!pause.is_destructive());
    }

    #[test]
    fn should_materialize_payload_into_rule() {
        let payload = valid_rule().to_payload();
        let id = RuleId::new();
        let rule = payload.clone().into_rule(id, 7);
        assert_eq!(rule.id, id);
        assert_eq!(rule.sort_order, 7);
        assert_eq!(rule.name, payload.name);
    }

    #[test]
    fn should_reject_payload_with_inconsistent_pattern() {
        let mut payload = valid_rule().to_payload();
        payload.tracker_domains.clear();
        assert!(matches!(
            payload.validate(),
            Err(FlotillaError::Validation(
                ValidationError::InconsistentTrackerPattern
            ))
        ));
    }
}
