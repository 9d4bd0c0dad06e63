//! The editable rule form — a flat projection of a rule that encodes to and
//! decodes from the persisted shape.
//!
//! The form is what editing surfaces bind to: one selected action type, one
//! condition tree, a tracker selection held as resolver option values, and
//! flat parameter fields for every action type. Encoding produces a
//! [`RulePayload`] with exactly one enabled action slot; decoding reverses it,
//! including tracker rehydration through a [`TrackerIndex`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rule::{
    ActionKind, ActionSlots, AutomationRule, DeleteMode, RuleAction, RuleCondition, RulePayload,
    TagMode, tracker_pattern_for,
};
use crate::tracker::TrackerIndex;

/// Flat editable form state for creating or editing a rule.
///
/// `tracker_values` holds option values from the tracker resolver: raw
/// domains, or comma-joined customization domain lists. Parameter fields for
/// actions other than the selected one are kept at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleForm {
    pub name: String,
    pub enabled: bool,
    pub apply_to_all_trackers: bool,
    pub tracker_values: Vec<String>,
    pub action_kind: ActionKind,
    pub condition: Option<RuleCondition>,

    pub upload_kib: Option<u64>,
    pub download_kib: Option<u64>,
    pub ratio: Option<f64>,
    pub seeding_minutes: Option<u64>,
    pub delete_mode: DeleteMode,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
    pub category: Option<String>,
    pub include_cross_seeds: bool,
    pub destination: Option<String>,
    pub command: Option<String>,
}

impl Default for RuleForm {
    /// A fresh create form: enabled, scoped to all trackers, with the inert
    /// pause action selected.
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            apply_to_all_trackers: true,
            tracker_values: Vec::new(),
            action_kind: ActionKind::Pause,
            condition: None,
            upload_kib: None,
            download_kib: None,
            ratio: None,
            seeding_minutes: None,
            delete_mode: DeleteMode::default(),
            tags: Vec::new(),
            tag_mode: TagMode::default(),
            category: None,
            include_cross_seeds: false,
            destination: None,
            command: None,
        }
    }
}

impl RuleForm {
    /// Decode a persisted rule into form state.
    ///
    /// The active action is the first enabled slot in scan order; a rule with
    /// no enabled slot decodes to the inert pause default. Tracker domains are
    /// rehydrated into merged option values through `index`.
    #[must_use]
    pub fn from_rule(rule: &AutomationRule, index: &TrackerIndex) -> Self {
        let mut form = Self {
            name: rule.name.clone(),
            enabled: rule.enabled,
            apply_to_all_trackers: rule.applies_to_all_trackers(),
            ..Self::default()
        };
        if !form.apply_to_all_trackers {
            form.tracker_values = index.map_domains_to_values(&rule.tracker_domains);
        }
        if let Some((action, condition)) = rule.active_action() {
            form.condition = condition;
            form.load_action(action);
        }
        form
    }

    fn load_action(&mut self, action: RuleAction) {
        self.action_kind = action.kind();
        match action {
            RuleAction::SpeedLimits {
                upload_kib,
                download_kib,
            } => {
                self.upload_kib = upload_kib;
                self.download_kib = download_kib;
            }
            RuleAction::ShareLimits {
                ratio,
                seeding_minutes,
            } => {
                self.ratio = ratio;
                self.seeding_minutes = seeding_minutes;
            }
            RuleAction::Pause
            | RuleAction::Resume
            | RuleAction::Recheck
            | RuleAction::Reannounce => {}
            RuleAction::Delete { mode } => self.delete_mode = mode,
            RuleAction::Tag { tags, mode } => {
                self.tags = tags;
                self.tag_mode = mode;
            }
            RuleAction::Category {
                category,
                include_cross_seeds,
            } => {
                self.category = Some(category);
                self.include_cross_seeds = include_cross_seeds;
            }
            RuleAction::Move { destination } => self.destination = Some(destination),
            RuleAction::ExternalProgram { command } => self.command = Some(command),
        }
    }

    /// Switch the selected action type.
    ///
    /// When composing a new rule (not editing a persisted one), switching to
    /// delete clears `enabled` so a destructive rule never starts life armed.
    pub fn select_action(&mut self, kind: ActionKind, editing_existing: bool) {
        self.action_kind = kind;
        if kind == ActionKind::Delete && !editing_existing {
            self.enabled = false;
        }
    }

    /// The action value the current form state describes.
    #[must_use]
    pub fn action(&self) -> RuleAction {
        match self.action_kind {
            ActionKind::SpeedLimits => RuleAction::SpeedLimits {
                upload_kib: self.upload_kib,
                download_kib: self.download_kib,
            },
            ActionKind::ShareLimits => RuleAction::ShareLimits {
                ratio: self.ratio,
                seeding_minutes: self.seeding_minutes,
            },
            ActionKind::Pause => RuleAction::Pause,
            ActionKind::Resume => RuleAction::Resume,
            ActionKind::Recheck => RuleAction::Recheck,
            ActionKind::Reannounce => RuleAction::Reannounce,
            ActionKind::Delete => RuleAction::Delete {
                mode: self.delete_mode,
            },
            ActionKind::Tag => RuleAction::Tag {
                tags: self.tags.clone(),
                mode: self.tag_mode,
            },
            ActionKind::Category => RuleAction::Category {
                category: self.category.clone().unwrap_or_default(),
                include_cross_seeds: self.include_cross_seeds,
            },
            ActionKind::Move => RuleAction::Move {
                destination: self.destination.clone().unwrap_or_default(),
            },
            ActionKind::ExternalProgram => RuleAction::ExternalProgram {
                command: self.command.clone().unwrap_or_default(),
            },
        }
    }

    /// Raw domains from the selected option values: merged values split on
    /// commas, trimmed, blanks dropped.
    #[must_use]
    pub fn selected_domains(&self) -> Vec<String> {
        self.tracker_values
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Check the form before any mutation is attempted.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: empty name, empty tracker selection
    /// on a tracker-scoped rule, or missing parameters for the selected
    /// action.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.apply_to_all_trackers && self.selected_domains().is_empty() {
            return Err(ValidationError::NoTrackersSelected);
        }
        match self.action_kind {
            ActionKind::SpeedLimits
                if self.upload_kib.is_none() && self.download_kib.is_none() =>
            {
                Err(ValidationError::NoSpeedLimit)
            }
            ActionKind::ShareLimits
                if self.ratio.is_none() && self.seeding_minutes.is_none() =>
            {
                Err(ValidationError::NoShareLimit)
            }
            ActionKind::Tag if self.tags.is_empty() => Err(ValidationError::NoTags),
            ActionKind::Category
                if self
                    .category
                    .as_deref()
                    .is_none_or(|category| category.trim().is_empty()) =>
            {
                Err(ValidationError::NoCategory)
            }
            ActionKind::Move
                if self
                    .destination
                    .as_deref()
                    .is_none_or(|destination| destination.trim().is_empty()) =>
            {
                Err(ValidationError::EmptyDestination)
            }
            ActionKind::ExternalProgram
                if self
                    .command
                    .as_deref()
                    .is_none_or(|command| command.trim().is_empty()) =>
            {
                Err(ValidationError::EmptyCommand)
            }
            _ => Ok(()),
        }
    }

    /// Validate and encode the form into a create/update payload with exactly
    /// one enabled action slot.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation check; no payload is produced.
    pub fn to_payload(&self) -> Result<RulePayload, ValidationError> {
        self.validate()?;
        let tracker_domains = if self.apply_to_all_trackers {
            Vec::new()
        } else {
            self.selected_domains()
        };
        Ok(RulePayload {
            name: self.name.trim().to_string(),
            enabled: self.enabled,
            tracker_pattern: tracker_pattern_for(&tracker_domains),
            tracker_domains,
            conditions: ActionSlots::single(self.action(), self.condition.clone()),
        })
    }
}
