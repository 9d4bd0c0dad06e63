//! Rule actions — the single effect a rule applies to matching torrents.

use serde::{Deserialize, Serialize};

use super::condition::RuleCondition;

/// Current version of the action container schema.
pub const SCHEMA_VERSION: u32 = 1;

/// How a delete action disposes of matched torrents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the torrent, keep its files on disk.
    #[default]
    Torrent,
    /// Remove the torrent and its files.
    WithFiles,
    /// Remove files unless another torrent still cross-seeds them.
    WithFilesPreserveCrossSeeds,
    /// Remove files and every cross-seeding torrent along with them.
    WithFilesIncludeCrossSeeds,
}

/// How a tag action combines its tags with the torrent's existing tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMode {
    /// Replace the torrent's tags with the rule's tags.
    #[default]
    Full,
    /// Add the rule's tags to the torrent's tags.
    Add,
    /// Remove the rule's tags from the torrent's tags.
    Remove,
}

/// The effect a rule applies. A rule carries exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    SpeedLimits {
        upload_kib: Option<u64>,
        download_kib: Option<u64>,
    },
    ShareLimits {
        ratio: Option<f64>,
        seeding_minutes: Option<u64>,
    },
    Pause,
    Resume,
    Recheck,
    Reannounce,
    Delete {
        mode: DeleteMode,
    },
    Tag {
        tags: Vec<String>,
        mode: TagMode,
    },
    Category {
        category: String,
        include_cross_seeds: bool,
    },
    Move {
        destination: String,
    },
    ExternalProgram {
        command: String,
    },
}

impl RuleAction {
    /// Discriminant of this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SpeedLimits { .. } => ActionKind::SpeedLimits,
            Self::ShareLimits { .. } => ActionKind::ShareLimits,
            Self::Pause => ActionKind::Pause,
            Self::Resume => ActionKind::Resume,
            Self::Recheck => ActionKind::Recheck,
            Self::Reannounce => ActionKind::Reannounce,
            Self::Delete { .. } => ActionKind::Delete,
            Self::Tag { .. } => ActionKind::Tag,
            Self::Category { .. } => ActionKind::Category,
            Self::Move { .. } => ActionKind::Move,
            Self::ExternalProgram { .. } => ActionKind::ExternalProgram,
        }
    }
}

/// Discriminant for [`RuleAction`], used for form selection and for the fixed
/// scan order when reading action containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SpeedLimits,
    ShareLimits,
    Pause,
    Resume,
    Recheck,
    Reannounce,
    Delete,
    Tag,
    Category,
    Move,
    ExternalProgram,
}

impl ActionKind {
    /// Scan order used when resolving which slot of a container is active.
    pub const PRIORITY: [Self; 11] = [
        Self::SpeedLimits,
        Self::ShareLimits,
        Self::Pause,
        Self::Resume,
        Self::Recheck,
        Self::Reannounce,
        Self::Delete,
        Self::Tag,
        Self::Category,
        Self::Move,
        Self::ExternalProgram,
    ];

    /// Delete and category changes must show a confirmed preview before they
    /// may be enabled.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Delete | Self::Category)
    }
}

/// One action slot of a container: its own enabled flag, an optional
/// condition, and action-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<P> {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,
    #[serde(flatten)]
    pub params: P,
}

/// Parameters for slots whose action takes none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParams {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimitsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_kib: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_kib: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareLimitsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeding_minutes: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub mode: DeleteMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagParams {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mode: TagMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryParams {
    pub category: String,
    #[serde(default)]
    pub include_cross_seeds: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveParams {
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProgramParams {
    pub command: String,
}

/// Schema-versioned container with one optional slot per action type.
///
/// This is the persisted wire shape. The editor only ever writes a single
/// enabled slot (see [`ActionSlots::single`]), but the schema itself does not
/// forbid several — containers written through other channels are read by
/// [`ActionSlots::active`], where the first enabled slot in
/// [`ActionKind::PRIORITY`] order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSlots {
    pub schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limits: Option<Slot<SpeedLimitsParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_limits: Option<Slot<ShareLimitsParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<Slot<NoParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<Slot<NoParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck: Option<Slot<NoParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reannounce: Option<Slot<NoParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Slot<DeleteParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Slot<TagParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Slot<CategoryParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_to: Option<Slot<MoveParams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_program: Option<Slot<ExternalProgramParams>>,
}

impl Default for ActionSlots {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            speed_limits: None,
            share_limits: None,
            pause: None,
            resume: None,
            recheck: None,
            reannounce: None,
            delete: None,
            tag: None,
            category: None,
            move_to: None,
            external_program: None,
        }
    }
}

fn slot<P>(condition: Option<RuleCondition>, params: P) -> Option<Slot<P>> {
    Some(Slot {
        enabled: true,
        condition,
        params,
    })
}

impl ActionSlots {
    /// Build a container with exactly one enabled slot.
    #[must_use]
    pub fn single(action: RuleAction, condition: Option<RuleCondition>) -> Self {
        let mut slots = Self::default();
        match action {
            RuleAction::SpeedLimits {
                upload_kib,
                download_kib,
            } => {
                slots.speed_limits = slot(
                    condition,
                    SpeedLimitsParams {
                        upload_kib,
                        download_kib,
                    },
                );
            }
            RuleAction::ShareLimits {
                ratio,
                seeding_minutes,
            } => {
                slots.share_limits = slot(
                    condition,
                    ShareLimitsParams {
                        ratio,
                        seeding_minutes,
                    },
                );
            }
            RuleAction::Pause => slots.pause = slot(condition, NoParams {}),
            RuleAction::Resume => slots.resume = slot(condition, NoParams {}),
            RuleAction::Recheck => slots.recheck = slot(condition, NoParams {}),
            RuleAction::Reannounce => slots.reannounce = slot(condition, NoParams {}),
            RuleAction::Delete { mode } => slots.delete = slot(condition, DeleteParams { mode }),
            RuleAction::Tag { tags, mode } => {
                slots.tag = slot(condition, TagParams { tags, mode });
            }
            RuleAction::Category {
                category,
                include_cross_seeds,
            } => {
                slots.category = slot(
                    condition,
                    CategoryParams {
                        category,
                        include_cross_seeds,
                    },
                );
            }
            RuleAction::Move { destination } => {
                slots.move_to = slot(condition, MoveParams { destination });
            }
            RuleAction::ExternalProgram { command } => {
                slots.external_program = slot(condition, ExternalProgramParams { command });
            }
        }
        slots
    }

    /// The first enabled slot in [`ActionKind::PRIORITY`] order, if any.
    #[must_use]
    pub fn active(&self) -> Option<(RuleAction, Option<RuleCondition>)> {
        ActionKind::PRIORITY
            .iter()
            .find_map(|kind| self.slot_as_action(*kind))
    }

    /// Kind of the active slot, if any.
    #[must_use]
    pub fn active_kind(&self) -> Option<ActionKind> {
        self.active().map(|(action, _)| action.kind())
    }

    fn slot_as_action(&self, kind: ActionKind) -> Option<(RuleAction, Option<RuleCondition>)> {
        fn take<P, F>(
            entry: Option<&Slot<P>>,
            build: F,
        ) -> Option<(RuleAction, Option<RuleCondition>)>
        where
            F: FnOnce(&P) -> RuleAction,
        {
            entry
                .filter(|found| found.enabled)
                .map(|found| (build(&found.params), found.condition.clone()))
        }

        match kind {
            ActionKind::SpeedLimits => take(self.speed_limits.as_ref(), |params| {
                RuleAction::SpeedLimits {
                    upload_kib: params.upload_kib,
                    download_kib: params.download_kib,
                }
            }),
            ActionKind::ShareLimits => take(self.share_limits.as_ref(), |params| {
                RuleAction::ShareLimits {
                    ratio: params.ratio,
                    seeding_minutes: params.seeding_minutes,
                }
            }),
            ActionKind::Pause => take(self.pause.as_ref(), |_| RuleAction::Pause),
            ActionKind::Resume => take(self.resume.as_ref(), |_| RuleAction::Resume),
            ActionKind::Recheck => take(self.recheck.as_ref(), |_| RuleAction::Recheck),
            ActionKind::Reannounce => take(self.reannounce.as_ref(), |_| RuleAction::Reannounce),
            ActionKind::Delete => take(self.delete.as_ref(), |params| RuleAction::Delete {
                mode: params.mode,
            }),
            ActionKind::Tag => take(self.tag.as_ref(), |params| RuleAction::Tag {
                tags: params.tags.clone(),
                mode: params.mode,
            }),
            ActionKind::Category => take(self.category.as_ref(), |params| RuleAction::Category {
                category: params.category.clone(),
                include_cross_seeds: params.include_cross_seeds,
            }),
            ActionKind::Move => take(self.move_to.as_ref(), |params| RuleAction::Move {
                destination: params.destination.clone(),
            }),
            ActionKind::ExternalProgram => {
                take(self.external_program.as_ref(), |params| {
                    RuleAction::ExternalProgram {
                        command: params.command.clone(),
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_container_with_single_enabled_slot() {
        let slots = ActionSlots::single(
            RuleAction::Delete {
                mode: DeleteMode::WithFiles,
            },
            None,
        );
        assert_eq!(slots.schema_version, SCHEMA_VERSION);
        assert!(slots.delete.as_ref().is_some_and(|found| found.enabled));
        assert!(slots.speed_limits.is_none());
        assert!(slots.category.is_none());
    }

    #[test]
    fn should_resolve_active_action_from_single_slot() {
        let slots = ActionSlots::single(
            RuleAction::Tag {
                tags: vec!["keep".to_string()],
                mode: TagMode::Add,
            },
            None,
        );
        let (action, condition) = slots.active().unwrap();
        assert_eq!(
            action,
            RuleAction::Tag {
                tags: vec!["keep".to_string()],
                mode: TagMode::Add,
            }
        );
        assert!(condition.is_none());
    }

    #[test]
    fn should_resolve_first_slot_in_scan_order_when_several_enabled() {
        let mut slots = ActionSlots::single(
            RuleAction::Delete {
                mode: DeleteMode::Torrent,
            },
            None,
        );
        slots.pause = Some(Slot {
            enabled: true,
            condition: None,
            params: NoParams {},
        });
        // pause precedes delete in scan order
        assert_eq!(slots.active_kind(), Some(ActionKind::Pause));
    }

    #[test]
    fn should_skip_disabled_slots() {
        let mut slots = ActionSlots::single(RuleAction::Resume, None);
        slots.resume.as_mut().unwrap().enabled = false;
        assert!(slots.active().is_none());
    }

    #[test]
    fn should_resolve_nothing_for_empty_container() {
        assert!(ActionSlots::default().active().is_none());
    }

    #[test]
    fn should_mark_only_delete_and_category_destructive() {
        for kind in ActionKind::PRIORITY {
            let destructive = matches!(kind, ActionKind::Delete | ActionKind::Category);
            assert_eq!(kind.is_destructive(), destructive);
        }
    }

    #[test]
    fn should_roundtrip_container_through_serde_json() {
        let slots = ActionSlots::single(
            RuleAction::Category {
                category: "movies".to_string(),
                include_cross_seeds: true,
            },
            None,
        );
        let json = serde_json::to_string(&slots).unwrap();
        let parsed: ActionSlots = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, slots);
    }

    #[test]
    fn should_omit_absent_slots_from_serialized_form() {
        let slots = ActionSlots::single(RuleAction::Pause, None);
        let json = serde_json::to_value(&slots).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("pause"));
        assert!(!object.contains_key("delete"));
        assert!(!object.contains_key("speed_limits"));
    }

    #[test]
    fn should_default_missing_fields_when_deserializing() {
        let parsed: ActionSlots = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ActionSlots::default());
    }

    #[test]
    fn should_flatten_slot_params_into_slot_object() {
        let slots = ActionSlots::single(
            RuleAction::SpeedLimits {
                upload_kib: Some(512),
                download_kib: None,
            },
            None,
        );
        let json = serde_json::to_value(&slots).unwrap();
        assert_eq!(json["speed_limits"]["upload_kib"], 512);
        assert!(json["speed_limits"].get("download_kib").is_none());
    }
}
