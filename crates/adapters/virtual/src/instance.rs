//! A single simulated instance: its torrent population and rule store.

use flotilla_domain::preview::{PreviewResult, PreviewTorrent};
use flotilla_domain::rule::{
    ActionKind, AutomationRule, LogicalOp, RuleCondition, RulePayload, TRACKER_WILDCARD,
};
use flotilla_domain::time::Timestamp;

/// A torrent seeded into a virtual instance.
#[derive(Debug, Clone)]
pub struct VirtualTorrent {
    pub hash: String,
    pub name: String,
    pub size_bytes: u64,
    pub tracker_domain: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Torrents sharing a content group cross-seed the same payload.
    pub content_group: Option<String>,
    pub added_at: Timestamp,
}

impl VirtualTorrent {
    /// A minimal torrent fixture on the given tracker.
    #[must_use]
    pub fn new(hash: &str, name: &str, tracker_domain: &str) -> Self {
        Self {
            hash: hash.to_string(),
            name: name.to_string(),
            size_bytes: 1 << 30,
            tracker_domain: tracker_domain.to_string(),
            category: None,
            tags: Vec::new(),
            content_group: None,
            added_at: flotilla_domain::time::now(),
        }
    }

    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    #[must_use]
    pub fn tags<T>(mut self, tags: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn content_group(mut self, group: &str) -> Self {
        self.content_group = Some(group.to_string());
        self
    }

    fn preview_row(&self) -> PreviewTorrent {
        PreviewTorrent {
            hash: self.hash.clone(),
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            tracker_domain: self.tracker_domain.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            added_at: self.added_at,
        }
    }
}

/// One simulated torrent-client instance.
#[derive(Debug, Clone, Default)]
pub struct VirtualInstance {
    pub name: String,
    pub torrents: Vec<VirtualTorrent>,
    pub rules: Vec<AutomationRule>,
}

impl VirtualInstance {
    pub(crate) fn next_sort_order(&self) -> i32 {
        self.rules
            .iter()
            .map(|rule| rule.sort_order)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Raw tracker domains reported by this instance, deduplicated
    /// case-insensitively, first occurrence wins.
    pub(crate) fn tracker_domains(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut domains = Vec::new();
        for torrent in &self.torrents {
            if seen.insert(torrent.tracker_domain.to_lowercase()) {
                domains.push(torrent.tracker_domain.clone());
            }
        }
        domains
    }

    /// Trial-evaluate a candidate payload against the torrent population.
    ///
    /// This is a deliberately small stand-in for a real evaluation engine:
    /// the tracker scope filter plus a toy condition evaluator over the
    /// `name` / `category` / `tag` leaf fields. Cross-seed counts are
    /// reported for category actions only.
    pub(crate) fn evaluate(&self, payload: &RulePayload, limit: u32, offset: u64) -> PreviewResult {
        let condition = payload
            .conditions
            .active()
            .and_then(|(_, condition)| condition);
        let matched: Vec<&VirtualTorrent> = self
            .torrents
            .iter()
            .filter(|torrent| tracker_in_scope(payload, torrent))
            .filter(|torrent| {
                condition
                    .as_ref()
                    .is_none_or(|tree| condition_matches(tree, torrent))
            })
            .collect();

        let cross_seed_count = (payload.action_kind() == Some(ActionKind::Category)).then(|| {
            matched
                .iter()
                .filter(|torrent| self.has_cross_seed(torrent))
                .count() as u64
        });

        let examples = matched
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .map(|torrent| torrent.preview_row())
            .collect();

        PreviewResult {
            total_matches: matched.len() as u64,
            examples,
            cross_seed_count,
        }
    }

    fn has_cross_seed(&self, torrent: &VirtualTorrent) -> bool {
        let Some(group) = torrent.content_group.as_deref() else {
            return false;
        };
        self.torrents.iter().any(|other| {
            other.hash != torrent.hash && other.content_group.as_deref() == Some(group)
        })
    }
}

fn tracker_in_scope(payload: &RulePayload, torrent: &VirtualTorrent) -> bool {
    if payload.tracker_pattern == TRACKER_WILDCARD {
        return true;
    }
    let domain = torrent.tracker_domain.to_lowercase();
    payload
        .tracker_domains
        .iter()
        .any(|scoped| scoped.to_lowercase() == domain)
}

fn condition_matches(condition: &RuleCondition, torrent: &VirtualTorrent) -> bool {
    match condition {
        RuleCondition::Field {
            field,
            operator,
            value,
        } => {
            let candidates: Vec<&str> = match field.as_str() {
                "name" => vec![torrent.name.as_str()],
                "category" => torrent.category.as_deref().into_iter().collect(),
                "tag" => torrent.tags.iter().map(String::as_str).collect(),
                _ => return false,
            };
            let Some(expected) = value.as_str() else {
                return false;
            };
            match operator.as_str() {
                "eq" => candidates.iter().any(|candidate| *candidate == expected),
                "contains" => {
                    let needle = expected.to_lowercase();
                    candidates
                        .iter()
                        .any(|candidate| candidate.to_lowercase().contains(&needle))
                }
                _ => false,
            }
        }
        RuleCondition::Group { op, conditions } => match op {
            LogicalOp::And => conditions
                .iter()
                .all(|child| condition_matches(child, torrent)),
            LogicalOp::Or => conditions
                .iter()
                .any(|child| condition_matches(child, torrent)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_domain::rule::{DeleteMode, RuleAction};

    fn payload_scoped(domains: &[&str]) -> RulePayload {
        AutomationRule::builder()
            .name("scoped")
            .tracker_domains(domains.iter().copied())
            .action(RuleAction::Pause)
            .build()
            .unwrap()
            .to_payload()
    }

    fn instance() -> VirtualInstance {
        VirtualInstance {
            name: "test".to_string(),
            torrents: vec![
                VirtualTorrent::new("aaa", "debian-12.iso", "linux.example").category("iso"),
                VirtualTorrent::new("bbb", "ubuntu-24.iso", "linux.example")
                    .category("iso")
                    .tags(["keep"]),
                VirtualTorrent::new("ccc", "movie.mkv", "movies.example")
                    .category("movies")
                    .content_group("movie-1"),
                VirtualTorrent::new("ddd", "movie.mkv", "cross.example")
                    .category("movies")
                    .content_group("movie-1"),
            ],
            rules: Vec::new(),
        }
    }

    #[test]
    fn should_match_everything_with_wildcard_scope() {
        let payload = AutomationRule::builder()
            .name("all")
            .action(RuleAction::Pause)
            .build()
            .unwrap()
            .to_payload();
        let preview = instance().evaluate(&payload, 25, 0);
        assert_eq!(preview.total_matches, 4);
    }

    #[test]
    fn should_filter_by_tracker_domain_case_insensitively() {
        let preview = instance().evaluate(&payload_scoped(&["LINUX.example"]), 25, 0);
        assert_eq!(preview.total_matches, 2);
    }

    #[test]
    fn should_evaluate_condition_leaves_and_groups() {
        let mut payload = AutomationRule::builder()
            .name("conditional")
            .action(RuleAction::Pause)
            .condition(RuleCondition::Group {
                op: LogicalOp::Or,
                conditions: vec![
                    RuleCondition::Field {
                        field: "tag".to_string(),
                        operator: "eq".to_string(),
                        value: serde_json::json!("keep"),
                    },
                    RuleCondition::Field {
                        field: "name".to_string(),
                        operator: "contains".to_string(),
                        value: serde_json::json!("MOVIE"),
                    },
                ],
            })
            .build()
            .unwrap()
            .to_payload();
        payload.enabled = true;
        let preview = instance().evaluate(&payload, 25, 0);
        assert_eq!(preview.total_matches, 3);
    }

    #[test]
    fn should_match_nothing_for_unknown_condition_field() {
        let payload = AutomationRule::builder()
            .name("unknown field")
            .action(RuleAction::Pause)
            .condition(RuleCondition::Field {
                field: "ratio".to_string(),
                operator: "eq".to_string(),
                value: serde_json::json!("1"),
            })
            .build()
            .unwrap()
            .to_payload();
        let preview = instance().evaluate(&payload, 25, 0);
        assert_eq!(preview.total_matches, 0);
    }

    #[test]
    fn should_paginate_examples_with_limit_and_offset() {
        let payload = AutomationRule::builder()
            .name("all")
            .action(RuleAction::Delete {
                mode: DeleteMode::Torrent,
            })
            .build()
            .unwrap()
            .to_payload();
        let inst = instance();
        let first = inst.evaluate(&payload, 3, 0);
        assert_eq!(first.examples.len(), 3);
        assert_eq!(first.total_matches, 4);
        let second = inst.evaluate(&payload, 3, 3);
        assert_eq!(second.examples.len(), 1);
        assert_eq!(second.total_matches, 4);
    }

    #[test]
    fn should_count_cross_seeds_for_category_actions_only() {
        let category = AutomationRule::builder()
            .name("categorize")
            .action(RuleAction::Category {
                category: "films".to_string(),
                include_cross_seeds: true,
            })
            .build()
            .unwrap()
            .to_payload();
        let preview = instance().evaluate(&category, 25, 0);
        assert_eq!(preview.cross_seed_count, Some(2));

        let pause = AutomationRule::builder()
            .name("pause")
            .action(RuleAction::Pause)
            .build()
            .unwrap()
            .to_payload();
        let preview = instance().evaluate(&pause, 25, 0);
        assert_eq!(preview.cross_seed_count, None);
    }

    #[test]
    fn should_report_deduplicated_tracker_domains() {
        let domains = instance().tracker_domains();
        assert_eq!(
            domains,
            vec!["linux.example", "movies.example", "cross.example"]
        );
    }
}
