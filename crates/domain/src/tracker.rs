//! Tracker identities — merging raw tracker domains into operator-facing
//! options via customizations.
//!
//! A customization maps several raw domains (mirrors, CDNs, renamed hosts of
//! one tracker) onto a single display identity. The resolver turns an
//! instance's raw domain inventory into a deduplicated option list, and turns
//! a rule's persisted domain list back into the same merged values.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::CustomizationId;

/// Operator mapping that merges several raw tracker domains into one display
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerCustomization {
    pub id: CustomizationId,
    pub display_name: String,
    /// `domains[0]` is the canonical/primary domain (icon lookup); the rest
    /// are aliases that never appear standalone in selection lists.
    pub domains: Vec<String>,
}

impl TrackerCustomization {
    /// The canonical domain, used for icon lookup.
    #[must_use]
    pub fn primary_domain(&self) -> Option<&str> {
        self.domains.first().map(String::as_str)
    }

    /// The merged option value: every domain, stored order, comma-joined.
    #[must_use]
    pub fn joined_domains(&self) -> String {
        self.domains.join(",")
    }
}

/// A selectable tracker entry shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerOption {
    pub label: String,
    /// A raw domain, or the comma-joined domain list of a customization.
    pub value: String,
    /// Domain the icon is derived from.
    pub icon_domain: String,
}

/// Derived lookup index over a customization list.
///
/// Rebuilt whenever the customization list changes; never mutated in place.
/// With no customizations both resolver functions behave as the identity.
#[derive(Debug, Clone, Default)]
pub struct TrackerIndex {
    by_domain: HashMap<String, TrackerCustomization>,
    secondary: HashSet<String>,
}

impl TrackerIndex {
    /// Build the index: lowercased domain → owning customization, plus the
    /// set of non-primary alias domains.
    #[must_use]
    pub fn build(customizations: &[TrackerCustomization]) -> Self {
        let mut by_domain = HashMap::new();
        let mut secondary = HashSet::new();
        for customization in customizations {
            for (position, domain) in customization.domains.iter().enumerate() {
                let key = domain.to_lowercase();
                if position > 0 {
                    secondary.insert(key.clone());
                }
                by_domain.insert(key, customization.clone());
            }
        }
        Self {
            by_domain,
            secondary,
        }
    }

    /// The customization owning `domain`, if any.
    #[must_use]
    pub fn customization_for(&self, domain: &str) -> Option<&TrackerCustomization> {
        self.by_domain.get(&domain.to_lowercase())
    }

    /// Whether `domain` is a non-primary alias of some customization.
    #[must_use]
    pub fn is_secondary(&self, domain: &str) -> bool {
        self.secondary.contains(&domain.to_lowercase())
    }

    /// Build the selectable option list for an instance's raw domains.
    ///
    /// Secondary aliases are represented through their customization's merged
    /// entry and never emitted standalone. Customized domains collapse into
    /// one option per display name; uncustomized domains pass through once
    /// each (case-insensitively). The result is sorted case-insensitively by
    /// label and never contains two options with the same label.
    #[must_use]
    pub fn build_options(&self, raw_domains: &[String]) -> Vec<TrackerOption> {
        let mut seen = HashSet::new();
        let mut options = Vec::new();
        for raw in raw_domains {
            let lower = raw.to_lowercase();
            if self.secondary.contains(&lower) {
                continue;
            }
            if let Some(customization) = self.by_domain.get(&lower) {
                if !seen.insert(customization.display_name.to_lowercase()) {
                    continue;
                }
                options.push(TrackerOption {
                    label: customization.display_name.clone(),
                    value: customization.joined_domains(),
                    icon_domain: customization
                        .primary_domain()
                        .unwrap_or(raw.as_str())
                        .to_string(),
                });
            } else {
                if !seen.insert(lower) {
                    continue;
                }
                options.push(TrackerOption {
                    label: raw.clone(),
                    value: raw.clone(),
                    icon_domain: raw.clone(),
                });
            }
        }
        options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
        options
    }

    /// Rehydrate a rule's persisted domain list into option values.
    ///
    /// The inverse companion of [`TrackerIndex::build_options`]: every domain
    /// belonging to a customization collapses into that customization's
    /// merged value exactly once; uncustomized domains pass through as their
    /// own value. First-occurrence order is preserved.
    #[must_use]
    pub fn map_domains_to_values(&self, domains: &[String]) -> Vec<String> {
        let mut processed = HashSet::new();
        let mut values = Vec::new();
        for domain in domains {
            let lower = domain.to_lowercase();
            if processed.contains(&lower) {
                continue;
            }
            if let Some(customization) = self.by_domain.get(&lower) {
                let merged = customization.joined_domains();
                if !values.contains(&merged) {
                    values.push(merged);
                }
                for owned in &customization.domains {
                    processed.insert(owned.to_lowercase());
                }
            } else {
                processed.insert(lower);
                values.push(domain.clone());
            }
        }
        values
    }
}
