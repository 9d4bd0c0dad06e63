//! Preview results — the output of trial-evaluating a rule against live
//! instance data, without committing anything.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// One example torrent row returned by a preview evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewTorrent {
    /// Info-hash; the identity key for deduplication across pages.
    pub hash: String,
    pub name: String,
    pub size_bytes: u64,
    pub tracker_domain: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub added_at: Timestamp,
}

/// Result of trial-evaluating a rule.
///
/// `examples` grows monotonically across "load more" calls for one session;
/// `total_matches` is always the latest authoritative count, independent of
/// how many examples have been fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub total_matches: u64,
    pub examples: Vec<PreviewTorrent>,
    /// Matches attributed to cross-seeds, when the action distinguishes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_seed_count: Option<u64>,
}

impl PreviewResult {
    /// Fold a later page into this result: append examples not seen yet (by
    /// hash) and adopt the freshest counts. Live data may shift between
    /// pages; newer totals simply win.
    pub fn absorb(&mut self, page: PreviewResult) {
        self.total_matches = page.total_matches;
        self.cross_seed_count = page.cross_seed_count;
        for torrent in page.examples {
            if !self
                .examples
                .iter()
                .any(|existing| existing.hash == torrent.hash)
            {
                self.examples.push(torrent);
            }
        }
    }

    /// Matches not attributed to cross-seeds.
    #[must_use]
    pub fn direct_matches(&self) -> u64 {
        self.total_matches
            .saturating_sub(self.cross_seed_count.unwrap_or(0))
    }

    /// True when nothing currently matches. Confirming such a rule still
    /// saves and enables it.
    #[must_use]
    pub fn matches_nothing(&self) -> bool {
        self.total_matches == 0
    }
}
