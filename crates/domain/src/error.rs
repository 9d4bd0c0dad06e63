//! Typed errors shared across the workspace.
//!
//! Each layer converts into [`FlotillaError`] via `#[from]`; no variant
//! carries a bare `String` where a typed source exists.

use thiserror::Error;

/// Pre-submit validation failures.
///
/// These block the operation locally: when validation fails, no port call is
/// made at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Rule name is empty or whitespace.
    #[error("rule name must not be empty")]
    EmptyName,
    /// The rule is tracker-scoped but no tracker is selected.
    #[error("select at least one tracker or apply the rule to all trackers")]
    NoTrackersSelected,
    /// Speed-limit action without an upload or download limit.
    #[error("speed limit rules need an upload or download limit")]
    NoSpeedLimit,
    /// Share-limit action without a ratio or seeding-time limit.
    #[error("share limit rules need a ratio or seeding time limit")]
    NoShareLimit,
    /// Tag action without any tags.
    #[error("tag rules need at least one tag")]
    NoTags,
    /// Category action without a category.
    #[error("category rules need a category")]
    NoCategory,
    /// Move action without a destination path.
    #[error("move rules need a destination path")]
    EmptyDestination,
    /// External-program action without a command.
    #[error("external program rules need a command")]
    EmptyCommand,
    /// The tracker pattern is not derivable from the tracker domain list.
    #[error("tracker pattern does not match the tracker domain list")]
    InconsistentTrackerPattern,
}

/// A lookup that came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Human-readable entity kind, e.g. `"Rule"`.
    pub entity: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}

/// Opaque failure reported by a managed instance.
///
/// The transport and the instance's own error vocabulary are out of scope
/// here; whatever they report is carried as a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend request failed: {message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    /// Wrap a backend failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Umbrella error for the workspace.
///
/// The `PreviewFetch` / `Commit` / `ReorderRolledBack` variants classify the
/// same underlying [`BackendError`] by what the caller must do next: retry the
/// toggle, retry or cancel the confirmation, or accept the restored ordering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlotillaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A port call failed before a use-case classified it.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Trial evaluation failed. Recoverable: the operator may retry by
    /// re-triggering the toggle; any optimistically flipped enabled state
    /// must be restored.
    #[error("preview fetch failed: {0}")]
    PreviewFetch(BackendError),

    /// The real create/update/delete mutation failed. The persisted rule is
    /// unchanged.
    #[error("commit failed: {0}")]
    Commit(BackendError),

    /// A reorder mutation failed and the previous in-memory ordering was
    /// restored verbatim.
    #[error("reorder failed, previous order restored: {0}")]
    ReorderRolledBack(BackendError),

    /// A preview or commit is already in flight for this rule.
    #[error("an activation is already in flight for this rule")]
    ActivationInFlight,

    /// A reorder is already in flight for this instance.
    #[error("a reorder is already in flight for this instance")]
    ReorderInFlight,

    /// The activation session is unknown or already closed.
    #[error("unknown or closed activation session")]
    UnknownSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_umbrella() {
        let err: FlotillaError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            FlotillaError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_render_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Rule",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Rule abc not found");
    }

    #[test]
    fn should_carry_backend_message_through_classified_variants() {
        let err = FlotillaError::PreviewFetch(BackendError::new("boom"));
        assert!(err.to_string().contains("boom"));
    }
}
