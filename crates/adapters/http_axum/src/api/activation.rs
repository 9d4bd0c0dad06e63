//! JSON REST handlers for pending activation sessions.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_domain::id::SessionId;
use flotilla_domain::preview::PreviewResult;
use flotilla_domain::rule::AutomationRule;

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned when a pending activation is cancelled.
#[derive(Debug, Serialize)]
pub struct CancelBody {
    /// Enabled value the UI should restore on its optimistic toggle, absent
    /// for cancelled creates.
    pub restored_enabled: Option<bool>,
}

/// `POST /api/activations/{session_id}/more` — fetch the next preview page.
///
/// Returns the folded result: previously fetched examples plus the new page,
/// deduplicated, with the freshest total count.
pub async fn more<B, I>(
    State(state): State<AppState<B, I>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<PreviewResult>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let preview = state.activation.load_more(session_id).await?;
    Ok(Json(preview))
}

/// `POST /api/activations/{session_id}/confirm` — commit the activation.
pub async fn confirm<B, I>(
    State(state): State<AppState<B, I>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<AutomationRule>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let committed = state.activation.confirm(session_id).await?;
    state
        .rule_list
        .apply_committed(committed.instance, committed.rule.clone());
    Ok(Json(committed.rule))
}

/// `DELETE /api/activations/{session_id}` — cancel without committing.
///
/// Restores the cached rule's enabled flag to its pre-preview value; no
/// mutation reaches the managed instance on this path.
pub async fn cancel<B, I>(
    State(state): State<AppState<B, I>>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<CancelBody>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let cancelled = state.activation.cancel(session_id)?;
    if let (Some(rule_id), Some(enabled)) = (cancelled.rule_id, cancelled.restored_enabled) {
        state
            .rule_list
            .set_enabled(cancelled.instance, rule_id, enabled);
    }
    Ok(Json(CancelBody {
        restored_enabled: cancelled.restored_enabled,
    }))
}
