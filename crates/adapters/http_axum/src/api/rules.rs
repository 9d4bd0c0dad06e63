//! JSON REST handlers for rules.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_app::services::activation::{ActivationOutcome, ActivationTarget};
use flotilla_domain::form::RuleForm;
use flotilla_domain::id::{InstanceId, RuleId};
use flotilla_domain::rule::AutomationRule;

use super::{PendingPreviewBody, condition_columns};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for reordering an instance's rules.
#[derive(Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<RuleId>,
}

/// Request body for toggling a rule's enabled flag.
#[derive(Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Request body for duplicating a rule.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct DuplicateRequest {
    /// Instance the copy lands in; the source instance when absent.
    pub target_instance: Option<InstanceId>,
}

/// Outcome of a submit-shaped endpoint: the rule was saved, or a preview
/// session awaits confirmation.
pub enum SubmitResponse {
    Committed(StatusCode, Json<AutomationRule>),
    PreviewPending(Json<PendingPreviewBody>),
}

impl IntoResponse for SubmitResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Committed(status, json) => (status, json).into_response(),
            Self::PreviewPending(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `GET /api/instances/{instance_id}/rules` — sorted rule list.
pub async fn list<B, I>(
    State(state): State<AppState<B, I>>,
    Path(instance_id): Path<InstanceId>,
) -> Result<Json<Vec<AutomationRule>>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let rules = state.rule_list.list(instance_id).await?;
    Ok(Json(rules))
}

/// `POST /api/instances/{instance_id}/rules` — create a rule from a form.
///
/// Destructive, enabled creates answer `202 Accepted` with a preview session
/// instead of committing.
pub async fn create<B, I>(
    State(state): State<AppState<B, I>>,
    Path(instance_id): Path<InstanceId>,
    Json(form): Json<RuleForm>,
) -> Result<SubmitResponse, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let payload = form.to_payload()?;
    let columns = condition_columns(form.condition.as_ref());
    let outcome = state
        .activation
        .submit(instance_id, ActivationTarget::Create, payload)
        .await?;
    Ok(match outcome {
        ActivationOutcome::Committed(rule) => {
            state.rule_list.apply_committed(instance_id, rule.clone());
            SubmitResponse::Committed(StatusCode::CREATED, Json(rule))
        }
        ActivationOutcome::PreviewPending {
            session_id,
            preview,
        } => SubmitResponse::PreviewPending(Json(PendingPreviewBody {
            session_id,
            preview,
            columns,
        })),
    })
}

/// `PUT /api/instances/{instance_id}/rules/{rule_id}` — update via form.
///
/// An edit that flips a destructive rule's enabled flag on goes through the
/// same preview gate as a create.
pub async fn update<B, I>(
    State(state): State<AppState<B, I>>,
    Path((instance_id, rule_id)): Path<(InstanceId, RuleId)>,
    Json(form): Json<RuleForm>,
) -> Result<SubmitResponse, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let payload = form.to_payload()?;
    let columns = condition_columns(form.condition.as_ref());
    let current = state.rules.get(instance_id, rule_id).await?;
    let target = ActivationTarget::Update {
        rule_id,
        prior_enabled: current.enabled,
    };
    let outcome = state.activation.submit(instance_id, target, payload).await?;
    Ok(match outcome {
        ActivationOutcome::Committed(rule) => {
            state.rule_list.apply_committed(instance_id, rule.clone());
            SubmitResponse::Committed(StatusCode::OK, Json(rule))
        }
        ActivationOutcome::PreviewPending {
            session_id,
            preview,
        } => SubmitResponse::PreviewPending(Json(PendingPreviewBody {
            session_id,
            preview,
            columns,
        })),
    })
}

/// `PATCH /api/instances/{instance_id}/rules/{rule_id}/enabled` — toggle.
///
/// Enabling a destructive rule answers `202 Accepted` with a preview session;
/// the cached list optimistically shows the rule as enabled until the session
/// is confirmed or cancelled.
pub async fn toggle<B, I>(
    State(state): State<AppState<B, I>>,
    Path((instance_id, rule_id)): Path<(InstanceId, RuleId)>,
    Json(request): Json<ToggleRequest>,
) -> Result<SubmitResponse, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let rule = state.rules.get(instance_id, rule_id).await?;
    let condition = rule.active_action().and_then(|(_, condition)| condition);
    let columns = condition_columns(condition.as_ref());
    let outcome = state
        .activation
        .toggle(instance_id, &rule, request.enabled)
        .await?;
    Ok(match outcome {
        ActivationOutcome::Committed(updated) => {
            state.rule_list.apply_committed(instance_id, updated.clone());
            SubmitResponse::Committed(StatusCode::OK, Json(updated))
        }
        ActivationOutcome::PreviewPending {
            session_id,
            preview,
        } => {
            // the optimistic flip needs a populated cached view to act on
            state.rule_list.list(instance_id).await?;
            state.rule_list.set_enabled(instance_id, rule_id, true);
            SubmitResponse::PreviewPending(Json(PendingPreviewBody {
                session_id,
                preview,
                columns,
            }))
        }
    })
}

/// `DELETE /api/instances/{instance_id}/rules/{rule_id}`.
pub async fn remove<B, I>(
    State(state): State<AppState<B, I>>,
    Path((instance_id, rule_id)): Path<(InstanceId, RuleId)>,
) -> Result<StatusCode, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    state.rules.delete(instance_id, rule_id).await?;
    state.rule_list.apply_removed(instance_id, rule_id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/instances/{instance_id}/rules/{rule_id}/duplicate` — copy a
/// rule, optionally into another instance. The copy always lands disabled.
pub async fn duplicate<B, I>(
    State(state): State<AppState<B, I>>,
    Path((instance_id, rule_id)): Path<(InstanceId, RuleId)>,
    request: Option<Json<DuplicateRequest>>,
) -> Result<(StatusCode, Json<AutomationRule>), ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let target = request
        .and_then(|Json(body)| body.target_instance)
        .unwrap_or(instance_id);
    let copy = state.rules.duplicate(instance_id, rule_id, target).await?;
    state.rule_list.apply_committed(target, copy.clone());
    Ok((StatusCode::CREATED, Json(copy)))
}

/// `PUT /api/instances/{instance_id}/rules/order` — reorder all rules.
///
/// Fails with `409 Conflict` (and a `rolled_back` marker) when the instance
/// rejects the mutation; the returned list then matches the pre-reorder view.
pub async fn reorder<B, I>(
    State(state): State<AppState<B, I>>,
    Path(instance_id): Path<InstanceId>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<AutomationRule>>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let rules = state
        .rule_list
        .reorder(instance_id, request.ordered_ids)
        .await?;
    Ok(Json(rules))
}
