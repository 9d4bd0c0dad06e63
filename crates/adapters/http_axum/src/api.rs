//! JSON REST API routes.

pub mod activation;
pub mod rules;
pub mod trackers;

use axum::Router;
use axum::routing::{delete, get, post, put};
use serde::Serialize;

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_domain::id::SessionId;
use flotilla_domain::preview::PreviewResult;
use flotilla_domain::rule::RuleCondition;

use crate::state::AppState;

/// Body returned when a destructive activation awaits confirmation.
///
/// The surrounding UI opens its confirmation dialog on this response and
/// drives the `more`/`confirm`/`cancel` endpoints with the session id.
#[derive(Debug, Serialize)]
pub struct PendingPreviewBody {
    pub session_id: SessionId,
    pub preview: PreviewResult,
    /// Condition fields referenced by the rule, for dynamic preview columns.
    pub columns: Vec<String>,
}

/// Condition fields referenced by a rule, for dynamic preview columns.
#[must_use]
pub fn condition_columns(condition: Option<&RuleCondition>) -> Vec<String> {
    condition
        .map(|tree| tree.referenced_fields().into_iter().collect())
        .unwrap_or_default()
}

/// Assemble the `/api` routes.
pub fn routes<B, I>() -> Router<AppState<B, I>>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/instances/{instance_id}/rules",
            get(rules::list).post(rules::create),
        )
        .route("/instances/{instance_id}/rules/order", put(rules::reorder))
        .route(
            "/instances/{instance_id}/rules/{rule_id}",
            put(rules::update).delete(rules::remove),
        )
        .route(
            "/instances/{instance_id}/rules/{rule_id}/enabled",
            axum::routing::patch(rules::toggle),
        )
        .route(
            "/instances/{instance_id}/rules/{rule_id}/duplicate",
            post(rules::duplicate),
        )
        .route("/activations/{session_id}/more", post(activation::more))
        .route(
            "/activations/{session_id}/confirm",
            post(activation::confirm),
        )
        .route("/activations/{session_id}", delete(activation::cancel))
        .route("/tracker-customizations", get(trackers::customizations))
        .route(
            "/instances/{instance_id}/tracker-domains",
            get(trackers::domains),
        )
        .route(
            "/instances/{instance_id}/tracker-options",
            get(trackers::options),
        )
}
