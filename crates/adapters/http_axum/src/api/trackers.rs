//! JSON REST handlers for tracker identities.

use axum::Json;
use axum::extract::{Path, State};

use flotilla_app::ports::{RuleBackend, TrackerInventory};
use flotilla_domain::id::InstanceId;
use flotilla_domain::tracker::{TrackerCustomization, TrackerOption};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/tracker-customizations` — operator-defined customizations.
pub async fn customizations<B, I>(
    State(state): State<AppState<B, I>>,
) -> Result<Json<Vec<TrackerCustomization>>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let customizations = state.trackers.customizations().await?;
    Ok(Json(customizations))
}

/// `GET /api/instances/{instance_id}/tracker-domains` — raw domains.
pub async fn domains<B, I>(
    State(state): State<AppState<B, I>>,
    Path(instance_id): Path<InstanceId>,
) -> Result<Json<Vec<String>>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let domains = state.trackers.instance_domains(instance_id).await?;
    Ok(Json(domains))
}

/// `GET /api/instances/{instance_id}/tracker-options` — deduplicated,
/// customization-merged selectable options.
pub async fn options<B, I>(
    State(state): State<AppState<B, I>>,
    Path(instance_id): Path<InstanceId>,
) -> Result<Json<Vec<TrackerOption>>, ApiError>
where
    B: RuleBackend + Send + Sync + 'static,
    I: TrackerInventory + Send + Sync + 'static,
{
    let options = state.trackers.options(instance_id).await?;
    Ok(Json(options))
}
