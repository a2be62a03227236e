//! Handlers for `/ads/{ad_id}/mixer`.

use adforge_core::error::CoreError;
use adforge_core::mixer::MixerState;
use adforge_core::rebuild::{get_mixer_state, rebuild_mixer};
use adforge_core::version_store::VersionStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetVolumeRequest {
    pub volume: f64,
}

#[derive(Debug, Serialize)]
pub struct TrackVolume {
    pub track_id: String,
    pub volume: f64,
}

/// GET /api/v1/ads/{ad_id}/mixer
///
/// Last persisted mixer state with volume overrides applied. 404 until the
/// first rebuild.
pub async fn get_mixer(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> AppResult<Json<DataResponse<MixerState>>> {
    let mixer = get_mixer_state(state.store.as_ref(), &ad_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "mixer state",
            id: ad_id,
        }))?;
    Ok(Json(DataResponse { data: mixer }))
}

/// POST /api/v1/ads/{ad_id}/mixer/rebuild
///
/// Recompute the mixer from the active versions ("send to mixer"). On
/// failure the previous state stays in place.
pub async fn rebuild(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> AppResult<Json<DataResponse<MixerState>>> {
    let mixer = rebuild_mixer(state.store.as_ref(), &ad_id).await?;
    Ok(Json(DataResponse { data: mixer }))
}

/// PUT /api/v1/ads/{ad_id}/mixer/volumes/{track_id}
pub async fn set_volume(
    State(state): State<AppState>,
    Path((ad_id, track_id)): Path<(String, String)>,
    Json(input): Json<SetVolumeRequest>,
) -> AppResult<Json<DataResponse<TrackVolume>>> {
    state
        .store
        .set_mixer_volume(&ad_id, &track_id, input.volume)
        .await?;
    tracing::debug!(ad_id = %ad_id, track_id = %track_id, volume = input.volume, "Track volume set");
    Ok(Json(DataResponse {
        data: TrackVolume {
            track_id,
            volume: input.volume,
        },
    }))
}

/// DELETE /api/v1/ads/{ad_id}/mixer/volumes/{track_id}
///
/// Restores the default level. Clearing an unset track is not an error.
pub async fn clear_volume(
    State(state): State<AppState>,
    Path((ad_id, track_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.store.clear_mixer_volume(&ad_id, &track_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
