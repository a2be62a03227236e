//! Handlers for the version lifecycle of one stream.
//!
//! Versions are nested under an ad and a stream:
//! `/ads/{ad_id}/streams/{stream}/...` where `stream` is one of
//! `voices`, `music`, `sfx`.

use adforge_core::error::CoreError;
use adforge_core::mixer::MixerState;
use adforge_core::rebuild::rebuild_mixer;
use adforge_core::stream::StreamKind;
use adforge_core::types::VersionId;
use adforge_core::version::{GeneratedClip, Version, VersionPayload};
use adforge_core::version_store::VersionStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub version_id: VersionId,
}

#[derive(Debug, Serialize)]
pub struct ActiveVersion {
    pub version_id: Option<VersionId>,
}

/// Result of a promotion: the new pointer and the mixer rebuilt from it.
#[derive(Debug, Serialize)]
pub struct SetActiveResponse {
    pub version_id: VersionId,
    pub mixer: MixerState,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    pub payload: VersionPayload,
    #[serde(default)]
    pub request_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordClipRequest {
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_stream(name: &str) -> AppResult<StreamKind> {
    Ok(StreamKind::from_name(name)?)
}

async fn require_version(
    store: &dyn VersionStore,
    ad_id: &str,
    stream: StreamKind,
    version_id: &str,
) -> AppResult<Version> {
    store
        .get_version(ad_id, stream, version_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "version",
                id: version_id.to_string(),
            })
        })
}

fn draft_missing(ad_id: &str, stream: StreamKind) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "draft",
        id: format!("{ad_id}/{stream}"),
    })
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// GET /api/v1/ads/{ad_id}/streams/{stream}/versions
///
/// Full history in creation order, drafts included.
pub async fn list_versions(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Vec<Version>>>> {
    let stream = parse_stream(&stream)?;
    let versions = state.store.list_versions(&ad_id, stream).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/ads/{ad_id}/streams/{stream}/versions/{id}
pub async fn get_version(
    State(state): State<AppState>,
    Path((ad_id, stream, id)): Path<(String, String, String)>,
) -> AppResult<Json<DataResponse<Version>>> {
    let stream = parse_stream(&stream)?;
    let version = require_version(state.store.as_ref(), &ad_id, stream, &id).await?;
    Ok(Json(DataResponse { data: version }))
}

/// DELETE /api/v1/ads/{ad_id}/streams/{stream}/versions/{id}
///
/// Clears the active or draft pointer when it named this version. The mixer
/// is not rebuilt; it keeps serving the last built state until the next
/// rebuild.
pub async fn delete_version(
    State(state): State<AppState>,
    Path((ad_id, stream, id)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    let stream = parse_stream(&stream)?;
    state.store.delete_version(&ad_id, stream, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/ads/{ad_id}/streams/{stream}/versions/{id}/clone
///
/// Copy a final version into a new final version. 409 for drafts.
pub async fn clone_version(
    State(state): State<AppState>,
    Path((ad_id, stream, id)): Path<(String, String, String)>,
) -> AppResult<(StatusCode, Json<DataResponse<Version>>)> {
    let stream = parse_stream(&stream)?;
    let new_id = state.store.clone_version(&ad_id, stream, &id).await?;
    let version = require_version(state.store.as_ref(), &ad_id, stream, &new_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// PUT /api/v1/ads/{ad_id}/streams/{stream}/versions/{id}/clips/{index}
///
/// Store a provider result (URL and measured duration) on one track.
pub async fn record_clip(
    State(state): State<AppState>,
    Path((ad_id, stream, id, index)): Path<(String, String, String, usize)>,
    Json(input): Json<RecordClipRequest>,
) -> AppResult<Json<DataResponse<Version>>> {
    let stream = parse_stream(&stream)?;
    let clip = GeneratedClip {
        index,
        url: input.url,
        duration: input.duration,
    };
    let version = state
        .store
        .record_generated_clip(&ad_id, stream, &id, &clip)
        .await?;
    Ok(Json(DataResponse { data: version }))
}

// ---------------------------------------------------------------------------
// Active pointer
// ---------------------------------------------------------------------------

/// GET /api/v1/ads/{ad_id}/streams/{stream}/active
pub async fn get_active(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<ActiveVersion>>> {
    let stream = parse_stream(&stream)?;
    let version_id = state.store.get_active_version(&ad_id, stream).await?;
    Ok(Json(DataResponse {
        data: ActiveVersion { version_id },
    }))
}

/// PUT /api/v1/ads/{ad_id}/streams/{stream}/active
///
/// Promote a final version with audio and rebuild the mixer. 404 for unknown
/// ids, 409 for drafts and versions that are not fully generated.
pub async fn set_active(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
    Json(input): Json<SetActiveRequest>,
) -> AppResult<Json<DataResponse<SetActiveResponse>>> {
    let stream = parse_stream(&stream)?;
    let store = state.store.as_ref();

    let version = require_version(store, &ad_id, stream, &input.version_id).await?;
    if !version.is_final() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Version {} is a draft. Finalize it before making it active.",
            version.id
        ))));
    }
    if !version.has_audio() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Version {} has no generated audio for every track yet.",
            version.id
        ))));
    }

    store.set_active_version(&ad_id, stream, &version.id).await?;
    let mixer = rebuild_mixer(store, &ad_id).await?;

    Ok(Json(DataResponse {
        data: SetActiveResponse {
            version_id: version.id,
            mixer,
        },
    }))
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// GET /api/v1/ads/{ad_id}/streams/{stream}/draft
pub async fn get_draft(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Version>>> {
    let stream = parse_stream(&stream)?;
    let draft = state
        .store
        .get_draft(&ad_id, stream)
        .await?
        .ok_or_else(|| draft_missing(&ad_id, stream))?;
    Ok(Json(DataResponse { data: draft }))
}

/// POST /api/v1/ads/{ad_id}/streams/{stream}/draft
///
/// Start an empty draft, discarding any existing one.
pub async fn create_draft(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<DataResponse<Version>>)> {
    let stream = parse_stream(&stream)?;
    let draft_id = state.store.create_draft(&ad_id, stream).await?;
    let draft = state
        .store
        .get_version(&ad_id, stream, &draft_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!("Draft {draft_id} vanished right after creation"))
        })?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: draft })))
}

/// PUT /api/v1/ads/{ad_id}/streams/{stream}/draft
pub async fn update_draft(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
    Json(input): Json<UpdateDraftRequest>,
) -> AppResult<Json<DataResponse<Version>>> {
    let stream = parse_stream(&stream)?;
    let draft = state
        .store
        .update_draft(&ad_id, stream, input.payload, input.request_text)
        .await?;
    Ok(Json(DataResponse { data: draft }))
}

/// POST /api/v1/ads/{ad_id}/streams/{stream}/draft/finalize
///
/// The finalized version is not activated; promote it with `PUT .../active`.
pub async fn finalize_draft(
    State(state): State<AppState>,
    Path((ad_id, stream)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Version>>> {
    let stream = parse_stream(&stream)?;
    let version = state.store.finalize_draft(&ad_id, stream).await?;
    Ok(Json(DataResponse { data: version }))
}
