//! PostgreSQL store: versions as JSONB payload rows, pointers in a side table.

use std::collections::BTreeMap;

use adforge_core::error::{CoreError, CoreResult};
use adforge_core::mixer::{validate_track_volume, MixerState};
use adforge_core::stream::{StreamKind, VersionStatus};
use adforge_core::types::VersionId;
use adforge_core::version::{GeneratedClip, Version, VersionPayload};
use adforge_core::version_store::VersionStore;
use async_trait::async_trait;
use chrono::Utc;

use super::{draft_not_found, new_version_id, version_not_found};
use crate::models::ad_version::CreateAdVersion;
use crate::repositories::{AdVersionRepo, MixerStateRepo, MixerVolumeRepo, StreamPointerRepo};
use crate::DbPool;

/// [`VersionStore`] backed by the `ad_versions`, `ad_stream_pointers`,
/// `mixer_states` and `mixer_volumes` tables.
#[derive(Debug, Clone)]
pub struct PgVersionStore {
    pool: DbPool,
}

impl PgVersionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn storage_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::StorageUnavailable(err.to_string())
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn get_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
    ) -> CoreResult<Option<VersionId>> {
        let pointer = StreamPointerRepo::find(&self.pool, ad_id, stream)
            .await
            .map_err(storage_error)?;
        Ok(pointer.and_then(|p| p.active_version_id))
    }

    async fn set_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        StreamPointerRepo::set_active(&self.pool, ad_id, stream, Some(version_id))
            .await
            .map_err(storage_error)?;
        tracing::info!(ad_id, stream = %stream, version_id, "Active version set");
        Ok(())
    }

    async fn get_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<Option<Version>> {
        AdVersionRepo::find(&self.pool, ad_id, stream, version_id)
            .await
            .map_err(storage_error)?
            .map(Version::try_from)
            .transpose()
    }

    async fn list_versions(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Vec<Version>> {
        AdVersionRepo::list(&self.pool, ad_id, stream)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(Version::try_from)
            .collect()
    }

    async fn clone_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<VersionId> {
        let source: Version = AdVersionRepo::find(&self.pool, ad_id, stream, version_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| version_not_found(version_id))?
            .try_into()?;
        let copy = source.clone_as(new_version_id(), Utc::now())?;

        AdVersionRepo::create(
            &self.pool,
            &CreateAdVersion {
                ad_id,
                stream,
                version: &copy,
            },
        )
        .await
        .map_err(storage_error)?;

        tracing::info!(ad_id, stream = %stream, source_id = version_id, version_id = %copy.id, "Version cloned");
        Ok(copy.id)
    }

    async fn delete_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let deleted = AdVersionRepo::delete(&mut *tx, ad_id, stream, version_id)
            .await
            .map_err(storage_error)?;
        if deleted == 0 {
            return Err(version_not_found(version_id));
        }
        let cleared = StreamPointerRepo::clear_references(&mut *tx, ad_id, stream, version_id)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        tracing::info!(ad_id, stream = %stream, version_id, pointers_cleared = cleared, "Version deleted");
        Ok(())
    }

    async fn record_generated_clip(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        clip: &GeneratedClip,
    ) -> CoreResult<Version> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let mut version: Version =
            AdVersionRepo::find_for_update(&mut *tx, ad_id, stream, version_id)
                .await
                .map_err(storage_error)?
                .ok_or_else(|| version_not_found(version_id))?
                .try_into()?;
        version.payload.apply_generated_clip(clip)?;

        let row = AdVersionRepo::update_content(
            &mut *tx,
            ad_id,
            stream,
            version_id,
            &version.payload,
            version.request_text.as_deref(),
        )
        .await
        .map_err(storage_error)?
        .ok_or_else(|| version_not_found(version_id))?;

        tx.commit().await.map_err(storage_error)?;
        tracing::debug!(ad_id, stream = %stream, version_id, index = clip.index, "Generated clip recorded");
        row.try_into()
    }

    async fn get_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Option<Version>> {
        let pointer = StreamPointerRepo::find(&self.pool, ad_id, stream)
            .await
            .map_err(storage_error)?;
        let Some(draft_id) = pointer.and_then(|p| p.draft_version_id) else {
            return Ok(None);
        };
        self.get_version(ad_id, stream, &draft_id).await
    }

    async fn create_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<VersionId> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Holding the pointer row lock serialises concurrent replacements.
        StreamPointerRepo::lock(&mut *tx, ad_id, stream)
            .await
            .map_err(storage_error)?;
        let replaced = AdVersionRepo::delete_drafts(&mut *tx, ad_id, stream)
            .await
            .map_err(storage_error)?;

        let draft = Version::new_draft(new_version_id(), stream, Utc::now());
        AdVersionRepo::create(
            &mut *tx,
            &CreateAdVersion {
                ad_id,
                stream,
                version: &draft,
            },
        )
        .await
        .map_err(storage_error)?;
        StreamPointerRepo::set_draft(&mut *tx, ad_id, stream, Some(&draft.id))
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        tracing::info!(ad_id, stream = %stream, version_id = %draft.id, replaced, "Draft created");
        Ok(draft.id)
    }

    async fn update_draft(
        &self,
        ad_id: &str,
        stream: StreamKind,
        payload: VersionPayload,
        request_text: Option<String>,
    ) -> CoreResult<Version> {
        payload.ensure_kind(stream)?;
        payload.validate()?;
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let pointer = StreamPointerRepo::lock(&mut *tx, ad_id, stream)
            .await
            .map_err(storage_error)?;
        let draft_id = pointer
            .draft_version_id
            .ok_or_else(|| draft_not_found(ad_id, stream))?;

        let row = AdVersionRepo::update_content(
            &mut *tx,
            ad_id,
            stream,
            &draft_id,
            &payload,
            request_text.as_deref(),
        )
        .await
        .map_err(storage_error)?
        .ok_or_else(|| draft_not_found(ad_id, stream))?;

        tx.commit().await.map_err(storage_error)?;
        row.try_into()
    }

    async fn finalize_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Version> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let pointer = StreamPointerRepo::lock(&mut *tx, ad_id, stream)
            .await
            .map_err(storage_error)?;
        let draft_id = pointer
            .draft_version_id
            .ok_or_else(|| draft_not_found(ad_id, stream))?;

        let row = AdVersionRepo::set_status(&mut *tx, ad_id, stream, &draft_id, VersionStatus::Final)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| draft_not_found(ad_id, stream))?;
        StreamPointerRepo::set_draft(&mut *tx, ad_id, stream, None)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        tracing::info!(ad_id, stream = %stream, version_id = %draft_id, "Draft finalized");
        row.try_into()
    }

    async fn get_mixer_state(&self, ad_id: &str) -> CoreResult<Option<MixerState>> {
        let row = MixerStateRepo::find(&self.pool, ad_id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(|r| r.state.0))
    }

    async fn save_mixer_state(&self, ad_id: &str, state: &MixerState) -> CoreResult<()> {
        MixerStateRepo::upsert(&self.pool, ad_id, state)
            .await
            .map_err(storage_error)
    }

    async fn get_mixer_volumes(&self, ad_id: &str) -> CoreResult<BTreeMap<String, f64>> {
        let rows = MixerVolumeRepo::list(&self.pool, ad_id)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(|r| (r.track_id, r.volume)).collect())
    }

    async fn set_mixer_volume(&self, ad_id: &str, track_id: &str, volume: f64) -> CoreResult<()> {
        validate_track_volume(volume)?;
        MixerVolumeRepo::upsert(&self.pool, ad_id, track_id, volume)
            .await
            .map_err(storage_error)
    }

    async fn clear_mixer_volume(&self, ad_id: &str, track_id: &str) -> CoreResult<()> {
        MixerVolumeRepo::delete(&self.pool, ad_id, track_id)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn health_check(&self) -> CoreResult<()> {
        crate::health_check(&self.pool).await.map_err(storage_error)
    }
}
