//! In-process store for development and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use adforge_core::error::{CoreError, CoreResult};
use adforge_core::mixer::{validate_track_volume, MixerState};
use adforge_core::stream::{StreamKind, VersionStatus};
use adforge_core::types::{AdId, VersionId};
use adforge_core::version::{GeneratedClip, Version, VersionPayload};
use adforge_core::version_store::VersionStore;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{draft_not_found, new_version_id, version_not_found};

#[derive(Debug, Default)]
struct StreamRecord {
    /// Creation order.
    versions: Vec<Version>,
    active: Option<VersionId>,
    draft: Option<VersionId>,
}

impl StreamRecord {
    fn find(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    fn find_mut(&mut self, version_id: &str) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| v.id == version_id)
    }
}

#[derive(Debug, Default)]
struct AdRecord {
    streams: HashMap<StreamKind, StreamRecord>,
    mixer: Option<MixerState>,
    volumes: BTreeMap<String, f64>,
}

impl AdRecord {
    fn stream(&self, stream: StreamKind) -> Option<&StreamRecord> {
        self.streams.get(&stream)
    }

    fn stream_mut(&mut self, stream: StreamKind) -> &mut StreamRecord {
        self.streams.entry(stream).or_default()
    }
}

/// The stream record if the ad and stream have ever been written.
///
/// Lookups that end in `NotFound` go through here so they never create
/// empty records.
fn existing_stream<'a>(
    ads: &'a mut HashMap<AdId, AdRecord>,
    ad_id: &str,
    stream: StreamKind,
) -> Option<&'a mut StreamRecord> {
    ads.get_mut(ad_id).and_then(|ad| ad.streams.get_mut(&stream))
}

/// [`VersionStore`] held entirely in memory behind a single `RwLock`.
///
/// Every mutation happens under the write lock, so each operation is atomic
/// with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    ads: RwLock<HashMap<AdId, AdRecord>>,
    unavailable: AtomicBool,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StorageUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> CoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::StorageUnavailable(
                "in-memory store is marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn get_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
    ) -> CoreResult<Option<VersionId>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        Ok(ads
            .get(ad_id)
            .and_then(|ad| ad.stream(stream))
            .and_then(|s| s.active.clone()))
    }

    async fn set_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record = ads.entry(ad_id.to_string()).or_default().stream_mut(stream);
        record.active = Some(version_id.to_string());
        tracing::info!(ad_id, stream = %stream, version_id, "Active version set");
        Ok(())
    }

    async fn get_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<Option<Version>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        Ok(ads
            .get(ad_id)
            .and_then(|ad| ad.stream(stream))
            .and_then(|s| s.find(version_id))
            .cloned())
    }

    async fn list_versions(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Vec<Version>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        Ok(ads
            .get(ad_id)
            .and_then(|ad| ad.stream(stream))
            .map(|s| s.versions.clone())
            .unwrap_or_default())
    }

    async fn clone_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<VersionId> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record =
            existing_stream(&mut ads, ad_id, stream).ok_or_else(|| version_not_found(version_id))?;
        let source = record
            .find(version_id)
            .ok_or_else(|| version_not_found(version_id))?;
        let copy = source.clone_as(new_version_id(), Utc::now())?;
        let new_id = copy.id.clone();
        record.versions.push(copy);
        tracing::info!(ad_id, stream = %stream, source_id = version_id, version_id = %new_id, "Version cloned");
        Ok(new_id)
    }

    async fn delete_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record =
            existing_stream(&mut ads, ad_id, stream).ok_or_else(|| version_not_found(version_id))?;
        let position = record
            .versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| version_not_found(version_id))?;
        record.versions.remove(position);

        let was_active = record.active.as_deref() == Some(version_id);
        if was_active {
            record.active = None;
        }
        if record.draft.as_deref() == Some(version_id) {
            record.draft = None;
        }
        tracing::info!(ad_id, stream = %stream, version_id, was_active, "Version deleted");
        Ok(())
    }

    async fn record_generated_clip(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        clip: &GeneratedClip,
    ) -> CoreResult<Version> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record =
            existing_stream(&mut ads, ad_id, stream).ok_or_else(|| version_not_found(version_id))?;
        let version = record
            .find_mut(version_id)
            .ok_or_else(|| version_not_found(version_id))?;

        // Apply to a copy so a rejected clip leaves the stored version intact.
        let mut payload = version.payload.clone();
        payload.apply_generated_clip(clip)?;
        version.payload = payload;
        version.updated_at = Utc::now();
        tracing::debug!(ad_id, stream = %stream, version_id, index = clip.index, "Generated clip recorded");
        Ok(version.clone())
    }

    async fn get_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Option<Version>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        let Some(record) = ads.get(ad_id).and_then(|ad| ad.stream(stream)) else {
            return Ok(None);
        };
        Ok(record
            .draft
            .as_deref()
            .and_then(|id| record.find(id))
            .cloned())
    }

    async fn create_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<VersionId> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record = ads.entry(ad_id.to_string()).or_default().stream_mut(stream);

        let before = record.versions.len();
        record.versions.retain(|v| v.status != VersionStatus::Draft);
        let replaced = before - record.versions.len();

        let draft = Version::new_draft(new_version_id(), stream, Utc::now());
        let draft_id = draft.id.clone();
        record.versions.push(draft);
        record.draft = Some(draft_id.clone());

        tracing::info!(ad_id, stream = %stream, version_id = %draft_id, replaced, "Draft created");
        Ok(draft_id)
    }

    async fn update_draft(
        &self,
        ad_id: &str,
        stream: StreamKind,
        payload: VersionPayload,
        request_text: Option<String>,
    ) -> CoreResult<Version> {
        self.ensure_available()?;
        payload.ensure_kind(stream)?;
        payload.validate()?;
        let mut ads = self.ads.write().await;
        let record =
            existing_stream(&mut ads, ad_id, stream).ok_or_else(|| draft_not_found(ad_id, stream))?;
        let draft_id = record
            .draft
            .clone()
            .ok_or_else(|| draft_not_found(ad_id, stream))?;
        let draft = record
            .find_mut(&draft_id)
            .ok_or_else(|| draft_not_found(ad_id, stream))?;

        draft.payload = payload;
        draft.request_text = request_text;
        draft.updated_at = Utc::now();
        Ok(draft.clone())
    }

    async fn finalize_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Version> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        let record =
            existing_stream(&mut ads, ad_id, stream).ok_or_else(|| draft_not_found(ad_id, stream))?;
        let draft_id = record
            .draft
            .take()
            .ok_or_else(|| draft_not_found(ad_id, stream))?;
        let Some(version) = record.find_mut(&draft_id) else {
            return Err(draft_not_found(ad_id, stream));
        };

        version.status = VersionStatus::Final;
        version.updated_at = Utc::now();
        tracing::info!(ad_id, stream = %stream, version_id = %draft_id, "Draft finalized");
        Ok(version.clone())
    }

    async fn get_mixer_state(&self, ad_id: &str) -> CoreResult<Option<MixerState>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        Ok(ads.get(ad_id).and_then(|ad| ad.mixer.clone()))
    }

    async fn save_mixer_state(&self, ad_id: &str, state: &MixerState) -> CoreResult<()> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        ads.entry(ad_id.to_string()).or_default().mixer = Some(state.clone());
        Ok(())
    }

    async fn get_mixer_volumes(&self, ad_id: &str) -> CoreResult<BTreeMap<String, f64>> {
        self.ensure_available()?;
        let ads = self.ads.read().await;
        Ok(ads.get(ad_id).map(|ad| ad.volumes.clone()).unwrap_or_default())
    }

    async fn set_mixer_volume(&self, ad_id: &str, track_id: &str, volume: f64) -> CoreResult<()> {
        self.ensure_available()?;
        validate_track_volume(volume)?;
        let mut ads = self.ads.write().await;
        ads.entry(ad_id.to_string())
            .or_default()
            .volumes
            .insert(track_id.to_string(), volume);
        Ok(())
    }

    async fn clear_mixer_volume(&self, ad_id: &str, track_id: &str) -> CoreResult<()> {
        self.ensure_available()?;
        let mut ads = self.ads.write().await;
        if let Some(ad) = ads.get_mut(ad_id) {
            ad.volumes.remove(track_id);
        }
        Ok(())
    }

    async fn health_check(&self) -> CoreResult<()> {
        self.ensure_available()
    }
}
