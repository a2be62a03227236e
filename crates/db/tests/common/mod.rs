#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use adforge_core::error::{CoreError, CoreResult};
use adforge_core::mixer::MixerState;
use adforge_core::stream::StreamKind;
use adforge_core::types::VersionId;
use adforge_core::version::{
    GeneratedClip, MusicProvider, MusicVersion, SfxPrompt, SfxVersion, Version, VersionPayload,
    VoiceProvider, VoiceRef, VoiceTrack, VoiceVersion,
};
use adforge_core::version_store::VersionStore;
use adforge_db::MemoryVersionStore;
use async_trait::async_trait;

pub const AD: &str = "ad-1";

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn voice_track(text: &str, url: Option<&str>, duration: Option<f64>) -> VoiceTrack {
    VoiceTrack {
        text: text.to_string(),
        voice: VoiceRef {
            id: "voice-abc".to_string(),
            provider: VoiceProvider::ElevenLabs,
            name: Some("Rachel".to_string()),
        },
        generated_url: url.map(str::to_string),
        generated_duration: duration,
        play_after: None,
        overlap: None,
        is_concurrent: None,
    }
}

pub fn voices(tracks: Vec<VoiceTrack>) -> VersionPayload {
    VersionPayload::Voices(VoiceVersion {
        tracks,
        generated_urls: Vec::new(),
    })
}

pub fn music(provider: MusicProvider, prompt: &str, url: Option<&str>, duration: f64) -> VersionPayload {
    VersionPayload::Music(MusicVersion {
        music_prompt: prompt.to_string(),
        provider,
        generated_url: url.map(str::to_string),
        duration,
    })
}

pub fn sfx_prompt(description: &str, duration: Option<f64>, play_after: Option<&str>) -> SfxPrompt {
    SfxPrompt {
        description: description.to_string(),
        duration,
        play_after: play_after.map(str::to_string),
        overlap: None,
        is_concurrent: None,
    }
}

pub fn sfx(prompts: Vec<SfxPrompt>, urls: Vec<Option<&str>>) -> VersionPayload {
    VersionPayload::Sfx(SfxVersion {
        prompts,
        generated_urls: urls.into_iter().map(|u| u.map(str::to_string)).collect(),
    })
}

// ---------------------------------------------------------------------------
// Store helpers
// ---------------------------------------------------------------------------

/// Create, fill and finalize a version without activating it.
pub async fn finalized(
    store: &dyn VersionStore,
    ad_id: &str,
    stream: StreamKind,
    payload: VersionPayload,
) -> VersionId {
    let id = store.create_draft(ad_id, stream).await.unwrap();
    store
        .update_draft(ad_id, stream, payload, None)
        .await
        .unwrap();
    store.finalize_draft(ad_id, stream).await.unwrap();
    id
}

/// Finalize a version and make it the stream's active one.
pub async fn publish(
    store: &dyn VersionStore,
    ad_id: &str,
    stream: StreamKind,
    payload: VersionPayload,
) -> VersionId {
    let id = finalized(store, ad_id, stream, payload).await;
    store.set_active_version(ad_id, stream, &id).await.unwrap();
    id
}

// ---------------------------------------------------------------------------
// Partial outage
// ---------------------------------------------------------------------------

/// Memory store whose active-pointer reads fail for one stream only.
///
/// Every other call, including pointer reads of the remaining streams, goes
/// straight to the wrapped store.
pub struct StreamOutage {
    pub inner: MemoryVersionStore,
    stream: StreamKind,
    failing: AtomicBool,
    /// Pointer reads that reached `inner`.
    pub served_reads: AtomicUsize,
}

impl StreamOutage {
    pub fn new(stream: StreamKind) -> Self {
        Self {
            inner: MemoryVersionStore::new(),
            stream,
            failing: AtomicBool::new(false),
            served_reads: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl VersionStore for StreamOutage {
    async fn get_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
    ) -> CoreResult<Option<VersionId>> {
        if stream == self.stream && self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::StorageUnavailable(format!("{stream} pointer read failed")));
        }
        self.served_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_active_version(ad_id, stream).await
    }

    async fn set_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        self.inner.set_active_version(ad_id, stream, version_id).await
    }

    async fn get_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<Option<Version>> {
        self.inner.get_version(ad_id, stream, version_id).await
    }

    async fn list_versions(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Vec<Version>> {
        self.inner.list_versions(ad_id, stream).await
    }

    async fn clone_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<VersionId> {
        self.inner.clone_version(ad_id, stream, version_id).await
    }

    async fn delete_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()> {
        self.inner.delete_version(ad_id, stream, version_id).await
    }

    async fn record_generated_clip(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        clip: &GeneratedClip,
    ) -> CoreResult<Version> {
        self.inner.record_generated_clip(ad_id, stream, version_id, clip).await
    }

    async fn get_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Option<Version>> {
        self.inner.get_draft(ad_id, stream).await
    }

    async fn create_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<VersionId> {
        self.inner.create_draft(ad_id, stream).await
    }

    async fn update_draft(
        &self,
        ad_id: &str,
        stream: StreamKind,
        payload: VersionPayload,
        request_text: Option<String>,
    ) -> CoreResult<Version> {
        self.inner.update_draft(ad_id, stream, payload, request_text).await
    }

    async fn finalize_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Version> {
        self.inner.finalize_draft(ad_id, stream).await
    }

    async fn get_mixer_state(&self, ad_id: &str) -> CoreResult<Option<MixerState>> {
        self.inner.get_mixer_state(ad_id).await
    }

    async fn save_mixer_state(&self, ad_id: &str, state: &MixerState) -> CoreResult<()> {
        self.inner.save_mixer_state(ad_id, state).await
    }

    async fn get_mixer_volumes(&self, ad_id: &str) -> CoreResult<BTreeMap<String, f64>> {
        self.inner.get_mixer_volumes(ad_id).await
    }

    async fn set_mixer_volume(&self, ad_id: &str, track_id: &str, volume: f64) -> CoreResult<()> {
        self.inner.set_mixer_volume(ad_id, track_id, volume).await
    }

    async fn clear_mixer_volume(&self, ad_id: &str, track_id: &str) -> CoreResult<()> {
        self.inner.clear_mixer_volume(ad_id, track_id).await
    }
}
