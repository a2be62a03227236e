//! The persistence contract the mixer rebuilder and version lifecycle use.
//!
//! Implementations are the sole mutation gateway for version histories, the
//! active-version pointer, and the draft pointer of each (ad, stream) pair.
//! Everything else holds version ids only.
//!
//! Backend failures surface as
//! [`CoreError::StorageUnavailable`](crate::error::CoreError::StorageUnavailable).
//! Nothing behind this trait retries; retry policy belongs to the request
//! handler.
//!
//! Pointer writes are last-writer-wins. Two concurrent `create_draft` calls
//! for the same stream both succeed and the draft pointer ends up naming
//! whichever landed last; at no point are two drafts addressable.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::mixer::MixerState;
use crate::stream::StreamKind;
use crate::types::VersionId;
use crate::version::{GeneratedClip, Version, VersionPayload};

#[async_trait]
pub trait VersionStore: Send + Sync {
    // -- Active pointer --

    async fn get_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
    ) -> CoreResult<Option<VersionId>>;

    /// Overwrite the pointer. Does not check that the version has audio.
    async fn set_active_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()>;

    // -- Versions --

    /// `Ok(None)` for ids that do not exist.
    async fn get_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<Option<Version>>;

    /// History in creation order, drafts included.
    async fn list_versions(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Vec<Version>>;

    /// Deep-copy a final version into a new final version with a fresh id.
    async fn clone_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<VersionId>;

    /// Remove a version, clearing the active and draft pointers if they
    /// named it.
    async fn delete_version(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> CoreResult<()>;

    /// Write a provider result onto one track of a version.
    async fn record_generated_clip(
        &self,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        clip: &GeneratedClip,
    ) -> CoreResult<Version>;

    // -- Drafts --

    async fn get_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Option<Version>>;

    /// Create an empty draft, replacing any existing one.
    async fn create_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<VersionId>;

    async fn update_draft(
        &self,
        ad_id: &str,
        stream: StreamKind,
        payload: VersionPayload,
        request_text: Option<String>,
    ) -> CoreResult<Version>;

    /// Mark the draft final and clear the draft pointer. Does not activate.
    async fn finalize_draft(&self, ad_id: &str, stream: StreamKind) -> CoreResult<Version>;

    // -- Mixer --

    async fn get_mixer_state(&self, ad_id: &str) -> CoreResult<Option<MixerState>>;

    async fn save_mixer_state(&self, ad_id: &str, state: &MixerState) -> CoreResult<()>;

    async fn get_mixer_volumes(&self, ad_id: &str) -> CoreResult<BTreeMap<String, f64>>;

    async fn set_mixer_volume(&self, ad_id: &str, track_id: &str, volume: f64) -> CoreResult<()>;

    async fn clear_mixer_volume(&self, ad_id: &str, track_id: &str) -> CoreResult<()>;

    /// Cheap reachability probe for health checks.
    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }
}
