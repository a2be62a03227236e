//! Mixer rebuild: active versions in, persisted [`MixerState`] out.
//!
//! A rebuild reads the three streams' active versions, flattens them into
//! mixer tracks, places them on the timeline, and writes the result once.
//! Any store failure aborts before the write, so a half-built mixer is never
//! persisted and the previous state stays servable.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::error::CoreResult;
use crate::mixer::{durations_by_id, ActiveStreams, MixerState, MixerTrack};
use crate::stream::StreamKind;
use crate::timeline::{calculate_timings, TimelineEntry};
use crate::version::Version;
use crate::version_store::VersionStore;

/// Rebuild and persist the mixer for `ad_id`.
///
/// Re-running with unchanged inputs yields the same state apart from
/// `last_calculated`.
pub async fn rebuild_mixer(store: &dyn VersionStore, ad_id: &str) -> CoreResult<MixerState> {
    tracing::debug!(ad_id, "Rebuilding mixer");

    let (voices, music, sfx) = tokio::try_join!(
        load_active(store, ad_id, StreamKind::Voices),
        load_active(store, ad_id, StreamKind::Music),
        load_active(store, ad_id, StreamKind::Sfx),
    )?;
    let streams = ActiveStreams { voices, music, sfx };

    let tracks: Vec<MixerTrack> = streams.mixer_tracks();
    let entries: Vec<TimelineEntry> = tracks.iter().map(MixerTrack::timeline_entry).collect();
    let timeline = calculate_timings(&entries, &durations_by_id(&tracks))?;

    let state = MixerState {
        tracks,
        volumes: BTreeMap::new(),
        calculated_tracks: timeline.calculated_tracks,
        total_duration: timeline.total_duration,
        last_calculated: Utc::now(),
        active_versions: streams.snapshot(),
    };

    store.save_mixer_state(ad_id, &state).await?;

    tracing::info!(
        ad_id,
        track_count = state.tracks.len(),
        total_duration = state.total_duration,
        "Mixer rebuilt"
    );
    Ok(state)
}

/// Last persisted mixer state with user volume overrides applied.
pub async fn get_mixer_state(
    store: &dyn VersionStore,
    ad_id: &str,
) -> CoreResult<Option<MixerState>> {
    let Some(state) = store.get_mixer_state(ad_id).await? else {
        return Ok(None);
    };
    let volumes = store.get_mixer_volumes(ad_id).await?;
    Ok(Some(state.with_volumes(&volumes)))
}

/// The active version of one stream, or `None` when unset or dangling.
async fn load_active(
    store: &dyn VersionStore,
    ad_id: &str,
    stream: StreamKind,
) -> CoreResult<Option<Version>> {
    let Some(version_id) = store.get_active_version(ad_id, stream).await? else {
        return Ok(None);
    };
    let version = store.get_version(ad_id, stream, &version_id).await?;
    if version.is_none() {
        tracing::warn!(
            ad_id,
            stream = %stream,
            version_id = %version_id,
            "Active version pointer is dangling, treating stream as empty"
        );
    }
    Ok(version)
}
