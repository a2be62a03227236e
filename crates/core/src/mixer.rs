//! Mixer tracks and mixer state.
//!
//! Flattens the active version of each stream into rendering-ready
//! [`MixerTrack`]s in the fixed order voices, music, sfx. The resulting
//! [`MixerState`] is fully derived except for user volume overrides.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::duration::resolve_voice_duration;
use crate::error::CoreError;
use crate::placement::PlacementIntent;
use crate::timeline::{CalculatedTrack, TimelineEntry, TrackType, DEFAULT_SFX_DURATION_SECS};
use crate::types::{Timestamp, VersionId};
use crate::version::{MusicProvider, MusicVersion, SfxVersion, Version, VersionPayload, VoiceVersion};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Characters of the music prompt kept in a generated track's label.
pub const MUSIC_LABEL_PROMPT_CHARS: usize = 25;

/// Allowed range for a per-track volume override.
pub const MIN_TRACK_VOLUME: f64 = 0.0;
pub const MAX_TRACK_VOLUME: f64 = 2.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a mixer track came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub version_id: VersionId,
    pub source_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Duration as authored or measured, before any trimming in the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerTrack {
    /// `{type}-{versionId}-{index}`, stable while the source is unchanged.
    pub id: String,
    #[serde(rename = "type")]
    pub track_type: TrackType,
    pub url: String,
    pub label: String,
    pub duration: f64,
    pub placement: PlacementIntent,
    pub metadata: TrackMetadata,
}

impl MixerTrack {
    pub fn timeline_entry(&self) -> TimelineEntry {
        TimelineEntry {
            id: self.id.clone(),
            track_type: self.track_type,
            placement: self.placement.clone(),
            duration: Some(self.duration),
        }
    }
}

/// Which version fed each stream at rebuild time. Display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveVersions {
    pub voices: Option<VersionId>,
    pub music: Option<VersionId>,
    pub sfx: Option<VersionId>,
}

/// Persisted output of a mixer rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerState {
    pub tracks: Vec<MixerTrack>,
    /// Sparse per-track overrides, set only by explicit user action.
    pub volumes: BTreeMap<String, f64>,
    pub calculated_tracks: Vec<CalculatedTrack>,
    pub total_duration: f64,
    pub last_calculated: Timestamp,
    pub active_versions: ActiveVersions,
}

impl MixerState {
    /// Overlay persisted volume overrides for tracks still in the mix.
    pub fn with_volumes(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for track in &self.tracks {
            if let Some(volume) = overrides.get(&track.id) {
                self.volumes.insert(track.id.clone(), *volume);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// The active version of each stream, already loaded.
#[derive(Debug, Clone, Default)]
pub struct ActiveStreams {
    pub voices: Option<Version>,
    pub music: Option<Version>,
    pub sfx: Option<Version>,
}

impl ActiveStreams {
    pub fn snapshot(&self) -> ActiveVersions {
        ActiveVersions {
            voices: self.voices.as_ref().map(|v| v.id.clone()),
            music: self.music.as_ref().map(|v| v.id.clone()),
            sfx: self.sfx.as_ref().map(|v| v.id.clone()),
        }
    }

    /// All playable tracks: voices, then music, then sfx.
    pub fn mixer_tracks(&self) -> Vec<MixerTrack> {
        let refs = ReferenceResolver {
            voices: self.voices.as_ref().map(|v| v.id.as_str()),
            music: self.music.as_ref().map(|v| v.id.as_str()),
            sfx: self.sfx.as_ref().map(|v| v.id.as_str()),
        };

        let mut tracks = Vec::new();
        if let Some(Version {
            id,
            payload: VersionPayload::Voices(voices),
            ..
        }) = &self.voices
        {
            tracks.extend(voice_tracks(id, voices, &refs));
        }
        if let Some(Version {
            id,
            payload: VersionPayload::Music(music),
            ..
        }) = &self.music
        {
            tracks.extend(music_track(id, music));
        }
        if let Some(Version {
            id,
            payload: VersionPayload::Sfx(sfx),
            ..
        }) = &self.sfx
        {
            tracks.extend(sfx_tracks(id, sfx, &refs));
        }
        tracks
    }
}

/// Resolved duration per track id, as handed to the timeline calculator.
pub fn durations_by_id(tracks: &[MixerTrack]) -> HashMap<String, f64> {
    tracks.iter().map(|t| (t.id.clone(), t.duration)).collect()
}

pub fn mixer_track_id(track_type: TrackType, version_id: &str, index: usize) -> String {
    format!("{}-{version_id}-{index}", track_type.id_prefix())
}

/// Expands stream-relative shorthand (`voice-2`, `sfx-0`, `music`) into
/// mixer track ids of the active versions. Anything else passes through.
struct ReferenceResolver<'a> {
    voices: Option<&'a str>,
    music: Option<&'a str>,
    sfx: Option<&'a str>,
}

impl ReferenceResolver<'_> {
    fn resolve(&self, reference: &str) -> String {
        if reference == TrackType::Music.id_prefix() {
            if let Some(id) = self.music {
                return mixer_track_id(TrackType::Music, id, 0);
            }
        }
        for (track_type, version_id) in [
            (TrackType::Voice, self.voices),
            (TrackType::Soundfx, self.sfx),
        ] {
            let (Some(version_id), Some(rest)) = (
                version_id,
                reference
                    .strip_prefix(track_type.id_prefix())
                    .and_then(|r| r.strip_prefix('-')),
            ) else {
                continue;
            };
            if let Ok(index) = rest.parse::<usize>() {
                return mixer_track_id(track_type, version_id, index);
            }
        }
        reference.to_string()
    }
}

/// Voice tracks contribute nothing unless every one of them has audio.
fn voice_tracks(version_id: &str, voices: &VoiceVersion, refs: &ReferenceResolver) -> Vec<MixerTrack> {
    if !voices.is_ready() {
        tracing::debug!(version_id, "Voice version not fully generated, skipping");
        return Vec::new();
    }

    voices
        .tracks
        .iter()
        .enumerate()
        .filter_map(|(index, track)| {
            let url = voices.clip_url(index)?;
            let duration = resolve_voice_duration(track.generated_duration, &track.text);
            Some(MixerTrack {
                id: mixer_track_id(TrackType::Voice, version_id, index),
                track_type: TrackType::Voice,
                url: url.to_string(),
                label: track
                    .voice
                    .name
                    .clone()
                    .unwrap_or_else(|| track.voice.id.clone()),
                duration,
                placement: PlacementIntent::from_authored(
                    track.play_after.as_deref(),
                    track.overlap,
                    track.is_concurrent.unwrap_or(false),
                    |r| refs.resolve(r),
                ),
                metadata: TrackMetadata {
                    version_id: version_id.to_string(),
                    source_index: index,
                    voice_id: Some(track.voice.id.clone()),
                    provider: Some(track.voice.provider.name().to_string()),
                    prompt: Some(track.text.clone()),
                    original_duration: Some(duration),
                },
            })
        })
        .collect()
}

fn music_track(version_id: &str, music: &MusicVersion) -> Option<MixerTrack> {
    let url = music.clip_url()?;
    Some(MixerTrack {
        id: mixer_track_id(TrackType::Music, version_id, 0),
        track_type: TrackType::Music,
        url: url.to_string(),
        label: music_label(music.provider, &music.music_prompt),
        duration: music.duration,
        placement: PlacementIntent::AtStart,
        metadata: TrackMetadata {
            version_id: version_id.to_string(),
            source_index: 0,
            voice_id: None,
            provider: Some(music.provider.name().to_string()),
            prompt: Some(music.music_prompt.clone()),
            original_duration: Some(music.duration),
        },
    })
}

/// Sfx prompts are independent clips; ungenerated ones are skipped.
fn sfx_tracks(version_id: &str, sfx: &SfxVersion, refs: &ReferenceResolver) -> Vec<MixerTrack> {
    sfx.prompts
        .iter()
        .enumerate()
        .filter_map(|(index, prompt)| {
            let url = sfx.clip_url(index)?;
            let duration = prompt.duration.unwrap_or(DEFAULT_SFX_DURATION_SECS);
            Some(MixerTrack {
                id: mixer_track_id(TrackType::Soundfx, version_id, index),
                track_type: TrackType::Soundfx,
                url: url.to_string(),
                label: prompt.description.clone(),
                duration,
                placement: PlacementIntent::from_authored(
                    prompt.play_after.as_deref(),
                    prompt.overlap,
                    prompt.is_concurrent.unwrap_or(false),
                    |r| refs.resolve(r),
                ),
                metadata: TrackMetadata {
                    version_id: version_id.to_string(),
                    source_index: index,
                    voice_id: None,
                    provider: None,
                    prompt: Some(prompt.description.clone()),
                    original_duration: prompt.duration,
                },
            })
        })
        .collect()
}

/// `"{Provider} - {prompt}"`, prompt cut to 25 chars plus `...`.
///
/// Custom uploads use the raw prompt (a file name or description) verbatim.
pub fn music_label(provider: MusicProvider, prompt: &str) -> String {
    if provider == MusicProvider::Custom {
        return prompt.to_string();
    }
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(MUSIC_LABEL_PROMPT_CHARS).collect();
    let ellipsis = if chars.next().is_some() { "..." } else { "" };
    format!("{} - {head}{ellipsis}", provider.display_name())
}

/// Validate a user volume override.
pub fn validate_track_volume(volume: f64) -> Result<(), CoreError> {
    if volume.is_finite() && (MIN_TRACK_VOLUME..=MAX_TRACK_VOLUME).contains(&volume) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Volume must be between {MIN_TRACK_VOLUME} and {MAX_TRACK_VOLUME}, got {volume}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
