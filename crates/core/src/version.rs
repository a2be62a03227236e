//! Version records and their per-stream payloads.
//!
//! Store implementations persist [`Version`] as an opaque blob; the rules
//! here (readiness, generated-clip recording, kind checks) are shared by all
//! of them so the persistence layer never re-implements domain logic.

use serde::{Deserialize, Serialize};

use crate::clip::resolve_clip_url;
use crate::error::CoreError;
use crate::stream::{StreamKind, VersionStatus};
use crate::types::{Timestamp, VersionId};

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Text-to-speech providers a voice track can be generated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceProvider {
    ElevenLabs,
    OpenAi,
    Lovo,
    Qwen,
    ByteDance,
    Lahajati,
}

impl VoiceProvider {
    pub fn name(self) -> &'static str {
        match self {
            Self::ElevenLabs => "elevenlabs",
            Self::OpenAi => "openai",
            Self::Lovo => "lovo",
            Self::Qwen => "qwen",
            Self::ByteDance => "bytedance",
            Self::Lahajati => "lahajati",
        }
    }
}

/// Music sources. `Custom` is a user upload, not a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicProvider {
    Loudly,
    Mubert,
    ElevenLabs,
    Custom,
}

impl MusicProvider {
    pub fn name(self) -> &'static str {
        match self {
            Self::Loudly => "loudly",
            Self::Mubert => "mubert",
            Self::ElevenLabs => "elevenlabs",
            Self::Custom => "custom",
        }
    }

    /// Human-readable label used as the mixer label prefix.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Loudly => "Loudly",
            Self::Mubert => "Mubert",
            Self::ElevenLabs => "ElevenLabs",
            Self::Custom => "Custom",
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Which voice speaks a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRef {
    pub id: String,
    pub provider: VoiceProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTrack {
    pub text: String,
    pub voice: VoiceRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_concurrent: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceVersion {
    pub tracks: Vec<VoiceTrack>,
    /// Legacy index-aligned URLs; superseded by `VoiceTrack::generated_url`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_urls: Vec<Option<String>>,
}

impl VoiceVersion {
    /// URL for track `index`, embedded or legacy.
    pub fn clip_url(&self, index: usize) -> Option<&str> {
        let track = self.tracks.get(index)?;
        resolve_clip_url(track.generated_url.as_deref(), index, &self.generated_urls)
            .map(|source| source.url())
    }

    /// Every track resolves a URL. Partial generation is not ready.
    pub fn is_ready(&self) -> bool {
        !self.tracks.is_empty() && (0..self.tracks.len()).all(|i| self.clip_url(i).is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicVersion {
    pub music_prompt: String,
    pub provider: MusicProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_url: Option<String>,
    pub duration: f64,
}

impl MusicVersion {
    pub fn clip_url(&self) -> Option<&str> {
        self.generated_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfxPrompt {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_concurrent: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SfxVersion {
    pub prompts: Vec<SfxPrompt>,
    #[serde(default)]
    pub generated_urls: Vec<Option<String>>,
}

impl SfxVersion {
    pub fn clip_url(&self, index: usize) -> Option<&str> {
        if index >= self.prompts.len() {
            return None;
        }
        resolve_clip_url(None, index, &self.generated_urls).map(|source| source.url())
    }

    pub fn is_ready(&self) -> bool {
        !self.prompts.is_empty() && (0..self.prompts.len()).all(|i| self.clip_url(i).is_some())
    }
}

/// Kind-specific content of a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VersionPayload {
    Voices(VoiceVersion),
    Music(MusicVersion),
    Sfx(SfxVersion),
}

impl VersionPayload {
    /// Content of a freshly created draft.
    pub fn empty(stream: StreamKind) -> Self {
        match stream {
            StreamKind::Voices => Self::Voices(VoiceVersion::default()),
            StreamKind::Music => Self::Music(MusicVersion {
                music_prompt: String::new(),
                provider: MusicProvider::Loudly,
                generated_url: None,
                duration: 0.0,
            }),
            StreamKind::Sfx => Self::Sfx(SfxVersion::default()),
        }
    }

    pub fn stream_kind(&self) -> StreamKind {
        match self {
            Self::Voices(_) => StreamKind::Voices,
            Self::Music(_) => StreamKind::Music,
            Self::Sfx(_) => StreamKind::Sfx,
        }
    }

    /// Every track/prompt has a resolvable URL.
    pub fn has_audio(&self) -> bool {
        match self {
            Self::Voices(v) => v.is_ready(),
            Self::Music(m) => m.clip_url().is_some(),
            Self::Sfx(s) => s.is_ready(),
        }
    }

    /// Reject a payload written into the wrong stream.
    pub fn ensure_kind(&self, stream: StreamKind) -> Result<(), CoreError> {
        if self.stream_kind() == stream {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Payload of kind '{}' cannot be stored in the '{stream}' stream",
                self.stream_kind()
            )))
        }
    }

    /// Reject authored numbers the timeline cannot place.
    ///
    /// Voice and sfx durations must be positive when present. Music
    /// duration may be zero until a clip is generated, never negative.
    /// Overlaps must be finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Voices(v) => {
                for (i, track) in v.tracks.iter().enumerate() {
                    if let Some(d) = track.generated_duration {
                        check_positive_duration(&format!("Track {i} duration"), d)?;
                    }
                    check_overlap(i, track.overlap)?;
                }
            }
            Self::Music(m) => {
                if !m.duration.is_finite() || m.duration < 0.0 {
                    return Err(CoreError::Validation(format!(
                        "Music duration must not be negative, got {}",
                        m.duration
                    )));
                }
            }
            Self::Sfx(s) => {
                for (i, prompt) in s.prompts.iter().enumerate() {
                    if let Some(d) = prompt.duration {
                        check_positive_duration(&format!("Prompt {i} duration"), d)?;
                    }
                    check_overlap(i, prompt.overlap)?;
                }
            }
        }
        Ok(())
    }

    /// Write a provider result onto track/prompt `clip.index`.
    ///
    /// Music only has index 0. Authored fields are left untouched.
    pub fn apply_generated_clip(&mut self, clip: &GeneratedClip) -> Result<(), CoreError> {
        if clip.url.trim().is_empty() {
            return Err(CoreError::Validation("Generated URL must not be empty".into()));
        }
        if let Some(d) = clip.duration {
            check_positive_duration("Generated duration", d)?;
        }

        match self {
            Self::Voices(v) => {
                let track = v.tracks.get_mut(clip.index).ok_or_else(|| out_of_range(clip.index))?;
                track.generated_url = Some(clip.url.clone());
                if clip.duration.is_some() {
                    track.generated_duration = clip.duration;
                }
            }
            Self::Music(m) => {
                if clip.index != 0 {
                    return Err(out_of_range(clip.index));
                }
                m.generated_url = Some(clip.url.clone());
                if let Some(d) = clip.duration {
                    m.duration = d;
                }
            }
            Self::Sfx(s) => {
                let prompt = s.prompts.get_mut(clip.index).ok_or_else(|| out_of_range(clip.index))?;
                if clip.duration.is_some() {
                    prompt.duration = clip.duration;
                }
                if s.generated_urls.len() <= clip.index {
                    s.generated_urls.resize(clip.index + 1, None);
                }
                s.generated_urls[clip.index] = Some(clip.url.clone());
            }
        }
        Ok(())
    }
}

fn check_positive_duration(label: &str, d: f64) -> Result<(), CoreError> {
    if d.is_finite() && d > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{label} must be a positive number of seconds, got {d}"
        )))
    }
}

fn check_overlap(index: usize, overlap: Option<f64>) -> Result<(), CoreError> {
    match overlap {
        Some(o) if !o.is_finite() => Err(CoreError::Validation(format!(
            "Overlap of track {index} must be a finite number of seconds"
        ))),
        _ => Ok(()),
    }
}

fn out_of_range(index: usize) -> CoreError {
    CoreError::Validation(format!("No track at index {index}"))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A provider result for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedClip {
    pub index: usize,
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One entry in a stream's version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub status: VersionStatus,
    pub payload: VersionPayload,
    /// Natural-language instruction that produced this version.
    pub request_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Version {
    /// A fresh, empty draft for `stream`.
    pub fn new_draft(id: VersionId, stream: StreamKind, now: Timestamp) -> Self {
        Self {
            id,
            status: VersionStatus::Draft,
            payload: VersionPayload::empty(stream),
            request_text: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deep copy under a new id. Only final versions can be cloned.
    pub fn clone_as(&self, id: VersionId, now: Timestamp) -> Result<Self, CoreError> {
        if !self.is_final() {
            return Err(CoreError::Conflict(format!(
                "Version {} is still a draft and cannot be cloned",
                self.id
            )));
        }
        Ok(Self {
            id,
            status: VersionStatus::Final,
            payload: self.payload.clone(),
            request_text: self.request_text.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_audio(&self) -> bool {
        self.payload.has_audio()
    }

    pub fn is_final(&self) -> bool {
        self.status == VersionStatus::Final
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn voice_track(text: &str, url: Option<&str>) -> VoiceTrack {
        VoiceTrack {
            text: text.to_string(),
            voice: VoiceRef {
                id: "rachel".to_string(),
                provider: VoiceProvider::ElevenLabs,
                name: None,
            },
            generated_url: url.map(str::to_string),
            generated_duration: None,
            play_after: None,
            overlap: None,
            is_concurrent: None,
        }
    }

    fn sfx_prompt(description: &str) -> SfxPrompt {
        SfxPrompt {
            description: description.to_string(),
            duration: None,
            play_after: None,
            overlap: None,
            is_concurrent: None,
        }
    }

    // -- Readiness --

    #[test]
    fn partially_generated_voice_version_is_not_ready() {
        let v = VoiceVersion {
            tracks: vec![voice_track("a", Some("u0")), voice_track("b", None)],
            generated_urls: vec![],
        };
        assert!(!v.is_ready());
    }

    #[test]
    fn legacy_array_completes_voice_readiness() {
        let v = VoiceVersion {
            tracks: vec![voice_track("a", Some("u0")), voice_track("b", None)],
            generated_urls: vec![None, Some("u1".to_string())],
        };
        assert!(v.is_ready());
        assert_eq!(v.clip_url(1), Some("u1"));
    }

    #[test]
    fn empty_versions_have_no_audio() {
        for stream in StreamKind::ALL {
            assert!(!VersionPayload::empty(stream).has_audio(), "{stream}");
        }
    }

    #[test]
    fn sfx_readiness_requires_every_prompt() {
        let mut s = SfxVersion {
            prompts: vec![sfx_prompt("whoosh"), sfx_prompt("ding")],
            generated_urls: vec![Some("w".to_string())],
        };
        assert!(!s.is_ready());
        s.generated_urls.push(Some("d".to_string()));
        assert!(s.is_ready());
    }

    // -- Kind checks --

    #[test]
    fn ensure_kind_rejects_mismatch() {
        let payload = VersionPayload::empty(StreamKind::Music);
        assert!(payload.ensure_kind(StreamKind::Music).is_ok());
        let err = payload.ensure_kind(StreamKind::Sfx).unwrap_err();
        assert!(err.to_string().contains("music"));
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let json = serde_json::to_value(VersionPayload::empty(StreamKind::Sfx)).unwrap();
        assert_eq!(json["kind"], "sfx");
        assert!(json["prompts"].as_array().unwrap().is_empty());
    }

    // -- Generated clips --

    #[test]
    fn generated_clip_lands_on_voice_track() {
        let mut payload = VersionPayload::Voices(VoiceVersion {
            tracks: vec![voice_track("hi", None)],
            generated_urls: vec![],
        });
        payload
            .apply_generated_clip(&GeneratedClip {
                index: 0,
                url: "https://cdn/v0.mp3".to_string(),
                duration: Some(2.4),
            })
            .unwrap();
        let VersionPayload::Voices(v) = &payload else {
            panic!("expected voices payload");
        };
        assert_eq!(v.tracks[0].generated_url.as_deref(), Some("https://cdn/v0.mp3"));
        assert_eq!(v.tracks[0].generated_duration, Some(2.4));
        assert!(payload.has_audio());
    }

    #[test]
    fn generated_clip_grows_sfx_legacy_array() {
        let mut payload = VersionPayload::Sfx(SfxVersion {
            prompts: vec![sfx_prompt("a"), sfx_prompt("b"), sfx_prompt("c")],
            generated_urls: vec![],
        });
        payload
            .apply_generated_clip(&GeneratedClip {
                index: 2,
                url: "https://cdn/c.mp3".to_string(),
                duration: None,
            })
            .unwrap();
        let VersionPayload::Sfx(s) = &payload else {
            panic!("expected sfx payload");
        };
        assert_eq!(s.generated_urls.len(), 3);
        assert_eq!(s.clip_url(2), Some("https://cdn/c.mp3"));
        assert_eq!(s.clip_url(0), None);
    }

    #[test]
    fn generated_clip_out_of_range_is_rejected() {
        let mut payload = VersionPayload::empty(StreamKind::Music);
        let err = payload
            .apply_generated_clip(&GeneratedClip {
                index: 1,
                url: "u".to_string(),
                duration: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn generated_clip_rejects_non_positive_duration() {
        let mut payload = VersionPayload::empty(StreamKind::Music);
        assert!(payload
            .apply_generated_clip(&GeneratedClip {
                index: 0,
                url: "u".to_string(),
                duration: Some(0.0),
            })
            .is_err());
    }

    // -- Authored payload checks --

    #[test]
    fn fresh_drafts_pass_validation() {
        for stream in StreamKind::ALL {
            assert!(VersionPayload::empty(stream).validate().is_ok(), "{stream}");
        }
    }

    #[test]
    fn validate_rejects_non_positive_voice_duration() {
        let mut track = voice_track("hello there", Some("u0"));
        track.generated_duration = Some(-2.0);
        let payload = VersionPayload::Voices(VoiceVersion {
            tracks: vec![voice_track("a", Some("u1")), track],
            generated_urls: vec![],
        });
        let err = payload.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m.contains("Track 1")));
    }

    #[test]
    fn validate_rejects_negative_music_duration() {
        let VersionPayload::Music(mut music) = VersionPayload::empty(StreamKind::Music) else {
            panic!("expected music payload");
        };
        music.duration = -5.0;
        assert!(matches!(
            VersionPayload::Music(music).validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_sfx_duration_and_infinite_overlap() {
        let mut prompt = sfx_prompt("thud");
        prompt.duration = Some(0.0);
        let zero = VersionPayload::Sfx(SfxVersion {
            prompts: vec![prompt],
            generated_urls: vec![],
        });
        assert!(zero.validate().is_err());

        let mut prompt = sfx_prompt("thud");
        prompt.overlap = Some(f64::INFINITY);
        let infinite = VersionPayload::Sfx(SfxVersion {
            prompts: vec![prompt],
            generated_urls: vec![],
        });
        assert!(infinite.validate().is_err());
    }

    // -- Records --

    #[test]
    fn clone_copies_content_under_new_id() {
        let now = chrono::Utc::now();
        let mut original = Version::new_draft("a".to_string(), StreamKind::Sfx, now);
        original.status = VersionStatus::Final;
        original.request_text = Some("add a whoosh".to_string());

        let copy = original.clone_as("b".to_string(), now).unwrap();
        assert_eq!(copy.id, "b");
        assert_eq!(copy.status, VersionStatus::Final);
        assert_eq!(copy.payload, original.payload);
        assert_eq!(copy.request_text, original.request_text);
    }

    #[test]
    fn drafts_cannot_be_cloned() {
        let draft = Version::new_draft("a".to_string(), StreamKind::Voices, chrono::Utc::now());
        assert!(matches!(
            draft.clone_as("b".to_string(), chrono::Utc::now()),
            Err(CoreError::Conflict(_))
        ));
    }

    #[test]
    fn legacy_generated_urls_deserialize_with_nulls() {
        let json = serde_json::json!({
            "kind": "voices",
            "tracks": [
                {"text": "a", "voice": {"id": "v", "provider": "lovo"}},
                {"text": "b", "voice": {"id": "v", "provider": "lovo"}}
            ],
            "generated_urls": ["https://cdn/a.mp3", null]
        });
        let payload: VersionPayload = serde_json::from_value(json).unwrap();
        assert!(!payload.has_audio());
    }
}
