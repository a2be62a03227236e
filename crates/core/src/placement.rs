//! Placement intents: when a mixer track starts relative to the others.
//!
//! Authored content stores placement as loose fields (`play_after` holding
//! `"start"`, `"previous"` or a track id, plus `overlap` and
//! `is_concurrent`). They are resolved once into a [`PlacementIntent`] when
//! mixer tracks are built, so the timeline calculator never parses strings.

use serde::{Deserialize, Serialize};

/// `play_after` value anchoring a track to t=0.
pub const PLAY_AFTER_START: &str = "start";

/// `play_after` value anchoring a track to the end of the preceding one.
pub const PLAY_AFTER_PREVIOUS: &str = "previous";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlacementIntent {
    /// Starts when the preceding track in list order ends (t=0 if first).
    #[default]
    Sequential,
    /// Starts at t=0 regardless of list position.
    AtStart,
    /// Starts `overlap` seconds before the preceding track ends.
    AfterPrevious { overlap: f64 },
    /// Starts `overlap` seconds before `track_id` ends.
    AfterTrack { track_id: String, overlap: f64 },
    /// Starts together with `with_track_id`, or with the first track when
    /// no anchor is named.
    Concurrent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with_track_id: Option<String>,
    },
}

impl PlacementIntent {
    /// Resolve authored placement fields.
    ///
    /// `resolve_ref` maps an authored track reference to a mixer track id
    /// (e.g. expanding stream-relative shorthand).
    pub fn from_authored(
        play_after: Option<&str>,
        overlap: Option<f64>,
        is_concurrent: bool,
        resolve_ref: impl Fn(&str) -> String,
    ) -> Self {
        let overlap = overlap.filter(|o| o.is_finite() && *o > 0.0);
        let play_after = play_after.map(str::trim).filter(|p| !p.is_empty());

        if is_concurrent {
            return match play_after {
                Some(PLAY_AFTER_START) => Self::AtStart,
                Some(PLAY_AFTER_PREVIOUS) | None => Self::Concurrent {
                    with_track_id: None,
                },
                Some(reference) => Self::Concurrent {
                    with_track_id: Some(resolve_ref(reference)),
                },
            };
        }

        match play_after {
            Some(PLAY_AFTER_START) => Self::AtStart,
            Some(PLAY_AFTER_PREVIOUS) => Self::AfterPrevious {
                overlap: overlap.unwrap_or(0.0),
            },
            Some(reference) => Self::AfterTrack {
                track_id: resolve_ref(reference),
                overlap: overlap.unwrap_or(0.0),
            },
            None => match overlap {
                Some(overlap) => Self::AfterPrevious { overlap },
                None => Self::Sequential,
            },
        }
    }
}
