//! Content streams and version status.
//!
//! Every advertisement has exactly one independent version history per
//! [`StreamKind`]. The mixer is assembled from the active version of each.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Stream kinds
// ---------------------------------------------------------------------------

/// One of the three parallel content channels composing an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Voices,
    Music,
    Sfx,
}

impl StreamKind {
    /// All stream kinds in mixer assembly order.
    pub const ALL: [StreamKind; 3] = [Self::Voices, Self::Music, Self::Sfx];

    /// Parse from the persisted `stream_kind` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "voices" => Ok(Self::Voices),
            "music" => Ok(Self::Music),
            "sfx" => Ok(Self::Sfx),
            other => Err(CoreError::Validation(format!(
                "Unknown stream kind '{other}'. Must be one of: voices, music, sfx"
            ))),
        }
    }

    /// Persisted / path name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Voices => "voices",
            Self::Music => "music",
            Self::Sfx => "sfx",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Version status
// ---------------------------------------------------------------------------

/// `draft` versions are still being edited or generated; only `final`
/// versions may become active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Final,
}

impl VersionStatus {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "draft" => Ok(Self::Draft),
            "final" => Ok(Self::Final),
            other => Err(CoreError::Validation(format!(
                "Unknown version status '{other}'"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Final => "final",
        }
    }
}
