//! Generated-audio URL resolution.
//!
//! Older versions stored generated URLs in a sibling array aligned by index
//! with the tracks; newer ones embed `generated_url` on each track. Both
//! shapes resolve through [`resolve_clip_url`].

/// Where a track's playable URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSource<'a> {
    /// `generated_url` embedded on the track itself.
    Embedded(&'a str),
    /// Entry `index` of the legacy `generated_urls` array.
    LegacyIndexed { url: &'a str, index: usize },
}

impl<'a> ClipSource<'a> {
    pub fn url(&self) -> &'a str {
        match *self {
            Self::Embedded(url) => url,
            Self::LegacyIndexed { url, .. } => url,
        }
    }
}

/// Resolve the URL for the track at `index`.
///
/// The embedded URL takes precedence. Empty strings count as missing in
/// both places.
pub fn resolve_clip_url<'a>(
    embedded: Option<&'a str>,
    index: usize,
    legacy: &'a [Option<String>],
) -> Option<ClipSource<'a>> {
    if let Some(url) = embedded.filter(|u| !u.trim().is_empty()) {
        return Some(ClipSource::Embedded(url));
    }
    legacy
        .get(index)
        .and_then(|entry| entry.as_deref())
        .filter(|u| !u.trim().is_empty())
        .map(|url| ClipSource::LegacyIndexed { url, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_url_wins() {
        let legacy = vec![Some("https://cdn/old.mp3".to_string())];
        let source = resolve_clip_url(Some("https://cdn/new.mp3"), 0, &legacy).unwrap();
        assert_eq!(source, ClipSource::Embedded("https://cdn/new.mp3"));
    }

    #[test]
    fn falls_back_to_legacy_array_by_index() {
        let legacy = vec![None, Some("https://cdn/1.mp3".to_string())];
        let source = resolve_clip_url(None, 1, &legacy).unwrap();
        assert_eq!(
            source,
            ClipSource::LegacyIndexed {
                url: "https://cdn/1.mp3",
                index: 1
            }
        );
        assert_eq!(source.url(), "https://cdn/1.mp3");
    }

    #[test]
    fn empty_strings_are_missing() {
        let legacy = vec![Some(String::new())];
        assert!(resolve_clip_url(Some(""), 0, &legacy).is_none());
    }

    #[test]
    fn index_beyond_legacy_array_is_missing() {
        let legacy = vec![Some("https://cdn/0.mp3".to_string())];
        assert!(resolve_clip_url(None, 3, &legacy).is_none());
    }
}
