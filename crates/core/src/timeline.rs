//! Timeline calculation: absolute start offsets from placement intents.
//!
//! Pure and deterministic. Given the same entries and duration map,
//! [`calculate_timings`] always produces the same [`Timeline`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::placement::PlacementIntent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Duration assumed for a sound effect whose length is entirely unknown.
pub const DEFAULT_SFX_DURATION_SECS: f64 = 3.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Voice,
    Music,
    Soundfx,
}

impl TrackType {
    /// Prefix of synthesized mixer track ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Music => "music",
            Self::Soundfx => "sfx",
        }
    }

    /// Fallback when neither the duration map nor the track knows a length.
    pub fn default_duration(self) -> Option<f64> {
        match self {
            Self::Soundfx => Some(DEFAULT_SFX_DURATION_SECS),
            Self::Voice | Self::Music => None,
        }
    }
}

/// One schedulable input to the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub id: String,
    pub track_type: TrackType,
    pub placement: PlacementIntent,
    /// The track's own duration, consulted when the duration map has none.
    pub duration: Option<f64>,
}

/// Placement result for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedTrack {
    pub id: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(rename = "type")]
    pub track_type: TrackType,
}

impl CalculatedTrack {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub calculated_tracks: Vec<CalculatedTrack>,
    pub total_duration: f64,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute each entry's start offset and the schedule's total duration.
///
/// Output order matches input order. Fails on duplicate ids, references to
/// ids absent from `entries` (including self-references), placement cycles,
/// and voice/music entries with no known duration.
pub fn calculate_timings(
    entries: &[TimelineEntry],
    durations_by_id: &HashMap<String, f64>,
) -> CoreResult<Timeline> {
    let mut index = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if index.insert(entry.id.as_str(), i).is_some() {
            return Err(CoreError::Validation(format!(
                "Duplicate track id '{}' in timeline",
                entry.id
            )));
        }
    }

    let durations = entries
        .iter()
        .map(|entry| resolve_duration(entry, durations_by_id))
        .collect::<CoreResult<Vec<_>>>()?;

    let mut solver = Solver {
        entries,
        index,
        durations,
        starts: vec![None; entries.len()],
        visiting: vec![false; entries.len()],
    };

    let mut calculated_tracks = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let start_time = solver.start_of(i)?;
        calculated_tracks.push(CalculatedTrack {
            id: entry.id.clone(),
            start_time,
            duration: solver.durations[i],
            track_type: entry.track_type,
        });
    }

    let total_duration = calculated_tracks
        .iter()
        .map(CalculatedTrack::end_time)
        .fold(0.0_f64, f64::max);

    Ok(Timeline {
        calculated_tracks,
        total_duration,
    })
}

/// Duration map first, then the entry's own duration, then the type default.
fn resolve_duration(
    entry: &TimelineEntry,
    durations_by_id: &HashMap<String, f64>,
) -> CoreResult<f64> {
    durations_by_id
        .get(&entry.id)
        .copied()
        .filter(|d| is_usable_duration(*d))
        .or(entry.duration.filter(|d| is_usable_duration(*d)))
        .or(entry.track_type.default_duration())
        .ok_or_else(|| CoreError::MissingDuration {
            track_id: entry.id.clone(),
        })
}

fn is_usable_duration(d: f64) -> bool {
    d.is_finite() && d >= 0.0
}

/// What an entry's start offset is derived from. Every placement depends on
/// at most one other entry.
enum Dependency {
    Fixed(f64),
    StartOf(usize),
    EndOf { anchor: usize, overlap: f64 },
}

/// Memoised resolution over the placement dependency chains.
///
/// Chains are walked with an explicit stack, so a long run of tracks anchored
/// on one another does not grow the call stack.
struct Solver<'a> {
    entries: &'a [TimelineEntry],
    index: HashMap<&'a str, usize>,
    durations: Vec<f64>,
    starts: Vec<Option<f64>>,
    visiting: Vec<bool>,
}

impl Solver<'_> {
    fn start_of(&mut self, i: usize) -> CoreResult<f64> {
        // Walk the chain down to an entry that is already known or fixed.
        let mut pending = Vec::new();
        let mut current = i;
        while self.starts[current].is_none() {
            if self.visiting[current] {
                return Err(CoreError::TimelineCycle {
                    track_id: self.entries[current].id.clone(),
                });
            }
            self.visiting[current] = true;
            let dependency = self.dependency(current)?;
            let next = match &dependency {
                Dependency::Fixed(_) => None,
                Dependency::StartOf(anchor) | Dependency::EndOf { anchor, .. } => Some(*anchor),
            };
            pending.push((current, dependency));
            match next {
                Some(anchor) => current = anchor,
                None => break,
            }
        }

        // Unwind: each pending entry's anchor is resolved before it.
        for (j, dependency) in pending.into_iter().rev() {
            let start = match dependency {
                Dependency::Fixed(offset) => offset,
                Dependency::StartOf(anchor) => self.known_start(anchor)?,
                Dependency::EndOf { anchor, overlap } => {
                    self.known_start(anchor)? + self.durations[anchor] - overlap
                }
            };
            self.visiting[j] = false;
            self.starts[j] = Some(start.max(0.0));
        }
        self.known_start(i)
    }

    fn dependency(&self, i: usize) -> CoreResult<Dependency> {
        let dependency = match &self.entries[i].placement {
            PlacementIntent::AtStart => Dependency::Fixed(0.0),
            PlacementIntent::Sequential | PlacementIntent::AfterPrevious { .. } if i == 0 => {
                Dependency::Fixed(0.0)
            }
            PlacementIntent::Sequential => Dependency::EndOf {
                anchor: i - 1,
                overlap: 0.0,
            },
            PlacementIntent::AfterPrevious { overlap } => Dependency::EndOf {
                anchor: i - 1,
                overlap: *overlap,
            },
            PlacementIntent::AfterTrack { track_id, overlap } => Dependency::EndOf {
                anchor: self.lookup(i, track_id)?,
                overlap: *overlap,
            },
            PlacementIntent::Concurrent {
                with_track_id: Some(track_id),
            } => Dependency::StartOf(self.lookup(i, track_id)?),
            PlacementIntent::Concurrent {
                with_track_id: None,
            } => {
                if i == 0 {
                    Dependency::Fixed(0.0)
                } else {
                    Dependency::StartOf(0)
                }
            }
        };
        Ok(dependency)
    }

    fn known_start(&self, i: usize) -> CoreResult<f64> {
        self.starts[i].ok_or_else(|| {
            CoreError::Internal(format!(
                "Start of track '{}' read before it was resolved",
                self.entries[i].id
            ))
        })
    }

    fn lookup(&self, from: usize, reference: &str) -> CoreResult<usize> {
        match self.index.get(reference) {
            Some(&j) if j != from => Ok(j),
            _ => Err(CoreError::TimelineReference {
                track_id: self.entries[from].id.clone(),
                reference: reference.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn entry(id: &str, track_type: TrackType, placement: PlacementIntent, d: f64) -> TimelineEntry {
        TimelineEntry {
            id: id.to_string(),
            track_type,
            placement,
            duration: Some(d),
        }
    }

    fn seq(id: &str, d: f64) -> TimelineEntry {
        entry(id, TrackType::Voice, PlacementIntent::Sequential, d)
    }

    fn starts(timeline: &Timeline) -> Vec<f64> {
        timeline
            .calculated_tracks
            .iter()
            .map(|t| t.start_time)
            .collect()
    }

    fn no_map() -> HashMap<String, f64> {
        HashMap::new()
    }

    // -- Sequential --

    #[test]
    fn sequential_default_ordering() {
        let t = calculate_timings(&[seq("a", 5.0), seq("b", 3.0), seq("c", 4.0)], &no_map())
            .unwrap();
        assert_eq!(starts(&t), vec![0.0, 5.0, 8.0]);
        assert_eq!(t.total_duration, 12.0);
    }

    #[test]
    fn empty_input_has_zero_duration() {
        let t = calculate_timings(&[], &no_map()).unwrap();
        assert!(t.calculated_tracks.is_empty());
        assert_eq!(t.total_duration, 0.0);
    }

    // -- Start anchoring --

    #[test]
    fn start_anchored_sfx_plays_with_first_voice() {
        let t = calculate_timings(
            &[
                seq("v", 10.0),
                entry("s", TrackType::Soundfx, PlacementIntent::AtStart, 2.0),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 0.0]);
        assert_eq!(t.total_duration, 10.0);
    }

    #[test]
    fn two_start_anchors_overlap() {
        let t = calculate_timings(
            &[
                seq("v", 4.0),
                entry("s1", TrackType::Soundfx, PlacementIntent::AtStart, 1.0),
                entry("s2", TrackType::Soundfx, PlacementIntent::AtStart, 6.0),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 0.0, 0.0]);
        assert_eq!(t.total_duration, 6.0);
    }

    // -- Overlap --

    #[test]
    fn previous_overlap() {
        let t = calculate_timings(
            &[
                seq("v", 10.0),
                entry(
                    "s",
                    TrackType::Soundfx,
                    PlacementIntent::AfterPrevious { overlap: 2.0 },
                    3.0,
                ),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 8.0]);
        assert_eq!(t.total_duration, 11.0);
    }

    #[test]
    fn overlap_larger_than_previous_clamps_to_zero() {
        let t = calculate_timings(
            &[
                seq("v", 1.0),
                entry(
                    "s",
                    TrackType::Soundfx,
                    PlacementIntent::AfterPrevious { overlap: 5.0 },
                    3.0,
                ),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 0.0]);
        assert_eq!(t.total_duration, 3.0);
    }

    #[test]
    fn previous_overlap_on_first_track_starts_at_zero() {
        let t = calculate_timings(
            &[entry(
                "s",
                TrackType::Soundfx,
                PlacementIntent::AfterPrevious { overlap: 1.0 },
                2.0,
            )],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0]);
    }

    // -- Concurrency --

    #[test]
    fn concurrent_defaults_to_first_track() {
        let t = calculate_timings(
            &[
                entry("intro", TrackType::Soundfx, PlacementIntent::AtStart, 1.0),
                seq("v0", 4.0),
                seq("v1", 4.0),
                entry(
                    "bed",
                    TrackType::Soundfx,
                    PlacementIntent::Concurrent {
                        with_track_id: None,
                    },
                    9.0,
                ),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 1.0, 5.0, 0.0]);
        assert_eq!(t.total_duration, 9.0);
    }

    #[test]
    fn concurrent_with_named_anchor() {
        let t = calculate_timings(
            &[
                seq("v0", 4.0),
                seq("v1", 4.0),
                entry(
                    "amb",
                    TrackType::Soundfx,
                    PlacementIntent::Concurrent {
                        with_track_id: Some("v1".to_string()),
                    },
                    2.0,
                ),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 4.0, 4.0]);
    }

    // -- Track references --

    #[test]
    fn after_specific_track() {
        let t = calculate_timings(
            &[
                seq("v0", 3.0),
                seq("v1", 5.0),
                entry(
                    "s",
                    TrackType::Soundfx,
                    PlacementIntent::AfterTrack {
                        track_id: "v0".to_string(),
                        overlap: 0.0,
                    },
                    1.0,
                ),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![0.0, 3.0, 3.0]);
        assert_eq!(t.total_duration, 8.0);
    }

    #[test]
    fn forward_reference_resolves() {
        let t = calculate_timings(
            &[
                entry(
                    "music",
                    TrackType::Music,
                    PlacementIntent::AfterTrack {
                        track_id: "s".to_string(),
                        overlap: 0.5,
                    },
                    10.0,
                ),
                entry("s", TrackType::Soundfx, PlacementIntent::AtStart, 2.0),
            ],
            &no_map(),
        )
        .unwrap();
        assert_eq!(starts(&t), vec![1.5, 0.0]);
        assert_eq!(t.total_duration, 11.5);
    }

    #[test]
    fn missing_reference_fails() {
        let err = calculate_timings(
            &[
                seq("track-1", 2.0),
                entry(
                    "track-2",
                    TrackType::Soundfx,
                    PlacementIntent::AfterTrack {
                        track_id: "track-99".to_string(),
                        overlap: 0.0,
                    },
                    1.0,
                ),
            ],
            &no_map(),
        )
        .unwrap_err();
        assert_matches!(
            err,
            CoreError::TimelineReference { ref track_id, ref reference }
                if track_id == "track-2" && reference == "track-99"
        );
        let msg = err.to_string();
        assert!(msg.contains("track-2") && msg.contains("track-99"));
    }

    #[test]
    fn self_reference_fails() {
        let err = calculate_timings(
            &[entry(
                "s",
                TrackType::Soundfx,
                PlacementIntent::AfterTrack {
                    track_id: "s".to_string(),
                    overlap: 0.0,
                },
                1.0,
            )],
            &no_map(),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::TimelineReference { .. });
    }

    #[test]
    fn cycle_fails() {
        let after = |id: &str| PlacementIntent::AfterTrack {
            track_id: id.to_string(),
            overlap: 0.0,
        };
        let err = calculate_timings(
            &[
                entry("a", TrackType::Soundfx, after("b"), 1.0),
                entry("b", TrackType::Soundfx, after("a"), 1.0),
            ],
            &no_map(),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::TimelineCycle { .. });
    }

    #[test]
    fn forward_anchor_over_long_chain_resolves() {
        const TRACKS: usize = 200_000;
        let last = format!("t{}", TRACKS - 1);
        let mut entries: Vec<_> = (0..TRACKS).map(|i| seq(&format!("t{i}"), 1.0)).collect();
        entries[0].track_type = TrackType::Soundfx;
        entries[0].placement = PlacementIntent::Concurrent {
            with_track_id: Some(last.clone()),
        };
        entries[1].placement = PlacementIntent::AtStart;

        // t0 waits on the last track, whose start depends on every track
        // from t1 onwards.
        let t = calculate_timings(&entries, &no_map()).unwrap();
        let expected_start = (TRACKS - 2) as f64;
        assert_eq!(t.calculated_tracks[0].start_time, expected_start);
        assert_eq!(t.calculated_tracks[TRACKS - 1].start_time, expected_start);
        assert_eq!(t.total_duration, (TRACKS - 1) as f64);

        // Rooting t1 on the chain's own tail closes a loop through all of it.
        entries[1].placement = PlacementIntent::Sequential;
        let err = calculate_timings(&entries, &no_map()).unwrap_err();
        assert_matches!(err, CoreError::TimelineCycle { .. });
    }

    #[test]
    fn duplicate_ids_fail() {
        let err = calculate_timings(&[seq("a", 1.0), seq("a", 2.0)], &no_map()).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    // -- Durations --

    #[test]
    fn duration_map_overrides_entry() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), 7.0);
        let t = calculate_timings(&[seq("a", 1.0), seq("b", 1.0)], &map).unwrap();
        assert_eq!(starts(&t), vec![0.0, 7.0]);
        assert_eq!(t.calculated_tracks[0].duration, 7.0);
    }

    #[test]
    fn unknown_sfx_duration_defaults() {
        let mut e = entry("s", TrackType::Soundfx, PlacementIntent::Sequential, 0.0);
        e.duration = None;
        let t = calculate_timings(&[e], &no_map()).unwrap();
        assert_eq!(t.calculated_tracks[0].duration, DEFAULT_SFX_DURATION_SECS);
    }

    #[test]
    fn unknown_voice_duration_fails() {
        let mut e = seq("v", 0.0);
        e.duration = None;
        let err = calculate_timings(&[e], &no_map()).unwrap_err();
        assert_matches!(err, CoreError::MissingDuration { ref track_id } if track_id == "v");
    }

    // -- Determinism --

    #[test]
    fn repeated_calls_are_identical() {
        let entries = vec![
            seq("v0", 3.3),
            entry("m", TrackType::Music, PlacementIntent::AtStart, 12.0),
            entry(
                "s",
                TrackType::Soundfx,
                PlacementIntent::AfterPrevious { overlap: 0.7 },
                1.1,
            ),
        ];
        let first = calculate_timings(&entries, &no_map()).unwrap();
        let second = calculate_timings(&entries, &no_map()).unwrap();
        assert_eq!(first, second);
    }
}
