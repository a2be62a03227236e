//! Spoken-duration fallback estimate for voice tracks.
//!
//! Only used when a track carries no measured `generated_duration`.

/// Assumed speaking rate.
pub const WORDS_PER_SECOND: f64 = 2.5;

/// Fixed pause padding added to every estimate.
pub const PAUSE_PADDING_SECS: f64 = 1.0;

/// Floor for any estimate.
pub const MIN_ESTIMATE_SECS: f64 = 1.0;

/// Estimate how long `text` takes to speak, in seconds.
pub fn estimate_speech_duration(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_PER_SECOND + PAUSE_PADDING_SECS).max(MIN_ESTIMATE_SECS)
}

/// Measured duration wins unconditionally; the estimate is a fallback.
pub fn resolve_voice_duration(generated_duration: Option<f64>, text: &str) -> f64 {
    generated_duration.unwrap_or_else(|| estimate_speech_duration(text))
}
