//! Mixer state and volume override row models.

use adforge_core::mixer::MixerState;
use adforge_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `mixer_states` table.
#[derive(Debug, Clone, FromRow)]
pub struct MixerStateRow {
    pub ad_id: String,
    pub state: Json<MixerState>,
    pub last_calculated: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `mixer_volumes` table.
#[derive(Debug, Clone, FromRow)]
pub struct MixerVolumeRow {
    pub ad_id: String,
    pub track_id: String,
    pub volume: f64,
    pub updated_at: Timestamp,
}
