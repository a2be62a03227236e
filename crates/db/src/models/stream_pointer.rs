//! Active/draft pointer row model.

use adforge_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `ad_stream_pointers` table.
#[derive(Debug, Clone, FromRow)]
pub struct StreamPointerRow {
    pub ad_id: String,
    pub stream_kind: String,
    pub active_version_id: Option<String>,
    pub draft_version_id: Option<String>,
    pub updated_at: Timestamp,
}
