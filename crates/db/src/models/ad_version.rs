//! Ad version row model and DTOs.

use adforge_core::error::CoreError;
use adforge_core::stream::{StreamKind, VersionStatus};
use adforge_core::types::Timestamp;
use adforge_core::version::{Version, VersionPayload};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `ad_versions` table.
#[derive(Debug, Clone, FromRow)]
pub struct AdVersionRow {
    pub ad_id: String,
    pub stream_kind: String,
    pub version_id: String,
    pub status: String,
    pub payload: Json<VersionPayload>,
    pub request_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<AdVersionRow> for Version {
    type Error = CoreError;

    fn try_from(row: AdVersionRow) -> Result<Self, Self::Error> {
        let status = VersionStatus::from_name(&row.status)
            .map_err(|e| CoreError::Internal(format!("Corrupt version row: {e}")))?;
        Ok(Version {
            id: row.version_id,
            status,
            payload: row.payload.0,
            request_text: row.request_text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for inserting a version.
#[derive(Debug, Clone)]
pub struct CreateAdVersion<'a> {
    pub ad_id: &'a str,
    pub stream: StreamKind,
    pub version: &'a Version,
}
