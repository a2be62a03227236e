use adforge_core::stream::{StreamKind, VersionStatus};
use adforge_core::version::VersionPayload;
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::models::ad_version::{AdVersionRow, CreateAdVersion};

/// Column list shared by every `ad_versions` query.
const COLUMNS: &str =
    "ad_id, stream_kind, version_id, status, payload, request_text, created_at, updated_at";

/// CRUD for the `ad_versions` table.
pub struct AdVersionRepo;

impl AdVersionRepo {
    /// Insert a version, keeping the caller's id and timestamps.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateAdVersion<'_>,
    ) -> Result<AdVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO ad_versions ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(input.ad_id)
            .bind(input.stream.name())
            .bind(&input.version.id)
            .bind(input.version.status.name())
            .bind(Json(&input.version.payload))
            .bind(&input.version.request_text)
            .bind(input.version.created_at)
            .bind(input.version.updated_at)
            .fetch_one(executor)
            .await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> Result<Option<AdVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ad_versions
             WHERE ad_id = $1 AND stream_kind = $2 AND version_id = $3"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .bind(version_id)
            .fetch_optional(executor)
            .await
    }

    /// Like [`find`](Self::find) but row-locks the version for the rest of
    /// the transaction.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> Result<Option<AdVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ad_versions
             WHERE ad_id = $1 AND stream_kind = $2 AND version_id = $3
             FOR UPDATE"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .bind(version_id)
            .fetch_optional(executor)
            .await
    }

    /// History for one stream, oldest first.
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
    ) -> Result<Vec<AdVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ad_versions
             WHERE ad_id = $1 AND stream_kind = $2
             ORDER BY created_at ASC, version_id ASC"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .fetch_all(executor)
            .await
    }

    /// Replace payload and request text. `None` if the version does not exist.
    pub async fn update_content<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        payload: &VersionPayload,
        request_text: Option<&str>,
    ) -> Result<Option<AdVersionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE ad_versions
             SET payload = $4, request_text = $5, updated_at = now()
             WHERE ad_id = $1 AND stream_kind = $2 AND version_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .bind(version_id)
            .bind(Json(payload))
            .bind(request_text)
            .fetch_optional(executor)
            .await
    }

    pub async fn set_status<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
        status: VersionStatus,
    ) -> Result<Option<AdVersionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE ad_versions
             SET status = $4, updated_at = now()
             WHERE ad_id = $1 AND stream_kind = $2 AND version_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdVersionRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .bind(version_id)
            .bind(status.name())
            .fetch_optional(executor)
            .await
    }

    /// Hard delete. Returns the number of rows removed (0 or 1).
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM ad_versions
             WHERE ad_id = $1 AND stream_kind = $2 AND version_id = $3",
        )
        .bind(ad_id)
        .bind(stream.name())
        .bind(version_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove every draft of a stream.
    pub async fn delete_drafts<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM ad_versions
             WHERE ad_id = $1 AND stream_kind = $2 AND status = 'draft'",
        )
        .bind(ad_id)
        .bind(stream.name())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
