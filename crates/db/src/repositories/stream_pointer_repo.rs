use adforge_core::stream::StreamKind;
use sqlx::{PgConnection, PgExecutor};

use crate::models::stream_pointer::StreamPointerRow;

const COLUMNS: &str = "ad_id, stream_kind, active_version_id, draft_version_id, updated_at";

/// Active and draft pointers in `ad_stream_pointers`.
///
/// Writes are plain upserts: last writer wins.
pub struct StreamPointerRepo;

impl StreamPointerRepo {
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
    ) -> Result<Option<StreamPointerRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ad_stream_pointers WHERE ad_id = $1 AND stream_kind = $2"
        );
        sqlx::query_as::<_, StreamPointerRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .fetch_optional(executor)
            .await
    }

    /// Create the pointer row if missing and lock it until the surrounding
    /// transaction ends. Serialises draft replacement per stream.
    pub async fn lock(
        conn: &mut PgConnection,
        ad_id: &str,
        stream: StreamKind,
    ) -> Result<StreamPointerRow, sqlx::Error> {
        sqlx::query(
            "INSERT INTO ad_stream_pointers (ad_id, stream_kind)
             VALUES ($1, $2)
             ON CONFLICT (ad_id, stream_kind) DO NOTHING",
        )
        .bind(ad_id)
        .bind(stream.name())
        .execute(&mut *conn)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM ad_stream_pointers
             WHERE ad_id = $1 AND stream_kind = $2
             FOR UPDATE"
        );
        sqlx::query_as::<_, StreamPointerRow>(&query)
            .bind(ad_id)
            .bind(stream.name())
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn set_active<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO ad_stream_pointers (ad_id, stream_kind, active_version_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (ad_id, stream_kind)
             DO UPDATE SET active_version_id = EXCLUDED.active_version_id, updated_at = now()",
        )
        .bind(ad_id)
        .bind(stream.name())
        .bind(version_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn set_draft<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO ad_stream_pointers (ad_id, stream_kind, draft_version_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (ad_id, stream_kind)
             DO UPDATE SET draft_version_id = EXCLUDED.draft_version_id, updated_at = now()",
        )
        .bind(ad_id)
        .bind(stream.name())
        .bind(version_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Null out whichever pointers name `version_id`.
    pub async fn clear_references<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        stream: StreamKind,
        version_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ad_stream_pointers
             SET active_version_id = NULLIF(active_version_id, $3),
                 draft_version_id = NULLIF(draft_version_id, $3),
                 updated_at = now()
             WHERE ad_id = $1 AND stream_kind = $2
               AND (active_version_id = $3 OR draft_version_id = $3)",
        )
        .bind(ad_id)
        .bind(stream.name())
        .bind(version_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
