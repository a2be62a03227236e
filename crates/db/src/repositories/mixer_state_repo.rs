use adforge_core::mixer::MixerState;
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::models::mixer_state::{MixerStateRow, MixerVolumeRow};

/// The derived mixer record in `mixer_states`.
pub struct MixerStateRepo;

impl MixerStateRepo {
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
    ) -> Result<Option<MixerStateRow>, sqlx::Error> {
        sqlx::query_as::<_, MixerStateRow>(
            "SELECT ad_id, state, last_calculated, updated_at
             FROM mixer_states WHERE ad_id = $1",
        )
        .bind(ad_id)
        .fetch_optional(executor)
        .await
    }

    /// Replace the whole record in a single statement.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        state: &MixerState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO mixer_states (ad_id, state, last_calculated)
             VALUES ($1, $2, $3)
             ON CONFLICT (ad_id)
             DO UPDATE SET state = EXCLUDED.state,
                           last_calculated = EXCLUDED.last_calculated,
                           updated_at = now()",
        )
        .bind(ad_id)
        .bind(Json(state))
        .bind(state.last_calculated)
        .execute(executor)
        .await?;
        Ok(())
    }
}

/// User volume overrides in `mixer_volumes`.
pub struct MixerVolumeRepo;

impl MixerVolumeRepo {
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
    ) -> Result<Vec<MixerVolumeRow>, sqlx::Error> {
        sqlx::query_as::<_, MixerVolumeRow>(
            "SELECT ad_id, track_id, volume, updated_at
             FROM mixer_volumes WHERE ad_id = $1 ORDER BY track_id",
        )
        .bind(ad_id)
        .fetch_all(executor)
        .await
    }

    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        track_id: &str,
        volume: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO mixer_volumes (ad_id, track_id, volume)
             VALUES ($1, $2, $3)
             ON CONFLICT (ad_id, track_id)
             DO UPDATE SET volume = EXCLUDED.volume, updated_at = now()",
        )
        .bind(ad_id)
        .bind(track_id)
        .bind(volume)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        ad_id: &str,
        track_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mixer_volumes WHERE ad_id = $1 AND track_id = $2")
            .bind(ad_id)
            .bind(track_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
