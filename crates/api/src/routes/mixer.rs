//! Route definitions for an ad's mixer.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::mixer;
use crate::state::AppState;

/// Routes mounted at `/ads/{ad_id}/mixer`.
///
/// ```text
/// GET    /                      get_mixer
/// POST   /rebuild               rebuild
/// PUT    /volumes/{track_id}    set_volume
/// DELETE /volumes/{track_id}    clear_volume
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(mixer::get_mixer))
        .route("/rebuild", post(mixer::rebuild))
        .route(
            "/volumes/{track_id}",
            put(mixer::set_volume).delete(mixer::clear_volume),
        )
}
