pub mod health;
pub mod mixer;
pub mod streams;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ads/{ad_id}/mixer                                   get
/// /ads/{ad_id}/mixer/rebuild                           rebuild (POST)
/// /ads/{ad_id}/mixer/volumes/{track_id}                set (PUT), clear (DELETE)
///
/// /ads/{ad_id}/streams/{stream}/versions               list
/// /ads/{ad_id}/streams/{stream}/versions/{id}          get, delete
/// /ads/{ad_id}/streams/{stream}/versions/{id}/clone    clone (POST)
/// /ads/{ad_id}/streams/{stream}/versions/{id}/clips/{index}
///                                                      record generated clip (PUT)
/// /ads/{ad_id}/streams/{stream}/active                 get, set + rebuild (PUT)
/// /ads/{ad_id}/streams/{stream}/draft                  get, create (POST), update (PUT)
/// /ads/{ad_id}/streams/{stream}/draft/finalize         finalize (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/ads/{ad_id}/mixer", mixer::router())
        .nest("/ads/{ad_id}/streams/{stream}", streams::router())
}
