//! Route definitions for one content stream of an ad.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Routes mounted at `/ads/{ad_id}/streams/{stream}`.
///
/// ```text
/// GET    /versions                        list_versions
/// GET    /versions/{id}                   get_version
/// DELETE /versions/{id}                   delete_version
/// POST   /versions/{id}/clone             clone_version
/// PUT    /versions/{id}/clips/{index}     record_clip
/// GET    /active                          get_active
/// PUT    /active                          set_active
/// GET    /draft                           get_draft
/// POST   /draft                           create_draft
/// PUT    /draft                           update_draft
/// POST   /draft/finalize                  finalize_draft
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/versions", get(versions::list_versions))
        .route(
            "/versions/{id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .route("/versions/{id}/clone", post(versions::clone_version))
        .route("/versions/{id}/clips/{index}", put(versions::record_clip))
        .route("/active", get(versions::get_active).put(versions::set_active))
        .route(
            "/draft",
            get(versions::get_draft)
                .post(versions::create_draft)
                .put(versions::update_draft),
        )
        .route("/draft/finalize", post(versions::finalize_draft))
}
