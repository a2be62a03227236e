//! [`VersionStore`](adforge_core::version_store::VersionStore) backends.

pub mod memory;
pub mod postgres;

use adforge_core::error::CoreError;
use adforge_core::stream::StreamKind;
use adforge_core::types::VersionId;

/// Fresh time-ordered version id.
pub fn new_version_id() -> VersionId {
    uuid::Uuid::now_v7().to_string()
}

fn version_not_found(version_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "version",
        id: version_id.to_string(),
    }
}

fn draft_not_found(ad_id: &str, stream: StreamKind) -> CoreError {
    CoreError::NotFound {
        entity: "draft",
        id: format!("{ad_id}/{stream}"),
    }
}
