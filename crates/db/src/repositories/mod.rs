//! Repository layer: one zero-sized struct per table.
//!
//! Every method takes a generic [`sqlx::PgExecutor`] so the same query runs
//! against the pool or inside a transaction.

mod ad_version_repo;
mod mixer_state_repo;
mod stream_pointer_repo;

pub use ad_version_repo::AdVersionRepo;
pub use mixer_state_repo::{MixerStateRepo, MixerVolumeRepo};
pub use stream_pointer_repo::StreamPointerRepo;
