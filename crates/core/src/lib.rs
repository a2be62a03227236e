//! Domain core for ad audio assembly.
//!
//! - [`version`] / [`stream`] — per-stream version histories and payloads.
//! - [`timeline`] — pure placement of clips onto a shared timeline.
//! - [`mixer`] — flattening active versions into mixer tracks.
//! - [`rebuild`] — the store-backed mixer rebuild.
//! - [`version_store`] — the persistence contract.

pub mod clip;
pub mod duration;
pub mod error;
pub mod mixer;
pub mod placement;
pub mod rebuild;
pub mod stream;
pub mod timeline;
pub mod types;
pub mod version;
pub mod version_store;
