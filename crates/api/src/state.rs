use std::sync::Arc;

use adforge_core::version_store::VersionStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Sole gateway to version histories, pointers and mixer state.
    pub store: Arc<dyn VersionStore>,
    pub config: Arc<ServerConfig>,
}
