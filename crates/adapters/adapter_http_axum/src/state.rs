//! Shared application state for axum handlers.

use std::sync::Arc;

use tangorest_app::ports::DeviceModel;
use tangorest_app::services::dispatcher::ResourceDispatcher;

/// Application state shared across all axum handlers.
///
/// Generic over the device model to avoid dynamic dispatch. `Clone` is
/// implemented manually so the model itself does not need to be `Clone`;
/// only the `Arc` wrapper is cloned.
pub struct AppState<M> {
    /// Request pipeline for every API path.
    pub dispatcher: Arc<ResourceDispatcher<M>>,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<M> AppState<M>
where
    M: DeviceModel + Send + Sync + 'static,
{
    /// Create a new application state from a dispatcher.
    pub fn new(dispatcher: ResourceDispatcher<M>) -> Self {
        Self::from_arc(Arc::new(dispatcher))
    }

    /// Create a new application state from a pre-wrapped dispatcher.
    pub fn from_arc(dispatcher: Arc<ResourceDispatcher<M>>) -> Self {
        Self { dispatcher }
    }
}
