//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use tangorest_app::ports::DeviceModel;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// `/health` is routed by axum; every other path falls through to the
/// dispatcher, which resolves it against the API prefix.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<M>(state: AppState<M>) -> Router
where
    M: DeviceModel + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .fallback(crate::api::dispatch::<M>)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
