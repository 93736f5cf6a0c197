//! # tangorestd — tangorest daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the device model implementation (adapter)
//! - Construct the resource dispatcher, injecting the model via the port trait
//! - Build the axum router, injecting the dispatcher
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no addressing logic belongs here.

mod config;
mod shutdown;

use tangorest_adapter_http_axum::router;
use tangorest_adapter_http_axum::state::AppState;
use tangorest_adapter_virtual::VirtualControlSystem;
use tangorest_app::services::dispatcher::ResourceDispatcher;
use tangorest_app::services::locator::ResourceLocator;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Device model
    let model = VirtualControlSystem::new()?;
    tracing::info!(devices = model.len(), "virtual control system ready");

    // Dispatcher
    let locator = ResourceLocator::new(config.api.prefix.as_str());
    let dispatcher = ResourceDispatcher::new(model, locator);

    // HTTP
    let app = router::build(AppState::new(dispatcher));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        %bind_addr,
        prefix = %config.api.prefix,
        "tangorestd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    tracing::info!("tangorestd stopped");
    Ok(())
}
