//! # tangorest-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **hypermedia REST API** under the configured prefix
//!   (`/rest/v1/devices/{domain}/{family}/{member}/…`)
//! - Map HTTP requests into dispatcher requests (driving adapter): method,
//!   raw path, query parameters and body bytes
//! - Map representations and error representations into HTTP responses,
//!   taking the status code from the failure kind
//! - Serve `/health` for liveness probes
//!
//! Routing of API paths is **not** done by axum: every non-health request is
//! handed to the [`ResourceDispatcher`](tangorest_app::services::dispatcher::ResourceDispatcher),
//! which owns the address grammar.
//!
//! ## Dependency rule
//! Depends on `tangorest-app` (for the port trait and services) and
//! `tangorest-domain`. Never leaks axum types into the application layer.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
