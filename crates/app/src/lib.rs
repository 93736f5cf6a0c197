//! # tangorest-app
//!
//! Application layer — the hypermedia addressing core and its **port**.
//!
//! ## Responsibilities
//! - Define the [`ports::DeviceModel`] port every control-system adapter
//!   implements.
//! - Translate between URIs and entity references
//!   ([`services::locator::ResourceLocator`]).
//! - Compute `_links` for every representation
//!   ([`services::link_graph::LinkGraphBuilder`]).
//! - Route requests to the port and assemble the responses
//!   ([`services::dispatcher::ResourceDispatcher`],
//!   [`services::assembler::ResponseAssembler`]).
//!
//! ## Dependency rule
//! Depends on `tangorest-domain` only. Never imports adapter crates or an
//! HTTP framework; adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
