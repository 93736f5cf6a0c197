//! Application services — the request pipeline.
//!
//! Services are stateless apart from their configuration. The dispatcher
//! accepts a [`DeviceModel`](crate::ports::DeviceModel) implementation via a
//! generic parameter, keeping this layer decoupled from concrete adapters.

pub mod assembler;
pub mod dispatcher;
pub mod link_graph;
pub mod locator;
