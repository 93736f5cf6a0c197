//! # tangorest-domain
//!
//! Pure domain model for the tangorest hypermedia API.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **device paths** (`domain/family/member`) and **member names**
//!   (attribute, command and property names) with their validation rules
//! - Define **entity references**, the closed set of addressable things
//!   (database root, device list, devices, collections, leaves)
//! - Define the **readings** exchanged with the control system
//!   (device state, attribute values, command results, properties)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod attribute;
pub mod command;
pub mod device;
pub mod entity;
pub mod path;
pub mod property;
