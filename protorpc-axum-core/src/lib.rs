//! Core message types for protorpc.
//!
//! This crate provides the transport-independent half of protorpc: the
//! message schema, the JSON wire codec and the protocol registry used by the
//! server crate (`protorpc-axum`).
//!
//! ## Modules
//!
//! - [`schema`]: static message and enum descriptors, dynamic message instances
//! - [`json`]: JSON encoding and decoding of messages
//! - [`codec`]: wire codec trait
//! - [`protocol`]: content type to codec registry
//! - [`status`]: the RPC status message returned on failures
//! - [`error`]: validation, decode and registry errors

pub mod codec;
pub mod error;
pub mod json;
pub mod protocol;
pub mod schema;
pub mod status;

#[cfg(test)]
mod test_support;

pub use codec::*;
pub use error::*;
pub use json::*;
pub use protocol::*;
pub use schema::*;
pub use status::*;
