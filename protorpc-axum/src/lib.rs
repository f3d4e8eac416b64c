//! # ProtoRPC on Axum
//!
//! A library for serving [ProtoRPC](https://github.com/google/protorpc)-style
//! remote services with [Axum](https://github.com/tokio-rs/axum).
//!
//! Every method is reached with a `POST` to `<service-path>.<method>`, carrying
//! the request message in the body, encoded with the codec the `Content-Type`
//! header names. The response message comes back in the same encoding.
//! Failures come back as an `RpcStatus` message.
//!
//! ## Features
//!
//! - **Plain services:** a service is a Rust type with a table of remote
//!   methods, instantiated fresh for every request.
//! - **Pluggable codecs:** JSON is registered by default; any
//!   [`Codec`](protorpc_axum_core::Codec) can be added under its own content types.
//! - **Request state:** services can opt in to see the caller's address, host
//!   and headers.
//! - **Axum-native:** a mapping turns into an [`axum::Router`] that can be
//!   served, nested or layered like any other.
//!
//! ## Getting Started
//!
//! ```rust,ignore
//! use protorpc_axum::prelude::*;
//!
//! let app = ServiceMapping::<HelloService>::from_default()
//!     .service_path("/hello")
//!     .into_router();
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! The `protorpc-axum-examples` crate has complete servers.

mod config;
pub mod dispatcher;
pub mod error;
pub mod limits;
pub mod request_state;
pub mod service;
pub mod service_builder;

#[cfg(test)]
mod test_support;

pub use config::DEFAULT_CONTENT_TYPE_OVERRIDE;
pub use dispatcher::Dispatcher;
pub use error::{HttpError, INTERNAL_SERVER_ERROR_MESSAGE, RpcError};
pub use limits::{DEFAULT_MAX_MESSAGE_SIZE, MessageLimits, MessageTooLarge};
pub use request_state::RequestState;
pub use service::{
    BoxError, PreparedCall, RemoteError, RemoteMethod, RemoteMethods, RequestStateAware, Service,
};
pub use service_builder::{MakeServiceBuilder, ServiceMapping};

// Re-export the message layer
pub use protorpc_axum_core;
pub use protorpc_axum_core::{
    ApplicationError, Codec, DynamicMessage, EnumDescriptor, FieldDescriptor, FieldKind,
    JsonCodec, Message, MessageDescriptor, Protocols, RpcState, RpcStatus, ValidationError,
};

pub mod prelude {
    //! A prelude for `protorpc-axum` providing the most common types.
    pub use crate::request_state::RequestState;
    pub use crate::service::{RemoteError, RemoteMethods, RequestStateAware, Service};
    pub use crate::service_builder::{MakeServiceBuilder, ServiceMapping};
    pub use protorpc_axum_core::{
        ApplicationError, DynamicMessage, EnumDescriptor, FieldDescriptor, FieldKind, Message,
        MessageDescriptor, ValidationError, Value,
    };
}
