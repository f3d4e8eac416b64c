//! Server configuration - per-mapping static settings.
//!
//! Set once when a [`ServiceMapping`](crate::ServiceMapping) is built, read by
//! every request it serves.

use std::sync::Arc;

use http::HeaderName;
use protorpc_axum_core::Protocols;

use crate::limits::MessageLimits;

/// Header consulted for the content type when `Content-Type` is absent.
pub const DEFAULT_CONTENT_TYPE_OVERRIDE: &str = "x-content-type";

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    /// Codecs by content type
    pub protocols: Arc<Protocols>,
    /// Message size limits
    pub limits: MessageLimits,
    /// Fallback header for the content type
    pub content_type_override: HeaderName,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocols: Arc::new(Protocols::with_defaults()),
            limits: MessageLimits::default(),
            content_type_override: HeaderName::from_static(DEFAULT_CONTENT_TYPE_OVERRIDE),
        }
    }
}
