//! Builders for mounting services.
//!
//! A [`ServiceMapping`] configures one service: how instances are created,
//! which paths it answers and which codecs it speaks. [`MakeServiceBuilder`]
//! combines mappings into a single [`Router`].
//!
//! # Examples
//!
//! ## One service
//!
//! ```rust,ignore
//! use protorpc_axum::ServiceMapping;
//!
//! let app = ServiceMapping::<HelloService>::from_default()
//!     .service_path("/hello")
//!     .into_router();
//! ```
//!
//! ## Several services
//!
//! ```rust,ignore
//! use protorpc_axum::{MakeServiceBuilder, ServiceMapping};
//!
//! let app = MakeServiceBuilder::new()
//!     .add_mapping(ServiceMapping::<HelloService>::from_default().service_path("/hello"))
//!     .add_mapping(ServiceMapping::new(|| GuestbookService::new(pool.clone())).service_path("/guestbook"))
//!     .build();
//! ```

use std::sync::Arc;

use axum::Router;
use http::HeaderName;
use protorpc_axum_core::Protocols;

use crate::config::ServerConfig;
use crate::dispatcher::{Dispatcher, Endpoint, Route, ServicePath};
use crate::limits::MessageLimits;
use crate::service::Service;

/// Configuration of one mounted service.
pub struct ServiceMapping<S: Service> {
    factory: Arc<dyn Fn() -> S + Send + Sync>,
    path: ServicePath,
    config: ServerConfig,
}

impl<S: Service> ServiceMapping<S> {
    /// Map a service whose instances are created by `factory`, one per request.
    ///
    /// Without [`service_path`](Self::service_path) the mapping answers any
    /// path of the form `<anything>.<method>`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            path: ServicePath::Any,
            config: ServerConfig::default(),
        }
    }

    /// Answer only `<path>.<method>`.
    pub fn service_path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = ServicePath::Exact(path.into());
        self
    }

    /// Set the codecs this service speaks.
    ///
    /// Default is JSON only, see [`Protocols::with_defaults`].
    pub fn protocols(self, protocols: Protocols) -> Self {
        self.shared_protocols(Arc::new(protocols))
    }

    /// Like [`protocols`](Self::protocols), sharing one registry between mappings.
    pub fn shared_protocols(mut self, protocols: Arc<Protocols>) -> Self {
        self.config.protocols = protocols;
        self
    }

    /// Set custom message size limits.
    ///
    /// Default is 4 MB.
    pub fn message_limits(mut self, limits: MessageLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Header to read the content type from when `Content-Type` is absent.
    ///
    /// Default is `x-content-type`.
    pub fn content_type_override(mut self, header: HeaderName) -> Self {
        self.config.content_type_override = header;
        self
    }

    /// A router serving only this mapping.
    pub fn into_router(self) -> Router {
        MakeServiceBuilder::new().add_mapping(self).build()
    }

    fn into_route(self) -> Arc<dyn Route> {
        let methods = S::remote_methods();
        tracing::debug!(
            service = S::definition_name(),
            path = ?self.path,
            methods = ?methods.names(),
            "mapping ProtoRPC service"
        );
        Arc::new(Endpoint {
            factory: self.factory,
            methods,
            path: self.path,
            config: self.config,
        })
    }
}

impl<S: Service + Default> ServiceMapping<S> {
    /// Map a service whose instances are created with [`Default`].
    pub fn from_default() -> Self {
        Self::new(S::default)
    }
}

/// Builder for combining several service mappings.
///
/// A request is handled by the first mapping, in the order added, whose
/// path pattern matches. Requests no mapping matches get 404.
#[derive(Default)]
pub struct MakeServiceBuilder {
    routes: Vec<Arc<dyn Route>>,
}

impl MakeServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping<S: Service>(mut self, mapping: ServiceMapping<S>) -> Self {
        self.routes.push(mapping.into_route());
        self
    }

    /// The dispatcher as a plain tower service.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.routes)
    }

    /// An axum router dispatching every request.
    pub fn build(self) -> Router {
        Router::new().fallback_service(self.into_dispatcher())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CounterService;

    #[test]
    fn test_mapping_defaults() {
        let mapping = ServiceMapping::<CounterService>::from_default();
        assert_eq!(mapping.path, ServicePath::Any);
        assert_eq!(mapping.config.limits, MessageLimits::default());
        assert_eq!(mapping.config.content_type_override, "x-content-type");
        assert!(
            mapping
                .config
                .protocols
                .lookup_by_content_type("application/json")
                .is_ok()
        );
    }

    #[test]
    fn test_mapping_configuration() {
        let protocols = Arc::new(Protocols::new());
        let mapping = ServiceMapping::<CounterService>::from_default()
            .service_path("/counter")
            .shared_protocols(Arc::clone(&protocols))
            .message_limits(MessageLimits::new(16))
            .content_type_override(HeaderName::from_static("x-rpc-type"));

        assert_eq!(mapping.path, ServicePath::Exact("/counter".to_string()));
        assert!(Arc::ptr_eq(&mapping.config.protocols, &protocols));
        assert_eq!(mapping.config.limits.max_message_size(), Some(16));
        assert_eq!(mapping.config.content_type_override, "x-rpc-type");
    }

    #[test]
    fn test_builder_keeps_order() {
        let dispatcher = MakeServiceBuilder::new()
            .add_mapping(ServiceMapping::<CounterService>::from_default().service_path("/a"))
            .add_mapping(ServiceMapping::<CounterService>::from_default())
            .into_dispatcher();
        assert_eq!(format!("{dispatcher:?}"), "Dispatcher { routes: 2 }");
    }
}
