//! Service definitions.
//!
//! A service is a plain Rust type with a table of remote methods. The
//! dispatcher creates a fresh instance for every request, optionally hands it
//! the [`RequestState`], then invokes one method on it.
//!
//! # Example
//!
//! ```rust
//! use protorpc_axum::prelude::*;
//!
//! static ECHO_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new("text", FieldKind::String)];
//! static ECHO: MessageDescriptor = MessageDescriptor::new("echo.Echo", &ECHO_FIELDS);
//!
//! #[derive(Default)]
//! struct EchoService;
//!
//! impl Service for EchoService {
//!     fn definition_name() -> &'static str {
//!         "echo.EchoService"
//!     }
//!
//!     fn remote_methods() -> RemoteMethods<Self> {
//!         RemoteMethods::new().dynamic_method("echo", &ECHO, &ECHO, |_service, request| Ok(request))
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use protorpc_axum_core::{
    ApplicationError, CodecError, DynamicMessage, Message, MessageDescriptor, ValidationError,
};

use crate::request_state::RequestState;

/// Boxed error for failures that are reported to clients only as a
/// server error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A remote service.
pub trait Service: Sized + Send + 'static {
    /// Fully qualified service name, used in informational responses.
    fn definition_name() -> &'static str;

    /// The methods callable on this service.
    fn remote_methods() -> RemoteMethods<Self>;

    /// Services that want to see the [`RequestState`] return themselves here.
    fn request_state_aware(&mut self) -> Option<&mut dyn RequestStateAware> {
        None
    }
}

/// Capability of receiving the [`RequestState`] before a method is invoked.
pub trait RequestStateAware {
    fn initialize_request_state(&mut self, state: RequestState);
}

/// Failure returned by a remote method.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// An expected failure; its message and name reach the client.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Any other failure. Logged, and reported to the client without detail.
    #[error(transparent)]
    Internal(BoxError),
}

impl RemoteError {
    pub fn internal<E: Into<BoxError>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

// Codec failures inside a method are server faults, not bad requests.
impl From<CodecError> for RemoteError {
    fn from(err: CodecError) -> Self {
        Self::internal(err)
    }
}

impl From<ValidationError> for RemoteError {
    fn from(err: ValidationError) -> Self {
        Self::internal(err)
    }
}

type Call<S> = Box<dyn FnOnce(&mut S) -> Result<DynamicMessage, RemoteError> + Send>;

type Prepare<S> = dyn Fn(DynamicMessage) -> Result<Call<S>, ValidationError> + Send + Sync;

/// One remote method: its message types and its implementation.
pub struct RemoteMethod<S> {
    name: String,
    request_type: &'static MessageDescriptor,
    response_type: &'static MessageDescriptor,
    prepare: Arc<Prepare<S>>,
}

impl<S> RemoteMethod<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_type(&self) -> &'static MessageDescriptor {
        self.request_type
    }

    pub fn response_type(&self) -> &'static MessageDescriptor {
        self.response_type
    }

    /// Convert a decoded request into the method's own request type.
    ///
    /// Fails when a typed method cannot build its request struct. No service
    /// instance is involved yet.
    pub fn prepare(&self, request: DynamicMessage) -> Result<PreparedCall<S>, ValidationError> {
        Ok(PreparedCall {
            call: (self.prepare)(request)?,
            response_type: self.response_type,
        })
    }
}

/// A method call whose request is already converted, waiting for an instance.
pub struct PreparedCall<S> {
    call: Call<S>,
    response_type: &'static MessageDescriptor,
}

impl<S> PreparedCall<S> {
    /// Run the method on `service`.
    ///
    /// A response of a type other than the method's response type is an
    /// internal error.
    pub fn invoke(self, service: &mut S) -> Result<DynamicMessage, RemoteError> {
        let response = (self.call)(service)?;
        response
            .expect_type(self.response_type)
            .map_err(RemoteError::internal)?;
        Ok(response)
    }
}

impl<S> fmt::Debug for PreparedCall<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedCall")
            .field("response_type", &self.response_type.name())
            .finish_non_exhaustive()
    }
}

impl<S> Clone for RemoteMethod<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            request_type: self.request_type,
            response_type: self.response_type,
            prepare: Arc::clone(&self.prepare),
        }
    }
}

impl<S> fmt::Debug for RemoteMethod<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMethod")
            .field("name", &self.name)
            .field("request_type", &self.request_type.name())
            .field("response_type", &self.response_type.name())
            .finish()
    }
}

/// Remote methods of a service, by name.
///
/// Registering a name twice replaces the earlier method.
pub struct RemoteMethods<S> {
    methods: HashMap<String, RemoteMethod<S>>,
}

impl<S: 'static> RemoteMethods<S> {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register a method on typed messages.
    pub fn method<Req, Resp, F>(self, name: &str, handler: F) -> Self
    where
        Req: Message,
        Resp: Message,
        F: Fn(&mut S, Req) -> Result<Resp, RemoteError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.insert(RemoteMethod {
            name: name.to_owned(),
            request_type: Req::descriptor(),
            response_type: Resp::descriptor(),
            prepare: Arc::new(move |request: DynamicMessage| -> Result<Call<S>, ValidationError> {
                let request = Req::from_dynamic(&request)?;
                let handler = Arc::clone(&handler);
                let call: Call<S> = Box::new(move |service: &mut S| {
                    let response = handler(service, request)?;
                    response.to_dynamic().map_err(RemoteError::internal)
                });
                Ok(call)
            }),
        })
    }

    /// Register a method on dynamic messages of the given types.
    pub fn dynamic_method<F>(
        self,
        name: &str,
        request_type: &'static MessageDescriptor,
        response_type: &'static MessageDescriptor,
        handler: F,
    ) -> Self
    where
        F: Fn(&mut S, DynamicMessage) -> Result<DynamicMessage, RemoteError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.insert(RemoteMethod {
            name: name.to_owned(),
            request_type,
            response_type,
            prepare: Arc::new(move |request: DynamicMessage| -> Result<Call<S>, ValidationError> {
                let handler = Arc::clone(&handler);
                let call: Call<S> = Box::new(move |service: &mut S| handler(service, request));
                Ok(call)
            }),
        })
    }

    fn insert(mut self, method: RemoteMethod<S>) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RemoteMethod<S>> {
        self.methods.get(name)
    }

    /// Method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<S: 'static> Default for RemoteMethods<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for RemoteMethods<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.values()).finish()
    }
}
