//! Request dispatch.
//!
//! Every request goes through the same sequence; the first failing step
//! answers it:
//!
//! 1. the path must read `<service-path>.<method>` for a mapped service (404)
//! 2. a content type must be given (400)
//! 3. the HTTP method must be `POST` (405)
//! 4. a codec must be registered for the content type (415)
//! 5. the method must exist (`METHOD_NOT_FOUND_ERROR`, 400)
//! 6. the body must decode into the request type, and a typed method's
//!    request struct must build from it (`REQUEST_ERROR`, 400)
//! 7. a fresh service instance runs the method on the blocking pool;
//!    application errors are `APPLICATION_ERROR` (400) and everything else
//!    is `SERVER_ERROR` (500)
//!
//! Errors from step 5 on are [`RpcStatus`](protorpc_axum_core::RpcStatus)
//! messages encoded with the codec negotiated in step 4.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, Method, StatusCode, header};
use http_body_util::BodyExt;
use protorpc_axum_core::{ProtocolEntry, media_type};

use crate::config::ServerConfig;
use crate::error::{HttpError, RpcError};
use crate::limits::{MessageLimits, MessageTooLarge};
use crate::request_state::RequestState;
use crate::service::{RemoteError, RemoteMethods, Service};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Which request paths a mapping serves.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum ServicePath {
    /// Everything before the last `.` is the service path.
    #[default]
    Any,
    /// The path must start with exactly this, followed by `.` and the method.
    Exact(String),
}

impl ServicePath {
    /// Split a request path into service path and method name.
    pub(crate) fn split<'a>(&self, path: &'a str) -> Option<(&'a str, &'a str)> {
        let (service_path, method) = match self {
            ServicePath::Any => path.rsplit_once('.')?,
            ServicePath::Exact(prefix) => {
                let method = path.strip_prefix(prefix.as_str())?.strip_prefix('.')?;
                (&path[..prefix.len()], method)
            }
        };
        if method.is_empty() {
            None
        } else {
            Some((service_path, method))
        }
    }
}

/// One mapped service, type-erased so that mappings of different service
/// types can share a dispatcher.
pub(crate) trait Route: Send + Sync + 'static {
    fn split_path<'a>(&self, path: &'a str) -> Option<(&'a str, &'a str)>;

    fn handle(self: Arc<Self>, request: Request, service_path: String, method: String)
    -> BoxFuture<Response>;
}

pub(crate) struct Endpoint<S: Service> {
    pub factory: Arc<dyn Fn() -> S + Send + Sync>,
    pub methods: RemoteMethods<S>,
    pub path: ServicePath,
    pub config: ServerConfig,
}

impl<S: Service> Route for Endpoint<S> {
    fn split_path<'a>(&self, path: &'a str) -> Option<(&'a str, &'a str)> {
        self.path.split(path)
    }

    fn handle(
        self: Arc<Self>,
        request: Request,
        service_path: String,
        method: String,
    ) -> BoxFuture<Response> {
        Box::pin(async move { self.dispatch(request, service_path, method).await })
    }
}

impl<S: Service> Endpoint<S> {
    async fn dispatch(&self, request: Request, service_path: String, method_name: String) -> Response {
        let (parts, body) = request.into_parts();

        let Some(content_type) = request_content_type(&parts.headers, &self.config.content_type_override)
        else {
            tracing::debug!(path = %parts.uri.path(), "request has no content type");
            return HttpError::MissingContentType.into_response();
        };

        if parts.method != Method::POST {
            tracing::debug!(method = %parts.method, path = %parts.uri.path(), "method not allowed");
            return HttpError::MethodNotAllowed {
                service_path,
                method: method_name,
                definition_name: S::definition_name(),
            }
            .into_response();
        }

        let protocol = match self.config.protocols.lookup_by_content_type(content_type) {
            Ok(protocol) => protocol,
            Err(err) => {
                tracing::debug!(error = %err, "unsupported content type");
                return HttpError::UnsupportedMediaType(content_type.to_owned()).into_response();
            }
        };
        let response_content_type = media_type(content_type).to_owned();

        let Some(method) = self.methods.get(&method_name) else {
            tracing::debug!(service = S::definition_name(), method = %method_name, "unknown method");
            return RpcError::method_not_found(&method_name).into_response_with_protocol(protocol);
        };

        let bytes = match read_body(&parts.headers, body, self.config.limits).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(method = %method_name, error = %err, "failed to read request body");
                return RpcError::request(err).into_response_with_protocol(protocol);
            }
        };

        let request = match protocol.codec().decode(method.request_type(), &bytes) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(method = %method_name, error = %err, "failed to decode request");
                return RpcError::request(err).into_response_with_protocol(protocol);
            }
        };

        let call = match method.prepare(request) {
            Ok(call) => call,
            Err(err) => {
                tracing::warn!(method = %method_name, error = %err, "invalid request");
                return RpcError::request(err).into_response_with_protocol(protocol);
            }
        };

        let state = RequestState::from_parts(&parts, &service_path);
        let factory = Arc::clone(&self.factory);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut instance = factory();
            if let Some(aware) = instance.request_state_aware() {
                aware.initialize_request_state(state);
            }
            call.invoke(&mut instance)
        })
        .await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(RemoteError::Application(err))) => {
                tracing::debug!(method = %method_name, error = %err, "application error");
                return RpcError::application(&err).into_response_with_protocol(protocol);
            }
            Ok(Err(RemoteError::Internal(err))) => {
                tracing::error!(
                    service = S::definition_name(),
                    method = %method_name,
                    error = %err,
                    "unexpected error from ProtoRPC method implementation"
                );
                return RpcError::server().into_response_with_protocol(protocol);
            }
            Err(err) => {
                tracing::error!(
                    service = S::definition_name(),
                    method = %method_name,
                    error = %err,
                    "ProtoRPC method implementation did not complete"
                );
                return RpcError::server().into_response_with_protocol(protocol);
            }
        };

        match protocol.codec().encode(&response) {
            Ok(body) => ok_response(&response_content_type, body, protocol),
            Err(err) => {
                tracing::error!(
                    service = S::definition_name(),
                    method = %method_name,
                    error = %err,
                    "failed to encode response"
                );
                RpcError::server().into_response_with_protocol(protocol)
            }
        }
    }
}

/// The request's content type, from `Content-Type` or else the override
/// header. Blank and non-ASCII values count as absent.
fn request_content_type<'a>(headers: &'a HeaderMap, override_header: &HeaderName) -> Option<&'a str> {
    [&header::CONTENT_TYPE, override_header]
        .into_iter()
        .filter_map(|name| headers.get(name)?.to_str().ok())
        .find(|value| !value.trim().is_empty())
}

fn ok_response(content_type: &str, body: Bytes, protocol: &ProtocolEntry) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to build response");
            RpcError::server().into_response_with_protocol(protocol)
        })
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum BodyError {
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),

    #[error(transparent)]
    TooLarge(#[from] MessageTooLarge),

    #[error("request body ended after {received} of {expected} bytes")]
    Truncated { expected: usize, received: usize },

    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// Read the body: exactly `Content-Length` bytes if the header is present,
/// otherwise everything.
pub(crate) async fn read_body(
    headers: &HeaderMap,
    mut body: Body,
    limits: MessageLimits,
) -> Result<Bytes, BodyError> {
    let expected = match headers.get(header::CONTENT_LENGTH) {
        Some(value) => {
            let text = String::from_utf8_lossy(value.as_bytes());
            let length = text
                .trim()
                .parse::<usize>()
                .map_err(|_| BodyError::InvalidContentLength(text.to_string()))?;
            limits.check_size(length)?;
            Some(length)
        }
        None => None,
    };

    let mut buffer = BytesMut::new();
    while expected.is_none_or(|length| buffer.len() < length) {
        let Some(frame) = body.frame().await else {
            break;
        };
        if let Ok(data) = frame?.into_data() {
            // bytes past Content-Length are never buffered
            let take = expected.map_or(data.len(), |length| data.len().min(length - buffer.len()));
            buffer.extend_from_slice(&data[..take]);
            limits.check_size(buffer.len())?;
        }
    }

    if let Some(length) = expected {
        if buffer.len() < length {
            return Err(BodyError::Truncated {
                expected: length,
                received: buffer.len(),
            });
        }
    }
    Ok(buffer.freeze())
}

/// Tower service routing requests to the first mapping whose path matches.
///
/// Built by [`MakeServiceBuilder`](crate::MakeServiceBuilder).
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<[Arc<dyn Route>]>,
}

impl Dispatcher {
    pub(crate) fn new(routes: Vec<Arc<dyn Route>>) -> Self {
        Self {
            routes: routes.into(),
        }
    }

    async fn route(routes: Arc<[Arc<dyn Route>]>, request: Request) -> Response {
        let path = request.uri().path().to_owned();
        for route in routes.iter() {
            if let Some((service_path, method)) = route.split_path(&path) {
                let (service_path, method) = (service_path.to_owned(), method.to_owned());
                return Arc::clone(route).handle(request, service_path, method).await;
            }
        }
        tracing::debug!(path = %path, "no service mapped for path");
        HttpError::NotFound.into_response()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl tower::Service<Request> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let routes = Arc::clone(&self.routes);
        Box::pin(async move { Ok(Self::route(routes, request).await) })
    }
}
