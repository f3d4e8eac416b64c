//! Error responses.
//!
//! Requests are rejected in one of two ways:
//! - [`HttpError`]: before a codec is negotiated, as a plain-text HTTP error
//! - [`RpcError`]: afterwards, as an [`RpcStatus`] encoded with the codec of
//!   the request

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use protorpc_axum_core::{ApplicationError, Message, ProtocolEntry, RpcState, RpcStatus};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Message sent for every unexpected server failure.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// A request rejected before codec negotiation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// The path does not name a method of a mapped service.
    #[error("no service mapped at this path")]
    NotFound,

    /// Neither `Content-Type` nor the override header is present.
    #[error("missing content type")]
    MissingContentType,

    /// Only `POST` invokes methods.
    #[error("{service_path}.{method} is a ProtoRPC method")]
    MethodNotAllowed {
        service_path: String,
        method: String,
        definition_name: &'static str,
    },

    /// No codec is registered for the content type.
    #[error("unsupported content type {0:?}")]
    UnsupportedMediaType(String),
}

impl HttpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::MissingContentType => StatusCode::BAD_REQUEST,
            HttpError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    fn body(&self) -> String {
        match self {
            HttpError::MethodNotAllowed {
                service_path,
                method,
                definition_name,
            } => format!(
                "{service_path}.{method} is a ProtoRPC method.\n\nService {definition_name}\n"
            ),
            other => {
                let status = other.status_code();
                format!(
                    "{} {}\n",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                )
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status_code(),
            [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
            self.body(),
        )
            .into_response();
        if matches!(self, HttpError::MethodNotAllowed { .. }) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

/// A request rejected after codec negotiation, answered with an [`RpcStatus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcError {
    status_code: StatusCode,
    status: RpcStatus,
}

impl RpcError {
    /// The method name is not in the service's method table.
    pub fn method_not_found(method: &str) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            status: RpcStatus::new(
                RpcState::MethodNotFoundError,
                format!("Unrecognized RPC method: {method}"),
            ),
        }
    }

    /// The request body could not be read or decoded.
    pub fn request<E: std::fmt::Display>(err: E) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            status: RpcStatus::new(
                RpcState::RequestError,
                format!("Error parsing ProtoRPC request (Unable to parse request content: {err})"),
            ),
        }
    }

    /// The method failed with an expected application error.
    pub fn application(err: &ApplicationError) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            status: RpcStatus::from(err),
        }
    }

    /// Any unexpected failure. Carries no detail.
    pub fn server() -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            status: RpcStatus::new(RpcState::ServerError, INTERNAL_SERVER_ERROR_MESSAGE),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status(&self) -> &RpcStatus {
        &self.status
    }

    /// Encode the status with the request's codec.
    pub fn into_response_with_protocol(self, protocol: &ProtocolEntry) -> Response {
        let encoded = self
            .status
            .to_dynamic()
            .map_err(|err| err.to_string())
            .and_then(|status| protocol.codec().encode(&status).map_err(|err| err.to_string()));

        match encoded {
            Ok(body) => Response::builder()
                .status(self.status_code)
                .header(header::CONTENT_TYPE, protocol.default_content_type())
                .body(Body::from(body))
                .unwrap_or_else(|err| {
                    tracing::error!(error = %err, "failed to build status response");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }),
            Err(err) => {
                tracing::error!(
                    protocol = protocol.name(),
                    error = %err,
                    "failed to encode RPC status"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_MESSAGE).into_response()
            }
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.status.state,
            self.status.error_message.as_deref().unwrap_or("error")
        )
    }
}

impl std::error::Error for RpcError {}
