//! Per-request information handed to service instances.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use http::request::Parts;
use http::uri::Authority;
use http::{Method, header};

/// Snapshot of the HTTP request that is being served.
///
/// Built once per request and passed to services that implement
/// [`RequestStateAware`](crate::RequestStateAware).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestState {
    remote_host: Option<String>,
    remote_address: Option<String>,
    server_host: Option<String>,
    server_port: Option<u16>,
    http_method: Method,
    service_path: String,
    headers: Vec<(String, String)>,
}

impl RequestState {
    pub(crate) fn from_parts(parts: &Parts, service_path: &str) -> Self {
        let remote_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let authority = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Authority>().ok())
            .or_else(|| parts.uri.authority().cloned());

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            remote_host: None,
            remote_address,
            server_host: authority.as_ref().map(|a| a.host().to_owned()),
            server_port: authority.as_ref().and_then(Authority::port_u16),
            http_method: parts.method.clone(),
            service_path: service_path.to_owned(),
            headers,
        }
    }

    /// Host name of the client. Reverse lookups are not performed, so this
    /// is only set when a fronting proxy supplies it.
    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    /// IP address of the client, when the server was started with
    /// connect info.
    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    pub fn server_host(&self) -> Option<&str> {
        self.server_host.as_deref()
    }

    pub fn server_port(&self) -> Option<u16> {
        self.server_port
    }

    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// The matched service path, without the method name.
    pub fn service_path(&self) -> &str {
        &self.service_path
    }

    /// All request headers in arrival order, names lower-case.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<RequestState")?;
        if let Some(host) = &self.remote_host {
            write!(f, " remote_host={host}")?;
        }
        if let Some(address) = &self.remote_address {
            write!(f, " remote_address={address}")?;
        }
        if let Some(host) = &self.server_host {
            write!(f, " server_host={host}")?;
        }
        if let Some(port) = self.server_port {
            write!(f, " server_port={port}")?;
        }
        write!(
            f,
            " http_method={} service_path={}>",
            self.http_method, self.service_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_from_parts() {
        let mut parts = parts(
            Request::post("/guestbook.post")
                .header("Host", "example.com:8080")
                .header("X-Request-Id", "abc")
                .header("Content-Type", "application/json")
                .body(())
                .unwrap(),
        );
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51000))));

        let state = RequestState::from_parts(&parts, "/guestbook");
        assert_eq!(state.remote_host(), None);
        assert_eq!(state.remote_address(), Some("10.0.0.7"));
        assert_eq!(state.server_host(), Some("example.com"));
        assert_eq!(state.server_port(), Some(8080));
        assert_eq!(state.http_method(), Method::POST);
        assert_eq!(state.service_path(), "/guestbook");
        assert_eq!(state.header("x-request-id"), Some("abc"));
        assert_eq!(state.header("X-Request-ID"), Some("abc"));
        assert!(
            state
                .headers()
                .iter()
                .any(|(name, _)| name == "content-type")
        );
    }

    #[test]
    fn test_from_parts_without_host_or_peer() {
        let state = RequestState::from_parts(&parts(Request::new(())), "");
        assert_eq!(state.server_host(), None);
        assert_eq!(state.server_port(), None);
        assert_eq!(state.remote_address(), None);
        assert!(state.headers().is_empty());
    }

    #[test]
    fn test_uri_authority_fallback() {
        let state = RequestState::from_parts(
            &parts(Request::post("http://rpc.local/hello.hello").body(()).unwrap()),
            "/hello",
        );
        assert_eq!(state.server_host(), Some("rpc.local"));
        assert_eq!(state.server_port(), None);
    }

    #[test]
    fn test_display() {
        let state = RequestState::from_parts(
            &parts(
                Request::post("/hello.hello")
                    .header("Host", "localhost:3000")
                    .body(())
                    .unwrap(),
            ),
            "/hello",
        );
        assert_eq!(
            state.to_string(),
            "<RequestState server_host=localhost server_port=3000 http_method=POST service_path=/hello>"
        );
    }
}
