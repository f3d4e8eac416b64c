//! A dynamic service over a message using every field kind.

use std::time::{SystemTime, UNIX_EPOCH};

use protorpc_axum::prelude::*;

pub static COLOR: EnumDescriptor =
    EnumDescriptor::new("protorpc.echo.Color", &[("RED", 1), ("GREEN", 2), ("BLUE", 3)]);

static ECHO_DATA_FIELDS: [FieldDescriptor; 17] = [
    FieldDescriptor::new("required", FieldKind::Enum(&COLOR)).required(),
    FieldDescriptor::new("a_string", FieldKind::String),
    FieldDescriptor::new("an_int", FieldKind::Integer),
    FieldDescriptor::new("a_float", FieldKind::Float),
    FieldDescriptor::new("a_bool", FieldKind::Boolean),
    FieldDescriptor::new("a_bytes", FieldKind::Bytes),
    FieldDescriptor::new("a_color", FieldKind::Enum(&COLOR)),
    FieldDescriptor::new("an_echo", FieldKind::Message(&ECHO_DATA)),
    FieldDescriptor::new("strings", FieldKind::String).repeated(),
    FieldDescriptor::new("ints", FieldKind::Integer).repeated(),
    FieldDescriptor::new("floats", FieldKind::Float).repeated(),
    FieldDescriptor::new("bools", FieldKind::Boolean).repeated(),
    FieldDescriptor::new("bytes", FieldKind::Bytes).repeated(),
    FieldDescriptor::new("colors", FieldKind::Enum(&COLOR)).repeated(),
    FieldDescriptor::new("echos", FieldKind::Message(&ECHO_DATA)).repeated(),
    FieldDescriptor::new("want_time", FieldKind::Boolean),
    FieldDescriptor::new("time", FieldKind::Integer),
];

/// Echo message, referencing itself both nested and repeated.
pub static ECHO_DATA: MessageDescriptor =
    MessageDescriptor::new("protorpc.echo.EchoData", &ECHO_DATA_FIELDS);

/// Echoes the request. With `want_time` set, `time` holds the server's
/// seconds since the epoch.
#[derive(Default)]
pub struct EchoService;

impl EchoService {
    fn echo(&mut self, mut request: DynamicMessage) -> Result<DynamicMessage, RemoteError> {
        if request.get_bool("want_time") == Some(true) {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(RemoteError::internal)?;
            let seconds = i64::try_from(now.as_secs()).map_err(RemoteError::internal)?;
            request
                .set_value("time", seconds)
                .map_err(RemoteError::internal)?;
        }
        Ok(request)
    }
}

impl Service for EchoService {
    fn definition_name() -> &'static str {
        "protorpc.echo.EchoService"
    }

    fn remote_methods() -> RemoteMethods<Self> {
        RemoteMethods::new().dynamic_method("echo", &ECHO_DATA, &ECHO_DATA, Self::echo)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn echo(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = ServiceMapping::<EchoService>::from_default()
            .service_path("/echo")
            .into_router();
        let request = Request::post("/echo.echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_echo_returns_request() {
        let (status, body) = echo(
            r#"{"required": "RED", "a_string": "hi", "ints": [1, 2], "a_bytes": "AAEC",
                "an_echo": {"required": 2, "colors": "BLUE"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "required": "RED",
                "a_string": "hi",
                "ints": [1, 2],
                "a_bytes": "AAEC",
                "an_echo": {"required": "GREEN", "colors": ["BLUE"]},
            })
        );
    }

    #[tokio::test]
    async fn test_echo_stamps_time() {
        let (status, body) = echo(r#"{"required": "BLUE", "want_time": true}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_echo_rejects_unknown_color() {
        let (status, body) = echo(r#"{"required": "PURPLE"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["state"], "REQUEST_ERROR");
    }
}
