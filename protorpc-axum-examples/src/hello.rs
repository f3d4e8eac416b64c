//! A typed service: one method taking and returning plain structs.

use protorpc_axum::prelude::*;

static HELLO_REQUEST_FIELDS: [FieldDescriptor; 1] =
    [FieldDescriptor::new("my_name", FieldKind::String).required()];

static HELLO_RESPONSE_FIELDS: [FieldDescriptor; 1] =
    [FieldDescriptor::new("hello", FieldKind::String).required()];

pub static HELLO_REQUEST: MessageDescriptor =
    MessageDescriptor::new("hello.HelloRequest", &HELLO_REQUEST_FIELDS);

pub static HELLO_RESPONSE: MessageDescriptor =
    MessageDescriptor::new("hello.HelloResponse", &HELLO_RESPONSE_FIELDS);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelloRequest {
    pub my_name: String,
}

impl Message for HelloRequest {
    fn descriptor() -> &'static MessageDescriptor {
        &HELLO_REQUEST
    }

    fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError> {
        DynamicMessage::new(&HELLO_REQUEST).with("my_name", self.my_name.as_str())
    }

    fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError> {
        message.expect_type(&HELLO_REQUEST)?;
        let my_name = message
            .get_string("my_name")
            .ok_or_else(|| ValidationError::missing(HELLO_REQUEST.name(), "my_name"))?;
        Ok(Self {
            my_name: my_name.to_owned(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelloResponse {
    pub hello: String,
}

impl Message for HelloResponse {
    fn descriptor() -> &'static MessageDescriptor {
        &HELLO_RESPONSE
    }

    fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError> {
        DynamicMessage::new(&HELLO_RESPONSE).with("hello", self.hello.as_str())
    }

    fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError> {
        message.expect_type(&HELLO_RESPONSE)?;
        let hello = message
            .get_string("hello")
            .ok_or_else(|| ValidationError::missing(HELLO_RESPONSE.name(), "hello"))?;
        Ok(Self {
            hello: hello.to_owned(),
        })
    }
}

#[derive(Default)]
pub struct HelloService;

impl HelloService {
    fn hello(&mut self, request: HelloRequest) -> Result<HelloResponse, RemoteError> {
        Ok(HelloResponse {
            hello: format!("Hello there, {}!", request.my_name),
        })
    }
}

impl Service for HelloService {
    fn definition_name() -> &'static str {
        "hello.HelloService"
    }

    fn remote_methods() -> RemoteMethods<Self> {
        RemoteMethods::new().method("hello", Self::hello)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_hello() {
        let app = ServiceMapping::<HelloService>::from_default()
            .service_path("/hello")
            .into_router();
        let request = Request::post("/hello.hello")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"my_name": "Alice"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"hello": "Hello there, Alice!"}));
    }

    #[tokio::test]
    async fn test_hello_requires_name() {
        let app = ServiceMapping::<HelloService>::from_default()
            .service_path("/hello")
            .into_router();
        let request = Request::post("/hello.hello")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["state"], "REQUEST_ERROR");
    }
}
