//! Services shared by the unit tests of this crate.

use protorpc_axum_core::{
    ApplicationError, DynamicMessage, FieldDescriptor, FieldKind, Message, MessageDescriptor,
    ValidationError, decode,
};

use crate::request_state::RequestState;
use crate::service::{RemoteError, RemoteMethods, RequestStateAware, Service};

static COUNTER_FIELDS: [FieldDescriptor; 1] =
    [FieldDescriptor::new("count", FieldKind::Integer).required()];

pub(crate) static COUNTER: MessageDescriptor = MessageDescriptor::new("test.Counter", &COUNTER_FIELDS);

pub(crate) static VOID: MessageDescriptor = MessageDescriptor::new("test.Void", &[]);

static CALLER_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::new("service_path", FieldKind::String),
    FieldDescriptor::new("server_host", FieldKind::String),
    FieldDescriptor::new("http_method", FieldKind::String),
    FieldDescriptor::new("user_agent", FieldKind::String),
];

pub(crate) static CALLER: MessageDescriptor = MessageDescriptor::new("test.Caller", &CALLER_FIELDS);

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Tally {
    pub count: i64,
}

impl Message for Tally {
    fn descriptor() -> &'static MessageDescriptor {
        &COUNTER
    }

    fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError> {
        DynamicMessage::new(&COUNTER).with("count", self.count)
    }

    fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError> {
        message.expect_type(&COUNTER)?;
        let count = message
            .get_integer("count")
            .ok_or_else(|| ValidationError::missing(COUNTER.name(), "count"))?;
        Ok(Self { count })
    }
}

/// Adds one, and misbehaves on request.
#[derive(Default)]
pub(crate) struct CounterService {
    state: Option<RequestState>,
}

impl Service for CounterService {
    fn definition_name() -> &'static str {
        "test.CounterService"
    }

    fn remote_methods() -> RemoteMethods<Self> {
        RemoteMethods::new()
            .method("add", |_service: &mut Self, tally: Tally| {
                if tally.count < 0 {
                    return Err(ApplicationError::new("count must not be negative")
                        .with_name("NEGATIVE")
                        .into());
                }
                Ok(Tally {
                    count: tally.count + 1,
                })
            })
            .method("fail", |_service: &mut Self, _tally: Tally| -> Result<Tally, RemoteError> {
                Err(RemoteError::internal("database password is hunter2"))
            })
            .method("reload", |_service: &mut Self, _tally: Tally| -> Result<Tally, RemoteError> {
                let stored: Tally = decode(br#"{"secret_db_column": 1}"#)?;
                Ok(stored)
            })
            .method("explode", |_service: &mut Self, _tally: Tally| -> Result<Tally, RemoteError> {
                panic!("boom")
            })
            .dynamic_method("mistyped", &COUNTER, &COUNTER, |_service, _request| {
                Ok(DynamicMessage::new(&CALLER))
            })
            .dynamic_method("whoami", &VOID, &CALLER, |service, _request| {
                let mut caller = DynamicMessage::new(&CALLER);
                if let Some(state) = &service.state {
                    caller
                        .set_value("service_path", state.service_path())
                        .map_err(RemoteError::internal)?
                        .set_value("http_method", state.http_method().as_str())
                        .map_err(RemoteError::internal)?;
                    if let Some(host) = state.server_host() {
                        caller
                            .set_value("server_host", host)
                            .map_err(RemoteError::internal)?;
                    }
                    if let Some(agent) = state.header("x-user-agent") {
                        caller
                            .set_value("user_agent", agent)
                            .map_err(RemoteError::internal)?;
                    }
                }
                Ok(caller)
            })
    }

    fn request_state_aware(&mut self) -> Option<&mut dyn RequestStateAware> {
        Some(self)
    }
}

impl RequestStateAware for CounterService {
    fn initialize_request_state(&mut self, state: RequestState) {
        self.state = Some(state);
    }
}
