//! RPC status message.
//!
//! Every failed call is answered with an [`RpcStatus`], encoded with the same
//! codec as the request. It is an ordinary message type and goes through the
//! same schema and codec machinery as application messages.

use std::fmt;

use crate::error::{ApplicationError, ValidationError};
use crate::schema::{
    DynamicMessage, EnumDescriptor, EnumValue, FieldDescriptor, FieldKind, Message,
    MessageDescriptor,
};

/// Schema of the `state` enum. Members are declared in [`RpcState`] order.
pub static RPC_STATE: EnumDescriptor = EnumDescriptor::new(
    "protorpc.RpcState",
    &[
        ("OK", 1),
        ("RUNNING", 2),
        ("REQUEST_ERROR", 3),
        ("SERVER_ERROR", 4),
        ("NETWORK_ERROR", 5),
        ("APPLICATION_ERROR", 6),
        ("METHOD_NOT_FOUND_ERROR", 7),
    ],
);

static RPC_STATUS_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::new("state", FieldKind::Enum(&RPC_STATE)).required(),
    FieldDescriptor::new("error_message", FieldKind::String),
    FieldDescriptor::new("error_name", FieldKind::String),
];

/// Schema of [`RpcStatus`].
pub static RPC_STATUS: MessageDescriptor =
    MessageDescriptor::new("protorpc.RpcStatus", &RPC_STATUS_FIELDS);

/// State of an RPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RpcState {
    Ok = 1,
    Running = 2,
    RequestError = 3,
    ServerError = 4,
    NetworkError = 5,
    ApplicationError = 6,
    MethodNotFoundError = 7,
}

impl RpcState {
    const ALL: [RpcState; 7] = [
        RpcState::Ok,
        RpcState::Running,
        RpcState::RequestError,
        RpcState::ServerError,
        RpcState::NetworkError,
        RpcState::ApplicationError,
        RpcState::MethodNotFoundError,
    ];

    /// Wire number of the state.
    pub fn number(self) -> i32 {
        self as i32
    }

    /// Symbolic name, as written on the JSON wire.
    pub fn as_str(self) -> &'static str {
        match self {
            RpcState::Ok => "OK",
            RpcState::Running => "RUNNING",
            RpcState::RequestError => "REQUEST_ERROR",
            RpcState::ServerError => "SERVER_ERROR",
            RpcState::NetworkError => "NETWORK_ERROR",
            RpcState::ApplicationError => "APPLICATION_ERROR",
            RpcState::MethodNotFoundError => "METHOD_NOT_FOUND_ERROR",
        }
    }

    pub fn from_number(number: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.number() == number)
    }

    /// Whether the state ends an RPC with a failure.
    pub fn is_error(self) -> bool {
        !matches!(self, RpcState::Ok | RpcState::Running)
    }

    pub fn to_enum_value(self) -> EnumValue {
        EnumValue::from_index(&RPC_STATE, self.number() as usize - 1)
    }

    pub fn from_enum_value(value: EnumValue) -> Result<Self, ValidationError> {
        if value.descriptor() != &RPC_STATE {
            return Err(ValidationError::InvalidEnumValue {
                enum_name: RPC_STATE.name(),
                value: format!("{value:?}"),
            });
        }
        Self::from_number(value.number()).ok_or_else(|| ValidationError::InvalidEnumValue {
            enum_name: RPC_STATE.name(),
            value: value.number().to_string(),
        })
    }
}

impl fmt::Display for RpcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a finished or failed RPC.
///
/// # Example
///
/// ```
/// use protorpc_axum_core::{RpcState, RpcStatus, encode};
///
/// let status = RpcStatus::new(RpcState::MethodNotFoundError, "Unrecognized RPC method: nope");
/// let encoded = encode(&status).unwrap();
/// assert_eq!(
///     &encoded[..],
///     br#"{"error_message":"Unrecognized RPC method: nope","state":"METHOD_NOT_FOUND_ERROR"}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcStatus {
    pub state: RpcState,
    pub error_message: Option<String>,
    pub error_name: Option<String>,
}

impl RpcStatus {
    pub fn new<S: Into<String>>(state: RpcState, error_message: S) -> Self {
        Self {
            state,
            error_message: Some(error_message.into()),
            error_name: None,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, error_name: S) -> Self {
        self.error_name = Some(error_name.into());
        self
    }
}

impl From<&ApplicationError> for RpcStatus {
    fn from(err: &ApplicationError) -> Self {
        Self {
            state: RpcState::ApplicationError,
            error_message: Some(err.message().to_owned()),
            error_name: err.name().map(str::to_owned),
        }
    }
}

impl Message for RpcStatus {
    fn descriptor() -> &'static MessageDescriptor {
        &RPC_STATUS
    }

    fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError> {
        let mut message = DynamicMessage::new(&RPC_STATUS);
        message.set_value("state", self.state.to_enum_value())?;
        if let Some(error_message) = &self.error_message {
            message.set_value("error_message", error_message.as_str())?;
        }
        if let Some(error_name) = &self.error_name {
            message.set_value("error_name", error_name.as_str())?;
        }
        Ok(message)
    }

    fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError> {
        message.expect_type(&RPC_STATUS)?;
        let state = message
            .get_enum("state")
            .ok_or_else(|| ValidationError::missing(RPC_STATUS.name(), "state"))?;
        Ok(Self {
            state: RpcState::from_enum_value(state)?,
            error_message: message.get_string("error_message").map(str::to_owned),
            error_name: message.get_string("error_name").map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{decode, encode};
    use crate::test_support::COLOR;

    #[test]
    fn test_state_numbers_match_descriptor() {
        for state in RpcState::ALL {
            let value = state.to_enum_value();
            assert_eq!(value.number(), state.number());
            assert_eq!(value.name(), state.as_str());
            assert_eq!(RpcState::from_enum_value(value).unwrap(), state);
        }
        assert_eq!(RPC_STATE.values().count(), RpcState::ALL.len());
    }

    #[test]
    fn test_from_number() {
        assert_eq!(RpcState::from_number(7), Some(RpcState::MethodNotFoundError));
        assert_eq!(RpcState::from_number(0), None);
    }

    #[test]
    fn test_is_error() {
        assert!(!RpcState::Ok.is_error());
        assert!(!RpcState::Running.is_error());
        assert!(RpcState::ServerError.is_error());
    }

    #[test]
    fn test_foreign_enum_value_rejected() {
        let red = COLOR.by_name("RED").unwrap();
        assert!(RpcState::from_enum_value(red).is_err());
    }

    #[test]
    fn test_status_json() {
        let status = RpcStatus::new(RpcState::ApplicationError, "full").with_name("BOOK_FULL");
        let encoded = encode(&status).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "state": "APPLICATION_ERROR",
                "error_message": "full",
                "error_name": "BOOK_FULL",
            })
        );
        assert_eq!(decode::<RpcStatus>(&encoded).unwrap(), status);
    }

    #[test]
    fn test_status_requires_state() {
        assert!(decode::<RpcStatus>(br#"{"error_message": "x"}"#).is_err());
    }

    #[test]
    fn test_status_from_application_error() {
        let err = ApplicationError::new("nope").with_name("NOPE");
        let status = RpcStatus::from(&err);
        assert_eq!(status.state, RpcState::ApplicationError);
        assert_eq!(status.error_message.as_deref(), Some("nope"));
        assert_eq!(status.error_name.as_deref(), Some("NOPE"));
    }
}
