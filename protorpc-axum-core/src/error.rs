//! Error types shared by the codec, the schema and the protocol registry.
//!
//! This module provides:
//! - [`ValidationError`]: a value or message does not satisfy its schema
//! - [`DecodeError`]: a payload could not be parsed at all
//! - [`CodecError`]: either of the above, as returned by codec operations
//! - [`ProtocolError`]: protocol registration and lookup failures
//! - [`ApplicationError`]: an expected business-logic failure raised by a service method

/// A value or message does not satisfy its schema.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The message type declares no field with this name.
    #[error("message {message} has no field named {field:?}")]
    UnknownField { message: &'static str, field: String },

    /// A required field is unset. `field` is the dotted path from the
    /// checked message down to the missing field.
    #[error("required field {field} of message {message} is not set")]
    MissingRequiredField { message: &'static str, field: String },

    /// The value kind does not match the field kind.
    #[error("field {field} of message {message} expects {expected}, found {found}")]
    WrongType {
        message: &'static str,
        field: &'static str,
        expected: String,
        found: String,
    },

    /// A single value was assigned to a repeated field.
    #[error("field {field} of message {message} is repeated and takes a list of values")]
    ExpectedRepeated {
        message: &'static str,
        field: &'static str,
    },

    /// A list of values was assigned to a singular field.
    #[error("field {field} of message {message} is not repeated and takes a single value")]
    UnexpectedRepeated {
        message: &'static str,
        field: &'static str,
    },

    /// Neither a symbol nor a number of the enum type.
    #[error("invalid value {value} for enum {enum_name}")]
    InvalidEnumValue {
        enum_name: &'static str,
        value: String,
    },

    /// NaN and infinities have no JSON representation.
    #[error("field {field} of message {message} holds a non-finite float")]
    NonFiniteFloat {
        message: &'static str,
        field: &'static str,
    },

    /// A typed message was built from an instance of another type.
    #[error("expected message {expected}, found {found}")]
    WrongMessageType {
        expected: &'static str,
        found: &'static str,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::MissingRequiredField`].
    pub fn missing<S: Into<String>>(message: &'static str, field: S) -> Self {
        Self::MissingRequiredField {
            message,
            field: field.into(),
        }
    }
}

/// A payload could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not well-formed JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A message was expected but the JSON value is not an object.
    #[error("expected a JSON object for message {message}, found {found}")]
    ExpectedObject {
        message: &'static str,
        found: &'static str,
    },

    /// A bytes field holds text that is not valid base64.
    #[error("field {field} holds invalid base64: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

/// Error returned by codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl CodecError {
    /// Whether the failure came from schema validation rather than parsing.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Protocol registration and lookup failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("protocol {0:?} is already registered")]
    DuplicateName(String),

    #[error("content type {0:?} is already registered")]
    DuplicateContentType(String),

    #[error("no protocol registered for content type {0:?}")]
    UnknownContentType(String),

    #[error("no protocol registered under name {0:?}")]
    UnknownName(String),
}

/// An expected failure raised by a service method.
///
/// Carries a human readable message and an optional machine readable name.
/// Both are sent to the client unchanged in the `error_message` and
/// `error_name` fields of the status response.
///
/// # Example
///
/// ```
/// use protorpc_axum_core::ApplicationError;
///
/// let err = ApplicationError::new("guest book is full").with_name("BOOK_FULL");
/// assert_eq!(err.message(), "guest book is full");
/// assert_eq!(err.name(), Some("BOOK_FULL"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApplicationError {
    message: String,
    name: Option<String>,
}

impl ApplicationError {
    /// Create an application error with a message and no name.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            name: None,
        }
    }

    /// Attach an error name.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::missing("test.Outer", "inner.value");
        assert_eq!(
            err.to_string(),
            "required field inner.value of message test.Outer is not set"
        );

        let err = ValidationError::InvalidEnumValue {
            enum_name: "test.Color",
            value: "\"PURPLE\"".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value \"PURPLE\" for enum test.Color");
    }

    #[test]
    fn test_codec_error_is_validation() {
        let err = CodecError::from(ValidationError::missing("test.Outer", "inner"));
        assert!(err.is_validation());

        let json_err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = CodecError::from(DecodeError::from(json_err));
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn test_application_error() {
        let err = ApplicationError::new("out of stock");
        assert_eq!(err.to_string(), "out of stock");
        assert!(err.name().is_none());

        let err = err.with_name("OUT_OF_STOCK");
        assert_eq!(err.name(), Some("OUT_OF_STOCK"));
        assert_eq!(err.message(), "out of stock");
    }
}
