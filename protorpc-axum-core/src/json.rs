//! JSON wire format for messages.
//!
//! One JSON object per message, keyed by field name:
//! - unset fields and empty repeated fields are omitted
//! - enum values are written as their symbolic name
//! - bytes values are written as standard base64 strings; whitespace,
//!   missing padding and stray trailing bits are tolerated on decode
//! - nested messages are nested objects
//!
//! Decoding is lenient in the ways clients rely on: unknown keys are dropped,
//! `null` clears a field, a scalar is accepted for a repeated field, enum
//! values may be given by name or number, and integral numbers are accepted
//! for float fields. A list given for a singular field assigns its last
//! element.
//!
//! # Example
//!
//! ```
//! use protorpc_axum_core::{
//!     DynamicMessage, FieldDescriptor, FieldKind, MessageDescriptor, decode_message, encode_message,
//! };
//!
//! static POINT_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("x", FieldKind::Float).required(),
//!     FieldDescriptor::new("label", FieldKind::String),
//! ];
//! static POINT: MessageDescriptor = MessageDescriptor::new("geo.Point", &POINT_FIELDS);
//!
//! let point = decode_message(&POINT, br#"{"x": 3, "unknown": true}"#).unwrap();
//! assert_eq!(point.get_float("x"), Some(3.0));
//!
//! let encoded = encode_message(&point).unwrap();
//! assert_eq!(&encoded[..], br#"{"x":3.0}"#);
//! ```

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::{Engine, alphabet};
use bytes::Bytes;
use serde_json::{Map, Number, Value as JsonValue};

use crate::codec::Codec;
use crate::error::{CodecError, DecodeError, ValidationError};
use crate::schema::{
    DynamicMessage, FieldDescriptor, FieldKind, FieldValue, Message, MessageDescriptor, Value,
    ValueKind,
};

/// Content type written on JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Further content types accepted for JSON requests.
pub const JSON_ALTERNATIVE_CONTENT_TYPES: &[&str] = &[
    "application/x-javascript",
    "text/javascript",
    "text/x-javascript",
    "text/x-json",
    "text/json",
];

/// The JSON [`Codec`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn default_content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn alternative_content_types(&self) -> &'static [&'static str] {
        JSON_ALTERNATIVE_CONTENT_TYPES
    }

    fn encode(&self, message: &DynamicMessage) -> Result<Bytes, CodecError> {
        Ok(encode_message(message)?)
    }

    fn decode(
        &self,
        descriptor: &'static MessageDescriptor,
        data: &[u8],
    ) -> Result<DynamicMessage, CodecError> {
        decode_message(descriptor, data)
    }
}

/// Encode a message as a JSON object.
///
/// Fails with [`ValidationError`] if the message is not initialized.
pub fn encode_message(message: &DynamicMessage) -> Result<Bytes, ValidationError> {
    message.check_initialized()?;
    let object = message_to_json(message)?;
    Ok(Bytes::from(JsonValue::Object(object).to_string()))
}

/// Decode a JSON object into a new instance of `descriptor`.
///
/// Empty or all-whitespace input yields an empty instance without checking
/// required fields. Otherwise the merged message must be initialized.
pub fn decode_message(
    descriptor: &'static MessageDescriptor,
    data: &[u8],
) -> Result<DynamicMessage, CodecError> {
    let mut message = DynamicMessage::new(descriptor);
    if is_blank(data) {
        return Ok(message);
    }
    merge_message(&mut message, data)?;
    message.check_initialized()?;
    Ok(message)
}

/// Merge a JSON object into an existing message.
///
/// Keys present in the object replace the corresponding fields, `null`
/// clears them, and fields absent from the object are left as they were.
/// Required fields are not checked.
pub fn merge_message(message: &mut DynamicMessage, data: &[u8]) -> Result<(), CodecError> {
    if is_blank(data) {
        return Ok(());
    }
    match serde_json::from_slice::<JsonValue>(data).map_err(DecodeError::from)? {
        JsonValue::Object(object) => merge_object(message, object),
        other => Err(DecodeError::ExpectedObject {
            message: message.descriptor().name(),
            found: json_type(&other),
        }
        .into()),
    }
}

/// Encode a typed message.
pub fn encode<M: Message>(message: &M) -> Result<Bytes, ValidationError> {
    encode_message(&message.to_dynamic()?)
}

/// Decode a typed message.
pub fn decode<M: Message>(data: &[u8]) -> Result<M, CodecError> {
    let message = decode_message(M::descriptor(), data)?;
    Ok(M::from_dynamic(&message)?)
}

fn is_blank(data: &[u8]) -> bool {
    data.iter().all(u8::is_ascii_whitespace)
}

// ---- Encoding ----

fn message_to_json(message: &DynamicMessage) -> Result<Map<String, JsonValue>, ValidationError> {
    let mut object = Map::new();
    for (field, value) in message.fields() {
        let json = match value {
            FieldValue::Single(value) => value_to_json(message, field, value)?,
            FieldValue::Repeated(values) if values.is_empty() => continue,
            FieldValue::Repeated(values) => JsonValue::Array(
                values
                    .iter()
                    .map(|value| value_to_json(message, field, value))
                    .collect::<Result<_, _>>()?,
            ),
        };
        object.insert(field.name().to_owned(), json);
    }
    Ok(object)
}

fn value_to_json(
    message: &DynamicMessage,
    field: &FieldDescriptor,
    value: &Value,
) -> Result<JsonValue, ValidationError> {
    Ok(match value {
        Value::Integer(value) => JsonValue::from(*value),
        Value::Float(value) => Number::from_f64(*value).map(JsonValue::Number).ok_or(
            ValidationError::NonFiniteFloat {
                message: message.descriptor().name(),
                field: field.name(),
            },
        )?,
        Value::String(value) => JsonValue::String(value.clone()),
        Value::Boolean(value) => JsonValue::Bool(*value),
        Value::Bytes(value) => JsonValue::String(STANDARD.encode(value)),
        Value::Enum(value) => JsonValue::String(value.name().to_owned()),
        Value::Message(nested) => JsonValue::Object(message_to_json(nested)?),
    })
}

// ---- Decoding ----

/// Converts one JSON element into a value for a field of the given kind.
type Converter = fn(
    &'static MessageDescriptor,
    &'static FieldDescriptor,
    JsonValue,
) -> Result<Value, CodecError>;

/// Indexed by `ValueKind as usize`.
const CONVERTERS: [Converter; ValueKind::COUNT] = [
    convert_scalar,
    convert_float,
    convert_scalar,
    convert_scalar,
    convert_bytes,
    convert_enum,
    convert_message,
];

fn converter(kind: ValueKind) -> Converter {
    CONVERTERS[kind as usize]
}

fn merge_object(
    message: &mut DynamicMessage,
    object: Map<String, JsonValue>,
) -> Result<(), CodecError> {
    let descriptor = message.descriptor();
    for (key, value) in object {
        let Some(field) = descriptor.field(&key) else {
            tracing::trace!(
                message_type = descriptor.name(),
                field = %key,
                "discarding unknown field"
            );
            continue;
        };

        if value.is_null() {
            message.reset(field.name())?;
            continue;
        }

        let items = match value {
            JsonValue::Array(items) if items.is_empty() => continue,
            JsonValue::Array(items) => items,
            item => vec![item],
        };

        let convert = converter(field.kind().tag());
        let mut values = items
            .into_iter()
            .map(|item| convert(descriptor, field, item))
            .collect::<Result<Vec<_>, _>>()?;

        if field.is_repeated() {
            message.set(field.name(), FieldValue::Repeated(values))?;
        } else if let Some(last) = values.pop() {
            message.set(field.name(), FieldValue::Single(last))?;
        }
    }
    Ok(())
}

/// Pass-through for kinds whose JSON form is the value itself; the schema
/// check on assignment rejects mismatches.
fn convert_scalar(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: JsonValue,
) -> Result<Value, CodecError> {
    match item {
        JsonValue::Bool(value) => Ok(Value::Boolean(value)),
        JsonValue::String(value) => Ok(Value::String(value)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(value) => Ok(Value::Integer(value)),
            None => number
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| wrong_json(message, field, &JsonValue::Number(number))),
        },
        other => Err(wrong_json(message, field, &other)),
    }
}

fn convert_float(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: JsonValue,
) -> Result<Value, CodecError> {
    if let JsonValue::Number(number) = &item {
        return number
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| wrong_json(message, field, &item));
    }
    convert_scalar(message, field, item)
}

/// Decoding accepts missing padding and non-zero trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn convert_bytes(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: JsonValue,
) -> Result<Value, CodecError> {
    match item {
        JsonValue::String(text) => {
            // line-wrapped (MIME style) input
            let compact: Vec<u8> = text
                .bytes()
                .filter(|byte| !byte.is_ascii_whitespace())
                .collect();
            LENIENT_BASE64
                .decode(compact)
                .map(Value::Bytes)
            .map_err(|source| {
                DecodeError::Base64 {
                    field: field.name(),
                    source,
                }
                .into()
            })
        }
        other => Err(wrong_json(message, field, &other)),
    }
}

fn convert_enum(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: JsonValue,
) -> Result<Value, CodecError> {
    let FieldKind::Enum(descriptor) = field.kind() else {
        return convert_scalar(message, field, item);
    };

    let value = match &item {
        JsonValue::String(name) => descriptor.by_name(name),
        JsonValue::Number(number) => number
            .as_i64()
            .and_then(|number| i32::try_from(number).ok())
            .and_then(|number| descriptor.by_number(number)),
        _ => None,
    };

    value.map(Value::Enum).ok_or_else(|| {
        ValidationError::InvalidEnumValue {
            enum_name: descriptor.name(),
            value: item.to_string(),
        }
        .into()
    })
}

fn convert_message(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: JsonValue,
) -> Result<Value, CodecError> {
    let FieldKind::Message(descriptor) = field.kind() else {
        return convert_scalar(message, field, item);
    };

    match item {
        JsonValue::Object(object) => {
            let mut nested = DynamicMessage::new(descriptor);
            merge_object(&mut nested, object)?;
            Ok(Value::Message(nested))
        }
        other => Err(DecodeError::ExpectedObject {
            message: descriptor.name(),
            found: json_type(&other),
        }
        .into()),
    }
}

fn wrong_json(
    message: &'static MessageDescriptor,
    field: &'static FieldDescriptor,
    item: &JsonValue,
) -> CodecError {
    ValidationError::WrongType {
        message: message.name(),
        field: field.name(),
        expected: field.kind().type_name(),
        found: format!("JSON {}", json_type(item)),
    }
    .into()
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
