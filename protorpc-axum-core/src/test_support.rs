//! Message types shared by the unit tests of this crate.

use crate::schema::{EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor};

pub(crate) static COLOR: EnumDescriptor =
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

/// Every field kind, singular and repeated, including self-reference.
pub(crate) static ECHO_DATA: MessageDescriptor =
    MessageDescriptor::new("protorpc.echo.EchoData", &ECHO_DATA_FIELDS);

static INNER_FIELDS: [FieldDescriptor; 1] =
    [FieldDescriptor::new("value", FieldKind::String).required()];

pub(crate) static INNER: MessageDescriptor = MessageDescriptor::new("test.Inner", &INNER_FIELDS);

static OUTER_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("inner", FieldKind::Message(&INNER)).required(),
    FieldDescriptor::new("note", FieldKind::String),
];

/// A required nested message with its own required field.
pub(crate) static OUTER: MessageDescriptor = MessageDescriptor::new("test.Outer", &OUTER_FIELDS);
