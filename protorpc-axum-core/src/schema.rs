//! Static message schema.
//!
//! Every message type is described by a [`MessageDescriptor`]: a type name plus
//! an ordered, immutable list of [`FieldDescriptor`]s, declared as `static`
//! items. Message instances are held as [`DynamicMessage`], which checks every
//! assignment against its descriptor. Rust structs opt in through the
//! [`Message`] trait by converting to and from a [`DynamicMessage`].
//!
//! Field lists live in their own `static` array so descriptors can refer to
//! each other, and to themselves, for recursive message types.
//!
//! # Example
//!
//! ```
//! use protorpc_axum_core::{DynamicMessage, FieldDescriptor, FieldKind, MessageDescriptor};
//!
//! static GREETING_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("name", FieldKind::String).required(),
//!     FieldDescriptor::new("tags", FieldKind::String).repeated(),
//! ];
//! static GREETING: MessageDescriptor = MessageDescriptor::new("example.Greeting", &GREETING_FIELDS);
//!
//! let mut greeting = DynamicMessage::new(&GREETING);
//! assert!(!greeting.is_initialized());
//!
//! greeting.set_value("name", "world").unwrap();
//! assert!(greeting.is_initialized());
//! assert_eq!(greeting.get_string("name"), Some("world"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;

/// Kind tag of a field or value, without type parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    String,
    Boolean,
    Bytes,
    Enum,
    Message,
}

impl ValueKind {
    /// Number of kinds; tables indexed by `kind as usize` have this length.
    pub const COUNT: usize = 7;

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Bytes => "bytes",
            ValueKind::Enum => "enum",
            ValueKind::Message => "message",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a field, including the referenced type for enum and message fields.
#[derive(Clone, Copy, PartialEq)]
pub enum FieldKind {
    Integer,
    Float,
    String,
    Boolean,
    Bytes,
    Enum(&'static EnumDescriptor),
    Message(&'static MessageDescriptor),
}

impl FieldKind {
    /// The kind tag of this field kind.
    pub fn tag(&self) -> ValueKind {
        match self {
            FieldKind::Integer => ValueKind::Integer,
            FieldKind::Float => ValueKind::Float,
            FieldKind::String => ValueKind::String,
            FieldKind::Boolean => ValueKind::Boolean,
            FieldKind::Bytes => ValueKind::Bytes,
            FieldKind::Enum(_) => ValueKind::Enum,
            FieldKind::Message(_) => ValueKind::Message,
        }
    }

    /// Human readable type, used in validation errors.
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Enum(descriptor) => format!("enum {}", descriptor.name()),
            FieldKind::Message(descriptor) => format!("message {}", descriptor.name()),
            other => other.tag().to_string(),
        }
    }
}

// Descriptors may be recursive, so only the referenced type name is printed.
impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Enum(descriptor) => f.debug_tuple("Enum").field(&descriptor.name()).finish(),
            FieldKind::Message(descriptor) => {
                f.debug_tuple("Message").field(&descriptor.name()).finish()
            }
            other => write!(f, "{:?}", other.tag()),
        }
    }
}

/// Schema-level metadata for one field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
    repeated: bool,
    required: bool,
}

impl FieldDescriptor {
    /// An optional, singular field.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            repeated: false,
            required: false,
        }
    }

    /// Mark the field as required.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Mark the field as repeated.
    pub const fn repeated(self) -> Self {
        Self {
            repeated: true,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Schema of a message type.
///
/// Equality is identity: two descriptors are equal only if they are the same
/// `static` item.
pub struct MessageDescriptor {
    name: &'static str,
    fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self { name, fields }
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for MessageDescriptor {}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Schema of an enum type: ordered `(symbol, number)` pairs.
pub struct EnumDescriptor {
    name: &'static str,
    values: &'static [(&'static str, i32)],
}

impl EnumDescriptor {
    pub const fn new(name: &'static str, values: &'static [(&'static str, i32)]) -> Self {
        Self { name, values }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All members in declaration order.
    pub fn values(&'static self) -> impl Iterator<Item = EnumValue> {
        (0..self.values.len()).map(move |index| EnumValue {
            descriptor: self,
            index,
        })
    }

    /// Look up a member by its symbolic name.
    pub fn by_name(&'static self, name: &str) -> Option<EnumValue> {
        self.values
            .iter()
            .position(|(symbol, _)| *symbol == name)
            .map(|index| EnumValue {
                descriptor: self,
                index,
            })
    }

    /// Look up a member by its number.
    pub fn by_number(&'static self, number: i32) -> Option<EnumValue> {
        self.values
            .iter()
            .position(|(_, n)| *n == number)
            .map(|index| EnumValue {
                descriptor: self,
                index,
            })
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for EnumDescriptor {}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumDescriptor")
            .field("name", &self.name)
            .field("values", &self.values)
            .finish()
    }
}

/// A member of an enum type. Always valid for its descriptor.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    descriptor: &'static EnumDescriptor,
    index: usize,
}

impl EnumValue {
    /// The member at `index` in declaration order; `index` must be in range.
    pub(crate) const fn from_index(descriptor: &'static EnumDescriptor, index: usize) -> Self {
        Self { descriptor, index }
    }

    pub fn descriptor(&self) -> &'static EnumDescriptor {
        self.descriptor
    }

    /// Symbolic name, as written on the JSON wire.
    pub fn name(&self) -> &'static str {
        self.descriptor.values[self.index].0
    }

    pub fn number(&self) -> i32 {
        self.descriptor.values[self.index].1
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.descriptor.name, self.name())
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Bytes(Vec<u8>),
    Enum(EnumValue),
    Message(DynamicMessage),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Enum(_) => ValueKind::Enum,
            Value::Message(_) => ValueKind::Message,
        }
    }

    /// Human readable type, used in validation errors.
    pub fn type_name(&self) -> String {
        match self {
            Value::Enum(value) => format!("enum {}", value.descriptor().name()),
            Value::Message(message) => format!("message {}", message.descriptor().name()),
            other => other.kind().to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<DynamicMessage> for Value {
    fn from(value: DynamicMessage) -> Self {
        Value::Message(value)
    }
}

/// The assigned value of a field: a single value or a list for repeated fields.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Repeated(Vec<Value>),
}

impl FieldValue {
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::Repeated(_) => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            FieldValue::Single(_) => None,
            FieldValue::Repeated(values) => Some(values),
        }
    }

    /// All values, one for a singular field.
    pub fn as_slice(&self) -> &[Value] {
        match self {
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::Repeated(values) => values,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<Value>> for FieldValue {
    fn from(values: Vec<Value>) -> Self {
        FieldValue::Repeated(values)
    }
}

/// An instance of a message type.
///
/// Holds only assigned fields; an unset field and an empty repeated field are
/// the same thing. Nested messages are owned.
#[derive(Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: &'static MessageDescriptor,
    values: BTreeMap<&'static str, FieldValue>,
}

impl DynamicMessage {
    /// An empty instance of `descriptor`.
    pub fn new(descriptor: &'static MessageDescriptor) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &'static MessageDescriptor {
        self.descriptor
    }

    /// Assigned fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldDescriptor, &FieldValue)> {
        self.descriptor
            .fields()
            .iter()
            .filter_map(|field| self.values.get(field.name()).map(|value| (field, value)))
    }

    /// The assigned value of a field, or `None` when unset.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Whether a field has an assigned value.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Assign a field, checking the value against the schema.
    ///
    /// Assigning an empty list to a repeated field clears it.
    pub fn set<V: Into<FieldValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<&mut Self, ValidationError> {
        let field = self.field(name)?;
        let value = value.into();
        match (&value, field.is_repeated()) {
            (FieldValue::Single(single), false) => self.check_value(field, single)?,
            (FieldValue::Repeated(values), true) => {
                for item in values {
                    self.check_value(field, item)?;
                }
            }
            (FieldValue::Single(_), true) => {
                return Err(ValidationError::ExpectedRepeated {
                    message: self.descriptor.name(),
                    field: field.name(),
                });
            }
            (FieldValue::Repeated(_), false) => {
                return Err(ValidationError::UnexpectedRepeated {
                    message: self.descriptor.name(),
                    field: field.name(),
                });
            }
        }

        if matches!(&value, FieldValue::Repeated(values) if values.is_empty()) {
            self.values.remove(field.name());
        } else {
            self.values.insert(field.name(), value);
        }
        Ok(self)
    }

    /// Assign a singular field.
    pub fn set_value<V: Into<Value>>(
        &mut self,
        name: &str,
        value: V,
    ) -> Result<&mut Self, ValidationError> {
        self.set(name, FieldValue::Single(value.into()))
    }

    /// Assign a repeated field.
    pub fn set_repeated<I>(&mut self, name: &str, values: I) -> Result<&mut Self, ValidationError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.set(name, FieldValue::Repeated(values))
    }

    /// Builder form of [`set_value`](Self::set_value).
    pub fn with<V: Into<Value>>(mut self, name: &str, value: V) -> Result<Self, ValidationError> {
        self.set_value(name, value)?;
        Ok(self)
    }

    /// Clear a field back to unset.
    pub fn reset(&mut self, name: &str) -> Result<&mut Self, ValidationError> {
        let field = self.field(name)?;
        self.values.remove(field.name());
        Ok(self)
    }

    /// Whether every required field, transitively, is set.
    pub fn is_initialized(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Like [`is_initialized`](Self::is_initialized) but names the first
    /// missing field.
    pub fn check_initialized(&self) -> Result<(), ValidationError> {
        match self.first_missing() {
            Some(path) => Err(ValidationError::missing(self.descriptor.name(), path)),
            None => Ok(()),
        }
    }

    /// Check that this instance is of the given type.
    pub fn expect_type(&self, descriptor: &'static MessageDescriptor) -> Result<(), ValidationError> {
        if self.descriptor == descriptor {
            Ok(())
        } else {
            Err(ValidationError::WrongMessageType {
                expected: descriptor.name(),
                found: self.descriptor.name(),
            })
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.single(name)? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.single(name)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.single(name)? {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.single(name)? {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.single(name)? {
            Value::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_enum(&self, name: &str) -> Option<EnumValue> {
        match self.single(name)? {
            Value::Enum(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_message(&self, name: &str) -> Option<&DynamicMessage> {
        match self.single(name)? {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Values of a repeated field; empty when unset.
    pub fn get_repeated(&self, name: &str) -> &[Value] {
        self.get(name)
            .and_then(FieldValue::as_repeated)
            .unwrap_or(&[])
    }

    fn single(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FieldValue::as_single)
    }

    fn field(&self, name: &str) -> Result<&'static FieldDescriptor, ValidationError> {
        self.descriptor
            .field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                message: self.descriptor.name(),
                field: name.to_owned(),
            })
    }

    fn check_value(&self, field: &FieldDescriptor, value: &Value) -> Result<(), ValidationError> {
        let matches = match (field.kind(), value) {
            (FieldKind::Integer, Value::Integer(_))
            | (FieldKind::Float, Value::Float(_))
            | (FieldKind::String, Value::String(_))
            | (FieldKind::Boolean, Value::Boolean(_))
            | (FieldKind::Bytes, Value::Bytes(_)) => true,
            (FieldKind::Enum(expected), Value::Enum(value)) => value.descriptor() == expected,
            (FieldKind::Message(expected), Value::Message(message)) => {
                message.descriptor() == expected
            }
            _ => false,
        };

        if matches {
            Ok(())
        } else {
            Err(ValidationError::WrongType {
                message: self.descriptor.name(),
                field: field.name(),
                expected: field.kind().type_name(),
                found: value.type_name(),
            })
        }
    }

    fn first_missing(&self) -> Option<String> {
        for field in self.descriptor.fields() {
            let Some(value) = self.values.get(field.name()) else {
                if field.is_required() {
                    return Some(field.name().to_owned());
                }
                continue;
            };

            for item in value.as_slice() {
                if let Value::Message(nested) = item {
                    if let Some(path) = nested.first_missing() {
                        return Some(format!("{}.{}", field.name(), path));
                    }
                }
            }
        }
        None
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.descriptor.name());
        for (field, value) in self.fields() {
            out.field(field.name(), value);
        }
        out.finish()
    }
}

/// A Rust type backed by a message schema.
///
/// # Example
///
/// ```
/// use protorpc_axum_core::{
///     DynamicMessage, FieldDescriptor, FieldKind, Message, MessageDescriptor, ValidationError,
/// };
///
/// static HELLO_FIELDS: [FieldDescriptor; 1] =
///     [FieldDescriptor::new("my_name", FieldKind::String).required()];
/// static HELLO: MessageDescriptor = MessageDescriptor::new("hello.HelloRequest", &HELLO_FIELDS);
///
/// struct HelloRequest {
///     my_name: String,
/// }
///
/// impl Message for HelloRequest {
///     fn descriptor() -> &'static MessageDescriptor {
///         &HELLO
///     }
///
///     fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError> {
///         DynamicMessage::new(&HELLO).with("my_name", self.my_name.as_str())
///     }
///
///     fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError> {
///         message.expect_type(&HELLO)?;
///         let my_name = message
///             .get_string("my_name")
///             .ok_or_else(|| ValidationError::missing(HELLO.name(), "my_name"))?;
///         Ok(Self { my_name: my_name.to_owned() })
///     }
/// }
/// ```
pub trait Message: Sized + Send + 'static {
    /// Schema of this type.
    fn descriptor() -> &'static MessageDescriptor;

    /// Convert into a schema-checked instance.
    fn to_dynamic(&self) -> Result<DynamicMessage, ValidationError>;

    /// Build from an instance of [`descriptor`](Self::descriptor).
    fn from_dynamic(message: &DynamicMessage) -> Result<Self, ValidationError>;
}
