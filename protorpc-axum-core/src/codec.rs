//! Wire codec trait.
//!
//! A [`Codec`] converts messages to and from one wire format and declares the
//! content types it is served under. [`JsonCodec`](crate::JsonCodec) is the
//! built-in implementation; other formats plug in by implementing the trait
//! and registering with [`Protocols`](crate::Protocols).

use bytes::Bytes;
use std::sync::Arc;

use crate::error::CodecError;
use crate::schema::{DynamicMessage, MessageDescriptor};

/// Codec trait for message (de)serialization.
///
/// Implementations must be pure: no shared mutable state, safe to call from
/// many threads at once.
///
/// # Example
///
/// ```ignore
/// use protorpc_axum_core::{Codec, CodecError, DynamicMessage, MessageDescriptor};
/// use bytes::Bytes;
///
/// struct UrlEncodedCodec;
///
/// impl Codec for UrlEncodedCodec {
///     fn default_content_type(&self) -> &'static str {
///         "application/x-www-form-urlencoded"
///     }
///
///     fn encode(&self, message: &DynamicMessage) -> Result<Bytes, CodecError> {
///         // ...
///     }
///
///     fn decode(
///         &self,
///         descriptor: &'static MessageDescriptor,
///         data: &[u8],
///     ) -> Result<DynamicMessage, CodecError> {
///         // ...
///     }
/// }
/// ```
pub trait Codec: Send + Sync + 'static {
    /// Content type written on responses produced by this codec.
    fn default_content_type(&self) -> &'static str;

    /// Further content types accepted on requests.
    fn alternative_content_types(&self) -> &'static [&'static str] {
        &[]
    }

    /// Encode an initialized message.
    fn encode(&self, message: &DynamicMessage) -> Result<Bytes, CodecError>;

    /// Decode a payload into a new instance of `descriptor`.
    fn decode(
        &self,
        descriptor: &'static MessageDescriptor,
        data: &[u8],
    ) -> Result<DynamicMessage, CodecError>;
}

/// A boxed codec for type-erased storage.
#[derive(Clone)]
pub struct BoxedCodec(Arc<dyn Codec>);

impl BoxedCodec {
    /// Create a new boxed codec.
    pub fn new<C: Codec>(codec: C) -> Self {
        BoxedCodec(Arc::new(codec))
    }

    pub fn default_content_type(&self) -> &'static str {
        self.0.default_content_type()
    }

    pub fn alternative_content_types(&self) -> &'static [&'static str] {
        self.0.alternative_content_types()
    }

    pub fn encode(&self, message: &DynamicMessage) -> Result<Bytes, CodecError> {
        self.0.encode(message)
    }

    pub fn decode(
        &self,
        descriptor: &'static MessageDescriptor,
        data: &[u8],
    ) -> Result<DynamicMessage, CodecError> {
        self.0.decode(descriptor, data)
    }
}

impl std::fmt::Debug for BoxedCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BoxedCodec")
            .field(&self.default_content_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonCodec;
    use crate::test_support::INNER;

    #[test]
    fn test_boxed_codec_delegates() {
        let codec = BoxedCodec::new(JsonCodec);
        assert_eq!(codec.default_content_type(), "application/json");
        assert!(codec.alternative_content_types().contains(&"text/json"));

        let message = DynamicMessage::new(&INNER).with("value", "v").unwrap();
        let encoded = codec.encode(&message).unwrap();
        assert_eq!(codec.decode(&INNER, &encoded).unwrap(), message);
    }

    #[test]
    fn test_boxed_codec_debug() {
        let codec = BoxedCodec::new(JsonCodec);
        let debug_str = format!("{:?}", codec);
        assert!(debug_str.contains("BoxedCodec"));
        assert!(debug_str.contains("application/json"));
    }
}
