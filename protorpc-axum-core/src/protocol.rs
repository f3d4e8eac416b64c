//! Protocol registry.
//!
//! A [`Protocols`] table maps content types to codecs. It is built once at
//! startup and handed to each service mapping, which only reads from it.

use std::collections::HashMap;

use crate::codec::{BoxedCodec, Codec};
use crate::error::ProtocolError;
use crate::json::JsonCodec;

/// Name under which [`Protocols::with_defaults`] registers the JSON codec.
pub const JSON_PROTOCOL_NAME: &str = "protojson";

/// One registered protocol.
#[derive(Clone, Debug)]
pub struct ProtocolEntry {
    name: String,
    codec: BoxedCodec,
    default_content_type: String,
    alternative_content_types: Vec<String>,
}

impl ProtocolEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> &BoxedCodec {
        &self.codec
    }

    /// Content type written on responses.
    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub fn alternative_content_types(&self) -> &[String] {
        &self.alternative_content_types
    }

    /// Every content type this protocol is reachable under, default first.
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default_content_type.as_str())
            .chain(self.alternative_content_types.iter().map(String::as_str))
    }
}

/// Content type to codec table.
///
/// # Example
///
/// ```
/// use protorpc_axum_core::{JsonCodec, Protocols};
///
/// let mut protocols = Protocols::new();
/// protocols.register(JsonCodec, "protojson").unwrap();
///
/// let entry = protocols.lookup_by_content_type("application/json").unwrap();
/// assert_eq!(entry.name(), "protojson");
/// assert!(protocols.lookup_by_content_type("application/xml").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Protocols {
    entries: Vec<ProtocolEntry>,
    by_name: HashMap<String, usize>,
    by_content_type: HashMap<String, usize>,
}

impl Protocols {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the JSON codec under [`JSON_PROTOCOL_NAME`].
    pub fn with_defaults() -> Self {
        let mut protocols = Self::new();
        let codec = JsonCodec;
        protocols.insert(ProtocolEntry {
            name: JSON_PROTOCOL_NAME.to_owned(),
            codec: BoxedCodec::new(codec),
            default_content_type: codec.default_content_type().to_owned(),
            alternative_content_types: codec
                .alternative_content_types()
                .iter()
                .map(|ct| (*ct).to_owned())
                .collect(),
        });
        protocols
    }

    /// Register a codec under `name` with the content types it declares.
    pub fn register<C: Codec>(&mut self, codec: C, name: &str) -> Result<(), ProtocolError> {
        let default = codec.default_content_type();
        let alternatives = codec.alternative_content_types();
        self.register_with_content_types(codec, name, default, alternatives)
    }

    /// Register a codec under `name` with explicit content types.
    ///
    /// Fails without modifying the registry if the name or any of the content
    /// types is already taken.
    pub fn register_with_content_types<C: Codec>(
        &mut self,
        codec: C,
        name: &str,
        default_content_type: &str,
        alternative_content_types: &[&str],
    ) -> Result<(), ProtocolError> {
        if self.by_name.contains_key(name) {
            return Err(ProtocolError::DuplicateName(name.to_owned()));
        }

        let mut seen = Vec::with_capacity(alternative_content_types.len() + 1);
        for content_type in std::iter::once(&default_content_type).chain(alternative_content_types)
        {
            let key = content_type.to_ascii_lowercase();
            if self.by_content_type.contains_key(&key) || seen.contains(&key) {
                return Err(ProtocolError::DuplicateContentType((*content_type).to_owned()));
            }
            seen.push(key);
        }

        self.insert(ProtocolEntry {
            name: name.to_owned(),
            codec: BoxedCodec::new(codec),
            default_content_type: default_content_type.to_owned(),
            alternative_content_types: alternative_content_types
                .iter()
                .map(|ct| (*ct).to_owned())
                .collect(),
        });
        Ok(())
    }

    fn insert(&mut self, entry: ProtocolEntry) {
        let index = self.entries.len();
        self.by_name.insert(entry.name.clone(), index);
        for content_type in entry.content_types() {
            self.by_content_type
                .insert(content_type.to_ascii_lowercase(), index);
        }
        self.entries.push(entry);
    }

    /// Find the protocol serving a content type.
    ///
    /// Parameters such as `; charset=utf-8` are ignored and the media type
    /// is compared case-insensitively.
    pub fn lookup_by_content_type(&self, content_type: &str) -> Result<&ProtocolEntry, ProtocolError> {
        self.by_content_type
            .get(&media_type(content_type).to_ascii_lowercase())
            .map(|&index| &self.entries[index])
            .ok_or_else(|| ProtocolError::UnknownContentType(content_type.to_owned()))
    }

    pub fn lookup_by_name(&self, name: &str) -> Result<&ProtocolEntry, ProtocolError> {
        self.by_name
            .get(name)
            .map(|&index| &self.entries[index])
            .ok_or_else(|| ProtocolError::UnknownName(name.to_owned()))
    }

    /// Registered protocol names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ProtocolEntry::name)
    }

    /// Every registered content type in registration order.
    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flat_map(ProtocolEntry::content_types)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The media type of a `Content-Type` value, without parameters.
///
/// ```
/// use protorpc_axum_core::media_type;
///
/// assert_eq!(media_type(" application/json ; charset=utf-8"), "application/json");
/// ```
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(media, _)| media)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::INNER;
    use crate::{CodecError, DynamicMessage, MessageDescriptor};
    use bytes::Bytes;

    /// Writes every message as the literal text `inner`.
    struct PlainCodec;

    impl Codec for PlainCodec {
        fn default_content_type(&self) -> &'static str {
            "text/plain"
        }

        fn encode(&self, _message: &DynamicMessage) -> Result<Bytes, CodecError> {
            Ok(Bytes::from_static(b"inner"))
        }

        fn decode(
            &self,
            descriptor: &'static MessageDescriptor,
            _data: &[u8],
        ) -> Result<DynamicMessage, CodecError> {
            Ok(DynamicMessage::new(descriptor))
        }
    }

    #[test]
    fn test_defaults_register_json() {
        let protocols = Protocols::with_defaults();
        assert_eq!(protocols.names().collect::<Vec<_>>(), [JSON_PROTOCOL_NAME]);

        for content_type in ["application/json", "text/json", "text/x-javascript"] {
            let entry = protocols.lookup_by_content_type(content_type).unwrap();
            assert_eq!(entry.name(), JSON_PROTOCOL_NAME);
            assert_eq!(entry.default_content_type(), "application/json");
        }
        assert_eq!(protocols.content_types().count(), 6);
    }

    #[test]
    fn test_lookup_ignores_parameters_and_case() {
        let protocols = Protocols::with_defaults();
        assert!(
            protocols
                .lookup_by_content_type("Application/JSON; charset=utf-8")
                .is_ok()
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let protocols = Protocols::with_defaults();
        assert_eq!(
            protocols.lookup_by_content_type("application/xml").unwrap_err(),
            ProtocolError::UnknownContentType("application/xml".to_string())
        );
        assert_eq!(
            protocols.lookup_by_name("protobuf").unwrap_err(),
            ProtocolError::UnknownName("protobuf".to_string())
        );
    }

    #[test]
    fn test_register_custom_codec() {
        let mut protocols = Protocols::with_defaults();
        protocols.register(PlainCodec, "plain").unwrap();

        let entry = protocols.lookup_by_name("plain").unwrap();
        assert_eq!(entry.default_content_type(), "text/plain");
        let encoded = entry.codec().encode(&DynamicMessage::new(&INNER)).unwrap();
        assert_eq!(&encoded[..], b"inner");
        assert_eq!(protocols.names().collect::<Vec<_>>(), ["protojson", "plain"]);
    }

    #[test]
    fn test_register_with_content_types() {
        let mut protocols = Protocols::new();
        assert!(protocols.is_empty());
        protocols
            .register_with_content_types(JsonCodec, "json", "application/vnd.rpc+json", &["text/rpc"])
            .unwrap();

        assert!(protocols.lookup_by_content_type("application/json").is_err());
        let entry = protocols.lookup_by_content_type("text/rpc").unwrap();
        assert_eq!(entry.default_content_type(), "application/vnd.rpc+json");
        assert_eq!(entry.alternative_content_types(), ["text/rpc"]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut protocols = Protocols::with_defaults();
        assert_eq!(
            protocols.register(JsonCodec, JSON_PROTOCOL_NAME).unwrap_err(),
            ProtocolError::DuplicateName(JSON_PROTOCOL_NAME.to_string())
        );
        assert_eq!(
            protocols.register(JsonCodec, "other").unwrap_err(),
            ProtocolError::DuplicateContentType("application/json".to_string())
        );
        assert_eq!(
            protocols
                .register_with_content_types(PlainCodec, "plain", "text/plain", &["TEXT/PLAIN"])
                .unwrap_err(),
            ProtocolError::DuplicateContentType("TEXT/PLAIN".to_string())
        );
        // failed registrations leave no trace
        assert_eq!(protocols.names().count(), 1);
        assert!(protocols.lookup_by_content_type("text/plain").is_err());
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("application/json"), "application/json");
        assert_eq!(media_type("text/json;charset=utf-8"), "text/json");
        assert_eq!(media_type("  "), "");
    }
}
