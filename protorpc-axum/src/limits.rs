//! Message size limits for ProtoRPC requests.
//!
//! Request bodies are buffered before decoding, so their size is bounded.
//! The default limit is 4 MB.

/// Default maximum request body size (4 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// A request body is larger than the configured limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("message size {size} bytes exceeds maximum allowed size of {max} bytes")]
pub struct MessageTooLarge {
    pub size: usize,
    pub max: usize,
}

/// Configuration for message size limits.
///
/// # Example
///
/// ```rust
/// use protorpc_axum::MessageLimits;
///
/// // Use default 4 MB limit
/// let limits = MessageLimits::default();
///
/// // Custom 16 MB limit for large payloads
/// let limits = MessageLimits::new(16 * 1024 * 1024);
///
/// // No limit (not recommended for production)
/// let limits = MessageLimits::unlimited();
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageLimits {
    /// `None` means unlimited.
    max_message_size: Option<usize>,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_message_size: Some(DEFAULT_MAX_MESSAGE_SIZE),
        }
    }
}

impl MessageLimits {
    /// Create new limits with the specified maximum message size in bytes.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size: Some(max_message_size),
        }
    }

    /// Create limits with no maximum.
    ///
    /// Any client can then make the server buffer arbitrarily large bodies.
    /// Only use this in trusted environments.
    pub fn unlimited() -> Self {
        Self {
            max_message_size: None,
        }
    }

    /// Returns the maximum message size, or `None` if unlimited.
    pub fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    /// Check a message size against the configured limit.
    pub fn check_size(&self, size: usize) -> Result<(), MessageTooLarge> {
        match self.max_message_size {
            Some(max) if size > max => Err(MessageTooLarge { size, max }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = MessageLimits::default();
        assert_eq!(limits.max_message_size(), Some(DEFAULT_MAX_MESSAGE_SIZE));
    }

    #[test]
    fn test_unlimited() {
        let limits = MessageLimits::unlimited();
        assert_eq!(limits.max_message_size(), None);
        assert!(limits.check_size(usize::MAX).is_ok());
    }

    #[test]
    fn test_check_size() {
        let limits = MessageLimits::new(1024);
        assert!(limits.check_size(512).is_ok());
        assert!(limits.check_size(1024).is_ok());

        let err = limits.check_size(1025).unwrap_err();
        assert_eq!(err, MessageTooLarge { size: 1025, max: 1024 });
        let err_msg = err.to_string();
        assert!(err_msg.contains("1025"));
        assert!(err_msg.contains("1024"));
    }
}
