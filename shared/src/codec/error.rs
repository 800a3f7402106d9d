use thiserror::Error;

/// Errors raised while encoding or decoding wire frames.
///
/// Any of these on an inbound frame indicates a protocol violation or a
/// corrupted/malicious peer, and is treated as connection-fatal by both
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A read ran past the end of the frame.
    #[error("unexpected end of frame (needed {needed} more bytes, {remaining} remaining)")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A frame decoded cleanly but left bytes unconsumed.
    #[error("{count} trailing bytes after a complete frame")]
    TrailingBytes { count: usize },

    /// A message type code that this endpoint does not know.
    #[error("unknown message type code {code}")]
    UnknownTypeCode { code: u8 },

    /// An enum discriminant or tag byte outside the valid range.
    #[error("invalid tag byte {tag}")]
    BadTag { tag: u8 },

    /// A length-prefixed string that is not valid UTF-8.
    #[error("string payload is not valid utf-8")]
    BadUtf8,
}
