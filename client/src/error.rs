use thiserror::Error;

use parlor_shared::CodecError;

/// Errors surfaced to the application driving the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// An inbound packet could not be decoded. Connection-fatal: the
    /// caller should disconnect and reconnect.
    #[error("Undecodable packet: {0}")]
    Codec(#[from] CodecError),

    /// The operation needs a completed handshake
    #[error("Not connected")]
    NotConnected,
}
