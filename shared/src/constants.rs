use std::time::Duration;

/// How long a connection's sending side may stay silent before the client
/// owes the server a ping.
pub const PING_INTERVAL: Duration = Duration::from_secs(60);

/// The channel that ordered transports share by default, and that
/// `Transport::combine` falls back to when merging two ordered tags on
/// different channels.
pub const DEFAULT_CHANNEL: u8 = 0;

/// Response method id used when a provider rejects a request; the single
/// result argument is the failure reason string.
pub const REQUEST_FAILED_ID: crate::MethodId = 0;

/// Response method id used when a provider completes a request; the
/// result arguments are the (possibly empty) result vector.
pub const REQUEST_PROCESSED_ID: crate::MethodId = 1;
