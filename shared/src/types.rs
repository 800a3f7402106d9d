/// Process-unique id of a distributed object. Once allocated, an oid is
/// never reassigned for the lifetime of the process, even after the
/// object is destroyed.
pub type Oid = u32;

/// Correlation id carried by every upstream message and echoed into any
/// downstream response that answers it. Allocated client-side, wrapping
/// over the signed 16-bit range.
pub type MessageId = i16;

/// Sentinel carried by downstream messages that do not correlate to a
/// specific upstream request. Never allocated as a real message id.
pub const NO_MESSAGE_ID: MessageId = -1;

/// Per-connection id of an in-flight invocation request, embedded in the
/// marshalled listener slot of the request's argument vector.
pub type RequestId = u16;

/// Id of a registered invocation service, assigned sequentially at
/// registration time.
pub type ServiceId = u16;

/// Id of a method within an invocation service (or of a response method
/// within a listener).
pub type MethodId = u8;
