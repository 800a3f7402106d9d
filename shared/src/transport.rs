use crate::constants::DEFAULT_CHANNEL;

/// Message transport parameters: whether delivery is guaranteed, whether
/// arrival order is guaranteed, and (for ordered transport) which channel
/// defines the independent ordered stream.
///
/// Tags are plain values: two tags with the same parameters compare
/// equal and hash identically, so they can be used interchangeably
/// anywhere (maps, dedup, assertions) without an interning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transport {
    reliable: bool,
    ordered: bool,
    channel: u8,
}

impl Transport {
    /// The unreliable/unordered mode of transport.
    pub const UNRELIABLE_UNORDERED: Transport = Transport {
        reliable: false,
        ordered: false,
        channel: DEFAULT_CHANNEL,
    };

    /// The unreliable/ordered mode on the default channel.
    pub const UNRELIABLE_ORDERED: Transport = Transport {
        reliable: false,
        ordered: true,
        channel: DEFAULT_CHANNEL,
    };

    /// The reliable/unordered mode.
    pub const RELIABLE_UNORDERED: Transport = Transport {
        reliable: true,
        ordered: false,
        channel: DEFAULT_CHANNEL,
    };

    /// The reliable/ordered mode on the default channel.
    pub const RELIABLE_ORDERED: Transport = Transport {
        reliable: true,
        ordered: true,
        channel: DEFAULT_CHANNEL,
    };

    /// The default mode of transport.
    pub const DEFAULT: Transport = Transport::RELIABLE_ORDERED;

    /// Returns the tag with the specified parameters. Unordered
    /// transport has no independent streams, so the channel is
    /// meaningful (and retained) only for ordered tags.
    pub fn instance(reliable: bool, ordered: bool, channel: u8) -> Self {
        Self {
            reliable,
            ordered,
            channel: if ordered { channel } else { DEFAULT_CHANNEL },
        }
    }

    /// Returns an ordered variant of this tag on the given channel.
    pub fn on_channel(self, channel: u8) -> Self {
        Self::instance(self.reliable, self.ordered, channel)
    }

    /// Whether this transport guarantees that messages will be delivered.
    pub fn is_reliable(&self) -> bool {
        self.reliable
    }

    /// Whether this transport guarantees that messages will be received
    /// in the order in which they were sent, if they are received at all.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Returns a transport that satisfies the requirements of this and
    /// the specified other transport.
    ///
    /// Unreliability and unorderedness are the weaker properties and are
    /// overridden by either side requiring more. If both sides are
    /// ordered on different channels the result falls back to the
    /// default channel: the merged stream stays available at the cost of
    /// per-channel precision.
    pub fn combine(self, other: Transport) -> Transport {
        Self::instance(
            self.reliable || other.reliable,
            self.ordered || other.ordered,
            if self.channel == other.channel {
                self.channel
            } else {
                DEFAULT_CHANNEL
            },
        )
    }
}

impl Default for Transport {
    fn default() -> Self {
        Transport::DEFAULT
    }
}
