use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::event::ObjectEvent;
use crate::messages::Credentials;
use crate::types::{MessageId, Oid};

/// A client to server message: a correlation id the server echoes in
/// its response, plus the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Upstream {
    pub message_id: MessageId,
    pub body: UpstreamBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    AuthRequest(Credentials),
    Subscribe { oid: Oid },
    Unsubscribe { oid: Oid },
    ForwardEvent(ObjectEvent),
    Ping { stamp: u64 },
    Logoff,
}

const UP_AUTH_REQUEST: u8 = 0;
const UP_SUBSCRIBE: u8 = 1;
const UP_UNSUBSCRIBE: u8 = 2;
const UP_FORWARD_EVENT: u8 = 3;
const UP_PING: u8 = 4;
const UP_LOGOFF: u8 = 5;

impl Upstream {
    pub fn new(message_id: MessageId, body: UpstreamBody) -> Self {
        Self { message_id, body }
    }

    /// Packs this message into one framed packet.
    pub fn encode(&self) -> Box<[u8]> {
        let mut writer = ByteWriter::new();
        self.ser(&mut writer);
        writer.finish()
    }

    /// Unpacks one framed packet. The packet must contain exactly one
    /// message; trailing bytes are a protocol violation.
    pub fn decode(packet: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(packet);
        let message = Self::de(&mut reader)?;
        reader.expect_end()?;
        Ok(message)
    }
}

impl Wire for Upstream {
    fn ser(&self, writer: &mut ByteWriter) {
        self.message_id.ser(writer);
        match &self.body {
            UpstreamBody::AuthRequest(credentials) => {
                writer.write_u8(UP_AUTH_REQUEST);
                credentials.ser(writer);
            }
            UpstreamBody::Subscribe { oid } => {
                writer.write_u8(UP_SUBSCRIBE);
                oid.ser(writer);
            }
            UpstreamBody::Unsubscribe { oid } => {
                writer.write_u8(UP_UNSUBSCRIBE);
                oid.ser(writer);
            }
            UpstreamBody::ForwardEvent(event) => {
                writer.write_u8(UP_FORWARD_EVENT);
                event.ser(writer);
            }
            UpstreamBody::Ping { stamp } => {
                writer.write_u8(UP_PING);
                stamp.ser(writer);
            }
            UpstreamBody::Logoff => writer.write_u8(UP_LOGOFF),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        let message_id = MessageId::de(reader)?;
        let body = match reader.read_u8()? {
            UP_AUTH_REQUEST => UpstreamBody::AuthRequest(Credentials::de(reader)?),
            UP_SUBSCRIBE => UpstreamBody::Subscribe {
                oid: Oid::de(reader)?,
            },
            UP_UNSUBSCRIBE => UpstreamBody::Unsubscribe {
                oid: Oid::de(reader)?,
            },
            UP_FORWARD_EVENT => UpstreamBody::ForwardEvent(ObjectEvent::de(reader)?),
            UP_PING => UpstreamBody::Ping {
                stamp: u64::de(reader)?,
            },
            UP_LOGOFF => UpstreamBody::Logoff,
            code => return Err(CodecError::UnknownTypeCode { code }),
        };
        Ok(Self { message_id, body })
    }
}
