use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::event::ObjectEvent;
use crate::messages::{AuthResult, BootstrapData};
use crate::schema::ObjectSnapshot;
use crate::types::{MessageId, Oid, NO_MESSAGE_ID};

/// A server to client message. `responding_to` echoes the id of the
/// upstream request this answers, or [`NO_MESSAGE_ID`] for unsolicited
/// traffic such as event notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Downstream {
    pub responding_to: MessageId,
    pub body: DownstreamBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownstreamBody {
    AuthResponse(AuthResult),
    Bootstrap(BootstrapData),
    /// One committed batch of events, delivered in commit order. A
    /// multi-event batch is a transaction and must be applied whole.
    EventNotification(Vec<ObjectEvent>),
    ObjectResponse(ObjectSnapshot),
    FailureResponse {
        oid: Oid,
        reason: String,
    },
    UnsubscribeResponse {
        oid: Oid,
    },
    Pong {
        ping_stamp: u64,
        process_delay_millis: u64,
    },
}

const DOWN_AUTH_RESPONSE: u8 = 0;
const DOWN_BOOTSTRAP: u8 = 1;
const DOWN_EVENT_NOTIFICATION: u8 = 2;
const DOWN_OBJECT_RESPONSE: u8 = 3;
const DOWN_FAILURE_RESPONSE: u8 = 4;
const DOWN_UNSUBSCRIBE_RESPONSE: u8 = 5;
const DOWN_PONG: u8 = 6;

impl Downstream {
    pub fn response(responding_to: MessageId, body: DownstreamBody) -> Self {
        Self {
            responding_to,
            body,
        }
    }

    pub fn notification(body: DownstreamBody) -> Self {
        Self {
            responding_to: NO_MESSAGE_ID,
            body,
        }
    }

    pub fn encode(&self) -> Box<[u8]> {
        let mut writer = ByteWriter::new();
        self.ser(&mut writer);
        writer.finish()
    }

    pub fn decode(packet: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(packet);
        let message = Self::de(&mut reader)?;
        reader.expect_end()?;
        Ok(message)
    }
}

impl Wire for Downstream {
    fn ser(&self, writer: &mut ByteWriter) {
        self.responding_to.ser(writer);
        match &self.body {
            DownstreamBody::AuthResponse(result) => {
                writer.write_u8(DOWN_AUTH_RESPONSE);
                result.ser(writer);
            }
            DownstreamBody::Bootstrap(data) => {
                writer.write_u8(DOWN_BOOTSTRAP);
                data.ser(writer);
            }
            DownstreamBody::EventNotification(events) => {
                writer.write_u8(DOWN_EVENT_NOTIFICATION);
                events.ser(writer);
            }
            DownstreamBody::ObjectResponse(snapshot) => {
                writer.write_u8(DOWN_OBJECT_RESPONSE);
                snapshot.ser(writer);
            }
            DownstreamBody::FailureResponse { oid, reason } => {
                writer.write_u8(DOWN_FAILURE_RESPONSE);
                oid.ser(writer);
                reason.ser(writer);
            }
            DownstreamBody::UnsubscribeResponse { oid } => {
                writer.write_u8(DOWN_UNSUBSCRIBE_RESPONSE);
                oid.ser(writer);
            }
            DownstreamBody::Pong {
                ping_stamp,
                process_delay_millis,
            } => {
                writer.write_u8(DOWN_PONG);
                ping_stamp.ser(writer);
                process_delay_millis.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        let responding_to = MessageId::de(reader)?;
        let body = match reader.read_u8()? {
            DOWN_AUTH_RESPONSE => DownstreamBody::AuthResponse(AuthResult::de(reader)?),
            DOWN_BOOTSTRAP => DownstreamBody::Bootstrap(BootstrapData::de(reader)?),
            DOWN_EVENT_NOTIFICATION => DownstreamBody::EventNotification(Vec::de(reader)?),
            DOWN_OBJECT_RESPONSE => DownstreamBody::ObjectResponse(ObjectSnapshot::de(reader)?),
            DOWN_FAILURE_RESPONSE => DownstreamBody::FailureResponse {
                oid: Oid::de(reader)?,
                reason: String::de(reader)?,
            },
            DOWN_UNSUBSCRIBE_RESPONSE => DownstreamBody::UnsubscribeResponse {
                oid: Oid::de(reader)?,
            },
            DOWN_PONG => DownstreamBody::Pong {
                ping_stamp: u64::de(reader)?,
                process_delay_millis: u64::de(reader)?,
            },
            code => return Err(CodecError::UnknownTypeCode { code }),
        };
        Ok(Self {
            responding_to,
            body,
        })
    }
}
