//! The wire message set exchanged between client and server.
//!
//! Every packet is one framed message: an envelope carrying a
//! correlation id and a tagged body. Decoding is strict, a packet must
//! be consumed exactly or it is rejected.

mod downstream;
mod upstream;

pub use downstream::{Downstream, DownstreamBody};
pub use upstream::{Upstream, UpstreamBody};

use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::types::{Oid, ServiceId};
use crate::value::Value;

/// What a client presents to authenticate. Extras let deployments
/// attach tokens or version strings without changing the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub extras: Vec<(String, Value)>,
}

impl Credentials {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            extras: Vec::new(),
        }
    }
}

impl Wire for Credentials {
    fn ser(&self, writer: &mut ByteWriter) {
        self.username.ser(writer);
        self.extras.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(Self {
            username: String::de(reader)?,
            extras: Vec::de(reader)?,
        })
    }
}

/// The verdict an authenticator returns for presented credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Granted,
    Refused { reason: String },
}

const AUTH_GRANTED: u8 = 0;
const AUTH_REFUSED: u8 = 1;

impl Wire for AuthResult {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            AuthResult::Granted => writer.write_u8(AUTH_GRANTED),
            AuthResult::Refused { reason } => {
                writer.write_u8(AUTH_REFUSED);
                reason.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        match reader.read_u8()? {
            AUTH_GRANTED => Ok(AuthResult::Granted),
            AUTH_REFUSED => Ok(AuthResult::Refused {
                reason: String::de(reader)?,
            }),
            tag => Err(CodecError::BadTag { tag }),
        }
    }
}

/// A directory entry for one service a client may invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub service_id: ServiceId,
    pub name: String,
}

impl Wire for ServiceHandle {
    fn ser(&self, writer: &mut ByteWriter) {
        self.service_id.ser(writer);
        self.name.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(Self {
            service_id: ServiceId::de(reader)?,
            name: String::de(reader)?,
        })
    }
}

/// Delivered once after authentication: the client's own object id and
/// the directory of invocable services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapData {
    pub client_oid: Oid,
    pub services: Vec<ServiceHandle>,
}

impl Wire for BootstrapData {
    fn ser(&self, writer: &mut ByteWriter) {
        self.client_oid.ser(writer);
        self.services.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, CodecError> {
        Ok(Self {
            client_oid: Oid::de(reader)?,
            services: Vec::de(reader)?,
        })
    }
}
