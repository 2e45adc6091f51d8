use crate::protocol::{
    packet::VersionedPacket, version::ProtocolVersion, DecodeError, Decoder, EncodeError,
    Encoder,
};
use anyhow::anyhow;

/// First packet of every connection, selecting the protocol version and the
/// state to continue in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: ProtocolVersion,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NextState {
    Status,
    Login,
}

impl NextState {
    fn id(self) -> i32 {
        match self {
            Self::Status => 1,
            Self::Login => 2,
        }
    }
}

impl VersionedPacket for Handshake {
    fn packet_id(_version: ProtocolVersion) -> i32 {
        0x00
    }

    fn encode_body(
        &self,
        encoder: &mut Encoder,
        _version: ProtocolVersion,
    ) -> Result<(), EncodeError> {
        encoder.write_var_int(self.protocol_version.get());
        encoder.write_string(&self.server_address)?;
        encoder.write_u16(self.server_port);
        encoder.write_var_int(self.next_state.id());
        Ok(())
    }

    fn decode_body(decoder: &mut Decoder, _version: ProtocolVersion) -> Result<Self, DecodeError> {
        let protocol_version = ProtocolVersion::new(decoder.read_var_int()?)?;
        let server_address = decoder.read_string()?.to_owned();
        let server_port = decoder.read_u16()?;
        let next_state = match decoder.read_var_int()? {
            1 => NextState::Status,
            2 => NextState::Login,
            other => return Err(anyhow!("invalid next state '{other}'").into()),
        };
        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}
