use crate::protocol::{
    packet::VersionedPacket, version::ProtocolVersion, DecodeError, Decoder, EncodeError,
    Encoder,
};

/// The server's status, as a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl VersionedPacket for StatusResponse {
    fn packet_id(_version: ProtocolVersion) -> i32 {
        0x00
    }

    fn encode_body(&self, encoder: &mut Encoder, _: ProtocolVersion) -> Result<(), EncodeError> {
        encoder.write_string(&self.json)?;
        Ok(())
    }

    fn decode_body(decoder: &mut Decoder, _: ProtocolVersion) -> Result<Self, DecodeError> {
        Ok(Self {
            json: decoder.read_string()?.to_owned(),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PingResponse {
    pub payload: i64,
}

impl VersionedPacket for PingResponse {
    fn packet_id(_version: ProtocolVersion) -> i32 {
        0x01
    }

    fn encode_body(&self, encoder: &mut Encoder, _: ProtocolVersion) -> Result<(), EncodeError> {
        encoder.write_i64(self.payload);
        Ok(())
    }

    fn decode_body(decoder: &mut Decoder, _: ProtocolVersion) -> Result<Self, DecodeError> {
        Ok(Self {
            payload: decoder.read_i64()?,
        })
    }
}
