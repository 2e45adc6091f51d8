use crate::protocol::{
    packet::VersionedPacket, version::ProtocolVersion, DecodeError, Decoder, EncodeError,
    Encoder,
};

/// Asks the server for its status JSON.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StatusRequest;

impl VersionedPacket for StatusRequest {
    fn packet_id(_version: ProtocolVersion) -> i32 {
        0x00
    }

    fn encode_body(&self, _: &mut Encoder, _: ProtocolVersion) -> Result<(), EncodeError> {
        Ok(())
    }

    fn decode_body(_: &mut Decoder, _: ProtocolVersion) -> Result<Self, DecodeError> {
        Ok(Self)
    }
}

/// Status-state ping; the server echoes `payload` back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub payload: i64,
}

impl VersionedPacket for PingRequest {
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
