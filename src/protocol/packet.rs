//! The packet value passed between framing and packet types, and the
//! version-aware packet types built on top of it.
//!
//! Framing only deals in [`Packet`]s: an ID and the raw payload bytes.
//! Interpreting a payload is left to the [`VersionedPacket`] implementations,
//! which know which ID and field layout each protocol era uses.

use crate::protocol::{
    var_int::var_int_size, version::ProtocolVersion, Decode, DecodeError, Decoder, Encode,
    EncodeError, Encoder,
};

pub mod client {
    //! Packets sent by the client.
    pub mod handshake;
    pub mod keep_alive;
    pub mod status;

    pub use handshake::{Handshake, NextState};
    pub use keep_alive::KeepAlive;
    pub use status::{PingRequest, StatusRequest};
}

pub mod server {
    //! Packets sent by the server.
    pub mod status;

    pub use status::{PingResponse, StatusResponse};
}

/// One protocol message: a packet ID and its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    id: i32,
    payload: Vec<u8>,
}

impl Packet {
    /// Creates a packet with an empty payload.
    pub fn new(id: i32) -> Self {
        Self::with_payload(id, Vec::new())
    }

    pub fn with_payload(id: i32, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }

    /// Splits an uncompressed frame body into its leading VarInt ID and the
    /// payload that follows.
    pub fn from_body(body: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(body);
        let id = decoder.read_var_int()?;
        Ok(Self::with_payload(id, decoder.consume_rest().to_vec()))
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Vec<u8> {
        &mut self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// A cursor over the payload.
    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(&self.payload)
    }

    /// An encoder appending to the payload.
    pub fn encoder(&mut self) -> Encoder<'_> {
        Encoder::new(&mut self.payload)
    }

    /// Appends `value` to the payload.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        value.encode(&mut self.encoder())
    }

    /// Decodes a value from the front of the payload and removes the bytes
    /// it occupied. On error the payload is left unchanged.
    pub fn consume<T: Decode>(&mut self) -> Result<T, DecodeError> {
        let mut decoder = Decoder::new(&self.payload);
        let value = T::decode(&mut decoder)?;
        let used = decoder.position();
        self.payload.drain(..used);
        Ok(value)
    }

    /// Length of the uncompressed frame body (ID and payload).
    pub fn body_len(&self) -> usize {
        var_int_size(self.id) + self.payload.len()
    }

    /// Appends the uncompressed frame body (ID and payload) to `buffer`.
    pub fn write_body(&self, buffer: &mut Vec<u8>) {
        let mut encoder = Encoder::new(buffer);
        encoder.write_var_int(self.id);
        encoder.write_slice(&self.payload);
    }
}

/// A packet type whose ID and field layout depend on the protocol version.
///
/// Implementations usually resolve their ID and any era-specific field
/// encodings from [`VersionTable`](crate::protocol::version::VersionTable)s.
pub trait VersionedPacket: Sized {
    fn packet_id(version: ProtocolVersion) -> i32;

    fn encode_body(&self, encoder: &mut Encoder, version: ProtocolVersion)
        -> Result<(), EncodeError>;

    fn decode_body(decoder: &mut Decoder, version: ProtocolVersion) -> Result<Self, DecodeError>;

    fn to_packet(&self, version: ProtocolVersion) -> Result<Packet, EncodeError> {
        let mut packet = Packet::new(Self::packet_id(version));
        self.encode_body(&mut packet.encoder(), version)?;
        Ok(packet)
    }

    /// Interprets `packet` as `Self`.
    ///
    /// Returns `Ok(None)` if the ID belongs to a different packet type in
    /// this version. The payload must be consumed exactly.
    fn from_packet(packet: &Packet, version: ProtocolVersion) -> Result<Option<Self>, DecodeError> {
        if packet.id() != Self::packet_id(version) {
            return Ok(None);
        }
        let mut decoder = packet.decoder();
        let value = Self::decode_body(&mut decoder, version)?;
        if !decoder.is_finished() {
            return Err(DecodeError::TrailingBytes(decoder.remaining()));
        }
        Ok(Some(value))
    }
}
