use crate::protocol::{
    var_int,
    version::{LengthPrefix, ProtocolVersion, BYTE_ARRAY_PREFIX},
};
use uuid::Uuid;

/// An error while encoding a value whose size the wire format can't express.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("byte array of {0} bytes does not fit an unsigned short length prefix")]
    ByteArrayTooLong(usize),
    #[error("value {0} does not fit in a VarShort")]
    VarShortOverflow(u32),
    #[error("length {0} does not fit in a VarInt")]
    LengthOverflow(usize),
    #[error("value {0} does not fit the field width of this protocol version")]
    OutOfRange(i64),
}

/// A raw encoder for a Minecraft bitstream.
#[derive(Debug)]
pub struct Encoder<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder that will append to the provided
    /// byte buffer.
    ///
    /// Any existing contents of `buffer` are left untouched.
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    /// Writes an unsigned byte to the stream.
    pub fn write_u8(&mut self, x: u8) {
        self.buffer.push(x);
    }

    /// Writes a signed byte to the stream.
    pub fn write_i8(&mut self, x: i8) {
        self.write_u8(bytemuck::cast(x));
    }

    /// Writes an unsigned short to the stream.
    pub fn write_u16(&mut self, x: u16) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a signed short to the stream.
    pub fn write_i16(&mut self, x: i16) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes an unsigned int to the stream.
    pub fn write_u32(&mut self, x: u32) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a signed int to the stream.
    pub fn write_i32(&mut self, x: i32) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes an unsigned long to the stream.
    pub fn write_u64(&mut self, x: u64) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a signed long to the stream.
    pub fn write_i64(&mut self, x: i64) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a float to the stream.
    pub fn write_f32(&mut self, x: f32) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a double to the stream.
    pub fn write_f64(&mut self, x: f64) {
        self.buffer.extend(x.to_be_bytes());
    }

    /// Writes a boolean to the stream.
    pub fn write_bool(&mut self, x: bool) {
        self.write_u8(if x { 0x01 } else { 0x00 });
    }

    /// Writes a series of bytes to the stream. Does not write
    /// any sort of length prefix.
    pub fn write_slice(&mut self, slice: &[u8]) {
        self.buffer.extend_from_slice(slice);
    }

    /// Writes a VarInt to the stream. Returns the number of bytes written.
    pub fn write_var_int(&mut self, x: i32) -> usize {
        var_int::encode_var_int(x, self.buffer)
    }

    /// Writes a VarLong to the stream. Returns the number of bytes written.
    pub fn write_var_long(&mut self, x: i64) -> usize {
        var_int::encode_var_long(x, self.buffer)
    }

    /// Writes a Forge VarShort to the stream. Returns the number of bytes written.
    pub fn write_var_short(&mut self, x: u32) -> Result<usize, EncodeError> {
        var_int::encode_var_short(x, self.buffer)
    }

    /// Writes a VarInt length prefix.
    pub fn write_length(&mut self, length: usize) -> Result<usize, EncodeError> {
        let length = i32::try_from(length).map_err(|_| EncodeError::LengthOverflow(length))?;
        Ok(self.write_var_int(length))
    }

    /// Writes a varint-prefixed string to the stream.
    pub fn write_string(&mut self, x: &str) -> Result<(), EncodeError> {
        self.write_length(x.len())?;
        self.buffer.extend_from_slice(x.as_bytes());
        Ok(())
    }

    /// Writes a UUID as two big-endian longs, most significant first.
    pub fn write_uuid(&mut self, x: Uuid) {
        self.buffer.extend_from_slice(x.as_bytes());
    }

    /// Writes a length-prefixed byte array using the prefix `version` expects.
    pub fn write_byte_array(
        &mut self,
        bytes: &[u8],
        version: ProtocolVersion,
    ) -> Result<(), EncodeError> {
        match BYTE_ARRAY_PREFIX.resolve_version(version) {
            LengthPrefix::VarInt => {
                self.write_length(bytes.len())?;
            }
            LengthPrefix::UnsignedShort => {
                let length = u16::try_from(bytes.len())
                    .map_err(|_| EncodeError::ByteArrayTooLong(bytes.len()))?;
                self.write_u16(length);
            }
        }
        self.write_slice(bytes);
        Ok(())
    }
}

/// A type that can be written to an [`Encoder`].
pub trait Encode {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError>;
}

macro_rules! encode_primitive {
    ($($ty:ty => $write:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
                    encoder.$write(*self);
                    Ok(())
                }
            }
        )*
    };
}

encode_primitive! {
    u8 => write_u8,
    i8 => write_i8,
    u16 => write_u16,
    i16 => write_i16,
    u32 => write_u32,
    i32 => write_i32,
    u64 => write_u64,
    i64 => write_i64,
    f32 => write_f32,
    f64 => write_f64,
    bool => write_bool,
    Uuid => write_uuid,
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.write_string(self)
    }
}

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), EncodeError> {
        encoder.write_string(self)
    }
}

impl Encode for () {
    fn encode(&self, _encoder: &mut Encoder) -> Result<(), EncodeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{version::Breakpoint, Decode, Decoder};

    #[test]
    fn primitives_survive_a_trip_through_the_decoder() {
        let uuid = Uuid::from_u64_pair(0xdead_beef, 42);
        let mut buffer = Vec::new();
        let mut encoder = Encoder::new(&mut buffer);
        encoder.write_i16(-2);
        encoder.write_f32(-0.5);
        encoder.write_f64(1e300);
        encoder.write_var_long(i64::MIN);
        encoder.write_bool(true);
        uuid.encode(&mut encoder).unwrap();

        let mut decoder = Decoder::new(&buffer);
        assert_eq!(decoder.read_i16().unwrap(), -2);
        assert_eq!(decoder.read_f32().unwrap(), -0.5);
        assert_eq!(decoder.read_f64().unwrap(), 1e300);
        assert_eq!(decoder.read_var_long().unwrap(), i64::MIN);
        assert!(bool::decode(&mut decoder).unwrap());
        assert_eq!(Uuid::decode(&mut decoder).unwrap(), uuid);
        assert!(decoder.is_finished());
    }

    #[test]
    fn signed_values_use_twos_complement() {
        let mut buffer = Vec::new();
        Encoder::new(&mut buffer).write_i32(-2);
        assert_eq!(buffer, [0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn legacy_byte_array_prefix() {
        let legacy = Breakpoint::V1_7_6.protocol();
        let mut buffer = Vec::new();
        Encoder::new(&mut buffer)
            .write_byte_array(&[1, 2, 3], legacy)
            .unwrap();
        assert_eq!(buffer, [0x00, 0x03, 1, 2, 3]);

        let oversized = vec![0u8; usize::from(u16::MAX) + 1];
        assert!(matches!(
            Encoder::new(&mut Vec::new()).write_byte_array(&oversized, legacy),
            Err(EncodeError::ByteArrayTooLong(_))
        ));

        // the VarInt era has no such limit
        let modern = Breakpoint::V1_8.protocol();
        let mut buffer = Vec::new();
        Encoder::new(&mut buffer)
            .write_byte_array(&oversized, modern)
            .unwrap();
        assert_eq!(&buffer[..3], [0x80, 0x80, 0x04]);
    }

    #[test]
    fn lengths_beyond_a_var_int_are_rejected() {
        let mut buffer = Vec::new();
        let mut encoder = Encoder::new(&mut buffer);
        encoder.write_string("hi").unwrap();
        assert_eq!(encoder.write_length(i32::MAX as usize).unwrap(), 5);
        assert!(matches!(
            encoder.write_length(i32::MAX as usize + 1),
            Err(EncodeError::LengthOverflow(_))
        ));
        // nothing was written for the rejected prefix
        assert_eq!(buffer, [0x02, b'h', b'i', 0xff, 0xff, 0xff, 0xff, 0x07]);
    }
}
