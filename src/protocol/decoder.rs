use crate::protocol::{
    var_int,
    version::{LengthPrefix, ProtocolVersion, VersionError, BYTE_ARRAY_PREFIX},
};
use std::{num::TryFromIntError, str::Utf8Error};
use uuid::Uuid;

/// An error while decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("need {needed} bytes but only {remaining} remain")]
    EndOfStream { needed: usize, remaining: usize },
    #[error("varint / varlong is too long")]
    VarIntTooLong,
    #[error("string exceeds max allowed length")]
    StringTooLong,
    #[error("negative length prefix {0}")]
    NegativeLength(i32),
    #[error("invalid discriminator {found} - expected {expected}")]
    InvalidDiscriminator { expected: u8, found: u8 },
    #[error("{0} unread bytes left after decoding")]
    TrailingBytes(usize),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    IntConversion(#[from] TryFromIntError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// 32767 characters at three bytes each, the byte cap vanilla servers apply.
const MAX_STRING_LENGTH: usize = i16::MAX as usize * 3;

/// A raw decoder for a Minecraft bitstream.
///
/// Reads advance the cursor (consume mode). To look ahead without moving,
/// wrap the read in [`Decoder::peek`].
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    origin: &'a [u8],
    buffer: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder from the buffer it will read from.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            origin: buffer,
            buffer,
        }
    }

    /// Creates a decoder positioned `offset` bytes into `buffer`.
    pub fn at(buffer: &'a [u8], offset: usize) -> Result<Self> {
        let mut decoder = Self::new(buffer);
        decoder.consume_slice(offset)?;
        Ok(decoder)
    }

    /// Creates a new decoder at the same position.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Gets the remaining buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Number of bytes consumed since the start of the underlying buffer.
    pub fn position(&self) -> usize {
        self.origin.len() - self.buffer.len()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    /// Returns if there is no data left in the buffer.
    pub fn is_finished(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Runs `read` against a copy of this decoder, leaving `self` untouched.
    ///
    /// Returns the value and the position the read would have advanced to.
    pub fn peek<T>(&self, read: impl FnOnce(&mut Decoder<'a>) -> Result<T>) -> Result<(T, usize)> {
        let mut lookahead = self.duplicate();
        let value = read(&mut lookahead)?;
        Ok((value, lookahead.position()))
    }

    /// Runs `read` and keeps its progress only if it succeeds.
    ///
    /// On error the cursor stays where it was before the call.
    pub fn read_atomic<T>(
        &mut self,
        read: impl FnOnce(&mut Decoder<'a>) -> Result<T>,
    ) -> Result<T> {
        let mut attempt = self.duplicate();
        let value = read(&mut attempt)?;
        *self = attempt;
        Ok(value)
    }

    /// Consumes `n` bytes from the buffer, returning them as a slice.
    pub fn consume_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n <= self.buffer.len() {
            let (data, buffer) = self.buffer.split_at(n);
            self.buffer = buffer;
            Ok(data)
        } else {
            Err(DecodeError::EndOfStream {
                needed: n,
                remaining: self.buffer.len(),
            })
        }
    }

    /// Consumes everything left in the buffer.
    pub fn consume_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buffer)
    }

    /// Consumes `N` bytes into an array.
    pub fn consume<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.consume_slice(N)?);
        Ok(array)
    }

    /// Reads an unsigned byte from the stream.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.consume::<1>().map(|[x]| x)
    }

    /// Reads a signed byte from the stream.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.consume().map(i8::from_be_bytes)
    }

    /// Reads an unsigned short from the stream.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.consume().map(u16::from_be_bytes)
    }

    /// Reads a signed short from the stream.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.consume().map(i16::from_be_bytes)
    }

    /// Reads an unsigned int from the stream.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.consume().map(u32::from_be_bytes)
    }

    /// Reads a signed int from the stream.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.consume().map(i32::from_be_bytes)
    }

    /// Reads an unsigned long from the stream.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.consume().map(u64::from_be_bytes)
    }

    /// Reads a signed long from the stream.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.consume().map(i64::from_be_bytes)
    }

    /// Reads a float from the stream.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.consume().map(f32::from_be_bytes)
    }

    /// Reads a double from the stream.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.consume().map(f64::from_be_bytes)
    }

    /// Reads a boolean from the stream.
    ///
    /// Only `0x01` is true. Every other byte reads as false; some servers
    /// send values other than `0x00` and vanilla accepts them.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|x| x == 0x01)
    }

    /// Reads a VarInt from the stream.
    pub fn read_var_int(&mut self) -> Result<i32> {
        self.read_var_int_with_size().map(|(x, _)| x)
    }

    /// Reads a VarInt from the stream, additionally
    /// returning the number of bytes read.
    pub fn read_var_int_with_size(&mut self) -> Result<(i32, usize)> {
        let (value, size) = var_int::decode_var_int(self.buffer, 0)?;
        self.buffer = &self.buffer[size..];
        Ok((value, size))
    }

    /// Reads a VarLong from the stream.
    pub fn read_var_long(&mut self) -> Result<i64> {
        let (value, size) = var_int::decode_var_long(self.buffer, 0)?;
        self.buffer = &self.buffer[size..];
        Ok(value)
    }

    /// Reads a Forge VarShort from the stream.
    pub fn read_var_short(&mut self) -> Result<u32> {
        let (value, size) = var_int::decode_var_short(self.buffer, 0)?;
        self.buffer = &self.buffer[size..];
        Ok(value)
    }

    /// Reads a VarInt length prefix, rejecting negative values.
    pub fn read_length(&mut self) -> Result<usize> {
        let length = self.read_var_int()?;
        usize::try_from(length).map_err(|_| DecodeError::NegativeLength(length))
    }

    /// Reads a string from the stream.
    ///
    /// Nothing is consumed if the string is malformed or truncated.
    pub fn read_string(&mut self) -> Result<&'a str> {
        self.read_atomic(|decoder| {
            let length = decoder.read_length()?;

            if length > MAX_STRING_LENGTH {
                return Err(DecodeError::StringTooLong);
            }

            Ok(std::str::from_utf8(decoder.consume_slice(length)?)?)
        })
    }

    /// Reads a UUID as two big-endian longs, most significant first.
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        self.consume::<16>().map(Uuid::from_bytes)
    }

    /// Reads a length-prefixed byte array.
    ///
    /// The prefix is a VarInt from 14w21a on and a big-endian unsigned short
    /// before that.
    pub fn read_byte_array(&mut self, version: ProtocolVersion) -> Result<&'a [u8]> {
        self.read_atomic(|decoder| {
            let length = match BYTE_ARRAY_PREFIX.resolve_version(version) {
                LengthPrefix::VarInt => decoder.read_length()?,
                LengthPrefix::UnsignedShort => usize::from(decoder.read_u16()?),
            };
            decoder.consume_slice(length)
        })
    }
}

/// A type that can be read from a [`Decoder`].
pub trait Decode: Sized {
    fn decode(decoder: &mut Decoder) -> Result<Self>;
}

macro_rules! decode_primitive {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &mut Decoder) -> Result<Self> {
                    decoder.$read()
                }
            }
        )*
    };
}

decode_primitive! {
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
    bool => read_bool,
    Uuid => read_uuid,
}

impl Decode for String {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_string().map(str::to_owned)
    }
}

impl Decode for () {
    fn decode(_decoder: &mut Decoder) -> Result<Self> {
        Ok(())
    }
}
