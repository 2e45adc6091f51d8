//! Variable-length integer encodings.
//!
//! VarInt and VarLong store 7 bits per byte, least significant group first,
//! with the high bit of each byte set when another byte follows. VarShort is
//! the Forge hybrid format: a big-endian `u16` whose top bit flags one extra
//! byte carrying bits 15..23.

use crate::protocol::{DecodeError, EncodeError};

/// Maximum encoded length of a VarInt.
pub const MAX_VAR_INT_LENGTH: usize = 5;
/// Maximum encoded length of a VarLong.
pub const MAX_VAR_LONG_LENGTH: usize = 10;
/// Largest value representable as a VarShort.
pub const MAX_VAR_SHORT: u32 = 0x7F_FFFF;

const SEGMENT_BITS: u8 = 0b0111_1111;
const CONTINUE_BIT: u8 = 0b1000_0000;

fn encode_unsigned(mut x: u64, buffer: &mut Vec<u8>) -> usize {
    let mut bytes_written = 0;
    loop {
        let mut temp = (x & u64::from(SEGMENT_BITS)) as u8;
        x >>= 7;
        if x != 0 {
            temp |= CONTINUE_BIT;
        }

        buffer.push(temp);
        bytes_written += 1;

        if x == 0 {
            break bytes_written;
        }
    }
}

/// Pulls bytes from `next` until one without the continuation bit is found.
///
/// Fails with [`DecodeError::VarIntTooLong`] as soon as byte `max_length`
/// still carries the continuation bit, so a malformed stream is never read
/// further than the format allows.
fn decode_unsigned<E>(
    max_length: usize,
    mut next: impl FnMut() -> Result<u8, E>,
) -> Result<(u64, usize), E>
where
    E: From<DecodeError>,
{
    let mut result = 0u64;
    let mut num_read = 0;
    loop {
        let read = next()?;
        result |= u64::from(read & SEGMENT_BITS) << (7 * num_read);
        num_read += 1;

        if read & CONTINUE_BIT == 0 {
            break Ok((result, num_read));
        }
        if num_read >= max_length {
            break Err(DecodeError::VarIntTooLong.into());
        }
    }
}

/// Appends the VarInt encoding of `x` to `buffer`, returning the number of
/// bytes written.
pub fn encode_var_int(x: i32, buffer: &mut Vec<u8>) -> usize {
    let x: u32 = bytemuck::cast(x);
    encode_unsigned(u64::from(x), buffer)
}

/// Appends the VarLong encoding of `x` to `buffer`, returning the number of
/// bytes written.
pub fn encode_var_long(x: i64, buffer: &mut Vec<u8>) -> usize {
    encode_unsigned(bytemuck::cast(x), buffer)
}

/// Appends the VarShort encoding of `x` to `buffer`, returning the number of
/// bytes written (2 or 3).
pub fn encode_var_short(x: u32, buffer: &mut Vec<u8>) -> Result<usize, EncodeError> {
    if x > MAX_VAR_SHORT {
        return Err(EncodeError::VarShortOverflow(x));
    }
    let mut low = (x & 0x7FFF) as u16;
    let high = ((x & 0x7F_8000) >> 15) as u8;
    if high != 0 {
        low |= 0x8000;
    }
    buffer.extend(low.to_be_bytes());
    if high != 0 {
        buffer.push(high);
        Ok(3)
    } else {
        Ok(2)
    }
}

/// Number of bytes `x` occupies as a VarInt.
pub fn var_int_size(x: i32) -> usize {
    let x: u32 = bytemuck::cast(x);
    match x {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Number of bytes `x` occupies as a VarLong.
pub fn var_long_size(x: i64) -> usize {
    let x: u64 = bytemuck::cast(x);
    let significant_bits = (u64::BITS - x.leading_zeros()).max(1);
    significant_bits.div_ceil(7) as usize
}

/// Decodes a VarInt from an arbitrary byte source.
///
/// The source is asked for exactly as many bytes as the encoding occupies,
/// which makes this suitable for reading straight off a socket.
pub fn decode_var_int_with<E>(next: impl FnMut() -> Result<u8, E>) -> Result<(i32, usize), E>
where
    E: From<DecodeError>,
{
    decode_unsigned(MAX_VAR_INT_LENGTH, next).map(|(x, size)| (x as u32 as i32, size))
}

/// Decodes a VarLong from an arbitrary byte source.
pub fn decode_var_long_with<E>(next: impl FnMut() -> Result<u8, E>) -> Result<(i64, usize), E>
where
    E: From<DecodeError>,
{
    decode_unsigned(MAX_VAR_LONG_LENGTH, next).map(|(x, size)| (bytemuck::cast(x), size))
}

fn slice_source(bytes: &[u8], offset: usize) -> impl FnMut() -> Result<u8, DecodeError> + '_ {
    let mut position = offset;
    move || {
        let byte = bytes
            .get(position)
            .copied()
            .ok_or(DecodeError::EndOfStream {
                needed: 1,
                remaining: 0,
            })?;
        position += 1;
        Ok(byte)
    }
}

/// Decodes a VarInt starting at `offset`, returning the value and the number
/// of bytes it occupied.
pub fn decode_var_int(bytes: &[u8], offset: usize) -> Result<(i32, usize), DecodeError> {
    decode_var_int_with(slice_source(bytes, offset))
}

/// Decodes a VarLong starting at `offset`, returning the value and the number
/// of bytes it occupied.
pub fn decode_var_long(bytes: &[u8], offset: usize) -> Result<(i64, usize), DecodeError> {
    decode_var_long_with(slice_source(bytes, offset))
}

/// Decodes a VarShort starting at `offset`, returning the value and the
/// number of bytes it occupied.
pub fn decode_var_short(bytes: &[u8], offset: usize) -> Result<(u32, usize), DecodeError> {
    let remaining = bytes.len().saturating_sub(offset);
    if remaining < 2 {
        return Err(DecodeError::EndOfStream {
            needed: 2,
            remaining,
        });
    }
    let low = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
    if low & 0x8000 == 0 {
        return Ok((u32::from(low), 2));
    }
    let high = *bytes.get(offset + 2).ok_or(DecodeError::EndOfStream {
        needed: 3,
        remaining,
    })?;
    Ok(((u32::from(high) << 15) | u32::from(low & 0x7FFF), 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAR_INT_CASES: &[(i32, &[u8])] = &[
        (0, &[0x00]),
        (1, &[0x01]),
        (127, &[0x7f]),
        (128, &[0x80, 0x01]),
        (255, &[0xff, 0x01]),
        (25565, &[0xdd, 0xc7, 0x01]),
        (2147483647, &[0xff, 0xff, 0xff, 0xff, 0x07]),
        (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
        (-2147483648, &[0x80, 0x80, 0x80, 0x80, 0x08]),
    ];

    #[test]
    fn var_int_known_encodings() {
        for &(value, expected) in VAR_INT_CASES {
            let mut buffer = Vec::new();
            let written = encode_var_int(value, &mut buffer);
            assert_eq!(buffer, expected, "encoding {value}");
            assert_eq!(written, expected.len());
            assert_eq!(var_int_size(value), expected.len());
            assert!(written <= MAX_VAR_INT_LENGTH);

            assert_eq!(decode_var_int(&buffer, 0).unwrap(), (value, expected.len()));
        }
    }

    #[test]
    fn var_long_boundaries() {
        for value in [0, 1, 127, 128, i64::from(i32::MAX), -1, i64::MAX, i64::MIN] {
            let mut buffer = Vec::new();
            let written = encode_var_long(value, &mut buffer);
            assert!(written <= MAX_VAR_LONG_LENGTH);
            assert_eq!(var_long_size(value), written);
            assert_eq!(decode_var_long(&buffer, 0).unwrap(), (value, written));
        }

        let mut buffer = Vec::new();
        encode_var_long(-1, &mut buffer);
        assert_eq!(
            buffer,
            [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
    }

    #[test]
    fn decode_at_offset() {
        let bytes = [0xaa, 0xbb, 0xdd, 0xc7, 0x01, 0xcc];
        assert_eq!(decode_var_int(&bytes, 2).unwrap(), (25565, 3));
    }

    #[test]
    fn overlong_var_int_is_rejected() {
        let bytes = [0x80; 6];
        assert!(matches!(
            decode_var_int(&bytes, 0),
            Err(DecodeError::VarIntTooLong)
        ));

        // Five continuation bytes fail before the sixth is even requested.
        let mut requested = 0;
        let result = decode_var_int_with(|| {
            requested += 1;
            Ok::<_, DecodeError>(0xff)
        });
        assert!(matches!(result, Err(DecodeError::VarIntTooLong)));
        assert_eq!(requested, MAX_VAR_INT_LENGTH);
    }

    #[test]
    fn overlong_var_long_is_rejected() {
        let bytes = [0xff; 11];
        assert!(matches!(
            decode_var_long(&bytes, 0),
            Err(DecodeError::VarIntTooLong)
        ));
    }

    #[test]
    fn truncated_var_int_is_end_of_stream() {
        assert!(matches!(
            decode_var_int(&[0x80, 0x80], 0),
            Err(DecodeError::EndOfStream { .. })
        ));
    }

    #[test]
    fn var_short_layout() {
        let mut buffer = Vec::new();
        assert_eq!(encode_var_short(0x1234, &mut buffer).unwrap(), 2);
        assert_eq!(buffer, [0x12, 0x34]);
        assert_eq!(decode_var_short(&buffer, 0).unwrap(), (0x1234, 2));

        let mut buffer = Vec::new();
        assert_eq!(encode_var_short(0x12_3456, &mut buffer).unwrap(), 3);
        // low 15 bits 0x3456 with the flag set, then bits 15.. = 0x24
        assert_eq!(buffer, [0xb4, 0x56, 0x24]);
        assert_eq!(decode_var_short(&buffer, 0).unwrap(), (0x12_3456, 3));

        let mut buffer = Vec::new();
        encode_var_short(MAX_VAR_SHORT, &mut buffer).unwrap();
        assert_eq!(decode_var_short(&buffer, 0).unwrap(), (MAX_VAR_SHORT, 3));

        assert!(matches!(
            encode_var_short(MAX_VAR_SHORT + 1, &mut Vec::new()),
            Err(EncodeError::VarShortOverflow(_))
        ));
        assert!(matches!(
            decode_var_short(&[0x80, 0x00], 0),
            Err(DecodeError::EndOfStream { .. })
        ));
    }
}
