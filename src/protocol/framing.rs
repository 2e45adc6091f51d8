//! Length-prefixed framing with optional zlib compression.
//!
//! Frame layout: `VarInt(frame_length) | body`. Without compression the body
//! is `VarInt(packet_id) | payload`. With compression it is
//! `VarInt(data_length) | data`, where `data_length == 0` means `data` is the
//! raw `VarInt(packet_id) | payload` and any other value is the length that
//! `data` inflates to.

use crate::{
    protocol::{
        compression::{Compression, Zlib},
        packet::Packet,
        var_int::{self, var_int_size},
        DecodeError, Decoder, EncodeError, Encoder,
    },
    receive::{ConnectionProbe, ReliableReceiver, Transport},
};
use std::{
    io::{self, Write},
    num::NonZeroUsize,
};

/// Largest frame length the vanilla server accepts (a three-byte VarInt).
pub const MAX_FRAME_LENGTH: usize = (1 << 21) - 1;

/// Limit on the inflated size of a compressed frame, to avoid decompression
/// bombs.
const MAX_DATA_LENGTH: usize = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("invalid frame length {0}")]
    InvalidLength(i32),
    #[error("frame length {length} exceeds the limit of {max} bytes")]
    FrameTooLarge { length: usize, max: usize },
    #[error("failed to decompress frame")]
    Decompression(#[source] io::Error),
    #[error("failed to compress frame")]
    Compression(#[source] io::Error),
}

/// Threshold in bytes where a packet will be compressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompressionThreshold(NonZeroUsize);

impl CompressionThreshold {
    pub fn new(threshold: NonZeroUsize) -> Self {
        Self(threshold)
    }

    /// Interprets a threshold as sent by the server: zero or negative
    /// disables compression.
    pub fn from_raw(threshold: i32) -> Option<Self> {
        usize::try_from(threshold)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Codec state for one connection.
pub struct FrameCodec<C = Zlib> {
    /// Buffered incoming bytes.
    read_buffer: Vec<u8>,
    compression: C,
    threshold: Option<CompressionThreshold>,
    max_frame_length: usize,
}

impl FrameCodec<Zlib> {
    pub fn new() -> Self {
        Self::with_compression(Zlib::default())
    }
}

impl Default for FrameCodec<Zlib> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Compression> FrameCodec<C> {
    pub fn with_compression(compression: C) -> Self {
        Self {
            read_buffer: Vec::new(),
            compression,
            threshold: None,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }

    /// Enables or disables compression. Applies to every frame encoded or
    /// decoded afterwards.
    pub fn set_compression(&mut self, threshold: Option<CompressionThreshold>) {
        match threshold {
            Some(threshold) => tracing::debug!("Enabled compression at {} bytes", threshold.get()),
            None => tracing::debug!("Disabled compression"),
        }
        self.threshold = threshold;
    }

    pub fn compression_threshold(&self) -> Option<CompressionThreshold> {
        self.threshold
    }

    pub fn set_max_frame_length(&mut self, max_frame_length: usize) {
        self.max_frame_length = max_frame_length;
    }

    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }

    /// Encodes a packet to a stream of bytes in the protocol format.
    pub fn encode_packet(&self, packet: &Packet) -> Result<Vec<u8>, FrameError> {
        let mut body = Vec::with_capacity(packet.body_len());
        packet.write_body(&mut body);

        let mut frame = Vec::new();
        let mut encoder = Encoder::new(&mut frame);
        match self.threshold {
            Some(threshold) => {
                let (data_length, data) = if body.len() >= threshold.get() {
                    let compressed = self
                        .compression
                        .compress(&body)
                        .map_err(FrameError::Compression)?;
                    (body.len(), compressed)
                } else {
                    // send uncompressed
                    (0, body)
                };
                let data_length = i32::try_from(data_length)
                    .map_err(|_| EncodeError::LengthOverflow(data_length))?;
                self.check_outgoing(var_int_size(data_length) + data.len())?;
                encoder.write_length(var_int_size(data_length) + data.len())?;
                encoder.write_var_int(data_length);
                encoder.write_slice(&data);
            }
            None => {
                self.check_outgoing(body.len())?;
                encoder.write_length(body.len())?;
                encoder.write_slice(&body);
            }
        }
        Ok(frame)
    }

    /// Encodes `packet` and writes the frame to `writer`.
    pub fn write_packet<W>(&self, writer: &mut W, packet: &Packet) -> Result<(), FrameError>
    where
        W: Write + ?Sized,
    {
        let frame = self.encode_packet(packet)?;
        writer.write_all(&frame)?;
        tracing::trace!("Sent packet 0x{:02X} in a {}-byte frame", packet.id(), frame.len());
        Ok(())
    }

    /// Reads one frame from a blocking transport.
    ///
    /// The length prefix is read a byte at a time so nothing past the frame
    /// is consumed from the transport.
    pub fn read_packet<P, T>(
        &self,
        receiver: &ReliableReceiver<P>,
        transport: &mut T,
    ) -> Result<Packet, FrameError>
    where
        P: ConnectionProbe,
        T: Transport + ?Sized,
    {
        let (length, _) = var_int::decode_var_int_with(|| {
            receiver
                .receive_byte(&mut *transport)
                .map_err(FrameError::from)
        })?;
        let length = self.check_length(length)?;
        let body = receiver.receive_vec(transport, length)?;
        let packet = self.decode_frame(&body)?;
        tracing::trace!("Received packet 0x{:02X} in a {length}-byte frame", packet.id());
        Ok(packet)
    }

    /// Gives data to the internal read buffer.
    ///
    /// Call `decode_packet` to get a packet.
    pub fn give_data(&mut self, data: &[u8]) {
        self.read_buffer.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet decoded.
    pub fn buffered(&self) -> usize {
        self.read_buffer.len()
    }

    /// Attempts to decode a packet.
    /// This should be called in a loop after any call to `give_data`
    /// until this function returns `None`.
    ///
    /// * If not enough data is available, returns `Ok(None)`.
    /// * If a packet was read, returns `Ok(Some(packet))`. More packets may be available.
    /// * If an error occurs, returns `Err(e)`, invalidating the stream.
    pub fn decode_packet(&mut self) -> Result<Option<Packet>, FrameError> {
        let mut decoder = Decoder::new(&self.read_buffer);
        let length = match decoder.read_var_int() {
            Ok(length) => length,
            Err(DecodeError::EndOfStream { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let length = self.check_length(length)?;
        let frame = match decoder.consume_slice(length) {
            Ok(x) => x,
            Err(DecodeError::EndOfStream { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let total_bytes = decoder.position();

        let packet = self.decode_frame(frame)?;
        self.read_buffer.drain(..total_bytes);
        Ok(Some(packet))
    }

    /// Decodes a frame body, without its length prefix.
    pub fn decode_frame(&self, frame: &[u8]) -> Result<Packet, FrameError> {
        if self.threshold.is_none() {
            return Ok(Packet::from_body(frame)?);
        }

        let mut decoder = Decoder::new(frame);
        let data_length = decoder.read_length()?;
        if data_length == 0 {
            return Ok(Packet::from_body(decoder.buffer())?);
        }
        if data_length > MAX_DATA_LENGTH {
            return Err(FrameError::FrameTooLarge {
                length: data_length,
                max: MAX_DATA_LENGTH,
            });
        }
        let data = self
            .compression
            .decompress(decoder.buffer(), data_length)
            .map_err(FrameError::Decompression)?;
        Ok(Packet::from_body(&data)?)
    }

    fn check_length(&self, length: i32) -> Result<usize, FrameError> {
        let length = usize::try_from(length).map_err(|_| FrameError::InvalidLength(length))?;
        if length > self.max_frame_length {
            return Err(FrameError::FrameTooLarge {
                length,
                max: self.max_frame_length,
            });
        }
        Ok(length)
    }

    fn check_outgoing(&self, length: usize) -> Result<(), FrameError> {
        if length > self.max_frame_length {
            return Err(FrameError::FrameTooLarge {
                length,
                max: self.max_frame_length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed(threshold: i32) -> FrameCodec {
        let mut codec = FrameCodec::new();
        codec.set_compression(CompressionThreshold::from_raw(threshold));
        codec
    }

    fn decode_all(codec: &mut FrameCodec, frame: &[u8]) -> Packet {
        codec.give_data(frame);
        let packet = codec.decode_packet().unwrap().unwrap();
        assert_eq!(codec.buffered(), 0);
        packet
    }

    #[test]
    fn uncompressed_frame() {
        let mut codec = compressed(0);
        assert_eq!(codec.compression_threshold(), None);

        let packet = Packet::with_payload(0x05, (0..10).collect());
        let frame = codec.encode_packet(&packet).unwrap();
        assert_eq!(frame[..2], [11, 0x05]);
        assert_eq!(frame.len(), 12);
        assert_eq!(decode_all(&mut codec, &frame), packet);
    }

    #[test]
    fn compressed_frame() {
        let mut codec = compressed(5);
        let packet = Packet::with_payload(0x21, vec![0xab; 50]);
        let frame = codec.encode_packet(&packet).unwrap();

        let mut decoder = Decoder::new(&frame);
        let length = decoder.read_length().unwrap();
        assert_eq!(length, decoder.remaining());
        // the data length is the full body, ID included
        assert_eq!(decoder.read_length().unwrap(), 51);

        assert_eq!(decode_all(&mut codec, &frame), packet);
    }

    #[test]
    fn below_threshold_passes_through() {
        let mut codec = compressed(64);
        let packet = Packet::with_payload(0x01, vec![1, 2, 3]);
        let frame = codec.encode_packet(&packet).unwrap();
        assert_eq!(frame, [5, 0, 0x01, 1, 2, 3]);
        assert_eq!(decode_all(&mut codec, &frame), packet);
    }

    #[test]
    fn partial_frames_wait_for_more_data() {
        let mut codec = compressed(-1);
        let first = Packet::with_payload(0x00, b"first".to_vec());
        let second = Packet::with_payload(0x7f, b"second".to_vec());
        let mut stream = codec.encode_packet(&first).unwrap();
        stream.extend(codec.encode_packet(&second).unwrap());

        codec.give_data(&stream[..3]);
        assert_eq!(codec.decode_packet().unwrap(), None);
        codec.give_data(&stream[3..]);
        assert_eq!(codec.decode_packet().unwrap(), Some(first));
        assert_eq!(codec.decode_packet().unwrap(), Some(second));
        assert_eq!(codec.decode_packet().unwrap(), None);
    }

    #[test]
    fn corrupt_compressed_data_is_fatal() {
        let mut codec = compressed(1);
        // data length 10, followed by bytes that are not zlib
        codec.give_data(&[4, 10, 0xde, 0xad, 0xbe]);
        assert!(matches!(
            codec.decode_packet(),
            Err(FrameError::Decompression(_))
        ));

        // inflates to fewer bytes than announced
        let deflated = Zlib::default().compress(&[0x01, 0x02]).unwrap();
        let mut frame = vec![deflated.len() as u8 + 1, 3];
        frame.extend(deflated);
        let mut codec = compressed(1);
        codec.give_data(&frame);
        assert!(matches!(
            codec.decode_packet(),
            Err(FrameError::Decompression(_))
        ));
    }

    #[test]
    fn frame_length_limits() {
        let mut codec = FrameCodec::new();
        let mut negative = Vec::new();
        Encoder::new(&mut negative).write_var_int(-5);
        codec.give_data(&negative);
        assert!(matches!(
            codec.decode_packet(),
            Err(FrameError::InvalidLength(-5))
        ));

        let mut codec = FrameCodec::new();
        codec.set_max_frame_length(8);
        codec.give_data(&[9]);
        assert!(matches!(
            codec.decode_packet(),
            Err(FrameError::FrameTooLarge { length: 9, max: 8 })
        ));
        assert!(matches!(
            codec.encode_packet(&Packet::with_payload(0, vec![0; 8])),
            Err(FrameError::FrameTooLarge { .. })
        ));

        let mut codec = FrameCodec::new();
        codec.give_data(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(matches!(
            codec.decode_packet(),
            Err(FrameError::Decode(DecodeError::VarIntTooLong))
        ));
    }

    #[test]
    fn threshold_from_raw() {
        assert_eq!(CompressionThreshold::from_raw(-1), None);
        assert_eq!(CompressionThreshold::from_raw(0), None);
        assert_eq!(CompressionThreshold::from_raw(256).map(CompressionThreshold::get), Some(256));
    }
}
