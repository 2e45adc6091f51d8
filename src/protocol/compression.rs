//! Compression backends for the framing codec.

use flate2::Compression as Level;
use std::io::{self, Read, Write};

/// A compression scheme the framing codec can delegate to.
pub trait Compression {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompresses `data`, which must inflate to exactly `expected_length`
    /// bytes.
    fn decompress(&self, data: &[u8], expected_length: usize) -> io::Result<Vec<u8>>;
}

/// zlib, as used by the vanilla protocol.
#[derive(Copy, Clone, Debug)]
pub struct Zlib {
    level: Level,
}

impl Zlib {
    pub fn new(level: u32) -> Self {
        Self {
            level: Level::new(level),
        }
    }
}

impl Default for Zlib {
    fn default() -> Self {
        Self {
            level: Level::default(),
        }
    }
}

impl Compression for Zlib {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], expected_length: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(expected_length);
        // one byte of slack so an oversized payload is detected without
        // inflating all of it
        flate2::read::ZlibDecoder::new(data)
            .take(expected_length as u64 + 1)
            .read_to_end(&mut buf)?;
        if buf.len() != expected_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "decompressed to {} bytes, expected {expected_length}",
                    buf.len()
                ),
            ));
        }
        Ok(buf)
    }
}
