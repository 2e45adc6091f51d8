pub mod compression;
mod decoder;
mod encoder;
pub mod framing;
pub mod packet;
pub mod var_int;
pub mod version;

pub use decoder::{Decode, DecodeError, Decoder};
pub use encoder::{Encode, EncodeError, Encoder};
pub use framing::{CompressionThreshold, FrameCodec, FrameError};
pub use packet::{Packet, VersionedPacket};
pub use version::{Breakpoint, ProtocolVersion, VersionError, VersionTable};
