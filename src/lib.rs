//! Client side of the Minecraft Java Edition wire protocol, across protocol
//! versions.
//!
//! A connection is read like this:
//! TCP socket => [`receive`] fills exact byte counts => [`protocol::framing`]
//! strips the length prefix and inflates compressed frames => a
//! [`protocol::Packet`] (ID and payload) => packet types decode the payload
//! with a [`protocol::Decoder`].
//!
//! # Versions
//! Packet IDs and field layouts changed many times between releases. Packet
//! types describe these changes as [`protocol::VersionTable`]s keyed by the
//! first protocol version of each era, and resolve them against the
//! [`protocol::ProtocolVersion`] negotiated in the handshake.
//!
//! # Blocking I/O
//! Everything here runs on the calling thread with blocking sockets. A read
//! that keeps coming back empty is checked against the OS connection table
//! every so often (see [`receive::ReliableReceiver`]), which is the only
//! bound on how long a read can stall. To cancel a read, close the socket.

pub mod address;
pub mod config;
pub mod equality;
pub mod forge;
pub mod protocol;
pub mod receive;

pub use config::{ClientConfig, ReceiveConfig};
