//! Exact-length reads over a blocking transport.
//!
//! A blocking read on a half-open TCP connection can keep returning nothing
//! forever. [`ReliableReceiver`] counts read attempts and, every
//! `probe_interval` attempts without finishing, asks a [`ConnectionProbe`]
//! whether the OS still considers the connection established. When the probe
//! cannot answer, the socket itself is checked with [`Transport::is_open`].
//! A dead connection is force-closed and reported as
//! [`io::ErrorKind::ConnectionReset`]; a live one has its attempt counter
//! divided by `backoff_divisor` and reading continues.

pub mod proc_net;

use crate::config::ReceiveConfig;
use std::{
    io::{self, Read},
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

/// A readable connection with known endpoints that can be torn down.
pub trait Transport: Read {
    /// The `(local, remote)` endpoint pair.
    fn endpoints(&self) -> io::Result<(SocketAddr, SocketAddr)>;

    /// Closes the connection without lingering on unsent data.
    fn force_close(&mut self) -> io::Result<()>;

    /// Checks the socket without consuming data. A peer that has closed its
    /// side, or a pending socket error, means the connection is not open.
    fn is_open(&self) -> io::Result<bool>;
}

impl Transport for TcpStream {
    fn endpoints(&self) -> io::Result<(SocketAddr, SocketAddr)> {
        Ok((self.local_addr()?, self.peer_addr()?))
    }

    fn force_close(&mut self) -> io::Result<()> {
        socket2::SockRef::from(&*self).set_linger(Some(Duration::ZERO))?;
        match self.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            result => result,
        }
    }

    fn is_open(&self) -> io::Result<bool> {
        if let Some(e) = self.take_error()? {
            tracing::debug!("Socket has a pending error: {e}");
            return Ok(false);
        }

        self.set_nonblocking(true)?;
        let peeked = self.peek(&mut [0u8]);
        self.set_nonblocking(false)?;
        match peeked {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(true),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe => Ok(false),
                _ => Err(e),
            },
        }
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn endpoints(&self) -> io::Result<(SocketAddr, SocketAddr)> {
        (**self).endpoints()
    }

    fn force_close(&mut self) -> io::Result<()> {
        (**self).force_close()
    }

    fn is_open(&self) -> io::Result<bool> {
        (**self).is_open()
    }
}

/// Looks up whether a transport's connection is still in the ESTABLISHED
/// state.
pub trait ConnectionProbe {
    fn is_established<T: Transport + ?Sized>(&self, transport: &T) -> io::Result<bool>;
}

/// A probe that never declares a connection dead.
#[derive(Copy, Clone, Debug, Default)]
pub struct AssumeEstablished;

impl ConnectionProbe for AssumeEstablished {
    fn is_established<T: Transport + ?Sized>(&self, _transport: &T) -> io::Result<bool> {
        Ok(true)
    }
}

/// Asks the socket directly through [`Transport::is_open`]. Works on any
/// platform but only notices a peer that closed or reset the connection.
#[derive(Copy, Clone, Debug, Default)]
pub struct SocketProbe;

impl ConnectionProbe for SocketProbe {
    fn is_established<T: Transport + ?Sized>(&self, transport: &T) -> io::Result<bool> {
        transport.is_open()
    }
}

#[cfg(target_os = "linux")]
pub type DefaultProbe = proc_net::ProcNetProbe;
#[cfg(not(target_os = "linux"))]
pub type DefaultProbe = SocketProbe;

#[derive(Debug, Clone)]
pub struct ReliableReceiver<P = DefaultProbe> {
    probe: P,
    probe_interval: u32,
    backoff_divisor: u32,
}

impl ReliableReceiver<DefaultProbe> {
    pub fn new(config: &ReceiveConfig) -> Self {
        Self::with_probe(DefaultProbe::default(), config)
    }
}

impl Default for ReliableReceiver<DefaultProbe> {
    fn default() -> Self {
        Self::new(&ReceiveConfig::default())
    }
}

impl<P: ConnectionProbe> ReliableReceiver<P> {
    /// Out-of-range settings are clamped: the interval to at least 1, the
    /// divisor to at least 2. Use [`ReceiveConfig::validate`] to reject them
    /// instead.
    pub fn with_probe(probe: P, config: &ReceiveConfig) -> Self {
        Self {
            probe,
            probe_interval: config.probe_interval.max(1),
            backoff_divisor: config.backoff_divisor.max(2),
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_interval(&self) -> u32 {
        self.probe_interval
    }

    pub fn backoff_divisor(&self) -> u32 {
        self.backoff_divisor
    }

    /// Fills `buf` completely from `transport`.
    pub fn receive_exact<T>(&self, transport: &mut T, buf: &mut [u8]) -> io::Result<()>
    where
        T: Transport + ?Sized,
    {
        let mut filled = 0;
        let mut attempts = 0u32;
        while filled < buf.len() {
            if attempts >= self.probe_interval {
                if !self.connection_alive(transport) {
                    tracing::warn!(
                        "Connection stalled after {filled}/{} bytes and is no longer established",
                        buf.len()
                    );
                    if let Err(e) = transport.force_close() {
                        tracing::debug!("Failed to close dead connection: {e}");
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection is no longer established",
                    ));
                }
                attempts /= self.backoff_divisor;
                continue;
            }

            attempts += 1;
            match transport.read(&mut buf[filled..]) {
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Reads exactly `len` bytes into a new buffer.
    pub fn receive_vec<T>(&self, transport: &mut T, len: usize) -> io::Result<Vec<u8>>
    where
        T: Transport + ?Sized,
    {
        let mut buf = vec![0u8; len];
        self.receive_exact(transport, &mut buf)?;
        Ok(buf)
    }

    /// Reads a single byte.
    pub fn receive_byte<T>(&self, transport: &mut T) -> io::Result<u8>
    where
        T: Transport + ?Sized,
    {
        let mut byte = [0u8];
        self.receive_exact(transport, &mut byte)?;
        Ok(byte[0])
    }

    fn connection_alive<T: Transport + ?Sized>(&self, transport: &T) -> bool {
        let e = match self.probe.is_established(transport) {
            Ok(established) => {
                tracing::trace!("Probed connection: established = {established}");
                return established;
            }
            Err(e) => e,
        };
        tracing::warn!("Connection probe failed, checking the socket instead: {e}");
        match transport.is_open() {
            Ok(open) => open,
            Err(e) => {
                tracing::debug!("Socket check failed: {e}");
                false
            }
        }
    }
}
