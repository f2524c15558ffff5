//! Byte transports carrying the serial link to the controller.
//!
//! The session only needs a blocking, timeout-capable duplex byte channel.
//! Two implementations are provided:
//!
//! - [`ChannelTransport`]: an in-memory pair, with a [`ControllerEnd`] that
//!   plays the controller side (tests, simulation).
//! - [`TcpTransport`]: a controller UART bridged over TCP.

mod channel;
mod tcp;

pub use channel::{ChannelTransport, ControllerEnd};
pub use tcp::TcpTransport;

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Why a read returned without data.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Nothing arrived before the timeout expired.
    #[error("read timed out")]
    Timeout,
    /// The transport was closed, locally or by the peer.
    #[error("transport closed")]
    Closed,
    /// The underlying channel failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Timeout => io::Error::new(io::ErrorKind::TimedOut, "read timed out"),
            ReadError::Closed => io::Error::new(io::ErrorKind::NotConnected, "transport closed"),
            ReadError::Io(e) => e,
        }
    }
}

/// Outcome of [`ByteTransport::read`].
///
/// `Ok(n)` with `n < buf.len()` is a short read: some bytes arrived before
/// the timeout expired or the stream ended.
pub type ReadResult = Result<usize, ReadError>;

/// A blocking, byte-oriented duplex channel to the controller.
///
/// Reads happen on one thread at a time (bring-up, then the reader thread);
/// writes may come from any thread and must be serialized by the
/// implementation.
pub trait ByteTransport: Send + Sync + 'static {
    /// Open the channel. Called at the start of every bring-up.
    fn open(&self) -> io::Result<()>;

    /// Close the channel. A read blocked on another thread must return
    /// [`ReadError::Closed`].
    fn close(&self) -> io::Result<()>;

    /// Read until `buf` is full, the timeout expires, or the channel closes.
    ///
    /// `None` waits forever.
    fn read(&self, buf: &mut [u8], timeout: Option<Duration>) -> ReadResult;

    /// Write all of `data` as one unit.
    fn write(&self, data: &[u8]) -> io::Result<()>;
}
