//! In-memory transport pair.
//!
//! Bytes written by the host arrive at the [`ControllerEnd`] as one message
//! per write, so a test can count and inspect individual writes. Bytes sent by
//! the controller end are buffered on the host side and handed out in
//! whatever sizes the reader asks for.

use bytes::{Buf, BytesMut};
use crossbeam_channel::{after, never, select, Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::time::{Duration, Instant};

use super::{ByteTransport, ReadError, ReadResult};
use crate::error::Result;
use crate::frame::{encode, Frame};

/// Shutdown signal: dropping the sender wakes every pending read.
type Shutdown = (Sender<()>, Receiver<()>);

/// Host side of an in-memory link.
pub struct ChannelTransport {
    to_controller: Sender<Vec<u8>>,
    from_controller: Receiver<Vec<u8>>,
    /// Bytes received from the controller but not yet read.
    pending: Mutex<BytesMut>,
    /// Present while the transport is open.
    shutdown: Mutex<Option<Shutdown>>,
}

/// Controller side of an in-memory link.
#[derive(Clone)]
pub struct ControllerEnd {
    to_host: Sender<Vec<u8>>,
    from_host: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a connected host/controller pair.
    pub fn pair() -> (ChannelTransport, ControllerEnd) {
        let (host_tx, controller_rx) = crossbeam_channel::unbounded();
        let (controller_tx, host_rx) = crossbeam_channel::unbounded();

        let transport = ChannelTransport {
            to_controller: host_tx,
            from_controller: host_rx,
            pending: Mutex::new(BytesMut::new()),
            shutdown: Mutex::new(None),
        };
        let controller = ControllerEnd {
            to_host: controller_tx,
            from_host: controller_rx,
        };
        (transport, controller)
    }

    fn shutdown_receiver(&self) -> Option<Receiver<()>> {
        self.shutdown.lock().as_ref().map(|(_, rx)| rx.clone())
    }
}

impl ByteTransport for ChannelTransport {
    fn open(&self) -> io::Result<()> {
        let mut shutdown = self.shutdown.lock();
        if shutdown.is_none() {
            *shutdown = Some(crossbeam_channel::bounded(0));
        }
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        // Dropping the sender disconnects every cloned receiver.
        self.shutdown.lock().take();
        Ok(())
    }

    fn read(&self, buf: &mut [u8], timeout: Option<Duration>) -> ReadResult {
        let shutdown = self.shutdown_receiver().ok_or(ReadError::Closed)?;
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut pending = self.pending.lock();
        let mut filled = 0;

        loop {
            let take = pending.len().min(buf.len() - filled);
            pending.copy_to_slice(&mut buf[filled..filled + take]);
            filled += take;
            if filled == buf.len() {
                return Ok(filled);
            }

            let timer = match deadline {
                Some(deadline) => after(deadline.saturating_duration_since(Instant::now())),
                None => never(),
            };

            select! {
                recv(self.from_controller) -> msg => match msg {
                    Ok(bytes) => pending.extend_from_slice(&bytes),
                    Err(_) if filled > 0 => return Ok(filled),
                    Err(_) => return Err(ReadError::Closed),
                },
                recv(shutdown) -> _ => return Err(ReadError::Closed),
                recv(timer) -> _ => {
                    return if filled > 0 { Ok(filled) } else { Err(ReadError::Timeout) };
                }
            }
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        if self.shutdown.lock().is_none() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed"));
        }
        self.to_controller
            .send(data.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "controller end dropped"))
    }
}

impl ControllerEnd {
    /// Send raw bytes to the host.
    pub fn send(&self, data: &[u8]) {
        // The host side may already be gone at the end of a test.
        let _ = self.to_host.send(data.to_vec());
    }

    /// Send a WICED HCI frame to the host.
    pub fn send_frame(&self, command: u16, payload: &[u8]) -> Result<()> {
        self.send(&encode(command, payload, u16::MAX as usize)?);
        Ok(())
    }

    /// Wait for the next host write.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.from_host.recv_timeout(timeout).ok()
    }

    /// Wait for the next host write and decode it as a WICED frame.
    pub fn recv_frame(&self, timeout: Duration) -> Option<Result<Frame>> {
        self.recv_timeout(timeout).map(|data| Frame::decode(&data))
    }

    /// Drain every host write received so far.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.from_host.try_iter().collect()
    }
}
