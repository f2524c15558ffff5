//! Reader thread: decodes inbound frames and hands them to the router.

use bytes::Buf;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::config::HciConfig;
use crate::constants::HCI_WICED_PKT;
use crate::session::Shared;
use crate::transport::{ByteTransport, ReadError};

/// Pause after an I/O error or an empty read before reading again.
const IO_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Result of reading one frame body after its packet-type byte.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// A complete frame; its payload is the reader's first `len` buffer bytes.
    Frame { command: u16, len: usize },
    /// The frame was abandoned.
    Dropped,
}

/// Frame decoder owning a payload buffer reused for every frame.
pub(crate) struct FrameReader<'a, T: ByteTransport> {
    transport: &'a T,
    buf: Vec<u8>,
}

impl<'a, T: ByteTransport> FrameReader<'a, T> {
    pub(crate) fn new(transport: &'a T, max_payload: usize) -> Self {
        FrameReader {
            transport,
            buf: vec![0u8; max_payload],
        }
    }

    pub(crate) fn payload(&self, len: usize) -> &[u8] {
        &self.buf[..len]
    }

    /// Read command, length and payload of a frame whose `0x19` byte was
    /// already consumed.
    pub(crate) fn read_body(&mut self) -> Result<Inbound, ReadError> {
        let mut field = [0u8; 2];

        if self.transport.read(&mut field, None)? != field.len() {
            return Ok(Inbound::Dropped);
        }
        let command = (&field[..]).get_u16_le();

        if self.transport.read(&mut field, None)? != field.len() {
            return Ok(Inbound::Dropped);
        }
        let len = (&field[..]).get_u16_le() as usize;

        if len > self.buf.len() {
            warn!(
                command = format_args!("0x{:04X}", command),
                len,
                max = self.buf.len(),
                "inbound payload exceeds buffer, discarding frame"
            );
            self.discard(len)?;
            return Ok(Inbound::Dropped);
        }

        if len == 0 {
            debug!(command = format_args!("0x{:04X}", command), "empty frame dropped");
            return Ok(Inbound::Dropped);
        }

        let n = self.transport.read(&mut self.buf[..len], None)?;
        if n != len {
            debug!(command = format_args!("0x{:04X}", command), len, n, "short payload read");
            return Ok(Inbound::Dropped);
        }

        Ok(Inbound::Frame { command, len })
    }

    /// Consume `len` payload bytes that do not fit the buffer.
    fn discard(&mut self, mut len: usize) -> Result<(), ReadError> {
        while len > 0 {
            let take = len.min(self.buf.len());
            let n = self.transport.read(&mut self.buf[..take], None)?;
            if n == 0 {
                break;
            }
            len -= n;
        }
        Ok(())
    }
}

/// Start the reader thread for a session. It loops until `running` is cleared
/// or the transport reports it is closed.
pub(crate) fn spawn_reader<T: ByteTransport>(
    shared: Arc<Shared<T>>,
    running: Arc<AtomicBool>,
    config: &HciConfig,
) -> io::Result<JoinHandle<()>> {
    let max_payload = config.max_payload;
    thread::Builder::new()
        .name(config.reader_thread_name.clone())
        .spawn(move || run(&shared, &running, max_payload))
}

fn run<T: ByteTransport>(shared: &Shared<T>, running: &AtomicBool, max_payload: usize) {
    let mut reader = FrameReader::new(&shared.transport, max_payload);
    let mut packet_type = [0u8; 1];
    debug!("reader thread started");

    while running.load(Ordering::Acquire) {
        match shared.transport.read(&mut packet_type, None) {
            Ok(1) if packet_type[0] == HCI_WICED_PKT => match reader.read_body() {
                Ok(Inbound::Frame { command, len }) => {
                    trace!(command = format_args!("0x{:04X}", command), len, "frame received");
                    shared.router.dispatch(command, reader.payload(len));
                }
                Ok(Inbound::Dropped) => shared.router.record_dropped(),
                Err(ReadError::Closed) => break,
                Err(e) => {
                    warn!(error = %e, "frame read failed");
                    shared.router.record_dropped();
                }
            },
            Ok(1) => trace!(byte = packet_type[0], "ignoring non-WICED packet byte"),
            Ok(_) => {
                trace!("empty read");
                thread::sleep(IO_ERROR_BACKOFF);
            }
            Err(ReadError::Closed) => break,
            Err(ReadError::Timeout) => {}
            Err(ReadError::Io(e)) => {
                warn!(error = %e, "transport read failed");
                thread::sleep(IO_ERROR_BACKOFF);
            }
        }
    }

    debug!("reader thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use crate::transport::{ChannelTransport, ReadResult};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    /// Transport that returns `empty_reads` zero-byte reads, then reports closed.
    struct EmptyReads {
        empty_reads: usize,
        reads: AtomicUsize,
    }

    impl ByteTransport for EmptyReads {
        fn open(&self) -> io::Result<()> {
            Ok(())
        }

        fn close(&self) -> io::Result<()> {
            Ok(())
        }

        fn read(&self, _buf: &mut [u8], _timeout: Option<Duration>) -> ReadResult {
            if self.reads.fetch_add(1, Ordering::SeqCst) < self.empty_reads {
                Ok(0)
            } else {
                Err(ReadError::Closed)
            }
        }

        fn write(&self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_body_with_payload() {
        let (transport, controller) = ChannelTransport::pair();
        transport.open().unwrap();
        controller.send(&[0xF1, 0x16, 0x03, 0x00, 3, 0, 0]);

        let mut reader = FrameReader::new(&transport, 16);
        assert_eq!(
            reader.read_body().unwrap(),
            Inbound::Frame {
                command: 0x16F1,
                len: 3
            }
        );
        assert_eq!(reader.payload(3), &[3, 0, 0]);
    }

    #[test]
    fn test_read_body_drops_empty_frame() {
        let (transport, controller) = ChannelTransport::pair();
        transport.open().unwrap();
        controller.send(&[0x05, 0x00, 0x00, 0x00, 0xAA]);

        let mut reader = FrameReader::new(&transport, 16);
        assert_eq!(reader.read_body().unwrap(), Inbound::Dropped);

        // The next byte is still unread.
        let mut next = [0u8; 1];
        transport.read(&mut next, Some(Duration::from_millis(20))).unwrap();
        assert_eq!(next, [0xAA]);
    }

    #[test]
    fn test_oversized_payload_is_discarded() {
        let (transport, controller) = ChannelTransport::pair();
        transport.open().unwrap();
        let mut wire = vec![0x0B, 0x02, 10, 0];
        wire.extend_from_slice(&[0x55; 10]);
        wire.push(0x19);
        controller.send(&wire);

        let mut reader = FrameReader::new(&transport, 4);
        assert_eq!(reader.read_body().unwrap(), Inbound::Dropped);

        let mut next = [0u8; 1];
        transport.read(&mut next, Some(Duration::from_millis(20))).unwrap();
        assert_eq!(next, [0x19]);
    }

    #[test]
    fn test_closed_transport_surfaces_closed() {
        let (transport, controller) = ChannelTransport::pair();
        transport.open().unwrap();
        controller.send(&[0xF1]);
        transport.close().unwrap();

        let mut reader = FrameReader::new(&transport, 16);
        assert!(matches!(reader.read_body(), Err(ReadError::Closed)));
    }

    #[test]
    fn test_empty_reads_back_off() {
        let shared = Shared {
            transport: EmptyReads {
                empty_reads: 5,
                reads: AtomicUsize::new(0),
            },
            router: Router::new(),
        };
        let running = AtomicBool::new(true);

        let started = Instant::now();
        run(&shared, &running, 16);

        assert_eq!(shared.transport.reads.load(Ordering::SeqCst), 6);
        assert!(started.elapsed() >= IO_ERROR_BACKOFF * 5);
        assert_eq!(shared.router.stats().dropped, 0);
    }
}
