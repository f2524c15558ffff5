//! Controller UART bridged over TCP.
//!
//! Serial-to-TCP bridges (and the simulator's per-node UART ports) expose the
//! controller's UART as a plain byte stream. Reads and writes use separate
//! handles on the same socket so the reader thread never blocks a writer.

use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ByteTransport, ReadError, ReadResult};

/// Connect timeout used by [`TcpTransport::open`].
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A controller UART reached over TCP.
pub struct TcpTransport {
    addr: SocketAddr,
    reader: Mutex<Option<TcpStream>>,
    writer: Mutex<Option<TcpStream>>,
    /// Extra handle used to shut the socket down without taking the reader lock.
    control: Mutex<Option<TcpStream>>,
}

impl TcpTransport {
    /// Create a transport for the given bridge address. Nothing connects until `open`.
    pub fn new(addr: SocketAddr) -> Self {
        TcpTransport {
            addr,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            control: Mutex::new(None),
        }
    }

    /// Address of the bridge.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl ByteTransport for TcpTransport {
    fn open(&self) -> io::Result<()> {
        let stream = TcpStream::connect_timeout(&self.addr, CONNECT_TIMEOUT)?;
        stream.set_nodelay(true)?;
        debug!(addr = %self.addr, "UART bridge connected");

        *self.reader.lock() = Some(stream.try_clone()?);
        *self.control.lock() = Some(stream.try_clone()?);
        *self.writer.lock() = Some(stream);
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.writer.lock().take();
        if let Some(control) = self.control.lock().take() {
            match control.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn read(&self, buf: &mut [u8], timeout: Option<Duration>) -> ReadResult {
        let mut guard = self.reader.lock();
        let stream = guard.as_mut().ok_or(ReadError::Closed)?;
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut filled = 0;

        while filled < buf.len() {
            let remaining = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        break;
                    }
                    Some(left)
                }
                None => None,
            };
            stream.set_read_timeout(remaining)?;

            match stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        return Err(ReadError::Closed);
                    }
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    break
                }
                Err(e) => return Err(ReadError::Io(e)),
            }
        }

        if filled == 0 && !buf.is_empty() {
            Err(ReadError::Timeout)
        } else {
            Ok(filled)
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut guard = self.writer.lock();
        let stream = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))?;
        stream.write_all(data)?;
        stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_round_trip_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let bridge = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
            // Keep the socket open until the host closes it
            let mut rest = Vec::new();
            let _ = stream.read_to_end(&mut rest);
        });

        let transport = TcpTransport::new(addr);
        transport.open().unwrap();
        transport.write(&[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(transport.read(&mut buf, Some(Duration::from_secs(2))).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut buf = [0u8; 1];
        assert!(matches!(
            transport.read(&mut buf, Some(Duration::from_millis(20))),
            Err(ReadError::Timeout)
        ));

        transport.close().unwrap();
        assert!(transport.write(&[5]).is_err());
        bridge.join().unwrap();
    }
}
