//! Firmware bring-up.
//!
//! Before the controller speaks WICED HCI it has to be reset and loaded with
//! its runtime firmware. The exchange uses raw HCI framing and runs once, on
//! the calling thread, before the reader thread exists:
//!
//! 1. HCI_Reset, expect the 7-byte command complete event (a leading
//!    hardware error event is skipped).
//! 2. Download minidriver, response read and discarded.
//! 3. Every `.hcd` chunk is sent as an HCI command and acknowledged; the
//!    launch-RAM chunk ends the download.
//!
//! ## `.hcd` format
//!
//! ```text
//! +-----------+-----------+-----+-------------+
//! | opcode_lo | opcode_hi | len | data[0..len]|  repeated
//! +-----------+-----------+-----+-------------+
//! ```

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BringUpTimeouts;
use crate::constants::*;
use crate::error::{HciError, Result};
use crate::transport::{ByteTransport, ReadError};

/// Size of a chunk header: opcode (2) and length (1).
const CHUNK_HEADER_LEN: usize = 3;

/// A firmware image in `.hcd` format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    data: Vec<u8>,
    version: Option<String>,
}

impl FirmwareImage {
    /// Wrap raw `.hcd` bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        FirmwareImage {
            data: data.into(),
            version: None,
        }
    }

    /// Read an `.hcd` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    /// Attach a version string, logged at bring-up.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Version string, if known.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the chunks of the image.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            data: &self.data,
            offset: 0,
        }
    }
}

/// One `[opcode, len, data]` unit of a firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset of the chunk within the image.
    pub offset: usize,
    /// HCI opcode.
    pub opcode: u16,
    /// Chunk data (`len` bytes).
    pub data: &'a [u8],
    /// Opcode, length and data exactly as stored in the image.
    pub raw: &'a [u8],
}

/// Iterator over the chunks of a [`FirmwareImage`].
///
/// Yields an error and stops if a chunk runs past the end of the image.
pub struct Chunks<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let offset = self.offset;
        if rest.len() < CHUNK_HEADER_LEN {
            self.offset = self.data.len();
            return Some(Err(HciError::TruncatedChunk {
                offset,
                needed: CHUNK_HEADER_LEN,
                available: rest.len(),
            }));
        }

        let total = CHUNK_HEADER_LEN + rest[2] as usize;
        if rest.len() < total {
            self.offset = self.data.len();
            return Some(Err(HciError::TruncatedChunk {
                offset,
                needed: total,
                available: rest.len(),
            }));
        }

        self.offset += total;
        Some(Ok(Chunk {
            offset,
            opcode: u16::from_le_bytes([rest[0], rest[1]]),
            data: &rest[CHUNK_HEADER_LEN..total],
            raw: &rest[..total],
        }))
    }
}

/// Summary of a completed bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Chunks written, including the launch chunk.
    pub chunks_written: usize,
    /// Image bytes written (chunk headers included, packet type bytes excluded).
    pub bytes_written: usize,
    /// Whether a hardware error event preceded the reset response.
    pub hardware_error_seen: bool,
}

/// Runs the bring-up exchange on a transport.
pub struct FirmwareLoader<'a, T: ByteTransport> {
    transport: &'a T,
    timeouts: BringUpTimeouts,
}

impl<'a, T: ByteTransport> FirmwareLoader<'a, T> {
    /// Create a loader using the given read timeouts.
    pub fn new(transport: &'a T, timeouts: BringUpTimeouts) -> Self {
        FirmwareLoader { transport, timeouts }
    }

    /// Reset the controller and download `image`.
    ///
    /// Any failure aborts the bring-up; the caller must start again from the reset.
    pub fn load(&self, image: &FirmwareImage) -> Result<LoadReport> {
        match image.version() {
            Some(version) => info!(version, bytes = image.len(), "downloading firmware"),
            None => info!(bytes = image.len(), "downloading firmware"),
        }

        let hardware_error_seen = self.reset()?;
        self.download_minidriver()?;

        let mut report = self.write_chunks(image)?;
        report.hardware_error_seen = hardware_error_seen;
        info!(chunks = report.chunks_written, "firmware download complete");
        Ok(report)
    }

    /// Send HCI_Reset and check the command complete event.
    ///
    /// Returns whether a hardware error event had to be skipped.
    pub fn reset(&self) -> Result<bool> {
        self.transport.write(&HCI_RESET_COMMAND)?;

        let mut event = [0u8; BRING_UP_EVENT_LEN];
        let n = self.read_raw(&mut event, self.timeouts.reset())?;

        let hardware_error = n >= HCI_HARDWARE_ERROR_EVENT.len()
            && event[..HCI_HARDWARE_ERROR_EVENT.len()] == HCI_HARDWARE_ERROR_EVENT;

        let received = if hardware_error {
            warn!("hardware error event before reset complete, skipping it");
            // The reset complete event started right after the 4-byte error event.
            let mut received = event[HCI_HARDWARE_ERROR_EVENT.len()..n].to_vec();
            let mut tail = [0u8; HCI_HARDWARE_ERROR_EVENT.len()];
            let m = self.read_raw(&mut tail, self.timeouts.hardware_error())?;
            received.extend_from_slice(&tail[..m]);
            received
        } else {
            event[..n].to_vec()
        };

        if received != HCI_RESET_COMPLETE_EVENT {
            return Err(HciError::ProtocolMismatch {
                expected: HCI_RESET_COMPLETE_EVENT.to_vec(),
                actual: received,
            });
        }

        debug!("reset complete");
        Ok(hardware_error)
    }

    /// Send the download minidriver command. The response is not checked.
    pub fn download_minidriver(&self) -> Result<()> {
        self.transport.write(&HCI_DOWNLOAD_MINIDRIVER_COMMAND)?;

        let mut response = [0u8; BRING_UP_EVENT_LEN];
        let n = self.read_raw(&mut response, self.timeouts.minidriver())?;
        if n < response.len() {
            debug!(received = n, "short minidriver response");
        }
        Ok(())
    }

    fn write_chunks(&self, image: &FirmwareImage) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut packet = Vec::with_capacity(1 + CHUNK_HEADER_LEN + u8::MAX as usize);

        for chunk in image.chunks() {
            let chunk = chunk?;
            if chunk.opcode != OPCODE_WRITE_RAM && chunk.opcode != OPCODE_LAUNCH_RAM {
                return Err(HciError::UnknownChunkOpcode {
                    opcode: chunk.opcode,
                    offset: chunk.offset,
                });
            }

            packet.clear();
            packet.push(HCI_COMMAND_PKT);
            packet.extend_from_slice(chunk.raw);
            self.transport.write(&packet)?;
            report.chunks_written += 1;
            report.bytes_written += chunk.raw.len();

            let mut ack = [0u8; BRING_UP_EVENT_LEN];
            let n = self.read_raw(&mut ack, self.timeouts.chunk_ack())?;
            if n < ack.len() {
                warn!(offset = chunk.offset, received = n, "short chunk acknowledgement");
            }

            if chunk.opcode == OPCODE_LAUNCH_RAM {
                let trailing = image.len() - (chunk.offset + chunk.raw.len());
                if trailing > 0 {
                    debug!(trailing, "ignoring bytes after launch chunk");
                }
                return Ok(report);
            }
        }

        Err(HciError::MissingLaunch {
            chunks: report.chunks_written,
        })
    }

    /// Read a fixed-size raw response. A timeout counts as zero bytes.
    fn read_raw(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        match self.transport.read(buf, Some(timeout)) {
            Ok(n) => Ok(n),
            Err(ReadError::Timeout) => Ok(0),
            Err(e) => Err(HciError::Transport(e.into())),
        }
    }
}
