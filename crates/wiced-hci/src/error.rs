//! Error types for the WICED HCI transport.

use thiserror::Error;

/// Errors that can occur while bringing up or driving a WICED HCI link.
#[derive(Error, Debug)]
pub enum HciError {
    /// The byte transport failed to read or write.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A bring-up response did not match the expected bytes.
    #[error("unexpected response during bring-up: expected {expected:02X?}, got {actual:02X?}")]
    ProtocolMismatch {
        /// Bytes the controller should have sent.
        expected: Vec<u8>,
        /// Bytes actually received (may be shorter on a timeout).
        actual: Vec<u8>,
    },

    /// A firmware chunk carried an opcode that is neither write-RAM nor launch-RAM.
    #[error("unknown firmware chunk opcode 0x{opcode:04X} at offset {offset}")]
    UnknownChunkOpcode {
        /// Opcode read from the chunk header.
        opcode: u16,
        /// Byte offset of the chunk within the image.
        offset: usize,
    },

    /// A firmware chunk runs past the end of the image.
    #[error("truncated firmware chunk at offset {offset}: needs {needed} bytes, {available} available")]
    TruncatedChunk {
        /// Byte offset of the chunk within the image.
        offset: usize,
        /// Bytes the chunk header claims.
        needed: usize,
        /// Bytes remaining in the image.
        available: usize,
    },

    /// The image ended without a launch-RAM chunk.
    #[error("firmware image has no launch chunk ({chunks} chunks written)")]
    MissingLaunch {
        /// Chunks written before the image ran out.
        chunks: usize,
    },

    /// Callback registration for a group code that cannot be dispatched.
    #[error("group 0x{0:02X} cannot be registered")]
    UnregisteredGroup(u8),

    /// Outbound payload does not fit in the session's frame buffer.
    #[error("payload too large: maximum {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Maximum payload size.
        max: usize,
        /// Size of the rejected payload.
        actual: usize,
    },

    /// Raw advertisement data does not fit its length fields.
    #[error("advertisement {field} too large: maximum {max}, got {actual}")]
    AdvertTooLarge {
        /// Which length field overflowed.
        field: &'static str,
        /// Largest value the field can carry.
        max: usize,
        /// Rejected value.
        actual: usize,
    },

    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Leading byte is not the WICED packet marker.
    #[error("bad packet type: 0x{0:02X}")]
    BadPacketType(u8),

    /// Device address string could not be parsed.
    #[error("invalid device address: {0}")]
    InvalidAddress(String),

    /// Operation is not valid in the current session state.
    #[error("invalid session state: expected {expected}, session is {actual}")]
    InvalidState {
        /// State the operation requires.
        expected: &'static str,
        /// State the session was in.
        actual: &'static str,
    },

    /// The reader thread panicked before it could be joined.
    #[error("reader thread panicked")]
    ReaderPanicked,

    /// Configuration is invalid or could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for WICED HCI operations.
pub type Result<T> = std::result::Result<T, HciError>;
