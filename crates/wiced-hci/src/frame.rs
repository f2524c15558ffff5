//! Frame encoding/decoding utilities.
//!
//! After bring-up every message on the link is a WICED HCI frame: a 5-byte
//! header followed by the payload. All multi-byte fields are little-endian.
//!
//! ```text
//! +------+--------+--------+--------+--------+-------------------+
//! | 0x19 | cmd_lo | cmd_hi | len_lo | len_hi | payload[0..len]   |
//! +------+--------+--------+--------+--------+-------------------+
//! ```
//!
//! `cmd_hi` is the group code and `cmd_lo` the opcode within that group.

use bytes::{Buf, BufMut};

use crate::constants::{HCI_WICED_PKT, WICED_HCI_HEADER_LEN};
use crate::error::{HciError, Result};
use crate::group::Group;

/// Decoded 5-byte WICED HCI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Packet type byte (0x19 for WICED frames).
    pub packet_type: u8,
    /// Command or event code, `group << 8 | opcode`.
    pub command: u16,
    /// Number of payload bytes following the header.
    pub length: u16,
}

/// Decode the first 5 bytes of a frame.
///
/// The packet type is returned as-is; callers decide whether it is a WICED frame.
pub fn decode_header(header: &[u8; WICED_HCI_HEADER_LEN]) -> FrameHeader {
    let mut buf = &header[..];
    FrameHeader {
        packet_type: buf.get_u8(),
        command: buf.get_u16_le(),
        length: buf.get_u16_le(),
    }
}

/// Encode a command and payload as a WICED HCI frame.
///
/// Fails with [`HciError::PayloadTooLarge`] if the payload exceeds `max_payload`.
pub fn encode(command: u16, payload: &[u8], max_payload: usize) -> Result<Vec<u8>> {
    if payload.len() > max_payload || payload.len() > u16::MAX as usize {
        return Err(HciError::PayloadTooLarge {
            max: max_payload.min(u16::MAX as usize),
            actual: payload.len(),
        });
    }

    let mut buf = Vec::with_capacity(WICED_HCI_HEADER_LEN + payload.len());
    buf.put_u8(HCI_WICED_PKT);
    buf.put_u16_le(command);
    buf.put_u16_le(payload.len() as u16);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// One decoded WICED HCI message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command or event code.
    pub command: u16,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame.
    pub fn new(command: u16, payload: impl Into<Vec<u8>>) -> Self {
        Frame {
            command,
            payload: payload.into(),
        }
    }

    /// Raw group code (high byte of the command).
    pub fn group_code(&self) -> u8 {
        Group::code_of(self.command)
    }

    /// Group of the frame, if known.
    pub fn group(&self) -> Option<Group> {
        Group::of(self.command)
    }

    /// Opcode within the group (low byte of the command).
    pub fn opcode(&self) -> u8 {
        (self.command & 0xFF) as u8
    }

    /// Encode this frame for transmission.
    pub fn encode(&self, max_payload: usize) -> Result<Vec<u8>> {
        encode(self.command, &self.payload, max_payload)
    }

    /// Decode a complete wire frame (header and payload).
    ///
    /// Trailing bytes beyond the declared length are ignored.
    pub fn decode(data: &[u8]) -> Result<Frame> {
        let header: &[u8; WICED_HCI_HEADER_LEN] = data
            .get(..WICED_HCI_HEADER_LEN)
            .and_then(|h| h.try_into().ok())
            .ok_or(HciError::FrameTooShort {
                expected: WICED_HCI_HEADER_LEN,
                actual: data.len(),
            })?;

        let header = decode_header(header);
        if header.packet_type != HCI_WICED_PKT {
            return Err(HciError::BadPacketType(header.packet_type));
        }

        let end = WICED_HCI_HEADER_LEN + header.length as usize;
        if data.len() < end {
            return Err(HciError::FrameTooShort {
                expected: end,
                actual: data.len(),
            });
        }

        Ok(Frame::new(header.command, &data[WICED_HCI_HEADER_LEN..end]))
    }
}

/// Length of a Bluetooth device address.
pub const BD_ADDR_LEN: usize = 6;

/// Bluetooth device address in display order (most significant byte first).
///
/// On the wire the bytes travel in reverse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr(pub [u8; BD_ADDR_LEN]);

impl BdAddr {
    /// Write the address in wire order.
    pub fn to_stream(&self, buf: &mut impl BufMut) {
        for byte in self.0.iter().rev() {
            buf.put_u8(*byte);
        }
    }

    /// Read an address in wire order from the front of `buf`.
    pub fn from_stream(buf: &mut impl Buf) -> Result<BdAddr> {
        if buf.remaining() < BD_ADDR_LEN {
            return Err(HciError::FrameTooShort {
                expected: BD_ADDR_LEN,
                actual: buf.remaining(),
            });
        }
        let mut addr = [0u8; BD_ADDR_LEN];
        for slot in addr.iter_mut().rev() {
            *slot = buf.get_u8();
        }
        Ok(BdAddr(addr))
    }
}

impl std::fmt::Display for BdAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl std::str::FromStr for BdAddr {
    type Err = HciError;

    fn from_str(s: &str) -> Result<Self> {
        let mut addr = [0u8; BD_ADDR_LEN];
        let mut parts = s.split(':');
        for slot in addr.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| HciError::InvalidAddress(s.to_string()))?;
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| HciError::InvalidAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(HciError::InvalidAddress(s.to_string()));
        }
        Ok(BdAddr(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn test_encode_layout() {
        let encoded = encode(0x16F1, &[0xAA, 0xBB, 0xCC], DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(encoded, vec![0x19, 0xF1, 0x16, 0x03, 0x00, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let encoded = encode(CMD_READ_LOCAL_BDA, &[], DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(encoded, vec![0x19, 0x0F, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; DEFAULT_MAX_PAYLOAD + 1];
        match encode(CMD_RESET, &payload, DEFAULT_MAX_PAYLOAD) {
            Err(HciError::PayloadTooLarge { max, actual }) => {
                assert_eq!(max, DEFAULT_MAX_PAYLOAD);
                assert_eq!(actual, DEFAULT_MAX_PAYLOAD + 1);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }

        // Exactly at the limit is fine
        let payload = vec![0u8; DEFAULT_MAX_PAYLOAD];
        assert!(encode(CMD_RESET, &payload, DEFAULT_MAX_PAYLOAD).is_ok());
    }

    #[test]
    fn test_decode_header_little_endian() {
        let header = decode_header(&[0x19, 0x34, 0x12, 0x02, 0x01]);
        assert_eq!(
            header,
            FrameHeader {
                packet_type: 0x19,
                command: 0x1234,
                length: 0x0102,
            }
        );
    }

    #[test]
    fn test_frame_decode_errors() {
        assert!(matches!(
            Frame::decode(&[0x19, 0x01]),
            Err(HciError::FrameTooShort { expected: 5, actual: 2 })
        ));
        assert!(matches!(
            Frame::decode(&[0x04, 0x0E, 0x04, 0x01, 0x03]),
            Err(HciError::BadPacketType(0x04))
        ));
        // Declares 4 payload bytes, carries 2
        assert!(matches!(
            Frame::decode(&[0x19, 0x01, 0x00, 0x04, 0x00, 0x01, 0x02]),
            Err(HciError::FrameTooShort { expected: 9, actual: 7 })
        ));
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(EVT_MESH_PROXY_DATA, vec![1, 2, 3]);
        assert_eq!(frame.group(), Some(Group::Mesh));
        assert_eq!(frame.group_code(), 0x16);
        assert_eq!(frame.opcode(), 0xB9);
    }

    #[test]
    fn test_bdaddr_wire_order() {
        let addr: BdAddr = "00:A0:50:12:34:56".parse().unwrap();
        let mut wire = Vec::new();
        addr.to_stream(&mut wire);
        assert_eq!(wire, vec![0x56, 0x34, 0x12, 0x50, 0xA0, 0x00]);

        let mut cursor = &wire[..];
        assert_eq!(BdAddr::from_stream(&mut cursor).unwrap(), addr);
        assert_eq!(addr.to_string(), "00:A0:50:12:34:56");
    }

    #[test]
    fn test_bdaddr_parse_errors() {
        assert!("00:A0:50:12:34".parse::<BdAddr>().is_err());
        assert!("00:A0:50:12:34:56:78".parse::<BdAddr>().is_err());
        assert!("00:A0:50:12:34:ZZ".parse::<BdAddr>().is_err());
        let mut short = &[1u8, 2, 3][..];
        assert!(BdAddr::from_stream(&mut short).is_err());
    }
}
