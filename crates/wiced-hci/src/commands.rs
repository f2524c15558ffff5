//! Typed commands for the controller application.

use bytes::BufMut;

use crate::constants::*;
use crate::error::{HciError, Result};
use crate::frame::{BdAddr, BD_ADDR_LEN};

/// Connection id reported to the mesh core for an established proxy connection.
pub const DEFAULT_PROXY_CONNECTION_ID: u8 = 0x03;

/// One element of raw advertisement data.
///
/// A command carries at most 255 elements and each element at most
/// 65535 data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertElement {
    /// AD type.
    pub advert_type: u8,
    /// AD data.
    pub data: Vec<u8>,
}

/// Commands that can be sent to the controller application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set the controller's public device address.
    SetLocalBdAddr {
        /// New address.
        addr: BdAddr,
    },

    /// Ask for the local device address. The answer arrives as a DEVICE event.
    ReadLocalBdAddr,

    /// Push a block of NVRAM data back to the controller.
    PushNvramData {
        /// NVRAM slot.
        id: u16,
        /// Stored bytes.
        data: Vec<u8>,
    },

    /// Enable or disable LE advertising.
    LeAdvertise {
        /// Whether advertisements are sent.
        enable: bool,
    },

    /// Replace the raw advertisement data.
    LeSetRawAdvertiseData {
        /// AD elements in order.
        elements: Vec<AdvertElement>,
    },

    /// Answer a peer's security request.
    LeSecurityGrant {
        /// Peer address.
        addr: BdAddr,
        /// Grant result code.
        result: u8,
    },

    /// Start the mesh application on the controller.
    MeshAppStart,

    /// Re-initialize the mesh stack.
    MeshStackInit,

    /// Report a GATT proxy connection change to the mesh core.
    MeshProxyConnectionStatus {
        /// Whether a proxy client is connected.
        connected: bool,
    },

    /// Forward proxy PDU bytes received over GATT to the mesh core.
    MeshProxyData {
        /// PDU bytes.
        data: Vec<u8>,
    },
}

impl Command {
    /// Command code and payload of this command.
    ///
    /// Fails with [`HciError::AdvertTooLarge`] when raw advertisement data
    /// overflows its count or length fields.
    pub fn encode(&self) -> Result<(u16, Vec<u8>)> {
        let mut buf = Vec::new();

        let code = match self {
            Command::SetLocalBdAddr { addr } => {
                addr.to_stream(&mut buf);
                CMD_SET_LOCAL_BDA
            }

            Command::ReadLocalBdAddr => {
                buf.extend_from_slice(&[0u8; BD_ADDR_LEN]);
                CMD_READ_LOCAL_BDA
            }

            Command::PushNvramData { id, data } => {
                buf.put_u16_le(*id);
                buf.extend_from_slice(data);
                CMD_PUSH_NVRAM_DATA
            }

            Command::LeAdvertise { enable } => {
                buf.push(u8::from(*enable));
                CMD_LE_ADVERTISE
            }

            Command::LeSetRawAdvertiseData { elements } => {
                let count = u8::try_from(elements.len()).map_err(|_| HciError::AdvertTooLarge {
                    field: "element count",
                    max: u8::MAX as usize,
                    actual: elements.len(),
                })?;
                buf.push(count);
                for element in elements {
                    let len =
                        u16::try_from(element.data.len()).map_err(|_| HciError::AdvertTooLarge {
                            field: "element data",
                            max: u16::MAX as usize,
                            actual: element.data.len(),
                        })?;
                    buf.push(element.advert_type);
                    buf.put_u16(len);
                    buf.extend_from_slice(&element.data);
                    // Each element is sent with a trailing NUL.
                    buf.push(0);
                }
                CMD_LE_SET_RAW_ADVERTISE_DATA
            }

            Command::LeSecurityGrant { addr, result } => {
                addr.to_stream(&mut buf);
                buf.push(*result);
                CMD_LE_SECURITY_GRANT
            }

            Command::MeshAppStart => {
                buf.push(0);
                CMD_MESH_APP_START
            }

            Command::MeshStackInit => {
                buf.push(0);
                CMD_MESH_STACK_INIT
            }

            Command::MeshProxyConnectionStatus { connected } => {
                let id = if *connected {
                    DEFAULT_PROXY_CONNECTION_ID
                } else {
                    0
                };
                buf.extend_from_slice(&[id, 0, 0]);
                CMD_MESH_SEND_CONN_STATUS
            }

            Command::MeshProxyData { data } => {
                buf.extend_from_slice(data);
                CMD_MESH_SEND_PROXY_DATA
            }
        };

        Ok((code, buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_local_bda_reverses_address() {
        let addr: BdAddr = "00:A0:50:11:22:33".parse().unwrap();
        let (code, payload) = Command::SetLocalBdAddr { addr }.encode().unwrap();
        assert_eq!(code, 0x0003);
        assert_eq!(payload, vec![0x33, 0x22, 0x11, 0x50, 0xA0, 0x00]);
    }

    #[test]
    fn test_proxy_connection_status() {
        let (code, payload) = Command::MeshProxyConnectionStatus { connected: true }
            .encode()
            .unwrap();
        assert_eq!(code, 0x16F1);
        assert_eq!(payload, vec![3, 0, 0]);

        let (_, payload) = Command::MeshProxyConnectionStatus { connected: false }
            .encode()
            .unwrap();
        assert_eq!(payload, vec![0, 0, 0]);
    }

    #[test]
    fn test_push_nvram_data() {
        let (code, payload) = Command::PushNvramData {
            id: 0x0201,
            data: vec![0xAA, 0xBB],
        }
        .encode()
        .unwrap();
        assert_eq!(code, CMD_PUSH_NVRAM_DATA);
        assert_eq!(payload, vec![0x01, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn test_raw_advertise_data_layout() {
        let (code, payload) = Command::LeSetRawAdvertiseData {
            elements: vec![
                AdvertElement {
                    advert_type: 0x01,
                    data: vec![0x06],
                },
                AdvertElement {
                    advert_type: 0x09,
                    data: b"ab".to_vec(),
                },
            ],
        }
        .encode()
        .unwrap();
        assert_eq!(code, CMD_LE_SET_RAW_ADVERTISE_DATA);
        assert_eq!(
            payload,
            vec![2, 0x01, 0x00, 0x01, 0x06, 0, 0x09, 0x00, 0x02, b'a', b'b', 0]
        );
    }

    #[test]
    fn test_single_byte_commands() {
        assert_eq!(
            Command::MeshAppStart.encode().unwrap(),
            (CMD_MESH_APP_START, vec![0])
        );
        assert_eq!(
            Command::MeshStackInit.encode().unwrap(),
            (CMD_MESH_STACK_INIT, vec![0])
        );
        assert_eq!(
            Command::LeAdvertise { enable: false }.encode().unwrap(),
            (CMD_LE_ADVERTISE, vec![0])
        );
        assert_eq!(
            Command::ReadLocalBdAddr.encode().unwrap(),
            (CMD_READ_LOCAL_BDA, vec![0; 6])
        );
    }

    #[test]
    fn test_raw_advertise_data_rejects_overflowing_lengths() {
        let element = AdvertElement {
            advert_type: 0x09,
            data: vec![0x41],
        };
        let too_many = Command::LeSetRawAdvertiseData {
            elements: vec![element; 256],
        };
        assert!(matches!(
            too_many.encode(),
            Err(HciError::AdvertTooLarge {
                field: "element count",
                max: 255,
                actual: 256
            })
        ));

        let too_long = Command::LeSetRawAdvertiseData {
            elements: vec![AdvertElement {
                advert_type: 0xFF,
                data: vec![0; 0x1_0000],
            }],
        };
        assert!(matches!(
            too_long.encode(),
            Err(HciError::AdvertTooLarge {
                field: "element data",
                max: 65535,
                actual: 65536
            })
        ));

        let full = Command::LeSetRawAdvertiseData {
            elements: vec![
                AdvertElement {
                    advert_type: 0x01,
                    data: vec![0x06],
                };
                255
            ],
        };
        let (_, payload) = full.encode().unwrap();
        assert_eq!(payload[0], 255);
    }
}
