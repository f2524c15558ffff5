//! WICED HCI host transport
//!
//! This crate drives a Bluetooth controller running a WICED HCI application
//! over a serial byte link. It brings the controller up (reset, minidriver,
//! firmware download), then runs a reader thread that decodes inbound frames
//! and routes each one to the callback registered for its subsystem group.
//!
//! # Protocol Overview
//!
//! After bring-up every message is a WICED HCI frame:
//!
//! - **Packet type** `0x19`
//! - **Command** (2 bytes LE): group code in the high byte, opcode in the low byte
//! - **Length** (2 bytes LE) followed by the payload
//!
//! Groups are DEVICE (`0x00`), LE (`0x01`), GATT (`0x02`) and MESH (`0x16`).
//! MISC (`0xFF`) frames are never dispatched.
//!
//! # Example
//!
//! ```rust,ignore
//! use wiced_hci::{Command, FirmwareImage, TcpTransport, WicedHci, GROUP_MESH};
//!
//! let hci = WicedHci::new(TcpTransport::new("127.0.0.1:4000".parse()?));
//! hci.set_event_callback(GROUP_MESH, |command, payload| {
//!     println!("mesh event 0x{:04X}: {} bytes", command, payload.len());
//! })?;
//!
//! let image = FirmwareImage::from_file("mesh_app.hcd")?;
//! hci.up(Some(&image))?;
//! hci.send_command(&Command::MeshAppStart)?;
//! ```

mod commands;
mod config;
mod constants;
mod error;
mod firmware;
mod frame;
mod group;
mod reader;
mod router;
mod session;
pub mod transport;

pub use commands::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use firmware::*;
pub use frame::*;
pub use group::*;
pub use router::*;
pub use session::{SessionState, WicedHci};
pub use transport::{ByteTransport, ChannelTransport, ControllerEnd, ReadError, ReadResult, TcpTransport};
