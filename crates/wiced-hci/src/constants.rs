//! Protocol constants
//!
//! These constants define the packet types, group codes, command and event
//! codes, and bring-up byte sequences used on a WICED HCI serial link.

use std::time::Duration;

// ============================================================================
// Packet Types
// ============================================================================

/// Raw HCI command packet (bring-up only).
pub const HCI_COMMAND_PKT: u8 = 0x01;
/// Raw HCI ACL data packet.
pub const HCI_ACL_DATA_PKT: u8 = 0x02;
/// Raw HCI event packet.
pub const HCI_EVENT_PKT: u8 = 0x04;
/// WICED HCI packet marker. Every post bring-up frame starts with this byte.
pub const HCI_WICED_PKT: u8 = 0x19;

/// Size of the WICED HCI header: packet type, command (2), length (2).
pub const WICED_HCI_HEADER_LEN: usize = 5;

/// Default payload capacity of a session's frame buffers.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;
/// Largest payload capacity a session may be configured with.
pub const MAX_PAYLOAD_LIMIT: usize = 2048;

// ============================================================================
// Group Codes (high byte of a command code)
// ============================================================================

/// Device management.
pub const GROUP_DEVICE: u8 = 0x00;
/// Low energy GAP.
pub const GROUP_LE: u8 = 0x01;
/// GATT client/server.
pub const GROUP_GATT: u8 = 0x02;
/// Bluetooth mesh.
pub const GROUP_MESH: u8 = 0x16;
/// Miscellaneous (ping, version). Reserved, never dispatched.
pub const GROUP_MISC: u8 = 0xFF;

/// Build a command code from a group and an opcode.
pub const fn command_code(group: u8, opcode: u8) -> u16 {
    ((group as u16) << 8) | opcode as u16
}

// ============================================================================
// Device Commands (host → controller)
// ============================================================================

/// Restart the controller.
pub const CMD_RESET: u16 = command_code(GROUP_DEVICE, 0x01);
/// Enable or disable WICED traces.
pub const CMD_TRACE_ENABLE: u16 = command_code(GROUP_DEVICE, 0x02);
/// Set the local device address.
pub const CMD_SET_LOCAL_BDA: u16 = command_code(GROUP_DEVICE, 0x03);
/// Change UART baud rate.
pub const CMD_SET_BAUD_RATE: u16 = command_code(GROUP_DEVICE, 0x04);
/// Download a previously saved NVRAM chunk.
pub const CMD_PUSH_NVRAM_DATA: u16 = command_code(GROUP_DEVICE, 0x05);
/// Delete an NVRAM chunk currently stored in RAM.
pub const CMD_DELETE_NVRAM_DATA: u16 = command_code(GROUP_DEVICE, 0x06);
/// Start/stop inquiry.
pub const CMD_INQUIRY: u16 = command_code(GROUP_DEVICE, 0x07);
/// Set BR/EDR connectability and discoverability.
pub const CMD_SET_VISIBILITY: u16 = command_code(GROUP_DEVICE, 0x08);
/// Set pairing mode (0 = not pairable, 1 = pairable).
pub const CMD_SET_PAIRING_MODE: u16 = command_code(GROUP_DEVICE, 0x09);
/// Delete the bond with a peer.
pub const CMD_UNBOND: u16 = command_code(GROUP_DEVICE, 0x0A);
/// User confirmation during pairing.
pub const CMD_USER_CONFIRMATION: u16 = command_code(GROUP_DEVICE, 0x0B);
/// Enable coexistence.
pub const CMD_ENABLE_COEX: u16 = command_code(GROUP_DEVICE, 0x0C);
/// Disable coexistence.
pub const CMD_DISABLE_COEX: u16 = command_code(GROUP_DEVICE, 0x0D);
/// Set the battery level in the GATT database.
pub const CMD_SET_BATTERY_LEVEL: u16 = command_code(GROUP_DEVICE, 0x0E);
/// Read the local device address.
pub const CMD_READ_LOCAL_BDA: u16 = command_code(GROUP_DEVICE, 0x0F);
/// Initiate bonding with a peer.
pub const CMD_BOND: u16 = command_code(GROUP_DEVICE, 0x10);
/// Read buffer statistics.
pub const CMD_READ_BUFF_STATS: u16 = command_code(GROUP_DEVICE, 0x11);
/// Set the local name.
pub const CMD_SET_LOCAL_NAME: u16 = command_code(GROUP_DEVICE, 0x12);

// ============================================================================
// LE Commands
// ============================================================================

/// Start scan.
pub const CMD_LE_SCAN: u16 = command_code(GROUP_LE, 0x01);
/// Start or stop advertisements.
pub const CMD_LE_ADVERTISE: u16 = command_code(GROUP_LE, 0x02);
/// Connect to a peer.
pub const CMD_LE_CONNECT: u16 = command_code(GROUP_LE, 0x03);
/// Cancel a pending connect.
pub const CMD_LE_CANCEL_CONNECT: u16 = command_code(GROUP_LE, 0x04);
/// Disconnect.
pub const CMD_LE_DISCONNECT: u16 = command_code(GROUP_LE, 0x05);
/// Delete keys and re-pair.
pub const CMD_LE_RE_PAIR: u16 = command_code(GROUP_LE, 0x06);
/// Get identity address.
pub const CMD_LE_GET_IDENTITY_ADDRESS: u16 = command_code(GROUP_LE, 0x07);
/// Set channel classification for the 40 LE channels.
pub const CMD_LE_SET_CHANNEL_CLASSIFICATION: u16 = command_code(GROUP_LE, 0x08);
/// Set connection parameters.
pub const CMD_LE_SET_CONN_PARAMS: u16 = command_code(GROUP_LE, 0x09);
/// Set raw advertisement data.
pub const CMD_LE_SET_RAW_ADVERTISE_DATA: u16 = command_code(GROUP_LE, 0x0A);
/// Grant or deny a security request.
pub const CMD_LE_SECURITY_GRANT: u16 = command_code(GROUP_LE, 0x0B);

// ============================================================================
// GATT Commands
// ============================================================================

/// Discover services.
pub const CMD_GATT_DISCOVER_SERVICES: u16 = command_code(GROUP_GATT, 0x01);
/// Discover characteristics.
pub const CMD_GATT_DISCOVER_CHARACTERISTICS: u16 = command_code(GROUP_GATT, 0x02);
/// Discover descriptors.
pub const CMD_GATT_DISCOVER_DESCRIPTORS: u16 = command_code(GROUP_GATT, 0x03);
/// Send read request.
pub const CMD_GATT_READ_REQUEST: u16 = command_code(GROUP_GATT, 0x04);
/// Send read response.
pub const CMD_GATT_READ_RESPONSE: u16 = command_code(GROUP_GATT, 0x05);
/// Send write command.
pub const CMD_GATT_WRITE_COMMAND: u16 = command_code(GROUP_GATT, 0x06);
/// Send write request.
pub const CMD_GATT_WRITE_REQUEST: u16 = command_code(GROUP_GATT, 0x07);
/// Send write response.
pub const CMD_GATT_WRITE_RESPONSE: u16 = command_code(GROUP_GATT, 0x08);
/// Send notification.
pub const CMD_GATT_NOTIFY: u16 = command_code(GROUP_GATT, 0x09);
/// Send indication.
pub const CMD_GATT_INDICATE: u16 = command_code(GROUP_GATT, 0x0A);
/// Send indication confirmation.
pub const CMD_GATT_INDICATE_CONFIRM: u16 = command_code(GROUP_GATT, 0x0B);
/// Register GATT callback.
pub const CMD_GATT_REGISTER: u16 = command_code(GROUP_GATT, 0x0C);
/// Initialize GATT database.
pub const CMD_GATT_DB_INIT: u16 = command_code(GROUP_GATT, 0x0D);

// ============================================================================
// Mesh Commands
// ============================================================================

/// Start the mesh application and delete all NVRAM chunks.
pub const CMD_MESH_APP_START: u16 = command_code(GROUP_MESH, 0xEF);
/// Report proxy connection status.
pub const CMD_MESH_SEND_CONN_STATUS: u16 = command_code(GROUP_MESH, 0xF1);
/// Send proxy data from the host.
pub const CMD_MESH_SEND_PROXY_DATA: u16 = command_code(GROUP_MESH, 0xF2);
/// Push NVRAM data to the mesh core.
pub const CMD_MESH_PUSH_NVRAM_DATA: u16 = command_code(GROUP_MESH, 0xF3);
/// Re-initialise the mesh stack.
pub const CMD_MESH_STACK_INIT: u16 = command_code(GROUP_MESH, 0xF4);
/// Connection state, sent before proxy data.
pub const CMD_MESH_CONNECTION_STATE: u16 = command_code(GROUP_MESH, 0xF5);

// ============================================================================
// Device Events (controller → host)
// ============================================================================

/// Command status for the requested operation.
pub const EVT_COMMAND_STATUS: u16 = command_code(GROUP_DEVICE, 0x01);
/// WICED trace packet.
pub const EVT_WICED_TRACE: u16 = command_code(GROUP_DEVICE, 0x02);
/// Bluetooth protocol trace.
pub const EVT_HCI_TRACE: u16 = command_code(GROUP_DEVICE, 0x03);
/// Request to save an NVRAM chunk.
pub const EVT_NVRAM_DATA: u16 = command_code(GROUP_DEVICE, 0x04);
/// Device completed power-up initialization.
pub const EVT_DEVICE_STARTED: u16 = command_code(GROUP_DEVICE, 0x05);
/// Inquiry result.
pub const EVT_INQUIRY_RESULT: u16 = command_code(GROUP_DEVICE, 0x06);
/// Inquiry complete.
pub const EVT_INQUIRY_COMPLETE: u16 = command_code(GROUP_DEVICE, 0x07);
/// Pairing complete.
pub const EVT_PAIRING_COMPLETE: u16 = command_code(GROUP_DEVICE, 0x08);
/// Encryption changed.
pub const EVT_ENCRYPTION_CHANGED: u16 = command_code(GROUP_DEVICE, 0x09);
/// Connected device name.
pub const EVT_CONNECTED_DEVICE_NAME: u16 = command_code(GROUP_DEVICE, 0x0A);
/// User confirmation during pairing.
pub const EVT_USER_CONFIRMATION: u16 = command_code(GROUP_DEVICE, 0x0B);
/// Device error.
pub const EVT_DEVICE_ERROR: u16 = command_code(GROUP_DEVICE, 0x0C);
/// Local device address read.
pub const EVT_READ_LOCAL_BDA: u16 = command_code(GROUP_DEVICE, 0x0D);
/// Key buffer pool full.
pub const EVT_MAX_NUM_OF_PAIRED_DEVICES_REACHED: u16 = command_code(GROUP_DEVICE, 0x0E);
/// Buffer statistics.
pub const EVT_READ_BUFFER_STATS: u16 = command_code(GROUP_DEVICE, 0x0F);
/// Update link key.
pub const EVT_UPDATE_LINK_KEY: u16 = command_code(GROUP_DEVICE, 0x10);
/// Request the ID keys.
pub const EVT_REQUEST_ID_KEYS: u16 = command_code(GROUP_DEVICE, 0x11);
/// RSSI of a link.
pub const EVT_READ_RSSI: u16 = command_code(GROUP_DEVICE, 0x12);
/// Application initialization finished.
pub const EVT_DEVICE_INIT: u16 = command_code(GROUP_DEVICE, 0x13);
/// Security request; answer with [`CMD_LE_SECURITY_GRANT`].
pub const EVT_SECURITY_REQ: u16 = command_code(GROUP_DEVICE, 0x14);
/// Security procedure failed.
pub const EVT_SECURITY_FAILED: u16 = command_code(GROUP_DEVICE, 0x15);
/// BR/EDR IO capabilities request.
pub const EVT_IO_CAPABILITIES_BR_EDR_REQUEST: u16 = command_code(GROUP_DEVICE, 0x16);
/// Keypress notification.
pub const EVT_KEYPRESS_NOTIFICATION: u16 = command_code(GROUP_DEVICE, 0x17);
/// Connection status.
pub const EVT_CONNECTION_STATUS: u16 = command_code(GROUP_DEVICE, 0x18);

// ============================================================================
// LE Events
// ============================================================================

/// LE command status.
pub const EVT_LE_COMMAND_STATUS: u16 = command_code(GROUP_LE, 0x01);
/// Scan state change.
pub const EVT_LE_SCAN_STATUS: u16 = command_code(GROUP_LE, 0x02);
/// Advertisement report.
pub const EVT_LE_ADVERTISEMENT_REPORT: u16 = command_code(GROUP_LE, 0x03);
/// Advertisement state change.
pub const EVT_LE_ADVERTISEMENT_STATE: u16 = command_code(GROUP_LE, 0x04);
/// LE connection established.
pub const EVT_LE_CONNECTED: u16 = command_code(GROUP_LE, 0x05);
/// LE connection terminated.
pub const EVT_LE_DISCONNECTED: u16 = command_code(GROUP_LE, 0x06);
/// Identity address.
pub const EVT_LE_IDENTITY_ADDRESS: u16 = command_code(GROUP_LE, 0x07);
/// Peer MTU.
pub const EVT_LE_PEER_MTU: u16 = command_code(GROUP_LE, 0x08);

// ============================================================================
// GATT Events
// ============================================================================

/// GATT command status.
pub const EVT_GATT_COMMAND_STATUS: u16 = command_code(GROUP_GATT, 0x01);
/// Discovery requested by the host completed.
pub const EVT_GATT_DISCOVERY_COMPLETE: u16 = command_code(GROUP_GATT, 0x02);
/// Service discovered.
pub const EVT_GATT_SERVICE_DISCOVERED: u16 = command_code(GROUP_GATT, 0x03);
/// Characteristic discovered.
pub const EVT_GATT_CHARACTERISTIC_DISCOVERED: u16 = command_code(GROUP_GATT, 0x04);
/// Characteristic descriptor discovered.
pub const EVT_GATT_DESCRIPTOR_DISCOVERED: u16 = command_code(GROUP_GATT, 0x05);
/// Peer sent a read request.
pub const EVT_GATT_READ_REQUEST: u16 = command_code(GROUP_GATT, 0x06);
/// Read response.
pub const EVT_GATT_READ_RESPONSE: u16 = command_code(GROUP_GATT, 0x07);
/// Peer sent a write request.
pub const EVT_GATT_WRITE_REQUEST: u16 = command_code(GROUP_GATT, 0x08);
/// Write operation completed.
pub const EVT_GATT_WRITE_RESPONSE: u16 = command_code(GROUP_GATT, 0x09);
/// Indication from peer.
pub const EVT_GATT_INDICATION: u16 = command_code(GROUP_GATT, 0x0A);
/// Notification from peer.
pub const EVT_GATT_NOTIFICATION: u16 = command_code(GROUP_GATT, 0x0B);
/// Read operation error.
pub const EVT_GATT_READ_ERROR: u16 = command_code(GROUP_GATT, 0x0C);
/// Write operation error.
pub const EVT_GATT_WRITE_ERROR: u16 = command_code(GROUP_GATT, 0x0D);

// ============================================================================
// Mesh Events
// ============================================================================

/// Provisioning ended at the core.
pub const EVT_MESH_CORE_PROVISION_END: u16 = command_code(GROUP_MESH, 0xB0);
/// Mesh status.
pub const EVT_MESH_STATUS: u16 = command_code(GROUP_MESH, 0xB2);
/// Proxy connection status.
pub const EVT_MESH_PROXY_CONNECTION_STATUS: u16 = command_code(GROUP_MESH, 0xB4);
/// Proxy data for the host application.
pub const EVT_MESH_PROXY_DATA: u16 = command_code(GROUP_MESH, 0xB9);
/// Provisioning status.
pub const EVT_MESH_PROVISIONING_STATUS: u16 = command_code(GROUP_MESH, 0xFD);
/// Request to save a mesh NVRAM chunk.
pub const EVT_MESH_NVRAM_DATA: u16 = command_code(GROUP_MESH, 0xFE);

// ============================================================================
// Misc Events
// ============================================================================

/// Ping reply.
pub const EVT_MISC_PING_REPLY: u16 = command_code(GROUP_MISC, 0x01);
/// SDK version.
pub const EVT_MISC_VERSION: u16 = command_code(GROUP_MISC, 0x02);

// ============================================================================
// Status Codes (payload of the command status events)
// ============================================================================

/// Success.
pub const STATUS_SUCCESS: u8 = 0;
/// Operation in progress.
pub const STATUS_IN_PROGRESS: u8 = 1;
/// Already connected.
pub const STATUS_ALREADY_CONNECTED: u8 = 2;
/// Not connected.
pub const STATUS_NOT_CONNECTED: u8 = 3;
/// Bad handle.
pub const STATUS_BAD_HANDLE: u8 = 4;
/// Wrong state.
pub const STATUS_WRONG_STATE: u8 = 5;
/// Invalid arguments.
pub const STATUS_INVALID_ARGS: u8 = 6;
/// Failed.
pub const STATUS_FAILED: u8 = 7;
/// Unknown group.
pub const STATUS_UNKNOWN_GROUP: u8 = 8;
/// Unknown command.
pub const STATUS_UNKNOWN_COMMAND: u8 = 9;
/// Client not registered.
pub const STATUS_CLIENT_NOT_REGISTERED: u8 = 10;
/// Out of memory.
pub const STATUS_OUT_OF_MEMORY: u8 = 11;

// ============================================================================
// LE Scan States (payload of EVT_LE_SCAN_STATUS)
// ============================================================================

/// Not scanning.
pub const SCAN_EVENT_NO_SCAN: u8 = 0;
/// High duty scan.
pub const SCAN_EVENT_HIGH_SCAN: u8 = 1;
/// Low duty scan.
pub const SCAN_EVENT_LOW_SCAN: u8 = 2;
/// High duty connection scan.
pub const SCAN_EVENT_HIGH_CONN: u8 = 3;
/// Low duty connection scan.
pub const SCAN_EVENT_LOW_CONN: u8 = 4;

// ============================================================================
// Bring-up (raw HCI framing)
// ============================================================================

/// HCI_Reset command with its packet type byte.
pub const HCI_RESET_COMMAND: [u8; 4] = [HCI_COMMAND_PKT, 0x03, 0x0C, 0x00];
/// Hardware error event some controllers emit before answering the reset.
pub const HCI_HARDWARE_ERROR_EVENT: [u8; 4] = [HCI_EVENT_PKT, 0x10, 0x01, 0x00];
/// Command complete event for HCI_Reset with status success.
pub const HCI_RESET_COMPLETE_EVENT: [u8; 7] = [HCI_EVENT_PKT, 0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00];
/// Vendor "download minidriver" command with its packet type byte.
pub const HCI_DOWNLOAD_MINIDRIVER_COMMAND: [u8; 4] = [HCI_COMMAND_PKT, 0x2E, 0xFC, 0x00];

/// Length of a command complete event answering a bring-up command.
pub const BRING_UP_EVENT_LEN: usize = 7;

/// Vendor write-RAM opcode used by `.hcd` chunks.
pub const OPCODE_WRITE_RAM: u16 = 0xFC4C;
/// Vendor launch-RAM opcode terminating an `.hcd` image.
pub const OPCODE_LAUNCH_RAM: u16 = 0xFC4E;

/// Timeout for the reset command complete event.
pub const RESET_TIMEOUT: Duration = Duration::from_millis(110);
/// Timeout for the bytes following a hardware error event.
pub const HARDWARE_ERROR_TIMEOUT: Duration = Duration::from_millis(100);
/// Timeout for the minidriver command complete event.
pub const MINIDRIVER_TIMEOUT: Duration = Duration::from_millis(100);
/// Timeout for each firmware chunk acknowledgement.
pub const CHUNK_ACK_TIMEOUT: Duration = Duration::from_millis(220);

/// Delay between firmware launch and the start of normal traffic.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);
