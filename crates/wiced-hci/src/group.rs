//! Subsystem groups and command status codes.

use crate::constants::*;
use crate::error::HciError;

/// Coarse subsystem identifier carried in the high byte of a command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Group {
    /// Device management.
    Device = GROUP_DEVICE,
    /// Low energy GAP.
    Le = GROUP_LE,
    /// GATT.
    Gatt = GROUP_GATT,
    /// Bluetooth mesh.
    Mesh = GROUP_MESH,
    /// Miscellaneous. Reserved: frames in this group are never dispatched.
    Misc = GROUP_MISC,
}

impl Group {
    /// Groups that can own an event callback.
    pub const DISPATCHABLE: [Group; 4] = [Group::Device, Group::Le, Group::Gatt, Group::Mesh];

    /// Wire value of this group.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Group code of a command, without checking it is a known group.
    pub fn code_of(command: u16) -> u8 {
        (command >> 8) as u8
    }

    /// Group of a command, if the high byte names a known group.
    pub fn of(command: u16) -> Option<Group> {
        Group::try_from(Group::code_of(command)).ok()
    }

    /// Whether frames in this group are routed to a callback.
    pub fn is_dispatchable(self) -> bool {
        self != Group::Misc
    }
}

impl TryFrom<u8> for Group {
    type Error = HciError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            GROUP_DEVICE => Ok(Group::Device),
            GROUP_LE => Ok(Group::Le),
            GROUP_GATT => Ok(Group::Gatt),
            GROUP_MESH => Ok(Group::Mesh),
            GROUP_MISC => Ok(Group::Misc),
            other => Err(HciError::UnregisteredGroup(other)),
        }
    }
}

impl From<Group> for u8 {
    fn from(group: Group) -> Self {
        group.code()
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::Device => write!(f, "DEVICE"),
            Group::Le => write!(f, "LE"),
            Group::Gatt => write!(f, "GATT"),
            Group::Mesh => write!(f, "MESH"),
            Group::Misc => write!(f, "MISC"),
        }
    }
}

/// Status reported by the controller in a command status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Success.
    Success,
    /// Operation in progress.
    InProgress,
    /// Already connected.
    AlreadyConnected,
    /// Not connected.
    NotConnected,
    /// Bad handle.
    BadHandle,
    /// Wrong state.
    WrongState,
    /// Invalid arguments.
    InvalidArgs,
    /// Failed.
    Failed,
    /// Unknown group.
    UnknownGroup,
    /// Unknown command.
    UnknownCommand,
    /// Client not registered.
    ClientNotRegistered,
    /// Out of memory.
    OutOfMemory,
    /// Status code this host does not know.
    Unknown(u8),
}

impl CommandStatus {
    /// Decode the status byte at the start of a command status payload.
    pub fn from_payload(payload: &[u8]) -> Option<CommandStatus> {
        payload.first().copied().map(CommandStatus::from)
    }

    /// Whether the status reports success.
    pub fn is_success(self) -> bool {
        self == CommandStatus::Success
    }
}

impl From<u8> for CommandStatus {
    fn from(code: u8) -> Self {
        match code {
            STATUS_SUCCESS => CommandStatus::Success,
            STATUS_IN_PROGRESS => CommandStatus::InProgress,
            STATUS_ALREADY_CONNECTED => CommandStatus::AlreadyConnected,
            STATUS_NOT_CONNECTED => CommandStatus::NotConnected,
            STATUS_BAD_HANDLE => CommandStatus::BadHandle,
            STATUS_WRONG_STATE => CommandStatus::WrongState,
            STATUS_INVALID_ARGS => CommandStatus::InvalidArgs,
            STATUS_FAILED => CommandStatus::Failed,
            STATUS_UNKNOWN_GROUP => CommandStatus::UnknownGroup,
            STATUS_UNKNOWN_COMMAND => CommandStatus::UnknownCommand,
            STATUS_CLIENT_NOT_REGISTERED => CommandStatus::ClientNotRegistered,
            STATUS_OUT_OF_MEMORY => CommandStatus::OutOfMemory,
            _ => CommandStatus::Unknown(code),
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandStatus::Success => write!(f, "success"),
            CommandStatus::InProgress => write!(f, "in progress"),
            CommandStatus::AlreadyConnected => write!(f, "already connected"),
            CommandStatus::NotConnected => write!(f, "not connected"),
            CommandStatus::BadHandle => write!(f, "bad handle"),
            CommandStatus::WrongState => write!(f, "wrong state"),
            CommandStatus::InvalidArgs => write!(f, "invalid arguments"),
            CommandStatus::Failed => write!(f, "failed"),
            CommandStatus::UnknownGroup => write!(f, "unknown group"),
            CommandStatus::UnknownCommand => write!(f, "unknown command"),
            CommandStatus::ClientNotRegistered => write!(f, "client not registered"),
            CommandStatus::OutOfMemory => write!(f, "out of memory"),
            CommandStatus::Unknown(code) => write!(f, "unknown status (0x{:02X})", code),
        }
    }
}
