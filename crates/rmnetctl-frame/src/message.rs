//! Operation codes, reply kinds and kernel status codes.

use std::ffi::CStr;
use std::fmt;

use serde::Serialize;

use crate::error::{FrameError, Result};

/// Operation code carried in every control message.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    AssociateNetworkDevice = 0,
    UnassociateNetworkDevice = 1,
    GetNetworkDeviceAssociated = 2,
    SetLinkEgressDataFormat = 3,
    GetLinkEgressDataFormat = 4,
    SetLinkIngressDataFormat = 5,
    GetLinkIngressDataFormat = 6,
    SetLogicalEpConfig = 7,
    UnsetLogicalEpConfig = 8,
    GetLogicalEpConfig = 9,
    NewVnd = 10,
    NewVndWithPrefix = 11,
    GetVndName = 12,
    FreeVnd = 13,
}

impl MessageType {
    /// Every operation code, in wire order.
    pub const ALL: [MessageType; 14] = [
        MessageType::AssociateNetworkDevice,
        MessageType::UnassociateNetworkDevice,
        MessageType::GetNetworkDeviceAssociated,
        MessageType::SetLinkEgressDataFormat,
        MessageType::GetLinkEgressDataFormat,
        MessageType::SetLinkIngressDataFormat,
        MessageType::GetLinkIngressDataFormat,
        MessageType::SetLogicalEpConfig,
        MessageType::UnsetLogicalEpConfig,
        MessageType::GetLogicalEpConfig,
        MessageType::NewVnd,
        MessageType::NewVndWithPrefix,
        MessageType::GetVndName,
        MessageType::FreeVnd,
    ];

    /// Parse a wire operation code.
    pub fn from_wire(code: u16) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(FrameError::UnknownMessageType(code))
    }

    /// The wire operation code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// The reply kind the driver answers this operation with.
    pub fn expected_reply(self) -> ReplyKind {
        match self {
            MessageType::GetNetworkDeviceAssociated
            | MessageType::GetLinkEgressDataFormat
            | MessageType::GetLinkIngressDataFormat
            | MessageType::GetLogicalEpConfig
            | MessageType::GetVndName => ReplyKind::ReturnData,
            _ => ReplyKind::ReturnCode,
        }
    }

    /// Human-readable operation name.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::AssociateNetworkDevice => "associate-network-device",
            MessageType::UnassociateNetworkDevice => "unassociate-network-device",
            MessageType::GetNetworkDeviceAssociated => "get-network-device-associated",
            MessageType::SetLinkEgressDataFormat => "set-link-egress-data-format",
            MessageType::GetLinkEgressDataFormat => "get-link-egress-data-format",
            MessageType::SetLinkIngressDataFormat => "set-link-ingress-data-format",
            MessageType::GetLinkIngressDataFormat => "get-link-ingress-data-format",
            MessageType::SetLogicalEpConfig => "set-logical-ep-config",
            MessageType::UnsetLogicalEpConfig => "unset-logical-ep-config",
            MessageType::GetLogicalEpConfig => "get-logical-ep-config",
            MessageType::NewVnd => "new-vnd",
            MessageType::NewVndWithPrefix => "new-vnd-with-prefix",
            MessageType::GetVndName => "get-vnd-name",
            MessageType::FreeVnd => "free-vnd",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The two-bit command/return-code/return-data marker (`crd`).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    /// Request from user space.
    Command = 0,
    /// Status-only reply; `return_code` holds a kernel status.
    ReturnCode = 1,
    /// Reply carrying operation data.
    ReturnData = 2,
}

impl ReplyKind {
    /// Parse the two-bit wire value. Value 3 is unassigned.
    pub fn from_wire(crd: u8) -> Option<Self> {
        match crd {
            0 => Some(ReplyKind::Command),
            1 => Some(ReplyKind::ReturnCode),
            2 => Some(ReplyKind::ReturnData),
            _ => None,
        }
    }
}

/// Status the driver reports for a configuration request.
///
/// This is data, not a transaction failure: a request can be delivered and
/// answered correctly while the driver still refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelStatus {
    Ok,
    UnknownMessage,
    UnknownError,
    NoMemory,
    DeviceInUse,
    InvalidRequest,
    NoSuchDevice,
    BadArguments,
    BadEgressDevice,
    TcHandleFull,
    /// A status code this client does not know.
    Unrecognized(u16),
}

impl KernelStatus {
    pub fn from_wire(code: u16) -> Self {
        match code {
            0 => KernelStatus::Ok,
            1 => KernelStatus::UnknownMessage,
            2 => KernelStatus::UnknownError,
            3 => KernelStatus::NoMemory,
            4 => KernelStatus::DeviceInUse,
            5 => KernelStatus::InvalidRequest,
            6 => KernelStatus::NoSuchDevice,
            7 => KernelStatus::BadArguments,
            8 => KernelStatus::BadEgressDevice,
            9 => KernelStatus::TcHandleFull,
            other => KernelStatus::Unrecognized(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            KernelStatus::Ok => 0,
            KernelStatus::UnknownMessage => 1,
            KernelStatus::UnknownError => 2,
            KernelStatus::NoMemory => 3,
            KernelStatus::DeviceInUse => 4,
            KernelStatus::InvalidRequest => 5,
            KernelStatus::NoSuchDevice => 6,
            KernelStatus::BadArguments => 7,
            KernelStatus::BadEgressDevice => 8,
            KernelStatus::TcHandleFull => 9,
            KernelStatus::Unrecognized(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == KernelStatus::Ok
    }

    /// Fixed diagnostic text, NUL-terminated for C callers.
    pub fn c_message(self) -> &'static CStr {
        match self {
            KernelStatus::Ok => c"ok",
            KernelStatus::UnknownMessage => c"driver does not know the message type",
            KernelStatus::UnknownError => c"unknown driver error",
            KernelStatus::NoMemory => c"driver is out of memory",
            KernelStatus::DeviceInUse => c"device is in use",
            KernelStatus::InvalidRequest => c"invalid request",
            KernelStatus::NoSuchDevice => c"no such device",
            KernelStatus::BadArguments => c"bad arguments",
            KernelStatus::BadEgressDevice => c"bad egress device",
            KernelStatus::TcHandleFull => c"traffic control handle table is full",
            KernelStatus::Unrecognized(_) => c"unrecognized driver status",
        }
    }

    pub fn message(self) -> &'static str {
        self.c_message().to_str().unwrap_or_default()
    }
}

impl fmt::Display for KernelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

/// Egress data format flags.
pub mod egress {
    pub const MAP: u32 = 1 << 1;
    pub const AGGREGATION: u32 = 1 << 2;
    pub const MUXING: u32 = 1 << 3;
    pub const MAP_CKSUMV3: u32 = 1 << 4;
    pub const MAP_CKSUMV4: u32 = 1 << 5;

    /// Flag names for diagnostics, lowest bit first.
    pub const NAMES: [(u32, &str); 5] = [
        (MAP, "map"),
        (AGGREGATION, "aggregation"),
        (MUXING, "muxing"),
        (MAP_CKSUMV3, "map-cksumv3"),
        (MAP_CKSUMV4, "map-cksumv4"),
    ];
}

/// Ingress data format flags.
pub mod ingress {
    pub const FIX_ETHERNET: u32 = 1 << 0;
    pub const MAP: u32 = 1 << 1;
    pub const DEAGGREGATION: u32 = 1 << 2;
    pub const DEMUXING: u32 = 1 << 3;
    pub const MAP_COMMANDS: u32 = 1 << 4;
    pub const MAP_CKSUMV3: u32 = 1 << 5;
    pub const MAP_CKSUMV4: u32 = 1 << 6;

    /// Flag names for diagnostics, lowest bit first.
    pub const NAMES: [(u32, &str); 7] = [
        (FIX_ETHERNET, "fix-ethernet"),
        (MAP, "map"),
        (DEAGGREGATION, "deaggregation"),
        (DEMUXING, "demuxing"),
        (MAP_COMMANDS, "map-commands"),
        (MAP_CKSUMV3, "map-cksumv3"),
        (MAP_CKSUMV4, "map-cksumv4"),
    ];
}

/// Names of the flags set in `flags`, per a name table.
pub fn flag_names(flags: u32, table: &[(u32, &'static str)]) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}
