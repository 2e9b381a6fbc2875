//! Error classification: coarse outcomes and fine-grained sub-codes.
//!
//! Every failure maps to exactly one [`ErrorCode`], and every code belongs
//! to exactly one [`Outcome`]. The diagnostic text for each code lives in a
//! static table indexed by code; [`ErrorCode::COUNT`] bounds lookups.

use std::ffi::CStr;
use std::fmt;

use rmnetctl_frame::FrameError;
use rmnetctl_transport::TransportError;
use serde::Serialize;

use crate::error::RmnetError;

/// Coarse result category returned at the API boundary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success = 0,
    /// Failure inside the library.
    LibraryError = 1,
    /// Failure exchanging messages with the kernel.
    KernelError = 2,
    /// The caller passed arguments that cannot be sent.
    InvalidArgument = 3,
}

impl Outcome {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Outcome::Success => "RMNETCTL_SUCCESS",
            Outcome::LibraryError => "RMNETCTL_LIB_ERR",
            Outcome::KernelError => "RMNETCTL_KERNEL_ERR",
            Outcome::InvalidArgument => "RMNETCTL_INVALID_ARG",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fine-grained failure sub-code.
///
/// The numbering is part of the C ABI and must not change; new codes go
/// before the end, with `COUNT` and the text table extended to match.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Success = 0,
    RequestInvalid = 1,
    ResponseInvalid = 2,
    MessageSend = 3,
    MessageReceive = 4,
    ProcessId = 5,
    NetlinkFd = 6,
    Bind = 7,
    InvalidUser = 8,
    HndlInvalid = 9,
    RequestNull = 10,
    ResponseNull = 11,
    MessageType = 12,
    ReturnType = 13,
    StringTruncation = 14,
}

/// Diagnostic text per code, indexed by the code's value.
static ERROR_TEXT: [&CStr; ErrorCode::COUNT] = [
    c"API succeeded",
    c"Request could not be built from the given arguments",
    c"Response from the kernel could not be decoded",
    c"Could not send the message to kernel",
    c"Unable to receive message from the kernel",
    c"Invalid process id",
    c"Invalid socket descriptor id",
    c"Could not bind to netlink socket",
    c"Only root can access this API",
    c"RmNet handle for the transaction was NULL",
    c"Request buffer for the transaction was NULL",
    c"Response buffer for the transaction was NULL",
    c"Request and response type do not match",
    c"Return type is invalid",
    c"String was truncated",
];

impl ErrorCode {
    /// Number of codes; one past the last valid value.
    pub const COUNT: usize = 15;

    pub const ALL: [ErrorCode; ErrorCode::COUNT] = [
        ErrorCode::Success,
        ErrorCode::RequestInvalid,
        ErrorCode::ResponseInvalid,
        ErrorCode::MessageSend,
        ErrorCode::MessageReceive,
        ErrorCode::ProcessId,
        ErrorCode::NetlinkFd,
        ErrorCode::Bind,
        ErrorCode::InvalidUser,
        ErrorCode::HndlInvalid,
        ErrorCode::RequestNull,
        ErrorCode::ResponseNull,
        ErrorCode::MessageType,
        ErrorCode::ReturnType,
        ErrorCode::StringTruncation,
    ];

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Coarse category of this code.
    pub fn outcome(self) -> Outcome {
        match self {
            ErrorCode::Success => Outcome::Success,
            ErrorCode::ResponseInvalid
            | ErrorCode::ProcessId
            | ErrorCode::NetlinkFd
            | ErrorCode::Bind
            | ErrorCode::InvalidUser
            | ErrorCode::ReturnType => Outcome::LibraryError,
            ErrorCode::MessageSend | ErrorCode::MessageReceive | ErrorCode::MessageType => {
                Outcome::KernelError
            }
            ErrorCode::RequestInvalid
            | ErrorCode::HndlInvalid
            | ErrorCode::RequestNull
            | ErrorCode::ResponseNull
            | ErrorCode::StringTruncation => Outcome::InvalidArgument,
        }
    }

    /// Fixed diagnostic text, NUL-terminated for C callers.
    pub fn c_message(self) -> &'static CStr {
        ERROR_TEXT[self as usize]
    }

    /// Fixed diagnostic text.
    pub fn message(self) -> &'static str {
        self.c_message().to_str().unwrap_or_default()
    }

    /// Symbolic C name of the code.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Success => "RMNETCTL_API_SUCCESS",
            ErrorCode::RequestInvalid => "RMNETCTL_API_ERR_REQUEST_INVALID",
            ErrorCode::ResponseInvalid => "RMNETCTL_API_ERR_RESPONSE_INVALID",
            ErrorCode::MessageSend => "RMNETCTL_API_ERR_MESSAGE_SEND",
            ErrorCode::MessageReceive => "RMNETCTL_API_ERR_MESSAGE_RECEIVE",
            ErrorCode::ProcessId => "RMNETCTL_INIT_ERR_PROCESS_ID",
            ErrorCode::NetlinkFd => "RMNETCTL_INIT_ERR_NETLINK_FD",
            ErrorCode::Bind => "RMNETCTL_INIT_ERR_BIND",
            ErrorCode::InvalidUser => "RMNETCTL_INIT_ERR_INVALID_USER",
            ErrorCode::HndlInvalid => "RMNETCTL_API_ERR_HNDL_INVALID",
            ErrorCode::RequestNull => "RMNETCTL_API_ERR_REQUEST_NULL",
            ErrorCode::ResponseNull => "RMNETCTL_API_ERR_RESPONSE_NULL",
            ErrorCode::MessageType => "RMNETCTL_API_ERR_MESSAGE_TYPE",
            ErrorCode::ReturnType => "RMNETCTL_API_ERR_RETURN_TYPE",
            ErrorCode::StringTruncation => "RMNETCTL_API_ERR_STRING_TRUNCATION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Bounds-checked text lookup for a raw sub-code.
pub fn error_text(code: u16) -> Option<&'static str> {
    ErrorCode::from_code(code).map(ErrorCode::message)
}

impl RmnetError {
    /// Sub-code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            RmnetError::Transport(err) => match err {
                TransportError::Socket { .. } | TransportError::Option(_) => ErrorCode::NetlinkFd,
                TransportError::Bind { .. } => ErrorCode::Bind,
                TransportError::Send(_) | TransportError::ShortSend { .. } => {
                    ErrorCode::MessageSend
                }
                TransportError::Receive(_) => ErrorCode::MessageReceive,
            },
            RmnetError::Request(FrameError::StringTruncation { .. }) => {
                ErrorCode::StringTruncation
            }
            RmnetError::Request(_) => ErrorCode::RequestInvalid,
            RmnetError::Response(FrameError::ShortFrame { .. }) => ErrorCode::MessageReceive,
            RmnetError::Response(FrameError::UnexpectedReply { .. }) => ErrorCode::ReturnType,
            RmnetError::Response(_) => ErrorCode::ResponseInvalid,
            RmnetError::ProcessId(_) => ErrorCode::ProcessId,
            RmnetError::HandleClosed => ErrorCode::HndlInvalid,
            RmnetError::MessageTypeMismatch { .. } => ErrorCode::MessageType,
            RmnetError::SequenceMismatch { .. } => ErrorCode::MessageReceive,
            RmnetError::BufferTooSmall { .. } => ErrorCode::StringTruncation,
        }
    }

    /// Coarse category for this failure.
    pub fn outcome(&self) -> Outcome {
        self.code().outcome()
    }
}
