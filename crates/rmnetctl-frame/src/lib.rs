//! Wire codec for rmnet netlink control messages.
//!
//! Every control message is a single fixed-size datagram:
//! - A 16-byte netlink header carrying the sequence number and sender port id
//! - An 8-byte control header carrying the operation code, the reply kind
//!   and either the argument length (requests) or the kernel status (replies)
//! - A 64-byte data area whose layout is selected by the operation code
//!
//! Integers are in host byte order. Strings are NUL-terminated inside
//! 16-byte fields; names that would not fit are rejected, never truncated.

pub mod codec;
pub mod error;
pub mod message;
pub mod name;
pub mod payload;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, FrameHeader, Reply,
    Response, ResponseFrame, FRAME_LEN, MESSAGE_HEADER_LEN, MESSAGE_LEN, MIN_FRAME_LEN,
    NLMSG_HDRLEN,
};
pub use error::{FrameError, Result};
pub use message::{egress, flag_names, ingress, KernelStatus, MessageType, ReplyKind};
pub use name::{DeviceName, MAX_NAME_LEN};
pub use payload::{
    EgressFormat, EndpointId, LogicalEpConfig, LogicalEpState, OperatingMode, Request,
    ResponseData, DATA_LEN,
};
