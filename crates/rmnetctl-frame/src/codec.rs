use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::message::{KernelStatus, MessageType, ReplyKind};
use crate::payload::{Request, ResponseData, DATA_LEN};

/// Netlink message header: len (4) + type (2) + flags (2) + seq (4) + pid (4).
pub const NLMSG_HDRLEN: usize = 16;

/// Control message header: reserved (2) + type (2) + crd word (2) + arg/return (2).
pub const MESSAGE_HEADER_LEN: usize = 8;

/// Full control message: header + data area.
pub const MESSAGE_LEN: usize = MESSAGE_HEADER_LEN + DATA_LEN;

/// Size of every frame on the wire, `NLMSG_SPACE(MESSAGE_LEN)`.
pub const FRAME_LEN: usize = (NLMSG_HDRLEN + MESSAGE_LEN + 3) & !3;

/// Smallest datagram that carries both headers.
pub const MIN_FRAME_LEN: usize = NLMSG_HDRLEN + MESSAGE_HEADER_LEN;

// The driver declares `reserved2:14, crd:2` in one u16; the compiler packs
// bitfields from the low bit on little-endian targets and from the high bit
// on big-endian ones.
#[cfg(target_endian = "little")]
const CRD_SHIFT: u16 = 14;
#[cfg(target_endian = "big")]
const CRD_SHIFT: u16 = 0;
const CRD_MASK: u16 = 0b11;

/// Header fields shared by requests and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Netlink sequence number.
    pub sequence: u32,
    /// Netlink port id of the sender.
    pub port_id: u32,
    /// Raw operation code.
    pub message_type: u16,
    /// Raw two-bit reply kind.
    pub crd: u8,
    /// `arg_length` on requests, `return_code` on responses.
    pub arg: u16,
}

/// A response as produced by the driver (or a stand-in for it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub sequence: u32,
    pub message_type: MessageType,
    pub reply: Reply,
}

/// What the driver answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status-only reply.
    Status(KernelStatus),
    /// Query reply with data.
    Data(ResponseData),
}

/// A received response whose headers have been validated but whose
/// payload has not been interpreted yet.
#[derive(Debug, Clone, Copy)]
pub struct ResponseFrame<'a> {
    pub header: FrameHeader,
    data: &'a [u8],
}

impl<'a> ResponseFrame<'a> {
    /// Bytes of the data area actually received (at most `DATA_LEN`).
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Interpret the reply as an answer to `message_type`.
    ///
    /// Status operations accept only a `return code` reply. Query operations
    /// accept a `return data` reply, or a `return code` reply carrying a
    /// non-OK status when the driver refused the query.
    pub fn reply(&self, message_type: MessageType) -> Result<Reply> {
        let status = KernelStatus::from_wire(self.header.arg);
        match (
            message_type.expected_reply(),
            ReplyKind::from_wire(self.header.crd),
        ) {
            (ReplyKind::ReturnCode, Some(ReplyKind::ReturnCode)) => Ok(Reply::Status(status)),
            (ReplyKind::ReturnData, Some(ReplyKind::ReturnCode)) if !status.is_ok() => {
                Ok(Reply::Status(status))
            }
            (ReplyKind::ReturnData, Some(ReplyKind::ReturnData)) => {
                ResponseData::decode_data(message_type, self.header.arg, self.data).map(Reply::Data)
            }
            _ => Err(FrameError::UnexpectedReply {
                message_type: message_type.name(),
                crd: self.header.crd,
            }),
        }
    }
}

/// Encode a request frame into the wire format.
///
/// ```text
/// ┌──────────────────────── nlmsghdr (16B) ────────────────────────┐
/// │ len u32 │ type u16 │ flags u16 │ seq u32 │ pid u32             │
/// ├──────────────────── rmnet message (72B) ───────────────────────┤
/// │ reserved u16 │ msg type u16 │ crd word u16 │ arg_length u16    │
/// │ data [64]                                                      │
/// └────────────────────────────────────────────────────────────────┘
/// ```
///
/// Every frame is `FRAME_LEN` bytes; integers are in host byte order.
pub fn encode_request(request: &Request, sequence: u32, port_id: u32, dst: &mut BytesMut) {
    let mut data = [0u8; DATA_LEN];
    request.encode_data(&mut data);
    let header = FrameHeader {
        sequence,
        port_id,
        message_type: request.message_type().code(),
        crd: ReplyKind::Command as u8,
        arg: request.arg_length(),
    };
    put_frame(&header, &data, dst);
}

/// Encode a response frame, as the driver would.
pub fn encode_response(response: &Response, port_id: u32, dst: &mut BytesMut) {
    let mut data = [0u8; DATA_LEN];
    let (crd, arg) = match &response.reply {
        Reply::Status(status) => (ReplyKind::ReturnCode, status.code()),
        Reply::Data(reply) => (ReplyKind::ReturnData, reply.encode_data(&mut data)),
    };
    let header = FrameHeader {
        sequence: response.sequence,
        port_id,
        message_type: response.message_type.code(),
        crd: crd as u8,
        arg,
    };
    put_frame(&header, &data, dst);
}

/// Validate the headers of a received response.
///
/// Never reads past `src`, even when the netlink length field claims more.
pub fn decode_response(src: &[u8]) -> Result<ResponseFrame<'_>> {
    let (header, data) = split_frame(src)?;
    trace!(
        sequence = header.sequence,
        message_type = header.message_type,
        crd = header.crd,
        "decoded response header"
    );
    Ok(ResponseFrame { header, data })
}

/// Decode a request frame, as the driver would.
pub fn decode_request(src: &[u8]) -> Result<(FrameHeader, Request)> {
    let (header, data) = split_frame(src)?;
    if header.crd != ReplyKind::Command as u8 {
        return Err(FrameError::UnexpectedReply {
            message_type: "request",
            crd: header.crd,
        });
    }
    let message_type = MessageType::from_wire(header.message_type)?;
    let request = Request::decode_data(message_type, data)?;
    Ok((header, request))
}

fn put_frame(header: &FrameHeader, data: &[u8; DATA_LEN], dst: &mut BytesMut) {
    dst.reserve(FRAME_LEN);
    let start = dst.len();
    dst.put_u32_ne(FRAME_LEN as u32);
    dst.put_u16_ne(0);
    dst.put_u16_ne(0);
    dst.put_u32_ne(header.sequence);
    dst.put_u32_ne(header.port_id);
    dst.put_u16_ne(0);
    dst.put_u16_ne(header.message_type);
    dst.put_u16_ne((u16::from(header.crd) & CRD_MASK) << CRD_SHIFT);
    dst.put_u16_ne(header.arg);
    dst.put_slice(data);
    dst.put_bytes(0, FRAME_LEN - (dst.len() - start));
}

fn split_frame(src: &[u8]) -> Result<(FrameHeader, &[u8])> {
    if src.len() < MIN_FRAME_LEN {
        return Err(FrameError::ShortFrame {
            len: src.len(),
            min: MIN_FRAME_LEN,
        });
    }

    let declared = read_u32(src, 0) as usize;
    if declared < MIN_FRAME_LEN || declared > src.len() {
        return Err(FrameError::LengthMismatch {
            declared,
            received: src.len(),
        });
    }
    let frame = &src[..declared];

    let word = read_u16(frame, NLMSG_HDRLEN + 4);
    let header = FrameHeader {
        sequence: read_u32(frame, 8),
        port_id: read_u32(frame, 12),
        message_type: read_u16(frame, NLMSG_HDRLEN + 2),
        crd: ((word >> CRD_SHIFT) & CRD_MASK) as u8,
        arg: read_u16(frame, NLMSG_HDRLEN + 6),
    };

    let data_end = frame.len().min(MIN_FRAME_LEN + DATA_LEN);
    Ok((header, &frame[MIN_FRAME_LEN..data_end]))
}

// Callers have checked `src` holds `MIN_FRAME_LEN` bytes.
fn read_u16(src: &[u8], offset: usize) -> u16 {
    u16::from_ne_bytes([src[offset], src[offset + 1]])
}

fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([src[offset], src[offset + 1], src[offset + 2], src[offset + 3]])
}
