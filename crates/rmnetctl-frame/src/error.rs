/// Errors that can occur while encoding or decoding control messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A device name or prefix does not fit its fixed buffer with its terminator.
    #[error("string too long ({len} bytes, max {max})")]
    StringTruncation { len: usize, max: usize },

    /// A device name contains a byte that cannot travel in a C string.
    #[error("invalid device name: {0}")]
    InvalidName(&'static str),

    /// A request argument is outside the range the driver accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Fewer bytes were received than a frame header needs.
    #[error("short frame ({len} bytes, need at least {min})")]
    ShortFrame { len: usize, min: usize },

    /// The netlink header declares a length the received bytes cannot hold.
    #[error("declared length {declared} does not fit received {received} bytes")]
    LengthMismatch { declared: usize, received: usize },

    /// The payload ends before a field the operation needs.
    #[error("payload truncated (need {need} bytes, have {have})")]
    Truncated { need: usize, have: usize },

    /// A string field has no terminator within its fixed buffer.
    #[error("unterminated string field")]
    Unterminated,

    /// The operation code is not part of the driver contract.
    #[error("unknown message type {0}")]
    UnknownMessageType(u16),

    /// The reply kind is not valid for the operation.
    #[error("unexpected reply kind {crd} for {message_type}")]
    UnexpectedReply {
        message_type: &'static str,
        crd: u8,
    },

    /// The logical endpoint operating mode byte is unknown.
    #[error("unknown operating mode {0}")]
    UnknownMode(u8),
}

pub type Result<T> = std::result::Result<T, FrameError>;
