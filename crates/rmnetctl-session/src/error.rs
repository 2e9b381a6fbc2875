use rmnetctl_frame::{FrameError, MessageType};
use rmnetctl_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum RmnetError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be built from the caller's arguments.
    #[error("request error: {0}")]
    Request(#[from] FrameError),

    /// The received response could not be interpreted.
    #[error("response error: {0}")]
    Response(FrameError),

    /// The process id cannot serve as a netlink port id.
    #[error("invalid process id {0}")]
    ProcessId(u32),

    /// The session has been closed.
    #[error("session handle is closed")]
    HandleClosed,

    /// The response answers a different operation.
    #[error("response type {received} does not match request type {expected}")]
    MessageTypeMismatch {
        expected: MessageType,
        received: u16,
    },

    /// The response belongs to a different transaction.
    #[error("response sequence {received} does not match request sequence {expected}")]
    SequenceMismatch { expected: u32, received: u32 },

    /// A resolved name does not fit the caller's buffer.
    #[error("buffer too small ({capacity} bytes, need {needed})")]
    BufferTooSmall { capacity: usize, needed: usize },
}

pub type Result<T> = std::result::Result<T, RmnetError>;
