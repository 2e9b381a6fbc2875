/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to create the socket descriptor.
    #[error("failed to open socket (protocol {protocol}): {source}")]
    Socket {
        protocol: i32,
        source: std::io::Error,
    },

    /// Failed to bind the descriptor to the local port id.
    #[error("failed to bind to port id {port_id}: {source}")]
    Bind {
        port_id: u32,
        source: std::io::Error,
    },

    /// Failed to send a datagram.
    #[error("failed to send datagram: {0}")]
    Send(std::io::Error),

    /// The datagram was only partially accepted by the socket.
    #[error("short send ({sent} of {len} bytes)")]
    ShortSend { sent: usize, len: usize },

    /// Failed to receive a datagram.
    #[error("failed to receive datagram: {0}")]
    Receive(std::io::Error),

    /// Failed to apply a socket option.
    #[error("failed to set socket option: {0}")]
    Option(std::io::Error),
}

impl TransportError {
    /// True when the error was caused by an expired send/receive timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Send(err) | TransportError::Receive(err) => matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
