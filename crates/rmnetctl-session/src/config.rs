use std::time::Duration;

/// Netlink protocol number of the rmnet data driver.
pub const DEFAULT_PROTOCOL: i32 = 31;

/// Sequence number of the first transaction on a new session.
pub const DEFAULT_INITIAL_SEQUENCE: u32 = 0;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Netlink protocol to open.
    pub protocol: i32,
    /// Sequence number assigned to the first request.
    pub initial_sequence: u32,
    /// Receive timeout. `None` blocks until the driver answers.
    pub read_timeout: Option<Duration>,
    /// Send timeout. `None` blocks until the socket accepts the datagram.
    pub write_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL,
            initial_sequence: DEFAULT_INITIAL_SEQUENCE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
