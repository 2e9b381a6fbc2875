use bytes::BytesMut;
use rmnetctl_frame::FRAME_LEN;
use rmnetctl_transport::Transport;
use tracing::{debug, info};

#[cfg(target_os = "linux")]
use rmnetctl_transport::NetlinkSocket;

use crate::config::SessionConfig;
use crate::error::{Result, RmnetError};

/// A session on the netlink transport the rmnet driver listens on.
#[cfg(target_os = "linux")]
pub type NetlinkSession = Session<NetlinkSocket>;

/// Process-scoped handle for talking to the driver.
///
/// Owns the transport descriptor, the sender's port id and the transaction
/// sequence counter. The descriptor is released by [`Session::close`] or
/// when the session is dropped, whichever comes first.
///
/// Transactions take `&mut self`, so one session never interleaves a send
/// with another transaction's receive.
///
/// A netlink session binds to the process id, and the kernel allows one
/// socket per port id and protocol. A process therefore holds at most one
/// open netlink session at a time; a second open fails with a bind error
/// until the first is closed. Threads share that session behind a `Mutex`.
pub struct Session<T: Transport> {
    pub(crate) transport: Option<T>,
    pub(crate) port_id: u32,
    pub(crate) sequence: u32,
    pub(crate) buf: BytesMut,
}

#[cfg(target_os = "linux")]
impl Session<NetlinkSocket> {
    /// Open a session on the rmnet netlink protocol with default configuration.
    pub fn open() -> Result<Self> {
        Self::open_with_config(&SessionConfig::default())
    }

    /// Open a session with explicit configuration.
    pub fn open_with_config(config: &SessionConfig) -> Result<Self> {
        Self::open_netlink_with(config, |socket| socket)
    }
}

#[cfg(target_os = "linux")]
impl<T: Transport> Session<T> {
    /// Open a netlink session, handing the bound socket to `wrap` first.
    ///
    /// Creates the netlink descriptor, derives the port id from the process
    /// id and binds the descriptor to it. The descriptor is closed again if
    /// any later step fails. `wrap` lets callers store the socket behind
    /// their own transport type, such as `Box<dyn Transport>`.
    pub fn open_netlink_with(
        config: &SessionConfig,
        wrap: impl FnOnce(NetlinkSocket) -> T,
    ) -> Result<Self> {
        let mut socket = NetlinkSocket::open(config.protocol)?;
        let port_id = process_port_id()?;
        socket.bind(port_id)?;
        Self::with_transport(wrap(socket), port_id, config)
    }
}

impl<T: Transport> Session<T> {
    /// Build a session over an already bound transport.
    pub fn with_transport(mut transport: T, port_id: u32, config: &SessionConfig) -> Result<Self> {
        if config.read_timeout.is_some() {
            transport.set_read_timeout(config.read_timeout)?;
        }
        if config.write_timeout.is_some() {
            transport.set_write_timeout(config.write_timeout)?;
        }

        info!(
            transport = transport.transport_name(),
            port_id, "rmnet control session opened"
        );

        Ok(Self {
            transport: Some(transport),
            port_id,
            sequence: config.initial_sequence,
            buf: BytesMut::with_capacity(FRAME_LEN),
        })
    }

    /// Release the transport descriptor.
    ///
    /// Safe to call more than once; later transactions fail with
    /// [`RmnetError::HandleClosed`].
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            info!(
                transport = transport.transport_name(),
                port_id = self.port_id,
                "rmnet control session closed"
            );
            drop(transport);
        }
    }

    /// Whether the transport descriptor is still held.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Port id requests are sent from.
    pub fn port_id(&self) -> u32 {
        self.port_id
    }

    /// Sequence number the next request will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Borrow the transport, if the session is open.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Set the receive timeout on the open transport.
    pub fn set_read_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(RmnetError::HandleClosed)?;
        transport.set_read_timeout(timeout)?;
        Ok(())
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field(
                "transport",
                &self.transport.as_ref().map(|t| t.transport_name()),
            )
            .field("port_id", &self.port_id)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// The process id, used as this process's netlink port id.
///
/// Port id 0 addresses the kernel and cannot identify a user process.
pub fn process_port_id() -> Result<u32> {
    let pid = std::process::id();
    if pid == 0 {
        return Err(RmnetError::ProcessId(pid));
    }
    debug!(pid, "derived netlink port id");
    Ok(pid)
}
