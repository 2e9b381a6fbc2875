//! Datagram transport abstraction for the rmnet control plane.
//!
//! The kernel driver is reached through a point-to-point datagram channel
//! addressed by a process-style port id:
//! - AF_NETLINK raw sockets (Linux), the channel the driver listens on
//! - Connected Unix datagram sockets, for user-space stand-ins of the driver
//!
//! This is the lowest layer of rmnetctl. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod datagram;
#[cfg(target_os = "linux")]
pub mod netlink;

pub use error::{Result, TransportError};
pub use traits::Transport;

#[cfg(target_os = "linux")]
pub use netlink::{NetlinkSocket, RMNET_NETLINK_PROTO};
