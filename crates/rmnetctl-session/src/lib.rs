//! Session handle and typed operations for the rmnet control plane.
//!
//! A [`Session`] owns one bound datagram channel to the driver and runs
//! strictly serialized request/response transactions over it. Each typed
//! operation validates its arguments, runs one transaction and hands back
//! the driver's answer; failures to complete a transaction are classified
//! by [`ErrorCode`] and [`Outcome`].
//!
//! ```no_run
//! use rmnetctl_session::{Association, NetlinkSession};
//!
//! # fn main() -> rmnetctl_session::Result<()> {
//! let mut session = NetlinkSession::open()?;
//! let status = session.associate_network_device("rmnet_data0", Association::Associate)?;
//! println!("driver answered: {status}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod session;
mod transaction;

#[cfg(test)]
mod stub;

pub use api::{Association, QueryReply, VndAction};
pub use classify::{error_text, ErrorCode, Outcome};
pub use config::{SessionConfig, DEFAULT_INITIAL_SEQUENCE, DEFAULT_PROTOCOL};
pub use error::{Result, RmnetError};
pub use session::{process_port_id, Session};

#[cfg(target_os = "linux")]
pub use session::NetlinkSession;

pub use rmnetctl_frame as frame;
pub use rmnetctl_transport as transport;
