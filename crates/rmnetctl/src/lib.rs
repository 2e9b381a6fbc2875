//! Control-plane client for the rmnet data driver.
//!
//! rmnetctl configures the kernel's rmnet data path over its private
//! netlink protocol: registering the driver on physical devices, setting
//! link data formats, wiring logical endpoints, and creating virtual
//! network devices.
//!
//! # Crate Structure
//!
//! - [`transport`]: Datagram transport contract and the netlink socket
//! - [`frame`]: Wire codec for control messages
//! - [`session`]: Session handle, transactions, typed operations and error classification

/// Re-export transport types.
pub mod transport {
    pub use rmnetctl_transport::*;
}

/// Re-export codec types.
pub mod frame {
    pub use rmnetctl_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use rmnetctl_session::*;
}

pub use rmnetctl_frame::{
    DeviceName, EgressFormat, EndpointId, KernelStatus, LogicalEpConfig, LogicalEpState,
    OperatingMode,
};
pub use rmnetctl_session::{
    Association, ErrorCode, Outcome, QueryReply, RmnetError, Session, SessionConfig, VndAction,
};

#[cfg(target_os = "linux")]
pub use rmnetctl_session::NetlinkSession;
