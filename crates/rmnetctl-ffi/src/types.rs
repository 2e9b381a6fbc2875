use std::os::raw::c_int;

use rmnetctl_session::{ErrorCode, Session};
use rmnetctl_transport::Transport;

pub const RMNETCTL_SUCCESS: c_int = 0;
pub const RMNETCTL_LIB_ERR: c_int = 1;
pub const RMNETCTL_KERNEL_ERR: c_int = 2;
pub const RMNETCTL_INVALID_ARG: c_int = 3;

pub const RMNETCTL_DEVICE_ASSOCIATE: u8 = 1;
pub const RMNETCTL_DEVICE_UNASSOCIATE: u8 = 0;
pub const RMNETCTL_NEW_VND: u8 = 1;
pub const RMNETCTL_FREE_VND: u8 = 0;

/// Number of library sub-codes. Sub-codes at or above this value carry a
/// kernel return code, offset by this value.
pub const RMNETCTL_API_ERR_ENUM_LENGTH: u16 = ErrorCode::COUNT as u16;

/// Upper bound on the length of any diagnostic string, terminator included.
pub const RMNETCTL_ERR_MSG_SIZE: usize = 100;

pub(crate) type BoxedTransport = Box<dyn Transport + Send>;

/// Opaque session handle handed to C callers.
pub struct RmnetctlHandle {
    pub(crate) session: Session<BoxedTransport>,
}

impl RmnetctlHandle {
    pub(crate) fn new(session: Session<BoxedTransport>) -> Self {
        Self { session }
    }
}
