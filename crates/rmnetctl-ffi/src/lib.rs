//! rmnetctl-ffi: C-ABI exports mirroring the classic `librmnetctl` API.
//!
//! Every operation returns a coarse outcome (`RMNETCTL_SUCCESS`,
//! `RMNETCTL_LIB_ERR`, `RMNETCTL_KERNEL_ERR`, `RMNETCTL_INVALID_ARG`) and
//! writes a sub-code to `error_code`. When the driver refuses a request the
//! outcome is still `RMNETCTL_SUCCESS`; the sub-code is then
//! `RMNETCTL_API_ERR_ENUM_LENGTH` plus the kernel return code.

mod args;
mod error;
mod ops;
mod types;

use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;

use rmnetctl_frame::KernelStatus;
use rmnetctl_session::{ErrorCode, Session};

pub use ops::{
    rmnet_associate_network_device, rmnet_get_link_egress_data_format,
    rmnet_get_link_ingress_data_format, rmnet_get_logical_ep_config,
    rmnet_get_network_device_associated, rmnet_get_vnd_name, rmnet_new_vnd,
    rmnet_new_vnd_prefix, rmnet_set_link_egress_data_format, rmnet_set_link_ingress_data_format,
    rmnet_set_logical_ep_config, rmnet_unset_logical_ep_config,
};
pub use types::{
    RmnetctlHandle, RMNETCTL_API_ERR_ENUM_LENGTH, RMNETCTL_DEVICE_ASSOCIATE,
    RMNETCTL_DEVICE_UNASSOCIATE, RMNETCTL_ERR_MSG_SIZE, RMNETCTL_FREE_VND, RMNETCTL_INVALID_ARG,
    RMNETCTL_KERNEL_ERR, RMNETCTL_LIB_ERR, RMNETCTL_NEW_VND, RMNETCTL_SUCCESS,
};

use crate::error::Failure;
use crate::types::BoxedTransport;

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

#[cfg(target_os = "linux")]
fn open_session() -> Result<Session<BoxedTransport>, Failure> {
    let config = rmnetctl_session::SessionConfig::default();
    Ok(Session::open_netlink_with(&config, |socket| {
        Box::new(socket) as BoxedTransport
    })?)
}

#[cfg(not(target_os = "linux"))]
fn open_session() -> Result<Session<BoxedTransport>, Failure> {
    Err(Failure::new(
        ErrorCode::NetlinkFd,
        "netlink sockets are only available on Linux",
    ))
}

/// Open a session with the driver and hand back its handle.
///
/// The session binds to the process id, so a process holds at most one
/// open handle: a second `rmnetctl_init` before `rmnetctl_cleanup` fails
/// with `RMNETCTL_INIT_ERR_BIND`. Threads share the one handle and must
/// serialize calls on it.
///
/// # Safety
/// `hndl` must be writable; on success it receives a handle that must be
/// released with `rmnetctl_cleanup`. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnetctl_init(
    hndl: *mut *mut RmnetctlHandle,
    error_code: *mut u16,
) -> c_int {
    ffi_boundary(RMNETCTL_LIB_ERR, || {
        error::clear_error_state();

        if error_code.is_null() {
            error::set_error_message("error_code cannot be null");
            return RMNETCTL_INVALID_ARG;
        }

        let result = if hndl.is_null() {
            Err(Failure::new(
                ErrorCode::HndlInvalid,
                "hndl cannot be null",
            ))
        } else {
            // SAFETY: Checked for null above; validity is guaranteed by the caller.
            unsafe { *hndl = std::ptr::null_mut() };
            open_session().map(|session| {
                let handle = Box::new(RmnetctlHandle::new(session));
                // SAFETY: Checked for null above.
                unsafe { *hndl = Box::into_raw(handle) };
                KernelStatus::Ok
            })
        };

        // SAFETY: Checked for null above.
        unsafe { error::report(error_code, result) }
    })
}

/// Close the session and free the handle.
///
/// # Safety
/// `hndl` must be null or a handle from `rmnetctl_init` that has not been
/// cleaned up yet.
#[no_mangle]
pub unsafe extern "C" fn rmnetctl_cleanup(hndl: *mut RmnetctlHandle) {
    ffi_boundary((), || {
        if hndl.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by rmnetctl_init.
        let mut handle = unsafe { Box::from_raw(hndl) };
        handle.session.close();
    });
}

/// Fixed diagnostic text for a sub-code.
///
/// Codes below `RMNETCTL_API_ERR_ENUM_LENGTH` are library sub-codes; codes
/// at or above it carry a kernel return code and map to the driver's status
/// text. The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn rmnetctl_error_text(error_code: u16) -> *const c_char {
    ffi_boundary(std::ptr::null(), || {
        let text = match error_code.checked_sub(RMNETCTL_API_ERR_ENUM_LENGTH) {
            Some(status) => KernelStatus::from_wire(status).c_message(),
            None => match ErrorCode::from_code(error_code) {
                Some(code) => code.c_message(),
                None => return std::ptr::null(),
            },
        };
        text.as_ptr()
    })
}

/// Detailed message for the last failure on the calling thread.
///
/// Valid until the next call into this library from the same thread.
#[no_mangle]
pub extern "C" fn rmnetctl_last_error() -> *const c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
