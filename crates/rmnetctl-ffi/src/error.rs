use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use rmnetctl_frame::{FrameError, KernelStatus};
use rmnetctl_session::{ErrorCode, Outcome, RmnetError};
use rmnetctl_transport::TransportError;

use crate::types::RMNETCTL_API_ERR_ENUM_LENGTH;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let message = message.into();
    let sanitized = message.replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}

/// A classified failure on its way to the C caller.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) code: ErrorCode,
    message: String,
}

impl Failure {
    pub(crate) fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RmnetError> for Failure {
    fn from(err: RmnetError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

impl From<TransportError> for Failure {
    fn from(err: TransportError) -> Self {
        RmnetError::from(err).into()
    }
}

impl From<FrameError> for Failure {
    fn from(err: FrameError) -> Self {
        RmnetError::from(err).into()
    }
}

/// Sub-code reported for a driver refusal: the kernel return code offset
/// past the library's own codes.
pub(crate) fn kernel_status_code(status: KernelStatus) -> u16 {
    RMNETCTL_API_ERR_ENUM_LENGTH.saturating_add(status.code())
}

/// Write the sub-code and produce the coarse outcome.
///
/// A driver refusal is still a completed transaction: the outcome is
/// success and the sub-code carries the kernel return code.
///
/// # Safety
/// `error_code` must be null or valid for writes.
pub(crate) unsafe fn report(error_code: *mut u16, result: Result<KernelStatus, Failure>) -> c_int {
    let (outcome, code) = match result {
        Ok(status) if status.is_ok() => (Outcome::Success, ErrorCode::Success.code()),
        Ok(status) => {
            set_error_message(format!("driver refused the request: {status}"));
            (Outcome::Success, kernel_status_code(status))
        }
        Err(failure) => {
            set_error_message(failure.message);
            (failure.code.outcome(), failure.code.code())
        }
    };

    if !error_code.is_null() {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe {
            *error_code = code;
        }
    }
    outcome.code()
}
