use std::fmt;

use rmnetctl_frame::FrameError;
use rmnetctl_session::{Outcome, RmnetError};

// Exit codes mirror the library's coarse outcome.
pub const SUCCESS: i32 = 0;
#[cfg(any(test, not(target_os = "linux")))]
pub const LIBRARY_ERROR: i32 = Outcome::LibraryError as i32;
#[cfg(test)]
pub const KERNEL_ERROR: i32 = Outcome::KernelError as i32;
pub const INVALID_ARGUMENT: i32 = Outcome::InvalidArgument as i32;
pub const USAGE: i32 = 64;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn rmnet_error(context: &str, err: RmnetError) -> CliError {
    let code = err.code();
    CliError::new(
        err.outcome().code(),
        format!("{context}: {err} [{}]", code.name()),
    )
}

/// Arguments rejected while building a request, before any I/O.
pub fn frame_error(context: &str, err: FrameError) -> CliError {
    rmnet_error(context, RmnetError::from(err))
}
