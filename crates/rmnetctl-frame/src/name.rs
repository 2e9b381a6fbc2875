use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{FrameError, Result};

/// Size of every fixed string buffer in the control message, terminator included.
pub const MAX_NAME_LEN: usize = 16;

/// A network device name (or name prefix) that fits a fixed wire buffer.
///
/// Holds 1 to `MAX_NAME_LEN - 1` printable ASCII bytes, so the encoded
/// field always carries a NUL terminator. Construction is the only place a
/// name is checked; encoding never truncates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceName(String);

impl DeviceName {
    /// Validate `name` for the wire.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(FrameError::InvalidName("name is empty"));
        }
        if name.len() >= MAX_NAME_LEN {
            return Err(FrameError::StringTruncation {
                len: name.len(),
                max: MAX_NAME_LEN - 1,
            });
        }
        if !name.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(FrameError::InvalidName(
                "name must be printable ASCII without spaces",
            ));
        }
        Ok(Self(name.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes, terminator excluded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; names are never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The NUL-padded wire field for this name.
    pub fn to_field(&self) -> [u8; MAX_NAME_LEN] {
        let mut field = [0u8; MAX_NAME_LEN];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }

    /// Read a name from a fixed wire field.
    ///
    /// Returns `Ok(None)` for an empty (all-NUL) field. The terminator must
    /// appear within `MAX_NAME_LEN` bytes; bytes after it are ignored.
    pub fn from_field(field: &[u8]) -> Result<Option<Self>> {
        let window = &field[..field.len().min(MAX_NAME_LEN)];
        let Some(end) = window.iter().position(|&b| b == 0) else {
            return Err(FrameError::Unterminated);
        };
        if end == 0 {
            return Ok(None);
        }
        let text = std::str::from_utf8(&window[..end])
            .map_err(|_| FrameError::InvalidName("name is not ASCII"))?;
        Self::new(text).map(Some)
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceName {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for DeviceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
