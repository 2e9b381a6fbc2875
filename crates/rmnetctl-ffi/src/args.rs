use std::ffi::CStr;
use std::os::raw::c_char;

use rmnetctl_session::ErrorCode;

use crate::error::Failure;

/// Convert a required C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn required_str_arg<'a>(
    value: *const c_char,
    name: &str,
) -> Result<&'a str, Failure> {
    // SAFETY: Forwarded from the caller.
    unsafe { optional_str_arg(value, name) }?.ok_or_else(|| {
        Failure::new(ErrorCode::RequestNull, format!("{name} cannot be null"))
    })
}

/// Convert an optional C string argument into UTF-8 `&str`.
///
/// # Safety
/// `value` must be null or point to a valid NUL-terminated C string.
pub(crate) unsafe fn optional_str_arg<'a>(
    value: *const c_char,
    name: &str,
) -> Result<Option<&'a str>, Failure> {
    if value.is_null() {
        return Ok(None);
    }

    let as_cstr = {
        // SAFETY: The caller guarantees `value` points to a valid NUL-terminated C string.
        unsafe { CStr::from_ptr(value) }
    };

    as_cstr.to_str().map(Some).map_err(|_| {
        Failure::new(ErrorCode::RequestInvalid, format!("{name} must be valid UTF-8"))
    })
}

/// Borrow a required output pointer.
///
/// # Safety
/// `value` must be null or valid for writes for the duration of the call.
pub(crate) unsafe fn out_arg<'a, T>(value: *mut T, name: &str) -> Result<&'a mut T, Failure> {
    if value.is_null() {
        return Err(Failure::new(
            ErrorCode::ResponseNull,
            format!("{name} cannot be null"),
        ));
    }
    // SAFETY: Checked for null above; validity is guaranteed by the caller.
    Ok(unsafe { &mut *value })
}

/// Borrow a caller-provided character buffer.
///
/// # Safety
/// `buf` must be null or writable for `len` bytes for the duration of the call.
pub(crate) unsafe fn out_buf<'a>(
    buf: *mut c_char,
    len: u32,
    name: &str,
) -> Result<&'a mut [u8], Failure> {
    if buf.is_null() {
        return Err(Failure::new(
            ErrorCode::ResponseNull,
            format!("{name} cannot be null"),
        ));
    }
    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Ok(unsafe { std::slice::from_raw_parts_mut(buf.cast::<u8>(), len as usize) })
}

/// Copy a name into a zero-filled caller buffer, NUL-terminated.
pub(crate) fn write_name(buf: &mut [u8], name: Option<&str>) -> Result<(), Failure> {
    buf.fill(0);
    let Some(name) = name else {
        return Ok(());
    };
    if name.len() + 1 > buf.len() {
        return Err(Failure::new(
            ErrorCode::StringTruncation,
            format!(
                "name needs {} bytes, buffer holds {}",
                name.len() + 1,
                buf.len()
            ),
        ));
    }
    buf[..name.len()].copy_from_slice(name.as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_inputs_and_outputs_are_classified() {
        // SAFETY: Null is an accepted input.
        let err = unsafe { required_str_arg(std::ptr::null(), "dev_name") }.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestNull);

        // SAFETY: Null is an accepted input.
        let err = unsafe { out_arg::<u32>(std::ptr::null_mut(), "flags") }.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResponseNull);

        // SAFETY: Null is an accepted input.
        assert!(unsafe { optional_str_arg(std::ptr::null(), "next_dev") }
            .unwrap()
            .is_none());
    }

    #[test]
    fn write_name_zero_fills_on_failure() {
        let mut buf = [0x55u8; 3];
        let err = write_name(&mut buf, Some("wwan5")).unwrap_err();
        assert_eq!(err.code, ErrorCode::StringTruncation);
        assert_eq!(buf, [0, 0, 0]);

        let mut buf = [0x55u8; 8];
        write_name(&mut buf, Some("wwan5")).unwrap();
        assert_eq!(&buf, b"wwan5\0\0\0");
    }
}
