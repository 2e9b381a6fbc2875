use std::os::raw::{c_char, c_int};

use rmnetctl_frame::{
    DeviceName, EgressFormat, EndpointId, KernelStatus, LogicalEpConfig, OperatingMode,
};
use rmnetctl_session::{Association, ErrorCode, QueryReply, Session, VndAction};

use crate::args::{optional_str_arg, out_arg, out_buf, required_str_arg, write_name};
use crate::error::{self, Failure};
use crate::types::{
    BoxedTransport, RmnetctlHandle, RMNETCTL_DEVICE_ASSOCIATE, RMNETCTL_DEVICE_UNASSOCIATE,
    RMNETCTL_FREE_VND, RMNETCTL_INVALID_ARG, RMNETCTL_LIB_ERR, RMNETCTL_NEW_VND,
};

type OpResult = Result<KernelStatus, Failure>;

/// Shared shape of every operation entry point: check the sub-code
/// out-parameter and the handle, run `f`, then report.
///
/// # Safety
/// `hndl` must be null or a live handle from `rmnetctl_init`; `error_code`
/// must be null or valid for writes.
unsafe fn with_session(
    hndl: *mut RmnetctlHandle,
    error_code: *mut u16,
    f: impl FnOnce(&mut Session<BoxedTransport>) -> OpResult,
) -> c_int {
    crate::ffi_boundary(RMNETCTL_LIB_ERR, || {
        error::clear_error_state();

        if error_code.is_null() {
            error::set_error_message("error_code cannot be null");
            return RMNETCTL_INVALID_ARG;
        }

        let result = if hndl.is_null() {
            Err(Failure::new(
                ErrorCode::HndlInvalid,
                "rmnet handle cannot be null",
            ))
        } else {
            // SAFETY: Pointer validity is guaranteed by the caller.
            let handle = unsafe { &mut *hndl };
            f(&mut handle.session)
        };

        // SAFETY: Checked for null above.
        unsafe { error::report(error_code, result) }
    })
}

fn association(flag: u8) -> Result<Association, Failure> {
    match flag {
        RMNETCTL_DEVICE_ASSOCIATE => Ok(Association::Associate),
        RMNETCTL_DEVICE_UNASSOCIATE => Ok(Association::Unassociate),
        other => Err(Failure::new(
            ErrorCode::RequestInvalid,
            format!("assoc_dev must be 0 or 1, got {other}"),
        )),
    }
}

fn vnd_action(flag: u8) -> Result<VndAction, Failure> {
    match flag {
        RMNETCTL_NEW_VND => Ok(VndAction::Create),
        RMNETCTL_FREE_VND => Ok(VndAction::Free),
        other => Err(Failure::new(
            ErrorCode::RequestInvalid,
            format!("new_vnd must be 0 or 1, got {other}"),
        )),
    }
}

/// Register or unregister the driver on a device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_associate_network_device(
    hndl: *mut RmnetctlHandle,
    dev_name: *const c_char,
    error_code: *mut u16,
    assoc_dev: u8,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let action = association(assoc_dev)?;
            Ok(session.associate_network_device(dev_name, action)?)
        })
    }
}

/// Whether the driver is registered on a device; writes 1 or 0.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `register_status` and `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_get_network_device_associated(
    hndl: *mut RmnetctlHandle,
    dev_name: *const c_char,
    register_status: *mut c_int,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let register_status = out_arg(register_status, "register_status")?;
            *register_status = 0;
            match session.network_device_associated(dev_name)? {
                QueryReply::Data(registered) => {
                    *register_status = c_int::from(registered);
                    Ok(KernelStatus::Ok)
                }
                QueryReply::Status(status) => Ok(status),
            }
        })
    }
}

/// Set the egress data format of a device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_set_link_egress_data_format(
    hndl: *mut RmnetctlHandle,
    egress_flags: u32,
    agg_size: u16,
    agg_count: u16,
    dev_name: *const c_char,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let format = EgressFormat {
                flags: egress_flags,
                agg_size,
                agg_count,
            };
            Ok(session.set_link_egress_data_format(dev_name, format)?)
        })
    }
}

/// Egress data format of a device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. All output pointers must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_get_link_egress_data_format(
    hndl: *mut RmnetctlHandle,
    dev_name: *const c_char,
    egress_flags: *mut u32,
    agg_size: *mut u16,
    agg_count: *mut u16,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let egress_flags = out_arg(egress_flags, "egress_flags")?;
            let agg_size = out_arg(agg_size, "agg_size")?;
            let agg_count = out_arg(agg_count, "agg_count")?;
            match session.link_egress_data_format(dev_name)? {
                QueryReply::Data(format) => {
                    *egress_flags = format.flags;
                    *agg_size = format.agg_size;
                    *agg_count = format.agg_count;
                    Ok(KernelStatus::Ok)
                }
                QueryReply::Status(status) => Ok(status),
            }
        })
    }
}

/// Set the ingress data format of a device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_set_link_ingress_data_format(
    hndl: *mut RmnetctlHandle,
    ingress_flags: u32,
    dev_name: *const c_char,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            Ok(session.set_link_ingress_data_format(dev_name, ingress_flags)?)
        })
    }
}

/// Ingress data format of a device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `ingress_flags` and `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_get_link_ingress_data_format(
    hndl: *mut RmnetctlHandle,
    dev_name: *const c_char,
    ingress_flags: *mut u32,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let ingress_flags = out_arg(ingress_flags, "ingress_flags")?;
            match session.link_ingress_data_format(dev_name)? {
                QueryReply::Data(flags) => {
                    *ingress_flags = flags;
                    Ok(KernelStatus::Ok)
                }
                QueryReply::Status(status) => Ok(status),
            }
        })
    }
}

/// Configure a logical endpoint. `next_dev` may be null for mode none.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` and, if not
/// null, `next_dev` must be NUL-terminated strings. `error_code` must be
/// writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_set_logical_ep_config(
    hndl: *mut RmnetctlHandle,
    ep_id: i32,
    operating_mode: u8,
    dev_name: *const c_char,
    next_dev: *const c_char,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let next_dev = optional_str_arg(next_dev, "next_dev")?;
            let config = LogicalEpConfig::new(
                EndpointId::new(ep_id)?,
                DeviceName::new(dev_name)?,
                OperatingMode::from_wire(operating_mode)?,
                next_dev.map(DeviceName::new).transpose()?,
            )?;
            Ok(session.set_logical_ep_config(config)?)
        })
    }
}

/// Return a logical endpoint to its unconfigured state.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_unset_logical_ep_config(
    hndl: *mut RmnetctlHandle,
    ep_id: i32,
    dev_name: *const c_char,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            Ok(session.unset_logical_ep_config(ep_id, dev_name)?)
        })
    }
}

/// Configuration of a logical endpoint.
///
/// `next_dev` receives the NUL-terminated next-hop device name, or an empty
/// string when the mode has none. It is zero-filled on every call.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `dev_name` must be a
/// NUL-terminated string. `operating_mode` and `error_code` must be
/// writable, and `next_dev` writable for `next_dev_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn rmnet_get_logical_ep_config(
    hndl: *mut RmnetctlHandle,
    ep_id: i32,
    dev_name: *const c_char,
    operating_mode: *mut u8,
    next_dev: *mut c_char,
    next_dev_len: u32,
    error_code: *mut u16,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let dev_name = required_str_arg(dev_name, "dev_name")?;
            let operating_mode = out_arg(operating_mode, "operating_mode")?;
            let next_dev = out_buf(next_dev, next_dev_len, "next_dev")?;
            next_dev.fill(0);
            match session.logical_ep_config(ep_id, dev_name)? {
                QueryReply::Data(state) => {
                    write_name(next_dev, state.next_device.as_ref().map(DeviceName::as_str))?;
                    *operating_mode = state.mode as u8;
                    Ok(KernelStatus::Ok)
                }
                QueryReply::Status(status) => Ok(status),
            }
        })
    }
}

/// Create or free a virtual network device.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_new_vnd(
    hndl: *mut RmnetctlHandle,
    id: u32,
    error_code: *mut u16,
    new_vnd: u8,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            Ok(session.new_vnd(id, vnd_action(new_vnd)?)?)
        })
    }
}

/// Create a virtual network device named `<prefix><id>`, or free it.
/// `prefix` may be null, and is ignored when freeing.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `prefix` must be null or a
/// NUL-terminated string. `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_new_vnd_prefix(
    hndl: *mut RmnetctlHandle,
    id: u32,
    error_code: *mut u16,
    new_vnd: u8,
    prefix: *const c_char,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let action = vnd_action(new_vnd)?;
            let prefix = match action {
                VndAction::Create => optional_str_arg(prefix, "prefix")?,
                VndAction::Free => None,
            };
            Ok(session.new_vnd_prefix(id, action, prefix)?)
        })
    }
}

/// Resolve the name of a virtual network device into `buf`.
///
/// `buf` is zero-filled on every call; a name that does not fit with its
/// terminator fails with `RMNETCTL_API_ERR_STRING_TRUNCATION`.
///
/// # Safety
/// `hndl` must be a handle from `rmnetctl_init`. `buf` must be writable for
/// `buflen` bytes and `error_code` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rmnet_get_vnd_name(
    hndl: *mut RmnetctlHandle,
    id: u32,
    error_code: *mut u16,
    buf: *mut c_char,
    buflen: u32,
) -> c_int {
    // SAFETY: Forwarded from the caller.
    unsafe {
        with_session(hndl, error_code, |session| {
            let buf = out_buf(buf, buflen, "buf")?;
            Ok(session.vnd_name_into(id, buf)?)
        })
    }
}
