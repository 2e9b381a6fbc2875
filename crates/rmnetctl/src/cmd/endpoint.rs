use rmnetctl_frame::{EndpointId, LogicalEpConfig};

use crate::cmd::{device_name, open_session, Context, EndpointArgs, SetLepcArgs};
use crate::exit::{frame_error, rmnet_error, CliResult, SUCCESS};
use crate::output::{print_report, EndpointView, Report};

fn endpoint_id(id: i32) -> CliResult<EndpointId> {
    EndpointId::new(id).map_err(|err| frame_error("invalid endpoint id", err))
}

fn target(device: &str, ep_id: EndpointId) -> String {
    format!("{device}/{}", ep_id.get())
}

pub fn set(args: SetLepcArgs, ctx: &Context) -> CliResult<i32> {
    let ep_id = endpoint_id(args.ep_id)?;
    let device = device_name(&args.device)?;
    let next_device = args.next_dev.as_deref().map(device_name).transpose()?;
    let config = LogicalEpConfig::new(ep_id, device, args.mode.into(), next_device)
        .map_err(|err| frame_error("invalid endpoint configuration", err))?;
    let target = target(config.device.as_str(), ep_id);

    let mut session = open_session(ctx)?;
    let status = session
        .set_logical_ep_config(config)
        .map_err(|err| rmnet_error("set-lepc", err))?;

    print_report(&Report::status("set-lepc", target, status), ctx.format);
    Ok(SUCCESS)
}

pub fn unset(args: EndpointArgs, ctx: &Context) -> CliResult<i32> {
    let ep_id = endpoint_id(args.ep_id)?;
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let status = session
        .unset_logical_ep_config(ep_id.get(), device.as_str())
        .map_err(|err| rmnet_error("unset-lepc", err))?;

    print_report(
        &Report::status("unset-lepc", target(device.as_str(), ep_id), status),
        ctx.format,
    );
    Ok(SUCCESS)
}

pub fn get(args: EndpointArgs, ctx: &Context) -> CliResult<i32> {
    let ep_id = endpoint_id(args.ep_id)?;
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let reply = session
        .logical_ep_config(ep_id.get(), device.as_str())
        .map_err(|err| rmnet_error("get-lepc", err))?;

    let report = Report::query(
        "get-lepc",
        target(device.as_str(), ep_id),
        reply.map(EndpointView::from),
    );
    print_report(&report, ctx.format);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::INVALID_ARGUMENT;

    #[test]
    fn endpoint_ids_are_range_checked() {
        assert_eq!(endpoint_id(-1).unwrap(), EndpointId::DEFAULT);
        assert_eq!(endpoint_id(32).unwrap_err().code, INVALID_ARGUMENT);
        assert_eq!(endpoint_id(-2).unwrap_err().code, INVALID_ARGUMENT);
    }

    #[test]
    fn target_names_device_and_endpoint() {
        assert_eq!(target("rmnet_ipa0", EndpointId::DEFAULT), "rmnet_ipa0/-1");
    }
}
