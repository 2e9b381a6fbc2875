use rmnetctl_session::Association;
use tracing::info;

use crate::cmd::{device_name, open_session, Context, DeviceArgs};
use crate::exit::{rmnet_error, CliResult, SUCCESS};
use crate::output::{print_report, Registered, Report};

pub fn associate(args: DeviceArgs, ctx: &Context) -> CliResult<i32> {
    set_association(args, ctx, Association::Associate, "assoc")
}

pub fn unassociate(args: DeviceArgs, ctx: &Context) -> CliResult<i32> {
    set_association(args, ctx, Association::Unassociate, "unassoc")
}

fn set_association(
    args: DeviceArgs,
    ctx: &Context,
    action: Association,
    operation: &'static str,
) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let status = session
        .associate_network_device(device.as_str(), action)
        .map_err(|err| rmnet_error(operation, err))?;
    info!(device = %device, ?action, %status, "association updated");

    print_report(&Report::status(operation, device.as_str(), status), ctx.format);
    Ok(SUCCESS)
}

pub fn query(args: DeviceArgs, ctx: &Context) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let reply = session
        .network_device_associated(device.as_str())
        .map_err(|err| rmnet_error("query", err))?;

    let report = Report::query(
        "query",
        device.as_str(),
        reply.map(|associated| Registered { associated }),
    );
    print_report(&report, ctx.format);
    Ok(SUCCESS)
}
