use rmnetctl_frame::EgressFormat;

use crate::cmd::{device_name, open_session, Context, DeviceArgs, SetEgressArgs, SetIngressArgs};
use crate::exit::{rmnet_error, CliResult, SUCCESS};
use crate::output::{print_report, EgressView, IngressView, Report};

pub fn set_egress(args: SetEgressArgs, ctx: &Context) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let format = EgressFormat {
        flags: args.flags,
        agg_size: args.agg_size,
        agg_count: args.agg_count,
    };
    let mut session = open_session(ctx)?;
    let status = session
        .set_link_egress_data_format(device.as_str(), format)
        .map_err(|err| rmnet_error("set-egress", err))?;

    print_report(&Report::status("set-egress", device.as_str(), status), ctx.format);
    Ok(SUCCESS)
}

pub fn get_egress(args: DeviceArgs, ctx: &Context) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let reply = session
        .link_egress_data_format(device.as_str())
        .map_err(|err| rmnet_error("get-egress", err))?;

    let report = Report::query("get-egress", device.as_str(), reply.map(EgressView::from));
    print_report(&report, ctx.format);
    Ok(SUCCESS)
}

pub fn set_ingress(args: SetIngressArgs, ctx: &Context) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let status = session
        .set_link_ingress_data_format(device.as_str(), args.flags)
        .map_err(|err| rmnet_error("set-ingress", err))?;

    print_report(&Report::status("set-ingress", device.as_str(), status), ctx.format);
    Ok(SUCCESS)
}

pub fn get_ingress(args: DeviceArgs, ctx: &Context) -> CliResult<i32> {
    let device = device_name(&args.device)?;
    let mut session = open_session(ctx)?;
    let reply = session
        .link_ingress_data_format(device.as_str())
        .map_err(|err| rmnet_error("get-ingress", err))?;

    let report = Report::query("get-ingress", device.as_str(), reply.map(IngressView::from));
    print_report(&report, ctx.format);
    Ok(SUCCESS)
}
