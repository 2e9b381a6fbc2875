use rmnetctl_session::VndAction;

use crate::cmd::{device_name, open_session, Context, NewVndArgs, VndArgs};
use crate::exit::{rmnet_error, CliResult, SUCCESS};
use crate::output::{print_report, Report, VndView};

pub fn create(args: NewVndArgs, ctx: &Context) -> CliResult<i32> {
    let prefix = args.prefix.as_deref().map(device_name).transpose()?;
    let mut session = open_session(ctx)?;
    let status = session
        .new_vnd_prefix(
            args.id,
            VndAction::Create,
            prefix.as_ref().map(|prefix| prefix.as_str()),
        )
        .map_err(|err| rmnet_error("new-vnd", err))?;

    print_report(&Report::status("new-vnd", args.id.to_string(), status), ctx.format);
    Ok(SUCCESS)
}

pub fn free(args: VndArgs, ctx: &Context) -> CliResult<i32> {
    let mut session = open_session(ctx)?;
    let status = session
        .new_vnd(args.id, VndAction::Free)
        .map_err(|err| rmnet_error("free-vnd", err))?;

    print_report(&Report::status("free-vnd", args.id.to_string(), status), ctx.format);
    Ok(SUCCESS)
}

pub fn name(args: VndArgs, ctx: &Context) -> CliResult<i32> {
    let mut session = open_session(ctx)?;
    let reply = session
        .vnd_name(args.id)
        .map_err(|err| rmnet_error("vnd-name", err))?;

    let report = Report::query("vnd-name", args.id.to_string(), reply.map(VndView::from));
    print_report(&report, ctx.format);
    Ok(SUCCESS)
}
