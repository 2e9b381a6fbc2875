use crate::cmd::Context;
use crate::exit::{CliResult, SUCCESS};
use crate::output::print_error_codes;

pub fn run(ctx: &Context) -> CliResult<i32> {
    print_error_codes(ctx.format);
    Ok(SUCCESS)
}
