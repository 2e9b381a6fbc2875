use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("rmnetctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: rmnetctl");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("RMNETCTL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("RMNETCTL_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("netlink_protocol: {}", rmnetctl_session::DEFAULT_PROTOCOL);
    println!("error_codes: {}", rmnetctl_session::ErrorCode::COUNT);

    Ok(SUCCESS)
}
