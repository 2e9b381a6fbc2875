use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use rmnetctl_frame::{egress, ingress, DeviceName, OperatingMode};
use rmnetctl_session::Session;
use rmnetctl_transport::Transport;

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod device;
pub mod endpoint;
pub mod errors;
pub mod format;
pub mod version;
pub mod vnd;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register the driver on a physical device.
    Assoc(DeviceArgs),
    /// Unregister the driver from a physical device.
    Unassoc(DeviceArgs),
    /// Report whether the driver is registered on a device.
    Query(DeviceArgs),
    /// Set the egress data format of a device.
    SetEgress(SetEgressArgs),
    /// Show the egress data format of a device.
    GetEgress(DeviceArgs),
    /// Set the ingress data format of a device.
    SetIngress(SetIngressArgs),
    /// Show the ingress data format of a device.
    GetIngress(DeviceArgs),
    /// Configure a logical endpoint.
    SetLepc(SetLepcArgs),
    /// Reset a logical endpoint to unconfigured.
    UnsetLepc(EndpointArgs),
    /// Show a logical endpoint's configuration.
    GetLepc(EndpointArgs),
    /// Create a virtual network device.
    NewVnd(NewVndArgs),
    /// Free a virtual network device.
    FreeVnd(VndArgs),
    /// Show the name of a virtual network device.
    VndName(VndArgs),
    /// List library error codes.
    Errors,
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub timeout: Option<Duration>,
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Assoc(args) => device::associate(args, ctx),
        Command::Unassoc(args) => device::unassociate(args, ctx),
        Command::Query(args) => device::query(args, ctx),
        Command::SetEgress(args) => format::set_egress(args, ctx),
        Command::GetEgress(args) => format::get_egress(args, ctx),
        Command::SetIngress(args) => format::set_ingress(args, ctx),
        Command::GetIngress(args) => format::get_ingress(args, ctx),
        Command::SetLepc(args) => endpoint::set(args, ctx),
        Command::UnsetLepc(args) => endpoint::unset(args, ctx),
        Command::GetLepc(args) => endpoint::get(args, ctx),
        Command::NewVnd(args) => vnd::create(args, ctx),
        Command::FreeVnd(args) => vnd::free(args, ctx),
        Command::VndName(args) => vnd::name(args, ctx),
        Command::Errors => errors::run(ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Physical device name (at most 15 bytes).
    pub device: String,
}

#[derive(Args, Debug)]
pub struct SetEgressArgs {
    pub device: String,
    /// Egress flags: names (map, aggregation, muxing, map-cksumv3, map-cksumv4) or a number.
    #[arg(long, value_name = "FLAGS", value_parser = parse_egress_flags)]
    pub flags: u32,
    /// Maximum aggregated packet size in bytes.
    #[arg(long, default_value_t = 0)]
    pub agg_size: u16,
    /// Maximum packets per aggregate.
    #[arg(long, default_value_t = 0)]
    pub agg_count: u16,
}

#[derive(Args, Debug)]
pub struct SetIngressArgs {
    pub device: String,
    /// Ingress flags: names (fix-ethernet, map, deaggregation, demuxing,
    /// map-commands, map-cksumv3, map-cksumv4) or a number.
    #[arg(long, value_name = "FLAGS", value_parser = parse_ingress_flags)]
    pub flags: u32,
}

#[derive(Args, Debug)]
pub struct EndpointArgs {
    pub device: String,
    /// Logical endpoint id; -1 is the default endpoint.
    #[arg(allow_negative_numbers = true)]
    pub ep_id: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    None,
    Vnd,
    Bridge,
}

impl From<ModeArg> for OperatingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::None => OperatingMode::None,
            ModeArg::Vnd => OperatingMode::Vnd,
            ModeArg::Bridge => OperatingMode::Bridge,
        }
    }
}

#[derive(Args, Debug)]
pub struct SetLepcArgs {
    pub device: String,
    /// Logical endpoint id; -1 is the default endpoint.
    #[arg(allow_negative_numbers = true)]
    pub ep_id: i32,
    /// Forwarding mode.
    #[arg(long, value_enum)]
    pub mode: ModeArg,
    /// Next-hop device; required for vnd and bridge modes.
    #[arg(long, value_name = "DEVICE")]
    pub next_dev: Option<String>,
}

#[derive(Args, Debug)]
pub struct NewVndArgs {
    /// Virtual device id.
    pub id: u32,
    /// Name prefix; the device is named <PREFIX><ID>.
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args, Debug)]
pub struct VndArgs {
    /// Virtual device id.
    pub id: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub type CliSession = Session<Box<dyn Transport>>;

#[cfg(target_os = "linux")]
pub fn open_session(ctx: &Context) -> CliResult<CliSession> {
    let config = rmnetctl_session::SessionConfig {
        read_timeout: ctx.timeout,
        ..rmnetctl_session::SessionConfig::default()
    };
    Session::open_netlink_with(&config, |socket| Box::new(socket) as Box<dyn Transport>)
        .map_err(|err| crate::exit::rmnet_error("cannot open driver session", err))
}

#[cfg(not(target_os = "linux"))]
pub fn open_session(_ctx: &Context) -> CliResult<CliSession> {
    Err(CliError::new(
        crate::exit::LIBRARY_ERROR,
        "cannot open driver session: netlink sockets are only available on Linux",
    ))
}

/// Validate a device name before any I/O.
pub fn device_name(name: &str) -> CliResult<DeviceName> {
    DeviceName::new(name).map_err(|err| frame_error(&format!("invalid device name {name:?}"), err))
}

pub fn parse_timeout(input: Option<&str>) -> CliResult<Option<Duration>> {
    let Some(input) = input else {
        return Ok(None);
    };
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(Some(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    }))
}

fn parse_egress_flags(input: &str) -> Result<u32, String> {
    parse_flags(input, &egress::NAMES)
}

fn parse_ingress_flags(input: &str) -> Result<u32, String> {
    parse_flags(input, &ingress::NAMES)
}

/// Comma-separated flag names and numbers (decimal or 0x hex), ORed together.
fn parse_flags(input: &str, table: &[(u32, &str)]) -> Result<u32, String> {
    let mut flags = 0u32;
    for token in input.split(',').map(str::trim) {
        if token.is_empty() {
            return Err(format!("empty flag in {input:?}"));
        }
        let bits = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u32::from_str_radix(hex, 16).map_err(|_| format!("invalid hex flags {token:?}"))?
        } else if token.bytes().all(|b| b.is_ascii_digit()) {
            token
                .parse()
                .map_err(|_| format!("invalid flags {token:?}"))?
        } else {
            table
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(token))
                .map(|(bit, _)| *bit)
                .ok_or_else(|| {
                    let known: Vec<&str> = table.iter().map(|(_, name)| *name).collect();
                    format!("unknown flag {token:?} (expected one of {})", known.join(", "))
                })?
        };
        flags |= bits;
    }
    Ok(flags)
}
