use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rmnetctl_frame::{
    egress, flag_names, ingress, DeviceName, EgressFormat, KernelStatus, LogicalEpState,
    OperatingMode,
};
use rmnetctl_session::{ErrorCode, Outcome, QueryReply};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Field/value rows for the table and pretty renderings.
pub trait DataRows {
    fn rows(&self) -> Vec<(&'static str, String)>;
}

impl DataRows for () {
    fn rows(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Outcome of one driver operation.
#[derive(Debug, Serialize)]
pub struct Report<T> {
    pub operation: &'static str,
    pub target: String,
    pub status: KernelStatus,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl Report<()> {
    pub fn status(operation: &'static str, target: impl Into<String>, status: KernelStatus) -> Self {
        Self {
            operation,
            target: target.into(),
            status,
            status_code: status.code(),
            data: None,
        }
    }
}

impl<T> Report<T> {
    pub fn query(operation: &'static str, target: impl Into<String>, reply: QueryReply<T>) -> Self {
        let status = reply.status();
        Self {
            operation,
            target: target.into(),
            status,
            status_code: status.code(),
            data: reply.data(),
        }
    }
}

impl<T: DataRows> Report<T> {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("operation", self.operation.to_string()),
            ("target", self.target.clone()),
            ("status", self.status.to_string()),
        ];
        if let Some(data) = &self.data {
            rows.extend(data.rows());
        }
        rows
    }
}

pub fn print_report<T: Serialize + DataRows>(report: &Report<T>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in report.rows() {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = report
                .rows()
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub associated: bool,
}

impl DataRows for Registered {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![("associated", self.associated.to_string())]
    }
}

#[derive(Debug, Serialize)]
pub struct EgressView {
    pub flags: u32,
    pub flag_names: Vec<&'static str>,
    pub agg_size: u16,
    pub agg_count: u16,
}

impl From<EgressFormat> for EgressView {
    fn from(format: EgressFormat) -> Self {
        Self {
            flags: format.flags,
            flag_names: flag_names(format.flags, &egress::NAMES),
            agg_size: format.agg_size,
            agg_count: format.agg_count,
        }
    }
}

impl DataRows for EgressView {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("flags", describe_flags(self.flags, &self.flag_names)),
            ("agg_size", self.agg_size.to_string()),
            ("agg_count", self.agg_count.to_string()),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct IngressView {
    pub flags: u32,
    pub flag_names: Vec<&'static str>,
}

impl From<u32> for IngressView {
    fn from(flags: u32) -> Self {
        Self {
            flags,
            flag_names: flag_names(flags, &ingress::NAMES),
        }
    }
}

impl DataRows for IngressView {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![("flags", describe_flags(self.flags, &self.flag_names))]
    }
}

#[derive(Debug, Serialize)]
pub struct EndpointView {
    pub mode: OperatingMode,
    pub next_device: Option<String>,
}

impl From<LogicalEpState> for EndpointView {
    fn from(state: LogicalEpState) -> Self {
        Self {
            mode: state.mode,
            next_device: state.next_device.map(|name| name.as_str().to_string()),
        }
    }
}

impl DataRows for EndpointView {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mode = match self.mode {
            OperatingMode::None => "none",
            OperatingMode::Vnd => "vnd",
            OperatingMode::Bridge => "bridge",
        };
        vec![
            ("mode", mode.to_string()),
            (
                "next_device",
                self.next_device.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct VndView {
    pub name: String,
}

impl From<DeviceName> for VndView {
    fn from(name: DeviceName) -> Self {
        Self {
            name: name.as_str().to_string(),
        }
    }
}

impl DataRows for VndView {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

fn describe_flags(flags: u32, names: &[&str]) -> String {
    if names.is_empty() {
        format!("{flags:#010x}")
    } else {
        format!("{flags:#010x} ({})", names.join(","))
    }
}

#[derive(Debug, Serialize)]
struct ErrorRow {
    code: u16,
    name: &'static str,
    outcome: Outcome,
    message: &'static str,
}

/// The sub-code table, in code order.
pub fn print_error_codes(format: OutputFormat) {
    let rows: Vec<ErrorRow> = ErrorCode::ALL
        .iter()
        .map(|code| ErrorRow {
            code: code.code(),
            name: code.name(),
            outcome: code.outcome(),
            message: code.message(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "NAME", "OUTCOME", "MESSAGE"]);
            for row in &rows {
                table.add_row(vec![
                    row.code.to_string(),
                    row.name.to_string(),
                    row.outcome.name().to_string(),
                    row.message.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!("{:>2} {} ({}): {}", row.code, row.name, row.outcome, row.message);
            }
        }
    }
}
