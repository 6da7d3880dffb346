use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use servoprobe::sequence::{SequenceReport, StepReport, StepStatus};
use servoprobe::transport::{PortInfo, PortMatcher};

/// Longest response text shown in human-readable output.
const PREVIEW_CHARS: usize = 100;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StepOutput<'a> {
    label: &'a str,
    command: &'a str,
    status: &'static str,
    response: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> From<&'a StepReport> for StepOutput<'a> {
    fn from(step: &'a StepReport) -> Self {
        Self {
            label: &step.label,
            command: &step.command,
            status: step.status.as_str(),
            response: step.response.as_deref(),
            error: step.error.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    schema_id: &'static str,
    #[serde(flatten)]
    step: StepOutput<'a>,
}

#[derive(Serialize)]
struct SequenceOutput<'a> {
    schema_id: &'static str,
    name: &'a str,
    elapsed_ms: u128,
    commands_sent: usize,
    rate_per_second: f64,
    cancelled: bool,
    steps: Vec<StepOutput<'a>>,
}

impl<'a> From<&'a SequenceReport> for SequenceOutput<'a> {
    fn from(report: &'a SequenceReport) -> Self {
        Self {
            schema_id: "servoprobe/cli/v1/sequence-report",
            name: &report.name,
            elapsed_ms: report.elapsed.as_millis(),
            commands_sent: report.sent_count(),
            rate_per_second: report.rate_per_second(),
            cancelled: report.cancelled,
            steps: report.steps.iter().map(StepOutput::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct SuiteOutput<'a> {
    schema_id: &'static str,
    sequences: Vec<SequenceOutput<'a>>,
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    description: &'a str,
    kind: &'static str,
    matched: bool,
}

#[derive(Serialize)]
struct PortListOutput<'a> {
    schema_id: &'static str,
    matcher: &'a str,
    ports: Vec<PortOutput<'a>>,
}

/// Print the outcome of a single command/response exchange.
pub fn print_step(step: &StepReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                schema_id: "servoprobe/cli/v1/exchange",
                step: StepOutput::from(step),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = steps_table();
            add_step_row(&mut table, step);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", step_line(step)),
        OutputFormat::Raw => {
            if let Some(response) = &step.response {
                print_raw(response.as_bytes());
                print_raw(b"\n");
            }
        }
    }
}

/// Print one sequence report.
pub fn print_report(report: &SequenceReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SequenceOutput::from(report)),
        OutputFormat::Table => {
            println!("{}", banner(&report.name));
            let mut table = steps_table();
            for step in &report.steps {
                add_step_row(&mut table, step);
            }
            println!("{table}");
            println!("{}", summary_line(report));
        }
        OutputFormat::Pretty => {
            println!("{}", banner(&report.name));
            for step in &report.steps {
                println!("{:<26} {}", step.label, step_line(step));
            }
            println!("{}", summary_line(report));
        }
        OutputFormat::Raw => {
            for step in &report.steps {
                if let Some(response) = &step.response {
                    println!("{response}");
                }
            }
        }
    }
}

/// Print the reports of a full suite run.
pub fn print_suite(reports: &[SequenceReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SuiteOutput {
                schema_id: "servoprobe/cli/v1/suite-report",
                sequences: reports.iter().map(SequenceOutput::from).collect(),
            };
            print_json(&out);
        }
        _ => {
            let total = reports.len();
            for (idx, report) in reports.iter().enumerate() {
                if !matches!(format, OutputFormat::Raw) {
                    println!("\n[TEST {}/{total}] {}", idx + 1, report.name);
                }
                print_report(report, format);
            }
        }
    }
}

/// Print the enumerated serial ports, marking those accepted by `matcher`.
pub fn print_ports(ports: &[PortInfo], matcher: &PortMatcher, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PortListOutput {
                schema_id: "servoprobe/cli/v1/port-list",
                matcher: matcher.label(),
                ports: ports
                    .iter()
                    .map(|p| PortOutput {
                        name: &p.name,
                        description: &p.description,
                        kind: p.kind.as_str(),
                        matched: matcher.matches(p),
                    })
                    .collect(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "DESCRIPTION", "MATCH"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.as_str().to_string(),
                    port.description.clone(),
                    if matcher.matches(port) { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                let mark = if matcher.matches(port) { "*" } else { " " };
                println!("{mark} {:<20} {}", port.name, port.description);
            }
        }
        OutputFormat::Raw => {
            for port in ports {
                println!("{}", port.name);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn steps_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["STEP", "COMMAND", "STATUS", "RESPONSE"]);
    table
}

fn add_step_row(table: &mut Table, step: &StepReport) {
    table.add_row(vec![
        step.label.clone(),
        step.command.clone(),
        step.status.as_str().to_string(),
        detail(step).to_string(),
    ]);
}

fn step_line(step: &StepReport) -> String {
    let marker = match step.status {
        StepStatus::Sent | StepStatus::Responded | StepStatus::NoResponse => "ok",
        StepStatus::DeviceRejected | StepStatus::RejectedLocally => "rejected",
        StepStatus::SendFailed | StepStatus::ReadFailed => "FAILED",
        StepStatus::Cancelled => "skipped",
    };
    match step.status {
        StepStatus::Sent => format!("-> {} [{marker}]", step.command),
        StepStatus::Cancelled => format!("-> {} (interrupted) [{marker}]", step.command),
        StepStatus::NoResponse => format!("-> {} (no response) [{marker}]", step.command),
        _ => format!("-> {} <- {} [{marker}]", step.command, detail(step)),
    }
}

fn detail(step: &StepReport) -> &str {
    match (&step.response, &step.error) {
        (Some(response), _) => preview(response),
        (None, Some(error)) => error,
        (None, None) => "",
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(50);
    format!("{rule}\n{title}\n{rule}")
}

fn summary_line(report: &SequenceReport) -> String {
    let mut line = format!(
        "{} step(s), {} sent in {:.2}s ({:.1} commands/second)",
        report.steps.len(),
        report.sent_count(),
        report.elapsed.as_secs_f64(),
        report.rate_per_second()
    );
    if report.cancelled {
        line.push_str(", interrupted");
    }
    line
}
