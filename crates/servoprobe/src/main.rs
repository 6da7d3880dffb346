mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use servoprobe::CancelFlag;

use crate::cmd::{Command, Context, LinkArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "servoprobe",
    version,
    about = "Serial command/response diagnostics for servo controllers"
)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    /// Log every sent and received line (raises the log level to debug).
    #[arg(long, global = true)]
    debug: bool,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.debug {
        cli.log_level.at_least_debug()
    } else {
        cli.log_level
    };
    init_logging(cli.log_format, level);

    let ctx = Context {
        link: cli.link,
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        cancel: CancelFlag::new(),
    };
    let result = cmd::run(cli.command.unwrap_or(Command::Quick), &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
