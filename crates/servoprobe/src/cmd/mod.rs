use std::time::Duration;

use clap::{Args, Subcommand};
use servoprobe::transport::{PortMatcher, DEFAULT_BAUD_RATE};
use servoprobe::{CancelFlag, Session, SessionConfig};

use crate::exit::{session_error, CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod edge_cases;
pub mod interactive;
pub mod ports;
pub mod quick;
pub mod rate;
pub mod send;
pub mod sweep;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move servo 0 to 90 degrees and print the response (default).
    Quick,
    /// Send a single servo command.
    Send(SendArgs),
    /// Send the same angle to every servo.
    All(AllArgs),
    /// Step one servo through a list of angles.
    Sweep(SweepArgs),
    /// Send a burst of commands and report the achieved rate.
    Rate(RateArgs),
    /// Run the boundary and invalid-parameter battery.
    EdgeCases,
    /// Run every test sequence in order.
    FullTest,
    /// Type commands at a prompt.
    Interactive,
    /// List serial ports and show which one auto-detection would pick.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

/// Serial link options shared by every subcommand that talks to a device.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial port (auto-detected when omitted).
    #[arg(long, short = 'p', env = "SERVOPROBE_PORT", global = true)]
    pub port: Option<String>,
    /// Baud rate.
    #[arg(long, short = 'b', env = "SERVOPROBE_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,
    /// Wait after opening the port for the controller to reset (e.g. 2s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "2s", global = true)]
    pub settle: String,
    /// Maximum time to wait for each response (e.g. 1s, 250ms).
    #[arg(long, value_name = "DURATION", default_value = "1s", global = true)]
    pub timeout: String,
}

impl LinkArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            settle_delay: parse_duration(&self.settle)?,
            response_timeout: parse_duration(&self.timeout)?,
            ..SessionConfig::default()
        })
    }

    pub fn response_timeout(&self) -> CliResult<Duration> {
        parse_duration(&self.timeout)
    }
}

/// Everything a subcommand needs besides its own arguments.
pub struct Context {
    pub link: LinkArgs,
    pub format: OutputFormat,
    pub cancel: CancelFlag,
}

impl Context {
    /// Open the configured port, or auto-detect one.
    ///
    /// Returns `None` when the user interrupted during connect; the port is
    /// already closed again in that case.
    pub fn open_session(&self) -> CliResult<Option<Session>> {
        let config = self.link.session_config()?;
        install_ctrlc_handler(self.cancel.clone())?;

        let session = match &self.link.port {
            Some(port) => Session::connect(port, self.link.baud, config),
            None => Session::auto_connect(&PortMatcher::default(), self.link.baud, config),
        }
        .map_err(|err| session_error("connect failed", err))?;

        if self.cancel.is_cancelled() {
            tracing::info!("interrupted while connecting");
            return Ok(None);
        }

        if let Some(name) = session.port_name() {
            tracing::info!(port = %name, baud = self.link.baud, "session ready");
        }
        Ok(Some(session))
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Quick => quick::run(ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::All(args) => sweep::run_all(args, ctx),
        Command::Sweep(args) => sweep::run(args, ctx),
        Command::Rate(args) => rate::run(args, ctx),
        Command::EdgeCases => edge_cases::run(ctx),
        Command::FullTest => full_test::run(ctx),
        Command::Interactive => interactive::run(ctx),
        Command::Ports => ports::run(ctx.format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Servo index (0-6).
    #[arg(allow_negative_numbers = true)]
    pub servo_id: i64,
    /// Target angle in degrees (0-180).
    #[arg(allow_negative_numbers = true)]
    pub angle: f64,
    /// Wait for one response line and print it.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct AllArgs {
    /// Target angle in degrees (0-180).
    #[arg(long, default_value_t = 90.0)]
    pub angle: f64,
    /// Pause between servos (e.g. 500ms).
    #[arg(long, value_name = "DURATION", default_value = "500ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Servo index (0-6).
    pub servo_id: i64,
    /// Angles to visit (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "0,45,90,135,180")]
    pub angles: Vec<f64>,
    /// Pause between angles (e.g. 1s).
    #[arg(long, value_name = "DURATION", default_value = "1s")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct RateArgs {
    /// Servo index (0-6).
    #[arg(default_value_t = 0)]
    pub servo_id: i64,
    /// Number of commands to send.
    #[arg(long, short = 'n', default_value_t = 10)]
    pub count: usize,
    /// Interval between commands (e.g. 100ms).
    #[arg(long, value_name = "DURATION", default_value = "100ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `<n>s`, `<n>ms` or a bare number of seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

fn install_ctrlc_handler(cancel: CancelFlag) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("bad").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("-1s").unwrap_err().code, USAGE);
    }
}
