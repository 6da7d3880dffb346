use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use servoprobe::sequence::SequenceRunner;
use servoprobe::SequenceConfig;

use crate::cmd::Context;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_report, print_step};

/// How often the prompt loop wakes up to check for Ctrl-C.
const INPUT_POLL: Duration = Duration::from_millis(100);

const USAGE_HINT: &str = "Format: S<id>,<angle> (e.g. S0,90)";

#[derive(Debug, Clone, PartialEq)]
enum InteractiveCommand {
    Send { servo_id: i64, angle: f64 },
    AllServos,
    Range,
    EdgeCases,
    Quit,
    Empty,
    Malformed,
    Unknown,
}

fn parse_line(line: &str) -> InteractiveCommand {
    let line = line.trim().to_ascii_uppercase();
    match line.as_str() {
        "" => InteractiveCommand::Empty,
        "Q" => InteractiveCommand::Quit,
        "A" => InteractiveCommand::AllServos,
        "R" => InteractiveCommand::Range,
        "E" => InteractiveCommand::EdgeCases,
        _ => match line.strip_prefix('S') {
            Some(rest) => parse_send(rest).unwrap_or(InteractiveCommand::Malformed),
            None => InteractiveCommand::Unknown,
        },
    }
}

fn parse_send(rest: &str) -> Option<InteractiveCommand> {
    let (id, angle) = rest.split_once(',')?;
    let servo_id = id.trim().parse().ok()?;
    let angle = angle.trim().parse().ok()?;
    Some(InteractiveCommand::Send { servo_id, angle })
}

enum Input {
    Line(String),
    Cancelled,
    Closed,
}

struct Prompt {
    lines: Receiver<String>,
}

impl Prompt {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    fn ask(&self, text: &str, ctx: &Context) -> CliResult<Input> {
        let mut out = std::io::stdout();
        write!(out, "{text}").map_err(|err| io_error("prompt failed", err))?;
        out.flush().map_err(|err| io_error("prompt failed", err))?;

        loop {
            if ctx.cancel.is_cancelled() {
                return Ok(Input::Cancelled);
            }
            match self.lines.recv_timeout(INPUT_POLL) {
                Ok(line) => return Ok(Input::Line(line)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(Input::Closed),
            }
        }
    }
}

fn print_help() {
    println!("{}", "=".repeat(50));
    println!("INTERACTIVE MODE");
    println!("{}", "=".repeat(50));
    println!("Commands:");
    println!("  S<id>,<angle>  - Send servo command (e.g. S0,90)");
    println!("  A              - Test all servos");
    println!("  R              - Test servo range");
    println!("  E              - Test edge cases");
    println!("  Q              - Quit");
    println!();
}

pub fn run(ctx: &Context) -> CliResult<i32> {
    let Some(mut session) = ctx.open_session()? else {
        return Ok(SUCCESS);
    };
    let config = SequenceConfig {
        response_timeout: ctx.link.response_timeout()?,
        ..SequenceConfig::default()
    };
    let timeout = config.response_timeout;
    let mut runner = SequenceRunner::new(&mut session, config, ctx.cancel.clone());
    let prompt = Prompt::spawn();

    print_help();

    loop {
        let line = match prompt.ask("> ", ctx)? {
            Input::Line(line) => line,
            Input::Cancelled | Input::Closed => break,
        };

        match parse_line(&line) {
            InteractiveCommand::Quit => break,
            InteractiveCommand::Empty => {}
            InteractiveCommand::Send { servo_id, angle } => {
                let step = runner.exchange(servo_id, angle, timeout);
                print_step(&step, ctx.format);
            }
            InteractiveCommand::AllServos => {
                print_report(&runner.all_servos(90.0), ctx.format);
            }
            InteractiveCommand::Range => {
                let answer = match prompt.ask("  Servo ID (0-6): ", ctx)? {
                    Input::Line(answer) => answer,
                    Input::Cancelled | Input::Closed => break,
                };
                match answer.trim().parse::<i64>() {
                    Ok(servo_id) => {
                        let angles = runner.config().range_angles.clone();
                        print_report(&runner.servo_range(servo_id, &angles), ctx.format);
                    }
                    Err(_) => println!("Invalid input"),
                }
            }
            InteractiveCommand::EdgeCases => {
                print_report(&runner.edge_cases(), ctx.format);
            }
            InteractiveCommand::Malformed => println!("{USAGE_HINT}"),
            InteractiveCommand::Unknown => println!("Unknown command"),
        }
    }

    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_lines() {
        assert_eq!(
            parse_line("S0,90"),
            InteractiveCommand::Send {
                servo_id: 0,
                angle: 90.0
            }
        );
        assert_eq!(
            parse_line("  s3, 120.25 "),
            InteractiveCommand::Send {
                servo_id: 3,
                angle: 120.25
            }
        );
    }

    #[test]
    fn out_of_range_send_still_parses() {
        // Range checks happen in the session, which reports a local rejection.
        assert_eq!(
            parse_line("S7,90"),
            InteractiveCommand::Send {
                servo_id: 7,
                angle: 90.0
            }
        );
    }

    #[test]
    fn malformed_send_lines() {
        assert_eq!(parse_line("S"), InteractiveCommand::Malformed);
        assert_eq!(parse_line("S0"), InteractiveCommand::Malformed);
        assert_eq!(parse_line("Sx,90"), InteractiveCommand::Malformed);
        assert_eq!(parse_line("S0,abc"), InteractiveCommand::Malformed);
    }

    #[test]
    fn single_letter_commands_are_case_insensitive() {
        assert_eq!(parse_line("q"), InteractiveCommand::Quit);
        assert_eq!(parse_line("a"), InteractiveCommand::AllServos);
        assert_eq!(parse_line("R"), InteractiveCommand::Range);
        assert_eq!(parse_line("e"), InteractiveCommand::EdgeCases);
        assert_eq!(parse_line(""), InteractiveCommand::Empty);
        assert_eq!(parse_line("hello"), InteractiveCommand::Unknown);
    }
}
