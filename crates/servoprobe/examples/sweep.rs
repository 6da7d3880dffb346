//! Sweep one servo through its range and print each response.
//!
//! Usage: `cargo run --example sweep -- [PORT] [SERVO_ID]`

use servoprobe::sequence::{SequenceRunner, StepStatus};
use servoprobe::transport::{PortMatcher, DEFAULT_BAUD_RATE};
use servoprobe::{CancelFlag, SequenceConfig, Session, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next();
    let servo_id: i64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);

    let config = SessionConfig::default();
    let mut session = match port {
        Some(port) => Session::connect(&port, DEFAULT_BAUD_RATE, config)?,
        None => Session::auto_connect(&PortMatcher::default(), DEFAULT_BAUD_RATE, config)?,
    };

    let sequences = SequenceConfig::default();
    let angles = sequences.range_angles.clone();
    let mut runner = SequenceRunner::new(&mut session, sequences, CancelFlag::new());
    let report = runner.servo_range(servo_id, &angles);

    for step in &report.steps {
        match step.status {
            StepStatus::NoResponse => println!("{} -> (no response)", step.command),
            _ => println!(
                "{} -> {}",
                step.command,
                step.response
                    .as_deref()
                    .or(step.error.as_deref())
                    .unwrap_or("")
            ),
        }
    }
    println!(
        "{} commands in {:.2}s",
        report.sent_count(),
        report.elapsed.as_secs_f64()
    );

    Ok(())
}
