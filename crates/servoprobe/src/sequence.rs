//! Test sequences built from single command/response exchanges.
//!
//! Every sequence is best-effort: a failed step is recorded and the sequence
//! moves on. Cancellation is checked before each step and during pauses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use servoprobe_frame::{format_angle, COMMAND_PREFIX, SERVO_COUNT};
use servoprobe_transport::ByteStream;
use tracing::{info, warn};

use crate::session::Session;

/// Largest slice a pause sleeps before re-checking cancellation.
const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// Boundary and invalid parameter pairs exercised by [`SequenceRunner::edge_cases`].
pub const EDGE_CASES: &[EdgeCase] = &[
    EdgeCase::new("Valid minimum", 0, 0.0),
    EdgeCase::new("Valid maximum", 0, 180.0),
    EdgeCase::new("Mid-range", 0, 90.0),
    EdgeCase::new("Decimal angle", 0, 45.5),
    EdgeCase::new("Another decimal", 3, 120.25),
    EdgeCase::new("Invalid servo (high)", 7, 90.0),
    EdgeCase::new("Invalid servo (negative)", -1, 90.0),
    EdgeCase::new("Invalid angle (high)", 0, 181.0),
    EdgeCase::new("Invalid angle (negative)", 0, -1.0),
];

/// One entry of the edge-case battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCase {
    pub name: &'static str,
    pub servo_id: i64,
    pub angle: f64,
}

impl EdgeCase {
    pub const fn new(name: &'static str, servo_id: i64, angle: f64) -> Self {
        Self {
            name,
            servo_id,
            angle,
        }
    }
}

/// Shared flag set when the user interrupts a run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Delays and parameter lists used by the sequences.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Pause after a single-servo move. Default: 0.5 s.
    pub single_wait: Duration,
    /// Response timeout for a single-servo move. Default: 2 s.
    pub single_timeout: Duration,
    /// Pause between servos in the all-servo sweep. Default: 0.5 s.
    pub sweep_wait: Duration,
    /// Angles visited by the range sweep.
    pub range_angles: Vec<f64>,
    /// Pause between angles in the range sweep. Default: 1 s.
    pub range_wait: Duration,
    /// Commands sent by the rate burst. Default: 10.
    pub rate_count: usize,
    /// Interval between rate burst commands. Default: 0.1 s.
    pub rate_interval: Duration,
    /// Angles cycled through by the rate burst.
    pub rate_angles: Vec<f64>,
    /// Pause between edge cases. Default: 0.1 s.
    pub edge_wait: Duration,
    /// Response timeout for range and edge-case steps. Default: 1 s.
    pub response_timeout: Duration,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            single_wait: Duration::from_millis(500),
            single_timeout: Duration::from_secs(2),
            sweep_wait: Duration::from_millis(500),
            range_angles: vec![0.0, 45.0, 90.0, 135.0, 180.0],
            range_wait: Duration::from_secs(1),
            rate_count: 10,
            rate_interval: Duration::from_millis(100),
            rate_angles: vec![90.0, 45.0, 135.0, 90.0],
            edge_wait: Duration::from_millis(100),
            response_timeout: Duration::from_secs(1),
        }
    }
}

impl SequenceConfig {
    /// Parameters of the full test suite: faster sweeps and a longer burst.
    pub fn full_suite() -> Self {
        Self {
            sweep_wait: Duration::from_millis(300),
            range_wait: Duration::from_millis(500),
            rate_count: 20,
            rate_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Sent; no response was awaited.
    Sent,
    /// Sent and a response arrived.
    Responded,
    /// Sent, but nothing arrived before the timeout.
    NoResponse,
    /// Sent and the controller reported an error.
    DeviceRejected,
    /// Parameters out of range; nothing was sent.
    RejectedLocally,
    /// The write failed.
    SendFailed,
    /// The command was sent but reading the response failed.
    ReadFailed,
    /// The run was interrupted before the command was sent.
    Cancelled,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Sent => "sent",
            StepStatus::Responded => "responded",
            StepStatus::NoResponse => "no-response",
            StepStatus::DeviceRejected => "device-rejected",
            StepStatus::RejectedLocally => "rejected-locally",
            StepStatus::SendFailed => "send-failed",
            StepStatus::ReadFailed => "read-failed",
            StepStatus::Cancelled => "cancelled",
        }
    }

    /// True when the command bytes reached the transport.
    pub fn was_sent(self) -> bool {
        !matches!(
            self,
            StepStatus::RejectedLocally | StepStatus::SendFailed | StepStatus::Cancelled
        )
    }

    /// True for failures of the link itself.
    pub fn is_failure(self) -> bool {
        matches!(self, StepStatus::SendFailed | StepStatus::ReadFailed)
    }
}

/// Record of one step of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub label: String,
    /// The command as it appears on the wire, without the terminator.
    pub command: String,
    pub status: StepStatus,
    pub response: Option<String>,
    pub error: Option<String>,
}

/// Record of a whole sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    pub name: String,
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl SequenceReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
            elapsed: Duration::ZERO,
            cancelled: false,
        }
    }

    /// Number of commands that reached the transport.
    pub fn sent_count(&self) -> usize {
        self.steps.iter().filter(|s| s.status.was_sent()).count()
    }

    /// Commands per second over the whole sequence.
    pub fn rate_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sent_count() as f64 / secs
        } else {
            0.0
        }
    }

    /// True when any step failed at the transport level.
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.status.is_failure())
    }
}

/// Runs sequences against one session.
pub struct SequenceRunner<'a, S: ByteStream> {
    session: &'a mut Session<S>,
    config: SequenceConfig,
    cancel: CancelFlag,
}

impl<'a, S: ByteStream> SequenceRunner<'a, S> {
    pub fn new(session: &'a mut Session<S>, config: SequenceConfig, cancel: CancelFlag) -> Self {
        Self {
            session,
            config,
            cancel,
        }
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send one command and wait up to `timeout` for its response.
    ///
    /// Nothing is sent once the run has been cancelled.
    pub fn exchange(&mut self, servo_id: i64, angle: f64, timeout: Duration) -> StepReport {
        self.step(&wire_text(servo_id, angle), servo_id, angle, Some(timeout))
    }

    /// Move one servo, wait for its response, then pause.
    pub fn single_servo(&mut self, servo_id: i64, angle: f64) -> SequenceReport {
        self.run("single servo", |runner, report| {
            runner.push_single(report, servo_id, angle);
        })
    }

    /// Send `angle` to every servo in turn without awaiting responses.
    pub fn all_servos(&mut self, angle: f64) -> SequenceReport {
        let wait = self.config.sweep_wait;
        self.run("all servos", |runner, report| {
            for servo_id in 0..i64::from(SERVO_COUNT) {
                if runner.stop(report) {
                    return;
                }
                let label = format!("servo {servo_id}");
                report
                    .steps
                    .push(runner.step(&label, servo_id, angle, None));
                runner.pause(wait);
            }
        })
    }

    /// Step one servo through `angles`, reading a response for each.
    pub fn servo_range(&mut self, servo_id: i64, angles: &[f64]) -> SequenceReport {
        let wait = self.config.range_wait;
        let timeout = self.config.response_timeout;
        self.run("servo range", |runner, report| {
            for &angle in angles {
                if runner.stop(report) {
                    return;
                }
                let label = format!("move to {}", format_angle(angle));
                report
                    .steps
                    .push(runner.step(&label, servo_id, angle, Some(timeout)));
                runner.pause(wait);
            }
        })
    }

    /// Fire `count` commands at a fixed interval to measure throughput.
    pub fn command_rate(
        &mut self,
        servo_id: i64,
        count: usize,
        interval: Duration,
    ) -> SequenceReport {
        let angles = if self.config.rate_angles.is_empty() {
            vec![90.0]
        } else {
            self.config.rate_angles.clone()
        };
        self.run("command rate", |runner, report| {
            for i in 0..count {
                if runner.stop(report) {
                    return;
                }
                let angle = angles[i % angles.len()];
                let label = format!("command {}", i + 1);
                report
                    .steps
                    .push(runner.step(&label, servo_id, angle, None));
                runner.pause(interval);
            }
        })
    }

    /// Run the fixed edge-case battery.
    pub fn edge_cases(&mut self) -> SequenceReport {
        let wait = self.config.edge_wait;
        let timeout = self.config.response_timeout;
        self.run("edge cases", |runner, report| {
            for case in EDGE_CASES {
                if runner.stop(report) {
                    return;
                }
                report
                    .steps
                    .push(runner.step(case.name, case.servo_id, case.angle, Some(timeout)));
                runner.pause(wait);
            }
        })
    }

    /// Run every sequence in order.
    pub fn full_suite(&mut self) -> Vec<SequenceReport> {
        let mut reports = Vec::new();

        reports.push(self.run("single servo movement", |runner, report| {
            for angle in [90.0, 45.0, 135.0] {
                if runner.stop(report) {
                    return;
                }
                runner.push_single(report, 0, angle);
            }
        }));

        if !self.is_cancelled() {
            reports.push(self.all_servos(90.0));
        }
        if !self.is_cancelled() {
            let angles = self.config.range_angles.clone();
            reports.push(self.servo_range(2, &angles));
        }
        if !self.is_cancelled() {
            reports.push(self.edge_cases());
        }
        if !self.is_cancelled() {
            let (count, interval) = (self.config.rate_count, self.config.rate_interval);
            reports.push(self.command_rate(0, count, interval));
        }

        reports
    }

    fn run(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self, &mut SequenceReport),
    ) -> SequenceReport {
        info!(sequence = name, "starting sequence");
        let start = Instant::now();
        let mut report = SequenceReport::new(name);
        body(self, &mut report);
        report.elapsed = start.elapsed();
        if self.is_cancelled() {
            report.cancelled = true;
        }
        info!(
            sequence = name,
            steps = report.steps.len(),
            elapsed = ?report.elapsed,
            cancelled = report.cancelled,
            "sequence finished"
        );
        report
    }

    fn push_single(&mut self, report: &mut SequenceReport, servo_id: i64, angle: f64) {
        let label = format!("servo {servo_id} to {}", format_angle(angle));
        let timeout = self.config.single_timeout;
        let step = self.step(&label, servo_id, angle, Some(timeout));
        let sent = step.status.was_sent();
        report.steps.push(step);
        if sent {
            self.pause(self.config.single_wait);
        }
    }

    fn stop(&self, report: &mut SequenceReport) -> bool {
        if self.is_cancelled() {
            report.cancelled = true;
            return true;
        }
        false
    }

    fn step(
        &mut self,
        label: &str,
        servo_id: i64,
        angle: f64,
        read_timeout: Option<Duration>,
    ) -> StepReport {
        let mut report = StepReport {
            label: label.to_string(),
            command: wire_text(servo_id, angle),
            status: StepStatus::Sent,
            response: None,
            error: None,
        };

        if self.is_cancelled() {
            report.status = StepStatus::Cancelled;
            return report;
        }

        if let Err(err) = self.session.send_command(servo_id, angle) {
            report.status = if err.is_validation() {
                StepStatus::RejectedLocally
            } else {
                warn!(command = %report.command, error = %err, "send failed");
                StepStatus::SendFailed
            };
            report.error = Some(err.to_string());
            return report;
        }

        let Some(timeout) = read_timeout else {
            return report;
        };

        match self.session.read_response(timeout) {
            Ok(response) => {
                report.status = if response.is_empty() {
                    StepStatus::NoResponse
                } else if response.is_rejection() {
                    StepStatus::DeviceRejected
                } else {
                    StepStatus::Responded
                };
                if !response.is_empty() {
                    report.response = Some(response.into_string());
                }
            }
            Err(err) => {
                warn!(command = %report.command, error = %err, "read failed");
                report.status = StepStatus::ReadFailed;
                report.error = Some(err.to_string());
            }
        }

        report
    }

    fn pause(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        loop {
            if self.is_cancelled() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }
}

/// Wire text of a command, also for parameters that fail validation.
pub fn wire_text(servo_id: i64, angle: f64) -> String {
    format!("{COMMAND_PREFIX}{servo_id},{}", format_angle(angle))
}
