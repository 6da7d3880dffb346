use std::fmt;
use std::time::Duration;

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::limits::{is_valid_angle, is_valid_servo_id, COMMAND_PREFIX, REJECTION_MARKERS, TERMINATOR};

/// Default sleep between polls when no byte is pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A validated request to move one servo to a target angle.
///
/// Only constructible through [`ServoCommand::new`], so every value satisfies
/// the parameter bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoCommand {
    servo_id: u8,
    angle: f64,
}

impl ServoCommand {
    /// Validate and build a command.
    pub fn new(servo_id: i64, angle: f64) -> Result<Self> {
        if !is_valid_servo_id(servo_id) {
            return Err(FrameError::InvalidServoId { servo_id });
        }
        if !is_valid_angle(angle) {
            return Err(FrameError::InvalidAngle { angle });
        }
        Ok(Self {
            servo_id: servo_id as u8,
            angle,
        })
    }

    pub fn servo_id(&self) -> u8 {
        self.servo_id
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// The encoded command, terminator included.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_command(self, &mut buf);
        buf.to_vec()
    }
}

impl fmt::Display for ServoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{COMMAND_PREFIX}{},{}",
            self.servo_id,
            format_angle(self.angle)
        )
    }
}

/// Render an angle for the wire.
///
/// Keeps every digit of the input, never uses exponent notation and always
/// includes a decimal point (`90` becomes `90.0`).
pub fn format_angle(angle: f64) -> String {
    let mut text = angle.to_string();
    if !text.contains('.') && angle.is_finite() {
        text.push_str(".0");
    }
    text
}

/// Encode a command into the wire format.
///
/// ```text
/// S<servo_id>,<angle>\n
/// ```
pub fn encode_command(command: &ServoCommand, dst: &mut BytesMut) {
    let line = command.to_string();
    dst.reserve(line.len() + 1);
    dst.put_slice(line.as_bytes());
    dst.put_u8(TERMINATOR);
}

/// Decode bytes as UTF-8, dropping anything that is not a valid character.
///
/// Returns the text and the number of bytes dropped.
pub fn decode_lossy(bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0usize;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }
    (text, dropped)
}

/// A textual reply read from the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    text: String,
    terminated: bool,
}

impl Response {
    /// Build a response from already-decoded text. Surrounding whitespace is
    /// trimmed.
    pub fn new(text: &str, terminated: bool) -> Self {
        Self {
            text: text.trim().to_string(),
            terminated,
        }
    }

    /// Trimmed response text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// True when nothing (after trimming) arrived before the deadline.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when a terminator was seen; false when the read timed out.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// True when the controller reported the command as rejected.
    pub fn is_rejection(&self) -> bool {
        REJECTION_MARKERS
            .iter()
            .any(|marker| self.text.contains(marker))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Configuration for response reads.
#[derive(Debug, Clone)]
pub struct ReadConfig {
    /// Sleep between polls when no byte is pending. Default: 10 ms.
    pub poll_interval: Duration,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
