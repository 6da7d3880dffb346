//! Servo command codec and newline-delimited response framing.
//!
//! Every request is a single ASCII line:
//! - `S`, the servo index (`0..=6`), a comma, the target angle (`0..=180`)
//! - terminated by `\n`
//!
//! Responses are free text terminated by `\n`. Reads are bounded by a
//! timeout; silence is a valid outcome and undecodable bytes are dropped.

pub mod codec;
pub mod error;
pub mod limits;
pub mod reader;
pub mod writer;

pub use codec::{decode_lossy, encode_command, format_angle, ReadConfig, Response, ServoCommand};
pub use error::{FrameError, Result};
pub use limits::{
    is_valid_angle, is_valid_servo_id, COMMAND_PREFIX, MAX_ANGLE, MAX_SERVO_ID, MIN_ANGLE,
    MIN_SERVO_ID, REJECTION_MARKERS, SERVO_COUNT, TERMINATOR,
};
pub use reader::ResponseReader;
pub use writer::CommandWriter;
