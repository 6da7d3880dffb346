/// Errors that can occur while encoding commands or reading responses.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The servo index is outside `0..=6`.
    #[error("invalid servo ID: {servo_id} (must be 0-6)")]
    InvalidServoId { servo_id: i64 },

    /// The angle is outside `0..=180` or not a finite number.
    #[error("invalid angle: {angle} (must be 0-180)")]
    InvalidAngle { angle: f64 },

    /// An I/O error occurred while writing a command or reading a response.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reported pending data but returned end-of-file.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors raised before any byte reaches the transport.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidServoId { .. } | FrameError::InvalidAngle { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
