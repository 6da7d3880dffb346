use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{encode_command, ServoCommand};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 32;

/// Writes servo commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> CommandWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write one complete command line (blocking).
    pub fn write_command(&mut self, command: &ServoCommand) -> Result<()> {
        self.buf.clear();
        encode_command(command, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        debug!(command = %command, "sent");
        Ok(())
    }

    /// Validate `servo_id`/`angle` and write the command.
    ///
    /// Invalid parameters return an error before anything is written.
    pub fn send(&mut self, servo_id: i64, angle: f64) -> Result<ServoCommand> {
        let command = ServoCommand::new(servo_id, angle)?;
        self.write_command(&command)?;
        Ok(command)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }
}
