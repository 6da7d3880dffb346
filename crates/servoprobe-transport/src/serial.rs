use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

/// Baud rate used when none is given.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Timeout for individual blocking reads/writes on the OS port.
const IO_TIMEOUT: Duration = Duration::from_secs(1);

/// A serial port opened for command/response exchange.
///
/// Wraps the platform port handle from `serialport`. The port is closed when
/// the stream is dropped.
pub struct SerialStream {
    inner: Box<dyn SerialPort>,
    port: String,
    baud_rate: u32,
}

impl SerialStream {
    /// Open `port` at `baud_rate` (8N1, no flow control).
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let inner = serialport::new(port, baud_rate)
            .timeout(IO_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;

        info!(port, baud_rate, "opened serial port");

        Ok(Self {
            inner,
            port: port.to_string(),
            baud_rate,
        })
    }

    /// Discard anything buffered in either direction.
    pub fn clear(&self) -> Result<()> {
        self.inner
            .clear(ClearBuffer::All)
            .map_err(|err| TransportError::Io(err.into()))
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl ByteStream for SerialStream {
    fn bytes_available(&mut self) -> Result<usize> {
        self.inner
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|err| TransportError::Io(err.into()))
    }

    fn name(&self) -> Option<String> {
        Some(self.port.clone())
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        debug!(port = %self.port, "closing serial port");
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("port", &self.port)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_port_fails() {
        let result = SerialStream::open("/dev/servoprobe-does-not-exist", DEFAULT_BAUD_RATE);
        match result {
            Err(TransportError::Open { port, .. }) => {
                assert_eq!(port, "/dev/servoprobe-does-not-exist")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
