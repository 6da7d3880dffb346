use std::io::{ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use servoprobe_transport::{ByteStream, TransportError};
use tracing::{debug, trace};

use crate::codec::{decode_lossy, ReadConfig, Response};
use crate::error::{FrameError, Result};
use crate::limits::TERMINATOR;

const INITIAL_BUFFER_CAPACITY: usize = 128;

/// Reads newline-terminated responses from a [`ByteStream`].
///
/// Polls the stream for pending bytes and reads them one at a time, so a read
/// never consumes anything past the terminator.
pub struct ResponseReader<T> {
    inner: T,
    buf: BytesMut,
    config: ReadConfig,
}

impl<T: ByteStream> ResponseReader<T> {
    /// Create a new response reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReadConfig::default())
    }

    /// Create a new response reader with explicit configuration.
    pub fn with_config(inner: T, config: ReadConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read one response line, waiting at most `timeout`.
    ///
    /// Returns the trimmed text once `\n` arrives. If the deadline passes
    /// first, returns whatever has accumulated, possibly nothing. Only
    /// transport failures are errors.
    pub fn read_response(&mut self, timeout: Duration) -> Result<Response> {
        let start = Instant::now();
        self.buf.clear();

        while start.elapsed() < timeout {
            let pending = self
                .inner
                .bytes_available()
                .map_err(transport_to_frame_error)?;

            if pending > 0 {
                let mut byte = [0u8; 1];
                match self.inner.read(&mut byte) {
                    Ok(0) => return Err(FrameError::ConnectionClosed),
                    Ok(_) => {
                        trace!(byte = byte[0], "received byte");
                        self.buf.put_u8(byte[0]);
                        if byte[0] == TERMINATOR {
                            return Ok(self.finish(true));
                        }
                        continue;
                    }
                    Err(err)
                        if matches!(
                            err.kind(),
                            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                        ) => {}
                    Err(err) => return Err(FrameError::Io(err)),
                }
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            thread::sleep(self.config.poll_interval.min(remaining));
        }

        Ok(self.finish(false))
    }

    fn finish(&mut self, terminated: bool) -> Response {
        let raw = self.buf.split();
        let (text, dropped) = decode_lossy(&raw);
        if dropped > 0 {
            trace!(dropped, "dropped undecodable bytes");
        }
        let response = Response::new(&text, terminated);
        if terminated {
            debug!(response = %response, "received");
        } else if response.is_empty() {
            debug!("no response before timeout");
        } else {
            debug!(response = %response, "partial response before timeout");
        }
        response
    }
}

fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) => FrameError::Io(io),
        TransportError::NotConnected => FrameError::ConnectionClosed,
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{Read, Write};

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn reads_terminated_line() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b"OK\n"));
        let response = reader.read_response(Duration::from_secs(1)).unwrap();
        assert_eq!(response.text(), "OK");
        assert!(response.is_terminated());
    }

    #[test]
    fn silence_returns_empty_after_timeout() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b""));
        let start = Instant::now();
        let response = reader.read_response(Duration::from_millis(200)).unwrap();
        let elapsed = start.elapsed();

        assert!(response.is_empty());
        assert!(!response.is_terminated());
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(400), "took {elapsed:?}");
    }

    #[test]
    fn malformed_byte_is_dropped() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b"\xFFOK\n"));
        let response = reader.read_response(Duration::from_secs(1)).unwrap();
        assert_eq!(response.text(), "OK");
    }

    #[test]
    fn partial_line_returned_on_timeout() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b"  S0,90 O"));
        let response = reader.read_response(SHORT).unwrap();
        assert_eq!(response.text(), "S0,90 O");
        assert!(!response.is_terminated());
    }

    #[test]
    fn stops_at_terminator() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b"first\r\nsecond\n"));
        assert_eq!(reader.read_response(SHORT).unwrap().text(), "first");
        assert_eq!(reader.read_response(SHORT).unwrap().text(), "second");
        assert!(reader.inner.incoming.is_empty());
    }

    #[test]
    fn waits_for_late_data() {
        let stream = ScriptedStream::new(b"late\n").available_after(Duration::from_millis(60));
        let mut reader = ResponseReader::new(stream);
        let response = reader.read_response(Duration::from_secs(1)).unwrap();
        assert_eq!(response.text(), "late");
    }

    #[test]
    fn zero_timeout_reads_nothing() {
        let mut reader = ResponseReader::new(ScriptedStream::new(b"OK\n"));
        let response = reader.read_response(Duration::ZERO).unwrap();
        assert!(response.is_empty());
        assert_eq!(reader.inner.incoming.len(), 3);
    }

    #[test]
    fn interrupted_read_retries() {
        let mut stream = ScriptedStream::new(b"OK\n");
        stream.fail_next = Some(ErrorKind::Interrupted);
        let mut reader = ResponseReader::new(stream);
        assert_eq!(reader.read_response(Duration::from_secs(1)).unwrap().text(), "OK");
    }

    #[test]
    fn read_error_propagates() {
        let mut stream = ScriptedStream::new(b"OK\n");
        stream.fail_next = Some(ErrorKind::BrokenPipe);
        let mut reader = ResponseReader::new(stream);
        let err = reader.read_response(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn closed_stream_maps_to_connection_closed() {
        let mut stream = ScriptedStream::new(b"");
        stream.closed = true;
        let mut reader = ResponseReader::new(stream);
        let err = reader.read_response(SHORT).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    struct ScriptedStream {
        incoming: VecDeque<u8>,
        ready_at: Instant,
        fail_next: Option<ErrorKind>,
        closed: bool,
    }

    impl ScriptedStream {
        fn new(bytes: &[u8]) -> Self {
            Self {
                incoming: bytes.iter().copied().collect(),
                ready_at: Instant::now(),
                fail_next: None,
                closed: false,
            }
        }

        fn available_after(mut self, delay: Duration) -> Self {
            self.ready_at = Instant::now() + delay;
            self
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.fail_next.take() {
                return Err(std::io::Error::from(kind));
            }
            let mut n = 0;
            while n < buf.len() {
                match self.incoming.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl ByteStream for ScriptedStream {
        fn bytes_available(&mut self) -> servoprobe_transport::Result<usize> {
            if self.closed {
                return Err(TransportError::NotConnected);
            }
            if Instant::now() < self.ready_at {
                return Ok(0);
            }
            Ok(self.incoming.len())
        }
    }
}
