#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use servoprobe::sequence::SequenceConfig;
use servoprobe::transport::{ByteStream, Result as TransportResult};
use servoprobe::SessionConfig;

type Responder = Box<dyn FnMut(&str) -> Option<String>>;

/// In-memory stand-in for a servo controller on a serial link.
pub struct MockController {
    pub incoming: VecDeque<u8>,
    pub written: Vec<u8>,
    pub write_calls: usize,
    pub fail_writes: bool,
    pub closed: Arc<AtomicBool>,
    line: Vec<u8>,
    responder: Option<Responder>,
}

impl MockController {
    /// A controller that never answers.
    pub fn silent() -> Self {
        Self {
            incoming: VecDeque::new(),
            written: Vec::new(),
            write_calls: 0,
            fail_writes: false,
            closed: Arc::new(AtomicBool::new(false)),
            line: Vec::new(),
            responder: None,
        }
    }

    /// A controller with `bytes` already waiting in its output buffer.
    pub fn replaying(bytes: &[u8]) -> Self {
        let mut mock = Self::silent();
        mock.incoming.extend(bytes.iter().copied());
        mock
    }

    /// A controller that answers each complete line through `responder`.
    pub fn responding(responder: impl FnMut(&str) -> Option<String> + 'static) -> Self {
        let mut mock = Self::silent();
        mock.responder = Some(Box::new(responder));
        mock
    }

    /// A controller that parses commands the way the firmware does.
    pub fn firmware() -> Self {
        Self::responding(|line| {
            let body = line.strip_prefix('S')?;
            let (id, angle) = body.split_once(',')?;
            let id: i64 = id.parse().ok()?;
            let angle: f64 = angle.parse().ok()?;
            if !(0..=6).contains(&id) {
                return Some(format!("ERROR: Servo ID {id} out of range (0-6)"));
            }
            if !(0.0..=180.0).contains(&angle) {
                return Some(format!("ERROR: Angle {angle:.1} out of range (0-180)"));
            }
            Some(format!("Command parsed: Servo {id} -> {angle:.1}"))
        })
    }

    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.written_text().lines().map(str::to_string).collect()
    }
}

impl Read for MockController {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
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

impl Write for MockController {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.written.extend_from_slice(buf);
        for &b in buf {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.line).into_owned();
                self.line.clear();
                if let Some(responder) = self.responder.as_mut() {
                    if let Some(reply) = responder(&line) {
                        self.incoming.extend(reply.bytes());
                        self.incoming.push_back(b'\n');
                    }
                }
            } else {
                self.line.push(b);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for MockController {
    fn bytes_available(&mut self) -> TransportResult<usize> {
        Ok(self.incoming.len())
    }

    fn name(&self) -> Option<String> {
        Some("mock".to_string())
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        settle_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(2),
        response_timeout: Duration::from_millis(100),
        clear_on_connect: false,
    }
}

/// Sequence timing with every pause removed and short response timeouts.
pub fn fast_sequences() -> SequenceConfig {
    SequenceConfig {
        single_wait: Duration::ZERO,
        single_timeout: Duration::from_millis(50),
        sweep_wait: Duration::ZERO,
        range_wait: Duration::ZERO,
        rate_interval: Duration::ZERO,
        edge_wait: Duration::ZERO,
        response_timeout: Duration::from_millis(50),
        ..SequenceConfig::default()
    }
}
