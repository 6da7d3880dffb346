//! A single connection to a servo controller.
//!
//! [`Session`] owns the byte stream for its whole lifetime. Dropping the
//! session closes the port, so every exit path releases it.

use std::thread;
use std::time::Duration;

use servoprobe_frame::{
    CommandWriter, FrameError, ReadConfig, Response, ResponseReader, ServoCommand,
};
use servoprobe_transport::{
    find_port, ByteStream, PortMatcher, SerialStream, TransportError,
};
use tracing::{debug, info};

/// Time the controller needs to finish its reset after the port opens.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Default wait for a response line.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors returned by [`Session`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Opening, enumerating or using the serial port failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A command was invalid, or the stream failed mid-exchange.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Auto-detection found no candidate port.
    #[error("no serial port matched ({0}); specify the port explicitly")]
    NoPortFound(String),
}

impl SessionError {
    /// True when the command was rejected locally and nothing was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Frame(err) if err.is_validation())
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Timing configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wait after opening the port before the session is usable. Default: 2 s.
    pub settle_delay: Duration,
    /// Sleep between polls while waiting for a response. Default: 10 ms.
    pub poll_interval: Duration,
    /// Timeout used by [`Session::await_response`]. Default: 1 s.
    pub response_timeout: Duration,
    /// Discard anything the controller printed while booting. Default: true.
    pub clear_on_connect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: ReadConfig::default().poll_interval,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            clear_on_connect: true,
        }
    }
}

/// An open connection to a servo controller.
pub struct Session<S: ByteStream = SerialStream> {
    stream: Option<S>,
    config: SessionConfig,
}

impl Session<SerialStream> {
    /// Open `port` at `baud_rate` and wait for the controller to settle.
    pub fn connect(port: &str, baud_rate: u32, config: SessionConfig) -> SessionResult<Self> {
        let stream = SerialStream::open(port, baud_rate)?;

        debug!(delay = ?config.settle_delay, "waiting for controller reset");
        thread::sleep(config.settle_delay);

        if config.clear_on_connect {
            stream.clear()?;
        }

        info!(port, baud_rate, "connected");
        Ok(Self::from_stream(stream, config))
    }

    /// Find a port with `matcher` and connect to it.
    pub fn auto_connect(
        matcher: &PortMatcher,
        baud_rate: u32,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        let port = find_port(matcher)?
            .ok_or_else(|| SessionError::NoPortFound(matcher.label().to_string()))?;
        info!(port = %port.name, description = %port.description, "auto-detected port");
        Self::connect(&port.name, baud_rate, config)
    }
}

impl<S: ByteStream> Session<S> {
    /// Wrap an already-open stream. No settle delay is applied.
    pub fn from_stream(stream: S, config: SessionConfig) -> Self {
        Self {
            stream: Some(stream),
            config,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Name of the underlying device, if it reports one.
    pub fn port_name(&self) -> Option<String> {
        self.stream.as_ref().and_then(|stream| stream.name())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validate and send one servo command. No acknowledgement is awaited.
    ///
    /// Out-of-range parameters fail before anything touches the stream.
    pub fn send_command(&mut self, servo_id: i64, angle: f64) -> SessionResult<ServoCommand> {
        let command = ServoCommand::new(servo_id, angle)?;
        self.send(&command)?;
        Ok(command)
    }

    /// Send an already validated command.
    pub fn send(&mut self, command: &ServoCommand) -> SessionResult<()> {
        let stream = self.stream_mut()?;
        CommandWriter::new(stream).write_command(command)?;
        Ok(())
    }

    /// Read one response line, waiting at most `timeout`.
    ///
    /// Silence is not an error: the returned response is simply empty.
    pub fn read_response(&mut self, timeout: Duration) -> SessionResult<Response> {
        let config = ReadConfig {
            poll_interval: self.config.poll_interval,
        };
        let stream = self.stream_mut()?;
        let response = ResponseReader::with_config(stream, config).read_response(timeout)?;
        Ok(response)
    }

    /// Read one response line with the configured default timeout.
    pub fn await_response(&mut self) -> SessionResult<Response> {
        self.read_response(self.config.response_timeout)
    }

    /// Send a command and wait for its response.
    pub fn exchange(
        &mut self,
        servo_id: i64,
        angle: f64,
        timeout: Duration,
    ) -> SessionResult<(ServoCommand, Response)> {
        let command = self.send_command(servo_id, angle)?;
        let response = self.read_response(timeout)?;
        Ok((command, response))
    }

    /// Close the stream. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let name = stream.name();
            drop(stream);
            info!(port = name.as_deref().unwrap_or("stream"), "disconnected");
        }
    }

    /// Borrow the underlying stream, if still connected.
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    fn stream_mut(&mut self) -> SessionResult<&mut S> {
        self.stream
            .as_mut()
            .ok_or(SessionError::Transport(TransportError::NotConnected))
    }
}

impl<S: ByteStream> Drop for Session<S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<S: ByteStream> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port_name())
            .field("connected", &self.is_connected())
            .field("config", &self.config)
            .finish()
    }
}
