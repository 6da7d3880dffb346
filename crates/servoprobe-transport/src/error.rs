/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the specified serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on the serial stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream has already been closed.
    #[error("not connected")]
    NotConnected,
}

impl TransportError {
    /// The `std::io::ErrorKind` closest to this error, for exit code mapping.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. } | TransportError::Enumerate(source) => {
                match source.kind() {
                    serialport::ErrorKind::Io(kind) => Some(kind),
                    serialport::ErrorKind::NoDevice => Some(std::io::ErrorKind::NotFound),
                    _ => None,
                }
            }
            TransportError::Io(err) => Some(err.kind()),
            TransportError::NotConnected => Some(std::io::ErrorKind::NotConnected),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_port() {
        let err = TransportError::Open {
            port: "/dev/ttyUSB9".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
        };
        assert_eq!(err.to_string(), "failed to open /dev/ttyUSB9: no such device");
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn io_kind_passes_through() {
        let err = TransportError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::PermissionDenied));
    }
}
